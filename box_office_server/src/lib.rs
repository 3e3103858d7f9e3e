//! # Box office server
//! The HTTP front of the box office. It is responsible for:
//! * Quoting prices and taking orders from the public site, the door and the office.
//! * Settling card payments through Stripe, including the card reader at the door.
//! * Admitting ticket holders at the door.
//! * Posting valid orders to the notification hooks (receipts and the sales sheet).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Authentication
//! Staff apps send a session token in the `Auth` header. Public routes work without it. See [middleware].
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `GET /api/prices?p=..&coupon=..`: Prices of the listed products.
//! * `POST /api/orders/calculate`: Prices a draft order without storing it.
//! * `POST /api/orders`: Places an order.
//! * `GET /api/orders/{id}`, `POST /api/orders/{id}/capture`, `DELETE /api/orders/{id}`: Office and door order
//!   handling.
//! * `GET /api/tickets/{token}`: A buyer's own order.
//! * `GET|POST /api/events`, `GET /api/events/{id}/prices`, `GET /api/events/{id}/orders`: Events and will call.
//! * `GET|POST /api/events/{id}/tickets/{order}`: Door admission.
//! * `POST /api/products`, `POST /api/products/{id}/rules`: Catalog setup.
//! * `POST /api/sessions`: Opens a staff session.
//! * `GET /api/stripe/connect`: Connection token for the card reader.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod dto;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
#[cfg(test)]
mod test;
