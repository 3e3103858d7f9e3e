//! A thin client for the parts of the Stripe REST API the box office uses: charging a card or card token,
//! authorising and capturing card-present payments, and issuing Stripe Terminal connection tokens.
mod api;
mod config;
mod data_objects;
mod error;
mod helpers;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{
    CardDetails,
    CardPresentDetails,
    Charge,
    ChargeRef,
    ConnectionToken,
    PaymentIntent,
    PaymentMethod,
    PaymentMethodDetails,
    SettledCharge,
    Wallet,
};
pub use error::StripeApiError;
pub use helpers::card_description;
