//! Shared test support: throwaway SQLite databases, a scripted payment gateway and a small box office catalog.
mod fake_gateway;
pub mod fixtures;
pub mod prepare_env;

pub use fake_gateway::{FakeGateway, GatewayBehaviour};
