use box_office_common::Secret;
use log::*;

pub const DEFAULT_API_URL: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    /// ISO currency code, lower case.
    pub currency: String,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("BO_STRIPE_API_URL").unwrap_or_else(|_| {
            debug!("BO_STRIPE_API_URL not set, using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("BO_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("BO_STRIPE_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let currency = std::env::var("BO_CURRENCY").map(|c| c.to_lowercase()).unwrap_or_else(|_| {
            warn!("BO_CURRENCY not set, using usd as default");
            "usd".to_string()
        });
        Self { api_url, secret_key, currency }
    }
}
