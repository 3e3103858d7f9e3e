use std::sync::Arc;

use box_office_common::Cents;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{ConnectionToken, ErrorBody, PaymentIntent, PaymentMethod, SettledCharge},
    StripeApiError,
};

type Form = Vec<(String, String)>;

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for StripeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StripeApi ({})", self.config.api_url)
    }
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends a form-encoded request to the REST API. Card declines come back as [`StripeApiError::CardError`].
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !form.is_empty() {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(parse_error(status, message))
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Charges `amount` to a saved payment method (`pm_...`) or a single-use card token (`tok_...`).
    ///
    /// The intent is confirmed immediately. On success the settled charge is returned with its card description and
    /// fingerprint.
    pub async fn charge_card(
        &self,
        amount: Cents,
        order_number: i64,
        method: &str,
    ) -> Result<SettledCharge, StripeApiError> {
        let payment_method = if method.starts_with("pm_") {
            method.to_string()
        } else {
            self.payment_method_from_token(method).await?.id
        };
        let mut form = self.intent_form(amount, order_number);
        form.push(("confirm".into(), "true".into()));
        form.push(("confirmation_method".into(), "manual".into()));
        form.push(("payment_method".into(), payment_method));
        form.push(("expand[]".into(), "latest_charge".into()));
        let intent = self.rest_query::<PaymentIntent>(Method::POST, "/payment_intents", &form).await?;
        if !intent.is_succeeded() {
            return Err(StripeApiError::UnexpectedStatus { id: intent.id, status: intent.status });
        }
        let settled = intent.charge()?.settle()?;
        info!("💳️ Charged {amount} for order {order_number}: {}", settled.charge_id);
        Ok(settled)
    }

    /// Creates a manual-capture intent for a card-present payment. The terminal collects the card using the intent's
    /// client secret.
    pub async fn create_card_present_intent(
        &self,
        amount: Cents,
        order_number: i64,
    ) -> Result<PaymentIntent, StripeApiError> {
        let mut form = self.intent_form(amount, order_number);
        form.push(("capture_method".into(), "manual".into()));
        form.push(("payment_method_types[]".into(), "card_present".into()));
        form.push(("payment_method_types[]".into(), "card".into()));
        let intent = self.rest_query::<PaymentIntent>(Method::POST, "/payment_intents", &form).await?;
        if intent.client_secret.is_none() {
            return Err(StripeApiError::MissingField("client_secret"));
        }
        debug!("💳️ Payment intent {} created for order {order_number}", intent.id);
        Ok(intent)
    }

    pub async fn capture_payment_intent(&self, id: &str) -> Result<SettledCharge, StripeApiError> {
        let path = format!("/payment_intents/{id}/capture");
        let form = vec![("expand[]".to_string(), "latest_charge".to_string())];
        let intent = self.rest_query::<PaymentIntent>(Method::POST, &path, &form).await?;
        if !intent.is_succeeded() {
            return Err(StripeApiError::UnexpectedStatus { id: intent.id, status: intent.status });
        }
        let settled = intent.charge()?.settle()?;
        info!("💳️ Payment intent {id} captured: {}", settled.charge_id);
        Ok(settled)
    }

    pub async fn cancel_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeApiError> {
        let path = format!("/payment_intents/{id}/cancel");
        let intent = self.rest_query::<PaymentIntent>(Method::POST, &path, &[]).await?;
        info!("💳️ Payment intent {id} cancelled");
        Ok(intent)
    }

    /// A Stripe Terminal connection token, letting a card reader connect to the account.
    pub async fn connection_token(&self) -> Result<String, StripeApiError> {
        let token = self.rest_query::<ConnectionToken>(Method::POST, "/terminal/connection_tokens", &[]).await?;
        Ok(token.secret)
    }

    async fn payment_method_from_token(&self, token: &str) -> Result<PaymentMethod, StripeApiError> {
        let form = vec![("type".to_string(), "card".to_string()), ("card[token]".to_string(), token.to_string())];
        let method = self.rest_query::<PaymentMethod>(Method::POST, "/payment_methods", &form).await?;
        trace!("💳️ Payment method {} created from card token", method.id);
        Ok(method)
    }

    fn intent_form(&self, amount: Cents, order_number: i64) -> Form {
        vec![
            ("amount".into(), amount.value().to_string()),
            ("currency".into(), self.config.currency.clone()),
            ("metadata[order-number]".into(), order_number.to_string()),
        ]
    }
}

fn parse_error(status: u16, message: String) -> StripeApiError {
    match serde_json::from_str::<ErrorBody>(&message) {
        Ok(body) if body.error.error_type == "card_error" => {
            StripeApiError::CardError(body.error.message.unwrap_or_else(|| "Your card was declined.".into()))
        },
        Ok(body) => {
            let message = body.error.message.unwrap_or(body.error.error_type);
            StripeApiError::QueryError { status, message }
        },
        Err(_) => StripeApiError::QueryError { status, message },
    }
}
