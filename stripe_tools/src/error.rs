use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    /// The card was declined. The message is suitable for showing to the card holder.
    #[error("{0}")]
    CardError(String),
    #[error("Payment intent {id} is in unexpected status {status}")]
    UnexpectedStatus { id: String, status: String },
    #[error("Stripe response is missing {0}")]
    MissingField(&'static str),
}

impl StripeApiError {
    pub fn is_card_error(&self) -> bool {
        matches!(self, StripeApiError::CardError(_))
    }
}
