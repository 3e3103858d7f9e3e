use thiserror::Error;

/// Why an order draft was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{0}")]
    BadRequest(String),
    #[error("Forbidden")]
    Forbidden,
}

impl Rejection {
    pub fn bad_request<S: Into<String>>(reason: S) -> Self {
        Self::BadRequest(reason.into())
    }
}
