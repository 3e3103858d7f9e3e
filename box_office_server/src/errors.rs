use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use box_office_engine::{
    traits::StoreError,
    usage::UsageError,
    validation::Rejection,
    CatalogError,
    OrderFlowError,
    SessionError,
    TicketUsageError,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The card was not accepted. Sent with a 200 status so that sales forms show the message to the buyer.
    #[error("{0}")]
    PaymentDeclined(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentDeclined(_) => StatusCode::OK,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConcurrentModification(_) => Self::Conflict(e.to_string()),
            StoreError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            StoreError::AlreadyExists(_) => Self::BadRequest(e.to_string()),
            StoreError::DatabaseError(_) | StoreError::InvalidData(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<Rejection> for ServerError {
    fn from(e: Rejection) -> Self {
        match e {
            Rejection::BadRequest(reason) => Self::BadRequest(reason),
            Rejection::Forbidden => Self::Forbidden,
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Rejected(r) => r.into(),
            OrderFlowError::PaymentDeclined(message) => Self::PaymentDeclined(message),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::GatewayError(_) => Self::BackendError(e.to_string()),
            OrderFlowError::StoreError(e) => e.into(),
            OrderFlowError::Configuration(_) => Self::InitializeError(e.to_string()),
        }
    }
}

impl From<TicketUsageError> for ServerError {
    fn from(e: TicketUsageError) -> Self {
        match e {
            TicketUsageError::Forbidden => Self::Forbidden,
            TicketUsageError::OrderNotFound(_) | TicketUsageError::EventNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            // Informational usage errors are answered by the usage handlers themselves
            TicketUsageError::Usage(_) | TicketUsageError::Refused { .. } => Self::BadRequest(e.to_string()),
            TicketUsageError::StoreError(e) => e.into(),
        }
    }
}

impl From<UsageError> for ServerError {
    fn from(e: UsageError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Forbidden => Self::Forbidden,
            CatalogError::Invalid(reason) => Self::BadRequest(reason),
            CatalogError::EventNotFound(_) | CatalogError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::StoreError(e) => e.into(),
        }
    }
}

impl From<SessionError> for ServerError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Forbidden => Self::Forbidden,
            SessionError::Invalid(reason) => Self::BadRequest(reason),
            SessionError::StoreError(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use box_office_engine::db_types::OrderId;

    use super::*;

    #[test]
    fn engine_errors_map_to_statuses() {
        let err = ServerError::from(OrderFlowError::Rejected(Rejection::bad_request("invalid email")));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "invalid email");
        let err = ServerError::from(OrderFlowError::PaymentDeclined("Your card was declined.".into()));
        assert_eq!(err.status_code(), StatusCode::OK);
        let err = ServerError::from(OrderFlowError::StoreError(StoreError::ConcurrentModification(OrderId(4))));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let err = ServerError::from(TicketUsageError::Usage(UsageError::BelowMinimum));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = ServerError::from(TicketUsageError::Usage(UsageError::AboveMaximum));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = ServerError::from(CatalogError::Forbidden);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = ServerError::from(SessionError::StoreError(StoreError::DatabaseError("disk full".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
