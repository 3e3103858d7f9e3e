use std::fmt::Display;

use box_office_engine::{
    db_types::{MemberId, OrderId, OrderSource, Privileges, ProductId, Session},
    usage::UsageRequest,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Query string of the price list endpoint, e.g. `?p=adult-spring,child-spring&coupon=FRIENDS`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceListParams {
    /// Comma-separated product ids.
    #[serde(default)]
    pub p: String,
    #[serde(default)]
    pub coupon: Option<String>,
    #[serde(default)]
    pub source: Option<OrderSource>,
}

impl PriceListParams {
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.p.split(',').map(str::trim).filter(|s| !s.is_empty()).map(ProductId::from).collect()
    }
}

/// The usage counts settled on at the door for one scan session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageChange {
    pub scan: String,
    #[serde(default)]
    pub classes: Vec<UsageRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecorded {
    pub id: OrderId,
    pub scan: String,
}

/// Sent with a 200 status when a scanned order cannot be admitted, so that the door app can show why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRefusal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub username: String,
    #[serde(default)]
    pub member: Option<MemberId>,
    #[serde(default)]
    pub privileges: Privileges,
}

/// A freshly opened session. This is the only time the bearer token is sent to anyone.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    #[serde(flatten)]
    pub session: Session,
}

impl From<Session> for IssuedSession {
    fn from(session: Session) -> Self {
        Self { token: session.token.reveal().clone(), session }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConnection {
    pub secret: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn price_list_product_ids() {
        let params = PriceListParams { p: "adult-spring, child-spring,,".into(), ..Default::default() };
        assert_eq!(params.product_ids(), vec![ProductId::from("adult-spring"), ProductId::from("child-spring")]);
        assert!(PriceListParams::default().product_ids().is_empty());
    }
}
