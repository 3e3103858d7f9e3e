use regex::Regex;

/// Compiled patterns used to check customer and payment fields.
#[derive(Debug, Clone)]
pub struct Patterns {
    /// The pattern browsers apply to `<input type="email">`.
    pub email: Regex,
    pub state: Regex,
    pub zip: Regex,
    /// Gateway customer reference.
    pub customer: Regex,
    /// Gateway payment method reference.
    pub payment_method: Regex,
    /// Single-use card token from a card reader.
    pub card_token: Regex,
    /// Gateway payment intent reference.
    pub payment_intent: Regex,
}

impl Patterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            email: Regex::new(
                r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
            )?,
            state: Regex::new(r"^[A-Z][A-Z]$")?,
            zip: Regex::new(r"^\d{5}(?:-\d{4})?$")?,
            customer: Regex::new(r"^cus_[A-Za-z0-9]+$")?,
            payment_method: Regex::new(r"^pm_[A-Za-z0-9_]+$")?,
            card_token: Regex::new(r"^tok_[A-Za-z0-9_]*$")?,
            payment_intent: Regex::new(r"^pi_[A-Za-z0-9_]+$")?,
        })
    }

    pub fn is_payment_intent(&self, s: Option<&str>) -> bool {
        s.is_some_and(|s| self.payment_intent.is_match(s))
    }
}
