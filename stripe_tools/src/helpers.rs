/// A short human-readable card description, e.g. "Visa 4242", built from the card brand Stripe reports.
pub fn card_description(brand: &str, last4: &str) -> String {
    let brand = match brand {
        "amex" => "AmEx",
        "diners" => "Diners",
        "discover" => "Discover",
        "jcb" => "JCB",
        "mastercard" => "MasterCard",
        "unionpay" => "UnionPay",
        "visa" => "Visa",
        _ => "card",
    };
    format!("{brand} {last4}")
}
