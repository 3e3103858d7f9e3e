use std::sync::Mutex;

use blake2::{Blake2b512, Digest};
use rand::{rngs::StdRng, Rng, SeedableRng};

const TOKEN_SPACE: u64 = 1_000_000_000_000;

/// Generates customer-facing order tokens and door-scan session ids of the form `1234-5678-9012`.
///
/// Tokens are not reserved. Callers that need uniqueness must check the store and draw again on a collision.
#[derive(Debug)]
pub struct TokenGenerator {
    rng: Mutex<StdRng>,
}

impl TokenGenerator {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// A deterministic generator. The same seed always yields the same sequence of tokens.
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    pub fn next_token(&self) -> String {
        let value = match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..TOKEN_SPACE),
            Err(poisoned) => poisoned.into_inner().gen_range(0..TOKEN_SPACE),
        };
        format!("{:04}-{:04}-{:04}", value / 100_000_000, value / 10_000 % 10_000, value % 10_000)
    }

    /// A longer random string for bearer tokens.
    pub fn next_secret(&self) -> String {
        (0..4).map(|_| self.next_token().replace('-', "")).collect()
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Session tokens are only stored as a hash.
pub fn hash_session_token(token: &str) -> String {
    Blake2b512::digest(token.as_bytes()).iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod test {
    use regex::Regex;

    use super::*;

    #[test]
    fn token_format() {
        let re = Regex::new(r"^\d{4}-\d{4}-\d{4}$").unwrap();
        let gen = TokenGenerator::new();
        for _ in 0..100 {
            let token = gen.next_token();
            assert!(re.is_match(&token), "{token}");
        }
        assert_eq!(gen.next_secret().len(), 48);
    }

    #[test]
    fn seeded_generators_repeat() {
        let a = TokenGenerator::from_seed(42);
        let b = TokenGenerator::from_seed(42);
        let first = a.next_token();
        assert_eq!(first, b.next_token());
        assert_ne!(first, a.next_token());
    }

    #[test]
    fn hashes_are_stable_hex() {
        let h = hash_session_token("abc");
        assert_eq!(h.len(), 128);
        assert_eq!(h, hash_session_token("abc"));
        assert_ne!(h, hash_session_token("abd"));
    }
}
