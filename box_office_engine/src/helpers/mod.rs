mod clock;
mod tokens;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use tokens::{hash_session_token, TokenGenerator};
