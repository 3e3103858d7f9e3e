mod acl;
mod session;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use session::{Caller, SessionMiddlewareFactory, SessionMiddlewareService, AUTH_HEADER};
