//! JWT authentication.
//!
//! Dual-token system: short-lived access tokens (default 15 min, stateless)
//! and long-lived refresh tokens (default 7 days) delivered in an HttpOnly
//! cookie. Refresh tokens rotate on use and are tracked in the revocation
//! store once spent or logged out.

mod cookie;
mod errors;
mod extractors;
mod session;
mod state;

pub use cookie::{
    ACCESS_COOKIE_NAME, CookieDescriptor, REFRESH_COOKIE_NAME, SameSite, describe, get_cookie,
};
pub use errors::SessionEnded;
pub use extractors::{
    Auth, AuthStage, authenticate, authenticate_at, bearer_token, extract_from, require_auth,
};
pub use session::SessionError;
pub use state::{AuthBackend, HasAuthBackend};
