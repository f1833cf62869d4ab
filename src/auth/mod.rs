//! Bearer token verification for protected routes.
//!
//! A missing `Authorization` header is rejected with 401; a token that
//! fails signature or expiry checks is rejected with 403. Verification
//! confirms nothing beyond the signature and embedded expiry - there is no
//! server-side access token state.

mod errors;
mod extractors;
mod ip;
mod state;

pub use errors::{AuthError, AuthErrorKind};
pub use extractors::BearerAuth;
pub use ip::extract_client_ip;
pub use state::HasAuthBackend;
