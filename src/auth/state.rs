//! Authentication state trait.

use crate::jwt::JwtConfig;

/// Trait for state types that expose the JWT verifier to the auth
/// extractor. Keeps the extractor usable from any router state that
/// carries a `JwtConfig`.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
}
