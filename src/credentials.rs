//! Static credential store loaded at startup.
//!
//! Credentials are plain `{user, password}` pairs compared with a direct
//! string comparison. Hashing is deliberately out of scope; the store
//! mirrors the proxy's single-UI-user config.

/// A single user/password pair. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub password: String,
}

impl Credential {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

/// Errors from credential verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// No credential matches the presented user name.
    UnknownUser,
    /// The matching credential's password differs.
    BadPassword,
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::UnknownUser => write!(f, "User does not exist"),
            CredentialError::BadPassword => write!(f, "Incorrect Password"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Process-wide list of registered credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    entries: Vec<Credential>,
}

impl CredentialStore {
    pub fn new(entries: Vec<Credential>) -> Self {
        Self { entries }
    }

    /// Verify a user/password pair against the store.
    pub fn verify(&self, user: &str, password: &str) -> Result<(), CredentialError> {
        let entry = self
            .entries
            .iter()
            .find(|c| c.user == user)
            .ok_or(CredentialError::UnknownUser)?;

        if entry.password != password {
            return Err(CredentialError::BadPassword);
        }

        Ok(())
    }
}
