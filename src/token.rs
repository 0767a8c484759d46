//! API key verification.
//!
//! Keys are opaque 32-character uppercase-hex strings. The leading snippet
//! is stored in the clear as an index accelerator; the full key is only
//! ever compared against a salted one-way hash. At the boundary every
//! failure collapses into [`Error::Unauthorized`] so a caller cannot
//! distinguish an unknown key from a near-miss; the precise cause is
//! logged server-side.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::{Error, Result};
use crate::store::Store;

/// Exact length of a raw API key.
pub const API_KEY_LEN: usize = 32;
/// Length of the stored lookup snippet.
pub const SNIPPET_LEN: usize = 8;

pub struct TokenVerifier {
    store: Arc<dyn Store>,
}

impl TokenVerifier {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Verify a raw API key and return the owning tenant.
    pub async fn verify(&self, api_key: &str) -> Result<String> {
        match self.check(api_key).await {
            Ok(sub) => Ok(sub),
            Err(e) => {
                tracing::debug!(error = %e, "api key rejected");
                Err(Error::Unauthorized)
            }
        }
    }

    /// Typed verification pipeline. The format gate runs before any store
    /// access, so malformed keys never cost a lookup.
    pub(crate) async fn check(&self, api_key: &str) -> Result<String> {
        if api_key.is_empty() {
            return Err(Error::InvalidFormat("empty api key".into()));
        }
        if api_key.len() != API_KEY_LEN
            || !api_key.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        {
            return Err(Error::InvalidFormat("malformed api key".into()));
        }

        let snippet = &api_key[..SNIPPET_LEN];
        let token = self
            .store
            .find_token_by_snippet(snippet)
            .await?
            .ok_or_else(|| Error::NotFound("token".into()))?;
        if token.hash.is_empty() {
            return Err(Error::NotFound("token".into()));
        }

        let parsed = PasswordHash::new(&token.hash)
            .map_err(|_| Error::NotFound("token".into()))?;
        Argon2::default()
            .verify_password(api_key.as_bytes(), &parsed)
            .map_err(|_| Error::NotFound("token".into()))?;

        Ok(token.sub)
    }
}

/// Hash a raw API key for storage. The salt and parameters are embedded in
/// the returned PHC string.
pub fn hash_api_key(api_key: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(api_key.as_bytes(), &salt)
        .map_err(|e| Error::Config(format!("api key hashing failed: {e}")))?;
    Ok(hash.to_string())
}
