//! # pb-auth-simple
//!
//! Email sign-in without an external provider. Any well-formed email with a
//! non-empty password is accepted; the uid is a salted hash of the email so
//! the same address always maps to the same user.

use async_trait::async_trait;
use anyhow::bail;
use pb_core::models::{Credentials, User};
use pb_core::traits::IdentityProvider;
use sha2::{Digest, Sha256};

pub struct SimpleIdentity {
    /// Secret salt for deriving stable uids (e.g., from an environment variable)
    salt: String,
}

impl SimpleIdentity {
    pub fn new(salt: &str) -> Self {
        Self { salt: salt.to_string() }
    }

    /// 16 hex characters derived from salt + normalized email.
    fn uid_for(&self, email: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(email.as_bytes());
        let hash = hex::encode(hasher.finalize());
        hash[..16].to_string()
    }
}

fn is_well_formed(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[async_trait]
impl IdentityProvider for SimpleIdentity {
    async fn sign_in(&self, credentials: Credentials) -> anyhow::Result<User> {
        let email = credentials.email.trim().to_lowercase();
        if !is_well_formed(&email) {
            bail!("invalid email address");
        }
        if credentials.password.is_empty() {
            bail!("password is required");
        }

        let local = email.split('@').next().unwrap_or_default().to_string();
        Ok(User {
            uid: Some(self.uid_for(&email)),
            display_name: Some(local),
            photo_url: None,
            email,
        })
    }

    async fn sign_out(&self) {
        tracing::debug!("simple identity has no remote session to close");
    }
}
