use std::fmt::Debug;

use crate::{
    errors::{Result, SavePageNowError},
    utils::{ACCESS_KEY_ENV, SECRET_KEY_ENV},
};

/// archive.org S3-style keys, see https://archive.org/account/s3.php
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key: &str, secret_key: &str) -> Self {
        Credentials {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let access = std::env::var(ACCESS_KEY_ENV).ok()?;
        let secret = std::env::var(SECRET_KEY_ENV).ok()?;
        Self::from_parts(Some(access), Some(secret))
    }

    fn from_parts(access: Option<String>, secret: Option<String>) -> Option<Self> {
        match (access, secret) {
            (Some(a), Some(s)) if !a.is_empty() && !s.is_empty() => Some(Self::new(&a, &s)),
            _ => None,
        }
    }

    /// Explicit credentials win, the environment is the fallback.
    pub fn resolve(explicit: Option<&Credentials>) -> Result<Credentials> {
        if let Some(c) = explicit {
            return Ok(c.clone());
        }
        Self::from_env().ok_or(SavePageNowError::MissingCredentials {
            access_env: ACCESS_KEY_ENV,
            secret_env: SECRET_KEY_ENV,
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("LOW {}:{}", self.access_key, self.secret_key)
    }
}
