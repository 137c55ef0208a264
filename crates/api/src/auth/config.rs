use anyhow::{Context, Result};
use std::env;

/// Secret shared with the identity service that issues bearer tokens.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        })
    }
}
