// Environment variable loading

use crate::{HttpClientError, Result};
use std::env;

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Full variable name for a key.
    pub fn key(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = self.key(key);
        env::var(&full_key).map_err(|e| HttpClientError::Config(format!("{full_key}: {e}")))
    }

    /// Load an optional variable; absent or non-unicode values yield `None`.
    pub fn load_opt(&self, key: &str) -> Option<String> {
        env::var(self.key(key)).ok()
    }
}
