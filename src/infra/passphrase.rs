//! Environment-backed passphrase loading.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::ports::PassphraseLoader;
use crate::domain::error::PassphraseError;
use crate::domain::scope::PassphraseScope;

/// `PassphraseLoader` honoring the conventional variables:
/// `PULUMI_CONFIG_PASSPHRASE` first, then `PULUMI_CONFIG_PASSPHRASE_FILE`.
///
/// The snapshot is taken at context construction, so per-context overrides
/// work without mutating the process environment.
pub struct EnvPassphraseLoader {
    environ: HashMap<String, String>,
}

impl EnvPassphraseLoader {
    #[must_use]
    pub fn new(environ: HashMap<String, String>) -> Self {
        Self { environ }
    }

    fn env(&self, name: &str) -> Option<&str> {
        self.environ
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl PassphraseLoader for EnvPassphraseLoader {
    async fn load_passphrase(
        &self,
        scope: &PassphraseScope,
        passphrase_id: Option<&str>,
    ) -> Result<String> {
        if let Some(passphrase) = self.env("PULUMI_CONFIG_PASSPHRASE") {
            return Ok(passphrase.to_string());
        }
        if let Some(file) = self.env("PULUMI_CONFIG_PASSPHRASE_FILE") {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("cannot read passphrase file {file}"))?;
            return Ok(content.trim_end_matches(['\r', '\n']).to_string());
        }
        Err(PassphraseError::NotFound {
            scope: scope.clone(),
            passphrase_id: passphrase_id.map(str::to_string),
        }
        .into())
    }
}
