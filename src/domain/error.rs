//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator. None of them are recoverable at
//! this layer — callers either retry from scratch or give up.

use thiserror::Error;

use crate::domain::scope::PassphraseScope;

// ── Session errors ────────────────────────────────────────────────────────────

/// Errors raised while acquiring and validating provider sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("loaded AWS session region '{actual}' does not match required region '{requested}'")]
    RegionMismatch { requested: String, actual: String },

    #[error("loaded AWS session account '{actual}' does not match required account '{requested}'")]
    AccountMismatch { requested: String, actual: String },
}

// ── Passphrase errors ─────────────────────────────────────────────────────────

/// Errors raised by secret-passphrase resolution.
#[derive(Debug, Error)]
pub enum PassphraseError {
    #[error("no secrets passphrase available for {scope}{}", format_id(.passphrase_id))]
    NotFound {
        scope: PassphraseScope,
        passphrase_id: Option<String>,
    },
}

fn format_id(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(", passphrase_id={id}"),
        None => String::new(),
    }
}

// ── Stack output errors ───────────────────────────────────────────────────────

/// Errors surfaced by stack-output projections.
///
/// `Clone` is required: one memoized resolution is observed by every
/// derived promise, so a single failure has to be reportable many times.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutputError {
    #[error("stack '{stack}' has no output named '{name}'")]
    MissingOutput { stack: String, name: String },

    #[error("failed to fetch outputs of stack '{stack}': {reason}")]
    Fetch { stack: String, reason: String },

    #[error("failed to render deferred value: {reason}")]
    Render { reason: String },
}

// ── Tool discovery errors ─────────────────────────────────────────────────────

/// Errors related to locating the provisioning CLI.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unable to locate the pulumi CLI executable in PATH")]
    NotFound,
}
