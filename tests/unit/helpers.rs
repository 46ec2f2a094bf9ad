//! Shared test helpers: counting fakes for the port traits.

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use stratus::domain::error::PassphraseError;
use stratus::domain::identity::AwsIdentity;
use stratus::domain::outputs::OutputMap;
use stratus::domain::scope::PassphraseScope;
use stratus::domain::session::AwsSession;
use stratus::ports::{
    IdentitySource, PassphraseLoader, ProjectSource, SessionLoader, StackProject,
};

pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_REGION: &str = "us-east-1";

pub fn test_identity(account: &str) -> AwsIdentity {
    AwsIdentity {
        account_id: account.to_string(),
        user_arn: format!("arn:aws:iam::{account}:user/deployer"),
        user_id: "AIDATESTEXAMPLE".to_string(),
    }
}

pub fn environ(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ── Session loader fake ───────────────────────────────────────────────────────

/// Loads sessions bound to a fixed region, counting invocations.
pub struct FixedSessionLoader {
    pub region: String,
    pub calls: AtomicUsize,
}

impl FixedSessionLoader {
    pub fn new(region: &str) -> Arc<Self> {
        Arc::new(Self {
            region: region.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLoader for FixedSessionLoader {
    async fn load_session(
        &self,
        _account: Option<&str>,
        _region: Option<&str>,
    ) -> Result<AwsSession> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AwsSession::new(self.region.clone(), None))
    }
}

// ── Identity source fakes ─────────────────────────────────────────────────────

/// Reports a fixed account, counting "who am I" round-trips.
pub struct FixedIdentitySource {
    pub identity: AwsIdentity,
    pub calls: AtomicUsize,
}

impl FixedIdentitySource {
    pub fn new(account: &str) -> Arc<Self> {
        Arc::new(Self {
            identity: test_identity(account),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentitySource for FixedIdentitySource {
    async fn caller_identity(&self, _session: &AwsSession) -> Result<AwsIdentity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.identity.clone())
    }
}

/// Identity lookup that always fails, e.g. expired credentials.
pub struct FailingIdentitySource;

#[async_trait]
impl IdentitySource for FailingIdentitySource {
    async fn caller_identity(&self, _session: &AwsSession) -> Result<AwsIdentity> {
        anyhow::bail!("sts get-caller-identity failed: credentials expired")
    }
}

// ── Passphrase loader fakes ───────────────────────────────────────────────────

/// Returns a fixed passphrase, counting invocations.
pub struct FixedPassphraseLoader {
    pub passphrase: String,
    pub calls: AtomicUsize,
}

impl FixedPassphraseLoader {
    pub fn new(passphrase: &str) -> Arc<Self> {
        Arc::new(Self {
            passphrase: passphrase.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PassphraseLoader for FixedPassphraseLoader {
    async fn load_passphrase(
        &self,
        _scope: &PassphraseScope,
        _passphrase_id: Option<&str>,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.passphrase.clone())
    }
}

/// Loader for a non-interactive environment: always `NotFound`.
pub struct UnavailablePassphraseLoader {
    pub calls: AtomicUsize,
}

impl UnavailablePassphraseLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PassphraseLoader for UnavailablePassphraseLoader {
    async fn load_passphrase(
        &self,
        scope: &PassphraseScope,
        passphrase_id: Option<&str>,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PassphraseError::NotFound {
            scope: scope.clone(),
            passphrase_id: passphrase_id.map(str::to_string),
        }
        .into())
    }
}

// ── Stack output fakes ────────────────────────────────────────────────────────

pub fn sample_outputs() -> OutputMap {
    let mut outputs = OutputMap::new();
    outputs.insert("vpc_id".to_string(), json!("vpc-0abc"));
    outputs.insert("subnet_count".to_string(), json!(3));
    outputs.insert("nameservers".to_string(), json!(["ns1", "ns2"]));
    outputs
}

/// In-memory `ProjectSource` serving canned outputs, counting fetches.
pub struct InMemoryProjectSource {
    pub project_name: String,
    pub current_stack: String,
    pub outputs: OutputMap,
    pub fetches: Arc<AtomicUsize>,
}

impl InMemoryProjectSource {
    pub fn new(outputs: OutputMap) -> Arc<Self> {
        Arc::new(Self {
            project_name: "aws-env".to_string(),
            current_stack: "dev".to_string(),
            outputs,
            fetches: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ProjectSource for InMemoryProjectSource {
    fn project(&self, name: Option<&str>) -> Result<Arc<dyn StackProject>> {
        Ok(Arc::new(InMemoryProject {
            name: name.unwrap_or(&self.project_name).to_string(),
            outputs: self.outputs.clone(),
            fetches: Arc::clone(&self.fetches),
        }))
    }

    fn current_stack_name(&self) -> Result<String> {
        Ok(self.current_stack.clone())
    }
}

pub struct InMemoryProject {
    name: String,
    outputs: OutputMap,
    fetches: Arc<AtomicUsize>,
}

#[async_trait]
impl StackProject for InMemoryProject {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stack_outputs(&self, stack_name: &str, _decrypt_secrets: bool) -> Result<OutputMap> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if stack_name == "broken" {
            anyhow::bail!("backend unreachable");
        }
        Ok(self.outputs.clone())
    }
}
