//! `ProjectSource` backed by the pulumi CLI.
//!
//! Projects are subdirectories of a project root; outputs are fetched by
//! running `pulumi stack output --json` inside the project directory with
//! the context's environment snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::application::ports::{
    CommandRunner, CommandSpec, ProjectSource, StackProject,
};
use crate::domain::outputs::OutputMap;

/// Stack-output source that shells out to the discovered pulumi CLI.
pub struct CliStackBackend {
    cli: PathBuf,
    project_root: PathBuf,
    environ: HashMap<String, String>,
    runner: Arc<dyn CommandRunner>,
}

impl CliStackBackend {
    #[must_use]
    pub fn new(
        cli: PathBuf,
        project_root: PathBuf,
        environ: HashMap<String, String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            cli,
            project_root,
            environ,
            runner,
        }
    }
}

impl ProjectSource for CliStackBackend {
    fn project(&self, name: Option<&str>) -> Result<Arc<dyn StackProject>> {
        let (name, dir) = match name {
            Some(name) => (name.to_string(), self.project_root.join(name)),
            // The project root itself is the current project.
            None => {
                let name = self
                    .project_root
                    .file_name()
                    .map_or_else(|| "default".to_string(), |n| n.to_string_lossy().into_owned());
                (name, self.project_root.clone())
            }
        };
        if !dir.is_dir() {
            bail!("project directory {} does not exist", dir.display());
        }
        Ok(Arc::new(CliProject {
            name,
            dir,
            cli: self.cli.clone(),
            environ: self.environ.clone(),
            runner: Arc::clone(&self.runner),
        }))
    }

    fn current_stack_name(&self) -> Result<String> {
        self.environ
            .get("PULUMI_STACK")
            .filter(|v| !v.is_empty())
            .cloned()
            .context("no stack name given and PULUMI_STACK is not set")
    }
}

struct CliProject {
    name: String,
    dir: PathBuf,
    cli: PathBuf,
    environ: HashMap<String, String>,
    runner: Arc<dyn CommandRunner>,
}

#[async_trait]
impl StackProject for CliProject {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stack_outputs(&self, stack_name: &str, decrypt_secrets: bool) -> Result<OutputMap> {
        let mut args = vec!["stack", "output", "--json", "--stack", stack_name];
        if decrypt_secrets {
            args.push("--show-secrets");
        }
        let output = self
            .runner
            .run(CommandSpec {
                program: &self.cli,
                args: &args,
                cwd: Some(&self.dir),
                envs: &self.environ,
                timeout: None,
            })
            .await?;
        if !output.status.success() {
            bail!(
                "pulumi stack output failed for stack '{stack_name}' in project '{}': {}",
                self.name,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        serde_json::from_slice(&output.stdout).with_context(|| {
            format!("cannot parse pulumi stack output for stack '{stack_name}'")
        })
    }
}
