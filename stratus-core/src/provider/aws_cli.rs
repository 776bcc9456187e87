//! AWS CloudFormation provider backed by the `aws` command-line tool.
//!
//! Every call spawns `aws <service> <operation> --output json` and parses the
//! JSON it prints. Credentials and region come from the CLI's own
//! configuration unless a region or profile is set explicitly.

use super::StackProvider;
use crate::error::{Result, StratusError};
use crate::settings::Settings;
use crate::types::{CreateStackRequest, KeyMaterial, StackInfo, StackStatus};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Provider that shells out to the `aws` CLI.
#[derive(Debug, Clone)]
pub struct AwsCliProvider {
    /// Path or name of the `aws` binary.
    binary: String,
    region: Option<String>,
    profile: Option<String>,
}

/// Captured result of one CLI invocation.
struct CliOutput {
    success: bool,
    stdout: Vec<u8>,
    stderr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksOutput {
    #[serde(default)]
    stacks: Vec<RemoteStack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteStack {
    stack_name: String,
    stack_status: String,
    #[serde(default)]
    stack_status_reason: Option<String>,
}

impl AwsCliProvider {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into(), region: None, profile: None }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            binary: settings.aws_cli.clone(),
            region: settings.region.clone(),
            profile: settings.profile.clone(),
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Base command for `aws <service> <operation>` with output and scope flags.
    fn command(&self, service: &str, operation: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(service).arg(operation).arg("--output").arg("json");
        if let Some(region) = &self.region {
            cmd.arg("--region").arg(region);
        }
        if let Some(profile) = &self.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    fn create_command(&self, request: &CreateStackRequest) -> Result<Command> {
        let mut cmd = self.command("cloudformation", "create-stack");
        cmd.arg("--stack-name").arg(&request.name);
        cmd.arg("--template-body").arg(&request.template_body);

        if let Some(params) = &request.parameters {
            let json = serde_json::to_string(params).map_err(|e| StratusError::ProviderCall {
                stack: request.name.clone(),
                operation: "create-stack",
                reason: format!("Failed to encode parameters: {}", e),
            })?;
            cmd.arg("--parameters").arg(json);
        }
        if !request.capabilities.is_empty() {
            cmd.arg("--capabilities").args(&request.capabilities);
        }
        Ok(cmd)
    }

    async fn run(
        &self,
        mut cmd: Command,
        subject: &str,
        operation: &'static str,
    ) -> Result<CliOutput> {
        let output = cmd.output().await.map_err(|e| StratusError::ProviderCall {
            stack: subject.to_string(),
            operation,
            reason: format!("Failed to run {}: {}", self.binary, e),
        })?;

        Ok(CliOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Run a command whose only interesting result is success.
    async fn run_checked(
        &self,
        cmd: Command,
        subject: &str,
        operation: &'static str,
    ) -> Result<()> {
        let output = self.run(cmd, subject, operation).await?;
        if output.success {
            Ok(())
        } else {
            Err(StratusError::ProviderCall {
                stack: subject.to_string(),
                operation,
                reason: output.stderr,
            })
        }
    }
}

/// `describe-stacks` on a missing stack fails with a ValidationError naming it.
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("does not exist")
}

fn is_duplicate_key(stderr: &str) -> bool {
    stderr.contains("InvalidKeyPair.Duplicate")
}

fn parse_describe_output(name: &str, stdout: &[u8]) -> Result<Option<StackInfo>> {
    let parsed: DescribeStacksOutput =
        serde_json::from_slice(stdout).map_err(|e| StratusError::ProviderCall {
            stack: name.to_string(),
            operation: "describe-stacks",
            reason: format!("Unparseable response: {}", e),
        })?;

    Ok(parsed.stacks.into_iter().next().map(|stack| StackInfo {
        name: stack.stack_name,
        status: StackStatus::parse(&stack.stack_status),
        reason: stack.stack_status_reason,
    }))
}

#[async_trait]
impl StackProvider for AwsCliProvider {
    #[instrument(skip(self))]
    async fn describe(&self, name: &str) -> Result<Option<StackInfo>> {
        let mut cmd = self.command("cloudformation", "describe-stacks");
        cmd.arg("--stack-name").arg(name);

        let output = self.run(cmd, name, "describe-stacks").await?;
        if !output.success {
            if is_not_found(&output.stderr) {
                debug!("Stack not found");
                return Ok(None);
            }
            return Err(StratusError::ProviderCall {
                stack: name.to_string(),
                operation: "describe-stacks",
                reason: output.stderr,
            });
        }

        parse_describe_output(name, &output.stdout)
    }

    #[instrument(skip(self, request), fields(stack = %request.name))]
    async fn create(&self, request: &CreateStackRequest) -> Result<()> {
        let cmd = self.create_command(request)?;
        self.run_checked(cmd, &request.name, "create-stack").await
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<()> {
        let mut cmd = self.command("cloudformation", "delete-stack");
        cmd.arg("--stack-name").arg(name);
        self.run_checked(cmd, name, "delete-stack").await
    }

    #[instrument(skip(self, body), fields(bytes = body.len()))]
    async fn validate_template(&self, body: &str) -> Result<()> {
        let mut cmd = self.command("cloudformation", "validate-template");
        cmd.arg("--template-body").arg(body);
        self.run_checked(cmd, "template", "validate-template").await
    }

    #[instrument(skip(self))]
    async fn create_key_pair(&self, key_name: &str) -> Result<Option<KeyMaterial>> {
        let mut cmd = self.command("ec2", "create-key-pair");
        cmd.arg("--key-name").arg(key_name);

        let output = self.run(cmd, key_name, "create-key-pair").await?;
        if !output.success {
            if is_duplicate_key(&output.stderr) {
                return Ok(None);
            }
            return Err(StratusError::ProviderCall {
                stack: key_name.to_string(),
                operation: "create-key-pair",
                reason: output.stderr,
            });
        }

        let material = serde_json::from_slice(&output.stdout).map_err(|e| {
            StratusError::ProviderCall {
                stack: key_name.to_string(),
                operation: "create-key-pair",
                reason: format!("Unparseable response: {}", e),
            }
        })?;
        Ok(Some(material))
    }

    fn name(&self) -> &str {
        "aws-cli"
    }
}
