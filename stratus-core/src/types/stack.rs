//! Stack domain types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A stack as declared in the stack config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescriptor {
    /// Stack name (unique across the config)
    pub name: String,

    /// Config section the stack was declared in
    pub section: String,

    /// Path to the template on the local file system
    pub template_path: PathBuf,

    /// Path to a JSON parameters file
    pub params_path: Option<PathBuf>,

    /// Capabilities granted to the stack (e.g. CAPABILITY_IAM)
    pub capabilities: Vec<String>,

    /// Stacks that must exist before this one is created
    pub depends_on: Vec<String>,

    /// Key pairs provisioned before any stack is created
    pub keys: Vec<String>,
}

impl StackDescriptor {
    /// Create a descriptor with only a name and template.
    pub fn new(name: impl Into<String>, template_path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            section: name.clone(),
            name,
            template_path: template_path.into(),
            params_path: None,
            capabilities: Vec::new(),
            depends_on: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Builder-style helper to set dependencies.
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }
}

/// Remote stack status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackStatus {
    CreateInProgress,
    CreateComplete,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
    /// Any status the orchestrator does not drive on, kept verbatim.
    Other(String),
}

impl StackStatus {
    /// Parse status from the provider's string form.
    pub fn parse(s: &str) -> Self {
        match s {
            "CREATE_IN_PROGRESS" => StackStatus::CreateInProgress,
            "CREATE_COMPLETE" => StackStatus::CreateComplete,
            "DELETE_IN_PROGRESS" => StackStatus::DeleteInProgress,
            "DELETE_COMPLETE" => StackStatus::DeleteComplete,
            "DELETE_FAILED" => StackStatus::DeleteFailed,
            other => StackStatus::Other(other.to_string()),
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &str {
        match self {
            StackStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            StackStatus::CreateComplete => "CREATE_COMPLETE",
            StackStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            StackStatus::DeleteComplete => "DELETE_COMPLETE",
            StackStatus::DeleteFailed => "DELETE_FAILED",
            StackStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observed remote state of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackInfo {
    pub name: String,
    pub status: StackStatus,
    /// Provider-supplied reason for the current status
    pub reason: Option<String>,
}

impl StackInfo {
    pub fn new(name: impl Into<String>, status: StackStatus) -> Self {
        Self { name: name.into(), status, reason: None }
    }

    /// A deleted stack still visible by id counts as absent.
    pub fn is_gone(&self) -> bool {
        self.status == StackStatus::DeleteComplete
    }
}

/// Template parameter, in the CloudFormation parameters-file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    pub parameter_key: String,
    pub parameter_value: String,
}

/// Everything the provider needs to create a stack.
#[derive(Debug, Clone)]
pub struct CreateStackRequest {
    pub name: String,
    pub template_body: String,
    pub parameters: Option<Vec<Parameter>>,
    pub capabilities: Vec<String>,
}

/// Private key material returned when a key pair is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyMaterial {
    pub key_name: String,
    pub key_material: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_known() {
        assert_eq!(StackStatus::parse("CREATE_COMPLETE"), StackStatus::CreateComplete);
        assert_eq!(StackStatus::parse("DELETE_IN_PROGRESS"), StackStatus::DeleteInProgress);
        assert_eq!(StackStatus::parse("DELETE_FAILED").as_str(), "DELETE_FAILED");
    }

    #[test]
    fn test_status_parse_unknown_kept_verbatim() {
        let status = StackStatus::parse("ROLLBACK_COMPLETE");
        assert_eq!(status, StackStatus::Other("ROLLBACK_COMPLETE".to_string()));
        assert_eq!(status.to_string(), "ROLLBACK_COMPLETE");
    }

    #[test]
    fn test_parameters_file_layout() {
        let json = r#"[{"ParameterKey": "EnvironmentName", "ParameterValue": "prod"}]"#;
        let params: Vec<Parameter> = serde_json::from_str(json).unwrap();
        assert_eq!(params[0].parameter_key, "EnvironmentName");
        assert_eq!(params[0].parameter_value, "prod");
    }
}
