//! SSH key-pair provisioning.
//!
//! Stacks may declare `keys` that their templates reference. Those key pairs
//! are created before any stack task starts, and the private key of each new
//! pair is written to `<key_dir>/<key name>.pem`. Existing pairs are left
//! untouched.

use crate::error::{Result, StratusError};
use crate::provider::StackProvider;
use crate::types::StackDescriptor;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Outcome of provisioning one key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPairOutcome {
    /// Created; private key written to this path.
    Created(PathBuf),
    /// A key pair with this name already existed.
    Existing,
}

/// Create every key pair declared by `stacks`, in declaration order.
///
/// A name declared by several stacks is provisioned once.
pub async fn provision_key_pairs(
    provider: &dyn StackProvider,
    stacks: &[StackDescriptor],
    key_dir: &Path,
) -> Result<Vec<(String, KeyPairOutcome)>> {
    let mut outcomes: Vec<(String, KeyPairOutcome)> = Vec::new();

    for key_name in stacks.iter().flat_map(|s| s.keys.iter()) {
        if outcomes.iter().any(|(name, _)| name == key_name) {
            continue;
        }

        let outcome = match provider.create_key_pair(key_name).await? {
            Some(material) => {
                let path = write_private_key(key_dir, &material.key_name, &material.key_material)
                    .await?;
                info!(key = %key_name, path = %path.display(), "Created key pair");
                KeyPairOutcome::Created(path)
            }
            None => {
                debug!("{} exists.", key_name);
                KeyPairOutcome::Existing
            }
        };
        outcomes.push((key_name.clone(), outcome));
    }

    Ok(outcomes)
}

async fn write_private_key(key_dir: &Path, key_name: &str, material: &str) -> Result<PathBuf> {
    let path = key_dir.join(format!("{}.pem", key_name));
    let write_err = |source| StratusError::KeyPairWrite {
        key_name: key_name.to_string(),
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(key_dir).await.map_err(write_err)?;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    // Owner-only from creation.
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&path).await.map_err(write_err)?;
    file.write_all(material.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;

    // A file left by an earlier run keeps its old mode on open.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(write_err)?;
    }

    debug!("Wrote content to {}", path.display());
    Ok(path)
}
