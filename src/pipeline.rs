//! Pipeline records and their creation-time invariants

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// Webhook secrets are 16 random bytes, hex-encoded.
pub const WEBHOOK_SECRET_BYTES: usize = 16;

/// A named binding between a local checkout and a GitHub repository/branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineRecord {
    pub name: String,
    pub repo_directory: String,
    pub remote_token: String,
    pub branch_name: String,
    pub remote_owner: String,
    pub remote_repo: String,
    pub webhook_secret: String,
    pub created_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Connection fields supplied when creating a pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPipeline {
    pub name: String,
    pub repo_directory: String,
    pub remote_token: String,
    pub branch_name: String,
    pub remote_owner: String,
    pub remote_repo: String,
}

impl PipelineRecord {
    /// Build a new record from connection fields. Rejects invalid names
    /// before anything is written; the webhook secret is generated here
    /// and never again.
    pub fn create(fields: NewPipeline) -> Result<Self> {
        if !is_valid_name(&fields.name) {
            return Err(RelayError::Validation(format!(
                "Pipeline name '{}' is invalid. Use only letters, numbers, dashes, and underscores.",
                fields.name
            )));
        }

        Ok(Self {
            name: fields.name,
            repo_directory: fields.repo_directory,
            remote_token: fields.remote_token,
            branch_name: fields.branch_name,
            remote_owner: fields.remote_owner,
            remote_repo: fields.remote_repo,
            webhook_secret: generate_webhook_secret(),
            created_at: Utc::now(),
            last_run_at: None,
        })
    }
}

/// Pipeline names double as storage keys, so the whitelist is enforced
/// here rather than left to the backend.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Generate a webhook secret from the OS CSPRNG-seeded generator.
pub fn generate_webhook_secret() -> String {
    let mut bytes = [0u8; WEBHOOK_SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> NewPipeline {
        NewPipeline {
            name: name.to_string(),
            repo_directory: "/srv/app".to_string(),
            remote_token: "ghp_example".to_string(),
            branch_name: "main".to_string(),
            remote_owner: "octocat".to_string(),
            remote_repo: "hello-world".to_string(),
        }
    }

    #[test]
    fn accepts_alphanumeric_dash_underscore() {
        assert!(is_valid_name("my-awesome_project1"));
        assert!(is_valid_name("A"));
    }

    #[test]
    fn rejects_empty_and_special_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("../escape"));
        assert!(!is_valid_name("semi;colon"));
        assert!(!is_valid_name("uni\u{e9}"));
    }

    #[test]
    fn create_rejects_invalid_name() {
        let err = PipelineRecord::create(fields("../../etc")).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn create_generates_32_hex_char_secret() {
        let record = PipelineRecord::create(fields("demo")).unwrap();
        assert_eq!(record.webhook_secret.len(), 32);
        assert!(hex::decode(&record.webhook_secret).is_ok());
        assert!(record.last_run_at.is_none());
    }

    #[test]
    fn secrets_are_unique_per_record() {
        let a = PipelineRecord::create(fields("one")).unwrap();
        let b = PipelineRecord::create(fields("two")).unwrap();
        assert_ne!(a.webhook_secret, b.webhook_secret);
    }
}
