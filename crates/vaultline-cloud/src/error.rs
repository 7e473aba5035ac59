//! Cloud provider error types
//!
//! Provider implementations decide the [`ErrorClass`] of a failure once, at
//! the client boundary, by picking the matching [`CloudError`] variant. The
//! provisioning pipeline only ever looks at [`CloudError::class`].

use crate::orchestrator::Stage;
use crate::resource::ResourceKind;
use thiserror::Error;

/// How the pipeline reacts to a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The resource does not exist yet; triggers creation
    Absent,
    /// The resource or configuration already exists; triggers reuse
    Duplicate,
    /// Anything else; halts the run
    Fatal,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Absent => write!(f, "absent"),
            ErrorClass::Duplicate => write!(f, "duplicate"),
            ErrorClass::Fatal => write!(f, "fatal"),
        }
    }
}

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{kind} not found: {name}")]
    ResourceNotFound { kind: ResourceKind, name: String },

    #[error("{kind} already exists: {name}")]
    ResourceAlreadyExists { kind: ResourceKind, name: String },

    /// The resource existed earlier in the run but is gone now
    #[error("{kind} disappeared during provisioning: {name}")]
    Vanished { kind: ResourceKind, name: String },

    /// A duplicate where none can be tolerated
    #[error("{kind} conflicts with an existing resource: {name}")]
    Conflict { kind: ResourceKind, name: String },

    #[error("{kind} name is owned by another account: {name}")]
    NameUnavailable { kind: ResourceKind, name: String },

    #[error("Access denied on {kind} {name}: {message}")]
    AccessDenied {
        kind: ResourceKind,
        name: String,
        message: String,
    },

    #[error("API error on {kind} {name} ({code}): {message}")]
    ApiError {
        kind: ResourceKind,
        name: String,
        code: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn already_exists(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::ResourceAlreadyExists {
            kind,
            name: name.into(),
        }
    }

    pub fn access_denied(
        kind: ResourceKind,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AccessDenied {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn api(
        kind: ResourceKind,
        name: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ApiError {
            kind,
            name: name.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Classification tag carried by this error
    pub fn class(&self) -> ErrorClass {
        match self {
            CloudError::ResourceNotFound { .. } => ErrorClass::Absent,
            CloudError::ResourceAlreadyExists { .. } => ErrorClass::Duplicate,
            _ => ErrorClass::Fatal,
        }
    }

    /// Re-tag an absence or duplicate as fatal, keeping resource context.
    ///
    /// Used once the pipeline can no longer recover from either.
    pub fn into_fatal(self) -> Self {
        match self {
            CloudError::ResourceNotFound { kind, name } => CloudError::Vanished { kind, name },
            CloudError::ResourceAlreadyExists { kind, name } => CloudError::Conflict { kind, name },
            other => other,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.class() == ErrorClass::Absent
    }

    pub fn is_duplicate(&self) -> bool {
        self.class() == ErrorClass::Duplicate
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// A fatal failure that halted the provisioning pipeline
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("step `{step}` failed (last completed stage: {reached}): {source}")]
    StepFailed {
        /// Stage the failed step would have reached
        step: Stage,
        /// Last stage that completed successfully
        reached: Stage,
        #[source]
        source: CloudError,
    },
}

impl ProvisionError {
    pub fn step(&self) -> Stage {
        match self {
            ProvisionError::StepFailed { step, .. } => *step,
        }
    }

    pub fn reached(&self) -> Stage {
        match self {
            ProvisionError::StepFailed { reached, .. } => *reached,
        }
    }

    pub fn cloud_error(&self) -> &CloudError {
        match self {
            ProvisionError::StepFailed { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            CloudError::not_found(ResourceKind::Bucket, "logs").class(),
            ErrorClass::Absent
        );
        assert_eq!(
            CloudError::already_exists(ResourceKind::Role, "replicator").class(),
            ErrorClass::Duplicate
        );
        assert_eq!(
            CloudError::access_denied(ResourceKind::Trail, "audit", "denied").class(),
            ErrorClass::Fatal
        );
        assert_eq!(
            CloudError::NameUnavailable {
                kind: ResourceKind::Bucket,
                name: "taken".to_string(),
            }
            .class(),
            ErrorClass::Fatal
        );
        assert_eq!(
            CloudError::api(ResourceKind::Bucket, "logs", "SlowDown", "throttled").class(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn test_into_fatal_keeps_context() {
        let vanished = CloudError::not_found(ResourceKind::Role, "replicator").into_fatal();
        assert_eq!(vanished.class(), ErrorClass::Fatal);
        assert!(matches!(
            vanished,
            CloudError::Vanished {
                kind: ResourceKind::Role,
                ..
            }
        ));
        assert!(vanished.to_string().contains("replicator"));

        let conflict = CloudError::already_exists(ResourceKind::Trail, "audit").into_fatal();
        assert_eq!(conflict.class(), ErrorClass::Fatal);

        let denied = CloudError::access_denied(ResourceKind::Trail, "audit", "denied").into_fatal();
        assert!(matches!(denied, CloudError::AccessDenied { .. }));
    }

    #[test]
    fn test_step_failure_message() {
        let err = ProvisionError::StepFailed {
            step: Stage::TrailReady,
            reached: Stage::AuditPolicyApplied,
            source: CloudError::access_denied(ResourceKind::Trail, "audit", "not authorized"),
        };
        let message = err.to_string();
        assert!(message.contains("trail-ready"));
        assert!(message.contains("audit-policy-applied"));
        assert!(message.contains("not authorized"));
        assert_eq!(err.step(), Stage::TrailReady);
        assert!(!err.cloud_error().is_absent());
    }
}
