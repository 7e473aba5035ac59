//! SDK error classification
//!
//! Every SDK failure is turned into a [`CloudError`] here, from the service
//! error code (or the HTTP status when the service sent no body, as S3 does
//! for `HeadBucket`).

use aws_sdk_s3::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use vaultline_cloud::{CloudError, ResourceKind};

const NOT_FOUND_CODES: &[&str] = &[
    "NotFound",
    "NoSuchBucket",
    "NoSuchEntity",
    "TrailNotFoundException",
];

const ALREADY_EXISTS_CODES: &[&str] = &[
    "BucketAlreadyOwnedByYou",
    "EntityAlreadyExists",
    "TrailAlreadyExistsException",
];

/// Bucket names are global: this one belongs to another account
const NAME_TAKEN_CODES: &[&str] = &["BucketAlreadyExists"];

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "Forbidden",
    "UnauthorizedOperation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classified {
    NotFound,
    AlreadyExists,
    NameTaken,
    AccessDenied,
    Other,
}

pub(crate) fn classify_code(code: Option<&str>, status: Option<u16>) -> Classified {
    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => Classified::NotFound,
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => Classified::AlreadyExists,
        Some(c) if NAME_TAKEN_CODES.contains(&c) => Classified::NameTaken,
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => Classified::AccessDenied,
        Some(_) => Classified::Other,
        None => match status {
            Some(404) => Classified::NotFound,
            Some(403) => Classified::AccessDenied,
            _ => Classified::Other,
        },
    }
}

pub(crate) fn into_cloud_error<E>(err: SdkError<E>, kind: ResourceKind, name: &str) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let (code, message) = match err.as_service_error() {
        Some(service) => (
            service.code().map(str::to_owned),
            service.message().map(str::to_owned),
        ),
        None => (None, None),
    };
    let message = message.unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    let classified = classify_code(code.as_deref(), status);
    tracing::debug!(
        %kind,
        name,
        code = code.as_deref().unwrap_or("-"),
        status = status.unwrap_or_default(),
        "SDK error classified as {:?}",
        classified
    );

    match classified {
        Classified::NotFound => CloudError::not_found(kind, name),
        Classified::AlreadyExists => CloudError::already_exists(kind, name),
        Classified::NameTaken => CloudError::NameUnavailable {
            kind,
            name: name.to_string(),
        },
        Classified::AccessDenied => CloudError::access_denied(kind, name, message),
        Classified::Other => CloudError::api(
            kind,
            name,
            code.unwrap_or_else(|| "Unknown".to_string()),
            message,
        ),
    }
}

/// Attach resource context to an SDK result
pub(crate) trait Classify<T> {
    fn classify(self, kind: ResourceKind, name: &str) -> vaultline_cloud::Result<T>;
}

impl<T, E> Classify<T> for Result<T, SdkError<E>>
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    fn classify(self, kind: ResourceKind, name: &str) -> vaultline_cloud::Result<T> {
        self.map_err(|e| into_cloud_error(e, kind, name))
    }
}

/// A request could not be built from the desired configuration
pub(crate) fn invalid_request(err: BuildError) -> CloudError {
    CloudError::InvalidConfig(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family() {
        for code in ["NotFound", "NoSuchBucket", "NoSuchEntity", "TrailNotFoundException"] {
            assert_eq!(classify_code(Some(code), Some(400)), Classified::NotFound);
        }
        assert_eq!(classify_code(None, Some(404)), Classified::NotFound);
    }

    #[test]
    fn test_already_exists_family() {
        for code in [
            "BucketAlreadyOwnedByYou",
            "EntityAlreadyExists",
            "TrailAlreadyExistsException",
        ] {
            assert_eq!(classify_code(Some(code), Some(409)), Classified::AlreadyExists);
        }
    }

    #[test]
    fn test_bucket_owned_elsewhere_is_not_a_duplicate() {
        assert_eq!(
            classify_code(Some("BucketAlreadyExists"), Some(409)),
            Classified::NameTaken
        );
    }

    #[test]
    fn test_everything_else_is_fatal() {
        assert_eq!(classify_code(Some("AccessDenied"), Some(403)), Classified::AccessDenied);
        assert_eq!(classify_code(None, Some(403)), Classified::AccessDenied);
        assert_eq!(classify_code(Some("SlowDown"), Some(503)), Classified::Other);
        assert_eq!(classify_code(Some("MalformedPolicyDocument"), Some(400)), Classified::Other);
        assert_eq!(classify_code(None, None), Classified::Other);
        assert_eq!(classify_code(None, Some(500)), Classified::Other);
    }
}
