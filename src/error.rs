//! Failure classification for package inspection.
//!
//! Every failure that leaves the resolution engine is exactly one
//! [`InspectError`] variant. Each variant maps to a [`FailureKind`] and a
//! distinct process exit status so scripts can branch on the failure class.

use std::fmt;

use thiserror::Error;

/// Class of a failure, in ascending specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    InvalidArgument,
    PackageNotFound,
    VersionNotFound,
    FeedAccess,
    Authentication,
    DescriptorParse,
    UnexpectedInternal,
    Cancelled,
}

impl FailureKind {
    /// Process exit status for this failure class.
    pub fn exit_code(self) -> i32 {
        match self {
            FailureKind::InvalidArgument => 1,
            FailureKind::PackageNotFound => 2,
            FailureKind::VersionNotFound => 3,
            FailureKind::FeedAccess => 4,
            FailureKind::Authentication => 5,
            FailureKind::DescriptorParse => 6,
            FailureKind::UnexpectedInternal => 7,
            // Same status a shell reports for SIGINT
            FailureKind::Cancelled => 130,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidArgument => "invalid-argument",
            FailureKind::PackageNotFound => "package-not-found",
            FailureKind::VersionNotFound => "version-not-found",
            FailureKind::FeedAccess => "feed-access",
            FailureKind::Authentication => "authentication",
            FailureKind::DescriptorParse => "descriptor-parse",
            FailureKind::UnexpectedInternal => "unexpected-internal",
            FailureKind::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// A classified inspection failure.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Package '{id}' was not found on any configured feed.")]
    PackageNotFound { id: String },

    #[error("Version '{version}' of package '{id}' was not found.")]
    VersionNotFound { id: String, version: String },

    /// Network or protocol failure. `feed` is absent when no source was involved.
    #[error("{message}")]
    FeedAccess {
        feed: Option<String>,
        message: String,
    },

    #[error("{message}")]
    Authentication { feed: String, message: String },

    #[error("{0}")]
    DescriptorParse(String),

    #[error("Unexpected error: {0}")]
    UnexpectedInternal(String),

    #[error("Operation cancelled.")]
    Cancelled,
}

impl InspectError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        InspectError::InvalidArgument(message.into())
    }

    /// Feed access failure attributed to a named source.
    pub fn feed_access(feed: &str, detail: impl fmt::Display) -> Self {
        InspectError::FeedAccess {
            feed: Some(feed.to_string()),
            message: format!("Failed to access source '{}': {}", feed, detail),
        }
    }

    pub fn authentication(feed: &str, detail: impl fmt::Display) -> Self {
        InspectError::Authentication {
            feed: feed.to_string(),
            message: format!("Authentication failed for source '{}': {}", feed, detail),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            InspectError::InvalidArgument(_) => FailureKind::InvalidArgument,
            InspectError::PackageNotFound { .. } => FailureKind::PackageNotFound,
            InspectError::VersionNotFound { .. } => FailureKind::VersionNotFound,
            InspectError::FeedAccess { .. } => FailureKind::FeedAccess,
            InspectError::Authentication { .. } => FailureKind::Authentication,
            InspectError::DescriptorParse(_) => FailureKind::DescriptorParse,
            InspectError::UnexpectedInternal(_) => FailureKind::UnexpectedInternal,
            InspectError::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// Name of the source the failure is attributed to, if any.
    pub fn feed(&self) -> Option<&str> {
        match self {
            InspectError::FeedAccess { feed, .. } => feed.as_deref(),
            InspectError::Authentication { feed, .. } => Some(feed),
            _ => None,
        }
    }
}

/// Classify an arbitrary error at the outermost boundary.
///
/// Errors that already carry an [`InspectError`] keep their class; everything
/// else becomes [`InspectError::UnexpectedInternal`].
impl From<anyhow::Error> for InspectError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<InspectError>() {
            Ok(inspect) => inspect,
            Err(other) => InspectError::UnexpectedInternal(format!("{:#}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct() {
        let kinds = [
            FailureKind::InvalidArgument,
            FailureKind::PackageNotFound,
            FailureKind::VersionNotFound,
            FailureKind::FeedAccess,
            FailureKind::Authentication,
            FailureKind::DescriptorParse,
            FailureKind::UnexpectedInternal,
            FailureKind::Cancelled,
        ];
        let codes: HashSet<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), kinds.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(InspectError::invalid_argument("x").exit_code(), 1);
        assert_eq!(
            InspectError::PackageNotFound { id: "Foo".into() }.exit_code(),
            2
        );
        assert_eq!(
            InspectError::VersionNotFound {
                id: "Foo".into(),
                version: "1.0.0".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(InspectError::feed_access("nuget.org", "boom").exit_code(), 4);
        assert_eq!(InspectError::authentication("private", "401").exit_code(), 5);
        assert_eq!(InspectError::DescriptorParse("bad".into()).exit_code(), 6);
        assert_eq!(InspectError::UnexpectedInternal("?".into()).exit_code(), 7);
        assert_eq!(InspectError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_messages() {
        let err = InspectError::PackageNotFound { id: "Bar".into() };
        assert_eq!(
            err.to_string(),
            "Package 'Bar' was not found on any configured feed."
        );

        let err = InspectError::VersionNotFound {
            id: "Foo".into(),
            version: "9.9.9".into(),
        };
        assert_eq!(err.to_string(), "Version '9.9.9' of package 'Foo' was not found.");

        let err = InspectError::authentication("private", "HTTP 401");
        assert_eq!(
            err.to_string(),
            "Authentication failed for source 'private': HTTP 401"
        );
        assert_eq!(err.feed(), Some("private"));
    }

    #[test]
    fn test_feed_access_without_source() {
        let err = InspectError::FeedAccess {
            feed: None,
            message: "No enabled package sources found.".into(),
        };
        assert_eq!(err.feed(), None);
        assert_eq!(err.kind(), FailureKind::FeedAccess);
    }

    #[test]
    fn test_from_anyhow_keeps_classification() {
        let err: InspectError =
            anyhow::Error::from(InspectError::invalid_argument("bad version")).into();
        assert_eq!(err.kind(), FailureKind::InvalidArgument);

        let err: InspectError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.kind(), FailureKind::UnexpectedInternal);
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FailureKind::VersionNotFound.to_string(), "version-not-found");
        assert_eq!(FailureKind::Authentication.to_string(), "authentication");
    }
}
