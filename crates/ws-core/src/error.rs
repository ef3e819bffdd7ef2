//! Unified error type for workspace backends.
//!
//! Every backend reports failures through [`WorkspaceError`]: a semantic
//! [`ErrorKind`], retry guidance, and enough context (resource type, identifier,
//! filesystem path) for callers to log the failure usefully.

use std::path::PathBuf;

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Document, folder, permission, user or revision does not exist.
    NotFound,
    /// Resource already exists.
    AlreadyExists,
    /// A required field is empty or an identifier is unusable.
    InvalidInput,
    /// Caller is not allowed to perform the operation.
    PermissionDenied,
    /// The backend does not support the operation.
    NotImplemented,
    /// Stored data could not be decoded.
    Malformed,
    /// Underlying I/O failure.
    Io,
}

/// Retry guidance for callers. This layer never retries on its own.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid input, malformed data).
    #[default]
    Permanent,
    /// Retrying the same call may succeed (timeouts, interrupted I/O).
    Temporary,
}

/// Workspace error with semantic kind and optional context.
#[derive(Debug)]
pub struct WorkspaceError {
    /// Semantic error category.
    pub kind: ErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Resource type (e.g., "document", "folder").
    pub resource: Option<&'static str>,
    /// Resource identifier.
    pub id: Option<String>,
    /// Filesystem path involved, if any.
    pub path: Option<PathBuf>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl WorkspaceError {
    /// Create a new error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            resource: None,
            id: None,
            path: None,
            message: None,
            source: None,
        }
    }

    /// Attach resource type and identifier.
    #[must_use]
    pub fn with_resource(mut self, resource: &'static str, id: impl Into<String>) -> Self {
        self.resource = Some(resource);
        self.id = Some(id.into());
        self
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Human-readable message, if one was attached.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Check the error kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Missing resource.
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound).with_resource(resource, id)
    }

    /// Invalid or empty input field.
    #[must_use]
    pub fn invalid_input(field: &str, message: &str) -> Self {
        Self::new(ErrorKind::InvalidInput).with_message(format!("{field} {message}"))
    }

    /// Operation the backend does not support.
    #[must_use]
    pub fn not_implemented(operation: &str) -> Self {
        Self::new(ErrorKind::NotImplemented).with_message(operation.to_owned())
    }

    /// Operation refused for the caller.
    #[must_use]
    pub fn permission_denied(operation: &str, message: &str) -> Self {
        Self::new(ErrorKind::PermissionDenied).with_message(format!("{operation}: {message}"))
    }

    /// Stored data that could not be decoded.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed).with_message(message)
    }

    /// Wrap an I/O error, keeping its semantic kind where one applies.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            _ => ErrorKind::Io,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                ErrorStatus::Temporary
            }
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "Kind: message: source (resource id) (path: /foo/bar)"
        let kind_str = match self.kind {
            ErrorKind::NotFound => "Not found",
            ErrorKind::AlreadyExists => "Already exists",
            ErrorKind::InvalidInput => "Invalid input",
            ErrorKind::PermissionDenied => "Permission denied",
            ErrorKind::NotImplemented => "Not implemented",
            ErrorKind::Malformed => "Malformed data",
            ErrorKind::Io => "I/O error",
        };

        write!(f, "{kind_str}")?;

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let (Some(resource), Some(id)) = (self.resource, &self.id) {
            write!(f, " ({resource} {id:?})")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}
