//! Unified error taxonomy and normalization.
//!
//! Every error crossing a use-case boundary belongs to one of a closed set of
//! kinds. Raw lower-layer failures (database, internal) are never handed to
//! callers as-is: [`normalize`] replaces them with a stable fallback code.

use domain::DomainError;
use thiserror::Error;

/// Closed set of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Authenticated caller is neither owner nor admin
    Forbidden,
    /// Referenced record is absent
    NotFound,
    /// Unique index violation reported by the store
    Conflict,
    /// Malformed input
    Validation,
    /// Stable fallback for failures without a recognized code
    UsecaseFailure,
    /// Fatal migration error, operator-facing only
    MigrationFailure,
    /// Raw failure from a lower layer, not yet normalized
    Internal,
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Authorization
    #[error("{0}")]
    Forbidden(String),

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    // Normalized use-case failure
    #[error("{0}")]
    Usecase(String),

    // Migrations
    #[error("Migration {id} failed: {reason}")]
    Migration { id: String, reason: String },

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Usecase(_) => ErrorKind::UsecaseFailure,
            AppError::Migration { .. } => ErrorKind::MigrationFailure,
            #[cfg(feature = "database")]
            AppError::Database(_) => ErrorKind::Internal,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get error code for client
    pub fn code(&self) -> &str {
        match self {
            AppError::Forbidden(code) | AppError::NotFound(code) | AppError::Usecase(code) => {
                code.as_str()
            }
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Migration { .. } => "MIGRATION_FAILED",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error carries a code that may be surfaced to clients
    pub fn has_known_code(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }

    /// Errors caused by the caller; surfaced as client errors and never retried
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Forbidden | ErrorKind::NotFound | ErrorKind::Conflict | ErrorKind::Validation
        )
    }
}

/// Pass coded errors through, replace everything else by `fallback_code`.
///
/// The raw error is logged here so its text never leaves the service.
pub fn normalize(err: AppError, fallback_code: &str) -> AppError {
    if err.has_known_code() {
        return err;
    }

    match &err {
        #[cfg(feature = "database")]
        AppError::Database(e) => tracing::error!(code = fallback_code, "Database error: {:?}", e),
        other => tracing::error!(code = fallback_code, "Unrecognized error: {}", other),
    }
    AppError::Usecase(fallback_code.to_string())
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::NotFound(code) => AppError::NotFound(code),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Forbidden(code) => AppError::Forbidden(code),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("malformed document: {}", err))
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, code: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, code: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(code.into()))
    }
}

/// Extension trait applying [`normalize`] to a result
pub trait ResultExt<T> {
    fn normalize_err(self, fallback_code: &str) -> AppResult<T>;
}

impl<T> ResultExt<T> for AppResult<T> {
    fn normalize_err(self, fallback_code: &str) -> AppResult<T> {
        self.map_err(|err| normalize(err, fallback_code))
    }
}

/// Convenience constructors
impl AppError {
    pub fn forbidden(code: impl Into<String>) -> Self {
        AppError::Forbidden(code.into())
    }

    pub fn not_found(code: impl Into<String>) -> Self {
        AppError::NotFound(code.into())
    }

    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn migration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Migration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coded_errors_pass_through() {
        let err = normalize(AppError::forbidden("CLIENT_DELETE_FORBIDDEN"), "CLIENT_USECASE");
        assert!(matches!(err, AppError::Forbidden(ref c) if c == "CLIENT_DELETE_FORBIDDEN"));

        let err = normalize(AppError::not_found("NOTE_NOT_FOUND"), "NOTE_USECASE");
        assert_eq!(err.code(), "NOTE_NOT_FOUND");

        let err = normalize(AppError::conflict("coach_athletes(coachId, athleteId)"), "X_USECASE");
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = normalize(AppError::Usecase("TASK_USECASE".into()), "CLIENT_USECASE");
        assert_eq!(err.code(), "TASK_USECASE");
    }

    #[test]
    fn test_raw_errors_are_replaced() {
        let err = normalize(
            AppError::internal("connection reset by peer at 10.0.0.3"),
            "CLIENT_USECASE",
        );
        assert_eq!(err.kind(), ErrorKind::UsecaseFailure);
        assert_eq!(err.code(), "CLIENT_USECASE");
        assert!(!err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_result_ext() {
        let result: AppResult<()> = Err(AppError::internal("boom"));
        let err = result.normalize_err("PROGRAM_USECASE").unwrap_err();
        assert_eq!(err.code(), "PROGRAM_USECASE");
    }

    #[test]
    fn test_client_errors() {
        assert!(AppError::forbidden("X").is_client_error());
        assert!(AppError::not_found("X").is_client_error());
        assert!(!AppError::Usecase("X".into()).is_client_error());
        assert!(!AppError::migration("0001_x", "boom").is_client_error());
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: AppError = DomainError::forbidden("NOTE_FORBIDDEN").into();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.code(), "NOTE_FORBIDDEN");
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        let err = missing.ok_or_not_found("TASK_NOT_FOUND").unwrap_err();
        assert_eq!(err.code(), "TASK_NOT_FOUND");
    }
}
