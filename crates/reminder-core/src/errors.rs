use reminder_core_types::RequestId;
use thiserror::Error;

/// Result type alias using the structured error facility
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code. Boundary layers (CLI, HTTP
/// handlers) map kinds to their own rejection responses; the core has no
/// notion of status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Request validation
    InvalidLimit,
    InvalidCursor,
    InvalidInput,
    NotFound,

    // Store
    StoreUnavailable,
    DecodeFailure,
    Migration,

    // Call control
    Cancelled,

    // Ambient
    Config,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidLimit => "ERR_INVALID_LIMIT",
            ExErrorKind::InvalidCursor => "ERR_INVALID_CURSOR",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::StoreUnavailable => "ERR_STORE_UNAVAILABLE",
            ExErrorKind::DecodeFailure => "ERR_DECODE_FAILURE",
            ExErrorKind::Migration => "ERR_MIGRATION",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for failures the caller can fix by correcting the request
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidLimit
                | ExErrorKind::InvalidCursor
                | ExErrorKind::InvalidInput
                | ExErrorKind::NotFound
        )
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (item id, config key, migration id)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain-level failures raised by the query builder, the engine and the
/// write path before they are lifted into `ExError`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReminderError {
    #[error("Page limit must be positive, got {limit}")]
    InvalidLimit { limit: i64 },

    #[error("Cursor must not be negative, got {cursor}")]
    InvalidCursor { cursor: i64 },

    #[error("Unknown list filter: {value}")]
    UnknownFilter { value: String },

    #[error("Item description must not be empty")]
    EmptyDescription,

    #[error("Item not found: {id}")]
    ItemNotFound { id: i64 },

    #[error("Call cancelled")]
    Cancelled,

    #[error("Call deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

impl From<ReminderError> for ExError {
    fn from(err: ReminderError) -> Self {
        let message = err.to_string();
        let base = match &err {
            ReminderError::InvalidLimit { .. } => ExError::new(ExErrorKind::InvalidLimit),
            ReminderError::InvalidCursor { .. } => ExError::new(ExErrorKind::InvalidCursor),
            ReminderError::UnknownFilter { value } => {
                ExError::new(ExErrorKind::InvalidInput).with_entity_id(value.clone())
            }
            ReminderError::EmptyDescription => ExError::new(ExErrorKind::InvalidInput),
            ReminderError::ItemNotFound { id } => {
                ExError::new(ExErrorKind::NotFound).with_entity_id(id.to_string())
            }
            ReminderError::Cancelled | ReminderError::DeadlineExceeded => {
                ExError::new(ExErrorKind::Cancelled)
            }
            ReminderError::InvalidConfig { key, .. } => {
                ExError::new(ExErrorKind::Config).with_entity_id(key.clone())
            }
        };
        base.with_message(message)
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::DecodeFailure).with_message(err.to_string())
    }
}
