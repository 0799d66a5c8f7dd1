use risk_schemas::ErrorKind;

/// Store-level error taxonomy, mapped from whatever `sqlx` failure actually
/// occurred. Call sites that need to branch on the taxonomy (HTTP handlers,
/// the worker's fail path) match on this; call sites that just want to
/// propagate use `anyhow::Error` via `?`.
#[derive(Debug)]
pub enum StoreError {
    InvalidInput(String),
    NotFound(String),
    Conflict(String),
    Transient(anyhow::Error),
    Internal(anyhow::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Transient(_) => ErrorKind::Transient,
            StoreError::Internal(_) => ErrorKind::Fatal,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidInput(m) => write!(f, "invalid input: {m}"),
            StoreError::NotFound(m) => write!(f, "not found: {m}"),
            StoreError::Conflict(m) => write!(f, "conflict: {m}"),
            StoreError::Transient(e) => write!(f, "transient store error: {e}"),
            StoreError::Internal(e) => write!(f, "internal store error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => StoreError::Transient(e.into()),
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            _ => StoreError::Internal(e.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
