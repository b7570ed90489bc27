#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DazzignError {
    Configuration(String),
    IOError(String),
    NotFound(String),
    Persistence(String),
    Validation(String),
}

impl std::fmt::Display for DazzignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DazzignError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            DazzignError::IOError(msg) => write!(f, "I/O error: {msg}"),
            DazzignError::NotFound(msg) => write!(f, "{msg}"),
            DazzignError::Persistence(msg) => write!(f, "database error: {msg}"),
            DazzignError::Validation(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DazzignError {}

impl From<std::io::Error> for DazzignError {
    fn from(err: std::io::Error) -> Self {
        DazzignError::IOError(err.to_string())
    }
}

impl From<sea_orm::DbErr> for DazzignError {
    fn from(err: sea_orm::DbErr) -> Self {
        DazzignError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for DazzignError {
    fn from(err: serde_json::Error) -> Self {
        DazzignError::Persistence(format!("serialization failed: {err}"))
    }
}
