use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecsError {
    #[error("unknown school: {0}")]
    UnknownSchool(String),
    #[error("unknown milestone field: {0}")]
    UnknownMilestoneField(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("serialize error: {0}")]
    Serialize(String),
}

impl From<std::io::Error> for RecsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for RecsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}
