use thiserror::Error;

#[derive(Error, Debug)]
pub enum HydroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for HydroError {
    fn from(e: serde_json::Error) -> Self {
        HydroError::Serialize(e.to_string())
    }
}
