use report_extract::ExtractionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
