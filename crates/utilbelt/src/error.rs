#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fix failed: {0}")]
    FixFailed(String),
}
