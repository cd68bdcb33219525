use thiserror::Error;

#[derive(Error, Debug)]
pub enum OngRadarError {
    #[error("Backend error: {0}")]
    Api(#[from] ong_radar_api::ApiError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OngRadarError>;
