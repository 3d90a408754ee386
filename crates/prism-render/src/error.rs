use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render backend initialization failed: {0}")]
    BackendInit(String),

    #[error("No render devices available")]
    NoDevices,

    #[error("Render device {index} not found ({available} available)")]
    DeviceNotFound { index: usize, available: usize },

    #[error("Render session creation failed: {0}")]
    SessionCreation(String),

    #[error("Render engine already started")]
    AlreadyStarted,

    #[error("Failed to spawn render thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    #[error("Invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),
}
