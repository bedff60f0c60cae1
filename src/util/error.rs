#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    #[error("failed to load power management library: {0}")]
    Library(#[from] libloading::Error),

    #[error("power management interface unavailable: {0}")]
    InterfaceUnavailable(String),

    #[error("SMU call '{call}' failed with status {status}")]
    CallFailed { call: &'static str, status: i32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Failed to read sysfs path: {0}")]
    ReadError(String),

    #[error("Failed to write to sysfs path: {0}")]
    WriteError(String),

    #[error("Failed to parse value: {0}")]
    ParseError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Path missing: {0}")]
    PathMissing(String),

    #[error("Invalid value for setting: {0}")]
    InvalidValueError(String),
}

// A unified error type for the whole application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Power(#[from] PowerError),

    #[error("{0}")]
    Control(#[from] ControlError),
}
