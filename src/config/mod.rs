pub mod load;
pub mod types;
pub mod watcher;

pub use load::{existing_config_path, load_config, load_config_from_path};
pub use types::{AppConfig, ConfigError, LogLevel, TdpLimits, WatchConfig};
pub use watcher::ConfigWatcher;
