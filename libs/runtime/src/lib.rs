//! Process-level plumbing shared by the binaries: layered configuration,
//! home directory resolution and logging.

pub mod config;
pub mod home_dir;
pub mod logging;

pub use config::{default_logging_config, AppConfig, CliArgs, LoggingConfig, Section};
pub use logging::init_logging_from_config;
