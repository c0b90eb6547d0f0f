//! Core types shared by the library and the binary.

mod config;

pub use config::{Config, PathsConfig, ReleasesConfig, DEFAULT_OWNER, LOCAL_CONFIG_FILE};
