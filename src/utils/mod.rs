pub mod api_key;
pub mod config;
pub mod import_toml;
pub mod logger;

pub use api_key::get_api_key;
pub use config::*;
pub use import_toml::{ImportToml, apply_file_to_opts, load_import_toml, parse_import_toml};
pub use logger::{Colors, setup_logging};
