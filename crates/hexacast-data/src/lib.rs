pub mod loader;
pub mod settle;

pub use loader::{DataLoadError, Format};
pub use settle::{SETTLE_BASE_NAME, load_settle_config, load_settle_config_file};
