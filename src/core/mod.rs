pub mod cli_args;
pub mod logging;
pub mod settings;

pub use cli_args::{kwargs_to_cli, CliOptions, OptionError, OptionValue, Scalar};
pub use logging::setup_logging;
pub use settings::Settings;
