pub mod bootstrap;
pub mod builder;
pub mod config;
pub mod convert;
pub mod error;
pub mod handle;
pub mod host;
pub mod interceptor;
pub mod logging;
pub mod provider;
pub mod source;
pub mod validate;

pub use bootstrap::{build_standard, standard_builder, BootstrapContext};
pub use builder::ConfigBuilder;
pub use config::{Config, ConfigValue, PROFILE_PROPERTY};
pub use convert::{ConfigType, TypeTag, TypedValue};
pub use error::{Error, Result};
pub use handle::ConfigHandle;
pub use source::ConfigSource;
