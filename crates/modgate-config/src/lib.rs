//! # modgate config
//!
//! Configuration schema, defaults, YAML loading with environment overrides,
//! and validation for the modgate bot.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::*;
pub use schema::*;
