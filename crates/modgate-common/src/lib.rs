//! # modgate common
//!
//! Shared identifiers, the error type, the chat-backend contract and logging
//! setup used by every crate in the modgate workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use backend::*;
pub use error::{ModgateError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingGuard};
pub use types::*;
pub use utils::*;
