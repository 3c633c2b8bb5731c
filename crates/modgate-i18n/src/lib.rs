//! # modgate i18n
//!
//! Localized string table built on the Fluent localization system.
//!
//! Messages are grouped by domain (`restrictions`, `disable`, `common`); a
//! message is looked up by domain and key and formatted with Fluent
//! arguments. Resources are compiled into the binary, and a key missing from
//! the requested locale falls back to English.
//!
//! ```rust
//! use modgate_i18n::{fluent_args, I18n, Locale};
//!
//! let i18n = I18n::new(Locale::English).unwrap();
//! let text = i18n.lookup("disable", "enabled", Some(&fluent_args!("command" => "rules", "chat" => "Lobby")));
//! assert!(text.contains("rules"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bundle;
pub mod error;
pub mod locale;
pub mod manager;
pub mod resource;

pub use bundle::BundleManager;
pub use error::{I18nError, I18nResult};
pub use locale::Locale;
pub use manager::I18n;

// Re-export commonly used Fluent types
pub use fluent_bundle::{FluentArgs, FluentValue};

/// Builds [`FluentArgs`] from `key => value` pairs.
#[macro_export]
macro_rules! fluent_args {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut args = $crate::FluentArgs::new();
        $(
            args.set($key, $value);
        )*
        args
    }};
}
