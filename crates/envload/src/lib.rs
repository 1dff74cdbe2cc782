//! Populate structs from environment variables.
//!
//! `envload` fills the fields of a struct from a name/value lookup
//! (the process environment by default), converting each string to the
//! field's type.
//!
//! # Quick Start
//!
//! ```rust
//! use envload::{lookup, Loader, Record};
//!
//! #[derive(Debug, Default, Record)]
//! struct Config {
//!     pub host: String,
//!     pub port: u16,
//! }
//!
//! let loader = Loader::with_lookup(
//!     "APP_",
//!     lookup::from_map([("APP_HOST", "127.0.0.1"), ("APP_PORT", "8080")]),
//! );
//! let mut cfg = Config::default();
//! loader.load(&mut cfg).unwrap();
//! assert_eq!(cfg.host, "127.0.0.1");
//! assert_eq!(cfg.port, 8080);
//! ```
//!
//! # Modules
//!
//! - [`loader`]: [`Loader`], the [`Record`] trait and load targets
//! - [`convert`]: String-to-value conversion and the capability traits
//! - [`tag`]: `#[env = "..."]` tag parsing
//! - [`naming`]: Field name to lookup name derivation
//! - [`lookup`]: Lookup constructors (environment, maps, chains)
//! - [`global`]: The process-wide default loader behind [`load`]
//! - [`error`]: Error types

extern crate self as envload;

pub mod convert;
pub mod error;
pub mod global;
pub mod loader;
pub mod lookup;
pub mod naming;
pub mod tag;

pub use convert::{BinaryUnmarshaler, Primitive, Setter, TextUnmarshaler};
pub use envload_derive::Record;
pub use error::{BoxError, LoadError, ParseValueError, Result};
pub use global::{
    default_loader, load, replace_default, set_default_logger, set_default_lookup, DEFAULT_PREFIX,
};
pub use loader::{tracing_logger, Field, LoadTarget, Loader, LogFn, Record, SECRET_MASK};
pub use lookup::LookupFn;
