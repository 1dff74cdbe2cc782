//! Derive macro for `envload::Record`.
//!
//! `#[derive(Record)]` generates a `populate` method that visits the struct's
//! fields in declaration order and hands each one to the loader.
//!
//! # Field Rules
//!
//! - Fields without a visibility qualifier (private fields) are skipped.
//! - `#[env(flatten)]` marks an embedded record: its own fields are looked up
//!   in the parent's namespace. `Option<R>` and `Box<R>` wrappers are allowed.
//! - `#[env = "NAME,optional,secret"]` overrides the lookup name and sets
//!   options. An empty name (`#[env = ",secret"]`) keeps the derived name;
//!   `#[env = "-"]` skips the field.
//! - Everything else is a leaf: the loader looks up
//!   `prefix + UPPER_SNAKE(field)` and converts the value. `Option<T>` and
//!   `Box<T>` layers are stripped to find the type the conversion applies to.
//!
//! # Example
//! ```ignore
//! #[derive(Default, Record)]
//! pub struct Config {
//!     pub host: String,                 // APP_HOST
//!     #[env = "PORT"]
//!     pub prt: u16,                     // APP_PORT
//!     #[env = ",secret"]
//!     pub password: String,             // APP_PASSWORD, masked in logs
//!     #[env = "-"]
//!     pub computed: String,             // never looked up
//!     #[env(flatten)]
//!     pub database: DatabaseConfig,     // DatabaseConfig's own fields
//!     cache: Vec<String>,               // private: skipped
//! }
//! ```

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive `envload::Record` for a struct with named fields.
#[proc_macro_derive(Record, attributes(env))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::generate_impl(&input).into()
}
