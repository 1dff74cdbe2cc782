//! The loader: walks a record's fields and fills them from a lookup.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{BoxError, LoadError, Result};
use crate::lookup::{self, LookupFn};
use crate::tag::Tag;

/// Receives one human-readable line per populated field.
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Replaces the value of `secret` fields in log lines.
pub const SECRET_MASK: &str = "***";

/// Logger that forwards each line to `tracing` at INFO level.
pub fn tracing_logger() -> LogFn {
    Arc::new(|message: &str| info!(target: "envload", "{message}"))
}

/// Static description of a record field, emitted by `#[derive(Record)]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Declared field name.
    pub name: &'static str,
    /// Raw text of the field's `env` attribute, if any.
    pub tag: Option<&'static str>,
}

impl Field {
    /// Describe a field by name and optional tag text.
    pub const fn new(name: &'static str, tag: Option<&'static str>) -> Self {
        Self { name, tag }
    }
}

/// A struct the loader can populate.
///
/// Usually derived:
///
/// ```
/// use envload::{lookup, Loader, Record};
///
/// #[derive(Default, Record)]
/// struct Config {
///     pub host: String,
///     pub port: u16,
///     #[env = ",secret"]
///     pub password: String,
/// }
///
/// let loader = Loader::with_lookup(
///     "APP_",
///     lookup::from_map([("APP_HOST", "127.0.0.1"), ("APP_PORT", "8080"), ("APP_PASSWORD", "x")]),
/// );
/// let mut cfg = Config::default();
/// loader.load(&mut cfg).unwrap();
/// assert_eq!(cfg.port, 8080);
/// ```
///
/// A hand-written impl visits fields in order with [`Loader::load_field`]
/// and [`Loader::load_embedded`]:
///
/// ```
/// use envload::{convert, Field, Loader, Record};
///
/// struct Limits {
///     max_conns: u32,
/// }
///
/// impl Record for Limits {
///     fn populate(&mut self, loader: &Loader) -> envload::Result<()> {
///         const MAX_CONNS: Field = Field::new("max_conns", Some("MAX,optional"));
///         loader.load_field(&MAX_CONNS, &mut self.max_conns, convert::primitive::<u32>)
///     }
/// }
/// ```
pub trait Record {
    /// Populate every eligible field, in declaration order, stopping at the
    /// first error.
    fn populate(&mut self, loader: &Loader) -> Result<()>;
}

impl<T: Record + Default> Record for Option<T> {
    fn populate(&mut self, loader: &Loader) -> Result<()> {
        self.get_or_insert_with(T::default).populate(loader)
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn populate(&mut self, loader: &Loader) -> Result<()> {
        (**self).populate(loader)
    }
}

/// Something that can be handed to [`Loader::load`].
///
/// - `&mut R` populates `R`;
/// - `Option<&mut R>` fails with [`LoadError::NilTarget`] when `None`;
/// - `&R` fails with [`LoadError::InvalidTarget`], since a shared reference
///   cannot be written through.
pub trait LoadTarget {
    /// Populate the target, or report why it cannot be populated.
    fn populate_with(self, loader: &Loader) -> Result<()>;
}

impl<R: Record + ?Sized> LoadTarget for &mut R {
    fn populate_with(self, loader: &Loader) -> Result<()> {
        self.populate(loader)
    }
}

impl<R: Record + ?Sized> LoadTarget for Option<&mut R> {
    fn populate_with(self, loader: &Loader) -> Result<()> {
        match self {
            Some(record) => record.populate(loader),
            None => Err(LoadError::NilTarget),
        }
    }
}

impl<R: Record + ?Sized> LoadTarget for &R {
    fn populate_with(self, _loader: &Loader) -> Result<()> {
        Err(LoadError::InvalidTarget)
    }
}

/// Populates records from a lookup, prefixing every lookup name.
///
/// A loader holds no mutable state; it can be cloned and shared freely as
/// long as its lookup and logger tolerate concurrent calls.
#[derive(Clone)]
pub struct Loader {
    pub(crate) prefix: String,
    pub(crate) lookup: LookupFn,
    pub(crate) log: Option<LogFn>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("prefix", &self.prefix)
            .field("logging", &self.log.is_some())
            .finish_non_exhaustive()
    }
}

impl Loader {
    /// Create a loader that reads the process environment.
    ///
    /// Logging starts disabled; see [`Self::with_tracing`] and
    /// [`Self::with_logger`].
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_lookup(prefix, lookup::env())
    }

    /// Create a loader that reads from `lookup`.
    pub fn with_lookup(prefix: impl Into<String>, lookup: LookupFn) -> Self {
        Self {
            prefix: prefix.into(),
            lookup,
            log: None,
        }
    }

    /// Log populated fields through `logger`.
    pub fn with_logger(mut self, logger: LogFn) -> Self {
        self.log = Some(logger);
        self
    }

    /// Log populated fields through `tracing`.
    pub fn with_tracing(self) -> Self {
        self.with_logger(tracing_logger())
    }

    /// Disable logging.
    pub fn without_logger(mut self) -> Self {
        self.log = None;
        self
    }

    /// The prefix prepended to every lookup name.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a logger is configured.
    pub fn has_logger(&self) -> bool {
        self.log.is_some()
    }

    /// Query the lookup directly, without the prefix.
    pub fn lookup(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }

    /// Populate `target`.
    ///
    /// Fields are visited in declaration order. The first missing required
    /// value or failed conversion aborts the traversal; fields visited before
    /// it keep their new values.
    pub fn load(&self, target: impl LoadTarget) -> Result<()> {
        target.populate_with(self)
    }

    /// Populate an embedded record into the current namespace.
    pub fn load_embedded<R: Record + ?Sized>(&self, slot: &mut R) -> Result<()> {
        slot.populate(self)
    }

    /// Populate one field.
    ///
    /// Resolves the lookup name from the field's tag (or its declared name),
    /// queries the lookup and, on a hit, replaces `*slot` with the converted
    /// value. `*slot` is untouched unless conversion succeeds.
    pub fn load_field<T, F>(&self, field: &Field, slot: &mut T, convert: F) -> Result<()>
    where
        F: Fn(&T, &str) -> std::result::Result<T, BoxError>,
    {
        let tag = Tag::parse(field.tag.unwrap_or_default());
        if tag.is_skip() {
            debug!(field = field.name, "field skipped by tag");
            return Ok(());
        }

        let name = format!("{}{}", self.prefix, tag.lookup_name(field.name));
        let Some(value) = (self.lookup)(&name) else {
            if tag.optional {
                debug!(field = field.name, %name, "optional variable not set");
                return Ok(());
            }
            return Err(LoadError::MissingRequired { name });
        };

        *slot =
            convert(&*slot, &value).map_err(|source| LoadError::conversion(field.name, source))?;

        if let Some(log) = &self.log {
            let shown = if tag.secret { SECRET_MASK } else { value.as_str() };
            log(&format!("set {} with ${}=\"{}\"", field.name, name, shown));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::convert;

    /// Helper: lookup that records every name it is asked for.
    fn recording(
        entries: &[(&'static str, &'static str)],
    ) -> (LookupFn, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = lookup::from_map(entries.iter().copied());
        let seen_by_lookup = Arc::clone(&seen);
        let lookup: LookupFn = Arc::new(move |name: &str| {
            seen_by_lookup.lock().unwrap().push(name.to_string());
            inner(name)
        });
        (lookup, seen)
    }

    /// Helper: logger that collects lines.
    fn collecting() -> (LogFn, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let log: LogFn = Arc::new(move |line: &str| sink.lock().unwrap().push(line.to_string()));
        (log, lines)
    }

    #[test]
    fn constructors_keep_prefix() {
        let loader = Loader::new("T_");
        assert_eq!(loader.prefix(), "T_");
        assert!(!loader.has_logger());

        let loader = Loader::with_lookup("T_", lookup::from_map([("A", "1")])).with_tracing();
        assert_eq!(loader.prefix(), "T_");
        assert!(loader.has_logger());
        assert_eq!(loader.lookup("A").as_deref(), Some("1"));
        assert!(!loader.without_logger().has_logger());
    }

    #[test]
    fn field_name_is_prefixed_upper_snake() {
        let (lookup, seen) = recording(&[("APP_MAX_CONNS", "12")]);
        let loader = Loader::with_lookup("APP_", lookup);
        let mut max = 0u32;
        loader
            .load_field(&Field::new("max_conns", None), &mut max, convert::primitive::<u32>)
            .unwrap();
        assert_eq!(max, 12);
        assert_eq!(*seen.lock().unwrap(), vec!["APP_MAX_CONNS".to_string()]);
    }

    #[test]
    fn override_is_used_verbatim() {
        let (lookup, seen) = recording(&[("APP_Port", "1")]);
        let loader = Loader::with_lookup("APP_", lookup);
        let mut port = 0u16;
        loader
            .load_field(&Field::new("port", Some("Port")), &mut port, convert::primitive::<u16>)
            .unwrap();
        assert_eq!(port, 1);
        assert_eq!(*seen.lock().unwrap(), vec!["APP_Port".to_string()]);
    }

    #[test]
    fn skipped_field_is_never_queried() {
        let (lookup, seen) = recording(&[]);
        let loader = Loader::with_lookup("", lookup);
        let mut url = String::from("keep");
        loader
            .load_field(&Field::new("url", Some("-")), &mut url, convert::primitive::<String>)
            .unwrap();
        assert_eq!(url, "keep");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_required_names_prefixed_key() {
        let loader = Loader::with_lookup("APP_", lookup::from_map::<&str, &str>([]));
        let mut host = String::new();
        let err = loader
            .load_field(&Field::new("host", None), &mut host, convert::primitive::<String>)
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingRequired { ref name } if name == "APP_HOST"));
    }

    #[test]
    fn missing_optional_keeps_prior_value() {
        let loader = Loader::with_lookup("APP_", lookup::from_map::<&str, &str>([]));
        let mut host = String::from("prior");
        loader
            .load_field(
                &Field::new("host", Some(",optional")),
                &mut host,
                convert::primitive::<String>,
            )
            .unwrap();
        assert_eq!(host, "prior");
    }

    #[test]
    fn failed_conversion_keeps_prior_value_and_logs_nothing() {
        let (log, lines) = collecting();
        let loader = Loader::with_lookup("", lookup::from_map([("PORT", "a8080")])).with_logger(log);
        let mut port = 7i32;
        let err = loader
            .load_field(&Field::new("port", None), &mut port, convert::primitive::<i32>)
            .unwrap_err();
        assert!(matches!(err, LoadError::Conversion { ref field, .. } if field == "port"));
        assert_eq!(port, 7);
        assert!(lines.lock().unwrap().is_empty());
    }

    #[test]
    fn secret_values_are_masked_in_logs() {
        let (log, lines) = collecting();
        let loader = Loader::with_lookup(
            "",
            lookup::from_map([("PASSWORD", "xyz"), ("USER", "bob")]),
        )
        .with_logger(log);
        let mut password = String::new();
        let mut user = String::new();
        loader
            .load_field(
                &Field::new("Password", Some(",secret")),
                &mut password,
                convert::primitive::<String>,
            )
            .unwrap();
        loader
            .load_field(&Field::new("User", None), &mut user, convert::primitive::<String>)
            .unwrap();
        assert_eq!(password, "xyz");
        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                r#"set Password with $PASSWORD="***""#.to_string(),
                r#"set User with $USER="bob""#.to_string(),
            ]
        );
    }

    #[test]
    fn debug_hides_capabilities() {
        let loader = Loader::with_lookup("APP_", lookup::from_map([("K", "secret")]));
        let shown = format!("{loader:?}");
        assert!(shown.contains("APP_"));
        assert!(!shown.contains("secret"));
    }
}
