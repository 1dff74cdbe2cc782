//! Lookup capabilities: where values come from.

use std::collections::HashMap;
use std::sync::Arc;

/// Resolves a name to a value, or `None` when the name is not set.
pub type LookupFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup backed by the process environment.
///
/// Variables whose value is not valid Unicode are treated as unset.
pub fn env() -> LookupFn {
    Arc::new(|name: &str| std::env::var(name).ok())
}

/// Lookup backed by an in-memory map.
///
/// ```
/// let lookup = envload::lookup::from_map([("APP_PORT", "8080")]);
/// assert_eq!(lookup("APP_PORT").as_deref(), Some("8080"));
/// assert_eq!(lookup("APP_HOST"), None);
/// ```
pub fn from_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> LookupFn
where
    K: Into<String>,
    V: Into<String>,
{
    let map: HashMap<String, String> = entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    Arc::new(move |name: &str| map.get(name).cloned())
}

/// Lookup that tries each source in order and returns the first hit.
pub fn chain(sources: impl IntoIterator<Item = LookupFn>) -> LookupFn {
    let sources: Vec<LookupFn> = sources.into_iter().collect();
    Arc::new(move |name: &str| sources.iter().find_map(|source| source(name)))
}
