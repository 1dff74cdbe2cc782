//! Lookup name derivation from declared field names.
//!
//! An underscore is inserted at every transition from a character that is
//! neither an ASCII uppercase letter nor `_` to an ASCII uppercase letter.
//! Runs of uppercase letters stay joined, so acronyms survive:
//!
//! - `MyID` -> `My_ID`
//! - `URLName` -> `URLName`
//! - `MyURLName` -> `My_URLName`
//! - `max_conns` -> `max_conns`
//!
//! [`upper_snake_case`] then uppercases the result.

/// Insert underscores at lowercase-to-uppercase transitions, preserving case.
///
/// # Examples
///
/// ```
/// use envload::naming::camel_to_snake;
///
/// assert_eq!(camel_to_snake("MyFullName"), "My_Full_Name");
/// assert_eq!(camel_to_snake("My_Name"), "My_Name");
/// ```
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        if let Some(p) = prev {
            if ch.is_ascii_uppercase() && !p.is_ascii_uppercase() && p != '_' {
                out.push('_');
            }
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

/// Convert a declared field name into the `UPPER_SNAKE_CASE` lookup name.
///
/// ```
/// use envload::naming::upper_snake_case;
///
/// assert_eq!(upper_snake_case("MyURLName"), "MY_URLNAME");
/// assert_eq!(upper_snake_case("db_host"), "DB_HOST");
/// ```
pub fn upper_snake_case(name: &str) -> String {
    camel_to_snake(name).to_ascii_uppercase()
}
