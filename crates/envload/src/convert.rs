//! String-to-value conversion for record fields.
//!
//! A field's leaf type (its type with `Option<..>` and `Box<..>` layers
//! removed) is converted with the first capability it implements:
//!
//! 1. [`Setter`]
//! 2. [`TextUnmarshaler`]
//! 3. [`BinaryUnmarshaler`]
//! 4. [`Primitive`] (strings, paths, integers, booleans, floats, byte vectors)
//! 5. [`serde::de::DeserializeOwned`], decoding the value as a JSON document
//!
//! The choice is made at compile time by [`dispatch`]; `#[derive(Record)]`
//! emits the dispatch for every field. Hand-written [`Record`] impls can pick
//! a converter directly ([`setter`], [`text`], [`binary`], [`primitive`],
//! [`json`]) and wrap it with [`optional`] or [`boxed`].
//!
//! Every converter takes the field's current value by reference and returns
//! the replacement, so a failed conversion never leaves a field half-written.
//!
//! [`Record`]: crate::Record

use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::error::{BoxError, ParseValueError};

/// Converter from the current field value and a raw string to the new value.
pub type Convert<T> = fn(&T, &str) -> Result<T, BoxError>;

/// A type that can be assigned from a string.
///
/// This takes precedence over every other conversion.
pub trait Setter: Clone {
    /// Set the value from the raw string.
    fn set(&mut self, value: &str) -> Result<(), BoxError>;
}

/// A type that can be decoded from its textual form.
pub trait TextUnmarshaler: Clone {
    /// Decode the value from UTF-8 text.
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError>;
}

/// A type that can be decoded from raw bytes.
pub trait BinaryUnmarshaler: Clone {
    /// Decode the value from the raw bytes of the looked-up string.
    fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// Built-in scalar conversions.
pub trait Primitive: Sized {
    /// Parse a value of this type.
    fn parse_primitive(value: &str) -> Result<Self, ParseValueError>;
}

/// Convert through [`Setter`], staging on a clone of the current value.
pub fn setter<T: Setter>(current: &T, value: &str) -> Result<T, BoxError> {
    let mut staged = current.clone();
    staged.set(value)?;
    Ok(staged)
}

/// Convert through [`TextUnmarshaler`], staging on a clone of the current value.
pub fn text<T: TextUnmarshaler>(current: &T, value: &str) -> Result<T, BoxError> {
    let mut staged = current.clone();
    staged.unmarshal_text(value.as_bytes())?;
    Ok(staged)
}

/// Convert through [`BinaryUnmarshaler`], staging on a clone of the current value.
pub fn binary<T: BinaryUnmarshaler>(current: &T, value: &str) -> Result<T, BoxError> {
    let mut staged = current.clone();
    staged.unmarshal_binary(value.as_bytes())?;
    Ok(staged)
}

/// Convert through [`Primitive`].
pub fn primitive<T: Primitive>(_current: &T, value: &str) -> Result<T, BoxError> {
    Ok(T::parse_primitive(value)?)
}

/// Decode the value as a JSON document.
pub fn json<T: DeserializeOwned>(_current: &T, value: &str) -> Result<T, BoxError> {
    Ok(serde_json::from_str(value)?)
}

/// Lift a converter over an `Option`. A `None` field is converted starting
/// from `T::default()` and becomes `Some` only if conversion succeeds.
pub fn optional<T, F>(inner: F) -> impl Fn(&Option<T>, &str) -> Result<Option<T>, BoxError>
where
    T: Default,
    F: Fn(&T, &str) -> Result<T, BoxError>,
{
    move |current: &Option<T>, value: &str| match current {
        Some(existing) => inner(existing, value).map(Some),
        None => inner(&T::default(), value).map(Some),
    }
}

/// Lift a converter over a `Box`.
pub fn boxed<T, F>(inner: F) -> impl Fn(&Box<T>, &str) -> Result<Box<T>, BoxError>
where
    F: Fn(&T, &str) -> Result<T, BoxError>,
{
    move |current: &Box<T>, value: &str| inner(&**current, value).map(Box::new)
}

// ---------------------------------------------------------------------------
// Primitive impls
// ---------------------------------------------------------------------------

impl Primitive for String {
    fn parse_primitive(value: &str) -> Result<Self, ParseValueError> {
        Ok(value.to_string())
    }
}

impl Primitive for PathBuf {
    fn parse_primitive(value: &str) -> Result<Self, ParseValueError> {
        Ok(PathBuf::from(value))
    }
}

impl Primitive for Vec<u8> {
    fn parse_primitive(value: &str) -> Result<Self, ParseValueError> {
        Ok(value.as_bytes().to_vec())
    }
}

impl Primitive for bool {
    fn parse_primitive(value: &str) -> Result<Self, ParseValueError> {
        match value {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(ParseValueError::syntax(value, "bool")),
        }
    }
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl Primitive for $t {
            fn parse_primitive(value: &str) -> Result<Self, ParseValueError> {
                let kind = stringify!($t);
                let parsed = parse_signed(value, kind)?;
                <$t>::try_from(parsed).map_err(|_| ParseValueError::range(value, kind))
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl Primitive for $t {
            fn parse_primitive(value: &str) -> Result<Self, ParseValueError> {
                let kind = stringify!($t);
                let parsed = parse_magnitude(value, kind)?;
                <$t>::try_from(parsed).map_err(|_| ParseValueError::range(value, kind))
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl Primitive for $t {
            fn parse_primitive(value: &str) -> Result<Self, ParseValueError> {
                let kind = stringify!($t);
                let parsed: $t = value
                    .parse()
                    .map_err(|_| ParseValueError::syntax(value, kind))?;
                if parsed.is_infinite() && !is_infinity_literal(value) {
                    return Err(ParseValueError::range(value, kind));
                }
                Ok(parsed)
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, i128, isize);
impl_unsigned!(u8, u16, u32, u64, u128, usize);
impl_float!(f32, f64);

fn parse_signed(value: &str, kind: &'static str) -> Result<i128, ParseValueError> {
    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let magnitude = parse_magnitude(unsigned, kind).map_err(|e| match e {
        ParseValueError::InvalidSyntax { .. } => ParseValueError::syntax(value, kind),
        ParseValueError::OutOfRange { .. } => ParseValueError::range(value, kind),
    })?;
    if negative {
        if magnitude > i128::MAX as u128 + 1 {
            return Err(ParseValueError::range(value, kind));
        }
        Ok((magnitude as i128).wrapping_neg())
    } else {
        i128::try_from(magnitude).map_err(|_| ParseValueError::range(value, kind))
    }
}

/// Parse an unsigned integer literal with radix detection: `0x`, `0o`, `0b`
/// prefixes (either case), a leading `0` for octal, decimal otherwise.
/// Underscores may separate digits, or follow an explicit prefix.
fn parse_magnitude(value: &str, kind: &'static str) -> Result<u128, ParseValueError> {
    let (radix, body, prefixed) = split_radix(value);
    let scan = if prefixed { body } else { value };
    if !underscores_ok(scan, prefixed) {
        return Err(ParseValueError::syntax(value, kind));
    }
    let digits: String = body.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ParseValueError::syntax(value, kind));
    }
    u128::from_str_radix(&digits, radix).map_err(|_| ParseValueError::range(value, kind))
}

fn split_radix(value: &str) -> (u32, &str, bool) {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        return match bytes[1].to_ascii_lowercase() {
            b'x' => (16, &value[2..], true),
            b'o' => (8, &value[2..], true),
            b'b' => (2, &value[2..], true),
            _ => (8, &value[1..], false),
        };
    }
    (10, value, false)
}

fn underscores_ok(scan: &str, prefixed: bool) -> bool {
    let mut after_digit = prefixed;
    let mut last_underscore = false;
    for c in scan.chars() {
        if c == '_' {
            if !after_digit {
                return false;
            }
            after_digit = false;
            last_underscore = true;
        } else {
            after_digit = true;
            last_underscore = false;
        }
    }
    !last_underscore
}

fn is_infinity_literal(value: &str) -> bool {
    let unsigned = value.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

// ---------------------------------------------------------------------------
// Compile-time capability dispatch
// ---------------------------------------------------------------------------

/// Picks a converter for a concrete type by method resolution.
///
/// With every `Via*` trait in scope,
/// `(&&&&&Kind::<T>::new()).converter()` resolves to the highest-priority
/// capability `T` implements: each trait is implemented one reference level
/// lower than the one before it, and auto-deref tries the outermost level
/// first. This only works where `T` is a concrete type, which is why the
/// derive macro emits it per field.
pub mod dispatch {
    use std::marker::PhantomData;

    use serde::de::DeserializeOwned;

    use super::{BinaryUnmarshaler, Convert, Primitive, Setter, TextUnmarshaler};

    /// Type tag the `Via*` traits are implemented on.
    pub struct Kind<T>(PhantomData<fn() -> T>);

    impl<T> Kind<T> {
        pub const fn new() -> Self {
            Self(PhantomData)
        }
    }

    impl<T> Default for Kind<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    pub trait ViaSetter {
        type Target;
        fn converter(&self) -> Convert<Self::Target>;
    }

    pub trait ViaText {
        type Target;
        fn converter(&self) -> Convert<Self::Target>;
    }

    pub trait ViaBinary {
        type Target;
        fn converter(&self) -> Convert<Self::Target>;
    }

    pub trait ViaPrimitive {
        type Target;
        fn converter(&self) -> Convert<Self::Target>;
    }

    pub trait ViaJson {
        type Target;
        fn converter(&self) -> Convert<Self::Target>;
    }

    impl<T: Setter> ViaSetter for &&&&Kind<T> {
        type Target = T;
        fn converter(&self) -> Convert<T> {
            super::setter::<T>
        }
    }

    impl<T: TextUnmarshaler> ViaText for &&&Kind<T> {
        type Target = T;
        fn converter(&self) -> Convert<T> {
            super::text::<T>
        }
    }

    impl<T: BinaryUnmarshaler> ViaBinary for &&Kind<T> {
        type Target = T;
        fn converter(&self) -> Convert<T> {
            super::binary::<T>
        }
    }

    impl<T: Primitive> ViaPrimitive for &Kind<T> {
        type Target = T;
        fn converter(&self) -> Convert<T> {
            super::primitive::<T>
        }
    }

    impl<T: DeserializeOwned> ViaJson for Kind<T> {
        type Target = T;
        fn converter(&self) -> Convert<T> {
            super::json::<T>
        }
    }
}
