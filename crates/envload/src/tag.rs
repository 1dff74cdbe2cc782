//! Field tag parsing.
//!
//! A tag is the text of a field's `#[env = "..."]` attribute:
//! `override[,optional][,secret]`. Options are recognized as trailing
//! `,optional` / `,secret` suffixes in any order. Anything else after a comma
//! stays part of the override. The override `-` skips the field.

use crate::naming::upper_snake_case;

/// Attribute key recognized on record fields.
pub const TAG_KEY: &str = "env";

/// Override value that excludes a field from population.
pub const SKIP_MARKER: &str = "-";

const OPTIONAL: &str = ",optional";
const SECRET: &str = ",secret";

/// Parsed field tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Override name; empty means "derive from the field name".
    pub name: &'a str,
    /// Absence of the variable is not an error.
    pub optional: bool,
    /// The value is masked when logged.
    pub secret: bool,
}

impl<'a> Tag<'a> {
    /// Parse tag text.
    ///
    /// ```
    /// use envload::tag::Tag;
    ///
    /// let tag = Tag::parse("PORT,secret,optional");
    /// assert_eq!(tag.name, "PORT");
    /// assert!(tag.optional && tag.secret);
    /// ```
    pub fn parse(text: &'a str) -> Self {
        let mut tag = Tag {
            name: text,
            ..Default::default()
        };
        loop {
            if !tag.optional {
                if let Some(rest) = tag.name.strip_suffix(OPTIONAL) {
                    tag.name = rest;
                    tag.optional = true;
                    continue;
                }
            }
            if !tag.secret {
                if let Some(rest) = tag.name.strip_suffix(SECRET) {
                    tag.name = rest;
                    tag.secret = true;
                    continue;
                }
            }
            break;
        }
        tag
    }

    /// Returns `true` if the tag excludes its field.
    pub fn is_skip(&self) -> bool {
        self.name == SKIP_MARKER
    }

    /// The unprefixed lookup name: the override verbatim, or the field name
    /// in upper snake case when there is no override.
    pub fn lookup_name(&self, field: &str) -> String {
        if self.name.is_empty() {
            upper_snake_case(field)
        } else {
            self.name.to_string()
        }
    }
}
