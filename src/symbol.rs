/// Symbol identities for call-map entries.
///
/// Raw tables key entries by a lowercase function name or `class::method`,
/// optionally suffixed with `'N` to keep several overloads of the same
/// callable apart (`count_chars` vs `count_chars'1`).  That suffix is
/// decoded into an explicit overload index here; two keys that differ only
/// in overload are unrelated symbols.
///
/// PHP function and method names are case-insensitive, so every component
/// is lowercased on construction and lookups with any casing hit the same
/// entry.
use std::fmt;
use std::str::FromStr;

use ustr::Ustr;

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    /// The owning class for methods, `None` for free functions.
    pub class: Option<Ustr>,
    pub name: Ustr,
    /// `0` for the primary entry, `N` for the `'N` suffixed overload.
    pub overload: u32,
}

impl SymbolId {
    pub fn function(name: &str) -> Self {
        Self {
            class: None,
            name: normalise(name),
            overload: 0,
        }
    }

    pub fn method(class: &str, name: &str) -> Self {
        Self {
            class: Some(normalise(class)),
            name: normalise(name),
            overload: 0,
        }
    }

    pub fn with_overload(mut self, overload: u32) -> Self {
        self.overload = overload;
        self
    }

    pub fn is_method(&self) -> bool {
        self.class.is_some()
    }

    /// The same callable without an overload suffix.
    pub fn primary(&self) -> Self {
        self.with_overload(0)
    }

    /// Whether `self` and `other` name the same callable, ignoring overload.
    pub fn same_callable(&self, other: &SymbolId) -> bool {
        self.class == other.class && self.name == other.name
    }

    /// Parse a raw key such as `"Str_Contains"`, `"arrayobject::__construct"`
    /// or `"count_chars'1"`.
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidSymbol(raw.to_string());
        let key = raw.trim();

        // A `'` followed by something other than a positive integer is not
        // an overload suffix, and no PHP name contains `'`.
        let (key, overload) = match key.rsplit_once('\'') {
            Some((head, tail)) => match tail.parse::<u32>() {
                Ok(n) if n >= 1 => (head, n),
                _ => return Err(invalid()),
            },
            None => (key, 0),
        };

        let id = match key.split_once("::") {
            Some((class, method)) => {
                let class = class.strip_prefix('\\').unwrap_or(class);
                if !is_identifier(class, true) || !is_identifier(method, false) {
                    return Err(invalid());
                }
                Self::method(class, method)
            }
            None => {
                let name = key.strip_prefix('\\').unwrap_or(key);
                if !is_identifier(name, true) {
                    return Err(invalid());
                }
                Self::function(name)
            }
        };

        Ok(id.with_overload(overload))
    }
}

/// Accept PHP identifier characters; namespace separators are allowed in
/// class and namespaced-function names.
fn is_identifier(s: &str, allow_namespace: bool) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_alphanumeric() || c == '_' || (allow_namespace && c == '\\') || !c.is_ascii()
        })
}

fn normalise(s: &str) -> Ustr {
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        Ustr::from(s.to_ascii_lowercase().as_str())
    } else {
        Ustr::from(s)
    }
}

impl FromStr for SymbolId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(class) = self.class {
            write!(f, "{}::", class)?;
        }
        f.write_str(self.name.as_str())?;
        if self.overload > 0 {
            write!(f, "'{}", self.overload)?;
        }
        Ok(())
    }
}
