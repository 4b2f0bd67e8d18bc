//! Signature model types.
//!
//! This module contains the immutable value types that describe one
//! callable's shape: its return type and ordered parameters.  Type strings
//! are kept opaque ([`TypeToken`]); nothing here interprets PHPDoc syntax
//! beyond equality and display.

use std::fmt;
use std::sync::Arc;

use ustr::Ustr;

/// An opaque PHPDoc type string (e.g. `"string"`, `"?array<int,string>"`).
///
/// Interned, so equality is a pointer comparison and the thousands of
/// repeated `string`/`int` tokens in a call map share storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeToken(Ustr);

impl TypeToken {
    pub fn new(raw: &str) -> Self {
        Self(Ustr::from(raw.trim()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// An empty token stands for "no declared type".
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TypeToken {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access direction recorded on by-reference parameters (`&rw_`, `&w_`,
/// `&r_` prefixes in the raw tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefAccess {
    Read,
    Write,
    ReadWrite,
}

/// One parameter of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSlot {
    /// The parameter name WITHOUT the `$` prefix and without any of the
    /// raw-key markers (`&`, `...`, `=`, access prefixes).
    pub name: Ustr,
    pub type_token: TypeToken,
    /// Whether this parameter is passed by reference (has `&`).
    pub by_reference: bool,
    /// Direction of a by-reference parameter when the table records one.
    pub ref_access: Option<RefAccess>,
    /// Whether this parameter is variadic (has `...`).
    pub variadic: bool,
    /// Whether this parameter may be omitted (trailing `=`).
    pub optional: bool,
}

impl ParamSlot {
    /// A plain required by-value parameter.
    pub fn new(name: &str, type_token: impl Into<TypeToken>) -> Self {
        Self {
            name: Ustr::from(name),
            type_token: type_token.into(),
            by_reference: false,
            ref_access: None,
            variadic: false,
            optional: false,
        }
    }

    pub fn by_reference(mut self, access: Option<RefAccess>) -> Self {
        self.by_reference = true;
        self.ref_access = access;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Render as it would appear in a PHP declaration:
    /// `string &$matches = ...`, `mixed ...$values`.
    pub fn label(&self) -> String {
        let mut out = String::new();
        if !self.type_token.is_empty() {
            out.push_str(self.type_token.as_str());
            out.push(' ');
        }
        if self.by_reference {
            out.push('&');
        }
        if self.variadic {
            out.push_str("...");
        }
        out.push('$');
        out.push_str(self.name.as_str());
        if self.optional && !self.variadic {
            out.push_str(" = ...");
        }
        out
    }
}

/// The return type plus ordered parameters of one callable.
///
/// Cheap to clone: parameters live behind an `Arc` so folding a map from
/// one version to the next copies pointers, not parameter lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureValue {
    pub return_type: TypeToken,
    parameters: Arc<[ParamSlot]>,
}

impl SignatureValue {
    /// Build a signature.  Parameter names must be unique; the decoder
    /// enforces this for tabled data.
    pub fn new(return_type: impl Into<TypeToken>, parameters: Vec<ParamSlot>) -> Self {
        Self {
            return_type: return_type.into(),
            parameters: parameters.into(),
        }
    }

    pub fn parameters(&self) -> &[ParamSlot] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamSlot> {
        let name = name.strip_prefix('$').unwrap_or(name);
        self.parameters.iter().find(|p| p.name.as_str() == name)
    }

    /// Number of parameters that must be passed.
    pub fn required_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| !p.optional && !p.variadic)
            .count()
    }

    /// Build the label showing the full signature.
    ///
    /// Example: `str_contains(string $haystack, string $needle): bool`
    pub fn label(&self, name: &str) -> String {
        let params: Vec<String> = self.parameters.iter().map(ParamSlot::label).collect();
        let ret = if self.return_type.is_empty() {
            String::new()
        } else {
            format!(": {}", self.return_type)
        };
        format!("{}({}){}", name, params.join(", "), ret)
    }
}
