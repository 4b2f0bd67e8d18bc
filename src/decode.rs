/// Decoding of raw call-map tables into typed signatures.
///
/// Raw tables encode structure in string keys: key `"0"` holds the return
/// type, every other key is a parameter name carrying markers
/// (`&` by-reference, `rw_`/`w_`/`r_` access, `...` variadic, trailing `=`
/// optional), and `changed` entries nest two signatures under `"old"` and
/// `"new"`.  An entry with only a return type arrives as a one-element
/// list.  All of that is decoded exactly once, here, into
/// [`SignatureValue`]s; nothing downstream looks at raw keys again.
///
/// Parameter order matters, so the JSON must be read with key order
/// preserved (`serde_json`'s `preserve_order` feature).
use std::collections::HashSet;

use serde_json::{Map, Value};
use ustr::Ustr;

use crate::error::DecodeError;
use crate::symbol::SymbolId;
use crate::types::{ParamSlot, RefAccess, SignatureValue, TypeToken};

/// Key holding the return type in a raw signature entry.
const RETURN_KEY: &str = "0";

/// Parse JSON text into a value, mapping syntax errors to [`DecodeError`].
pub(crate) fn parse_json(content: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(content).map_err(|e| DecodeError::Json(e.to_string()))
}

/// View `value` as an object.  PHP serialises an empty array as `[]`, so an
/// empty JSON list is accepted as an empty object.
pub(crate) fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>, DecodeError> {
    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Null => Ok(None),
        _ => Err(DecodeError::UnexpectedShape {
            path: path.to_string(),
            expected: "an object",
        }),
    }
}

/// Decode a flat `symbol → raw signature` object.
pub(crate) fn decode_signature_table(
    value: &Value,
    path: &str,
) -> Result<Vec<(SymbolId, SignatureValue)>, DecodeError> {
    let Some(object) = as_object(value, path)? else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::with_capacity(object.len());
    let mut entries = Vec::with_capacity(object.len());
    for (key, raw) in object {
        let symbol = SymbolId::parse(key)?;
        // `Foo` and `foo` are distinct JSON keys but the same symbol.
        if !seen.insert(symbol) {
            return Err(DecodeError::DuplicateSymbol {
                symbol: key.clone(),
            });
        }
        entries.push((symbol, decode_signature(key, raw)?));
    }
    Ok(entries)
}

/// Decode a `changed` section: `symbol → { "old": …, "new": … }`.
pub(crate) fn decode_changed_table(
    value: &Value,
    path: &str,
) -> Result<Vec<(SymbolId, SignatureValue, SignatureValue)>, DecodeError> {
    let Some(object) = as_object(value, path)? else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::with_capacity(object.len());
    let mut entries = Vec::with_capacity(object.len());
    for (key, raw) in object {
        let symbol = SymbolId::parse(key)?;
        if !seen.insert(symbol) {
            return Err(DecodeError::DuplicateSymbol {
                symbol: key.clone(),
            });
        }

        let entry_path = format!("{}.{}", path, key);
        let pair = as_object(raw, &entry_path)?.ok_or_else(|| DecodeError::UnexpectedShape {
            path: entry_path.clone(),
            expected: "an object with `old` and `new`",
        })?;
        let side = |name: &str| {
            pair.get(name).ok_or_else(|| DecodeError::UnexpectedShape {
                path: format!("{}.{}", entry_path, name),
                expected: "a signature",
            })
        };

        let old = decode_signature(key, side("old")?)?;
        let new = decode_signature(key, side("new")?)?;
        entries.push((symbol, old, new));
    }
    Ok(entries)
}

/// Decode one raw signature entry.
///
/// A return-only entry (`['void']` in PHP) serialises as a JSON list, so a
/// list is read positionally: index 0 is the return type.  Later positions
/// would be parameters without a name and are rejected.
pub fn decode_signature(symbol: &str, raw: &Value) -> Result<SignatureValue, DecodeError> {
    if let Value::Array(items) = raw {
        return decode_list_signature(symbol, items);
    }
    let object = as_object(raw, symbol)?;

    let mut return_type = TypeToken::new("");
    let mut parameters = Vec::new();
    let mut names = HashSet::new();

    for (key, value) in object.into_iter().flatten() {
        let Some(type_str) = value.as_str() else {
            return Err(DecodeError::UnexpectedShape {
                path: format!("{}.{}", symbol, key),
                expected: "a type string",
            });
        };

        if key == RETURN_KEY {
            return_type = TypeToken::new(type_str);
            continue;
        }

        let slot = decode_param_key(key, type_str).ok_or_else(|| DecodeError::InvalidParameter {
            symbol: symbol.to_string(),
            key: key.clone(),
        })?;
        if !names.insert(slot.name) {
            return Err(DecodeError::DuplicateParameter {
                symbol: symbol.to_string(),
                name: slot.name.to_string(),
            });
        }
        parameters.push(slot);
    }

    Ok(SignatureValue::new(return_type, parameters))
}

fn decode_list_signature(symbol: &str, items: &[Value]) -> Result<SignatureValue, DecodeError> {
    if items.len() > 1 {
        return Err(DecodeError::InvalidParameter {
            symbol: symbol.to_string(),
            key: "1".to_string(),
        });
    }

    let return_type = match items.first() {
        None => TypeToken::new(""),
        Some(Value::String(type_str)) => TypeToken::new(type_str),
        Some(_) => {
            return Err(DecodeError::UnexpectedShape {
                path: format!("{}.{}", symbol, RETURN_KEY),
                expected: "a type string",
            });
        }
    };

    Ok(SignatureValue::new(return_type, Vec::new()))
}

/// Decode a raw parameter key such as `"&w_matches="` or `"...values"`.
///
/// Returns `None` when nothing is left of the name once the markers are
/// stripped.
pub fn decode_param_key(key: &str, type_str: &str) -> Option<ParamSlot> {
    let mut rest = key.trim();

    let optional = match rest.strip_suffix('=') {
        Some(stripped) => {
            rest = stripped;
            true
        }
        None => false,
    };

    let by_reference = match rest.strip_prefix('&') {
        Some(stripped) => {
            rest = stripped;
            true
        }
        None => false,
    };

    let variadic = match rest.strip_prefix("...") {
        Some(stripped) => {
            rest = stripped;
            true
        }
        None => false,
    };

    // Access prefixes only carry meaning on references; `r_` on a by-value
    // parameter is part of its name.
    let mut ref_access = None;
    if by_reference {
        for (prefix, access) in [
            ("rw_", RefAccess::ReadWrite),
            ("w_", RefAccess::Write),
            ("r_", RefAccess::Read),
        ] {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped;
                ref_access = Some(access);
                break;
            }
        }
    }

    let name = rest.strip_prefix('$').unwrap_or(rest);
    if name.is_empty() {
        return None;
    }

    Some(ParamSlot {
        name: Ustr::from(name),
        type_token: TypeToken::new(type_str),
        by_reference,
        ref_access,
        variadic,
        optional,
    })
}
