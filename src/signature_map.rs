/// Resolved signature maps.
///
/// A [`SignatureMap`] is the complete `symbol → signature` state at one PHP
/// version: either a base table as loaded, or the result of folding deltas
/// over it.  Maps handed out by the resolver are shared behind an `Arc` and
/// never mutated, so any number of readers can query them concurrently.
use std::collections::HashMap;

use serde_json::Value;

use crate::decode;
use crate::delta::DeltaTable;
use crate::error::DecodeError;
use crate::symbol::SymbolId;
use crate::types::SignatureValue;
use crate::version::PhpVersion;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureMap {
    entries: HashMap<SymbolId, SignatureValue>,
}

impl SignatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a base table from JSON text: a flat object of raw entries.
    pub fn from_json(content: &str) -> Result<Self, DecodeError> {
        Self::from_value(&decode::parse_json(content)?)
    }

    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let entries = decode::decode_signature_table(value, "base")?;
        Ok(entries.into_iter().collect())
    }

    /// Look up a symbol by its raw key, in any casing.
    ///
    /// A key that isn't a valid symbol simply isn't found.
    pub fn lookup(&self, symbol: &str) -> Option<&SignatureValue> {
        let id = SymbolId::parse(symbol).ok()?;
        self.entries.get(&id)
    }

    pub fn lookup_id(&self, symbol: &SymbolId) -> Option<&SignatureValue> {
        self.entries.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.lookup(symbol).is_some()
    }

    pub fn contains_id(&self, symbol: &SymbolId) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolId, &SignatureValue)> {
        self.entries.iter()
    }

    /// Every overload of the callable named by `symbol` (its own `'N`
    /// suffix, if any, is ignored), ordered by overload index.
    pub fn overloads(&self, symbol: &str) -> Vec<(SymbolId, &SignatureValue)> {
        let Ok(id) = SymbolId::parse(symbol) else {
            return Vec::new();
        };
        let mut found: Vec<(SymbolId, &SignatureValue)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.same_callable(&id))
            .map(|(key, sig)| (*key, sig))
            .collect();
        found.sort_by_key(|(key, _)| key.overload);
        found
    }

    /// All methods recorded for `class`, sorted by symbol.
    pub fn methods_of(&self, class: &str) -> Vec<(SymbolId, &SignatureValue)> {
        let class = class.strip_prefix('\\').unwrap_or(class).to_ascii_lowercase();
        let mut found: Vec<(SymbolId, &SignatureValue)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.class.is_some_and(|c| c.as_str() == class))
            .map(|(key, sig)| (*key, sig))
            .collect();
        found.sort_by_key(|(key, _)| *key);
        found
    }

    /// The delta that turns `self` into `newer`, labelled with `version`.
    pub fn diff(&self, newer: &SignatureMap, version: PhpVersion) -> DeltaTable {
        let mut added = Vec::new();
        let mut changed = Vec::new();
        let mut removed = Vec::new();

        for (symbol, new) in &newer.entries {
            match self.entries.get(symbol) {
                None => added.push((*symbol, new.clone())),
                Some(old) if old != new => changed.push((*symbol, old.clone(), new.clone())),
                Some(_) => {}
            }
        }
        for (symbol, old) in &self.entries {
            if !newer.entries.contains_key(symbol) {
                removed.push((*symbol, old.clone()));
            }
        }

        DeltaTable::from_disjoint(version, added, changed, removed)
    }

    pub(crate) fn insert(
        &mut self,
        symbol: SymbolId,
        signature: SignatureValue,
    ) -> Option<SignatureValue> {
        self.entries.insert(symbol, signature)
    }

    pub(crate) fn remove(&mut self, symbol: &SymbolId) -> Option<SignatureValue> {
        self.entries.remove(symbol)
    }
}

impl FromIterator<(SymbolId, SignatureValue)> for SignatureMap {
    fn from_iter<T: IntoIterator<Item = (SymbolId, SignatureValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
