/// Per-version signature deltas.
///
/// A [`DeltaTable`] records what changed in the built-in call map when
/// moving from the previous supported PHP version to `version`: symbols
/// that were added, symbols whose signature changed (with both the old and
/// the new signature), and symbols that were removed.
///
/// # Applying
///
/// [`DeltaTable::apply`] is pure: it returns a new map and leaves its input
/// alone.  The delta's data is authoritative, so inconsistencies between
/// what the delta expects and what the map holds never stop the fold:
///
///   - **added** overwrites a symbol that already exists
///   - **changed** installs `new` even when the current signature is not
///     `old` (or is missing)
///   - **removed** drops the symbol whether or not it matches
///
/// Each such case is recorded as a [`DriftWarning`].
use std::collections::BTreeMap;

use serde_json::Value;

use crate::decode;
use crate::error::{DataIntegrityError, DeltaSection, DriftWarning, LoadError};
use crate::signature_map::SignatureMap;
use crate::symbol::SymbolId;
use crate::types::SignatureValue;
use crate::version::PhpVersion;

static EMPTY_SECTION: Value = Value::Null;

/// The before and after signature of a changed symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub old: SignatureValue,
    pub new: SignatureValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaTable {
    version: PhpVersion,
    added: BTreeMap<SymbolId, SignatureValue>,
    changed: BTreeMap<SymbolId, Change>,
    removed: BTreeMap<SymbolId, SignatureValue>,
}

impl DeltaTable {
    /// Build a delta, rejecting any symbol listed in more than one section.
    pub fn new(
        version: PhpVersion,
        added: impl IntoIterator<Item = (SymbolId, SignatureValue)>,
        changed: impl IntoIterator<Item = (SymbolId, SignatureValue, SignatureValue)>,
        removed: impl IntoIterator<Item = (SymbolId, SignatureValue)>,
    ) -> Result<Self, DataIntegrityError> {
        let table = Self::from_disjoint(version, added, changed, removed);
        table.check_disjoint()?;
        Ok(table)
    }

    /// Build without the integrity check, for callers that produce disjoint
    /// sections by construction.
    pub(crate) fn from_disjoint(
        version: PhpVersion,
        added: impl IntoIterator<Item = (SymbolId, SignatureValue)>,
        changed: impl IntoIterator<Item = (SymbolId, SignatureValue, SignatureValue)>,
        removed: impl IntoIterator<Item = (SymbolId, SignatureValue)>,
    ) -> Self {
        Self {
            version,
            added: added.into_iter().collect(),
            changed: changed
                .into_iter()
                .map(|(symbol, old, new)| (symbol, Change { old, new }))
                .collect(),
            removed: removed.into_iter().collect(),
        }
    }

    /// Decode a raw delta table from JSON text.
    ///
    /// The expected shape is
    /// `{"added": {…}, "changed": {sym: {"old": …, "new": …}}, "removed": {…}}`;
    /// missing sections are empty.
    pub fn from_json(version: PhpVersion, content: &str) -> Result<Self, LoadError> {
        Self::from_value(version, &decode::parse_json(content)?)
    }

    pub fn from_value(version: PhpVersion, value: &Value) -> Result<Self, LoadError> {
        let root = decode::as_object(value, "delta")?;
        let section = |name: &str| root.and_then(|r| r.get(name)).unwrap_or(&EMPTY_SECTION);

        let added = decode::decode_signature_table(section("added"), "added")?;
        let changed = decode::decode_changed_table(section("changed"), "changed")?;
        let removed = decode::decode_signature_table(section("removed"), "removed")?;

        Ok(Self::new(version, added, changed, removed)?)
    }

    fn check_disjoint(&self) -> Result<(), DataIntegrityError> {
        let conflict = |symbol: &SymbolId, first, second| DataIntegrityError {
            version: self.version,
            symbol: *symbol,
            first,
            second,
        };

        for symbol in self.added.keys() {
            if self.changed.contains_key(symbol) {
                return Err(conflict(symbol, DeltaSection::Added, DeltaSection::Changed));
            }
            if self.removed.contains_key(symbol) {
                return Err(conflict(symbol, DeltaSection::Added, DeltaSection::Removed));
            }
        }
        for symbol in self.changed.keys() {
            if self.removed.contains_key(symbol) {
                return Err(conflict(symbol, DeltaSection::Changed, DeltaSection::Removed));
            }
        }
        Ok(())
    }

    pub fn version(&self) -> PhpVersion {
        self.version
    }

    pub fn added(&self) -> &BTreeMap<SymbolId, SignatureValue> {
        &self.added
    }

    pub fn changed(&self) -> &BTreeMap<SymbolId, Change> {
        &self.changed
    }

    pub fn removed(&self) -> &BTreeMap<SymbolId, SignatureValue> {
        &self.removed
    }

    /// Total number of entries across all three sections.
    pub fn len(&self) -> usize {
        self.added.len() + self.changed.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply to `base`, logging any drift.
    pub fn apply(&self, base: &SignatureMap) -> SignatureMap {
        let mut warnings = Vec::new();
        let result = self.apply_with_report(base, &mut warnings);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        result
    }

    /// Apply to `base`, appending drift to `warnings` instead of logging it.
    pub fn apply_with_report(
        &self,
        base: &SignatureMap,
        warnings: &mut Vec<DriftWarning>,
    ) -> SignatureMap {
        let mut result = base.clone();
        self.apply_in_place(&mut result, warnings);
        result
    }

    /// The fold step.  Only the resolver calls this, on an accumulator it
    /// owns; everything public goes through the copying variants.
    pub(crate) fn apply_in_place(
        &self,
        map: &mut SignatureMap,
        warnings: &mut Vec<DriftWarning>,
    ) {
        let version = self.version;

        for (symbol, signature) in &self.added {
            if let Some(existing) = map.insert(*symbol, signature.clone()) {
                warnings.push(DriftWarning::AlreadyPresent {
                    version,
                    symbol: *symbol,
                    existing,
                });
            }
        }

        for (symbol, change) in &self.changed {
            let previous = map.insert(*symbol, change.new.clone());
            if previous.as_ref() != Some(&change.old) {
                warnings.push(DriftWarning::ChangedMismatch {
                    version,
                    symbol: *symbol,
                    expected: change.old.clone(),
                    found: previous,
                });
            }
        }

        for (symbol, expected) in &self.removed {
            match map.remove(symbol) {
                None => warnings.push(DriftWarning::RemovedMissing {
                    version,
                    symbol: *symbol,
                }),
                Some(found) if found != *expected => {
                    warnings.push(DriftWarning::RemovedMismatch {
                        version,
                        symbol: *symbol,
                        expected: expected.clone(),
                        found,
                    })
                }
                Some(_) => {}
            }
        }

        tracing::trace!(
            version = %version,
            added = self.added.len(),
            changed = self.changed.len(),
            removed = self.removed.len(),
            "applied call-map delta"
        );
    }

    /// The delta that undoes this one: applying `self` and then
    /// `self.invert()` restores the original map.
    ///
    /// The inverse keeps this table's version label; it describes walking
    /// from `version` back to the version before it.
    pub fn invert(&self) -> DeltaTable {
        DeltaTable {
            version: self.version,
            added: self.removed.clone(),
            changed: self
                .changed
                .iter()
                .map(|(symbol, change)| {
                    (
                        *symbol,
                        Change {
                            old: change.new.clone(),
                            new: change.old.clone(),
                        },
                    )
                })
                .collect(),
            removed: self.added.clone(),
        }
    }
}
