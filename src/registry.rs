//! The ordered set of call-map versions.
//!
//! A [`VersionRegistry`] holds one full base table for the oldest supported
//! PHP version plus one [`DeltaTable`] per later version, in strictly
//! increasing version order.  It is assembled once at startup through
//! [`RegistryBuilder`] and is read-only afterwards, so it can be shared
//! across threads behind an `Arc` without locking.

use crate::delta::DeltaTable;
use crate::error::RegistryError;
use crate::signature_map::SignatureMap;
use crate::version::PhpVersion;

#[derive(Debug, Clone)]
pub struct VersionRegistry {
    base_version: PhpVersion,
    base: SignatureMap,
    /// Sorted by version, every version greater than `base_version`.
    deltas: Vec<DeltaTable>,
}

impl VersionRegistry {
    pub fn builder(base_version: PhpVersion, base: SignatureMap) -> RegistryBuilder {
        RegistryBuilder {
            base_version,
            base,
            deltas: Vec::new(),
        }
    }

    pub fn base_version(&self) -> PhpVersion {
        self.base_version
    }

    pub fn base(&self) -> &SignatureMap {
        &self.base
    }

    pub fn deltas(&self) -> &[DeltaTable] {
        &self.deltas
    }

    /// Every registered version, base first.
    pub fn versions(&self) -> Vec<PhpVersion> {
        std::iter::once(self.base_version)
            .chain(self.deltas.iter().map(DeltaTable::version))
            .collect()
    }

    pub fn latest_version(&self) -> PhpVersion {
        self.deltas
            .last()
            .map(DeltaTable::version)
            .unwrap_or(self.base_version)
    }

    pub fn delta(&self, version: PhpVersion) -> Option<&DeltaTable> {
        self.deltas
            .binary_search_by_key(&version, DeltaTable::version)
            .ok()
            .map(|idx| &self.deltas[idx])
    }

    /// Number of deltas whose version is `<= target`.
    fn applicable_count(&self, target: PhpVersion) -> usize {
        self.deltas.partition_point(|d| d.version() <= target)
    }

    /// The latest registry version at or below `target`.
    ///
    /// Targets older than the base resolve to the base version: very old
    /// versions are approximated by the oldest state we know.
    pub fn effective_version(&self, target: PhpVersion) -> PhpVersion {
        match self.applicable_count(target) {
            0 => self.base_version,
            n => self.deltas[n - 1].version(),
        }
    }

    /// Deltas with `from < version <= to`, in increasing version order.
    pub fn deltas_between(&self, from: PhpVersion, to: PhpVersion) -> &[DeltaTable] {
        let start = self.applicable_count(from);
        let end = self.applicable_count(to);
        if start >= end {
            return &[];
        }
        &self.deltas[start..end]
    }
}

/// Collects deltas and validates their ordering.
#[derive(Debug)]
pub struct RegistryBuilder {
    base_version: PhpVersion,
    base: SignatureMap,
    deltas: Vec<DeltaTable>,
}

impl RegistryBuilder {
    /// Append a delta.  Deltas must be added in increasing version order.
    pub fn delta(mut self, table: DeltaTable) -> Self {
        self.deltas.push(table);
        self
    }

    pub fn deltas(mut self, tables: impl IntoIterator<Item = DeltaTable>) -> Self {
        self.deltas.extend(tables);
        self
    }

    pub fn build(self) -> Result<VersionRegistry, RegistryError> {
        let mut previous = self.base_version;
        for table in &self.deltas {
            let version = table.version();
            if version == previous {
                return Err(RegistryError::Duplicate { version });
            }
            if version < previous {
                return Err(RegistryError::OutOfOrder { version, previous });
            }
            previous = version;
        }

        tracing::debug!(
            base = %self.base_version,
            latest = %previous,
            deltas = self.deltas.len(),
            base_symbols = self.base.len(),
            "call-map registry built"
        );

        Ok(VersionRegistry {
            base_version: self.base_version,
            base: self.base,
            deltas: self.deltas,
        })
    }
}
