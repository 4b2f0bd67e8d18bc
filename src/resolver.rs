/// Version-aware signature resolution.
///
/// The [`Resolver`] turns a [`VersionRegistry`] into the effective
/// [`SignatureMap`] for any target PHP version.
///
/// # Resolution pipeline
///
///   1. **Effective version**: the target is snapped down to the latest
///      registry version at or below it (the base version for targets older
///      than everything we know).  There is no interpolation between
///      registry entries.
///   2. **Cache hit**: a map already resolved for the effective version is
///      returned as is.
///   3. **Fold**: otherwise the fold starts from the nearest cached map at
///      or below the effective version (or from the base table) and applies
///      every remaining delta in increasing version order.  Starting from a
///      cached intermediate is sound because folding is a strict left fold:
///      `resolve(v_j) == fold(resolve(v_i), deltas(v_i, v_j])`.
///   4. **Publish**: the result is inserted into the cache (first insert
///      wins) and shared as an `Arc`.
///
/// There is no ambient "current PHP version": every call names its target,
/// so one resolver can serve analyses for several versions at once.
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::Config;
use crate::delta::DeltaTable;
use crate::error::{ConfigError, DriftWarning, InvalidVersion};
use crate::registry::VersionRegistry;
use crate::signature_map::SignatureMap;
use crate::types::SignatureValue;
use crate::version::PhpVersion;

/// A resolved map together with every drift warning raised while folding
/// it from the base table.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The version that was asked for.
    pub requested: PhpVersion,
    /// The registry version the map actually reflects.
    pub version: PhpVersion,
    pub map: Arc<SignatureMap>,
    pub warnings: Vec<DriftWarning>,
}

#[derive(Debug)]
pub struct Resolver {
    registry: Arc<VersionRegistry>,
    cache: Cache,
    default_version: Option<PhpVersion>,
    report_drift: bool,
}

impl Resolver {
    /// A resolver with an unbounded cache that logs drift at `warn`.
    pub fn new(registry: Arc<VersionRegistry>) -> Self {
        Self {
            registry,
            cache: Cache::new(None),
            default_version: None,
            report_drift: true,
        }
    }

    pub fn with_config(
        registry: Arc<VersionRegistry>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            registry,
            cache: Cache::new(config.cache.capacity),
            default_version: config.target_version()?,
            report_drift: config.resolver.report_drift,
        })
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// The configured default target, falling back to the newest version
    /// the registry knows.
    pub fn default_version(&self) -> PhpVersion {
        self.default_version
            .unwrap_or_else(|| self.registry.latest_version())
    }

    /// Resolve a version string such as `"8.0"`.
    pub fn resolve(&self, version: &str) -> Result<Arc<SignatureMap>, InvalidVersion> {
        Ok(self.resolve_version(PhpVersion::parse(version)?))
    }

    /// Resolve the configured default version.
    pub fn resolve_default(&self) -> Arc<SignatureMap> {
        self.resolve_version(self.default_version())
    }

    pub fn resolve_version(&self, target: PhpVersion) -> Arc<SignatureMap> {
        let effective = self.registry.effective_version(target);

        if let Some(hit) = self.cache.get(effective) {
            tracing::debug!(
                requested = %target,
                version = %effective,
                "signature map cache hit"
            );
            return hit;
        }

        let (start, mut map) = match self.cache.nearest_at_or_below(effective) {
            Some((version, cached)) if version == effective => return cached,
            Some((version, cached)) => (version, SignatureMap::clone(&cached)),
            None => (self.registry.base_version(), self.registry.base().clone()),
        };

        tracing::debug!(
            requested = %target,
            version = %effective,
            from = %start,
            "signature map cache miss, folding deltas"
        );

        let mut warnings = Vec::new();
        self.fold(&mut map, start, effective, &mut warnings);
        self.report(&warnings);

        self.cache.insert(effective, Arc::new(map))
    }

    /// Fold from the base table, collecting every drift warning on the way.
    ///
    /// Always does the full fold, so the warnings are complete even when a
    /// cached map for this version already exists.
    pub fn resolve_with_report(&self, target: PhpVersion) -> Resolution {
        let effective = self.registry.effective_version(target);
        let mut map = self.registry.base().clone();
        let mut warnings = Vec::new();
        self.fold(
            &mut map,
            self.registry.base_version(),
            effective,
            &mut warnings,
        );
        self.report(&warnings);

        Resolution {
            requested: target,
            version: effective,
            map: self.cache.insert(effective, Arc::new(map)),
            warnings,
        }
    }

    /// Look up one symbol at one version.
    ///
    /// `Ok(None)` means the symbol does not exist at that version; only an
    /// unparsable version is an error.
    pub fn lookup(
        &self,
        version: &str,
        symbol: &str,
    ) -> Result<Option<SignatureValue>, InvalidVersion> {
        Ok(self.resolve(version)?.lookup(symbol).cloned())
    }

    /// What changed between two versions, as a single delta labelled with
    /// the effective version of `to`.  `from` may be newer than `to`, in
    /// which case the delta walks backwards.
    pub fn diff(&self, from: &str, to: &str) -> Result<DeltaTable, InvalidVersion> {
        let from = PhpVersion::parse(from)?;
        let to = PhpVersion::parse(to)?;
        let older = self.resolve_version(from);
        let newer = self.resolve_version(to);
        Ok(older.diff(&newer, self.registry.effective_version(to)))
    }

    /// Drop every cached map.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    fn fold(
        &self,
        map: &mut SignatureMap,
        from: PhpVersion,
        to: PhpVersion,
        warnings: &mut Vec<DriftWarning>,
    ) {
        // Strictly in increasing version order: `changed` and `removed` are
        // relative to everything before them.
        for delta in self.registry.deltas_between(from, to) {
            delta.apply_in_place(map, warnings);
        }
    }

    fn report(&self, warnings: &[DriftWarning]) {
        for warning in warnings {
            if self.report_drift {
                tracing::warn!(version = %warning.version(), "{}", warning);
            } else {
                tracing::debug!(version = %warning.version(), "{}", warning);
            }
        }
    }
}
