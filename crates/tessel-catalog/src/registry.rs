//! Component registry
//!
//! The registry maps operator names to [`TransformerDescriptor`]s. It is
//! populated by [`ComponentRegistry::discover`] (manifests in a search
//! directory) and [`ComponentRegistry::register_builtins`] (the static table),
//! then read by pipeline search through [`ComponentRegistry::lookup`] and
//! [`ComponentRegistry::all`].
//!
//! Entries live in a copy-on-write map. A discovery pass stages its candidates
//! without holding the lock, then builds the merged map and swaps it in under
//! the write lock. Readers therefore see either the map before a pass or the
//! map after it, never a partial merge, and passes over different locations
//! are serialized. Each `(package, location)` pair is merged at most once.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tessel_core::config::{CatalogConfig, ConflictPolicy};
use tessel_core::{Capability, FeatureType, Transformer};

use crate::descriptor::{Source, TransformerDescriptor};
use crate::error::{DiscoveryError, DiscoveryErrorKind, Error, Result};
use crate::manifest;
use crate::operator::{OperatorKind, OperatorTable, Params};

/// Package identity used for table entries
pub const BUILTIN_PACKAGE: &str = "builtin";

/// How discovery treats failures and name collisions
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    /// Abort on the first candidate that fails to load
    pub fail_fast: bool,
    /// Name collision policy
    pub on_conflict: ConflictPolicy,
}

impl From<&CatalogConfig> for DiscoveryOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            fail_fast: config.fail_fast,
            on_conflict: config.on_conflict,
        }
    }
}

/// A candidate skipped because it lacks required capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    /// Name the candidate would have been registered under
    pub name: String,
    /// Required capabilities it does not provide
    pub missing: Vec<Capability>,
}

/// Outcome of one discovery pass
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Package identity of the pass
    pub package: String,
    /// Canonical search location
    pub location: PathBuf,
    /// Names added by the pass
    pub registered: Vec<String>,
    /// Names whose previous entry was replaced (last-write-wins only)
    pub replaced: Vec<String>,
    /// Candidates lacking required capabilities
    pub excluded: Vec<Exclusion>,
    /// Candidates that failed to load or collided
    pub errors: Vec<DiscoveryError>,
    /// The pair had already been discovered; nothing changed
    pub already_discovered: bool,
}

impl DiscoveryReport {
    /// Whether the pass finished without collecting errors
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

type Entries = BTreeMap<String, Arc<TransformerDescriptor>>;

#[derive(Default)]
struct RegistryState {
    entries: Arc<Entries>,
    discovered: HashSet<(String, PathBuf)>,
}

/// Name-keyed catalog of transformer descriptors
pub struct ComponentRegistry {
    table: OperatorTable,
    options: DiscoveryOptions,
    state: RwLock<RegistryState>,
}

enum Candidate {
    Accepted(TransformerDescriptor),
    Excluded(Exclusion),
}

/// Candidates staged by a scan, not yet visible to readers
#[derive(Default)]
struct Staged {
    candidates: Vec<TransformerDescriptor>,
    excluded: Vec<Exclusion>,
    errors: Vec<DiscoveryError>,
}

impl ComponentRegistry {
    /// Create an empty registry that instantiates operators from `table`
    pub fn new(table: OperatorTable, options: DiscoveryOptions) -> Self {
        Self {
            table,
            options,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Operator kinds available to manifests
    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    /// Discovery options
    pub fn options(&self) -> DiscoveryOptions {
        self.options
    }

    /// Scan `location` for operator manifests and register every candidate
    /// that provides all of `required`.
    ///
    /// Only the direct entries of `location` are inspected; files without a
    /// `.yaml`/`.yml` extension are ignored. A candidate that fails to load is
    /// recorded in the report and the scan goes on, unless the registry runs
    /// in fail-fast mode, in which case the first failure is returned and
    /// nothing from the scan is registered.
    ///
    /// Calling again with the same `package` and location is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::LocationUnreadable`] if `location` is not a readable directory
    /// - [`Error::Discovery`] on the first failure in fail-fast mode
    pub fn discover(
        &self,
        package: &str,
        location: impl AsRef<Path>,
        required: &[Capability],
    ) -> Result<DiscoveryReport> {
        let location = location.as_ref();
        let unreadable = |message: String| Error::LocationUnreadable {
            path: location.display().to_string(),
            message,
        };
        let canonical = location
            .canonicalize()
            .map_err(|e| unreadable(e.to_string()))?;
        if !canonical.is_dir() {
            return Err(unreadable("not a directory".to_string()));
        }

        let key = (package.to_string(), canonical.clone());
        if self.read_state().discovered.contains(&key) {
            tracing::debug!(package, location = %canonical.display(), "already discovered");
            return Ok(DiscoveryReport::already(package, canonical));
        }

        tracing::info!(package, location = %canonical.display(), "discovering operators");
        let staged = self.scan(package, &canonical, required)?;
        self.commit(key, staged)
    }

    /// Register every table entry under its kind name with default
    /// parameters, skipping kinds that lack any of `required`.
    pub fn register_builtins(&self, required: &[Capability]) -> Result<DiscoveryReport> {
        let key = (BUILTIN_PACKAGE.to_string(), PathBuf::new());
        if self.read_state().discovered.contains(&key) {
            return Ok(DiscoveryReport::already(BUILTIN_PACKAGE, PathBuf::new()));
        }

        let mut staged = Staged::default();
        for kind in self.table.iter() {
            let origin = PathBuf::from(format!("<{}>/{}", BUILTIN_PACKAGE, kind.name));
            let source = Source {
                package: BUILTIN_PACKAGE.to_string(),
                path: None,
            };
            match self.candidate(kind.name, kind, Params::Null, source, required) {
                Ok(Candidate::Accepted(descriptor)) => staged.candidates.push(descriptor),
                Ok(Candidate::Excluded(exclusion)) => staged.excluded.push(exclusion),
                Err(kind) => self.record(&mut staged, DiscoveryError::new(origin, kind))?,
            }
        }
        self.commit(key, staged)
    }

    /// Whether `(package, location)` has already been merged
    pub fn is_discovered(&self, package: &str, location: impl AsRef<Path>) -> bool {
        let Ok(canonical) = location.as_ref().canonicalize() else {
            return false;
        };
        self.read_state()
            .discovered
            .contains(&(package.to_string(), canonical))
    }

    /// Descriptor registered under `name`
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no descriptor has that name.
    pub fn lookup(&self, name: &str) -> Result<Arc<TransformerDescriptor>> {
        self.read_state()
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })
    }

    /// Fresh, unfitted transformer for the descriptor registered under `name`
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Transformer>> {
        Ok(self.lookup(name)?.instantiate()?)
    }

    /// Immutable view of every registered descriptor
    pub fn all(&self) -> Snapshot {
        Snapshot {
            entries: Arc::clone(&self.read_state().entries),
        }
    }

    /// Registered names, in order
    pub fn names(&self) -> Vec<String> {
        self.read_state().entries.keys().cloned().collect()
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.read_state().entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.read_state().entries.is_empty()
    }

    fn scan(&self, package: &str, location: &Path, required: &[Capability]) -> Result<Staged> {
        let mut staged = Staged::default();

        let walker = walkdir::WalkDir::new(location)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(location).to_path_buf();
                    let kind = DiscoveryErrorKind::Unreadable(e.to_string());
                    self.record(&mut staged, DiscoveryError::new(path, kind))?;
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !manifest::is_manifest(path) {
                continue;
            }

            match self.load_candidate(package, path, required) {
                Ok(Candidate::Accepted(descriptor)) => {
                    tracing::debug!(name = descriptor.name(), path = %path.display(), "found operator");
                    staged.candidates.push(descriptor);
                }
                Ok(Candidate::Excluded(exclusion)) => staged.excluded.push(exclusion),
                Err(kind) => self.record(&mut staged, DiscoveryError::new(path, kind))?,
            }
        }

        Ok(staged)
    }

    fn load_candidate(
        &self,
        package: &str,
        path: &Path,
        required: &[Capability],
    ) -> std::result::Result<Candidate, DiscoveryErrorKind> {
        let name = manifest::manifest_name(path).ok_or_else(|| {
            DiscoveryErrorKind::Malformed("file name is not valid UTF-8".to_string())
        })?;
        let manifest = manifest::load(path)?;
        let kind = self
            .table
            .get(&manifest.kind)
            .ok_or_else(|| DiscoveryErrorKind::UnknownKind {
                kind: manifest.kind.clone(),
            })?;
        let source = Source {
            package: package.to_string(),
            path: Some(path.to_path_buf()),
        };
        Ok(
            match self.candidate(name, kind, manifest.params, source, required)? {
                Candidate::Accepted(d) => {
                    Candidate::Accepted(d.with_description(manifest.description))
                }
                excluded => excluded,
            },
        )
    }

    fn candidate(
        &self,
        name: &str,
        kind: &OperatorKind,
        params: Params,
        source: Source,
        required: &[Capability],
    ) -> std::result::Result<Candidate, DiscoveryErrorKind> {
        if !kind.provides(required) {
            tracing::debug!(name, kind = kind.name, "operator lacks required capabilities");
            return Ok(Candidate::Excluded(Exclusion {
                name: name.to_string(),
                missing: kind.missing(required),
            }));
        }
        TransformerDescriptor::new(name, *kind, params, source)
            .map(Candidate::Accepted)
            .map_err(|e| DiscoveryErrorKind::InvalidParams(e.to_string()))
    }

    fn record(&self, staged: &mut Staged, error: DiscoveryError) -> Result<()> {
        if self.options.fail_fast {
            return Err(Error::Discovery(error));
        }
        tracing::warn!(error = %error, "skipping operator");
        staged.errors.push(error);
        Ok(())
    }

    fn commit(&self, key: (String, PathBuf), staged: Staged) -> Result<DiscoveryReport> {
        let (package, location) = key.clone();
        let mut report = DiscoveryReport {
            package,
            location,
            excluded: staged.excluded,
            errors: staged.errors,
            ..Default::default()
        };

        let mut state = self.write_state();
        if state.discovered.contains(&key) {
            // lost a race against an identical pass
            report.already_discovered = true;
            report.excluded.clear();
            report.errors.clear();
            return Ok(report);
        }

        let mut entries: Entries = (*state.entries).clone();
        for descriptor in staged.candidates {
            let name = descriptor.name().to_string();
            let existing = entries.get(&name).map(|e| e.source().to_string());
            match (existing, self.options.on_conflict) {
                (Some(existing), ConflictPolicy::Reject) => {
                    let path = descriptor
                        .source()
                        .path
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(&name));
                    let error = DiscoveryError::new(
                        path,
                        DiscoveryErrorKind::NameConflict {
                            name: name.clone(),
                            existing,
                        },
                    );
                    if self.options.fail_fast {
                        return Err(Error::Discovery(error));
                    }
                    tracing::warn!(error = %error, "operator name already taken");
                    report.errors.push(error);
                }
                (Some(previous), ConflictPolicy::LastWriteWins) => {
                    tracing::warn!(
                        name = %name,
                        previous = %previous,
                        replacement = %descriptor.source(),
                        "replacing operator"
                    );
                    report.replaced.push(name.clone());
                    entries.insert(name, Arc::new(descriptor));
                }
                (None, _) => {
                    report.registered.push(name.clone());
                    entries.insert(name, Arc::new(descriptor));
                }
            }
        }

        state.entries = Arc::new(entries);
        state.discovered.insert(key);
        drop(state);

        tracing::info!(
            package = %report.package,
            registered = report.registered.len(),
            replaced = report.replaced.len(),
            excluded = report.excluded.len(),
            errors = report.errors.len(),
            "discovery complete"
        );
        Ok(report)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        // writers swap whole maps, so a poisoned lock still guards a consistent state
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiscoveryReport {
    fn already(package: &str, location: PathBuf) -> Self {
        Self {
            package: package.to_string(),
            location,
            already_discovered: true,
            ..Default::default()
        }
    }
}

/// Immutable view of the registry at one point in time
///
/// Iteration is lazy and can be restarted any number of times; descriptors
/// come out in name order.
#[derive(Debug, Clone)]
pub struct Snapshot {
    entries: Arc<Entries>,
}

impl Snapshot {
    /// Iterate over descriptors in name order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TransformerDescriptor>> + Clone + '_ {
        self.entries.values()
    }

    /// Descriptor registered under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<TransformerDescriptor>> {
        self.entries.get(name)
    }

    /// Descriptors that accept at least one of `types`
    pub fn candidates_for<'a>(
        &'a self,
        types: &'a [FeatureType],
    ) -> impl Iterator<Item = &'a Arc<TransformerDescriptor>> + 'a {
        self.iter()
            .filter(move |d| types.iter().any(|&t| d.signature().accepts(t)))
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Arc<TransformerDescriptor>;
    type IntoIter = std::collections::btree_map::Values<'a, String, Arc<TransformerDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
