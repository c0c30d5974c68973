//! Baseline resolution — finding a trustworthy "before" version
//!
//! Tries candidates in a fixed order, first success wins: merge-base (pr
//! mode) → VCS HEAD → session snapshot → disk seed. Every skip records a
//! machine-readable reason so an empty result is never silent. The two
//! caches (session snapshots, resolved merge-base commits) live for the
//! engine's lifetime and are cleared explicitly by the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::config::{BaselineMode, Config};
use crate::fsys::Filesystem;
use crate::vcs::VcsClient;

/// Where the baseline text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    /// File content at VCS HEAD
    VcsHead,
    /// File content at a freshly computed merge-base commit
    VcsMergeBase,
    /// File content at a pinned commit (a cached merge-base still at the
    /// same HEAD)
    VcsCommit,
    /// Session snapshot (last saved content, or the disk seed)
    Snapshot,
    /// Nothing usable — every candidate was exhausted
    None,
}

/// Whether a usable baseline was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
}

/// Why resolution fell past a candidate. Machine-readable, stable strings.
pub mod reason {
    pub const MERGE_BASE_UNAVAILABLE: &str = "merge_base_unavailable";
    pub const FILE_NOT_TRACKED: &str = "file_not_tracked";
    pub const FILE_NOT_AT_REF: &str = "file_not_at_ref";
    pub const VCS_UNAVAILABLE: &str = "vcs_unavailable";
    pub const GIT_DISABLED: &str = "git_disabled";
    pub const DISK_UNAVAILABLE: &str = "disk_unavailable";
}

/// How the baseline was resolved, including why any fallback occurred
#[derive(Debug, Clone, Serialize)]
pub struct BaselineResolution {
    pub ref_type: RefType,
    /// Symbolic ref the resolution targeted ("HEAD", the pr target branch)
    pub ref_name: Option<String>,
    /// Concrete commit the text was read at, when VCS-derived
    pub commit_id: Option<String>,
    pub availability: Availability,
    /// Reason for the decisive fallback, absent only when the first
    /// candidate succeeded
    pub reason: Option<&'static str>,
}

/// Outcome of one resolution attempt
#[derive(Debug)]
pub enum BaselineOutcome {
    /// A before-text was found; the diff should proceed
    Resolved {
        text: String,
        resolution: BaselineResolution,
    },
    /// No diffable before-version exists — the analysis is vacuously empty
    /// (first sight of an unchanged file, or every candidate exhausted)
    Empty { resolution: BaselineResolution },
}

impl BaselineOutcome {
    pub fn resolution(&self) -> &BaselineResolution {
        match self {
            BaselineOutcome::Resolved { resolution, .. } => resolution,
            BaselineOutcome::Empty { resolution } => resolution,
        }
    }
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct RefCacheKey {
    path: PathBuf,
    mode: BaselineMode,
    target: String,
}

struct CachedRef {
    /// HEAD commit when the merge-base was computed
    head: String,
    /// The resolved merge-base commit
    commit: String,
}

/// Resolver owning the session caches
#[derive(Default)]
pub struct BaselineResolver {
    /// Last content seen as "saved", per path
    snapshots: Mutex<HashMap<PathBuf, String>>,
    /// Resolved merge-base commit per (path, mode, target), with the HEAD
    /// it was computed at for the staleness check
    resolved_refs: Mutex<HashMap<RefCacheKey, CachedRef>>,
}

impl BaselineResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the baseline for `path`, given the file's current text.
    ///
    /// Candidate order is fixed (see module docs); the first candidate that
    /// yields text wins. The returned resolution carries the reason of the
    /// last skip before the winning candidate.
    pub fn resolve(
        &self,
        vcs: &dyn VcsClient,
        fs: &dyn Filesystem,
        config: &Config,
        path: &Path,
        current: &str,
    ) -> BaselineOutcome {
        let mut skip: Option<&'static str> = None;

        // Candidates 1-2: VCS (merge-base in pr mode, then HEAD)
        if config.git_integration {
            match self.resolve_vcs(vcs, config, path, &mut skip) {
                Some(outcome) => return outcome,
                None => debug!(reason = ?skip, path = %path.display(), "VCS baseline unavailable"),
            }
        } else {
            skip = Some(reason::GIT_DISABLED);
        }

        // Candidate 3: session snapshot
        if config.cache_enabled {
            let snapshots = self.snapshots.lock().expect("snapshot cache poisoned");
            if let Some(text) = snapshots.get(path) {
                return BaselineOutcome::Resolved {
                    text: text.clone(),
                    resolution: BaselineResolution {
                        ref_type: RefType::Snapshot,
                        ref_name: None,
                        commit_id: None,
                        availability: Availability::Available,
                        reason: skip,
                    },
                };
            }
        }

        // Candidate 4: first sight of this path — seed from disk
        match fs.read(path) {
            Ok(disk) => {
                if config.cache_enabled {
                    self.snapshots
                        .lock()
                        .expect("snapshot cache poisoned")
                        .insert(path.to_path_buf(), disk.clone());
                }
                let resolution = BaselineResolution {
                    ref_type: RefType::Snapshot,
                    ref_name: None,
                    commit_id: None,
                    availability: Availability::Available,
                    reason: skip,
                };
                if disk == current {
                    // Unchanged since the seed — nothing to diff
                    BaselineOutcome::Empty { resolution }
                } else {
                    BaselineOutcome::Resolved {
                        text: disk,
                        resolution,
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, path = %path.display(), "Disk baseline unavailable");
                // Candidate 5: the file is its own baseline from here on
                if config.cache_enabled {
                    self.snapshots
                        .lock()
                        .expect("snapshot cache poisoned")
                        .insert(path.to_path_buf(), current.to_string());
                }
                BaselineOutcome::Empty {
                    resolution: BaselineResolution {
                        ref_type: RefType::None,
                        ref_name: None,
                        commit_id: None,
                        availability: Availability::Unavailable,
                        reason: Some(reason::DISK_UNAVAILABLE),
                    },
                }
            }
        }
    }

    /// VCS candidates. Returns `None` (with `skip` set) when resolution
    /// should fall through to the snapshot chain.
    fn resolve_vcs(
        &self,
        vcs: &dyn VcsClient,
        config: &Config,
        path: &Path,
        skip: &mut Option<&'static str>,
    ) -> Option<BaselineOutcome> {
        let Some(head) = vcs.current_ref() else {
            *skip = Some(reason::VCS_UNAVAILABLE);
            return None;
        };

        if !vcs.is_tracked(path) {
            *skip = Some(reason::FILE_NOT_TRACKED);
            return None;
        }

        // Candidate 1: merge-base with the target ref (pr mode only)
        if config.baseline_mode == BaselineMode::Pr {
            match self.merge_base_commit(vcs, config, path, &head) {
                Some((commit, ref_type)) => {
                    if let Some(text) = vcs.read_at_ref(path, &commit) {
                        return Some(BaselineOutcome::Resolved {
                            text,
                            resolution: BaselineResolution {
                                ref_type,
                                ref_name: Some(config.pr_target_branch.clone()),
                                commit_id: Some(commit),
                                availability: Availability::Available,
                                reason: *skip,
                            },
                        });
                    }
                    *skip = Some(reason::FILE_NOT_AT_REF);
                }
                None => *skip = Some(reason::MERGE_BASE_UNAVAILABLE),
            }
        }

        // Candidate 2: HEAD (local mode, and the pr-mode fallback)
        if let Some(text) = vcs.read_at_ref(path, "HEAD") {
            return Some(BaselineOutcome::Resolved {
                text,
                resolution: BaselineResolution {
                    ref_type: RefType::VcsHead,
                    ref_name: Some("HEAD".to_string()),
                    commit_id: Some(head),
                    availability: Availability::Available,
                    reason: *skip,
                },
            });
        }

        // Tracked but not present at HEAD (renamed or newly added)
        *skip = Some(reason::FILE_NOT_AT_REF);
        None
    }

    /// Merge-base for the pr target, reusing the cached commit while HEAD
    /// is unchanged. A moved HEAD invalidates the cache and forces a fresh
    /// merge-base computation.
    fn merge_base_commit(
        &self,
        vcs: &dyn VcsClient,
        config: &Config,
        path: &Path,
        head: &str,
    ) -> Option<(String, RefType)> {
        let key = RefCacheKey {
            path: path.to_path_buf(),
            mode: config.baseline_mode,
            target: config.pr_target_branch.clone(),
        };

        {
            let cache = self.resolved_refs.lock().expect("ref cache poisoned");
            if let Some(cached) = cache.get(&key) {
                if cached.head == head {
                    return Some((cached.commit.clone(), RefType::VcsCommit));
                }
                debug!(
                    path = %path.display(),
                    "HEAD moved since last resolution, recomputing merge-base"
                );
            }
        }

        let commit = vcs.merge_base(&config.pr_target_branch)?;
        self.resolved_refs
            .lock()
            .expect("ref cache poisoned")
            .insert(
                key,
                CachedRef {
                    head: head.to_string(),
                    commit: commit.clone(),
                },
            );
        Some((commit, RefType::VcsMergeBase))
    }

    /// Overwrite the session snapshot for a path.
    ///
    /// Called by the engine after a successful non-empty analysis whose
    /// baseline was snapshot-derived, so the next analysis diffs against
    /// this save. VCS-derived baselines never touch the cache — the VCS
    /// reference stays authoritative.
    pub fn record_snapshot(&self, path: &Path, text: &str) {
        self.snapshots
            .lock()
            .expect("snapshot cache poisoned")
            .insert(path.to_path_buf(), text.to_string());
    }

    /// Whether a snapshot exists for the path
    pub fn has_snapshot(&self, path: &Path) -> bool {
        self.snapshots
            .lock()
            .expect("snapshot cache poisoned")
            .contains_key(path)
    }

    /// Drop both caches (session reset)
    pub fn clear(&self) {
        self.snapshots
            .lock()
            .expect("snapshot cache poisoned")
            .clear();
        self.resolved_refs
            .lock()
            .expect("ref cache poisoned")
            .clear();
    }
}
