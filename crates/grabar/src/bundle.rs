//! Test bundles: the co-located artifact set for one generated test.
//!
//! Layout under the bundle root is fixed:
//!
//! ```text
//! <root>/<slug>/<slug>.spec.js
//! <root>/<slug>/<slug>.meta.json
//! <root>/<slug>/<slug>.meta.md
//! <root>/data/<slug>Data.json
//! ```
//!
//! Artifact writes go through a temp-file-and-rename so an interrupted
//! process never leaves a truncated file. Exactly one generate/update
//! operation may hold a bundle at a time.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};

use crate::result::{GrabarError, GrabarResult};

/// Derive the filesystem-safe identifier from a test's display name.
///
/// Lower-case, whitespace runs become a single hyphen, anything outside
/// `[a-z0-9-]` is stripped. Pure and idempotent.
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            out.push('-');
            in_whitespace = false;
        }
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            out.push(c);
        }
    }
    out.trim_matches('-').to_string()
}

/// Resolved artifact paths for one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    /// Bundle slug
    pub slug: String,
    /// Bundle directory
    pub dir: PathBuf,
    /// Spec source file
    pub spec: PathBuf,
    /// Structured metadata document
    pub meta_json: PathBuf,
    /// Free-text summary document
    pub meta_md: PathBuf,
    /// Companion data file (sibling `data/` directory)
    pub data_file: PathBuf,
}

/// Compute all artifact paths for `slug` under `root`.
#[must_use]
pub fn bundle_paths(root: &Path, slug: &str) -> BundlePaths {
    let dir = root.join(slug);
    BundlePaths {
        slug: slug.to_string(),
        dir: dir.clone(),
        spec: dir.join(format!("{slug}.spec.js")),
        meta_json: dir.join(format!("{slug}.meta.json")),
        meta_md: dir.join(format!("{slug}.meta.md")),
        data_file: root.join("data").join(format!("{slug}Data.json")),
    }
}

/// Completeness of a bundle on disk.
///
/// A spec without metadata (or the reverse) is a detectable partial state,
/// distinct from "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleState {
    /// Spec and metadata both present
    Complete,
    /// Spec present, metadata missing
    SpecOnly,
    /// Metadata present, spec missing
    MetaOnly,
    /// Neither artifact exists
    Missing,
}

/// Probe the completeness of a bundle.
#[must_use]
pub fn bundle_state(root: &Path, slug: &str) -> BundleState {
    let paths = bundle_paths(root, slug);
    match (paths.spec.is_file(), paths.meta_json.is_file()) {
        (true, true) => BundleState::Complete,
        (true, false) => BundleState::SpecOnly,
        (false, true) => BundleState::MetaOnly,
        (false, false) => BundleState::Missing,
    }
}

/// A generated bundle on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBundle {
    /// Resolved artifact paths
    pub paths: BundlePaths,
    /// Whether a companion data file exists
    pub has_data_file: bool,
}

/// One row of a bundle listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSummary {
    /// Bundle slug
    pub slug: String,
    /// Completeness state
    pub state: BundleState,
}

/// List bundles under a root with their completeness state.
///
/// The `data/` sibling directory is not a bundle and is skipped.
pub fn list_bundles(root: &Path) -> GrabarResult<Vec<BundleSummary>> {
    let mut summaries = Vec::new();
    if !root.is_dir() {
        return Ok(summaries);
    }
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name == "data" {
            continue;
        }
        summaries.push(BundleSummary {
            state: bundle_state(root, &name),
            slug: name,
        });
    }
    summaries.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(summaries)
}

/// Write `contents` to `path` atomically: temp file in the same directory,
/// then rename over the target.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Context-wrapping helper for artifact writes.
pub(crate) fn write_artifact(
    slug: &str,
    operation: &'static str,
    path: &Path,
    contents: &str,
) -> GrabarResult<()> {
    write_atomic(path, contents).map_err(|e| GrabarError::ArtifactWrite {
        slug: slug.to_string(),
        path: path.to_path_buf(),
        operation,
        message: e.to_string(),
    })
}

static BUSY_BUNDLES: OnceLock<(Mutex<HashSet<PathBuf>>, std::sync::Condvar)> = OnceLock::new();

fn busy_set() -> &'static (Mutex<HashSet<PathBuf>>, std::sync::Condvar) {
    BUSY_BUNDLES.get_or_init(|| (Mutex::new(HashSet::new()), std::sync::Condvar::new()))
}

/// Exclusive hold on a bundle directory for the duration of one
/// generate/update operation. Dropping releases it.
///
/// Exactly one writer per bundle directory: [`BundleGuard::acquire`] blocks
/// until the directory is free, [`BundleGuard::try_acquire`] fails fast with
/// [`GrabarError::BundleBusy`] instead.
#[derive(Debug)]
pub struct BundleGuard {
    dir: PathBuf,
}

impl BundleGuard {
    /// Acquire the bundle directory, waiting for any in-flight operation to
    /// finish.
    pub fn acquire(dir: &Path, _slug: &str) -> GrabarResult<Self> {
        let (set, condvar) = busy_set();
        let mut busy = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while busy.contains(dir) {
            busy = condvar
                .wait(busy)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        busy.insert(dir.to_path_buf());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Acquire without waiting; another in-flight operation is an error.
    pub fn try_acquire(dir: &Path, slug: &str) -> GrabarResult<Self> {
        let (set, _) = busy_set();
        let mut busy = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !busy.insert(dir.to_path_buf()) {
            return Err(GrabarError::BundleBusy {
                slug: slug.to_string(),
            });
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

impl Drop for BundleGuard {
    fn drop(&mut self) {
        let (set, condvar) = busy_set();
        let mut busy = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        busy.remove(&self.dir);
        condvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod slug_tests {
        use super::*;

        #[test]
        fn display_name_to_slug() {
            assert_eq!(slug("Create Sales Order"), "create-sales-order");
        }

        #[test]
        fn idempotent() {
            for input in ["Create Sales Order", "  Padded  ", "Ünïcode Näme", "x---y"] {
                let once = slug(input);
                assert_eq!(slug(&once), once, "not idempotent for {input:?}");
            }
        }

        #[test]
        fn whitespace_runs_become_one_hyphen() {
            assert_eq!(slug("a \t\n b"), "a-b");
        }

        #[test]
        fn strips_outside_charset() {
            assert_eq!(slug("Order #42 (final)"), "order-42-final");
            assert_eq!(slug("Café"), "caf");
        }

        #[test]
        fn empty_and_symbol_only_names() {
            assert_eq!(slug(""), "");
            assert_eq!(slug("!!!"), "");
        }
    }

    mod layout_tests {
        use super::*;

        #[test]
        fn paths_follow_fixed_layout() {
            let paths = bundle_paths(Path::new("/w"), "create-sales-order");
            assert_eq!(
                paths.spec,
                Path::new("/w/create-sales-order/create-sales-order.spec.js")
            );
            assert_eq!(
                paths.meta_json,
                Path::new("/w/create-sales-order/create-sales-order.meta.json")
            );
            assert_eq!(
                paths.data_file,
                Path::new("/w/data/create-sales-orderData.json")
            );
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn partial_states_are_distinct() {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path();
            assert_eq!(bundle_state(root, "t"), BundleState::Missing);

            let paths = bundle_paths(root, "t");
            std::fs::create_dir_all(&paths.dir).unwrap();
            std::fs::write(&paths.spec, "spec").unwrap();
            assert_eq!(bundle_state(root, "t"), BundleState::SpecOnly);

            std::fs::write(&paths.meta_json, "{}").unwrap();
            assert_eq!(bundle_state(root, "t"), BundleState::Complete);

            std::fs::remove_file(&paths.spec).unwrap();
            assert_eq!(bundle_state(root, "t"), BundleState::MetaOnly);
        }

        #[test]
        fn listing_skips_data_dir() {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path();
            std::fs::create_dir_all(root.join("data")).unwrap();
            std::fs::create_dir_all(root.join("login")).unwrap();
            std::fs::write(root.join("login/login.spec.js"), "s").unwrap();

            let listed = list_bundles(root).unwrap();
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].slug, "login");
            assert_eq!(listed[0].state, BundleState::SpecOnly);
        }
    }

    mod write_tests {
        use super::*;

        #[test]
        fn atomic_write_replaces_contents() {
            let tmp = tempfile::tempdir().unwrap();
            let path = tmp.path().join("f.txt");
            write_atomic(&path, "one").unwrap();
            write_atomic(&path, "two").unwrap();
            assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        }
    }

    mod lock_tests {
        use super::*;

        #[test]
        fn try_acquire_fails_while_held() {
            let dir = Path::new("/locks/test-a");
            let guard = BundleGuard::try_acquire(dir, "test-a").unwrap();
            let second = BundleGuard::try_acquire(dir, "test-a");
            assert!(matches!(second, Err(GrabarError::BundleBusy { .. })));
            drop(guard);
            assert!(BundleGuard::try_acquire(dir, "test-a").is_ok());
        }

        #[test]
        fn distinct_bundles_do_not_contend() {
            let _a = BundleGuard::try_acquire(Path::new("/locks/test-b"), "test-b").unwrap();
            assert!(BundleGuard::try_acquire(Path::new("/locks/test-c"), "test-c").is_ok());
        }

        #[test]
        fn acquire_waits_for_release() {
            let dir = Path::new("/locks/test-d");
            let guard = BundleGuard::acquire(dir, "test-d").unwrap();
            let handle = std::thread::spawn({
                let dir = dir.to_path_buf();
                move || BundleGuard::acquire(&dir, "test-d").is_ok()
            });
            std::thread::sleep(std::time::Duration::from_millis(20));
            drop(guard);
            assert!(handle.join().unwrap());
        }
    }
}
