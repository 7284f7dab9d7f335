//! Locator inventory and per-locator maintenance status.
//!
//! The canonical locator index is computed at generation time, from the
//! locators actually chosen for each step, and merged into a root-level
//! `locator-index.json`. A pattern-matching recovery path exists only for
//! bundles whose generation-time data was lost.
//!
//! Maintenance status is keyed by `(strategy, locator text)` and stored in
//! its own root-level file, independent of any bundle, so status survives
//! locator text edits via an explicit rekey.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bundle::write_atomic;
use crate::locator::{Locator, Strategy};
use crate::result::GrabarResult;

/// Index file name under the bundle root.
pub const INDEX_FILE: &str = "locator-index.json";

/// Maintenance-status file name under the bundle root.
pub const MAINTENANCE_FILE: &str = "locator-maintenance.json";

/// Stored index record: per-test occurrence counts for one locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    /// Stable locator key text
    pub locator: String,
    /// Addressing strategy
    pub strategy_type: Strategy,
    /// Occurrences per test slug
    pub uses: BTreeMap<String, u32>,
}

/// Dashboard view of one locator: total usage plus the tests using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorIndexEntry {
    /// Stable locator key text
    pub locator: String,
    /// Addressing strategy
    pub strategy_type: Strategy,
    /// Total occurrences across all tests
    pub usage_count: u32,
    /// Tests using this locator, sorted
    pub used_in_tests: Vec<String>,
}

impl IndexRecord {
    fn to_entry(&self) -> LocatorIndexEntry {
        LocatorIndexEntry {
            locator: self.locator.clone(),
            strategy_type: self.strategy_type,
            usage_count: self.uses.values().sum(),
            used_in_tests: self.uses.keys().cloned().collect(),
        }
    }
}

/// The root-level locator index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorIndex {
    /// Stored records, sorted by (strategy, locator)
    pub records: Vec<IndexRecord>,
}

impl LocatorIndex {
    /// Load the index from a bundle root. A missing file is an empty index;
    /// a corrupted file is replaced (logged) rather than fatal.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let path = root.join(INDEX_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                tracing::warn!(%err, path = %path.display(), "locator index unreadable, starting fresh");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist the index atomically.
    pub fn save(&self, root: &Path) -> GrabarResult<()> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        write_atomic(&root.join(INDEX_FILE), &text)?;
        Ok(())
    }

    /// Replace every use attributed to `slug` with the given locators.
    pub fn set_test_locators(&mut self, slug: &str, locators: &[Locator]) {
        for record in &mut self.records {
            record.uses.remove(slug);
        }
        for locator in locators {
            let key = locator.display_text();
            let pos = self
                .records
                .iter()
                .position(|r| r.locator == key && r.strategy_type == locator.strategy)
                .unwrap_or_else(|| {
                    self.records.push(IndexRecord {
                        locator: key,
                        strategy_type: locator.strategy,
                        uses: BTreeMap::new(),
                    });
                    self.records.len() - 1
                });
            *self.records[pos]
                .uses
                .entry(slug.to_string())
                .or_insert(0) += 1;
        }
        self.records.retain(|r| !r.uses.is_empty());
        self.records
            .sort_by(|a, b| (a.strategy_type.as_str(), &a.locator).cmp(&(b.strategy_type.as_str(), &b.locator)));
    }

    /// Dashboard entries.
    #[must_use]
    pub fn entries(&self) -> Vec<LocatorIndexEntry> {
        self.records.iter().map(IndexRecord::to_entry).collect()
    }
}

/// Merge a test's chosen locators into the root index and save it.
pub fn merge_index(root: &Path, slug: &str, locators: &[Locator]) -> GrabarResult<LocatorIndex> {
    let mut index = LocatorIndex::load(root);
    index.set_test_locators(slug, locators);
    index.save(root)?;
    Ok(index)
}

fn recovery_patterns() -> &'static [(Strategy, Regex)] {
    static PATTERNS: OnceLock<Vec<(Strategy, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                Strategy::Role,
                Regex::new(r"getByRole\('([^']*)'(?:,\s*\{\s*name:\s*'([^']*)'\s*\})?\)").unwrap(),
            ),
            (Strategy::Label, Regex::new(r"getByLabel\('([^']*)'\)").unwrap()),
            (
                Strategy::Placeholder,
                Regex::new(r"getByPlaceholder\('([^']*)'\)").unwrap(),
            ),
            (Strategy::Text, Regex::new(r"getByText\('([^']*)'\)").unwrap()),
            (
                Strategy::TestId,
                Regex::new(r"getByTestId\('([^']*)'\)").unwrap(),
            ),
            (Strategy::Css, Regex::new(r"\.locator\('([^']*)'\)").unwrap()),
        ]
    })
}

/// Recover locator occurrences from a generated spec's text.
///
/// Fallback only: approximate (escaped quotes are not handled) and blind to
/// anything the generation-time index would know. Prefer the stored index.
#[must_use]
pub fn recover_from_spec(source: &str) -> Vec<Locator> {
    let mut found = Vec::new();
    for (strategy, pattern) in recovery_patterns() {
        for captures in pattern.captures_iter(source) {
            let selector = captures.get(1).map_or("", |m| m.as_str());
            let locator = match strategy {
                Strategy::Role => Locator::role(
                    selector,
                    captures.get(2).map(|m| m.as_str().to_string()),
                ),
                Strategy::Label => Locator::label(selector),
                Strategy::Placeholder => Locator::placeholder(selector),
                Strategy::Text => Locator::text(selector),
                Strategy::TestId => Locator::test_id(selector),
                _ => {
                    if crate::locator::is_xpath(selector) {
                        Locator::xpath(selector)
                    } else {
                        Locator::css(selector)
                    }
                }
            };
            found.push(locator);
        }
    }
    found
}

/// Health of a locator, maintained outside any bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceStatus {
    /// Works and is unique
    Healthy,
    /// Flagged by an evaluation or a human
    NeedsReview,
    /// Known broken
    Broken,
}

/// One maintenance record, keyed by `(strategy, locator text)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    /// Addressing strategy
    pub strategy_type: Strategy,
    /// Stable locator key text
    pub locator_text: String,
    /// Current status
    pub status: MaintenanceStatus,
    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Store of per-locator maintenance status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceStore {
    /// Records, sorted by key
    pub records: Vec<MaintenanceRecord>,
}

impl MaintenanceStore {
    /// Load from a bundle root; missing file is an empty store.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        match std::fs::read_to_string(root.join(MAINTENANCE_FILE)) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persist atomically.
    pub fn save(&self, root: &Path) -> GrabarResult<()> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        write_atomic(&root.join(MAINTENANCE_FILE), &text)?;
        Ok(())
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, strategy: Strategy, locator_text: &str) -> Option<&MaintenanceRecord> {
        self.records
            .iter()
            .find(|r| r.strategy_type == strategy && r.locator_text == locator_text)
    }

    /// Set (or create) the status for a key.
    pub fn set_status(
        &mut self,
        strategy: Strategy,
        locator_text: &str,
        status: MaintenanceStatus,
        note: Option<String>,
    ) {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.strategy_type == strategy && r.locator_text == locator_text)
        {
            record.status = status;
            record.note = note;
        } else {
            self.records.push(MaintenanceRecord {
                strategy_type: strategy,
                locator_text: locator_text.to_string(),
                status,
                note,
            });
        }
        self.records
            .sort_by(|a, b| (a.strategy_type.as_str(), &a.locator_text).cmp(&(b.strategy_type.as_str(), &b.locator_text)));
    }

    /// Move a record to a new key, preserving its status. Called when a
    /// locator's text is edited so history is not lost.
    ///
    /// Returns `false` when there is nothing under the old key.
    pub fn rekey(&mut self, strategy: Strategy, old_text: &str, new_text: &str) -> bool {
        let Some(pos) = self
            .records
            .iter()
            .position(|r| r.strategy_type == strategy && r.locator_text == old_text)
        else {
            return false;
        };
        let record = self.records.remove(pos);
        self.set_status(strategy, new_text, record.status, record.note);
        true
    }

    /// Path of the store file under a root.
    #[must_use]
    pub fn path(root: &Path) -> PathBuf {
        root.join(MAINTENANCE_FILE)
    }
}
