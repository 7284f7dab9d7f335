//! Targeted edits to a generated spec without destroying unrelated content.
//!
//! Steps are addressed through their embedded `// @step:<fingerprint>`
//! marker comments, not line numbers — line numbers shift with every edit
//! and any external reformatting. A step's region runs from its marker
//! through the line before the next marker (or the test body close), so
//! hand-written lines inside a step stay with that step.
//!
//! Every operation is all-or-nothing: it either returns the full updated
//! source or fails without touching anything. Byte content outside the
//! affected region(s) is preserved exactly.

use std::path::{Path, PathBuf};

use grabar_script::parse::spec_sections;
use grabar_script::transform::LineSpan;

use crate::bundle::{bundle_paths, write_artifact, BundleGuard};
use crate::result::{GrabarError, GrabarResult};

/// Marker prefix anchoring a step inside a generated spec.
pub const STEP_MARKER: &str = "// @step:";

/// Result of one step edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEdit {
    /// Full updated spec source
    pub updated_source: String,
    /// 1-indexed line spans in the updated source that were written by the
    /// edit (empty for pure deletions)
    pub updated_spans: Vec<LineSpan>,
}

/// One step's owned region: 0-based line indices, `start` is the marker
/// line, `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepRegion {
    start: usize,
    end: usize,
}

fn is_marker(line: &str) -> bool {
    line.trim_start().starts_with(STEP_MARKER)
}

/// Fingerprint of a marker line, when it is one.
fn marker_fingerprint(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(STEP_MARKER)?;
    let fp = rest.split_whitespace().next()?;
    (!fp.is_empty()).then_some(fp)
}

struct ParsedSpec<'a> {
    lines: Vec<&'a str>,
    body_start: usize,
    body_end: usize,
    regions: Vec<StepRegion>,
    trailing_newline: bool,
}

fn parse_spec<'a>(source: &'a str, slug: &str) -> GrabarResult<ParsedSpec<'a>> {
    let sections = spec_sections(source).map_err(|_| GrabarError::BundleIncomplete {
        slug: slug.to_string(),
        missing: "spec scaffold",
    })?;
    let mut regions: Vec<StepRegion> = Vec::new();
    for i in sections.body_start..sections.body_end {
        if is_marker(sections.lines[i]) {
            if let Some(last) = regions.last_mut() {
                last.end = i;
            }
            regions.push(StepRegion {
                start: i,
                end: sections.body_end,
            });
        }
    }
    Ok(ParsedSpec {
        lines: sections.lines,
        body_start: sections.body_start,
        body_end: sections.body_end,
        regions,
        trailing_newline: sections.trailing_newline,
    })
}

fn join(lines: &[String], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline {
        out.push('\n');
    }
    out
}

fn indent_block(title: &str, fingerprint: &str, body: &str) -> Vec<String> {
    let mut block = vec![format!("  {STEP_MARKER}{fingerprint} {title}")];
    for line in body.lines() {
        if line.is_empty() {
            block.push(String::new());
        } else {
            block.push(format!("  {line}"));
        }
    }
    block
}

fn body_fingerprint(title: &str, body: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\0");
    hasher.update(body.as_bytes());
    hasher.finalize().to_hex()[..8].to_string()
}

/// Locate a step by its marker fingerprint.
///
/// # Errors
///
/// [`GrabarError::StepNotFound`] when no marker carries the fingerprint;
/// [`GrabarError::AmbiguousStep`] when more than one does (a hand-duplicated
/// marker) — the caller must disambiguate before editing.
pub fn find_step_by_anchor(source: &str, slug: &str, fingerprint: &str) -> GrabarResult<usize> {
    let spec = parse_spec(source, slug)?;
    let matches: Vec<usize> = spec
        .regions
        .iter()
        .enumerate()
        .filter(|(_, r)| marker_fingerprint(spec.lines[r.start]) == Some(fingerprint))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [] => Err(GrabarError::AnchorNotFound {
            fingerprint: fingerprint.to_string(),
            slug: slug.to_string(),
        }),
        [only] => Ok(*only),
        many => Err(GrabarError::AmbiguousStep {
            index: many[0],
            slug: slug.to_string(),
            matches: many.len(),
        }),
    }
}

/// Number of steps in a spec.
pub fn step_count(source: &str, slug: &str) -> GrabarResult<usize> {
    Ok(parse_spec(source, slug)?.regions.len())
}

/// Append a step at the end of the test body.
pub fn add_step(source: &str, slug: &str, title: &str, body: &str) -> GrabarResult<StepEdit> {
    let spec = parse_spec(source, slug)?;
    let index = spec.regions.len();
    insert_block(&spec, index, title, body)
}

/// Insert a step before position `index` (`index == step count` appends).
pub fn insert_step(
    source: &str,
    slug: &str,
    index: usize,
    title: &str,
    body: &str,
) -> GrabarResult<StepEdit> {
    let spec = parse_spec(source, slug)?;
    if index > spec.regions.len() {
        return Err(GrabarError::StepNotFound {
            index,
            slug: slug.to_string(),
        });
    }
    insert_block(&spec, index, title, body)
}

fn insert_block(
    spec: &ParsedSpec<'_>,
    index: usize,
    title: &str,
    body: &str,
) -> GrabarResult<StepEdit> {
    let at = spec
        .regions
        .get(index)
        .map_or(spec.body_end, |r| r.start);
    let block = indent_block(title, &body_fingerprint(title, body), body);
    let span = LineSpan::new(at + 1, at + block.len());

    let mut lines: Vec<String> = spec.lines[..at].iter().map(|s| (*s).to_string()).collect();
    lines.extend(block);
    lines.extend(spec.lines[at..].iter().map(|s| (*s).to_string()));
    Ok(StepEdit {
        updated_source: join(&lines, spec.trailing_newline),
        updated_spans: vec![span],
    })
}

/// Delete the step at `index`, marker included.
pub fn delete_step(source: &str, slug: &str, index: usize) -> GrabarResult<StepEdit> {
    let spec = parse_spec(source, slug)?;
    let region = *spec.regions.get(index).ok_or_else(|| GrabarError::StepNotFound {
        index,
        slug: slug.to_string(),
    })?;

    let mut lines: Vec<String> = Vec::with_capacity(spec.lines.len());
    lines.extend(spec.lines[..region.start].iter().map(|s| (*s).to_string()));
    lines.extend(spec.lines[region.end..].iter().map(|s| (*s).to_string()));
    Ok(StepEdit {
        updated_source: join(&lines, spec.trailing_newline),
        updated_spans: Vec::new(),
    })
}

/// Replace the body of the step at `index`, keeping its marker line.
pub fn update_step(
    source: &str,
    slug: &str,
    index: usize,
    new_body: &str,
) -> GrabarResult<StepEdit> {
    let spec = parse_spec(source, slug)?;
    let region = *spec.regions.get(index).ok_or_else(|| GrabarError::StepNotFound {
        index,
        slug: slug.to_string(),
    })?;

    let mut block = vec![spec.lines[region.start].to_string()];
    for line in new_body.lines() {
        if line.is_empty() {
            block.push(String::new());
        } else {
            block.push(format!("  {line}"));
        }
    }
    let span = LineSpan::new(region.start + 1, region.start + block.len());

    let mut lines: Vec<String> = Vec::with_capacity(spec.lines.len());
    lines.extend(spec.lines[..region.start].iter().map(|s| (*s).to_string()));
    lines.extend(block);
    lines.extend(spec.lines[region.end..].iter().map(|s| (*s).to_string()));
    Ok(StepEdit {
        updated_source: join(&lines, spec.trailing_newline),
        updated_spans: vec![span],
    })
}

/// Move the contiguous step range `from` (inclusive bounds) so the block
/// starts at position `to` among the remaining steps.
pub fn reorder_steps(
    source: &str,
    slug: &str,
    from: (usize, usize),
    to: usize,
) -> GrabarResult<StepEdit> {
    let spec = parse_spec(source, slug)?;
    let (lo, hi) = from;
    if lo > hi || hi >= spec.regions.len() {
        return Err(GrabarError::StepNotFound {
            index: hi,
            slug: slug.to_string(),
        });
    }
    let moved_len = hi - lo + 1;
    if to > spec.regions.len() - moved_len {
        return Err(GrabarError::StepNotFound {
            index: to,
            slug: slug.to_string(),
        });
    }

    let block_of = |r: &StepRegion| -> Vec<String> {
        spec.lines[r.start..r.end].iter().map(|s| (*s).to_string()).collect()
    };
    let mut blocks: Vec<Vec<String>> = spec.regions.iter().map(block_of).collect();
    let moved: Vec<Vec<String>> = blocks.drain(lo..=hi).collect();
    for (offset, block) in moved.into_iter().enumerate() {
        blocks.insert(to + offset, block);
    }

    let body_first_marker = spec.regions.first().map_or(spec.body_end, |r| r.start);
    let mut lines: Vec<String> = Vec::with_capacity(spec.lines.len());
    lines.extend(
        spec.lines[..body_first_marker]
            .iter()
            .map(|s| (*s).to_string()),
    );
    let rebuilt_start = lines.len();
    for block in &blocks {
        lines.extend(block.iter().cloned());
    }
    let rebuilt_end = lines.len();
    lines.extend(spec.lines[spec.body_end..].iter().map(|s| (*s).to_string()));

    Ok(StepEdit {
        updated_source: join(&lines, spec.trailing_newline),
        updated_spans: vec![LineSpan::new(rebuilt_start + 1, rebuilt_end)],
    })
}

/// Applies step edits to a bundle's spec on disk: read, transform, atomic
/// write, under the per-bundle lock.
#[derive(Debug, Clone)]
pub struct SpecUpdater {
    root: PathBuf,
}

impl SpecUpdater {
    /// Updater over a bundle root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn apply<F>(&self, slug: &str, operation: &'static str, edit: F) -> GrabarResult<StepEdit>
    where
        F: FnOnce(&str) -> GrabarResult<StepEdit>,
    {
        let paths = bundle_paths(&self.root, slug);
        let _guard = BundleGuard::acquire(&paths.dir, slug)?;
        let source =
            std::fs::read_to_string(&paths.spec).map_err(|_| GrabarError::BundleIncomplete {
                slug: slug.to_string(),
                missing: "spec",
            })?;
        let result = edit(&source)?;
        write_artifact(slug, operation, &paths.spec, &result.updated_source)?;
        tracing::info!(slug, operation, "spec updated");
        Ok(result)
    }

    /// Append a step to a bundle's spec.
    pub fn add_step(&self, slug: &str, title: &str, body: &str) -> GrabarResult<StepEdit> {
        self.apply(slug, "add-step", |src| add_step(src, slug, title, body))
    }

    /// Insert a step at `index`.
    pub fn insert_step(
        &self,
        slug: &str,
        index: usize,
        title: &str,
        body: &str,
    ) -> GrabarResult<StepEdit> {
        self.apply(slug, "insert-step", |src| {
            insert_step(src, slug, index, title, body)
        })
    }

    /// Delete the step at `index`.
    pub fn delete_step(&self, slug: &str, index: usize) -> GrabarResult<StepEdit> {
        self.apply(slug, "delete-step", |src| delete_step(src, slug, index))
    }

    /// Replace the body of the step at `index`.
    pub fn update_step(&self, slug: &str, index: usize, new_body: &str) -> GrabarResult<StepEdit> {
        self.apply(slug, "update-step", |src| {
            update_step(src, slug, index, new_body)
        })
    }

    /// Move a step range to a new position.
    pub fn reorder_steps(
        &self,
        slug: &str,
        from: (usize, usize),
        to: usize,
    ) -> GrabarResult<StepEdit> {
        self.apply(slug, "reorder-steps", |src| {
            reorder_steps(src, slug, from, to)
        })
    }

    /// The bundle root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "\
const { test, expect } = require('@playwright/test');

test('Create Sales Order', async ({ page }) => {
  // @step:aaaa1111 navigate
  await page.goto('https://app.example.com/orders');
  // @step:bbbb2222 fill Customer Name
  await page.getByLabel('Customer Name').fill(data.customerName);
  // @step:cccc3333 click Submit
  await page.getByRole('button', { name: 'Submit' }).click();
});
";

    mod region_tests {
        use super::*;

        #[test]
        fn counts_steps() {
            assert_eq!(step_count(SPEC, "t").unwrap(), 3);
        }

        #[test]
        fn anchor_lookup_finds_unique_marker() {
            assert_eq!(find_step_by_anchor(SPEC, "t", "bbbb2222").unwrap(), 1);
        }

        #[test]
        fn anchor_lookup_rejects_duplicates() {
            let dup = SPEC.replace("cccc3333", "bbbb2222");
            assert!(matches!(
                find_step_by_anchor(&dup, "t", "bbbb2222"),
                Err(GrabarError::AmbiguousStep { matches: 2, .. })
            ));
        }

        #[test]
        fn missing_scaffold_is_incomplete_bundle() {
            assert!(matches!(
                step_count("not a spec", "t"),
                Err(GrabarError::BundleIncomplete { .. })
            ));
        }
    }

    mod delete_tests {
        use super::*;

        #[test]
        fn delete_removes_exactly_one_region() {
            let edit = delete_step(SPEC, "t", 1).unwrap();
            assert!(!edit.updated_source.contains("Customer Name"));
            assert!(edit.updated_source.contains("@step:aaaa1111"));
            assert!(edit.updated_source.contains("@step:cccc3333"));
            assert_eq!(step_count(&edit.updated_source, "t").unwrap(), 2);
        }

        #[test]
        fn delete_out_of_range_fails_without_change() {
            assert!(matches!(
                delete_step(SPEC, "t", 9),
                Err(GrabarError::StepNotFound { index: 9, .. })
            ));
        }

        #[test]
        fn hand_edits_outside_the_step_survive() {
            let edited = SPEC.replace(
                "  // @step:cccc3333",
                "  // reviewed by QA 2024-05\n  // @step:cccc3333",
            );
            let edit = delete_step(&edited, "t", 0).unwrap();
            assert!(edit.updated_source.contains("// reviewed by QA 2024-05"));
        }
    }

    mod insert_tests {
        use super::*;

        #[test]
        fn delete_then_insert_round_trips_content() {
            let deleted = delete_step(SPEC, "t", 1).unwrap();
            let restored = insert_step(
                &deleted.updated_source,
                "t",
                1,
                "fill Customer Name",
                "await page.getByLabel('Customer Name').fill(data.customerName);",
            )
            .unwrap();

            // Content equality at index 1: same statement, same position.
            let lines: Vec<&str> = restored.updated_source.lines().collect();
            let markers: Vec<usize> = lines
                .iter()
                .enumerate()
                .filter(|(_, l)| l.trim_start().starts_with(STEP_MARKER))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(markers.len(), 3);
            assert_eq!(
                lines[markers[1] + 1].trim(),
                "await page.getByLabel('Customer Name').fill(data.customerName);"
            );
        }

        #[test]
        fn add_appends_after_last_step() {
            let edit = add_step(
                SPEC,
                "t",
                "assert total",
                "await expect(page.getByTestId('total')).toBeVisible();",
            )
            .unwrap();
            let body_close = edit.updated_source.find("});").unwrap();
            let appended = edit.updated_source.find("assert total").unwrap();
            assert!(appended < body_close);
            assert_eq!(step_count(&edit.updated_source, "t").unwrap(), 4);
        }

        #[test]
        fn updated_spans_cover_the_inserted_block() {
            let edit = add_step(SPEC, "t", "x", "await page.locator('#x').click();").unwrap();
            assert_eq!(edit.updated_spans.len(), 1);
            assert_eq!(edit.updated_spans[0].len(), 2);
        }
    }

    mod update_tests {
        use super::*;

        #[test]
        fn update_replaces_body_keeps_marker() {
            let edit = update_step(
                SPEC,
                "t",
                2,
                "await page.getByRole('button', { name: 'Save Draft' }).click();",
            )
            .unwrap();
            assert!(edit.updated_source.contains("@step:cccc3333"));
            assert!(edit.updated_source.contains("Save Draft"));
            assert!(!edit.updated_source.contains("name: 'Submit'"));
        }

        #[test]
        fn bytes_outside_the_region_are_untouched() {
            let edit = update_step(SPEC, "t", 2, "await page.locator('#s').click();").unwrap();
            let original_prefix: Vec<&str> = SPEC.lines().take(7).collect();
            let updated_prefix: Vec<&str> = edit.updated_source.lines().take(7).collect();
            assert_eq!(original_prefix, updated_prefix);
        }
    }

    mod reorder_tests {
        use super::*;

        #[test]
        fn moves_a_step_earlier() {
            let edit = reorder_steps(SPEC, "t", (2, 2), 1).unwrap();
            let src = &edit.updated_source;
            let click = src.find("cccc3333").unwrap();
            let fill = src.find("bbbb2222").unwrap();
            let nav = src.find("aaaa1111").unwrap();
            assert!(nav < click && click < fill);
        }

        #[test]
        fn reorder_preserves_scaffold() {
            let edit = reorder_steps(SPEC, "t", (0, 1), 1).unwrap();
            assert!(edit.updated_source.starts_with("const { test, expect }"));
            assert!(edit.updated_source.ends_with("});\n"));
            assert_eq!(step_count(&edit.updated_source, "t").unwrap(), 3);
        }

        #[test]
        fn invalid_range_fails() {
            assert!(reorder_steps(SPEC, "t", (2, 1), 0).is_err());
            assert!(reorder_steps(SPEC, "t", (0, 5), 0).is_err());
            assert!(reorder_steps(SPEC, "t", (0, 1), 2).is_err());
        }
    }

    mod disk_tests {
        use super::*;

        #[test]
        fn failed_edit_leaves_file_untouched() {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path();
            let paths = bundle_paths(root, "order");
            std::fs::create_dir_all(&paths.dir).unwrap();
            std::fs::write(&paths.spec, SPEC).unwrap();

            let updater = SpecUpdater::new(root);
            assert!(updater.delete_step("order", 9).is_err());
            assert_eq!(std::fs::read_to_string(&paths.spec).unwrap(), SPEC);
        }

        #[test]
        fn successful_edit_is_persisted() {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path();
            let paths = bundle_paths(root, "order");
            std::fs::create_dir_all(&paths.dir).unwrap();
            std::fs::write(&paths.spec, SPEC).unwrap();

            let updater = SpecUpdater::new(root);
            updater.delete_step("order", 0).unwrap();
            let on_disk = std::fs::read_to_string(&paths.spec).unwrap();
            assert!(!on_disk.contains("aaaa1111"));
        }

        #[test]
        fn missing_spec_reports_incomplete_bundle() {
            let tmp = tempfile::tempdir().unwrap();
            let updater = SpecUpdater::new(tmp.path());
            assert!(matches!(
                updater.delete_step("ghost", 0),
                Err(GrabarError::BundleIncomplete { .. })
            ));
        }
    }
}
