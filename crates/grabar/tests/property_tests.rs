//! Property-based tests for the pipeline's algebraic guarantees.

use grabar::prelude::*;
use grabar_script::transform::SourceTransform;
use proptest::prelude::*;

// === Slug properties ===

proptest! {
    /// slug is idempotent for arbitrary input.
    #[test]
    fn prop_slug_idempotent(name in "\\PC{0,60}") {
        let once = slug(&name);
        prop_assert_eq!(slug(&once), once);
    }

    /// slug output stays inside its charset.
    #[test]
    fn prop_slug_charset(name in "\\PC{0,60}") {
        let s = slug(&name);
        prop_assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }
}

#[test]
fn slug_known_value() {
    assert_eq!(slug("Create Sales Order"), "create-sales-order");
}

// === Cleanup properties ===

/// A small pool of statements a capture could contain, driven by indices so
/// proptest shrinks nicely.
fn stmt_pool(idx: usize) -> &'static str {
    const POOL: &[&str] = &[
        "await page.goto('https://app.example.com/home');",
        "await page.goto('https://app.example.com/orders?view=orders');",
        "await page.goto('https://app.example.com/main?view=orders&t=1');",
        "await page.goto('https://login.microsoftonline.com/oauth2');",
        "await page.goto('https://accounts.google.com/signin');",
        "await page.getByLabel('Customer Name').fill('Acme Corp');",
        "await page.getByRole('button', { name: 'Submit' }).click();",
        "await page.locator('#qty').selectOption('3');",
        "// hand-written note",
        "await page.evaluate(() => 1);",
    ];
    POOL[idx % POOL.len()]
}

proptest! {
    /// cleanup(cleanup(x)) == cleanup(x) for arbitrary statement soups.
    #[test]
    fn prop_cleanup_idempotent(indices in proptest::collection::vec(0usize..10, 0..25)) {
        let source: String = indices
            .iter()
            .map(|&i| format!("{}\n", stmt_pool(i)))
            .collect();
        let pass = NavigationCleanup::default();
        let once = pass.apply(&source);
        let twice = pass.apply(&once.source);
        prop_assert_eq!(&once.source, &twice.source);
        prop_assert!(twice.is_unchanged());
    }

    /// cleanup never reorders or rewrites the statements it keeps.
    #[test]
    fn prop_cleanup_preserves_retained_lines(indices in proptest::collection::vec(0usize..10, 0..25)) {
        let source: String = indices
            .iter()
            .map(|&i| format!("{}\n", stmt_pool(i)))
            .collect();
        let cleaned = NavigationCleanup::default().apply(&source);

        // Every output line is an input line, and relative order holds.
        let mut input_lines = source.lines();
        for line in cleaned.source.lines() {
            prop_assert!(
                input_lines.any(|l| l == line),
                "line not found in order: {}",
                line
            );
        }
    }

    /// Detection is deterministic and ids are stable across runs.
    #[test]
    fn prop_detect_stable(indices in proptest::collection::vec(0usize..10, 0..25)) {
        let source: String = indices
            .iter()
            .map(|&i| format!("{}\n", stmt_pool(i)))
            .collect();
        prop_assert_eq!(detect(&source), detect(&source));
    }
}

// === Parameter fold properties ===

proptest! {
    /// Suggested names contain only identifier-friendly characters.
    #[test]
    fn prop_fold_charset(label in "\\PC{0,80}") {
        let folded = grabar::params::camel_fold(&label);
        prop_assert!(folded.chars().all(char::is_alphanumeric));
        prop_assert!(folded.chars().count() <= 50);
    }
}
