//! Navigation cleanup: strips authentication redirects and redundant
//! navigations from freshly captured scripts.
//!
//! Captured recordings are noisy: identity-provider round-trips, repeated
//! reloads of the same URL, and app-internal route changes that re-navigate
//! to where the user already is. This pass removes them without touching
//! anything else — retained statements keep their original bytes.
//!
//! The pass is idempotent and fail-soft: unparseable input comes back
//! unchanged.

use grabar_script::parse::ScriptDocument;
use grabar_script::stmt::Stmt;
use grabar_script::transform::{LineSpan, SourceTransform, TransformOutcome};

/// Cleanup tuning: which hosts are auth providers, which query parameters
/// carry the application's routing state.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Hosts (and their subdomains) treated as authentication providers
    pub auth_hosts: Vec<String>,
    /// Query parameters that identify the current application view
    pub route_params: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            auth_hosts: [
                "login.microsoftonline.com",
                "login.live.com",
                "accounts.google.com",
                "login.salesforce.com",
                "okta.com",
                "auth0.com",
            ]
            .map(str::to_string)
            .to_vec(),
            route_params: ["view", "appview", "page"].map(str::to_string).to_vec(),
        }
    }
}

/// The navigation cleanup pass.
#[derive(Debug, Clone, Default)]
pub struct NavigationCleanup {
    config: CleanupConfig,
}

impl NavigationCleanup {
    /// Cleanup with custom configuration.
    #[must_use]
    pub fn new(config: CleanupConfig) -> Self {
        Self { config }
    }

    fn is_auth_url(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return false;
        };
        self.config
            .auth_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{h}")))
    }

    fn equivalent(&self, a: &str, b: &str) -> bool {
        for param in &self.config.route_params {
            if let (Some(va), Some(vb)) = (query_param(a, param), query_param(b, param)) {
                return va == vb;
            }
        }
        a == b
    }
}

impl SourceTransform for NavigationCleanup {
    fn name(&self) -> &'static str {
        "navigation-cleanup"
    }

    fn apply(&self, source: &str) -> TransformOutcome {
        let Ok(doc) = ScriptDocument::parse(source) else {
            return TransformOutcome::unchanged(source);
        };

        let mut removed = vec![false; doc.stmts.len()];
        let first_nav = doc.stmts.iter().position(|s| s.stmt.is_navigation());
        let significant: Vec<usize> = (0..doc.stmts.len())
            .filter(|&i| !doc.stmts[i].stmt.is_trivia())
            .collect();

        // Authentication-provider redirects. The file's leading navigation
        // is exempt: losing it would leave the test with no entry point.
        for &i in &significant {
            if Some(i) == first_nav {
                continue;
            }
            if let Stmt::Navigation { url } = &doc.stmts[i].stmt {
                if self.is_auth_url(url) {
                    removed[i] = true;
                }
            }
        }

        // Collapse runs of consecutive navigations to the identical URL,
        // keeping the last of each run.
        let survivors: Vec<usize> = significant.iter().copied().filter(|&i| !removed[i]).collect();
        let mut run: Vec<usize> = Vec::new();
        let mut run_url: Option<&str> = None;
        let finish_run = |run: &mut Vec<usize>, removed: &mut Vec<bool>| {
            if run.len() >= 2 {
                for &i in &run[..run.len() - 1] {
                    removed[i] = true;
                }
            }
            run.clear();
        };
        for &i in &survivors {
            match &doc.stmts[i].stmt {
                Stmt::Navigation { url } if run_url == Some(url.as_str()) => run.push(i),
                Stmt::Navigation { url } => {
                    finish_run(&mut run, &mut removed);
                    run.push(i);
                    run_url = Some(url);
                }
                _ => {
                    finish_run(&mut run, &mut removed);
                    run_url = None;
                }
            }
        }
        finish_run(&mut run, &mut removed);

        // Navigations straight back to where the user already is: a
        // navigation right after an action whose target is equivalent to the
        // most recent retained navigation target.
        let survivors: Vec<usize> = significant.iter().copied().filter(|&i| !removed[i]).collect();
        let mut last_retained: Option<&str> = None;
        let mut prev_was_action = false;
        for &i in &survivors {
            match &doc.stmts[i].stmt {
                Stmt::Navigation { url } => {
                    if prev_was_action
                        && Some(i) != first_nav
                        && last_retained.map_or(false, |prev| self.equivalent(prev, url))
                    {
                        removed[i] = true;
                    } else {
                        last_retained = Some(url);
                    }
                    prev_was_action = false;
                }
                _ => prev_was_action = true,
            }
        }

        let changed_spans: Vec<LineSpan> = doc
            .stmts
            .iter()
            .enumerate()
            .filter(|(i, _)| removed[*i])
            .map(|(_, s)| LineSpan::line(s.line))
            .collect();
        if changed_spans.is_empty() {
            return TransformOutcome::unchanged(source);
        }

        let retained: Vec<usize> = (0..doc.stmts.len()).filter(|&i| !removed[i]).collect();
        tracing::debug!(removed = changed_spans.len(), "navigation cleanup applied");
        TransformOutcome {
            source: doc.source_of(&retained),
            changed_spans,
        }
    }
}

/// Host portion of a URL, lower-cased.
fn host_of(url: &str) -> Option<String> {
    let after_scheme = url.split_once("://")?.1;
    let host = after_scheme
        .split(['/', '?', '#'])
        .next()?
        .split('@')
        .last()?
        .split(':')
        .next()?;
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

/// Value of a query parameter, when present.
fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next()?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup(source: &str) -> TransformOutcome {
        NavigationCleanup::default().apply(source)
    }

    mod url_tests {
        use super::*;

        #[test]
        fn host_extraction() {
            assert_eq!(
                host_of("https://Login.Microsoftonline.com/common/oauth2"),
                Some("login.microsoftonline.com".to_string())
            );
            assert_eq!(host_of("not a url"), None);
        }

        #[test]
        fn query_param_extraction() {
            let url = "https://app.example.com/main?view=orders&tab=2#frag";
            assert_eq!(query_param(url, "view"), Some("orders"));
            assert_eq!(query_param(url, "tab"), Some("2"));
            assert_eq!(query_param(url, "missing"), None);
        }

        #[test]
        fn subdomain_matches_auth_host() {
            let pass = NavigationCleanup::default();
            assert!(pass.is_auth_url("https://dev-123.okta.com/login"));
            assert!(pass.is_auth_url("https://accounts.google.com/o/oauth2"));
            assert!(!pass.is_auth_url("https://app.example.com/okta.com"));
        }
    }

    mod auth_removal_tests {
        use super::*;

        #[test]
        fn removes_auth_redirects() {
            let src = "\
await page.goto('https://app.example.com/');
await page.goto('https://login.microsoftonline.com/common/oauth2/authorize');
await page.goto('https://app.example.com/home');
";
            let out = cleanup(src);
            assert!(!out.source.contains("microsoftonline"));
            assert!(out.source.contains("app.example.com/home"));
        }

        #[test]
        fn first_navigation_survives_even_when_auth() {
            let src = "\
await page.goto('https://login.microsoftonline.com/start');
await page.goto('https://app.example.com/home');
";
            let out = cleanup(src);
            assert!(out.source.contains("microsoftonline"));
        }
    }

    mod collapse_tests {
        use super::*;

        #[test]
        fn three_identical_navigations_collapse_to_last() {
            let src = "\
await page.goto('https://app.example.com/home');
await page.goto('https://app.example.com/home');
await page.goto('https://app.example.com/home');
";
            let out = cleanup(src);
            assert_eq!(
                out.source,
                "await page.goto('https://app.example.com/home');\n"
            );
            assert_eq!(out.changed_spans.len(), 2);
        }

        #[test]
        fn different_urls_are_kept() {
            let src = "\
await page.goto('https://app.example.com/a');
await page.goto('https://app.example.com/b');
";
            let out = cleanup(src);
            assert!(out.is_unchanged());
        }

        #[test]
        fn action_breaks_a_run() {
            let src = "\
await page.goto('https://app.example.com/a');
await page.locator('#x').click();
await page.goto('https://app.example.com/b');
";
            let out = cleanup(src);
            assert!(out.source.contains("/a"));
            assert!(out.source.contains("/b"));
        }
    }

    mod post_action_tests {
        use super::*;

        #[test]
        fn redundant_navigation_after_action_is_removed() {
            let src = "\
await page.goto('https://app.example.com/orders');
await page.locator('#save').click();
await page.goto('https://app.example.com/orders');
";
            let out = cleanup(src);
            assert_eq!(
                out.source,
                "await page.goto('https://app.example.com/orders');\nawait page.locator('#save').click();\n"
            );
        }

        #[test]
        fn route_param_equivalence() {
            let src = "\
await page.goto('https://app.example.com/main?view=orders');
await page.locator('#save').click();
await page.goto('https://app.example.com/main?view=orders&ts=99');
";
            let out = cleanup(src);
            assert_eq!(out.changed_spans, vec![LineSpan::line(3)]);
        }

        #[test]
        fn genuinely_new_target_is_kept() {
            let src = "\
await page.goto('https://app.example.com/main?view=orders');
await page.locator('#save').click();
await page.goto('https://app.example.com/main?view=invoices');
";
            let out = cleanup(src);
            assert!(out.is_unchanged());
        }
    }

    mod invariant_tests {
        use super::*;

        #[test]
        fn idempotent_on_noisy_capture() {
            let src = "\
await page.goto('https://app.example.com/');
await page.goto('https://login.microsoftonline.com/oauth2');
await page.goto('https://app.example.com/home');
await page.goto('https://app.example.com/home');
await page.getByLabel('Customer Name').fill('Acme Corp');
await page.goto('https://app.example.com/home');
await page.getByRole('button', { name: 'Submit' }).click();
";
            let once = cleanup(src);
            let twice = cleanup(&once.source);
            assert_eq!(once.source, twice.source);
            assert!(twice.is_unchanged());
        }

        #[test]
        fn unparseable_input_is_returned_unchanged() {
            let src = "garbage\0with nul";
            let out = cleanup(src);
            assert!(out.is_unchanged());
            assert_eq!(out.source, src);
        }

        #[test]
        fn retained_statements_keep_their_bytes() {
            let src = "\
await page.goto( 'https://app.example.com/a' )  ;
await page.goto('https://app.example.com/b');
await page.goto('https://app.example.com/b');
";
            let out = cleanup(src);
            // The oddly-formatted first line is untouched even though the
            // duplicate run after it collapsed.
            assert!(out
                .source
                .starts_with("await page.goto( 'https://app.example.com/a' )  ;"));
        }

        #[test]
        fn comments_survive_cleanup() {
            let src = "\
// login dance
await page.goto('https://app.example.com/a');
await page.goto('https://app.example.com/a');
";
            let out = cleanup(src);
            assert!(out.source.contains("// login dance"));
        }
    }
}
