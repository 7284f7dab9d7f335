//! Fail-soft, statement-level parser for recorded scripts.
//!
//! The recorded stream is line-oriented: one captured interaction per
//! statement. The parser never rejects a statement — anything it does not
//! recognize becomes [`Stmt::Raw`] and survives every pass byte-identically.
//! Document-level failure is reserved for input with no statement structure
//! at all.

use crate::error::{Result, ScriptError};
use crate::stmt::{ActionCall, Arg, ExpectCall, LocatorExpr, LocatorSegment, Stmt};

/// A parsed statement together with its original text.
///
/// `text` is the exact captured line (no trailing newline), so transforms
/// that keep a statement can re-emit it without any reformatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStmt {
    /// The typed statement
    pub stmt: Stmt,
    /// Original line text
    pub text: String,
    /// 1-indexed source line
    pub line: usize,
}

/// A parsed script: the ordered statement list plus enough layout
/// information to reproduce the input byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDocument {
    /// Statements in source order
    pub stmts: Vec<ParsedStmt>,
    /// Whether the source ended with a newline
    pub trailing_newline: bool,
}

impl ScriptDocument {
    /// Parse a recorded script.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Unparseable`] only when the input cannot be
    /// treated as line-structured text (embedded NUL bytes). Unrecognized
    /// statements degrade to [`Stmt::Raw`] instead of failing.
    pub fn parse(source: &str) -> Result<Self> {
        if source.contains('\0') {
            return Err(ScriptError::Unparseable {
                reason: "embedded NUL byte".to_string(),
            });
        }
        let stmts = source
            .lines()
            .enumerate()
            .map(|(idx, text)| ParsedStmt {
                stmt: parse_statement(text),
                text: text.to_string(),
                line: idx + 1,
            })
            .collect();
        Ok(Self {
            stmts,
            trailing_newline: source.ends_with('\n'),
        })
    }

    /// Reassemble the original source exactly.
    #[must_use]
    pub fn source(&self) -> String {
        let mut out = self
            .stmts
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    /// Reassemble from a subset of statement indices, preserving order and
    /// original bytes of every retained statement.
    #[must_use]
    pub fn source_of(&self, retained: &[usize]) -> String {
        let mut out = retained
            .iter()
            .filter_map(|&i| self.stmts.get(i))
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline && !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Sections of a generated spec file: header, test body, footer.
///
/// Line indices are 0-based into `lines`; the body spans
/// `body_start..body_end` (the open and close scaffold lines excluded).
#[derive(Debug, Clone)]
pub struct SpecSections<'a> {
    /// All source lines
    pub lines: Vec<&'a str>,
    /// Index of the first body line
    pub body_start: usize,
    /// Index one past the last body line (the close line)
    pub body_end: usize,
    /// Whether the source ended with a newline
    pub trailing_newline: bool,
}

/// Split a generated spec file into header / body / footer around the test
/// scaffold.
///
/// # Errors
///
/// Returns [`ScriptError::ScaffoldNotFound`] when the test open
/// (`test('…', async ({ page }) => {`) or close (`});`) line is missing.
pub fn spec_sections(source: &str) -> Result<SpecSections<'_>> {
    let lines: Vec<&str> = source.lines().collect();
    let open = lines
        .iter()
        .position(|l| {
            let t = l.trim_start();
            t.starts_with("test(") && t.trim_end().ends_with("=> {")
        })
        .ok_or(ScriptError::ScaffoldNotFound {
            missing: "test body open",
        })?;
    let close = lines
        .iter()
        .rposition(|l| l.trim() == "});")
        .filter(|&c| c > open)
        .ok_or(ScriptError::ScaffoldNotFound {
            missing: "test body close",
        })?;
    Ok(SpecSections {
        lines,
        body_start: open + 1,
        body_end: close,
        trailing_newline: source.ends_with('\n'),
    })
}

/// Parse one statement line.
#[must_use]
pub fn parse_statement(text: &str) -> Stmt {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Stmt::Blank;
    }
    if let Some(comment) = trimmed.strip_prefix("//") {
        return Stmt::Comment(comment.trim().to_string());
    }
    parse_interaction(trimmed).unwrap_or_else(|| Stmt::Raw(text.to_string()))
}

fn parse_interaction(trimmed: &str) -> Option<Stmt> {
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    let rest = body.strip_prefix("await ")?;

    if let Some(after_expect) = rest.strip_prefix("expect(") {
        return parse_expectation(after_expect);
    }

    let chain_src = rest.strip_prefix("page.")?;
    let calls = parse_call_chain(chain_src)?;

    if let [only] = calls.as_slice() {
        if only.name == "goto" {
            let (url, rest) = parse_string_lit(only.args.trim())?;
            return rest.trim().is_empty().then_some(Stmt::Navigation { url });
        }
    }

    let (action_call, locator_calls) = calls.split_last()?;
    if locator_calls.is_empty() {
        return None;
    }
    let call = action_from_call(action_call)?;
    let segments = locator_calls
        .iter()
        .map(segment_from_call)
        .collect::<Option<Vec<_>>>()?;
    Some(Stmt::Action {
        target: LocatorExpr { segments },
        call,
    })
}

fn parse_expectation(after_open: &str) -> Option<Stmt> {
    // after_open = "page.<chain>).<check>(...)"
    let close = find_balanced_close(after_open)?;
    let inner = &after_open[..close];
    let outer = after_open[close + 1..].strip_prefix('.')?;

    let chain_src = inner.strip_prefix("page.")?;
    let segments = parse_call_chain(chain_src)?
        .iter()
        .map(segment_from_call)
        .collect::<Option<Vec<_>>>()?;

    let calls = parse_call_chain(outer)?;
    let [check_call] = calls.as_slice() else {
        return None;
    };
    let check = expect_from_call(check_call)?;
    Some(Stmt::Expectation {
        target: LocatorExpr { segments },
        check,
    })
}

/// One call of a `.`-separated chain: `name(args)`.
#[derive(Debug, Clone)]
struct Call {
    name: String,
    args: String,
}

fn parse_call_chain(src: &str) -> Option<Vec<Call>> {
    let mut calls = Vec::new();
    let mut rest = src;
    loop {
        let paren = rest.find('(')?;
        let name = &rest[..paren];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        let after_open = &rest[paren + 1..];
        let close = find_balanced_close(after_open)?;
        calls.push(Call {
            name: name.to_string(),
            args: after_open[..close].to_string(),
        });
        let tail = &after_open[close + 1..];
        if tail.is_empty() {
            return Some(calls);
        }
        rest = tail.strip_prefix('.')?;
    }
}

/// Index of the `)` closing the group opened just before `src`, honoring
/// nested parens/braces/brackets and quoted strings.
fn find_balanced_close(src: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = src.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' if depth == 0 => return Some(idx),
            ')' | '}' | ']' => depth = depth.checked_sub(1)?,
            '\'' | '"' => skip_string(&mut chars, c)?,
            _ => {}
        }
    }
    None
}

fn skip_string(chars: &mut std::str::CharIndices<'_>, quote: char) -> Option<()> {
    loop {
        let (_, c) = chars.next()?;
        if c == '\\' {
            chars.next()?;
        } else if c == quote {
            return Some(());
        }
    }
}

/// Parse a quoted string literal at the start of `src`.
///
/// Returns the unescaped value and the remainder after the closing quote.
fn parse_string_lit(src: &str) -> Option<(String, &str)> {
    let mut chars = src.char_indices();
    let (_, quote) = chars.next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let mut value = String::new();
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            let (_, escaped) = chars.next()?;
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                other => value.push(other),
            }
        } else if c == quote {
            return Some((value, &src[idx + c.len_utf8()..]));
        } else {
            value.push(c);
        }
    }
    None
}

/// Split `src` on top-level commas, honoring nesting and quotes.
fn split_top_args(src: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut chars = src.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            '\'' | '"' => {
                if skip_string(&mut chars, c).is_none() {
                    break;
                }
            }
            ',' if depth == 0 => {
                parts.push(src[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = src[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Extract a quoted string property (`key: '<value>'`) from an object
/// literal body `{ … }`.
fn object_string_prop(src: &str, key: &str) -> Option<String> {
    let inner = src.trim().strip_prefix('{')?.strip_suffix('}')?;
    for part in split_top_args(inner) {
        let (prop, value_src) = part.split_once(':')?;
        if prop.trim() == key {
            let (value, _) = parse_string_lit(value_src.trim())?;
            return Some(value);
        }
    }
    None
}

fn single_string_arg(args: &str) -> Option<String> {
    let (value, rest) = parse_string_lit(args.trim())?;
    rest.trim().is_empty().then_some(value)
}

fn segment_from_call(call: &Call) -> Option<LocatorSegment> {
    match call.name.as_str() {
        "getByRole" => {
            let parts = split_top_args(&call.args);
            let (role_src, name) = match parts.as_slice() {
                [role] => (*role, None),
                [role, opts] => (*role, object_string_prop(opts, "name")),
                _ => return None,
            };
            let (role, rest) = parse_string_lit(role_src)?;
            rest.trim().is_empty().then_some(())?;
            Some(LocatorSegment::GetByRole { role, name })
        }
        "getByLabel" => Some(LocatorSegment::GetByLabel(single_string_arg(&call.args)?)),
        "getByPlaceholder" => Some(LocatorSegment::GetByPlaceholder(single_string_arg(
            &call.args,
        )?)),
        "getByText" => Some(LocatorSegment::GetByText(single_string_arg(&call.args)?)),
        "getByTestId" => Some(LocatorSegment::GetByTestId(single_string_arg(&call.args)?)),
        "locator" => Some(LocatorSegment::Locator(single_string_arg(&call.args)?)),
        "frameLocator" => Some(LocatorSegment::FrameLocator(single_string_arg(
            &call.args,
        )?)),
        "filter" => Some(LocatorSegment::Filter {
            has_text: object_string_prop(&call.args, "hasText"),
        }),
        "first" => call.args.trim().is_empty().then_some(LocatorSegment::First),
        "last" => call.args.trim().is_empty().then_some(LocatorSegment::Last),
        "nth" => call.args.trim().parse().ok().map(LocatorSegment::Nth),
        _ => None,
    }
}

fn parse_value_arg(args: &str) -> Option<Arg> {
    let trimmed = args.trim();
    if let Some((value, rest)) = parse_string_lit(trimmed) {
        return rest.trim().is_empty().then_some(Arg::Literal(value));
    }
    let name = trimmed.strip_prefix("data.")?;
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    valid.then(|| Arg::DataRef(name.to_string()))
}

fn action_from_call(call: &Call) -> Option<ActionCall> {
    let empty = call.args.trim().is_empty();
    match call.name.as_str() {
        "click" => empty.then_some(ActionCall::Click),
        "dblclick" => empty.then_some(ActionCall::DblClick),
        "check" => empty.then_some(ActionCall::Check),
        "uncheck" => empty.then_some(ActionCall::Uncheck),
        "hover" => empty.then_some(ActionCall::Hover),
        "fill" => Some(ActionCall::Fill(parse_value_arg(&call.args)?)),
        "selectOption" => Some(ActionCall::SelectOption(parse_value_arg(&call.args)?)),
        "press" => Some(ActionCall::Press(single_string_arg(&call.args)?)),
        _ => None,
    }
}

fn expect_from_call(call: &Call) -> Option<ExpectCall> {
    let empty = call.args.trim().is_empty();
    match call.name.as_str() {
        "toBeVisible" => empty.then_some(ExpectCall::ToBeVisible),
        "toBeHidden" => empty.then_some(ExpectCall::ToBeHidden),
        "toHaveText" => Some(ExpectCall::ToHaveText(parse_value_arg(&call.args)?)),
        "toContainText" => Some(ExpectCall::ToContainText(parse_value_arg(&call.args)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod statement_tests {
        use super::*;

        #[test]
        fn parses_navigation() {
            let stmt = parse_statement("await page.goto('https://app.example.com/home');");
            assert_eq!(
                stmt,
                Stmt::Navigation {
                    url: "https://app.example.com/home".to_string()
                }
            );
        }

        #[test]
        fn parses_label_fill() {
            let stmt =
                parse_statement("await page.getByLabel('Customer Name').fill('Acme Corp');");
            let Stmt::Action { target, call } = stmt else {
                panic!("expected action");
            };
            assert_eq!(
                target.segments,
                vec![LocatorSegment::GetByLabel("Customer Name".to_string())]
            );
            assert_eq!(call, ActionCall::Fill(Arg::Literal("Acme Corp".to_string())));
        }

        #[test]
        fn parses_role_click_with_name() {
            let stmt = parse_statement(
                "await page.getByRole('button', { name: 'Submit' }).click();",
            );
            let Stmt::Action { target, call } = stmt else {
                panic!("expected action");
            };
            assert_eq!(
                target.segments,
                vec![LocatorSegment::GetByRole {
                    role: "button".to_string(),
                    name: Some("Submit".to_string()),
                }]
            );
            assert_eq!(call, ActionCall::Click);
        }

        #[test]
        fn parses_css_select_option() {
            let stmt = parse_statement("await page.locator('#qty').selectOption('3');");
            let Stmt::Action { target, call } = stmt else {
                panic!("expected action");
            };
            assert_eq!(
                target.segments,
                vec![LocatorSegment::Locator("#qty".to_string())]
            );
            assert_eq!(call, ActionCall::SelectOption(Arg::Literal("3".to_string())));
        }

        #[test]
        fn parses_data_ref_fill() {
            let stmt =
                parse_statement("await page.getByLabel('Customer Name').fill(data.customerName);");
            let Stmt::Action { call, .. } = stmt else {
                panic!("expected action");
            };
            assert_eq!(call, ActionCall::Fill(Arg::DataRef("customerName".to_string())));
        }

        #[test]
        fn parses_frame_chain() {
            let stmt = parse_statement(
                "await page.frameLocator('#checkout').getByPlaceholder('Card number').fill('4242');",
            );
            let Stmt::Action { target, .. } = stmt else {
                panic!("expected action");
            };
            assert_eq!(target.segments.len(), 2);
            assert!(matches!(
                target.segments[0],
                LocatorSegment::FrameLocator(_)
            ));
        }

        #[test]
        fn parses_expectation() {
            let stmt = parse_statement(
                "await expect(page.getByTestId('total')).toHaveText('42.00');",
            );
            let Stmt::Expectation { check, .. } = stmt else {
                panic!("expected expectation");
            };
            assert_eq!(check, ExpectCall::ToHaveText(Arg::Literal("42.00".to_string())));
        }

        #[test]
        fn unknown_statement_becomes_raw() {
            let text = "await page.evaluate(() => window.scrollTo(0, 0));";
            assert_eq!(parse_statement(text), Stmt::Raw(text.to_string()));
        }

        #[test]
        fn comment_and_blank() {
            assert_eq!(
                parse_statement("  // checkout flow"),
                Stmt::Comment("checkout flow".to_string())
            );
            assert_eq!(parse_statement("   "), Stmt::Blank);
        }

        #[test]
        fn escaped_quote_in_value() {
            let stmt = parse_statement(r"await page.getByLabel('Note').fill('it\'s fine');");
            let Stmt::Action { call, .. } = stmt else {
                panic!("expected action");
            };
            assert_eq!(call, ActionCall::Fill(Arg::Literal("it's fine".to_string())));
        }
    }

    mod document_tests {
        use super::*;

        #[test]
        fn source_round_trips_bytes() {
            let src = "await page.goto('https://a.example/x');\n\n// hand comment\nawait page.locator('#b').click();\n";
            let doc = ScriptDocument::parse(src).unwrap();
            assert_eq!(doc.source(), src);
        }

        #[test]
        fn nul_byte_is_unparseable() {
            assert!(ScriptDocument::parse("abc\0def").is_err());
        }

        #[test]
        fn source_of_subset_preserves_text() {
            let src = "await page.goto('https://a.example/1');\nawait page.goto('https://a.example/2');\n";
            let doc = ScriptDocument::parse(src).unwrap();
            assert_eq!(doc.source_of(&[1]), "await page.goto('https://a.example/2');\n");
        }
    }

    mod sections_tests {
        use super::*;

        const SPEC: &str = "const { test, expect } = require('@playwright/test');\n\ntest('Example', async ({ page }) => {\n  await page.goto('https://a.example/');\n});\n";

        #[test]
        fn finds_body_bounds() {
            let sections = spec_sections(SPEC).unwrap();
            assert_eq!(sections.body_start, 3);
            assert_eq!(sections.body_end, 4);
        }

        #[test]
        fn missing_scaffold_is_error() {
            assert!(spec_sections("const x = 1;\n").is_err());
        }
    }
}
