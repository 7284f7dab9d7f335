//! Deterministic emission of statement trees back to script text.
//!
//! The emitter is the single place that decides formatting: single-quoted
//! strings, two-space indent inside the test body, one statement per line.
//! The same tree always produces byte-identical output.

use crate::error::{Result, ScriptError};
use crate::stmt::{ActionCall, Arg, ExpectCall, LocatorExpr, LocatorSegment, Stmt};

/// JavaScript reserved words that cannot name a data parameter.
pub const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Validate a parameter name for use as `data.<name>`.
///
/// # Errors
///
/// Returns [`ScriptError::InvalidParamName`] for empty names, names starting
/// with a digit, names with characters outside `[A-Za-z0-9_]`, and reserved
/// words.
pub fn validate_param_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| ScriptError::InvalidParamName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("starts with a digit"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("contains invalid characters"));
    }
    if RESERVED_WORDS.contains(&name) {
        return Err(invalid("reserved word"));
    }
    Ok(())
}

/// Quote a string as a single-quoted JS literal.
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

fn emit_arg(arg: &Arg) -> String {
    match arg {
        Arg::Literal(value) => quote(value),
        Arg::DataRef(name) => format!("data.{name}"),
    }
}

fn emit_segment(segment: &LocatorSegment) -> String {
    match segment {
        LocatorSegment::GetByRole { role, name } => match name {
            Some(name) => format!(".getByRole({}, {{ name: {} }})", quote(role), quote(name)),
            None => format!(".getByRole({})", quote(role)),
        },
        LocatorSegment::GetByLabel(text) => format!(".getByLabel({})", quote(text)),
        LocatorSegment::GetByPlaceholder(text) => format!(".getByPlaceholder({})", quote(text)),
        LocatorSegment::GetByText(text) => format!(".getByText({})", quote(text)),
        LocatorSegment::GetByTestId(id) => format!(".getByTestId({})", quote(id)),
        LocatorSegment::Locator(selector) => format!(".locator({})", quote(selector)),
        LocatorSegment::FrameLocator(selector) => format!(".frameLocator({})", quote(selector)),
        LocatorSegment::Filter { has_text } => match has_text {
            Some(text) => format!(".filter({{ hasText: {} }})", quote(text)),
            None => ".filter({})".to_string(),
        },
        LocatorSegment::First => ".first()".to_string(),
        LocatorSegment::Last => ".last()".to_string(),
        LocatorSegment::Nth(index) => format!(".nth({index})"),
    }
}

/// Emit a locator chain rooted at `page`.
#[must_use]
pub fn emit_locator(expr: &LocatorExpr) -> String {
    let mut out = String::from("page");
    for segment in &expr.segments {
        out.push_str(&emit_segment(segment));
    }
    out
}

fn emit_action(call: &ActionCall) -> String {
    match call {
        ActionCall::Click => ".click()".to_string(),
        ActionCall::DblClick => ".dblclick()".to_string(),
        ActionCall::Fill(arg) => format!(".fill({})", emit_arg(arg)),
        ActionCall::SelectOption(arg) => format!(".selectOption({})", emit_arg(arg)),
        ActionCall::Press(key) => format!(".press({})", quote(key)),
        ActionCall::Check => ".check()".to_string(),
        ActionCall::Uncheck => ".uncheck()".to_string(),
        ActionCall::Hover => ".hover()".to_string(),
    }
}

fn emit_expect(check: &ExpectCall) -> String {
    match check {
        ExpectCall::ToBeVisible => ".toBeVisible()".to_string(),
        ExpectCall::ToBeHidden => ".toBeHidden()".to_string(),
        ExpectCall::ToHaveText(arg) => format!(".toHaveText({})", emit_arg(arg)),
        ExpectCall::ToContainText(arg) => format!(".toContainText({})", emit_arg(arg)),
    }
}

/// Emit one statement, without indentation.
#[must_use]
pub fn emit_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Navigation { url } => format!("await page.goto({});", quote(url)),
        Stmt::Action { target, call } => {
            format!("await {}{};", emit_locator(target), emit_action(call))
        }
        Stmt::Expectation { target, check } => {
            format!("await expect({}){};", emit_locator(target), emit_expect(check))
        }
        Stmt::Comment(text) => format!("// {text}"),
        Stmt::Blank => String::new(),
        Stmt::Raw(text) => text.clone(),
    }
}

/// Emit a complete spec file around pre-built body lines.
///
/// Body lines are given unindented; the scaffold indents non-blank lines by
/// two spaces. `data_require` is the relative path of the companion data
/// file, when the test has bound parameters.
#[must_use]
pub fn emit_spec_file(test_name: &str, data_require: Option<&str>, body: &[String]) -> String {
    let mut out = String::new();
    out.push_str("const { test, expect } = require('@playwright/test');\n");
    if let Some(path) = data_require {
        out.push_str(&format!("const data = require({});\n", quote(path)));
    }
    out.push('\n');
    out.push_str(&format!(
        "test({}, async ({{ page }}) => {{\n",
        quote(test_name)
    ));
    for line in body {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str("});\n");
    out
}
