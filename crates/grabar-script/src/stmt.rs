//! Typed statement model for recorded browser-test scripts.
//!
//! Recorded interactions arrive as Playwright-flavoured JavaScript statements
//! (`await page.getByLabel('Name').fill('Acme');`). This module gives every
//! statement a typed equivalent so transformation passes walk a tree instead
//! of munging strings.
//!
//! # Design Principles
//!
//! 1. **Fail-soft**: anything the parser does not recognize is carried as
//!    [`Stmt::Raw`] and re-emitted byte-identically.
//! 2. **Determinism**: the same tree always emits the same text.

use serde::{Deserialize, Serialize};

/// One statement of a recorded script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// `await page.goto('<url>');`
    Navigation {
        /// Target URL
        url: String,
    },
    /// An interaction on a located element: `await page.<chain>.<call>;`
    Action {
        /// Locator chain selecting the target element
        target: LocatorExpr,
        /// The terminal interaction call
        call: ActionCall,
    },
    /// An assertion: `await expect(page.<chain>).<check>;`
    Expectation {
        /// Locator chain selecting the asserted element
        target: LocatorExpr,
        /// The assertion call
        check: ExpectCall,
    },
    /// `// <text>`
    Comment(String),
    /// Empty line
    Blank,
    /// Unrecognized statement, preserved verbatim
    Raw(String),
}

impl Stmt {
    /// Whether this statement is a navigation.
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation { .. })
    }

    /// Whether this statement carries no behavior (comment or blank line).
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment(_) | Self::Blank)
    }
}

/// A chain of locator calls, outermost first.
///
/// `page.frameLocator('#f').getByRole('button', { name: 'Go' }).first()`
/// becomes three segments in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocatorExpr {
    /// Segments in source order
    pub segments: Vec<LocatorSegment>,
}

impl LocatorExpr {
    /// Build a single-segment chain.
    #[must_use]
    pub fn single(segment: LocatorSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    /// The nearest label-ish text walking the chain from the innermost
    /// segment outward, bounded to `depth` segments.
    ///
    /// Accessible labels, role names and placeholders qualify; structural
    /// selectors do not.
    #[must_use]
    pub fn nearest_label(&self, depth: usize) -> Option<&str> {
        self.segments
            .iter()
            .rev()
            .take(depth)
            .find_map(|seg| match seg {
                LocatorSegment::GetByLabel(text)
                | LocatorSegment::GetByPlaceholder(text) => Some(text.as_str()),
                LocatorSegment::GetByRole {
                    name: Some(name), ..
                } => Some(name.as_str()),
                _ => None,
            })
    }
}

/// One call in a locator chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorSegment {
    /// `getByRole('button', { name: 'Submit' })`
    GetByRole {
        /// ARIA role
        role: String,
        /// Accessible name filter, if present
        name: Option<String>,
    },
    /// `getByLabel('Customer Name')`
    GetByLabel(String),
    /// `getByPlaceholder('Search…')`
    GetByPlaceholder(String),
    /// `getByText('Welcome')`
    GetByText(String),
    /// `getByTestId('submit-btn')`
    GetByTestId(String),
    /// `locator('<css or xpath>')`
    Locator(String),
    /// `frameLocator('#frame')`
    FrameLocator(String),
    /// `filter({ hasText: '…' })`
    Filter {
        /// Text the element subtree must contain
        has_text: Option<String>,
    },
    /// `first()`
    First,
    /// `last()`
    Last,
    /// `nth(2)`
    Nth(usize),
}

/// The terminal interaction call of an action statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCall {
    /// `click()`
    Click,
    /// `dblclick()`
    DblClick,
    /// `fill(<value>)`
    Fill(Arg),
    /// `selectOption(<value>)`
    SelectOption(Arg),
    /// `press('Enter')`
    Press(String),
    /// `check()`
    Check,
    /// `uncheck()`
    Uncheck,
    /// `hover()`
    Hover,
}

impl ActionCall {
    /// The value argument, for the calls that set an input's value.
    #[must_use]
    pub const fn value_arg(&self) -> Option<&Arg> {
        match self {
            Self::Fill(arg) | Self::SelectOption(arg) => Some(arg),
            _ => None,
        }
    }

    /// Short verb for step titles and summaries.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DblClick => "double-click",
            Self::Fill(_) => "fill",
            Self::SelectOption(_) => "select",
            Self::Press(_) => "press",
            Self::Check => "check",
            Self::Uncheck => "uncheck",
            Self::Hover => "hover",
        }
    }
}

/// An assertion call on a located element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectCall {
    /// `toBeVisible()`
    ToBeVisible,
    /// `toBeHidden()`
    ToBeHidden,
    /// `toHaveText(<value>)`
    ToHaveText(Arg),
    /// `toContainText(<value>)`
    ToContainText(Arg),
}

impl ExpectCall {
    /// Human-readable description for metadata documents.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ToBeVisible => "element is visible".to_string(),
            Self::ToBeHidden => "element is hidden".to_string(),
            Self::ToHaveText(arg) => format!("element has text {}", arg.display()),
            Self::ToContainText(arg) => format!("element contains text {}", arg.display()),
        }
    }
}

/// A value argument: either a literal string or a reference into the
/// companion data file (`data.<name>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arg {
    /// Literal string, quoted on emission
    Literal(String),
    /// Data-file reference, emitted unquoted as `data.<name>`
    DataRef(String),
}

impl Arg {
    /// The literal value, if this argument is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value),
            Self::DataRef(_) => None,
        }
    }

    /// Render for prose (summaries, assertion descriptions).
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Literal(value) => format!("'{value}'"),
            Self::DataRef(name) => format!("data.{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod stmt_tests {
        use super::*;

        #[test]
        fn navigation_is_navigation() {
            let stmt = Stmt::Navigation {
                url: "https://example.com".to_string(),
            };
            assert!(stmt.is_navigation());
            assert!(!stmt.is_trivia());
        }

        #[test]
        fn comment_and_blank_are_trivia() {
            assert!(Stmt::Comment("hi".to_string()).is_trivia());
            assert!(Stmt::Blank.is_trivia());
            assert!(!Stmt::Raw("x".to_string()).is_trivia());
        }
    }

    mod label_tests {
        use super::*;

        #[test]
        fn nearest_label_prefers_innermost() {
            let chain = LocatorExpr {
                segments: vec![
                    LocatorSegment::GetByLabel("Outer".to_string()),
                    LocatorSegment::GetByLabel("Inner".to_string()),
                ],
            };
            assert_eq!(chain.nearest_label(10), Some("Inner"));
        }

        #[test]
        fn nearest_label_from_role_name() {
            let chain = LocatorExpr::single(LocatorSegment::GetByRole {
                role: "button".to_string(),
                name: Some("Submit".to_string()),
            });
            assert_eq!(chain.nearest_label(10), Some("Submit"));
        }

        #[test]
        fn nearest_label_none_for_structural() {
            let chain = LocatorExpr::single(LocatorSegment::Locator("#qty".to_string()));
            assert_eq!(chain.nearest_label(10), None);
        }

        #[test]
        fn nearest_label_respects_depth_bound() {
            let mut segments = vec![LocatorSegment::GetByLabel("Deep".to_string())];
            segments.extend((0..10).map(|_| LocatorSegment::First));
            let chain = LocatorExpr { segments };
            assert_eq!(chain.nearest_label(10), None);
            assert_eq!(chain.nearest_label(11), Some("Deep"));
        }
    }

    mod arg_tests {
        use super::*;

        #[test]
        fn literal_display_quotes() {
            assert_eq!(Arg::Literal("Acme".to_string()).display(), "'Acme'");
        }

        #[test]
        fn data_ref_display_unquoted() {
            assert_eq!(
                Arg::DataRef("customerName".to_string()).display(),
                "data.customerName"
            );
        }

        #[test]
        fn value_arg_only_for_fill_style_calls() {
            assert!(ActionCall::Fill(Arg::Literal("x".to_string()))
                .value_arg()
                .is_some());
            assert!(ActionCall::SelectOption(Arg::Literal("3".to_string()))
                .value_arg()
                .is_some());
            assert!(ActionCall::Click.value_arg().is_none());
            assert!(ActionCall::Press("Enter".to_string()).value_arg().is_none());
        }
    }
}
