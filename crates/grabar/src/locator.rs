//! Locator abstraction: a strategy plus selector identifying a page element.
//!
//! Strategies are ranked by how well they survive markup churn. Accessible
//! locators (role, label, placeholder, text) key off what users perceive;
//! attribute-based CSS keys off authored metadata; structural CSS and XPath
//! key off layout and break first.

use serde::{Deserialize, Serialize};

use grabar_script::stmt::{LocatorExpr, LocatorSegment};

/// How an element is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// ARIA role, optionally narrowed by accessible name
    Role,
    /// Accessible label text
    Label,
    /// Placeholder text
    Placeholder,
    /// Visible text content
    Text,
    /// `data-testid` attribute
    TestId,
    /// CSS keyed off attributes or classes
    CssAttribute,
    /// Structural CSS (tag paths, child positions)
    Css,
    /// XPath expression
    XPath,
}

/// Robustness rank of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    /// Structural addressing, breaks on layout changes
    Weak,
    /// Attribute/class-based addressing
    Moderate,
    /// Accessible addressing, survives markup churn
    Strong,
}

impl Strategy {
    /// Robustness rank.
    #[must_use]
    pub const fn strength(self) -> Strength {
        match self {
            Self::Role | Self::Label | Self::Placeholder | Self::Text => Strength::Strong,
            Self::TestId | Self::CssAttribute => Strength::Moderate,
            Self::Css | Self::XPath => Strength::Weak,
        }
    }

    /// Stable name for index keys and display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Label => "label",
            Self::Placeholder => "placeholder",
            Self::Text => "text",
            Self::TestId => "test-id",
            Self::CssAttribute => "css-attribute",
            Self::Css => "css",
            Self::XPath => "xpath",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy + selector pair identifying a page element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Addressing strategy
    pub strategy: Strategy,
    /// Strategy-specific selector text (role, label text, CSS, ...)
    pub selector: String,
    /// Accessible-name qualifier for role locators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Locator {
    /// Role locator, optionally narrowed by accessible name.
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<String>) -> Self {
        Self {
            strategy: Strategy::Role,
            selector: role.into(),
            name,
        }
    }

    /// Label locator.
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Label,
            selector: text.into(),
            name: None,
        }
    }

    /// Placeholder locator.
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Placeholder,
            selector: text.into(),
            name: None,
        }
    }

    /// Visible-text locator.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Text,
            selector: text.into(),
            name: None,
        }
    }

    /// Test-id locator.
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::TestId,
            selector: id.into(),
            name: None,
        }
    }

    /// CSS locator; the strategy is classified from the selector shape.
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self {
            strategy: classify_css(&selector),
            selector,
            name: None,
        }
    }

    /// XPath locator.
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::XPath,
            selector: selector.into(),
            name: None,
        }
    }

    /// The script segment this locator emits into generated specs.
    #[must_use]
    pub fn to_segment(&self) -> LocatorSegment {
        match self.strategy {
            Strategy::Role => LocatorSegment::GetByRole {
                role: self.selector.clone(),
                name: self.name.clone(),
            },
            Strategy::Label => LocatorSegment::GetByLabel(self.selector.clone()),
            Strategy::Placeholder => LocatorSegment::GetByPlaceholder(self.selector.clone()),
            Strategy::Text => LocatorSegment::GetByText(self.selector.clone()),
            Strategy::TestId => LocatorSegment::GetByTestId(self.selector.clone()),
            Strategy::CssAttribute | Strategy::Css | Strategy::XPath => {
                LocatorSegment::Locator(self.selector.clone())
            }
        }
    }

    /// Recover a locator from a script segment, when one maps cleanly.
    #[must_use]
    pub fn from_segment(segment: &LocatorSegment) -> Option<Self> {
        match segment {
            LocatorSegment::GetByRole { role, name } => {
                Some(Self::role(role.clone(), name.clone()))
            }
            LocatorSegment::GetByLabel(text) => Some(Self::label(text.clone())),
            LocatorSegment::GetByPlaceholder(text) => Some(Self::placeholder(text.clone())),
            LocatorSegment::GetByText(text) => Some(Self::text(text.clone())),
            LocatorSegment::GetByTestId(id) => Some(Self::test_id(id.clone())),
            LocatorSegment::Locator(selector) => Some(if is_xpath(selector) {
                Self::xpath(selector.clone())
            } else {
                Self::css(selector.clone())
            }),
            _ => None,
        }
    }

    /// The innermost mappable locator of a chain.
    #[must_use]
    pub fn from_expr(expr: &LocatorExpr) -> Option<Self> {
        expr.segments.iter().rev().find_map(Self::from_segment)
    }

    /// Stable display text used as index and maintenance-store key material.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.name {
            Some(name) => format!("{}={}[name={}]", self.strategy, self.selector, name),
            None => format!("{}={}", self.strategy, self.selector),
        }
    }

    /// JavaScript expression counting how many elements currently match.
    ///
    /// Evaluated verbatim in the live page by the DOM probe; must not mutate
    /// page state.
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self.strategy {
            Strategy::Role => match &self.name {
                Some(name) => format!(
                    "Array.from(document.querySelectorAll('[role={:?}]')).filter(el => (el.getAttribute('aria-label') || el.textContent || '').trim() === {:?}).length",
                    self.selector, name
                ),
                None => format!(
                    "document.querySelectorAll('[role={:?}]').length",
                    self.selector
                ),
            },
            Strategy::Label => format!(
                "Array.from(document.querySelectorAll('input,select,textarea')).filter(el => (el.labels && Array.from(el.labels).some(l => l.textContent.trim() === {lit:?})) || el.getAttribute('aria-label') === {lit:?}).length",
                lit = self.selector
            ),
            Strategy::Placeholder => format!(
                "document.querySelectorAll('[placeholder={:?}]').length",
                self.selector
            ),
            Strategy::Text => format!(
                "Array.from(document.querySelectorAll('*')).filter(el => el.children.length === 0 && el.textContent.trim() === {:?}).length",
                self.selector
            ),
            Strategy::TestId => format!(
                "document.querySelectorAll('[data-testid={:?}]').length",
                self.selector
            ),
            Strategy::CssAttribute | Strategy::Css => format!(
                "document.querySelectorAll({:?}).length",
                self.selector
            ),
            Strategy::XPath => format!(
                "document.evaluate({:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                self.selector
            ),
        }
    }
}

impl Locator {
    /// JavaScript expression resolving the first match to
    /// `{ tag, visible } | null`.
    #[must_use]
    pub fn to_probe_query(&self) -> String {
        let first = match self.strategy {
            Strategy::Role => match &self.name {
                Some(name) => format!(
                    "Array.from(document.querySelectorAll('[role={:?}]')).find(el => (el.getAttribute('aria-label') || el.textContent || '').trim() === {:?})",
                    self.selector, name
                ),
                None => format!(
                    "document.querySelector('[role={:?}]')",
                    self.selector
                ),
            },
            Strategy::Label => format!(
                "Array.from(document.querySelectorAll('input,select,textarea')).find(el => (el.labels && Array.from(el.labels).some(l => l.textContent.trim() === {lit:?})) || el.getAttribute('aria-label') === {lit:?})",
                lit = self.selector
            ),
            Strategy::Placeholder => format!(
                "document.querySelector('[placeholder={:?}]')",
                self.selector
            ),
            Strategy::Text => format!(
                "Array.from(document.querySelectorAll('*')).find(el => el.children.length === 0 && el.textContent.trim() === {:?})",
                self.selector
            ),
            Strategy::TestId => format!(
                "document.querySelector('[data-testid={:?}]')",
                self.selector
            ),
            Strategy::CssAttribute | Strategy::Css => {
                format!("document.querySelector({:?})", self.selector)
            }
            Strategy::XPath => format!(
                "document.evaluate({:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                self.selector
            ),
        };
        format!(
            "(() => {{ const el = {first}; if (!el) return null; const r = el.getBoundingClientRect(); return {{ tag: el.tagName.toLowerCase(), visible: r.width > 0 && r.height > 0 }}; }})()"
        )
    }
}

/// Whether a raw selector string is XPath rather than CSS.
#[must_use]
pub fn is_xpath(selector: &str) -> bool {
    selector.starts_with("//") || selector.starts_with("xpath=")
}

/// Classify a CSS selector as attribute-based (moderate) or structural
/// (weak).
///
/// Attribute selectors (`[name=…]`), id selectors and class selectors key
/// off authored metadata; descendant paths, tag names and positional
/// pseudo-classes are structural.
#[must_use]
pub fn classify_css(selector: &str) -> Strategy {
    let structural = selector.contains('>')
        || selector.contains(" ")
        || selector.contains(":nth-")
        || selector.contains(":first-")
        || selector.contains(":last-");
    if structural {
        return Strategy::Css;
    }
    let attributed =
        selector.contains('[') || selector.contains('#') || selector.contains('.');
    if attributed {
        Strategy::CssAttribute
    } else {
        Strategy::Css
    }
}
