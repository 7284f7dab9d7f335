//! Recorded steps: one captured user interaction, in capture order.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grabar_script::stmt::{ActionCall, Arg, ExpectCall, LocatorExpr, LocatorSegment, Stmt};

use crate::locator::Locator;

/// What kind of interaction a step captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Navigate to a URL (`value` holds the URL)
    Navigate,
    /// Click the target element
    Click,
    /// Double-click the target element
    DblClick,
    /// Fill an input (`value` holds the text)
    Fill,
    /// Choose a select option (`value` holds the option)
    SelectOption,
    /// Press a key (`value` holds the key)
    Press,
    /// Check a checkbox
    Check,
    /// Uncheck a checkbox
    Uncheck,
    /// Hover the target element
    Hover,
    /// Assert the target element is visible
    AssertVisible,
    /// Assert the target element's text (`value` holds the expected text)
    AssertText,
}

impl ActionKind {
    /// Whether this step asserts rather than interacts.
    #[must_use]
    pub const fn is_assertion(self) -> bool {
        matches!(self, Self::AssertVisible | Self::AssertText)
    }

    /// Whether the `value` field is a user-entered input value that can be
    /// extracted into a parameter.
    #[must_use]
    pub const fn takes_input_value(self) -> bool {
        matches!(self, Self::Fill | Self::SelectOption)
    }
}

/// Which frame the interaction happened in.
///
/// `None` is the main frame; a selector addresses a child frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameContext {
    /// Frame selector, when not the main frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_selector: Option<String>,
}

impl FrameContext {
    /// The main frame.
    #[must_use]
    pub const fn main() -> Self {
        Self {
            frame_selector: None,
        }
    }

    /// A child frame addressed by selector.
    #[must_use]
    pub fn frame(selector: impl Into<String>) -> Self {
        Self {
            frame_selector: Some(selector.into()),
        }
    }
}

/// One captured user interaction.
///
/// Immutable once appended to a session, except for the human-editable
/// `description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedStep {
    /// Capture-order position, 0-based and dense
    pub order: u32,
    /// Interaction kind
    pub action: ActionKind,
    /// Candidate locators for the target, best first
    #[serde(default)]
    pub locator_candidates: Vec<Locator>,
    /// Input value / URL / expected text, depending on `action`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Frame the interaction happened in
    #[serde(default)]
    pub frame: FrameContext,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
    /// Optional screenshot taken at capture time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    /// Human-editable step description
    #[serde(default)]
    pub description: String,
}

impl RecordedStep {
    /// The best locator candidate, if any.
    #[must_use]
    pub fn primary_locator(&self) -> Option<&Locator> {
        self.locator_candidates.first()
    }

    /// Short human title for markers and summaries.
    #[must_use]
    pub fn title(&self) -> String {
        if !self.description.is_empty() {
            return self.description.clone();
        }
        let verb = match self.action {
            ActionKind::Navigate => return "navigate".to_string(),
            ActionKind::Click => "click",
            ActionKind::DblClick => "double-click",
            ActionKind::Fill => "fill",
            ActionKind::SelectOption => "select",
            ActionKind::Press => "press",
            ActionKind::Check => "check",
            ActionKind::Uncheck => "uncheck",
            ActionKind::Hover => "hover",
            ActionKind::AssertVisible => "assert visible",
            ActionKind::AssertText => "assert text",
        };
        match self.primary_locator() {
            Some(locator) => format!("{verb} {}", locator.selector),
            None => verb.to_string(),
        }
    }

    /// Render this step as a script statement using `locator` as the chosen
    /// target and `value_arg` as the (possibly parameter-bound) value.
    ///
    /// Returns `None` when the step is incoherent (an interaction without a
    /// locator, a fill without a value).
    #[must_use]
    pub fn to_stmt(&self, locator: Option<&Locator>, value_arg: Option<Arg>) -> Option<Stmt> {
        if self.action == ActionKind::Navigate {
            return Some(Stmt::Navigation {
                url: self.value.clone()?,
            });
        }

        let locator = locator.or_else(|| self.primary_locator())?;
        let mut segments = Vec::new();
        if let Some(frame) = &self.frame.frame_selector {
            segments.push(LocatorSegment::FrameLocator(frame.clone()));
        }
        segments.push(locator.to_segment());
        let target = LocatorExpr { segments };

        let value = || -> Option<Arg> {
            value_arg
                .clone()
                .or_else(|| self.value.clone().map(Arg::Literal))
        };

        let stmt = match self.action {
            ActionKind::Navigate => unreachable!(),
            ActionKind::Click => Stmt::Action {
                target,
                call: ActionCall::Click,
            },
            ActionKind::DblClick => Stmt::Action {
                target,
                call: ActionCall::DblClick,
            },
            ActionKind::Fill => Stmt::Action {
                target,
                call: ActionCall::Fill(value()?),
            },
            ActionKind::SelectOption => Stmt::Action {
                target,
                call: ActionCall::SelectOption(value()?),
            },
            ActionKind::Press => Stmt::Action {
                target,
                call: ActionCall::Press(self.value.clone()?),
            },
            ActionKind::Check => Stmt::Action {
                target,
                call: ActionCall::Check,
            },
            ActionKind::Uncheck => Stmt::Action {
                target,
                call: ActionCall::Uncheck,
            },
            ActionKind::Hover => Stmt::Action {
                target,
                call: ActionCall::Hover,
            },
            ActionKind::AssertVisible => Stmt::Expectation {
                target,
                check: ExpectCall::ToBeVisible,
            },
            ActionKind::AssertText => Stmt::Expectation {
                target,
                check: ExpectCall::ToHaveText(value()?),
            },
        };
        Some(stmt)
    }

    /// Content fingerprint for step anchors: stable across regeneration of
    /// the same logical step.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.order.to_le_bytes());
        hasher.update(format!("{:?}", self.action).as_bytes());
        if let Some(locator) = self.primary_locator() {
            hasher.update(locator.display_text().as_bytes());
        }
        if let Some(value) = &self.value {
            hasher.update(value.as_bytes());
        }
        hasher.finalize().to_hex()[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grabar_script::emit::emit_stmt;

    fn step(order: u32, action: ActionKind, locator: Option<Locator>, value: Option<&str>) -> RecordedStep {
        RecordedStep {
            order,
            action,
            locator_candidates: locator.into_iter().collect(),
            value: value.map(str::to_string),
            frame: FrameContext::main(),
            captured_at: DateTime::<Utc>::MIN_UTC,
            screenshot: None,
            description: String::new(),
        }
    }

    mod stmt_tests {
        use super::*;

        #[test]
        fn navigate_emits_goto() {
            let s = step(0, ActionKind::Navigate, None, Some("https://a.example/"));
            let stmt = s.to_stmt(None, None).unwrap();
            assert_eq!(emit_stmt(&stmt), "await page.goto('https://a.example/');");
        }

        #[test]
        fn fill_uses_chosen_locator_and_bound_value() {
            let s = step(
                1,
                ActionKind::Fill,
                Some(Locator::label("Customer Name")),
                Some("Acme Corp"),
            );
            let stmt = s
                .to_stmt(None, Some(Arg::DataRef("customerName".to_string())))
                .unwrap();
            assert_eq!(
                emit_stmt(&stmt),
                "await page.getByLabel('Customer Name').fill(data.customerName);"
            );
        }

        #[test]
        fn frame_context_prepends_frame_locator() {
            let mut s = step(2, ActionKind::Click, Some(Locator::css("#pay")), None);
            s.frame = FrameContext::frame("#checkout");
            let stmt = s.to_stmt(None, None).unwrap();
            assert_eq!(
                emit_stmt(&stmt),
                "await page.frameLocator('#checkout').locator('#pay').click();"
            );
        }

        #[test]
        fn fill_without_value_is_incoherent() {
            let s = step(3, ActionKind::Fill, Some(Locator::label("X")), None);
            assert!(s.to_stmt(None, None).is_none());
        }

        #[test]
        fn click_without_locator_is_incoherent() {
            let s = step(4, ActionKind::Click, None, None);
            assert!(s.to_stmt(None, None).is_none());
        }

        #[test]
        fn assert_text_emits_expectation() {
            let s = step(
                5,
                ActionKind::AssertText,
                Some(Locator::test_id("total")),
                Some("42.00"),
            );
            let stmt = s.to_stmt(None, None).unwrap();
            assert_eq!(
                emit_stmt(&stmt),
                "await expect(page.getByTestId('total')).toHaveText('42.00');"
            );
        }
    }

    mod fingerprint_tests {
        use super::*;

        #[test]
        fn stable_for_same_content() {
            let a = step(1, ActionKind::Fill, Some(Locator::label("Q")), Some("v"));
            let b = step(1, ActionKind::Fill, Some(Locator::label("Q")), Some("v"));
            assert_eq!(a.fingerprint(), b.fingerprint());
        }

        #[test]
        fn differs_for_different_content() {
            let a = step(1, ActionKind::Fill, Some(Locator::label("Q")), Some("v"));
            let b = step(2, ActionKind::Fill, Some(Locator::label("Q")), Some("v"));
            assert_ne!(a.fingerprint(), b.fingerprint());
        }

        #[test]
        fn fingerprint_is_eight_hex_chars() {
            let s = step(0, ActionKind::Click, Some(Locator::css("#x")), None);
            let fp = s.fingerprint();
            assert_eq!(fp.len(), 8);
            assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    mod title_tests {
        use super::*;

        #[test]
        fn description_wins() {
            let mut s = step(0, ActionKind::Click, Some(Locator::css("#x")), None);
            s.description = "open the cart".to_string();
            assert_eq!(s.title(), "open the cart");
        }

        #[test]
        fn derived_title_names_selector() {
            let s = step(
                0,
                ActionKind::Fill,
                Some(Locator::label("Customer Name")),
                Some("Acme"),
            );
            assert_eq!(s.title(), "fill Customer Name");
        }
    }
}
