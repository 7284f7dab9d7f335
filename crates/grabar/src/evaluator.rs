//! Locator quality evaluation against a live (or fixture) DOM.
//!
//! The evaluator grades a candidate locator on two axes: how robust its
//! addressing strategy is, and whether it currently matches exactly one
//! element. Both fold into a usability level with a short recommendation
//! the recorder UI can show on hover.
//!
//! Evaluations are ephemeral — they are recomputed per inspection and never
//! persisted; only the chosen locator text lands in generated specs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::{Locator, Strength};
use crate::result::GrabarResult;

/// Default timeout for live-DOM queries (interactive hover path).
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;

/// Facts about a resolved element, enough to grade usability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementFacts {
    /// Tag name, lower-case
    pub tag: String,
    /// Whether the element is currently visible
    pub visible: bool,
}

/// Read-only access to a page's DOM.
///
/// The probe must not mutate page state; both queries are pure reads.
#[async_trait]
pub trait DomProbe: Send + Sync {
    /// How many elements the locator currently matches.
    async fn count_matches(&self, locator: &Locator) -> GrabarResult<i64>;

    /// Resolve the locator to a concrete element, `None` when nothing
    /// matches.
    async fn resolve(&self, locator: &Locator) -> GrabarResult<Option<ElementFacts>>;
}

/// Qualitative rating level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Will break soon or does not work now
    Poor,
    /// Works but fragile
    Fair,
    /// Solid with minor caveats
    Good,
    /// Unique and robust
    Excellent,
}

/// The rated locator, echoed back with a flag for unresolvable targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedLocator {
    /// Addressing strategy
    pub strategy: crate::locator::Strategy,
    /// Selector text
    pub selector: String,
    /// Set when the element could not be resolved at all
    pub flagged: bool,
}

/// Strategy-robustness component of the evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRating {
    /// 0–100
    pub score: u32,
    /// Qualitative level
    pub level: Level,
    /// Why the strategy earned this rating
    pub reason: String,
}

/// Live-uniqueness component of the evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessRating {
    /// True iff the locator matches exactly one element
    pub is_unique: bool,
    /// Current match count; `-1` when the query failed or timed out
    pub match_count: i64,
    /// 0–100
    pub score: u32,
}

/// Combined usability verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsabilityRating {
    /// 0–100
    pub score: u32,
    /// Qualitative level
    pub level: Level,
    /// Short actionable advice
    pub recommendation: String,
}

/// Full evaluation of one locator against the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorEvaluation {
    /// The rated locator
    pub locator: RatedLocator,
    /// Strategy robustness
    pub quality: QualityRating,
    /// Live uniqueness
    pub uniqueness: UniquenessRating,
    /// Combined verdict
    pub usability: UsabilityRating,
}

impl LocatorEvaluation {
    /// The zero-confidence evaluation returned when the element cannot be
    /// resolved. Callers treat this as data, not as a failure.
    #[must_use]
    pub fn unresolved(locator: &Locator) -> Self {
        Self {
            locator: RatedLocator {
                strategy: locator.strategy,
                selector: locator.selector.clone(),
                flagged: true,
            },
            quality: QualityRating {
                score: 0,
                level: Level::Poor,
                reason: "element could not be resolved".to_string(),
            },
            uniqueness: UniquenessRating {
                is_unique: false,
                match_count: -1,
                score: 0,
            },
            usability: UsabilityRating {
                score: 0,
                level: Level::Poor,
                recommendation: "element could not be resolved; re-pick the target".to_string(),
            },
        }
    }
}

/// Evaluator tuning knobs.
#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    /// Timeout for each DOM query
    pub timeout: Duration,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
        }
    }
}

fn quality_of(locator: &Locator) -> QualityRating {
    match locator.strategy.strength() {
        Strength::Strong => QualityRating {
            score: 90,
            level: Level::Excellent,
            reason: "accessible locator, survives markup churn".to_string(),
        },
        Strength::Moderate => QualityRating {
            score: 60,
            level: Level::Good,
            reason: "attribute-based selector, depends on authored metadata".to_string(),
        },
        Strength::Weak => QualityRating {
            score: 30,
            level: Level::Fair,
            reason: "structural selector, breaks on layout changes".to_string(),
        },
    }
}

fn uniqueness_of(match_count: i64) -> UniquenessRating {
    let (is_unique, score) = match match_count {
        1 => (true, 100),
        n if n >= 2 => (false, 40),
        _ => (false, 0),
    };
    UniquenessRating {
        is_unique,
        match_count,
        score,
    }
}

fn usability_of(locator: &Locator, uniqueness: &UniquenessRating, quality: &QualityRating) -> UsabilityRating {
    let score = (quality.score + uniqueness.score) / 2;
    let level = match score {
        90..=100 => Level::Excellent,
        70..=89 => Level::Good,
        45..=69 => Level::Fair,
        _ => Level::Poor,
    };
    let recommendation = if uniqueness.match_count == 0 {
        "no elements match; the element may be gone".to_string()
    } else if !uniqueness.is_unique {
        format!(
            "{} elements match; narrow the locator",
            uniqueness.match_count
        )
    } else {
        match locator.strategy.strength() {
            Strength::Strong => "locator is unique and robust".to_string(),
            Strength::Moderate => "consider an accessible role or label locator".to_string(),
            Strength::Weak => "add a stable test identifier attribute".to_string(),
        }
    };
    UsabilityRating {
        score,
        level,
        recommendation,
    }
}

/// Evaluate a locator against the page behind `probe`.
///
/// Never errors: probe failures and timeouts degrade to the flagged
/// zero-confidence evaluation.
pub async fn evaluate(
    probe: &dyn DomProbe,
    locator: &Locator,
    opts: &EvaluatorOptions,
) -> LocatorEvaluation {
    let resolved = tokio::time::timeout(opts.timeout, probe.resolve(locator)).await;
    match resolved {
        Ok(Ok(Some(_facts))) => {}
        Ok(Ok(None)) => {
            tracing::debug!(locator = %locator.display_text(), "locator resolved to nothing");
            return LocatorEvaluation::unresolved(locator);
        }
        Ok(Err(err)) => {
            tracing::debug!(locator = %locator.display_text(), %err, "probe resolve failed");
            return LocatorEvaluation::unresolved(locator);
        }
        Err(_) => {
            tracing::debug!(locator = %locator.display_text(), "probe resolve timed out");
            return LocatorEvaluation::unresolved(locator);
        }
    }

    let match_count = match tokio::time::timeout(opts.timeout, probe.count_matches(locator)).await
    {
        Ok(Ok(count)) => count,
        Ok(Err(_)) | Err(_) => -1,
    };

    let quality = quality_of(locator);
    let uniqueness = uniqueness_of(match_count);
    let usability = usability_of(locator, &uniqueness, &quality);
    LocatorEvaluation {
        locator: RatedLocator {
            strategy: locator.strategy,
            selector: locator.selector.clone(),
            flagged: false,
        },
        quality,
        uniqueness,
        usability,
    }
}

/// Hover-driven evaluation with last-invocation-wins semantics.
///
/// Every call supersedes the previous one for the same session: a stale
/// in-flight evaluation is detected by token comparison after the await and
/// its result discarded rather than delivered. Token invalidation, not
/// thread interruption.
pub struct EvaluationSession<P> {
    probe: P,
    opts: EvaluatorOptions,
    generation: AtomicU64,
}

impl<P: DomProbe> EvaluationSession<P> {
    /// Wrap a probe.
    #[must_use]
    pub fn new(probe: P, opts: EvaluatorOptions) -> Self {
        Self {
            probe,
            opts,
            generation: AtomicU64::new(0),
        }
    }

    /// Evaluate, unless a newer request supersedes this one while the DOM
    /// query is in flight. Superseded results are discarded (`None`).
    ///
    /// The supersede token is taken at call time, before the returned future
    /// is first polled, so request order is what decides who wins.
    pub fn evaluate_latest<'a>(
        &'a self,
        locator: &Locator,
    ) -> impl std::future::Future<Output = Option<LocatorEvaluation>> + 'a {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let locator = locator.clone();
        async move {
            let evaluation = evaluate(&self.probe, &locator, &self.opts).await;
            if self.generation.load(Ordering::SeqCst) == token {
                Some(evaluation)
            } else {
                tracing::trace!(locator = %locator.display_text(), "evaluation superseded");
                None
            }
        }
    }

    /// Invalidate any in-flight evaluation without starting a new one.
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Access the wrapped probe.
    pub fn probe(&self) -> &P {
        &self.probe
    }
}

/// An in-memory DOM fixture, for tests and the snapshot inspect mode.
///
/// Elements declare which locators they answer to; the probe counts plain
/// matches like a live page would.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticDomProbe {
    /// Fixture elements
    pub elements: Vec<FixtureElement>,
    /// Artificial delay per query, for cancellation tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_delay_ms: Option<u64>,
}

/// One fixture element and the addressing facts it exposes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureElement {
    /// Tag name
    pub tag: String,
    /// ARIA role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Accessible name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Associated label text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Placeholder text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Visible text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// `data-testid` value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    /// CSS/XPath selectors that would match this element
    #[serde(default)]
    pub selectors: Vec<String>,
    /// Whether the element is visible
    #[serde(default = "default_visible")]
    pub visible: bool,
}

const fn default_visible() -> bool {
    true
}

impl FixtureElement {
    fn matches(&self, locator: &Locator) -> bool {
        use crate::locator::Strategy;
        match locator.strategy {
            Strategy::Role => {
                self.role.as_deref() == Some(locator.selector.as_str())
                    && locator
                        .name
                        .as_ref()
                        .map_or(true, |n| self.name.as_deref() == Some(n.as_str()))
            }
            Strategy::Label => self.label.as_deref() == Some(locator.selector.as_str()),
            Strategy::Placeholder => {
                self.placeholder.as_deref() == Some(locator.selector.as_str())
            }
            Strategy::Text => self.text.as_deref() == Some(locator.selector.as_str()),
            Strategy::TestId => self.test_id.as_deref() == Some(locator.selector.as_str()),
            Strategy::CssAttribute | Strategy::Css | Strategy::XPath => {
                self.selectors.iter().any(|s| s == &locator.selector)
            }
        }
    }
}

#[async_trait]
impl DomProbe for StaticDomProbe {
    async fn count_matches(&self, locator: &Locator) -> GrabarResult<i64> {
        if let Some(ms) = self.query_delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        Ok(self.elements.iter().filter(|e| e.matches(locator)).count() as i64)
    }

    async fn resolve(&self, locator: &Locator) -> GrabarResult<Option<ElementFacts>> {
        if let Some(ms) = self.query_delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        Ok(self
            .elements
            .iter()
            .find(|e| e.matches(locator))
            .map(|e| ElementFacts {
                tag: e.tag.clone(),
                visible: e.visible,
            }))
    }
}

/// Live CDP-backed probe.
#[cfg(feature = "browser")]
pub mod cdp {
    use super::{DomProbe, ElementFacts, GrabarResult, Locator};
    use crate::result::GrabarError;
    use async_trait::async_trait;
    use chromiumoxide::page::Page as CdpPage;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// DOM probe over a live Chrome DevTools Protocol page.
    #[derive(Debug, Clone)]
    pub struct CdpProbe {
        page: Arc<Mutex<CdpPage>>,
    }

    impl CdpProbe {
        /// Wrap an existing CDP page handle.
        #[must_use]
        pub fn new(page: Arc<Mutex<CdpPage>>) -> Self {
            Self { page }
        }

        async fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> GrabarResult<T> {
            let page = self.page.lock().await;
            let result = page.evaluate(expr).await.map_err(|e| GrabarError::Probe {
                message: e.to_string(),
            })?;
            result.into_value().map_err(|e| GrabarError::Probe {
                message: e.to_string(),
            })
        }
    }

    #[async_trait]
    impl DomProbe for CdpProbe {
        async fn count_matches(&self, locator: &Locator) -> GrabarResult<i64> {
            self.eval(&locator.to_count_query()).await
        }

        async fn resolve(&self, locator: &Locator) -> GrabarResult<Option<ElementFacts>> {
            self.eval(&locator.to_probe_query()).await
        }
    }
}
