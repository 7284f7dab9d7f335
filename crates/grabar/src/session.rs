//! Recording session: the owned, bounded lifecycle for in-flight capture
//! state.
//!
//! Capture callbacks fire from the browser collaborator as interactions
//! happen. They funnel through an ordered channel into a single owner, so
//! step append is strictly serialized — no two steps can interleave out of
//! order. The session is the only holder of the step list; there is no
//! ambient global state to tear down.

use chrono::Utc;
use tokio::sync::mpsc;

use crate::locator::Locator;
use crate::step::{ActionKind, FrameContext, RecordedStep};

/// Session configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// URL the recording started on
    pub start_url: Option<String>,
    /// Note about restored authentication state, surfaced in summaries
    pub auth_state_note: Option<String>,
}

/// A capture event as delivered by the browser collaborator, before the
/// session assigns order and timestamp.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Interaction kind
    pub action: ActionKind,
    /// Candidate locators, best first
    pub locator_candidates: Vec<Locator>,
    /// Input value / URL / expected text
    pub value: Option<String>,
    /// Frame context
    pub frame: FrameContext,
    /// Screenshot path, when capture took one
    pub screenshot: Option<std::path::PathBuf>,
}

/// Cloneable handle given to capture callbacks.
///
/// Sends preserve arrival order; the session drains them in that order.
#[derive(Debug, Clone)]
pub struct StepSink {
    tx: mpsc::UnboundedSender<CapturedEvent>,
}

impl StepSink {
    /// Deliver one captured interaction. Returns `false` when the session
    /// is gone.
    pub fn push(&self, event: CapturedEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// The capture-time state holder. Accumulates steps and feeds the pipeline.
#[derive(Debug)]
pub struct RecordingSession {
    config: SessionConfig,
    steps: Vec<RecordedStep>,
    rx: mpsc::UnboundedReceiver<CapturedEvent>,
    next_order: u32,
}

impl RecordingSession {
    /// Start a session. The returned [`StepSink`] is what capture callbacks
    /// hold; it stops accepting events once the session is stopped or
    /// discarded.
    #[must_use]
    pub fn start(config: SessionConfig) -> (Self, StepSink) {
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::info!(start_url = ?config.start_url, "recording session started");
        (
            Self {
                config,
                steps: Vec::new(),
                rx,
                next_order: 0,
            },
            StepSink { tx },
        )
    }

    /// Drain every capture event delivered so far, appending steps in
    /// arrival order.
    pub fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.append(event);
        }
    }

    /// Append one event directly (the serialized path used by `pump`).
    pub fn append(&mut self, event: CapturedEvent) -> u32 {
        let order = self.next_order;
        self.next_order += 1;
        let step = RecordedStep {
            order,
            action: event.action,
            locator_candidates: event.locator_candidates,
            value: event.value,
            frame: event.frame,
            captured_at: Utc::now(),
            screenshot: event.screenshot,
            description: String::new(),
        };
        tracing::debug!(order, action = ?step.action, "step appended");
        self.steps.push(step);
        order
    }

    /// Set the human-editable description of a step.
    ///
    /// Returns `false` when no step has that order.
    pub fn set_description(&mut self, order: u32, description: impl Into<String>) -> bool {
        match self.steps.iter_mut().find(|s| s.order == order) {
            Some(step) => {
                step.description = description.into();
                true
            }
            None => false,
        }
    }

    /// Steps captured so far, in order.
    #[must_use]
    pub fn steps(&self) -> &[RecordedStep] {
        &self.steps
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Render the captured steps as raw script text — the input to the
    /// cleanup pass. Incoherent steps are skipped.
    #[must_use]
    pub fn raw_script(&mut self) -> String {
        self.pump();
        let mut out = String::new();
        for step in &self.steps {
            if let Some(stmt) = step.to_stmt(None, None) {
                out.push_str(&grabar_script::emit::emit_stmt(&stmt));
                out.push('\n');
            }
        }
        out
    }

    /// Stop the session, consuming it and yielding the final ordered step
    /// list. Pending channel events are drained first.
    #[must_use]
    pub fn stop(mut self) -> Vec<RecordedStep> {
        self.pump();
        tracing::info!(steps = self.steps.len(), "recording session stopped");
        self.steps
    }

    /// Discard the session and every captured step.
    pub fn discard(self) {
        tracing::info!(steps = self.steps.len(), "recording session discarded");
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_event(selector: &str) -> CapturedEvent {
        CapturedEvent {
            action: ActionKind::Click,
            locator_candidates: vec![Locator::css(selector)],
            value: None,
            frame: FrameContext::main(),
            screenshot: None,
        }
    }

    fn nav_event(url: &str) -> CapturedEvent {
        CapturedEvent {
            action: ActionKind::Navigate,
            locator_candidates: Vec::new(),
            value: Some(url.to_string()),
            frame: FrameContext::main(),
            screenshot: None,
        }
    }

    #[tokio::test]
    async fn append_order_is_arrival_order() {
        let (mut session, sink) = RecordingSession::start(SessionConfig::default());
        assert!(sink.push(nav_event("https://a.example/")));
        assert!(sink.push(click_event("#one")));
        assert!(sink.push(click_event("#two")));
        session.pump();

        let orders: Vec<u32> = session.steps().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(session.steps()[1].locator_candidates[0].selector, "#one");
    }

    #[tokio::test]
    async fn stop_drains_pending_events() {
        let (session, sink) = RecordingSession::start(SessionConfig::default());
        sink.push(nav_event("https://a.example/"));
        sink.push(click_event("#late"));
        let steps = session.stop();
        assert_eq!(steps.len(), 2);
    }

    #[tokio::test]
    async fn sink_reports_closed_session() {
        let (session, sink) = RecordingSession::start(SessionConfig::default());
        session.discard();
        assert!(!sink.push(click_event("#x")));
    }

    #[tokio::test]
    async fn description_is_the_only_mutation() {
        let (mut session, sink) = RecordingSession::start(SessionConfig::default());
        sink.push(click_event("#x"));
        session.pump();
        assert!(session.set_description(0, "open cart"));
        assert!(!session.set_description(9, "nope"));
        assert_eq!(session.steps()[0].description, "open cart");
    }

    #[tokio::test]
    async fn raw_script_renders_statements() {
        let (mut session, sink) = RecordingSession::start(SessionConfig::default());
        sink.push(nav_event("https://a.example/home"));
        sink.push(click_event("#go"));
        let script = session.raw_script();
        assert_eq!(
            script,
            "await page.goto('https://a.example/home');\nawait page.locator('#go').click();\n"
        );
    }
}
