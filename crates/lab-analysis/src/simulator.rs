//! Synthetic user interaction
//!
//! [`InteractionSimulator::simulate`] drives a loaded page for a fixed
//! wall-clock budget. Each iteration clicks every visible interactive
//! element, types a probe string into every text input, scrolls by a random
//! offset with a short in-page busy-wait, then pauses.
//!
//! The loop is best-effort: individual failures are counted in the returned
//! [`SimulationOutcome`] and logged at `debug`, never propagated.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::AnalysisSettings;
use crate::session::BrowserSession;

/// Elements the simulator clicks
pub const CLICK_TARGETS: &str = r#"button, a, [role="button"], input[type="checkbox"]"#;

/// Elements the simulator types into
pub const TEXT_INPUTS: &str = r#"input[type="text"], input[type="search"], input[type="email"], input:not([type]), textarea"#;

const SCROLL_RANGE_PX: std::ops::RangeInclusive<u32> = 0..=300;
const BUSY_WAIT_RANGE_MS: std::ops::RangeInclusive<u64> = 50..=100;
const PAUSE_RANGE_MS: std::ops::RangeInclusive<u64> = 200..=500;

/// Tally of one simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationOutcome {
    pub iterations: u32,
    pub clicks_attempted: u32,
    pub clicks_failed: u32,
    pub inputs_attempted: u32,
    pub inputs_failed: u32,
    pub scrolls_attempted: u32,
    pub scrolls_failed: u32,
    /// Element lookups that failed outright
    pub lookups_failed: u32,
}

impl SimulationOutcome {
    pub fn failures(&self) -> u32 {
        self.clicks_failed + self.inputs_failed + self.scrolls_failed + self.lookups_failed
    }
}

/// Drives synthetic interactions against a page
#[derive(Debug, Clone)]
pub struct InteractionSimulator {
    budget: Duration,
    probe_text: String,
    seed: Option<u64>,
}

impl InteractionSimulator {
    pub fn new(budget: Duration, probe_text: impl Into<String>) -> Self {
        Self {
            budget,
            probe_text: probe_text.into(),
            seed: None,
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            budget: settings.interaction_budget(),
            probe_text: settings.probe_text.clone(),
            seed: settings.seed,
        }
    }

    /// Fix the RNG seed for reproducible offsets and pauses
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Interact with the page until the budget elapses
    ///
    /// An iteration already in progress when the budget runs out is allowed
    /// to finish; the final pause is cut short at the deadline.
    #[instrument(skip(self, session), fields(budget_ms = self.budget.as_millis() as u64))]
    pub async fn simulate<S: BrowserSession>(&self, session: &S) -> SimulationOutcome {
        let mut rng = self.rng();
        let mut outcome = SimulationOutcome::default();
        let deadline = Instant::now() + self.budget;

        while Instant::now() < deadline {
            outcome.iterations += 1;

            self.click_all(session, &mut outcome).await;
            self.type_all(session, &mut outcome).await;

            let offset = rng.gen_range(SCROLL_RANGE_PX);
            let busy_ms = rng.gen_range(BUSY_WAIT_RANGE_MS);
            outcome.scrolls_attempted += 1;
            if let Err(e) = session.evaluate(&contention_script(offset, busy_ms)).await {
                outcome.scrolls_failed += 1;
                debug!("Scroll failed: {}", e);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let pause = Duration::from_millis(rng.gen_range(PAUSE_RANGE_MS));
            tokio::time::sleep(pause.min(remaining)).await;
        }

        info!(
            iterations = outcome.iterations,
            clicks = outcome.clicks_attempted,
            inputs = outcome.inputs_attempted,
            failures = outcome.failures(),
            "Interaction simulation finished"
        );
        outcome
    }

    async fn click_all<S: BrowserSession>(&self, session: &S, outcome: &mut SimulationOutcome) {
        let elements = match session.visible_elements(CLICK_TARGETS).await {
            Ok(elements) => elements,
            Err(e) => {
                outcome.lookups_failed += 1;
                debug!("Click target lookup failed: {}", e);
                return;
            }
        };

        for element in &elements {
            outcome.clicks_attempted += 1;
            if let Err(e) = session.click(element).await {
                outcome.clicks_failed += 1;
                debug!("Click failed: {}", e);
            }
        }
    }

    async fn type_all<S: BrowserSession>(&self, session: &S, outcome: &mut SimulationOutcome) {
        let elements = match session.visible_elements(TEXT_INPUTS).await {
            Ok(elements) => elements,
            Err(e) => {
                outcome.lookups_failed += 1;
                debug!("Text input lookup failed: {}", e);
                return;
            }
        };

        for element in &elements {
            outcome.inputs_attempted += 1;
            if let Err(e) = session.type_text(element, &self.probe_text).await {
                outcome.inputs_failed += 1;
                debug!("Typing failed: {}", e);
            }
        }
    }
}

/// Scroll by `offset_px`, then block the main thread for `busy_ms`
fn contention_script(offset_px: u32, busy_ms: u64) -> String {
    format!(
        "(() => {{ window.scrollBy(0, {offset_px}); \
         const end = performance.now() + {busy_ms}; \
         while (performance.now() < end) {{}} \
         return true; }})()"
    )
}
