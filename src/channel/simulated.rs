//! Timer-driven stand-in for a real update feed.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::SimulationSettings;
use crate::generation::{DEFAULT_FAILURE_MESSAGE, GenerationId};

use super::UpdateChannel;
use super::types::{Delivery, GenerationHandler, SharedState, Subscription};

/// Artifact reference handed to `on_complete` for a simulated generation.
pub fn artifact_ref(base: &str, id: &GenerationId) -> String {
    format!("{}/generated-{}.mp3", base.trim_end_matches('/'), id)
}

/// One scripted tick, replacing the random increment.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Add this much progress on the tick.
    Advance(f64),
    /// End the subscription with `on_error(reason)`.
    Fail(String),
}

struct SimulatedRun {
    id: GenerationId,
    delivery: Delivery,
    progress: f64,
    next_due: Instant,
    script: VecDeque<ScriptStep>,
}

/// Advances every subscription on a fixed tick by a bounded random step
/// until it reaches 100, then reports the artifact.
pub struct SimulatedChannel {
    tick: Duration,
    min_step: f64,
    max_step: f64,
    failure_rate: f64,
    artifact_base: String,
    rng: StdRng,
    runs: Vec<SimulatedRun>,
    scripts: HashMap<GenerationId, VecDeque<ScriptStep>>,
}

impl SimulatedChannel {
    pub fn new(settings: &SimulationSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            tick: Duration::from_millis(settings.tick_ms.max(1)),
            min_step: settings.min_step,
            max_step: settings.max_step,
            failure_rate: settings.failure_rate.clamp(0.0, 1.0),
            artifact_base: settings.artifact_base.clone(),
            rng,
            runs: Vec::new(),
            scripts: HashMap::new(),
        }
    }

    /// Drive the next subscription for `id` with `steps` before falling back
    /// to random increments.
    pub fn script(&mut self, id: &GenerationId, steps: impl IntoIterator<Item = ScriptStep>) {
        self.scripts.insert(id.clone(), steps.into_iter().collect());
    }

    /// Subscribe with an explicit start time; the first tick lands one
    /// interval after `start`.
    pub fn subscribe_at(
        &mut self,
        id: &GenerationId,
        handler: Box<dyn GenerationHandler>,
        start: Instant,
    ) -> Subscription {
        let state = SharedState::new();
        let script = self.scripts.remove(id).unwrap_or_default();
        debug!(generation = %id, scripted = !script.is_empty(), "simulated subscription started");
        self.runs.push(SimulatedRun {
            id: id.clone(),
            delivery: Delivery::new(state.clone(), handler),
            progress: 0.0,
            next_due: start + self.tick,
            script,
        });
        Subscription::new(id.clone(), state)
    }

    fn next_step(&mut self, script: &mut VecDeque<ScriptStep>) -> ScriptStep {
        if let Some(step) = script.pop_front() {
            return step;
        }
        if self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate) {
            return ScriptStep::Fail(DEFAULT_FAILURE_MESSAGE.to_string());
        }
        let step = if self.max_step > self.min_step {
            self.rng.gen_range(self.min_step..=self.max_step)
        } else {
            self.min_step
        };
        ScriptStep::Advance(step)
    }

    // Fire one tick for `run`; returns the number of callbacks delivered.
    fn fire_tick(&mut self, run: &mut SimulatedRun) -> usize {
        match self.next_step(&mut run.script) {
            ScriptStep::Fail(reason) => usize::from(run.delivery.fail(&reason)),
            ScriptStep::Advance(step) if step <= 0.0 || !step.is_finite() => {
                debug!(generation = %run.id, step, "non-positive step skipped");
                0
            }
            ScriptStep::Advance(step) => {
                run.progress += step;
                if run.progress < 100.0 {
                    debug!(generation = %run.id, progress = run.progress, "simulated progress");
                    return usize::from(run.delivery.progress(run.progress));
                }
                run.progress = 100.0;
                let mut fired = usize::from(run.delivery.progress(100.0));
                let artifact = artifact_ref(&self.artifact_base, &run.id);
                fired += usize::from(run.delivery.complete(&artifact));
                fired
            }
        }
    }
}

impl UpdateChannel for SimulatedChannel {
    fn subscribe(
        &mut self,
        id: &GenerationId,
        handler: Box<dyn GenerationHandler>,
    ) -> Subscription {
        self.subscribe_at(id, handler, Instant::now())
    }

    fn pump(&mut self, now: Instant) -> usize {
        let mut runs = std::mem::take(&mut self.runs);
        let mut fired = 0;

        for run in &mut runs {
            // Ticks missed between pumps are caught up in order.
            while run.delivery.is_live() && run.next_due <= now {
                run.next_due += self.tick;
                fired += self.fire_tick(run);
            }
        }

        runs.retain(|run| run.delivery.is_live());
        self.runs = runs;
        fired
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
