//! Cancellable phase timers.
//!
//! A room has at most one pending deadline: the answer window of the
//! current question, or one of Creator Studio's phase windows. The actor
//! delivers deadlines to itself as [`Alarm`] commands from a spawned
//! sleep task, which means an alarm can already be sitting in the command
//! queue when the phase it belonged to ends. [`PhaseTimer`] guards
//! against that with a generation counter: every arm (and every disarm)
//! bumps the generation, and an alarm carrying a stale generation is
//! dropped on arrival.

use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;

use quizforge_protocol::StudioPhase;

/// What a fired deadline means to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alarm {
    /// The answer window of the current question ran out.
    QuestionTimeout,
    /// A Creator Studio phase window ran out. Carries the phase the
    /// alarm was armed for, so a stale alarm can be recognized even if
    /// the generation check were ever bypassed.
    StudioPhase(StudioPhase),
}

/// One-shot deadline guard for the room's current phase.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    generation: u64,
    handle: Option<AbortHandle>,
}

impl PhaseTimer {
    /// Cancels any pending sleep, advances to a fresh generation and
    /// returns it. The caller schedules the sleep task itself and hands
    /// its abort handle back through [`PhaseTimer::attach`].
    pub fn arm(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;
        self.generation
    }

    /// Attaches the abort handle of the sleep task backing the current
    /// generation.
    pub fn attach(&mut self, handle: AbortHandle) {
        self.cancel();
        self.handle = Some(handle);
    }

    /// Cancels any pending sleep and invalidates alarms already queued
    /// for the current generation. Aborting the sleep task is not
    /// enough on its own: the alarm may have been sent before the abort
    /// landed.
    pub fn disarm(&mut self) {
        self.cancel();
        self.generation += 1;
    }

    /// Whether an alarm with the given generation is still current.
    pub fn accepts(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// The current generation, mostly useful in tests.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
