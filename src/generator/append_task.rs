//! Resumable append: one placement attempt per step.

use super::{AppendOutcome, ExitContext, GridGenerator};
use crate::candidates::Candidate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStep {
    Pending { attempts: u32 },
    Finished(AppendOutcome),
}

enum Phase {
    Resolve,
    Attempt {
        ctx: ExitContext,
        candidates: Vec<Candidate>,
        cursor: usize,
    },
    Done,
}

/// In-flight append through the exit selected when the first step ran.
///
/// Every step either fully commits or changes nothing, so dropping a task at
/// any point is safe. A task created before a clear, or whose exit stopped
/// being Open in between steps, finishes with [`AppendOutcome::NoExit`].
pub struct AppendTask {
    epoch: u64,
    attempts: u32,
    phase: Phase,
}

impl AppendTask {
    pub(crate) fn new(epoch: u64) -> Self {
        Self {
            epoch,
            attempts: 0,
            phase: Phase::Resolve,
        }
    }

    /// Overlapping attempts spent so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    pub fn step(&mut self, gen: &mut GridGenerator) -> TaskStep {
        if self.epoch != gen.epoch() {
            self.phase = Phase::Done;
            return TaskStep::Finished(AppendOutcome::NoExit);
        }
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Resolve => match gen.resolve_selected() {
                Ok(ctx) => {
                    let candidates = gen.shuffled_candidates(&ctx);
                    self.attempt(gen, ctx, candidates, 0)
                }
                Err(outcome) => TaskStep::Finished(outcome),
            },
            Phase::Attempt {
                ctx,
                candidates,
                cursor,
            } => {
                if !gen.is_exit_open(ctx.exit_index) {
                    return TaskStep::Finished(AppendOutcome::NoExit);
                }
                self.attempt(gen, ctx, candidates, cursor)
            }
            Phase::Done => TaskStep::Finished(AppendOutcome::NoExit),
        }
    }

    fn attempt(
        &mut self,
        gen: &mut GridGenerator,
        ctx: ExitContext,
        candidates: Vec<Candidate>,
        cursor: usize,
    ) -> TaskStep {
        let budget = gen.connection_tries();
        let Some(candidate) = candidates.get(cursor).filter(|_| self.attempts < budget) else {
            return TaskStep::Finished(gen.finish_exhausted(&ctx));
        };

        if let Some((origin, bounds)) = gen.try_fit(&ctx, &candidate.layout, candidate.orientation) {
            let layout = candidate.layout.clone();
            let orientation = candidate.orientation;
            return TaskStep::Finished(gen.commit_append(&ctx, layout, orientation, origin, bounds));
        }

        self.attempts += 1;
        if self.attempts >= budget || cursor + 1 >= candidates.len() {
            return TaskStep::Finished(gen.finish_exhausted(&ctx));
        }
        self.phase = Phase::Attempt {
            ctx,
            candidates,
            cursor: cursor + 1,
        };
        TaskStep::Pending {
            attempts: self.attempts,
        }
    }
}
