//! Bounded query repair state machine
//!
//! ```text
//! Initial --Generated--> Executing --Succeeded--> Success
//!                            |
//!                          Failed
//!                            |
//!            budget left? --yes--> Regenerating --Generated--> Executing
//!                            |
//!                            no --> GaveUp
//! ```
//!
//! The cap is carried by value in [`RepairBudget`]: every failed attempt
//! spends one unit, and a spent budget leaves no path back to `Executing`.
//! With the maximum budget of two repairs a question sees at most three
//! executions. Attempts that never reached the store are kept in the trace
//! but are not counted as executed repairs.

use super::result::{QueryAttempt, QueryResult};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Hard cap on repairs after the initial attempt
pub const MAX_REPAIRS: u8 = 2;

/// Remaining repair allowance, passed by value through the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairBudget {
    remaining: u8,
}

impl RepairBudget {
    /// Budget of `max` repairs; anything above [`MAX_REPAIRS`] is rejected
    pub fn new(max: u8) -> Result<Self, DomainError> {
        if max > MAX_REPAIRS {
            return Err(DomainError::RepairBudgetTooLarge {
                requested: max,
                cap: MAX_REPAIRS,
            });
        }
        Ok(Self { remaining: max })
    }

    pub fn full() -> Self {
        Self {
            remaining: MAX_REPAIRS,
        }
    }

    pub fn remaining(self) -> u8 {
        self.remaining
    }

    /// Consume one repair, or `None` when nothing is left
    pub fn spend(self) -> Option<Self> {
        self.remaining.checked_sub(1).map(|remaining| Self { remaining })
    }
}

impl Default for RepairBudget {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairEvent {
    /// A query was produced (initial or repaired)
    Generated,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairState {
    Initial { budget: RepairBudget },
    Executing { attempt: u8, budget: RepairBudget },
    Regenerating { attempt: u8, budget: RepairBudget },
    Success { attempt: u8 },
    GaveUp { attempt: u8 },
}

impl RepairState {
    pub fn start(budget: RepairBudget) -> Self {
        RepairState::Initial { budget }
    }

    /// Apply an event. Events that make no sense in the current state are
    /// reported rather than ignored.
    pub fn next(self, event: RepairEvent) -> Result<Self, DomainError> {
        use RepairEvent::*;
        use RepairState::*;

        match (self, event) {
            (Initial { budget }, Generated) => Ok(Executing { attempt: 0, budget }),
            (Regenerating { attempt, budget }, Generated) => Ok(Executing { attempt, budget }),
            (Executing { attempt, .. }, Succeeded) => Ok(Success { attempt }),
            (Executing { attempt, budget }, Failed) => Ok(match budget.spend() {
                Some(budget) => Regenerating {
                    attempt: attempt + 1,
                    budget,
                },
                None => GaveUp { attempt },
            }),
            (state, event) => Err(DomainError::OrchestrationError(format!(
                "invalid repair transition: {event:?} in {state:?}"
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RepairState::Success { .. } | RepairState::GaveUp { .. })
    }

    /// Index of the current (or last) attempt
    pub fn attempt(&self) -> u8 {
        match self {
            RepairState::Initial { .. } => 0,
            RepairState::Executing { attempt, .. }
            | RepairState::Regenerating { attempt, .. }
            | RepairState::Success { attempt }
            | RepairState::GaveUp { attempt } => *attempt,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RepairState::Initial { .. } => "initial",
            RepairState::Executing { .. } => "executing",
            RepairState::Regenerating { .. } => "regenerating",
            RepairState::Success { .. } => "success",
            RepairState::GaveUp { .. } => "gave_up",
        }
    }
}

/// One attempt with its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairStep {
    pub attempt: QueryAttempt,
    pub result: QueryResult,
    /// False when the attempt failed before reaching the store
    #[serde(default = "executed_default")]
    pub executed: bool,
}

fn executed_default() -> bool {
    true
}

/// Ordered record of attempts for one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairTrace {
    steps: Vec<RepairStep>,
}

impl RepairTrace {
    pub const MAX_STEPS: usize = 1 + MAX_REPAIRS as usize;

    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt that ran against the store. Fails once the trace
    /// holds [`Self::MAX_STEPS`] entries or after a success.
    pub fn record(
        &mut self,
        attempt: QueryAttempt,
        result: QueryResult,
    ) -> Result<(), DomainError> {
        self.push(attempt, result, true)
    }

    /// Append a failed attempt that never reached the store (no statement
    /// was produced, or it was rejected before execution).
    pub fn record_unexecuted(
        &mut self,
        attempt: QueryAttempt,
        error: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.push(attempt, QueryResult::failure(error), false)
    }

    fn push(
        &mut self,
        attempt: QueryAttempt,
        result: QueryResult,
        executed: bool,
    ) -> Result<(), DomainError> {
        if self.steps.len() >= Self::MAX_STEPS {
            return Err(DomainError::OrchestrationError(format!(
                "repair trace is full ({} attempts)",
                Self::MAX_STEPS
            )));
        }
        if self.succeeded() {
            return Err(DomainError::OrchestrationError(
                "attempt recorded after a successful query".to_string(),
            ));
        }
        self.steps.push(RepairStep {
            attempt,
            result,
            executed,
        });
        Ok(())
    }

    pub fn steps(&self) -> &[RepairStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Repairs that actually ran against the store (executed attempts
    /// after the first)
    pub fn repairs_executed(&self) -> usize {
        self.steps.iter().skip(1).filter(|s| s.executed).count()
    }

    /// Attempts that ran against the store
    pub fn executions(&self) -> usize {
        self.steps.iter().filter(|s| s.executed).count()
    }

    pub fn last(&self) -> Option<&RepairStep> {
        self.steps.last()
    }

    pub fn final_result(&self) -> Option<&QueryResult> {
        self.last().map(|s| &s.result)
    }

    pub fn final_sql(&self) -> Option<&str> {
        self.last().map(|s| s.attempt.sql.as_str())
    }

    pub fn succeeded(&self) -> bool {
        self.final_result().is_some_and(QueryResult::is_success)
    }
}
