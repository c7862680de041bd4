//! Hunt state machine.
//!
//! All lifecycle changes of an existing hunt go through [`Hunt::apply`]. The
//! permitted changes are:
//!
//! | From                          | To         | Effect                          |
//! |-------------------------------|------------|---------------------------------|
//! | `PAUSED`                      | `RUNNING`  | sets `start_time`               |
//! | `RUNNING`                     | `STOPPED`  |                                 |
//! | `PAUSED`, `RUNNING`, `STOPPED`| `ARCHIVED` | caller journals the archive     |
//! | any but `ARCHIVED`            | (same)     | description edit                |
//!
//! A hunt whose stats carry the `stopped` flag can never be started again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::id::HuntId;
use super::model::{Hunt, HuntState};

/// A single requested change to a hunt.
///
/// A description edit and a state change are separate variants, so one
/// modification applies exactly one effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HuntModification {
    /// Replace the description and leave the state alone.
    Description(String),
    /// Move the hunt to the given state.
    State(HuntState),
}

impl HuntModification {
    /// Requests a transition to `RUNNING`.
    pub fn start() -> Self {
        Self::State(HuntState::Running)
    }

    /// Requests a transition to `STOPPED`.
    pub fn stop() -> Self {
        Self::State(HuntState::Stopped)
    }

    /// Requests a transition to `ARCHIVED`.
    pub fn archive() -> Self {
        Self::State(HuntState::Archived)
    }

    /// Requests a description edit.
    pub fn describe(description: impl Into<String>) -> Self {
        Self::Description(description.into())
    }
}

/// What a successfully applied modification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// The description was replaced.
    DescriptionChanged,
    /// The hunt moved to `RUNNING`.
    Started,
    /// The hunt moved to `STOPPED`.
    Stopped,
    /// The hunt moved to `ARCHIVED`.
    Archived,
}

impl TransitionEffect {
    /// Returns the effect as a static string for logging and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DescriptionChanged => "description_changed",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Archived => "archived",
        }
    }
}

/// Reasons a modification is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid hunt state transition from {from} to {to}")]
    NotAllowed { from: HuntState, to: HuntState },

    #[error("Can not start a stopped hunt: {0}")]
    StoppedHunt(HuntId),

    #[error("Archived hunt {0} can not be modified")]
    Archived(HuntId),

    #[error("Description must not be empty")]
    EmptyDescription,

    #[error("Invalid hunt {0}: missing stats")]
    MissingStats(HuntId),
}

impl Hunt {
    /// Applies a modification in place, enforcing the transition table.
    ///
    /// On error the hunt is left untouched.
    pub fn apply(
        &mut self,
        modification: &HuntModification,
        now: DateTime<Utc>,
    ) -> Result<TransitionEffect, TransitionError> {
        let stopped = match &self.stats {
            Some(stats) => stats.stopped,
            None => return Err(TransitionError::MissingStats(self.hunt_id.clone())),
        };

        let effect = match modification {
            HuntModification::Description(description) => {
                if self.state.is_terminal() {
                    return Err(TransitionError::Archived(self.hunt_id.clone()));
                }
                if description.trim().is_empty() {
                    return Err(TransitionError::EmptyDescription);
                }
                self.description = description.clone();
                TransitionEffect::DescriptionChanged
            }
            HuntModification::State(target) => match (self.state, *target) {
                (HuntState::Paused, HuntState::Running) => {
                    if stopped {
                        return Err(TransitionError::StoppedHunt(self.hunt_id.clone()));
                    }
                    self.state = HuntState::Running;
                    self.start_time = Some(now);
                    TransitionEffect::Started
                }
                (HuntState::Running, HuntState::Stopped) => {
                    self.state = HuntState::Stopped;
                    TransitionEffect::Stopped
                }
                (
                    HuntState::Paused | HuntState::Running | HuntState::Stopped,
                    HuntState::Archived,
                ) => {
                    self.state = HuntState::Archived;
                    TransitionEffect::Archived
                }
                (HuntState::Archived, _) => {
                    return Err(TransitionError::Archived(self.hunt_id.clone()));
                }
                (from, HuntState::Running) if stopped => {
                    debug!(hunt_id = %self.hunt_id, %from, "Start requested for stopped hunt");
                    return Err(TransitionError::StoppedHunt(self.hunt_id.clone()));
                }
                (from, to) => return Err(TransitionError::NotAllowed { from, to }),
            },
        };

        Ok(effect)
    }
}
