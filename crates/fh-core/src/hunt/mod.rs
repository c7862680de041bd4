//! Hunt entity, identifiers, storage paths and the lifecycle state machine.

mod id;
mod model;
mod paths;
mod state;

pub use id::{HuntId, HuntIdGenerator, InvalidHuntId, RandomHuntIdGenerator, HUNT_ID_RANDOM_BYTES};
pub use model::{now_micros, ArtifactSpec, Hunt, HuntState, HuntStats, StartRequest};
pub use paths::{HuntPaths, HUNTS_NAMESPACE, HUNT_DOWNLOADS_NAMESPACE};
pub use state::{HuntModification, TransitionEffect, TransitionError};

#[cfg(test)]
pub(crate) use model::fixtures;
