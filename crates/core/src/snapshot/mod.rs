mod buffer;
mod interpolation;

use std::collections::HashMap;

use crate::net::{ActorId, ActorState};

pub use buffer::{DEFAULT_MAX_SNAPSHOTS, SnapshotBuffer};
pub use interpolation::{
    DEFAULT_ADAPTIVE_BUFFER_MS, DEFAULT_LERP_RATIO, DEFAULT_UPDATE_RATE, InterpolationConfig,
    InterpolationDelay, fixed_delay_ms, interpolate, render_time,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub timestamp: f64,
    pub actors: HashMap<ActorId, ActorState>,
}

impl Snapshot {
    pub fn new(timestamp: f64, actors: HashMap<ActorId, ActorState>) -> Self {
        Self { timestamp, actors }
    }

    pub fn actor(&self, id: &ActorId) -> Option<&ActorState> {
        self.actors.get(id)
    }
}
