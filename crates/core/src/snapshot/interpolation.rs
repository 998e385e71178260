use crate::net::ActorState;

use super::buffer::DEFAULT_MAX_SNAPSHOTS;
use super::Snapshot;

pub const DEFAULT_UPDATE_RATE: u32 = 30;
pub const DEFAULT_LERP_RATIO: f64 = 2.0;
pub const DEFAULT_ADAPTIVE_BUFFER_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterpolationDelay {
    Fixed { lerp_ratio: f64, update_rate: u32 },
    Adaptive { buffer_ms: f64, fallback_ms: f64 },
}

impl Default for InterpolationDelay {
    fn default() -> Self {
        Self::Fixed {
            lerp_ratio: DEFAULT_LERP_RATIO,
            update_rate: DEFAULT_UPDATE_RATE,
        }
    }
}

impl InterpolationDelay {
    pub fn delay_ms(&self, srtt_ms: Option<f64>) -> f64 {
        match *self {
            Self::Fixed {
                lerp_ratio,
                update_rate,
            } => fixed_delay_ms(lerp_ratio, update_rate),
            Self::Adaptive {
                buffer_ms,
                fallback_ms,
            } => srtt_ms.map_or(fallback_ms, |rtt| rtt + buffer_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterpolationConfig {
    pub delay: InterpolationDelay,
    pub max_buffer_snapshots: usize,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            delay: InterpolationDelay::default(),
            max_buffer_snapshots: DEFAULT_MAX_SNAPSHOTS,
        }
    }
}

pub fn fixed_delay_ms(lerp_ratio: f64, update_rate: u32) -> f64 {
    (lerp_ratio * 1000.0 / update_rate.max(1) as f64).floor()
}

pub fn render_time(now_ms: f64, delay_ms: f64) -> f64 {
    now_ms - delay_ms
}

/// Always a fresh snapshot. Actors only in `to` are left out.
pub fn interpolate(from: &Snapshot, to: &Snapshot, render_time: f64) -> Snapshot {
    let total = to.timestamp - from.timestamp;
    let progress = render_time - from.timestamp;
    if total == 0.0 || progress == 0.0 {
        return from.clone();
    }

    let fraction = (progress / total) as f32;
    let actors = from
        .actors
        .iter()
        .map(|(id, state)| {
            let blended = match to.actors.get(id) {
                Some(target) => lerp_state(state, target, fraction),
                None => *state,
            };
            (id.clone(), blended)
        })
        .collect();

    Snapshot::new(render_time, actors)
}

fn lerp_state(from: &ActorState, to: &ActorState, t: f32) -> ActorState {
    ActorState {
        position: from.position + (to.position - from.position) * t,
        velocity: from.velocity + (to.velocity - from.velocity) * t,
    }
}
