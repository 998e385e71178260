use glam::Vec2;

use crate::net::{Actor, ActorId, ActorState};

pub const BLUR_THRESHOLD: f32 = 0.5;

pub trait ActorRegistry {
    fn spawn_actor(&mut self, actor: &Actor);
    fn remove_actor(&mut self, id: &ActorId);
    fn place_actor(&mut self, id: &ActorId, state: &ActorState);
    fn set_blur(&mut self, id: &ActorId, velocity: Vec2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Reconnecting,
    Lost,
    Connected,
}

impl ConnectionStatus {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Reconnecting => "Attempting to reconnect",
            Self::Lost => "Lost connection to server",
            Self::Connected => "",
        }
    }

    pub fn is_visible(&self) -> bool {
        *self != Self::Connected
    }
}

pub trait StatusIndicator {
    fn set_status(&mut self, status: ConnectionStatus);
}

pub fn motion_blur_strength(velocity: Vec2) -> f32 {
    let speed = velocity.x.abs().max(velocity.y.abs());
    (speed / 10.0).powf(1.5).atan().powi(2) - 0.2
}

pub fn motion_blur(velocity: Vec2) -> Option<f32> {
    let strength = motion_blur_strength(velocity);
    (strength > BLUR_THRESHOLD).then_some(strength)
}
