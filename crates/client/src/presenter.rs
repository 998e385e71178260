use std::collections::HashMap;

use glam::Vec2;

use shootr::presentation::motion_blur;
use shootr::{Actor, ActorId, ActorKind, ActorRegistry, ActorState, ConnectionStatus, StatusIndicator};

#[derive(Debug, Default)]
pub struct ConsolePresenter {
    actors: HashMap<ActorId, Placement>,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    kind: ActorKind,
    position: Vec2,
    blur: Option<f32>,
}

impl ConsolePresenter {
    #[cfg(test)]
    fn position(&self, id: &ActorId) -> Option<Vec2> {
        self.actors.get(id).map(|placement| placement.position)
    }
}

impl ActorRegistry for ConsolePresenter {
    fn spawn_actor(&mut self, actor: &Actor) {
        log::info!("Spawned {:?} {}", actor.kind, actor.id);
        self.actors.insert(
            actor.id.clone(),
            Placement {
                kind: actor.kind,
                position: Vec2::ZERO,
                blur: None,
            },
        );
    }

    fn remove_actor(&mut self, id: &ActorId) {
        if let Some(placement) = self.actors.remove(id) {
            log::info!("Removed {:?} {}", placement.kind, id);
        }
    }

    fn place_actor(&mut self, id: &ActorId, state: &ActorState) {
        let Some(placement) = self.actors.get_mut(id) else {
            return;
        };
        if placement.position != state.position {
            log::trace!(
                "{} at ({:.1}, {:.1})",
                id,
                state.position.x,
                state.position.y
            );
        }
        placement.position = state.position;
    }

    fn set_blur(&mut self, id: &ActorId, velocity: Vec2) {
        let Some(placement) = self.actors.get_mut(id) else {
            return;
        };
        let blur = motion_blur(velocity);
        if blur.is_some() != placement.blur.is_some() {
            log::debug!("{} blur {:?}", id, blur);
        }
        placement.blur = blur;
    }
}

impl StatusIndicator for ConsolePresenter {
    fn set_status(&mut self, status: ConnectionStatus) {
        if status.is_visible() {
            log::warn!("{}", status.text());
        } else {
            log::info!("Connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_placements() {
        let mut presenter = ConsolePresenter::default();
        let id = ActorId::from("1");

        presenter.place_actor(&id, &ActorState::new(Vec2::ONE, Vec2::ZERO));
        assert_eq!(presenter.position(&id), None);

        presenter.spawn_actor(&Actor::new("1", ActorKind::Player));
        presenter.place_actor(&id, &ActorState::new(Vec2::new(3.0, 4.0), Vec2::ZERO));
        presenter.set_blur(&id, Vec2::new(0.0, 40.0));
        assert_eq!(presenter.position(&id), Some(Vec2::new(3.0, 4.0)));
        assert!(presenter.actors[&id].blur.is_some());

        presenter.remove_actor(&id);
        assert_eq!(presenter.position(&id), None);
    }
}
