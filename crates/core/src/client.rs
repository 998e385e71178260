use std::collections::HashMap;

use crate::clock::ClockOffset;
use crate::config::ClientConfig;
use crate::input::CommandTracker;
use crate::net::{
    Actor, ActorId, ActorKind, Backoff, CommandKind, Greeting, Message, Outbound, ProtocolError,
    ReconnectTask, RttEstimator, ServerMessage, Session, SessionState, TransportError,
    WorldUpdate, decode,
};
use crate::presentation::{ActorRegistry, ConnectionStatus, StatusIndicator};
use crate::snapshot::{Snapshot, SnapshotBuffer, interpolate, render_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    AwaitingData,
    Live,
}

#[derive(Debug, Clone)]
pub struct SyncStats {
    pub session_state: SessionState,
    pub connection_attempts: u64,
    pub buffered_snapshots: usize,
    pub known_actors: usize,
    pub unconfirmed_commands: usize,
    pub srtt_ms: Option<f64>,
    pub render_delay_ms: f64,
    pub clock_offset_ms: Option<f64>,
}

pub struct SyncClient<P> {
    config: ClientConfig,
    session: Session,
    presenter: P,
    roster: HashMap<ActorId, ActorKind>,
    own_id: Option<ActorId>,
    clock_offset: Option<ClockOffset>,
    snapshots: SnapshotBuffer,
    commands: CommandTracker,
    rtt: RttEstimator,
    phase: RenderPhase,
    status: Option<ConnectionStatus>,
}

impl<P: ActorRegistry + StatusIndicator> SyncClient<P> {
    pub fn new(config: ClientConfig, presenter: P) -> Self {
        let session = Session::new(
            config.server_url.clone(),
            Backoff::new(config.min_wait_ms, config.max_wait_ms),
        );
        let snapshots = SnapshotBuffer::new(config.interpolation.max_buffer_snapshots);

        Self {
            config,
            session,
            presenter,
            roster: HashMap::new(),
            own_id: None,
            clock_offset: None,
            snapshots,
            commands: CommandTracker::new(),
            rtt: RttEstimator::new(),
            phase: RenderPhase::AwaitingData,
            status: None,
        }
    }

    pub fn begin_connect(&mut self) -> bool {
        self.session.open()
    }

    pub fn on_open(&mut self) {
        self.session.on_open();
        self.phase = RenderPhase::AwaitingData;
        self.set_status(ConnectionStatus::Connected);
    }

    pub fn on_close(&mut self) -> Option<ReconnectTask> {
        self.set_status(ConnectionStatus::Reconnecting);

        self.snapshots.clear();
        self.clock_offset = None;
        self.own_id = None;
        self.commands.clear_unconfirmed();

        self.session.on_close()
    }

    pub fn on_transport_error(&mut self, error: &TransportError) -> Option<ReconnectTask> {
        log::warn!("Transport error: {}", error);
        self.set_status(ConnectionStatus::Lost);

        for id in self.roster.keys() {
            self.presenter.remove_actor(id);
        }
        self.roster.clear();

        self.on_close()
    }

    pub fn on_frame(
        &mut self,
        frame: &str,
        now_ms: f64,
    ) -> Result<Option<Outbound>, ProtocolError> {
        let message = decode(frame)?;
        Ok(self.dispatch(message, now_ms))
    }

    pub fn dispatch(&mut self, message: Message, now_ms: f64) -> Option<Outbound> {
        match message.body {
            ServerMessage::Greeting(greeting) => {
                self.handle_greeting(greeting, message.server_time, now_ms);
                None
            }
            ServerMessage::Spawn(actor) => {
                self.spawn(actor);
                None
            }
            ServerMessage::Despawn(id) => {
                self.despawn(&id);
                None
            }
            ServerMessage::WorldUpdate(update) => {
                self.handle_world_update(update, message.server_time, now_ms);
                None
            }
            ServerMessage::Ping(token) => self.send(Outbound::PingEcho(token)),
        }
    }

    fn handle_greeting(&mut self, greeting: Greeting, server_time: Option<f64>, now_ms: f64) {
        log::info!(
            "Greeted as {} with {} actors present",
            greeting.own_id,
            greeting.actors.len()
        );
        self.own_id = Some(greeting.own_id);

        match (self.clock_offset, server_time) {
            (None, Some(server_time)) => {
                let offset = ClockOffset::estimate(now_ms, server_time);
                log::debug!("Clock offset {:.1} ms", offset.offset_ms());
                self.clock_offset = Some(offset);
            }
            (Some(_), Some(_)) => log::warn!("Repeated greeting; keeping clock offset"),
            (_, None) => {}
        }

        for actor in greeting.actors {
            self.spawn(actor);
        }
    }

    fn handle_world_update(&mut self, update: WorldUpdate, server_time: Option<f64>, now_ms: f64) {
        let timestamp = match (server_time, self.clock_offset) {
            (Some(server_time), Some(offset)) => offset.to_local(server_time),
            _ => now_ms,
        };
        self.snapshots.push(Snapshot::new(timestamp, update.actors));

        if let Some(last_input) = update.last_input {
            if let Some(retired) = self.commands.acknowledge(last_input) {
                if retired.command.id == last_input {
                    self.rtt.record(now_ms - retired.sent_at_ms);
                }
            }
        }
    }

    fn spawn(&mut self, actor: Actor) {
        if self.roster.contains_key(&actor.id) {
            self.presenter.remove_actor(&actor.id);
        }
        self.presenter.spawn_actor(&actor);
        self.roster.insert(actor.id, actor.kind);
    }

    fn despawn(&mut self, id: &ActorId) {
        if self.roster.remove(id).is_some() {
            self.presenter.remove_actor(id);
        } else {
            log::warn!("Despawn for unknown actor {}", id);
        }
    }

    pub fn on_control(&mut self, kind: CommandKind, active: bool, now_ms: f64) -> Option<Outbound> {
        let command = self.commands.on_edge_event(kind, active, now_ms)?;
        self.send(Outbound::Command(command))
    }

    fn send(&self, outbound: Outbound) -> Option<Outbound> {
        if self.session.can_send() {
            Some(outbound)
        } else {
            log::debug!("Dropping {:?} while {:?}", outbound, self.session.state());
            None
        }
    }

    pub fn render_delay_ms(&self) -> f64 {
        self.config.interpolation.delay.delay_ms(self.rtt.srtt_ms())
    }

    pub fn render_tick(&mut self, now_ms: f64) -> Option<Snapshot> {
        let target = render_time(now_ms, self.render_delay_ms());

        let state = match self.snapshots.bracket(target) {
            Some((from, to)) => interpolate(from, to, target),
            None => {
                if self.phase == RenderPhase::AwaitingData
                    && !matches!(
                        self.status,
                        Some(ConnectionStatus::Reconnecting | ConnectionStatus::Lost)
                    )
                {
                    self.set_status(ConnectionStatus::Connecting);
                }
                return None;
            }
        };

        if self.phase == RenderPhase::AwaitingData {
            self.phase = RenderPhase::Live;
            self.set_status(ConnectionStatus::Connected);
        }

        for (id, actor) in &state.actors {
            if self.roster.contains_key(id) {
                self.presenter.place_actor(id, actor);
                self.presenter.set_blur(id, actor.velocity);
            }
        }

        Some(state)
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != Some(status) {
            self.status = Some(status);
            self.presenter.set_status(status);
        }
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            session_state: self.session.state(),
            connection_attempts: self.session.attempts(),
            buffered_snapshots: self.snapshots.len(),
            known_actors: self.roster.len(),
            unconfirmed_commands: self.commands.unconfirmed_len(),
            srtt_ms: self.rtt.srtt_ms(),
            render_delay_ms: self.render_delay_ms(),
            clock_offset_ms: self.clock_offset.map(|offset| offset.offset_ms()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn own_id(&self) -> Option<&ActorId> {
        self.own_id.as_ref()
    }

    pub fn clock_offset(&self) -> Option<ClockOffset> {
        self.clock_offset
    }

    pub fn snapshots(&self) -> &SnapshotBuffer {
        &self.snapshots
    }

    pub fn commands(&self) -> &CommandTracker {
        &self.commands
    }

    pub fn roster(&self) -> &HashMap<ActorId, ActorKind> {
        &self.roster
    }

    pub fn rtt(&self) -> &RttEstimator {
        &self.rtt
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn status(&self) -> Option<ConnectionStatus> {
        self.status
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Vec2;

    use super::*;
    use crate::net::ActorState;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Spawn(String),
        Remove(String),
        Place(String, Vec2),
        Blur(String),
        Status(ConnectionStatus),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl ActorRegistry for Recorder {
        fn spawn_actor(&mut self, actor: &Actor) {
            self.events.push(Event::Spawn(actor.id.to_string()));
        }

        fn remove_actor(&mut self, id: &ActorId) {
            self.events.push(Event::Remove(id.to_string()));
        }

        fn place_actor(&mut self, id: &ActorId, state: &ActorState) {
            self.events.push(Event::Place(id.to_string(), state.position));
        }

        fn set_blur(&mut self, id: &ActorId, _velocity: Vec2) {
            self.events.push(Event::Blur(id.to_string()));
        }
    }

    impl StatusIndicator for Recorder {
        fn set_status(&mut self, status: ConnectionStatus) {
            self.events.push(Event::Status(status));
        }
    }

    fn open_client() -> SyncClient<Recorder> {
        let config = ClientConfig::new("ws://127.0.0.1:8081").unwrap();
        let mut client = SyncClient::new(config, Recorder::default());
        client.begin_connect();
        client.on_open();
        client.presenter_mut().events.clear();
        client
    }

    const GREETING: &str = r#"{"opcode": "Greeting", "payload": [1, [{"id": 1, "kind": "Player"}]], "server_time": 1000}"#;

    fn world_update(server_time: f64, x: f32, last_input: Option<u32>) -> String {
        let mut payload = serde_json::json!({
            "actors": {"1": {"pos": {"x": x, "y": 0}, "vel": {"x": 0, "y": 0}}}
        });
        if let Some(last_input) = last_input {
            payload["last_input"] = last_input.into();
        }
        serde_json::json!({"opcode": "WorldUpdate", "payload": payload, "server_time": server_time})
            .to_string()
    }

    #[test]
    fn test_greeting_sets_offset_and_spawns() {
        let mut client = open_client();

        assert_eq!(client.on_frame(GREETING, 1050.0).unwrap(), None);
        assert_eq!(client.own_id(), Some(&ActorId::from("1")));
        assert_eq!(client.clock_offset().unwrap().offset_ms(), 50.0);
        assert_eq!(client.presenter().events, vec![Event::Spawn("1".into())]);

        client.on_frame(&world_update(1100.0, 0.0, None), 1200.0).unwrap();
        assert_eq!(client.snapshots().latest().unwrap().timestamp, 1150.0);
    }

    #[test]
    fn test_world_update_without_offset_uses_arrival_time() {
        let mut client = open_client();
        client.on_frame(&world_update(1100.0, 0.0, None), 777.0).unwrap();
        assert_eq!(client.snapshots().latest().unwrap().timestamp, 777.0);
    }

    #[test]
    fn test_render_interpolates_between_updates() {
        let mut client = open_client();
        client.on_frame(GREETING, 1000.0).unwrap();
        client.on_frame(&world_update(1000.0, 0.0, None), 1000.0).unwrap();
        client.on_frame(&world_update(1100.0, 10.0, None), 1100.0).unwrap();
        client.presenter_mut().events.clear();

        let delay = client.render_delay_ms();
        let state = client.render_tick(1050.0 + delay).unwrap();

        assert_eq!(
            state.actor(&ActorId::from("1")).unwrap().position,
            Vec2::new(5.0, 0.0)
        );
        assert_eq!(client.phase(), RenderPhase::Live);
        assert_eq!(
            client.presenter().events,
            vec![
                Event::Place("1".into(), Vec2::new(5.0, 0.0)),
                Event::Blur("1".into()),
            ]
        );
    }

    #[test]
    fn test_render_defers_until_bracket() {
        let mut client = open_client();
        assert!(client.render_tick(5000.0).is_none());
        assert_eq!(client.status(), Some(ConnectionStatus::Connecting));

        client.on_frame(&world_update(0.0, 0.0, None), 1000.0).unwrap();
        assert!(client.render_tick(5000.0).is_none());
        assert_eq!(client.phase(), RenderPhase::AwaitingData);
    }

    #[test]
    fn test_world_update_prunes_commands() {
        let mut client = open_client();
        for i in 0..8 {
            client.on_control(CommandKind::MoveUp, i % 2 == 0, 100.0);
        }

        client.on_frame(&world_update(0.0, 0.0, Some(5)), 140.0).unwrap();

        let ids: Vec<u32> = client.commands().unconfirmed().map(|c| c.id).collect();
        assert_eq!(ids, vec![6, 7]);
        assert_eq!(client.rtt().srtt_ms(), Some(40.0));
    }

    #[test]
    fn test_commands_dropped_unless_open() {
        let config = ClientConfig::new("ws://127.0.0.1:8081").unwrap();
        let mut client = SyncClient::new(config, Recorder::default());

        assert_eq!(client.on_control(CommandKind::MoveDown, true, 0.0), None);
        assert_eq!(client.commands().unconfirmed_len(), 1);

        let mut client = open_client();
        let outbound = client.on_control(CommandKind::MoveDown, true, 0.0).unwrap();
        assert!(matches!(outbound, Outbound::Command(c) if c.id == 0 && c.active));
        assert_eq!(client.on_control(CommandKind::MoveDown, true, 1.0), None);
    }

    #[test]
    fn test_ping_echoed_verbatim() {
        let mut client = open_client();
        let reply = client
            .on_frame(r#"{"opcode": "Ping", "payload": ["", 12]}"#, 0.0)
            .unwrap();
        assert_eq!(
            reply,
            Some(Outbound::PingEcho(serde_json::json!(["", 12])))
        );
    }

    #[test]
    fn test_unknown_opcode_keeps_session_open() {
        let mut client = open_client();
        assert!(client.on_frame(r#"{"opcode": "Nope", "payload": 1}"#, 0.0).is_err());
        assert_eq!(client.session().state(), SessionState::Open);
    }

    #[test]
    fn test_spawn_and_despawn() {
        let mut client = open_client();
        client
            .on_frame(r#"{"opcode": "Spawn", "payload": {"id": "b", "kind": "Ball"}}"#, 0.0)
            .unwrap();
        assert_eq!(client.roster().get(&ActorId::from("b")), Some(&ActorKind::Ball));

        client
            .on_frame(r#"{"opcode": "Despawn", "payload": "b"}"#, 0.0)
            .unwrap();
        client
            .on_frame(r#"{"opcode": "Despawn", "payload": "b"}"#, 0.0)
            .unwrap();

        assert!(client.roster().is_empty());
        assert_eq!(
            client.presenter().events,
            vec![Event::Spawn("b".into()), Event::Remove("b".into())]
        );
    }

    #[test]
    fn test_error_tears_down_actors_and_schedules_reconnect() {
        let mut client = open_client();
        client.on_frame(GREETING, 1050.0).unwrap();
        client.presenter_mut().events.clear();

        let error = TransportError::ConnectTimeout(Duration::from_secs(5));
        let task = client.on_transport_error(&error).unwrap();

        assert_eq!(task.delay.as_millis(), 100);
        assert!(client.roster().is_empty());
        assert!(client.own_id().is_none());
        assert!(client.clock_offset().is_none());
        assert_eq!(
            client.presenter().events,
            vec![
                Event::Status(ConnectionStatus::Lost),
                Event::Remove("1".into()),
                Event::Status(ConnectionStatus::Reconnecting),
            ]
        );

        // A close following the error does not queue a second reconnect.
        assert!(client.on_close().is_none());
        assert_eq!(client.session().state(), SessionState::Disconnected);

        // Reconnecting keeps the indicator on the reconnect text.
        assert!(client.render_tick(10_000.0).is_none());
        assert_eq!(client.status(), Some(ConnectionStatus::Reconnecting));
    }

    #[test]
    fn test_close_keeps_actors() {
        let mut client = open_client();
        client.on_frame(GREETING, 1050.0).unwrap();

        client.on_close();
        assert_eq!(client.roster().len(), 1);

        client.begin_connect();
        client.on_open();
        client.presenter_mut().events.clear();

        // Greeting on the new session replaces the stale visual.
        client.on_frame(GREETING, 2050.0).unwrap();
        assert_eq!(client.clock_offset().unwrap().offset_ms(), 1050.0);
        assert_eq!(
            client.presenter().events,
            vec![Event::Remove("1".into()), Event::Spawn("1".into())]
        );
    }
}
