use std::time::Duration;

use super::backoff::Backoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectTask {
    pub attempt: u64,
    pub delay: Duration,
}

#[derive(Debug)]
pub struct Session {
    address: String,
    state: SessionState,
    backoff: Backoff,
    pending_reconnect: Option<ReconnectTask>,
    attempts: u64,
}

impl Session {
    pub fn new(address: impl Into<String>, backoff: Backoff) -> Self {
        Self {
            address: address.into(),
            state: SessionState::Disconnected,
            backoff,
            pending_reconnect: None,
            attempts: 0,
        }
    }

    pub fn open(&mut self) -> bool {
        if self.state != SessionState::Disconnected {
            log::warn!("Ignoring connect request while {:?}", self.state);
            return false;
        }

        self.pending_reconnect = None;
        self.attempts += 1;
        self.state = SessionState::Connecting;
        log::info!("Connecting to {} (attempt {})", self.address, self.attempts);
        true
    }

    pub fn on_open(&mut self) {
        if self.state != SessionState::Connecting {
            log::warn!("Open event while {:?}", self.state);
        }
        self.state = SessionState::Open;
        self.backoff.reset();
        log::info!("Connected to {}", self.address);
    }

    /// `None` when a reconnect is already pending.
    pub fn on_close(&mut self) -> Option<ReconnectTask> {
        self.state = SessionState::Disconnected;

        if self.pending_reconnect.is_some() {
            return None;
        }

        let task = ReconnectTask {
            attempt: self.attempts + 1,
            delay: self.backoff.next_delay(),
        };
        log::info!(
            "Reconnecting to {} in {} ms",
            self.address,
            task.delay.as_millis()
        );
        self.pending_reconnect = Some(task);
        Some(task)
    }

    pub fn pending_reconnect(&self) -> Option<&ReconnectTask> {
        self.pending_reconnect.as_ref()
    }

    pub fn can_send(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("ws://127.0.0.1:8081", Backoff::default())
    }

    #[test]
    fn test_state_machine() {
        let mut session = session();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.can_send());

        assert!(session.open());
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(!session.can_send());
        assert!(!session.open());

        session.on_open();
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.can_send());

        let task = session.on_close().unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(task.attempt, 2);
        assert_eq!(task.delay, Duration::from_millis(100));
    }

    #[test]
    fn test_single_reconnect_slot() {
        let mut session = session();
        session.open();

        let first = session.on_close();
        assert!(first.is_some());
        assert!(session.on_close().is_none());
        assert_eq!(session.pending_reconnect(), first.as_ref());
        assert_eq!(session.backoff().current_ms(), 125.0);

        assert!(session.open());
        assert!(session.pending_reconnect().is_none());
    }

    #[test]
    fn test_backoff_grows_until_open() {
        let mut session = session();
        let mut delays = Vec::new();
        for _ in 0..3 {
            session.open();
            delays.push(session.on_close().unwrap().delay);
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(125),
                Duration::from_micros(156_250),
            ]
        );

        session.open();
        session.on_open();
        assert_eq!(session.backoff().current_ms(), 100.0);
        assert_eq!(session.on_close().unwrap().delay, Duration::from_millis(100));
    }

    #[test]
    fn test_open_consumes_pending_reconnect() {
        let mut session = session();
        session.open();
        session.on_close();
        assert!(session.pending_reconnect().is_some());

        assert!(session.open());
        assert!(session.pending_reconnect().is_none());
        assert_eq!(session.attempts(), 2);
    }
}
