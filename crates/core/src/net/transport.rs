use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::client::SyncClient;
use crate::clock::LocalClock;
use crate::presentation::{ActorRegistry, StatusIndicator};

use super::protocol::{CommandKind, Outbound};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("socket error: {0}")]
    Socket(#[source] tungstenite::Error),
    #[error("no connection after {0:?}")]
    ConnectTimeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub kind: CommandKind,
    pub active: bool,
}

enum SessionEnd {
    Closed,
    Failed(TransportError),
    Shutdown,
}

pub struct Transport<P> {
    client: SyncClient<P>,
    clock: LocalClock,
    controls: mpsc::UnboundedReceiver<ControlEvent>,
}

impl<P: ActorRegistry + StatusIndicator> Transport<P> {
    pub fn new(client: SyncClient<P>, controls: mpsc::UnboundedReceiver<ControlEvent>) -> Self {
        Self {
            client,
            clock: LocalClock::new(),
            controls,
        }
    }

    pub async fn run(mut self) -> SyncClient<P> {
        let mut ticker = tokio::time::interval(self.client.config().render_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            self.client.begin_connect();
            let url = self.client.config().server_url.clone();
            let limit = self.client.config().connect_timeout;
            let connect = async move {
                match tokio::time::timeout(limit, connect_async(url)).await {
                    Ok(Ok((socket, _response))) => Ok(socket),
                    Ok(Err(error)) => Err(TransportError::Connect(error)),
                    Err(_) => Err(TransportError::ConnectTimeout(limit)),
                }
            };

            let Some(connected) = self.idle_while(&mut ticker, connect).await else {
                return self.client;
            };

            match connected {
                Ok(socket) => {
                    self.client.on_open();
                    // The socket is consumed here and dropped before the
                    // client hears about the close.
                    match self.serve(socket, &mut ticker).await {
                        SessionEnd::Closed => {
                            self.client.on_close();
                        }
                        SessionEnd::Failed(error) => {
                            self.client.on_transport_error(&error);
                        }
                        SessionEnd::Shutdown => return self.client,
                    }
                }
                Err(error) => {
                    self.client.on_transport_error(&error);
                }
            }

            let delay = self
                .client
                .session()
                .pending_reconnect()
                .map_or(Duration::ZERO, |task| task.delay);
            if self
                .idle_while(&mut ticker, tokio::time::sleep(delay))
                .await
                .is_none()
            {
                return self.client;
            }
        }
    }

    async fn idle_while<F: Future>(&mut self, ticker: &mut Interval, future: F) -> Option<F::Output> {
        tokio::pin!(future);

        loop {
            tokio::select! {
                output = &mut future => return Some(output),
                _ = ticker.tick() => self.render(),
                event = self.controls.recv() => match event {
                    Some(event) => {
                        let now = self.clock.now_ms();
                        let reply = self.client.on_control(event.kind, event.active, now);
                        if let Some(outbound) = reply {
                            log::warn!("No socket to send {:?} on", outbound);
                        }
                    }
                    None => return None,
                },
            }
        }
    }

    async fn serve(&mut self, mut socket: Socket, ticker: &mut Interval) -> SessionEnd {
        loop {
            let outbound = tokio::select! {
                frame = socket.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        let now = self.clock.now_ms();
                        match self.client.on_frame(text.as_str(), now) {
                            Ok(reply) => reply,
                            Err(error) => {
                                log::warn!("Discarding frame: {}", error);
                                None
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return SessionEnd::Closed,
                    Some(Ok(_)) => None,
                    Some(Err(error)) => return SessionEnd::Failed(TransportError::Socket(error)),
                },
                _ = ticker.tick() => {
                    self.render();
                    None
                }
                event = self.controls.recv() => match event {
                    Some(event) => {
                        let now = self.clock.now_ms();
                        self.client.on_control(event.kind, event.active, now)
                    }
                    None => {
                        if let Err(error) = socket.close(None).await {
                            log::debug!("Close handshake failed: {}", error);
                        }
                        return SessionEnd::Shutdown;
                    }
                },
            };

            if let Some(outbound) = outbound {
                if let Err(error) = deliver(&mut socket, &outbound).await {
                    return SessionEnd::Failed(error);
                }
            }
        }
    }

    fn render(&mut self) {
        let now = self.clock.now_ms();
        self.client.render_tick(now);
    }
}

async fn deliver(socket: &mut Socket, outbound: &Outbound) -> Result<(), TransportError> {
    let text = match outbound.encode() {
        Ok(text) => text,
        Err(error) => {
            log::warn!("Not sending {:?}: {}", outbound, error);
            return Ok(());
        }
    };
    socket
        .send(WsMessage::Text(text.into()))
        .await
        .map_err(TransportError::Socket)
}
