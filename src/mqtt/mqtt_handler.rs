//! Session worker owning one rumqttc client and its event loop.
//!
//! A worker lives for exactly one connect attempt. It reads the certificate
//! files, opens the TLS session, keeps polling (and so reconnecting) until its
//! cancellation token fires, and reports everything it sees as
//! [`SessionEvent`]s tagged with its generation.

use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, StateError,
    Transport,
};
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::message_manager::{topic_matches, MQTTMessage, SessionEvent, SessionUpdate};
use crate::tracker::credentials::{CredentialBlobs, CredentialError, CredentialFiles};

/// Upper bound for flushing the DISCONNECT packet on shutdown.
const DISCONNECT_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);
const REQUEST_CHANNEL_CAPACITY: usize = 10;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error => "Error",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Subscribe to {topic} failed: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: rumqttc::ClientError,
    },

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

#[derive(Clone, Debug, Default)]
pub struct MQTTStatus {
    pub connection_state: ConnectionState,
    pub messages_received: usize,
    pub messages_filtered: usize,
    pub messages_dropped: usize,
    pub last_activity: Option<chrono::DateTime<chrono::Local>>,
}

pub struct MqttHandler {
    generation: u64,
    config: SessionConfig,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
    status: MQTTStatus,
}

impl MqttHandler {
    pub fn new(
        generation: u64,
        config: SessionConfig,
        events: mpsc::Sender<SessionEvent>,
        cancel: CancellationToken,
    ) -> Self {
        MqttHandler {
            generation,
            config,
            events,
            cancel,
            status: MQTTStatus::default(),
        }
    }

    /// Runs the whole session until cancelled or until setup fails.
    pub async fn run(mut self, files: CredentialFiles) {
        info!(
            "Session {} starting as {} on topic {}",
            self.generation, self.config.client_id, self.config.topic
        );

        let blobs = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("Session {} cancelled while reading certificates", self.generation);
                return;
            }
            blobs = files.read_all() => blobs,
        };
        let blobs = match blobs {
            Ok(blobs) => blobs,
            Err(e) => {
                self.fail(SessionError::from(e)).await;
                return;
            }
        };

        self.report(ConnectionState::Connecting, "Connecting to AWS IoT...")
            .await;
        let mqtt_options = self.tls_options(blobs);
        self.drive(mqtt_options).await;
    }

    /// Polls the session until cancelled, then closes it.
    async fn drive(&mut self, mqtt_options: MqttOptions) {
        let (client, mut eventloop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = eventloop.poll() => event,
            };

            if let Err(e) = self.handle_event(&client, event).await {
                if self.closed_by_broker(&e) {
                    info!("Connection closed by broker: {}", e);
                    self.status.connection_state = ConnectionState::Disconnected;
                    self.report(ConnectionState::Disconnected, "Connection closed")
                        .await;
                } else {
                    error!("Connection error: {}", e);
                    self.status.connection_state = ConnectionState::Error;
                    self.report(ConnectionState::Error, format!("Connection error: {}", e))
                        .await;
                }

                // transport-level reconnect happens on the next poll
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.config.reconnect_period) => {}
                }
            }
        }

        self.close(&client, &mut eventloop).await;
    }

    fn tls_options(&self, blobs: CredentialBlobs) -> MqttOptions {
        let mut mqtt_options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.endpoint.clone(),
            self.config.port,
        );
        mqtt_options
            .set_keep_alive(self.config.keep_alive)
            .set_clean_session(true)
            .set_transport(Transport::tls(
                blobs.root_ca,
                Some((blobs.certificate, blobs.private_key)),
                None,
            ));

        debug!(
            "Opening TLS session to {}:{}",
            self.config.endpoint, self.config.port
        );
        mqtt_options
    }

    /// An MQTT 3.1.1 broker ends a session by closing the socket, which
    /// rumqttc surfaces as an I/O error.
    fn closed_by_broker(&self, error: &SessionError) -> bool {
        if self.status.connection_state != ConnectionState::Connected {
            return false;
        }
        let io_error = match error {
            SessionError::Connection(ConnectionError::MqttState(StateError::Io(e)))
            | SessionError::Connection(ConnectionError::Io(e)) => e,
            _ => return false,
        };
        matches!(
            io_error.kind(),
            io::ErrorKind::ConnectionAborted
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::UnexpectedEof
        )
    }

    async fn handle_event(
        &mut self,
        client: &AsyncClient,
        event: Result<Event, ConnectionError>,
    ) -> Result<(), SessionError> {
        match event? {
            Event::Incoming(Packet::ConnAck(ack)) => {
                info!("Connected to AWS IoT ({:?})", ack.code);
                client
                    .try_subscribe(self.config.topic.clone(), QoS::AtMostOnce)
                    .map_err(|source| SessionError::Subscribe {
                        topic: self.config.topic.clone(),
                        source,
                    })?;
                self.status.connection_state = ConnectionState::Connected;
                self.report(ConnectionState::Connected, "Connected to AWS IoT")
                    .await;
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                debug!("Subscription acknowledged: {:?}", ack.return_codes);
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.status.last_activity = Some(chrono::Local::now());
                if !topic_matches(&self.config.topic, &publish.topic) {
                    self.status.messages_filtered += 1;
                    debug!("Dropping message on unsubscribed topic {}", publish.topic);
                    return Ok(());
                }
                self.status.messages_received += 1;
                let msg = MQTTMessage::from_topic(publish.topic, publish.payload.to_vec());
                self.forward(msg);
            }
            other => debug!("MQTT event: {:?}", other),
        }
        Ok(())
    }

    /// Sends DISCONNECT and drives the event loop until it is written out.
    async fn close(&mut self, client: &AsyncClient, eventloop: &mut EventLoop) {
        info!(
            "Session {} closing after {} messages ({} filtered, {} dropped), last activity {:?}",
            self.generation,
            self.status.messages_received,
            self.status.messages_filtered,
            self.status.messages_dropped,
            self.status.last_activity
        );
        if self.status.connection_state != ConnectionState::Connected {
            return;
        }

        if let Err(e) = client.try_disconnect() {
            warn!("Error disconnecting: {}", e);
            return;
        }

        let flush = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Error disconnecting: {}", e);
                        break;
                    }
                }
            }
        };
        if tokio::time::timeout(DISCONNECT_FLUSH_TIMEOUT, flush)
            .await
            .is_err()
        {
            warn!("Timed out flushing disconnect");
        }
    }

    async fn fail(&mut self, error: SessionError) {
        error!("Failed to connect: {}", error);
        self.status.connection_state = ConnectionState::Error;
        self.report(ConnectionState::Error, format!("Failed to connect: {}", error))
            .await;
    }

    async fn report(&self, state: ConnectionState, status: impl Into<String>) {
        self.send(SessionUpdate::State {
            state,
            status: status.into(),
        })
        .await;
    }

    /// Hands a message to the UI without blocking the event loop.
    fn forward(&mut self, msg: MQTTMessage) {
        let event = SessionEvent {
            generation: self.generation,
            update: SessionUpdate::Message(msg),
        };
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.status.messages_dropped += 1;
                warn!("UI is not draining session events, dropping message");
            }
            Err(TrySendError::Closed(_)) => debug!("UI gone, dropping session event"),
        }
    }

    async fn send(&self, update: SessionUpdate) {
        let event = SessionEvent {
            generation: self.generation,
            update,
        };
        if self.events.send(event).await.is_err() {
            debug!("UI gone, dropping session event");
        }
    }
}
