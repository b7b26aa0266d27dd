//! UI-side owner of the MQTT session.
//!
//! The manager is the only thing holding the session worker's handle. The UI
//! calls [`ConnectionManager::toggle`] from the button or the shortcut and
//! drains [`ConnectionManager::poll_events`] once per frame; no other component
//! touches the session.

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::message_manager::{MQTTMessage, SessionEvent, SessionUpdate};
use super::mqtt_handler::{ConnectionState, MqttHandler};
use crate::tracker::credentials::CredentialStore;
use crate::tracker::input::NEED_CREDENTIALS;

const EVENT_CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A new session worker was started
    Connecting,
    /// The running session was asked to close
    Disconnected,
    /// A connect attempt is already in flight, nothing changed
    AlreadyConnecting,
    /// Not all certificate files are loaded, nothing changed
    NotReady,
}

impl ToggleOutcome {
    /// Status line to show for this outcome, if it changes the status.
    pub fn status(self) -> Option<&'static str> {
        match self {
            ToggleOutcome::Connecting => Some("Reading certificates..."),
            ToggleOutcome::Disconnected => Some("Disconnected from AWS IoT"),
            ToggleOutcome::AlreadyConnecting => None,
            ToggleOutcome::NotReady => Some(NEED_CREDENTIALS),
        }
    }
}

/// Something the UI has to act on after draining the session events.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Status(String),
    Message(MQTTMessage),
}

struct SessionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct ConnectionManager {
    runtime: Handle,
    state: ConnectionState,
    generation: u64,
    session: Option<SessionHandle>,
    subscribed_topic: Option<String>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
}

impl ConnectionManager {
    pub fn new(runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        ConnectionManager {
            runtime,
            state: ConnectionState::Disconnected,
            generation: 0,
            session: None,
            subscribed_topic: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Topic captured by the last connect attempt.
    pub fn subscribed_topic(&self) -> Option<&str> {
        self.subscribed_topic.as_deref()
    }

    /// Connects when idle, disconnects when connected.
    ///
    /// `topic` is only read when a new session starts.
    pub fn toggle(&mut self, credentials: &CredentialStore, topic: &str) -> ToggleOutcome {
        match self.state {
            ConnectionState::Connected => {
                self.disconnect();
                ToggleOutcome::Disconnected
            }
            ConnectionState::Connecting => {
                debug!("Toggle ignored, connect attempt in flight");
                ToggleOutcome::AlreadyConnecting
            }
            ConnectionState::Disconnected | ConnectionState::Error => {
                self.connect(credentials, topic)
            }
        }
    }

    fn connect(&mut self, credentials: &CredentialStore, topic: &str) -> ToggleOutcome {
        let Some(files) = credentials.files() else {
            warn!("Connect requested without a full set of certificates");
            return ToggleOutcome::NotReady;
        };

        // an errored session may still be retrying in the background
        self.stop_session();
        self.generation += 1;

        let config = SessionConfig::aws_iot(topic);
        info!(
            "Starting session {} for topic {}",
            self.generation, config.topic
        );
        self.subscribed_topic = Some(config.topic.clone());

        let cancel = CancellationToken::new();
        let handler = MqttHandler::new(
            self.generation,
            config,
            self.events_tx.clone(),
            cancel.clone(),
        );
        let task = self.runtime.spawn(handler.run(files));

        self.session = Some(SessionHandle { cancel, task });
        self.state = ConnectionState::Connecting;
        ToggleOutcome::Connecting
    }

    fn disconnect(&mut self) {
        self.stop_session();
        // anything the old worker still emits belongs to a dead session
        self.generation += 1;
        self.state = ConnectionState::Disconnected;
        info!("Disconnected from AWS IoT");
    }

    fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            if session.task.is_finished() {
                debug!("Previous session worker already finished");
            }
        }
    }

    /// Applies pending worker events and returns what the UI has to show.
    pub fn poll_events(&mut self) -> Vec<SessionNotice> {
        let mut notices = Vec::new();

        while let Ok(event) = self.events_rx.try_recv() {
            if event.generation != self.generation {
                debug!(
                    "Dropping event from stale session {} (current {})",
                    event.generation, self.generation
                );
                continue;
            }

            match event.update {
                SessionUpdate::State { state, status } => {
                    debug!("Session state {} -> {}", self.state, state);
                    self.state = state;
                    notices.push(SessionNotice::Status(status));
                }
                SessionUpdate::Message(msg) => notices.push(SessionNotice::Message(msg)),
            }
        }

        notices
    }
}

#[cfg(test)]
impl ConnectionManager {
    /// Queues `update` as if the current session worker had sent it.
    pub(crate) fn inject_update(&self, update: SessionUpdate) {
        self.events_tx
            .try_send(SessionEvent {
                generation: self.generation,
                update,
            })
            .expect("event channel full");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop_session();
    }
}
