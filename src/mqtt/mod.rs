//! # MQTT Integration Module
//!
//! Connects the tracker to AWS IoT Core over MQTT with mutual TLS and relays
//! position messages back to the UI thread.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── config.rs              - Fixed endpoint, timings and client id generation
//! ├── connection_manager.rs  - UI-side owner of the session, connect/disconnect toggle
//! ├── message_manager.rs     - Message and event types, topic filter matching
//! └── mqtt_handler.rs        - Session worker: certificates, TLS, event loop
//! ```
//!
//! ## Threading
//!
//! The UI thread owns the [`connection_manager::ConnectionManager`]. Each
//! connect attempt spawns one [`mqtt_handler::MqttHandler`] task on the tokio
//! runtime, which owns the rumqttc client and event loop exclusively. The two
//! sides only talk through an mpsc channel of [`message_manager::SessionEvent`]s
//! and a cancellation token, so the UI never blocks on the network.
//!
//! ## Failure Handling
//!
//! Every failure (unreadable certificate, TLS or transport error, broker close)
//! ends up as a status line on screen and a log entry. Transport errors are
//! retried by the worker after a fixed period; everything else waits for the
//! user to press connect again.

pub mod config;
pub mod connection_manager;
pub mod message_manager;
pub mod mqtt_handler;

pub use connection_manager::{ConnectionManager, SessionNotice};
pub use mqtt_handler::ConnectionState;
