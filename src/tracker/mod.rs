//! Domain state of the tracker: certificate slots, the ball position and the
//! keyboard shortcut. Nothing in here knows about MQTT or drawing.

pub mod credentials;
pub mod input;
pub mod position;
