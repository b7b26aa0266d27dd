use chrono::NaiveDateTime;
use std::fmt;
use std::time::Instant;

use super::mqtt_handler::ConnectionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MQTTMessage {
    pub topic: String,
    pub content: Vec<u8>,
    pub timestamp: NaiveDateTime,
    /// Monotonic arrival time, used for staleness
    pub received_at: Instant,
}

impl fmt::Display for MQTTMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} - {} ({} bytes)",
            self.timestamp,
            self.topic,
            self.content.len()
        )
    }
}

impl MQTTMessage {
    pub fn from_topic(topic: String, content: Vec<u8>) -> Self {
        MQTTMessage {
            topic,
            content,
            timestamp: chrono::Local::now().naive_local(),
            received_at: Instant::now(),
        }
    }
}

/// What a session worker reports to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    State {
        state: ConnectionState,
        status: String,
    },
    Message(MQTTMessage),
}

/// A [`SessionUpdate`] tagged with the connect attempt that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub generation: u64,
    pub update: SessionUpdate,
}

/// Per-topic filter match following MQTT wildcard rules.
///
/// `+` matches exactly one level, a trailing `#` matches the parent level and
/// everything below it.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_topics_match() {
        assert!(topic_matches("marvel_AUS/ai_pub", "marvel_AUS/ai_pub"));
        assert!(!topic_matches("marvel_AUS/ai_pub", "marvel_AUS/ai_sub"));
        assert!(!topic_matches("marvel_AUS/ai_pub", "marvel_AUS/ai_pub/extra"));
        assert!(!topic_matches("marvel_AUS/ai_pub/extra", "marvel_AUS/ai_pub"));
    }

    #[test]
    fn single_level_wildcard() {
        assert!(topic_matches("marvel_AUS/+", "marvel_AUS/ai_pub"));
        assert!(topic_matches("+/ai_pub", "marvel_NZ/ai_pub"));
        assert!(!topic_matches("marvel_AUS/+", "marvel_AUS/ai_pub/x"));
        assert!(!topic_matches("marvel_AUS/+", "marvel_AUS"));
    }

    #[test]
    fn multi_level_wildcard() {
        assert!(topic_matches("#", "anything/at/all"));
        assert!(topic_matches("marvel_AUS/#", "marvel_AUS"));
        assert!(topic_matches("marvel_AUS/#", "marvel_AUS/ai_pub/deep"));
        assert!(!topic_matches("marvel_AUS/#", "marvel_NZ/ai_pub"));
    }

    #[test]
    fn display_shows_topic_and_size() {
        let msg = MQTTMessage::from_topic("a/b".to_string(), b"{\"X\":1}".to_vec());
        assert!(msg.to_string().ends_with("a/b (7 bytes)"));
    }
}
