use rand::Rng;
use std::time::Duration;

/// AWS IoT Core data endpoint for the tracker's account and region.
pub const AWS_IOT_ENDPOINT: &str = "a3lkzcadhi1yzr-ats.iot.ap-southeast-2.amazonaws.com";
/// MQTT over TLS with client certificate authentication.
pub const AWS_IOT_PORT: u16 = 8883;
pub const KEEP_ALIVE: Duration = Duration::from_secs(10);
/// Wait between transport reconnect attempts.
pub const RECONNECT_PERIOD: Duration = Duration::from_millis(2000);

const CLIENT_ID_PREFIX: &str = "ball-tracker-";

/// Everything a session worker needs besides the certificates.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub endpoint: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    pub keep_alive: Duration,
    pub reconnect_period: Duration,
}

impl SessionConfig {
    /// Config for the fixed AWS IoT endpoint with a fresh random client id.
    pub fn aws_iot(topic: impl Into<String>) -> Self {
        Self {
            endpoint: AWS_IOT_ENDPOINT.to_string(),
            port: AWS_IOT_PORT,
            client_id: random_client_id(),
            topic: topic.into(),
            keep_alive: KEEP_ALIVE,
            reconnect_period: RECONNECT_PERIOD,
        }
    }
}

/// `ball-tracker-` followed by eight random hex digits. Collisions are not guarded against.
pub fn random_client_id() -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}{:08x}", CLIENT_ID_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_has_prefix_and_eight_hex_digits() {
        let id = random_client_id();
        let suffix = id.strip_prefix(CLIENT_ID_PREFIX).unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn aws_iot_uses_fixed_endpoint_and_timings() {
        let config = SessionConfig::aws_iot("marvel_AUS/ai_pub");
        assert_eq!(config.endpoint, AWS_IOT_ENDPOINT);
        assert_eq!(config.port, 8883);
        assert_eq!(config.topic, "marvel_AUS/ai_pub");
        assert_eq!(config.keep_alive, Duration::from_secs(10));
        assert_eq!(config.reconnect_period, Duration::from_millis(2000));
    }
}
