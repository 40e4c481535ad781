//! Sparkplug B topic parsing, per §6:
//! `spBv1.0/{group_id}/{message_type}/{node_id}[/{device_id}]`.

use std::{fmt, str::FromStr};

/// The eight Sparkplug B frame types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Node birth.
    NBirth,
    /// Node death.
    NDeath,
    /// Device birth.
    DBirth,
    /// Device death.
    DDeath,
    /// Node data.
    NData,
    /// Device data.
    DData,
    /// Node command.
    NCmd,
    /// Device command.
    DCmd,
}

impl MessageType {
    /// Whether this message type carries a `device_id` topic segment.
    pub fn is_device_scoped(self) -> bool {
        matches!(self, MessageType::DBirth | MessageType::DDeath | MessageType::DData | MessageType::DCmd)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageType::NBirth => "NBIRTH",
            MessageType::NDeath => "NDEATH",
            MessageType::DBirth => "DBIRTH",
            MessageType::DDeath => "DDEATH",
            MessageType::NData => "NDATA",
            MessageType::DData => "DDATA",
            MessageType::NCmd => "NCMD",
            MessageType::DCmd => "DCMD",
        };
        f.write_str(s)
    }
}

/// Error returned when a topic does not match the Sparkplug B namespace.
#[derive(Debug, thiserror::Error)]
#[error("malformed sparkplug topic: {0}")]
pub struct TopicError(pub String);

impl FromStr for MessageType {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NBIRTH" => MessageType::NBirth,
            "NDEATH" => MessageType::NDeath,
            "DBIRTH" => MessageType::DBirth,
            "DDEATH" => MessageType::DDeath,
            "NDATA" => MessageType::NData,
            "DDATA" => MessageType::DData,
            "NCMD" => MessageType::NCmd,
            "DCMD" => MessageType::DCmd,
            other => return Err(TopicError(other.to_string())),
        })
    }
}

/// A parsed Sparkplug B topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// The Sparkplug group id.
    pub group_id: String,
    /// The frame type.
    pub message_type: MessageType,
    /// The edge node id.
    pub node_id: String,
    /// The device id, present only for device-scoped message types.
    pub device_id: Option<String>,
}

impl Topic {
    /// Builds the MQTT topic string for this parsed topic.
    pub fn to_topic_string(&self) -> String {
        match &self.device_id {
            Some(device_id) => format!("spBv1.0/{}/{}/{}/{}", self.group_id, self.message_type, self.node_id, device_id),
            None => format!("spBv1.0/{}/{}/{}", self.group_id, self.message_type, self.node_id),
        }
    }

    /// Parses a topic string per the Sparkplug B namespace.
    pub fn parse(topic: &str) -> Result<Self, TopicError> {
        let segments: Vec<&str> = topic.split('/').collect();
        if segments.len() < 4 || segments[0] != "spBv1.0" {
            return Err(TopicError(topic.to_string()));
        }
        let message_type: MessageType = segments[2].parse()?;
        let device_id = if message_type.is_device_scoped() {
            Some(segments.get(4).ok_or_else(|| TopicError(topic.to_string()))?.to_string())
        } else {
            None
        };
        Ok(Topic {
            group_id: segments[1].to_string(),
            message_type,
            node_id: segments[3].to_string(),
            device_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_scoped_topic() {
        let topic = Topic::parse("spBv1.0/Plant1/NDATA/Line1").unwrap();
        assert_eq!(topic.group_id, "Plant1");
        assert_eq!(topic.message_type, MessageType::NData);
        assert_eq!(topic.node_id, "Line1");
        assert!(topic.device_id.is_none());
    }

    #[test]
    fn parses_device_scoped_topic() {
        let topic = Topic::parse("spBv1.0/Plant1/DDATA/Line1/Press1").unwrap();
        assert_eq!(topic.device_id.as_deref(), Some("Press1"));
    }

    #[test]
    fn round_trips_through_to_topic_string() {
        let original = "spBv1.0/Plant1/DBIRTH/Line1/Press1";
        let topic = Topic::parse(original).unwrap();
        assert_eq!(topic.to_topic_string(), original);
    }

    #[test]
    fn rejects_non_sparkplug_namespace() {
        assert!(Topic::parse("foo/bar/NDATA/Line1").is_err());
    }
}
