//! Channel-tagged text frames carried by the bus connection.
//!
//! Inbound frames look like `<channel> <payload>`; the channel name selects
//! how the payload is read. Outbound frames are produced from [`BusCommand`].

use crate::ContainerId;

pub const READY_CHANNEL: &str = "ready";
pub const EVENTS_CHANNEL: &str = "events";
pub const LOGS_CHANNEL: &str = "logs";
pub const STATS_CHANNEL: &str = "stats";

#[derive(Debug, Clone, PartialEq)]
pub enum BusFrame {
    /// Handshake sent by the server once the connection is authenticated.
    Ready,
    /// A container lifecycle event; the payload is not interpreted.
    Event(String),
    Log {
        container_id: ContainerId,
        text: String,
    },
    Stat {
        container_id: ContainerId,
        payload: serde_json::Value,
    },
    /// Known channel with a payload that could not be read.
    Malformed { channel: String, reason: String },
    Unknown { channel: String },
}

impl BusFrame {
    pub fn parse(raw: &str) -> BusFrame {
        let raw = raw.trim_end_matches(['\r', '\n']);
        let (channel, rest) = match raw.split_once(' ') {
            Some((channel, rest)) => (channel, rest),
            None => (raw, ""),
        };

        match channel {
            READY_CHANNEL => BusFrame::Ready,
            EVENTS_CHANNEL => BusFrame::Event(rest.to_string()),
            LOGS_CHANNEL => match rest.split_once(' ') {
                Some((id, text)) if !id.is_empty() => BusFrame::Log {
                    container_id: id.to_string(),
                    text: text.to_string(),
                },
                _ => BusFrame::Malformed {
                    channel: channel.to_string(),
                    reason: "expected `logs <id> <text>`".into(),
                },
            },
            STATS_CHANNEL => match rest.split_once(' ') {
                Some((id, json)) if !id.is_empty() => match serde_json::from_str(json) {
                    Ok(payload) => BusFrame::Stat {
                        container_id: id.to_string(),
                        payload,
                    },
                    Err(e) => BusFrame::Malformed {
                        channel: channel.to_string(),
                        reason: format!("invalid stats payload: {e}"),
                    },
                },
                _ => BusFrame::Malformed {
                    channel: channel.to_string(),
                    reason: "expected `stats <id> <json>`".into(),
                },
            },
            other => BusFrame::Unknown {
                channel: other.to_string(),
            },
        }
    }
}

/// Subscription requests written to the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCommand {
    SubscribeEvents,
    SubscribeStats(ContainerId),
    UnsubscribeStats(ContainerId),
}

impl BusCommand {
    pub fn to_frame(&self) -> String {
        match self {
            BusCommand::SubscribeEvents => format!("{EVENTS_CHANNEL} start"),
            BusCommand::SubscribeStats(id) => format!("{STATS_CHANNEL} {id} start"),
            BusCommand::UnsubscribeStats(id) => format!("{STATS_CHANNEL} {id} stop"),
        }
    }
}
