//! Provider Profile — a pure lookup table from `(provider, delayed)` to
//! auth URL, socket URL, heartbeat payload, and channel-encoding rules
//! (spec §4.1).
//!
//! This is the single place that knows how a firehose subscription is
//! spelled on the wire for a given provider (spec §9: "Encapsulate in
//! Provider Profile, not in call sites"), and whether control messages are
//! JSON (equities, Phoenix-channel framing) or a compact binary prefix
//! (options).

use serde_json::json;

use crate::constants::{self, firehose};
use crate::error::{IntrinioError, Result};
use crate::types::channel::pad_contract;
use crate::types::{Channel, Provider};

/// Which binary wire layout a connection should be decoded with
/// (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireVariant {
    Equities,
    Options,
}

/// A control-plane message ready to be sent on the socket: either a JSON
/// text frame (equities) or a raw binary frame (options) (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    Text(String),
    Binary(Vec<u8>),
}

const JOIN_OPCODE: u8 = 0x01;
const LEAVE_OPCODE: u8 = 0x02;

/// Resolved connection parameters for one `(provider, delayed)` pair.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    provider: Provider,
    delayed: bool,
    auth_host: String,
    socket_host: String,
    manual_ip: Option<String>,
    wire_variant: WireVariant,
}

impl ProviderProfile {
    /// Resolve the profile for `provider`. `manual_ip` is required
    /// (and only meaningful) when `provider == Provider::MANUAL` — this is
    /// enforced by `Config::validate`, not re-checked here.
    pub fn lookup(provider: Provider, delayed: bool, manual_ip: Option<&str>) -> Result<Self> {
        let wire_variant = if provider.is_options() {
            WireVariant::Options
        } else {
            WireVariant::Equities
        };

        let (auth_host, socket_host) = match provider {
            Provider::REALTIME | Provider::IEX => {
                ("realtime-mx.intrinio.com", "realtime-mx.intrinio.com")
            }
            Provider::DELAYED_SIP => (
                "realtime-delayed-sip.intrinio.com",
                "realtime-delayed-sip.intrinio.com",
            ),
            Provider::NASDAQ_BASIC => (
                "realtime-nasdaq-basic.intrinio.com",
                "realtime-nasdaq-basic.intrinio.com",
            ),
            Provider::CBOE_ONE => (
                "realtime-cboe-one.intrinio.com",
                "realtime-cboe-one.intrinio.com",
            ),
            Provider::OPRA => ("realtime-options.intrinio.com", "realtime-options.intrinio.com"),
            Provider::MANUAL => {
                let ip = manual_ip.ok_or_else(|| {
                    IntrinioError::Config(
                        "MANUAL provider requires manual_ip_address".to_owned(),
                    )
                })?;
                (ip, ip)
            }
        };

        Ok(Self {
            provider,
            delayed,
            auth_host: auth_host.to_owned(),
            socket_host: socket_host.to_owned(),
            manual_ip: manual_ip.map(str::to_owned),
            wire_variant,
        })
    }

    /// The provider this profile was resolved for.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Which decoder branch a connection using this profile should run.
    pub fn wire_variant(&self) -> WireVariant {
        self.wire_variant
    }

    /// `GET {authURL}` — the vendor endpoint that exchanges an API key for a
    /// short-lived bearer token (spec §4.1, §6).
    pub fn auth_url(&self, api_key: &str) -> String {
        format!("https://{}/auth?api_key={api_key}", self.auth_host)
    }

    /// The WebSocket URL to dial once a token has been obtained
    /// (spec §4.1, §6).
    pub fn socket_url(&self, token: &str) -> String {
        format!(
            "wss://{}/socket/websocket?vsn=1.0.0&token={token}",
            self.socket_host
        )
    }

    /// The exact heartbeat payload this provider expects as keepalive
    /// (spec §4.1, §6). May be empty (options).
    pub fn heartbeat_message(&self) -> ControlMessage {
        match self.wire_variant {
            WireVariant::Equities => ControlMessage::Text(
                json!({
                    "topic": "phoenix",
                    "event": "heartbeat",
                    "payload": {},
                    "ref": null,
                })
                .to_string(),
            ),
            WireVariant::Options => ControlMessage::Binary(Vec::new()),
        }
    }

    /// Encode a join control message for `channel` (spec §4.1, §6).
    pub fn encode_join(&self, channel: &Channel) -> ControlMessage {
        self.encode_control(channel, "phx_join", JOIN_OPCODE)
    }

    /// Encode a leave control message for `channel` (spec §4.1, §6).
    pub fn encode_leave(&self, channel: &Channel) -> ControlMessage {
        self.encode_control(channel, "phx_leave", LEAVE_OPCODE)
    }

    fn encode_control(&self, channel: &Channel, phx_event: &str, opcode: u8) -> ControlMessage {
        let wire_topic = self.wire_channel_spelling(channel);
        match self.wire_variant {
            WireVariant::Equities => ControlMessage::Text(
                json!({
                    "topic": wire_topic,
                    "event": phx_event,
                    "payload": {},
                    "ref": "1",
                })
                .to_string(),
            ),
            WireVariant::Options => {
                let mut buf = Vec::with_capacity(1 + constants::CONTRACT_LEN);
                buf.push(opcode);
                buf.extend_from_slice(&pad_contract(&wire_topic));
                ControlMessage::Binary(buf)
            }
        }
    }

    /// Translate a canonical [`Channel`] into the spelling this provider
    /// expects on the wire, resolving the firehose sentinel per provider
    /// (spec §9).
    fn wire_channel_spelling(&self, channel: &Channel) -> String {
        if *channel != Channel::firehose() {
            return channel.as_str().to_owned();
        }
        match self.provider {
            Provider::CBOE_ONE => firehose::LOBBY.to_owned(),
            Provider::OPRA | Provider::MANUAL if self.delayed => {
                firehose::DOLLAR_LOBBY_LAST_PRICE.to_owned()
            }
            Provider::OPRA | Provider::MANUAL => firehose::DOLLAR_LOBBY.to_owned(),
            _ => firehose::DOLLAR_FIREHOSE.to_owned(),
        }
    }

    /// The `manual_ip_address` this profile was built with, if any.
    pub fn manual_ip(&self) -> Option<&str> {
        self.manual_ip.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equities_join_is_phoenix_json() {
        let profile = ProviderProfile::lookup(Provider::REALTIME, false, None).unwrap();
        let msg = profile.encode_join(&Channel::new("AAPL"));
        match msg {
            ControlMessage::Text(json) => {
                assert!(json.contains("\"topic\":\"AAPL\""));
                assert!(json.contains("\"event\":\"phx_join\""));
            }
            _ => panic!("expected text control message"),
        }
    }

    #[test]
    fn equities_firehose_spelling_per_provider() {
        let realtime = ProviderProfile::lookup(Provider::REALTIME, false, None).unwrap();
        assert!(matches!(
            realtime.encode_join(&Channel::firehose()),
            ControlMessage::Text(json) if json.contains("$FIREHOSE")
        ));

        let cboe = ProviderProfile::lookup(Provider::CBOE_ONE, false, None).unwrap();
        assert!(matches!(
            cboe.encode_join(&Channel::firehose()),
            ControlMessage::Text(json) if json.contains("\"topic\":\"lobby\"")
        ));
    }

    #[test]
    fn options_join_is_binary_with_opcode_and_padded_contract() {
        let profile = ProviderProfile::lookup(Provider::OPRA, false, None).unwrap();
        let msg = profile.encode_join(&Channel::new("AAPL__230616C00180000"));
        match msg {
            ControlMessage::Binary(bytes) => {
                assert_eq!(bytes[0], JOIN_OPCODE);
                assert_eq!(bytes.len(), 1 + constants::CONTRACT_LEN);
                assert_eq!(&bytes[1..], b"AAPL__230616C00180000");
            }
            _ => panic!("expected binary control message"),
        }
    }

    #[test]
    fn options_firehose_sentinel_e3() {
        let profile = ProviderProfile::lookup(Provider::OPRA, false, None).unwrap();
        let msg = profile.encode_join(&Channel::firehose());
        match msg {
            ControlMessage::Binary(bytes) => {
                assert_eq!(bytes[0], JOIN_OPCODE);
                assert_eq!(&bytes[1..], b"$FIREHOSE____________");
            }
            _ => panic!("expected binary control message"),
        }
    }

    #[test]
    fn manual_provider_requires_ip() {
        let err = ProviderProfile::lookup(Provider::MANUAL, false, None).unwrap_err();
        assert!(matches!(err, IntrinioError::Config(_)));
    }
}
