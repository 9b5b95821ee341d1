//! Peer identity.

use crate::constants::DEFAULT_P2P_PORT;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// A remote peer: ipv4 address plus peer-to-peer port.
///
/// The p2p port comes from the `x-p2p-port` header when present,
/// otherwise [`DEFAULT_P2P_PORT`]. Peers are the unit of identity for
/// the blacklist and the peer DB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Peer {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Peer {
    /// Placeholder for requests whose transport peer is unknown.
    pub const UNSPECIFIED: Self = Self {
        ip: Ipv4Addr::UNSPECIFIED,
        port: DEFAULT_P2P_PORT,
    };

    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Derive the peer identity from a socket address and an optional
    /// `x-p2p-port` header value. Non-ipv4 transports have no peer
    /// identity.
    pub fn from_socket(addr: SocketAddr, p2p_port: Option<u16>) -> Option<Self> {
        match addr.ip() {
            IpAddr::V4(ip) => Some(Self {
                ip,
                port: p2p_port.unwrap_or(DEFAULT_P2P_PORT),
            }),
            IpAddr::V6(_) => None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.ip.is_unspecified()
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl FromStr for Peer {
    type Err = PeerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, port) = s.rsplit_once(':').ok_or(PeerParseError)?;
        Ok(Self {
            ip: ip.parse().map_err(|_| PeerParseError)?,
            port: port.parse().map_err(|_| PeerParseError)?,
        })
    }
}

/// Input was not an `a.b.c.d:port` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid peer string, expected a.b.c.d:port")]
pub struct PeerParseError;

impl Serialize for Peer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Peer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
