//! IPv4 CIDR blocks.
//!
//! A thin newtype over [`ipnet::Ipv4Net`] that only admits canonical network
//! literals: `10.16.0.0/16` parses, `10.16.1.0/16` does not.

use std::fmt;
use std::str::FromStr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A canonical IPv4 CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cidr(Ipv4Net);

impl Cidr {
    /// Parse a CIDR literal, rejecting malformed input and set host bits.
    pub fn parse(literal: &str) -> Result<Self> {
        let net: Ipv4Net = literal
            .trim()
            .parse()
            .map_err(|e| Error::invalid_cidr(literal, format!("{}", e)))?;

        if net != net.trunc() {
            return Err(Error::invalid_cidr(
                literal,
                format!("host bits are set, did you mean {}?", net.trunc()),
            ));
        }

        Ok(Self(net))
    }

    /// The whole IPv4 space, `0.0.0.0/0`.
    pub fn any() -> Self {
        Self(Ipv4Net::default())
    }

    /// Prefix length of the block.
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Whether `other` lies entirely inside this block.
    pub fn contains(&self, other: &Cidr) -> bool {
        self.0.contains(&other.0)
    }

    /// Whether the two blocks share at least one address.
    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.0.contains(&other.0.network()) || other.0.contains(&self.0.network())
    }

    /// Whether this is the default route destination.
    pub fn is_any(&self) -> bool {
        self.0.prefix_len() == 0
    }

    /// Underlying network value.
    pub fn as_net(&self) -> &Ipv4Net {
        &self.0
    }
}

impl FromStr for Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        Cidr::parse(&literal).map_err(serde::de::Error::custom)
    }
}
