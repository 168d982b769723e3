//! Exchange server versions.
//!
//! Versions are totally ordered; every property definition and request
//! declares the first version that supports it, and the binding refuses to
//! read, set or serialize anything newer than the negotiated version.

use crate::common::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange server version, in release order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ExchangeVersion {
    /// Exchange 2007 Service Pack 1
    #[serde(rename = "Exchange2007_SP1")]
    Exchange2007Sp1,
    /// Exchange 2010
    #[serde(rename = "Exchange2010")]
    Exchange2010,
    /// Exchange 2010 Service Pack 1
    #[serde(rename = "Exchange2010_SP1")]
    Exchange2010Sp1,
    /// Exchange 2010 Service Pack 2
    #[default]
    #[serde(rename = "Exchange2010_SP2")]
    Exchange2010Sp2,
    /// Exchange 2013
    #[serde(rename = "Exchange2013")]
    Exchange2013,
    /// Exchange 2013 Service Pack 1
    #[serde(rename = "Exchange2013_SP1")]
    Exchange2013Sp1,
}

impl ExchangeVersion {
    /// All versions, oldest first.
    pub const ALL: [ExchangeVersion; 6] = [
        ExchangeVersion::Exchange2007Sp1,
        ExchangeVersion::Exchange2010,
        ExchangeVersion::Exchange2010Sp1,
        ExchangeVersion::Exchange2010Sp2,
        ExchangeVersion::Exchange2013,
        ExchangeVersion::Exchange2013Sp1,
    ];

    /// The newest version this crate knows about.
    pub const LATEST: ExchangeVersion = ExchangeVersion::Exchange2013Sp1;

    /// Wire name used in `RequestServerVersion` and `ServerVersionInfo`.
    pub const fn as_str(self) -> &'static str {
        match self {
            ExchangeVersion::Exchange2007Sp1 => "Exchange2007_SP1",
            ExchangeVersion::Exchange2010 => "Exchange2010",
            ExchangeVersion::Exchange2010Sp1 => "Exchange2010_SP1",
            ExchangeVersion::Exchange2010Sp2 => "Exchange2010_SP2",
            ExchangeVersion::Exchange2013 => "Exchange2013",
            ExchangeVersion::Exchange2013Sp1 => "Exchange2013_SP1",
        }
    }

    /// True when a feature introduced in `minimum` is usable at this version.
    #[inline]
    pub fn supports(self, minimum: ExchangeVersion) -> bool {
        self >= minimum
    }
}

impl fmt::Display for ExchangeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ExchangeVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::Deserialization(format!("Unknown Exchange version: {}", s)))
    }
}
