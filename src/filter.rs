use serde::{Deserialize, Serialize};

use crate::state::{Packet, RequestInfo};

/// Address/method/status filter over a device's packet list.
///
/// All three terms must match. An empty term matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketFilter {
    /// Case-sensitive substring of the URL
    #[serde(default)]
    pub address: String,
    /// Case-insensitive substring of the method
    #[serde(default)]
    pub method: String,
    /// Substring of the status code. A whitespace-only term selects packets
    /// that have no status yet.
    #[serde(default)]
    pub status: String,
}

impl PacketFilter {
    pub fn new(
        address: impl Into<String>,
        method: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            method: method.into(),
            status: status.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.method.is_empty() && self.status.is_empty()
    }

    pub fn matches(&self, info: &RequestInfo) -> bool {
        self.matches_address(info) && self.matches_method(info) && self.matches_status(info)
    }

    /// Matching packets in their original order
    pub fn apply<'a>(&self, packets: &'a [Packet]) -> Vec<&'a Packet> {
        packets
            .iter()
            .filter(|p| self.matches(&p.request_info))
            .collect()
    }

    fn matches_address(&self, info: &RequestInfo) -> bool {
        self.address.is_empty() || info.url.contains(&self.address)
    }

    fn matches_method(&self, info: &RequestInfo) -> bool {
        self.method.is_empty()
            || info
                .request_method
                .to_lowercase()
                .contains(&self.method.to_lowercase())
    }

    fn matches_status(&self, info: &RequestInfo) -> bool {
        if self.status.is_empty() {
            return true;
        }
        let status = info.status_code.as_deref();
        if self.status.trim().is_empty() {
            return status.is_none_or(|s| s.trim().is_empty());
        }
        status.is_some_and(|s| s.contains(&self.status))
    }
}
