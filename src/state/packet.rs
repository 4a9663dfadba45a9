use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::content::decode_base64;

/// Ordered header map. Keeps the order the pairs arrived in on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a pair (no merging of duplicate names)
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// First value for `key` (exact match)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Request/response payload of a packet. Replaced wholesale on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub request_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Headers>,
    /// Base64 encoded request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Headers>,
    /// Base64 encoded response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(default, with = "reference_date_serde", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "reference_date_serde", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_method: method.into(),
            ..Default::default()
        }
    }

    /// Decoded request body (None if absent or not valid base64)
    pub fn request_body_bytes(&self) -> Option<Vec<u8>> {
        self.request_body.as_deref().and_then(decode_base64)
    }

    /// Decoded response body (None if absent or not valid base64)
    pub fn response_body_bytes(&self) -> Option<Vec<u8>> {
        self.response_data.as_deref().and_then(decode_base64)
    }

    /// Time between request start and response end, if both are known
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Start date in local time, e.g. `17/10/2026 14:03:59`
    pub fn started_readable(&self) -> Option<String> {
        self.start_date.map(|d| {
            d.with_timezone(&Local)
                .format("%d/%m/%Y %H:%M:%S")
                .to_string()
        })
    }
}

/// Project a packet belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    #[serde(default)]
    pub project_name: String,
}

/// Device (debugged process instance) a packet was captured on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_description: Option<String>,
}

/// One captured HTTP exchange. `packet_id` is its identity and never changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Packet {
    pub packet_id: String,
    #[serde(default)]
    pub request_info: RequestInfo,
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub device: DeviceInfo,
}

impl Packet {
    pub fn new(
        packet_id: impl Into<String>,
        project_name: impl Into<String>,
        device_id: impl Into<String>,
        request_info: RequestInfo,
    ) -> Self {
        Self {
            packet_id: packet_id.into(),
            request_info,
            project: ProjectInfo {
                project_name: project_name.into(),
            },
            device: DeviceInfo {
                device_id: device_id.into(),
                ..Default::default()
            },
        }
    }
}

/// Serialize headers as a JSON object, deserialize keeping wire order
mod headers_serde {
    use super::Headers;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for Headers {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for (k, v) in &self.0 {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
    }

    struct HeadersVisitor;

    impl<'de> Visitor<'de> for HeadersVisitor {
        type Value = Headers;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of header names to string values")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Headers, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((k, v)) = access.next_entry::<String, String>()? {
                pairs.push((k, v));
            }
            Ok(Headers(pairs))
        }
    }

    impl<'de> Deserialize<'de> for Headers {
        fn deserialize<D>(deserializer: D) -> Result<Headers, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(HeadersVisitor)
        }
    }
}

/// Serde helper for dates sent as seconds since 2001-01-01T00:00:00Z
mod reference_date_serde {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Unix timestamp of the reference epoch
    const REFERENCE_EPOCH: i64 = 978_307_200;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        date.map(|d| {
            let micros = d.timestamp_micros() - REFERENCE_EPOCH * 1_000_000;
            micros as f64 / 1_000_000.0
        })
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(secs) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        from_reference_secs(secs)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("date out of range: {}", secs)))
    }

    fn from_reference_secs(secs: f64) -> Option<DateTime<Utc>> {
        let micros = (secs * 1_000_000.0).round();
        // `as` saturates, so reject anything an i64 cannot hold first
        if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
            return None;
        }
        let micros = (micros as i64).checked_add(REFERENCE_EPOCH * 1_000_000)?;
        DateTime::<Utc>::from_timestamp(
            micros.div_euclid(1_000_000),
            (micros.rem_euclid(1_000_000) * 1_000) as u32,
        )
    }
}
