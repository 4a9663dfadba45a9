use serde::{Deserialize, Serialize};
use url::Url;
use url::form_urlencoded;

use crate::state::Headers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered key/value pairs from a header map or a URL query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueRepresentation {
    pairs: Vec<KeyValue>,
}

impl KeyValueRepresentation {
    /// Header pairs in wire order
    pub fn from_headers(headers: &Headers) -> Self {
        Self {
            pairs: headers.iter().map(|(k, v)| KeyValue::new(k, v)).collect(),
        }
    }

    /// Query parameters in left-to-right order. Repeated keys stay separate
    /// pairs; a key without `=` gets an empty value.
    pub fn from_url(url: &str) -> Self {
        let query = match Url::parse(url) {
            Ok(parsed) => parsed.query().map(str::to_string),
            // Relative or otherwise unparseable: take everything after '?'
            Err(_) => url
                .split('#')
                .next()
                .and_then(|s| s.split_once('?'))
                .map(|(_, q)| q.to_string()),
        };

        let pairs = query
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| KeyValue::new(k, v))
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn pairs(&self) -> &[KeyValue] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// One `key: value` line per pair, newline terminated
    pub fn raw_text(&self) -> String {
        self.pairs
            .iter()
            .map(|kv| format!("{}: {}\n", kv.key, kv.value))
            .collect()
    }
}

impl FromIterator<KeyValue> for KeyValueRepresentation {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
