//! Capture feed: reads newline-delimited packet records and ingests them.
//!
//! This is the in-process stand-in for the network transport. Records are
//! the wire JSON objects the instrumented clients send, one per line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::ingest::ingestor::Ingestor;
use crate::state::Packet;

/// Counters for one feed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl FeedStats {
    pub fn total(&self) -> u64 {
        self.created + self.updated + self.skipped
    }
}

/// Decode one record. `line` is 1-based and only used for error reporting.
pub fn decode_packet(record: &str, line: u64) -> Result<Packet> {
    serde_json::from_str(record).map_err(|source| Error::Decode { line, source })
}

/// Ingest records until EOF or cancellation.
///
/// Blank lines are ignored. Records that fail to decode are logged and
/// skipped; I/O errors end the feed.
pub async fn run_feed<R>(reader: R, ingestor: &Ingestor, cancel: CancellationToken) -> Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = FeedStats::default();
    let mut line_no: u64 = 0;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        line_no += 1;

        let record = line.trim();
        if record.is_empty() {
            continue;
        }

        match decode_packet(record, line_no) {
            Ok(packet) => {
                if ingestor.ingest(packet) {
                    stats.created += 1;
                } else {
                    stats.updated += 1;
                }
            }
            Err(e) => {
                tracing::warn!("{}", e);
                stats.skipped += 1;
            }
        }
    }

    tracing::debug!(
        created = stats.created,
        updated = stats.updated,
        skipped = stats.skipped,
        "feed finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DeviceKey;

    const CAPTURE: &str = r#"{"packetId":"1","requestInfo":{"url":"/a","requestMethod":"GET"},"project":{"projectName":"p"},"device":{"deviceId":"d"}}

not json
{"packetId":"2","requestInfo":{"url":"/b","requestMethod":"POST"},"project":{"projectName":"p"},"device":{"deviceId":"d"}}
{"packetId":"1","requestInfo":{"url":"/a","requestMethod":"GET","statusCode":"200"},"project":{"projectName":"p"},"device":{"deviceId":"d"}}
"#;

    #[tokio::test]
    async fn test_feed_ingests_and_skips() {
        let ingestor = Ingestor::new();
        let stats = run_feed(CAPTURE.as_bytes(), &ingestor, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            stats,
            FeedStats {
                created: 2,
                updated: 1,
                skipped: 1
            }
        );
        assert_eq!(stats.total(), 4);

        let device = ingestor.device(&DeviceKey::new("p", "d")).unwrap();
        assert_eq!(device.len(), 2);
        assert_eq!(
            device.packets()[0].request_info.status_code.as_deref(),
            Some("200")
        );
    }

    #[tokio::test]
    async fn test_feed_skips_out_of_range_date() {
        let capture = concat!(
            r#"{"packetId":"1","requestInfo":{"url":"/a","requestMethod":"GET","startDate":1e300},"project":{"projectName":"p"},"device":{"deviceId":"d"}}"#,
            "\n",
            r#"{"packetId":"2","requestInfo":{"url":"/b","requestMethod":"GET","startDate":1.0},"project":{"projectName":"p"},"device":{"deviceId":"d"}}"#,
            "\n",
        );
        let ingestor = Ingestor::new();
        let stats = run_feed(capture.as_bytes(), &ingestor, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.created, 1);
        let device = ingestor.device(&DeviceKey::new("p", "d")).unwrap();
        assert_eq!(device.packets()[0].packet_id, "2");
    }

    #[tokio::test]
    async fn test_cancelled_feed_stops() {
        let ingestor = Ingestor::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // A reader that never yields; cancellation must win
        let (_tx, rx) = tokio::io::duplex(64);
        let stats = run_feed(tokio::io::BufReader::new(rx), &ingestor, cancel)
            .await
            .unwrap();
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_decode_error_carries_line() {
        let err = decode_packet("{", 7).unwrap_err();
        assert!(err.to_string().starts_with("Invalid packet record at line 7"));
    }
}
