//! Integration tests for the feed → ingest → query → render pipeline
//!
//! These tests drive the public API the way a front end would: packets go in
//! through the ingestor, observers react to events by re-querying snapshots,
//! and renderers run on whatever the snapshot returns.

use tokio_util::sync::CancellationToken;

use pktview::content::{Classifier, ContentRepresentation, classify, curl_command, overview};
use pktview::export::{export_json, write_log};
use pktview::filter::PacketFilter;
use pktview::ingest::{Event, Ingestor, SelectionLevel, run_feed};
use pktview::state::{DeviceKey, Headers, Packet, RequestInfo};

fn packet(id: &str, method: &str, url: &str, status: Option<&str>) -> Packet {
    let mut info = RequestInfo::new(method, url);
    info.status_code = status.map(str::to_string);
    Packet::new(id, "Shop", "iphone-1", info)
}

fn key() -> DeviceKey {
    DeviceKey::new("Shop", "iphone-1")
}

#[test]
fn test_idempotent_update() {
    let ingestor = Ingestor::new();

    assert!(ingestor.ingest(packet("p1", "GET", "/a", None)));
    assert!(!ingestor.ingest(packet("p1", "GET", "/a", Some("200"))));

    let device = ingestor.device(&key()).unwrap();
    assert_eq!(device.len(), 1);
    assert_eq!(
        device.packets()[0].request_info.status_code.as_deref(),
        Some("200")
    );
}

#[test]
fn test_first_insert_auto_selects_path() {
    let ingestor = Ingestor::new();
    ingestor.ingest(packet("p1", "GET", "/a", None));

    assert_eq!(ingestor.selected_project().unwrap().project_name, "Shop");
    assert_eq!(ingestor.selected_device().unwrap().device_id, "iphone-1");
    assert_eq!(ingestor.selected_packet().unwrap().packet_id, "p1");

    // Later arrivals leave the selection alone
    ingestor.ingest(packet("p2", "GET", "/b", None));
    ingestor.ingest(Packet::new("p3", "Blog", "mac", RequestInfo::new("GET", "/")));
    assert_eq!(ingestor.selected_packet().unwrap().packet_id, "p1");
    assert_eq!(ingestor.selected_project().unwrap().project_name, "Shop");
}

#[test]
fn test_order_preserved_with_and_without_filter() {
    let ingestor = Ingestor::new();
    let ids: Vec<String> = (0..20).map(|i| format!("id-{:02}", 19 - i)).collect();
    for id in &ids {
        ingestor.ingest(packet(id, "GET", &format!("/items/{}", id), Some("200")));
    }

    let device = ingestor.device(&key()).unwrap();
    let stored: Vec<String> = device.packets().iter().map(|p| p.packet_id.clone()).collect();
    assert_eq!(stored, ids);

    let filtered: Vec<String> = ingestor
        .filtered_packets(&key(), &PacketFilter::new("/items", "GET", "200"))
        .into_iter()
        .map(|p| p.packet_id)
        .collect();
    assert_eq!(filtered, ids);
}

#[test]
fn test_filter_composition_and_blank_status() {
    let ingestor = Ingestor::new();
    ingestor.ingest(packet("1", "GET", "/a", Some("200")));
    ingestor.ingest(packet("2", "POST", "/b", Some("")));

    let hit = ingestor.filtered_packets(&key(), &PacketFilter::new("/a", "get", ""));
    assert_eq!(hit.len(), 1);
    assert_eq!(hit[0].packet_id, "1");

    assert_eq!(
        ingestor
            .filtered_packets(&key(), &PacketFilter::new("", "", ""))
            .len(),
        2
    );
    let blank = ingestor.filtered_packets(&key(), &PacketFilter::new("", "", " "));
    assert_eq!(blank.len(), 1);
    assert_eq!(blank[0].packet_id, "2");
}

#[test]
fn test_classification_precedence() {
    assert!(matches!(classify(br#"{"a":1}"#), ContentRepresentation::Json { .. }));
    assert!(matches!(
        classify(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
        ContentRepresentation::Image { .. }
    ));
    assert!(matches!(
        classify(b"plain ascii text"),
        ContentRepresentation::Text { .. }
    ));
    assert_eq!(classify(&[0xff, 0xfe, 0xfd, 0x80, 0x00]), ContentRepresentation::None);
}

#[test]
fn test_curl_scenario() {
    let mut info = RequestInfo::new("POST", "http://x/y");
    let headers: Headers = [("Content-Type", "application/json"), ("Cookie", "s=1")]
        .into_iter()
        .collect();
    info.request_headers = Some(headers);
    info.request_body = Some("{}".to_string());

    let cmd = curl_command(&info);
    assert!(cmd.contains("-X POST"));
    assert!(cmd.contains("-H 'Content-Type: application/json'"));
    assert!(!cmd.contains("Cookie"));
}

#[test]
fn test_clear_scenario() {
    let ingestor = Ingestor::new();
    ingestor.ingest(packet("1", "GET", "/a", None));
    ingestor.ingest(packet("2", "GET", "/b", None));

    assert!(ingestor.clear_device(&key()));
    let device = ingestor.device(&key()).unwrap();
    assert_eq!(device.len(), 0);
    assert!(device.selected_packet().is_none());
}

#[test]
fn test_notify_then_requery() {
    let ingestor = Ingestor::new();
    let mut sub = ingestor.subscribe();

    ingestor.ingest(packet("1", "GET", "/a", None));
    ingestor.select_packet(&key(), Some("1"));

    let events = sub.drain();
    let device_events: Vec<&DeviceKey> = events
        .iter()
        .filter_map(|e| match e {
            Event::PacketsChanged { device } => Some(device),
            _ => None,
        })
        .collect();
    assert_eq!(device_events, vec![&key()]);

    // The event names the device; its contents come from a fresh query
    let snapshot = ingestor.device(device_events[0]).unwrap();
    assert_eq!(snapshot.packets()[0].request_info.url, "/a");

    assert_eq!(
        events.last(),
        Some(&Event::SelectionChanged {
            level: SelectionLevel::Packet { device: key() },
            id: Some("1".into())
        })
    );

    assert!(ingestor.unsubscribe(sub.id()));
    ingestor.ingest(packet("2", "GET", "/b", None));
    assert!(sub.drain().is_empty());
}

#[tokio::test]
async fn test_feed_export_roundtrip() {
    let source = Ingestor::new();
    let mut body_info = RequestInfo::new("POST", "https://api.shop.io/cart?item=9&item=10");
    body_info.request_body = Some("eyJxdHkiOjJ9".to_string());
    body_info.status_code = Some("201".to_string());
    source.ingest(Packet::new("c1", "Shop", "iphone-1", body_info));
    source.ingest(packet("c2", "GET", "https://api.shop.io/", Some("200")));

    let mut capture = Vec::new();
    export_json(source.device(&key()).unwrap().packets(), &mut capture).unwrap();

    let replay = Ingestor::new();
    let stats = run_feed(capture.as_slice(), &replay, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(stats.created, 2);
    assert_eq!(replay.snapshot(), source.snapshot());

    let device = replay.device(&key()).unwrap();
    let text = overview(&device.packets()[0].request_info, &Classifier::default());
    assert!(text.starts_with("POST https://api.shop.io/cart?item=9&item=10\n\nResponse Code: 201"));
    assert!(text.contains("URL Parameters:\nitem: 9\nitem: 10\n"));
    assert!(text.contains("Request Body:\n{\n  \"qty\": 2\n}"));

    let mut log = Vec::new();
    write_log(device.packets(), &Classifier::default(), &mut log).unwrap();
    let log = String::from_utf8(log).unwrap();
    assert_eq!(log.matches("Response Code:").count(), 2);
    assert!(log.contains("}\n\nGET https://api.shop.io/\n"));
}

#[tokio::test]
async fn test_background_classification() {
    let ingestor = Ingestor::shared();
    let mut info = RequestInfo::new("GET", "https://x.io/");
    // <html><body>Hi</body></html>
    info.response_data = Some("PGh0bWw+PGJvZHk+SGk8L2JvZHk+PC9odG1sPg==".to_string());
    ingestor.ingest(Packet::new("h", "Shop", "iphone-1", info));

    let selected = ingestor.selected_packet().unwrap();
    let rep = tokio::task::spawn_blocking(move || {
        Classifier::default().classify(&selected.request_info.response_body_bytes().unwrap())
    })
    .await
    .unwrap();

    match rep {
        ContentRepresentation::Text { plain, rich } => {
            assert_eq!(plain, "Hi");
            assert!(rich.unwrap().starts_with("<html>"));
        }
        other => panic!("expected html text, got {:?}", other),
    }
}
