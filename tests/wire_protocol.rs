use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};
use ulid::Ulid;

use slotkeeper::catalog::StaticCatalog;
use slotkeeper::durable::{wal_path, WalStore};
use slotkeeper::engine::BookingService;
use slotkeeper::wire::{self, Response};

// ── Test infrastructure ──────────────────────────────────────

type Client = Framed<TcpStream, LinesCodec>;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slotkeeper_int_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

async fn start_test_server(data_dir: &Path) -> (SocketAddr, Arc<WalStore>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = Arc::new(WalStore::open(wal_path(data_dir)).await.unwrap());
    let service = BookingService::new(store.clone(), Arc::new(StaticCatalog::sample()));

    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let service = service.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(socket, service).await;
            });
        }
    });

    (addr, store)
}

async fn connect(addr: SocketAddr) -> Client {
    let stream = TcpStream::connect(addr).await.unwrap();
    Framed::new(stream, LinesCodec::new())
}

/// Send one line and wait for its response.
async fn call(client: &mut Client, line: impl Into<String>) -> Response {
    client.send(line.into()).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("response timed out")
        .expect("connection closed")
        .unwrap();
    serde_json::from_str(&reply).unwrap()
}

fn create(resource: &str, start: &str, end: &str, by: &str) -> String {
    json!({
        "op": "create_booking",
        "resourceId": resource,
        "startTime": start,
        "endTime": end,
        "requestedBy": by,
    })
    .to_string()
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn create_list_cancel() {
    let (addr, _store) = start_test_server(&temp_dir()).await;
    let mut client = connect(addr).await;

    let resp = call(
        &mut client,
        create("conf-room-a", "2030-03-04T14:00:00Z", "2030-03-04T15:30:00Z", "John Doe"),
    )
    .await;
    assert_eq!(resp.status, 201, "{resp:?}");
    let booking = resp.booking.unwrap();
    assert_eq!(booking.resource_name, "Conference Room A");
    assert_eq!(booking.end_time, "2030-03-04T15:30:00Z");

    let resp = call(&mut client, r#"{"op":"list_bookings","resourceId":"conf-room-a"}"#).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.bookings.unwrap(), vec![booking.clone()]);

    let cancel = json!({"op": "cancel_booking", "id": booking.id}).to_string();
    assert_eq!(call(&mut client, cancel.clone()).await.status, 200);
    assert_eq!(call(&mut client, cancel).await.status, 404);

    let resp = call(&mut client, r#"{"op":"list_bookings"}"#).await;
    assert!(resp.bookings.unwrap().is_empty());
}

#[tokio::test]
async fn conflict_is_seen_across_connections() {
    let (addr, _store) = start_test_server(&temp_dir()).await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    let resp = call(
        &mut alice,
        create("video-studio", "2030-03-04T14:00:00Z", "2030-03-04T15:30:00Z", "Alice"),
    )
    .await;
    assert_eq!(resp.status, 201);

    let resp = call(
        &mut bob,
        create("video-studio", "2030-03-04T15:35:00Z", "2030-03-04T16:00:00Z", "Bob"),
    )
    .await;
    assert_eq!(resp.status, 409);
    let error = resp.error.unwrap();
    assert!(error.contains("on Video Studio from"), "{error}");
    assert!(error.contains("10-minute buffer"), "{error}");

    let resp = call(
        &mut bob,
        create("video-studio", "2030-03-04T15:40:00Z", "2030-03-04T16:00:00Z", "Bob"),
    )
    .await;
    assert_eq!(resp.status, 201);
}

#[tokio::test]
async fn bad_lines_keep_the_connection_open() {
    let (addr, _store) = start_test_server(&temp_dir()).await;
    let mut client = connect(addr).await;

    assert_eq!(call(&mut client, "{{{").await.status, 400);
    assert_eq!(call(&mut client, r#"{"op":"drop_table"}"#).await.status, 400);

    let resp = call(&mut client, r#"{"op":"list_resources"}"#).await;
    assert_eq!(resp.status, 200);
    let ids: Vec<String> = resp.resources.unwrap().into_iter().map(|r| r.id).collect();
    assert!(ids.contains(&"laptop-cart".to_string()));
}

#[tokio::test]
async fn racing_clients_commit_one_booking() {
    let (addr, store) = start_test_server(&temp_dir()).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        handles.push(tokio::spawn(async move {
            let mut client = connect(addr).await;
            call(
                &mut client,
                create("projector-1", "2030-03-04T09:00:00Z", "2030-03-04T10:00:00Z", &format!("team-{i}")),
            )
            .await
            .status
        }));
    }

    let mut statuses = Vec::new();
    for h in handles {
        statuses.push(h.await.unwrap());
    }
    statuses.sort();
    assert_eq!(statuses, vec![201, 409, 409, 409, 409, 409, 409, 409]);
    assert_eq!(store.booking_count(), 1);
}

#[tokio::test]
async fn bookings_survive_restart() {
    let dir = temp_dir();
    let id = {
        let (addr, _store) = start_test_server(&dir).await;
        let mut client = connect(addr).await;
        let resp = call(
            &mut client,
            create("laptop-cart", "2030-03-04T09:00:00Z", "2030-03-04T10:00:00Z", "Jane"),
        )
        .await;
        resp.booking.unwrap().id
    };

    let (addr, store) = start_test_server(&dir).await;
    assert_eq!(store.booking_count(), 1);

    let mut client = connect(addr).await;
    let resp = call(&mut client, r#"{"op":"list_bookings","date":"2030-03-04"}"#).await;
    let bookings = resp.bookings.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, id);
    assert_eq!(bookings[0].status, slotkeeper::model::BookingStatus::Upcoming);
}
