use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use hourdesk::api::Service;
use hourdesk::auth::AuthGate;
use hourdesk::config::EngineConfig;
use hourdesk::wire;

// ── Test infrastructure ──────────────────────────────────────

const PASSWORD: &str = "hourdesk";

async fn start_test_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = Arc::new(Service::in_memory(EngineConfig::default()));
    let auth = Arc::new(AuthGate::new(PASSWORD.to_string()));

    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let svc = service.clone();
            let gate = auth.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(socket, svc, gate).await;
            });
        }
    });

    addr
}

struct Client {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr, password: &str) -> (Self, Value) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        let reader = BufReader::new(read).lines();
        let mut client = Self { reader, writer };
        let hello = client.send(json!({ "password": password })).await;
        (client, hello)
    }

    /// Write one request frame and wait for its response frame.
    async fn send(&mut self, frame: Value) -> Value {
        let mut line = frame.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
        let reply = self
            .reader
            .next_line()
            .await
            .unwrap()
            .expect("server closed the connection");
        serde_json::from_str(&reply).unwrap()
    }

    async fn expect_closed(&mut self) {
        assert!(self.reader.next_line().await.unwrap().is_none());
    }
}

async fn seeded_client(addr: SocketAddr) -> Client {
    let (mut client, hello) = Client::connect(addr, PASSWORD).await;
    assert_eq!(hello["status"], 200);

    let resp = client
        .send(json!({
            "op": "putSpace",
            "space": {
                "spaceId": "S1",
                "name": "Vista",
                "availability": true,
                "hoster": "H1",
                "priceHour": 30.0,
                "priceDay": 180.0,
                "capacity": 6,
                "wholeDay": false
            }
        }))
        .await;
    assert_eq!(resp["status"], 200);

    for (id, name) in [("U1", "Ana"), ("U2", "Bruno")] {
        let resp = client
            .send(json!({
                "op": "putUser",
                "user": { "userId": id, "name": name, "email": format!("{}@example.com", name.to_lowercase()) }
            }))
            .await;
        assert_eq!(resp["status"], 200);
    }

    client
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn handshake_rejects_wrong_password() {
    let addr = start_test_server().await;
    let (mut client, hello) = Client::connect(addr, "nope").await;
    assert_eq!(hello["status"], 401);
    client.expect_closed().await;
}

#[tokio::test]
async fn booking_flow_end_to_end() {
    let addr = start_test_server().await;
    let mut client = seeded_client(addr).await;

    let resp = client
        .send(json!({
            "op": "reserve",
            "spaceId": "S1", "userId": "U1",
            "date": "2030-06-01", "hours": [9, 10]
        }))
        .await;
    assert_eq!(resp["status"], 200);
    assert_eq!(resp["body"]["hoursReserved"], json!([9, 10]));

    let resp = client
        .send(json!({
            "op": "checkAvailability",
            "spaceId": "S1", "date": "2030-06-01", "hours": [9, 10, 11]
        }))
        .await;
    assert_eq!(resp["status"], 200);
    assert_eq!(resp["body"]["available"], json!(false));
    assert_eq!(resp["body"]["conflicts"], json!([9, 10]));

    // A second guest racing into hour 10 loses and hour 11 stays free.
    let resp = client
        .send(json!({
            "op": "reserve",
            "spaceId": "S1", "userId": "U2",
            "date": "2030-06-01", "hours": [10, 11]
        }))
        .await;
    assert_eq!(resp["status"], 409);
    assert!(
        resp["body"]["message"]
            .as_str()
            .unwrap()
            .contains("hour 10")
    );

    let resp = client
        .send(json!({
            "op": "checkAvailability",
            "spaceId": "S1", "date": "2030-06-01", "hours": [11]
        }))
        .await;
    assert_eq!(resp["body"]["available"], json!(true));

    // Only the owner can release hour 9.
    let resp = client
        .send(json!({
            "op": "cancel",
            "spaceId": "S1",
            "slotTimestamp": "2030-06-01T09:00:00-03:00",
            "userId": "U2"
        }))
        .await;
    assert_eq!(resp["status"], 404);

    let resp = client
        .send(json!({
            "op": "cancel",
            "spaceId": "S1",
            "slotTimestamp": "2030-06-01T09:00:00-03:00",
            "userId": "U1"
        }))
        .await;
    assert_eq!(resp["status"], 200);

    let resp = client
        .send(json!({
            "op": "checkAvailability",
            "spaceId": "S1", "date": "2030-06-01", "hours": [9]
        }))
        .await;
    assert_eq!(resp["body"]["available"], json!(true));
}

#[tokio::test]
async fn hoster_decides_and_lists_reservations() {
    let addr = start_test_server().await;
    let mut client = seeded_client(addr).await;

    client
        .send(json!({
            "op": "reserve",
            "spaceId": "S1", "userId": "U1",
            "date": "2030-06-01", "hours": [10]
        }))
        .await;

    // An unknown status never mutates anything.
    let resp = client
        .send(json!({
            "op": "updateStatus",
            "spaceId": "S1",
            "slotTimestamp": "2030-06-01T10:00:00-03:00",
            "status": "APPROVED",
            "hosterId": "H1"
        }))
        .await;
    assert_eq!(resp["status"], 400);

    let resp = client
        .send(json!({
            "op": "updateStatus",
            "spaceId": "S1",
            "slotTimestamp": "2030-06-01T10:00:00-03:00",
            "status": "CONFIRMED",
            "hosterId": "H1"
        }))
        .await;
    assert_eq!(resp["status"], 200);
    assert_eq!(resp["body"]["status"], "CONFIRMED");

    let resp = client
        .send(json!({ "op": "listByHoster", "hosterId": "H1" }))
        .await;
    assert_eq!(resp["status"], 200);
    let items = resp["body"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "CONFIRMED");
    assert_eq!(items[0]["spaceName"], "Vista");
    assert_eq!(items[0]["userName"], "Ana");
    assert_eq!(items[0]["id"], "S1|2030-06-01T10:00:00-03:00");
}

#[tokio::test]
async fn malformed_frames_get_a_client_error() {
    let addr = start_test_server().await;
    let (mut client, hello) = Client::connect(addr, PASSWORD).await;
    assert_eq!(hello["status"], 200);

    let resp = client.send(json!({ "op": "teleport" })).await;
    assert_eq!(resp["status"], 400);

    // The connection survives a bad frame.
    let resp = client
        .send(json!({ "op": "listByUser", "userId": "U1" }))
        .await;
    assert_eq!(resp["status"], 200);
}

#[tokio::test]
async fn guest_listing_reflects_reservations() {
    let addr = start_test_server().await;
    let mut client = seeded_client(addr).await;

    client
        .send(json!({
            "op": "reserve",
            "spaceId": "S1", "userId": "U1",
            "date": "2030-06-02", "hours": [14, 15]
        }))
        .await;

    let resp = client
        .send(json!({ "op": "listByUser", "userId": "U1" }))
        .await;
    assert_eq!(resp["status"], 200);
    let records = resp["body"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["spaceId"], "S1");
    assert_eq!(records[0]["status"], "PENDING");
    assert_eq!(records[0]["dateReservation"], "2030-06-02");
}
