use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::debug;

use crate::api::{self, ApiResponse, Request, Service};
use crate::auth::AuthGate;
use crate::limits::MAX_WIRE_FRAME_BYTES;
use crate::observability;

type WireResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Deserialize)]
struct Hello {
    password: String,
}

/// Drive one client connection: a password handshake frame first, then one
/// JSON request per line answered by one JSON response per line.
pub async fn process_connection(
    socket: TcpStream,
    service: Arc<Service>,
    auth: Arc<AuthGate>,
) -> WireResult {
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(MAX_WIRE_FRAME_BYTES));

    let Some(first) = framed.next().await else {
        return Ok(());
    };
    let first = first?;
    let authenticated = serde_json::from_str::<Hello>(&first)
        .map(|hello| auth.verify(&hello.password))
        .unwrap_or(false);
    if !authenticated {
        counter!(observability::AUTH_FAILURES_TOTAL).increment(1);
        send(
            &mut framed,
            &ApiResponse::client_error(401, "authentication failed"),
        )
        .await?;
        return Ok(());
    }
    send(
        &mut framed,
        &ApiResponse::ok(json!({ "message": "authenticated" })),
    )
    .await?;

    while let Some(line) = framed.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let op = observability::op_label(&request);
                let start = Instant::now();
                let response = api::dispatch(&service, request).await;
                histogram!(observability::REQUEST_DURATION_SECONDS, "op" => op)
                    .record(start.elapsed().as_secs_f64());
                let outcome = if response.is_success() {
                    "ok"
                } else if response.status < 500 {
                    "client_error"
                } else {
                    "server_error"
                };
                counter!(observability::REQUESTS_TOTAL, "op" => op, "outcome" => outcome)
                    .increment(1);
                response
            }
            Err(e) => {
                debug!("unreadable request frame: {e}");
                ApiResponse::client_error(400, "unsupported or malformed request")
            }
        };
        send(&mut framed, &response).await?;
    }
    Ok(())
}

async fn send(framed: &mut Framed<TcpStream, LinesCodec>, response: &ApiResponse) -> WireResult {
    let line = serde_json::to_string(response)?;
    framed.send(line).await?;
    Ok(())
}
