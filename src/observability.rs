use std::net::SocketAddr;

use crate::api::Request;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total requests handled. Labels: op, outcome.
pub const REQUESTS_TOTAL: &str = "hourdesk_requests_total";

/// Histogram: request latency in seconds. Labels: op.
pub const REQUEST_DURATION_SECONDS: &str = "hourdesk_request_duration_seconds";

/// Counter: reserve attempts that lost a slot race.
pub const SLOT_CONFLICTS_TOTAL: &str = "hourdesk_slot_conflicts_total";

/// Counter: rollback deletes that failed, leaving a committed hour behind.
pub const ROLLBACK_FAILURES_TOTAL: &str = "hourdesk_rollback_failures_total";

/// Counter: stale PENDING records refused at read time.
pub const EXPIRY_WRITES_TOTAL: &str = "hourdesk_expiry_writes_total";

/// Counter: expiry writes that failed and were swallowed. Nonzero means
/// displayed status has drifted from stored status.
pub const EXPIRY_WRITE_FAILURES_TOTAL: &str = "hourdesk_expiry_write_failures_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "hourdesk_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "hourdesk_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "hourdesk_connections_rejected_total";

/// Counter: failed wire handshakes.
pub const AUTH_FAILURES_TOTAL: &str = "hourdesk_auth_failures_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Request variant to a short label for metrics.
pub fn op_label(req: &Request) -> &'static str {
    match req {
        Request::Reserve { .. } => "reserve",
        Request::CheckAvailability { .. } => "check_availability",
        Request::Cancel { .. } => "cancel",
        Request::UpdateStatus { .. } => "update_status",
        Request::ListByUser { .. } => "list_by_user",
        Request::ListByHoster { .. } => "list_by_hoster",
        Request::PutSpace { .. } => "put_space",
        Request::PutUser { .. } => "put_user",
    }
}
