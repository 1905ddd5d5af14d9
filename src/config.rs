use chrono::FixedOffset;

/// Knobs the engine itself needs. Injected by constructor so tests can
/// substitute their own.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Offset slot instants are rendered in. Spaces are booked in their
    /// local wall-clock hours; the deployment pins one offset for all.
    pub utc_offset: FixedOffset,
    /// When false, display reads never rewrite stale PENDING records.
    pub lazy_expiry: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::west_opt(3 * 3600).expect("static offset"),
            lazy_expiry: true,
        }
    }
}

/// Service-level configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub password: String,
    pub max_connections: usize,
    pub metrics_port: Option<u16>,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let bind = std::env::var("HOURDESK_BIND").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("HOURDESK_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5460);
        let password = std::env::var("HOURDESK_PASSWORD").unwrap_or_else(|_| "hourdesk".into());
        let max_connections = std::env::var("HOURDESK_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256);
        let metrics_port = std::env::var("HOURDESK_METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok());

        let mut engine = EngineConfig::default();
        if let Some(offset) = std::env::var("HOURDESK_UTC_OFFSET")
            .ok()
            .and_then(|s| parse_offset(&s))
        {
            engine.utc_offset = offset;
        }
        if let Ok(raw) = std::env::var("HOURDESK_LAZY_EXPIRY") {
            engine.lazy_expiry = raw != "false" && raw != "0";
        }

        Self {
            bind,
            port,
            password,
            max_connections,
            metrics_port,
            engine,
        }
    }
}

/// Parse an offset of the form `+HH:MM` / `-HH:MM` (or `Z`).
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    if raw == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1i32, &raw[1..]),
        b'-' => (-1i32, &raw[1..]),
        _ => return None,
    };
    let (h, m) = rest.split_once(':')?;
    let hours: i32 = h.parse().ok()?;
    let minutes: i32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_parse_both_signs() {
        assert_eq!(
            parse_offset("-03:00"),
            FixedOffset::west_opt(3 * 3600)
        );
        assert_eq!(
            parse_offset("+05:30"),
            FixedOffset::east_opt(5 * 3600 + 30 * 60)
        );
        assert_eq!(parse_offset("Z"), FixedOffset::east_opt(0));
    }

    #[test]
    fn bad_offsets_rejected() {
        for raw in ["03:00", "-3", "-25:00", "-03:70", "", "UTC"] {
            assert!(parse_offset(raw).is_none(), "{raw} should not parse");
        }
    }

    #[test]
    fn engine_defaults() {
        let cfg = EngineConfig::default();
        assert!(cfg.lazy_expiry);
        assert_eq!(Some(cfg.utc_offset), parse_offset("-03:00"));
    }
}
