use std::str::FromStr;
use std::time::Duration;

/// Server settings, read from the environment with defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Period of the per-session gravity tick.
    pub gravity_interval: Duration,
    pub leaderboard_depth: usize,
    pub max_connections: u32,
    /// Messages per second allowed on one connection.
    pub rate_limit: u32,
    /// Honor `UpdatePiece`/`UpdateScore` as authoritative overwrites.
    pub trust_client_reports: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            gravity_interval: Duration::from_millis(1000),
            leaderboard_depth: 10,
            max_connections: 100,
            rate_limit: 60,
            trust_client_reports: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PORT", defaults.port),
            gravity_interval: Duration::from_millis(env_or(
                "STACKFALL_GRAVITY_MS",
                defaults.gravity_interval.as_millis() as u64,
            )),
            leaderboard_depth: env_or("STACKFALL_LEADERBOARD_DEPTH", defaults.leaderboard_depth),
            max_connections: env_or("STACKFALL_MAX_CONNECTIONS", defaults.max_connections),
            rate_limit: env_or("STACKFALL_RATE_LIMIT", defaults.rate_limit),
            trust_client_reports: env_or(
                "STACKFALL_TRUST_CLIENT_REPORTS",
                defaults.trust_client_reports,
            ),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}, using default", key, raw);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_parameters() {
        let config = ServerConfig::default();
        assert_eq!(config.gravity_interval, Duration::from_secs(1));
        assert_eq!(config.leaderboard_depth, 10);
        assert!(!config.trust_client_reports);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn bad_values_fall_back() {
        assert_eq!(parse_or("PORT", "not-a-port", 8080u16), 8080);
        assert_eq!(parse_or("PORT", " 9000 ", 8080u16), 9000);
        assert!(parse_or("STACKFALL_TRUST_CLIENT_REPORTS", "true", false));
    }
}
