use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATA_PATH: &str = "data/focus_grid.json";
pub const DEFAULT_HEARTBEAT_SECS: u64 = 4;

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub data_path: PathBuf,
    /// `None` disables the heartbeat watchdog.
    pub heartbeat_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            heartbeat_timeout: Some(Duration::from_secs(DEFAULT_HEARTBEAT_SECS)),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, keeping defaults for unset or unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(raw) = lookup("HOST") {
            match raw.trim().parse() {
                Ok(host) => settings.host = host,
                Err(_) => warn!("ignoring HOST={raw}: not an IP address"),
            }
        }

        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse() {
                Ok(port) => settings.port = port,
                Err(_) => warn!("ignoring PORT={raw}: not a port number"),
            }
        }

        if let Some(path) = lookup("APP_DATA_PATH").filter(|path| !path.trim().is_empty()) {
            settings.data_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("HEARTBEAT_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(0) => settings.heartbeat_timeout = None,
                Ok(secs) => settings.heartbeat_timeout = Some(Duration::from_secs(secs)),
                Err(_) => warn!("ignoring HEARTBEAT_TIMEOUT_SECS={raw}: not a whole number"),
            }
        }

        settings
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_bind_localhost() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.addr().to_string(), "127.0.0.1:8000");
    }

    #[test]
    fn env_overrides_apply() {
        let settings = Settings::from_lookup(lookup(&[
            ("PORT", "9123"),
            ("APP_DATA_PATH", "/tmp/grid.json"),
            ("HEARTBEAT_TIMEOUT_SECS", "10"),
            ("HOST", "0.0.0.0"),
        ]));
        assert_eq!(settings.port, 9123);
        assert_eq!(settings.data_path, PathBuf::from("/tmp/grid.json"));
        assert_eq!(settings.heartbeat_timeout, Some(Duration::from_secs(10)));
        assert_eq!(settings.addr().to_string(), "0.0.0.0:9123");
    }

    #[test]
    fn zero_timeout_disables_watchdog() {
        let settings = Settings::from_lookup(lookup(&[("HEARTBEAT_TIMEOUT_SECS", "0")]));
        assert_eq!(settings.heartbeat_timeout, None);
    }

    #[test]
    fn garbage_values_keep_defaults() {
        let settings = Settings::from_lookup(lookup(&[("PORT", "eighty"), ("HEARTBEAT_TIMEOUT_SECS", "-1")]));
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(
            settings.heartbeat_timeout,
            Some(Duration::from_secs(DEFAULT_HEARTBEAT_SECS))
        );
    }
}
