use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size_mb: u64,
    pub redis_url: Option<String>,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_connect_retries: usize,
    pub job_key_prefix: String,
    pub job_ttl_secs: u64,
    pub poll_interval_ms: u64,
    pub cleanup_interval_ms: u64,
    pub lease_timeout_secs: u64,
    pub classify_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            max_file_size_mb: 100,
            redis_url: None,
            redis_host: "localhost".to_string(),
            redis_port: 6380,
            redis_connect_retries: 6,
            job_key_prefix: "job:".to_string(),
            job_ttl_secs: 24 * 60 * 60,
            poll_interval_ms: 1000,
            cleanup_interval_ms: 60 * 60 * 1000,
            lease_timeout_secs: 600,
            classify_timeout_ms: 60_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Costruisce la configurazione da una sorgente chiave/valore arbitraria.
    /// I valori non interpretabili mantengono il default.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("RILEVO_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("RILEVO_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Some(size) = lookup("RILEVO_MAX_FILE_SIZE_MB") {
            if let Ok(s) = size.parse() {
                config.max_file_size_mb = s;
            }
        }

        if let Some(url) = lookup("REDIS_URL") {
            if !url.trim().is_empty() {
                config.redis_url = Some(url);
            }
        }

        if let Some(host) = lookup("REDIS_HOST") {
            config.redis_host = host;
        }

        if let Some(port) = lookup("REDIS_PORT") {
            if let Ok(p) = port.parse() {
                config.redis_port = p;
            }
        }

        if let Some(retries) = lookup("REDIS_CONNECT_RETRIES") {
            if let Ok(r) = retries.parse() {
                config.redis_connect_retries = r;
            }
        }

        if let Some(prefix) = lookup("JOB_KEY_PREFIX") {
            if !prefix.is_empty() {
                config.job_key_prefix = prefix;
            }
        }

        if let Some(ttl) = lookup("JOB_TTL_SECONDS") {
            if let Ok(t) = ttl.parse::<u64>() {
                if t > 0 {
                    config.job_ttl_secs = t;
                }
            }
        }

        if let Some(interval) = lookup("POLL_INTERVAL_MS") {
            if let Ok(i) = interval.parse::<u64>() {
                if i > 0 {
                    config.poll_interval_ms = i;
                }
            }
        }

        if let Some(interval) = lookup("CLEANUP_INTERVAL_MS") {
            if let Ok(i) = interval.parse::<u64>() {
                if i > 0 {
                    config.cleanup_interval_ms = i;
                }
            }
        }

        if let Some(lease) = lookup("JOB_LEASE_TIMEOUT_SECS") {
            if let Ok(l) = lease.parse() {
                config.lease_timeout_secs = l;
            }
        }

        if let Some(timeout) = lookup("CLASSIFY_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse::<u64>() {
                if t > 0 {
                    config.classify_timeout_ms = t;
                }
            }
        }

        config
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// URL di connessione allo store: `REDIS_URL` se presente, altrimenti host/porta
    pub fn redis_url(&self) -> String {
        self.redis_url
            .clone()
            .unwrap_or_else(|| format!("redis://{}:{}", self.redis_host, self.redis_port))
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn lease_timeout(&self) -> Duration {
        Duration::from_secs(self.lease_timeout_secs)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_millis(self.classify_timeout_ms)
    }
}
