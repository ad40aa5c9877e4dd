use notif_dispatch::delivery::twilio::DEFAULT_API_BASE;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5342`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long dispatch workers may take to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Pending notifications the dispatch queue holds before submitters wait
    /// (default: `64`).
    pub dispatch_queue_capacity: usize,
    /// Number of dispatch worker tasks (default: `4`).
    pub dispatch_workers: usize,
    /// Base URL of the SMS/voice provider API.
    pub twilio_api_base: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                  |
    /// |---------------------------|--------------------------|
    /// | `HOST`                    | `0.0.0.0`                |
    /// | `PORT`                    | `5342`                   |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                     |
    /// | `DISPATCH_QUEUE_CAPACITY` | `64`                     |
    /// | `DISPATCH_WORKERS`        | `4`                      |
    /// | `TWILIO_API_BASE`         | `https://api.twilio.com` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5342".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let dispatch_queue_capacity: usize = std::env::var("DISPATCH_QUEUE_CAPACITY")
            .unwrap_or_else(|_| "64".into())
            .parse()
            .expect("DISPATCH_QUEUE_CAPACITY must be a valid usize");

        let dispatch_workers: usize = std::env::var("DISPATCH_WORKERS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("DISPATCH_WORKERS must be a valid usize");

        let twilio_api_base =
            std::env::var("TWILIO_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());

        Self {
            host,
            port,
            request_timeout_secs,
            shutdown_timeout_secs,
            dispatch_queue_capacity,
            dispatch_workers,
            twilio_api_base,
        }
    }
}
