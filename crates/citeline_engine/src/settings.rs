use std::time::Duration;

/// Backend connection parameters.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Origin the `/api/...` paths are resolved against.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to request/response calls. Streaming turns are only bounded by
    /// the connect timeout, since an answer may legitimately take minutes.
    pub request_timeout: Duration,
    pub search_max_results: usize,
    pub max_upload_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            search_max_results: 10,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}
