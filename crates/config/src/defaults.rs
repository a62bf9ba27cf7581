//! Default values for optional configuration fields

pub fn default_version() -> String {
    "1.0.0".to_string()
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    8080
}

/// 200 MiB
pub fn default_post_body_limit_bytes() -> usize {
    200 * 1024 * 1024
}

pub fn default_body_limit_bytes() -> usize {
    30_000_000
}

pub fn default_allowed_schemes() -> Vec<String> {
    vec!["https".to_string(), "http".to_string()]
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_prefix() -> String {
    "cloudrelay".to_string()
}

pub fn default_bridge_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}
