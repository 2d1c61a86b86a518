//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::Local;

/// Access log format, parsed once from configuration.
///
/// Any string that is not one of the named formats is treated as a
/// custom pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Combined,
    Common,
    Json,
    Custom(String),
}

impl From<&str> for LogFormat {
    fn from(name: &str) -> Self {
        match name {
            "combined" => Self::Combined,
            "common" => Self::Common,
            "json" => Self::Json,
            pattern => Self::Custom(pattern.to_string()),
        }
    }
}

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request URI path
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    /// Referer header
    pub referer: Option<String>,
    /// User-Agent header
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &LogFormat) -> String {
        match format {
            LogFormat::Combined => self.format_combined(),
            LogFormat::Common => self.format_common(),
            LogFormat::Json => self.format_json(),
            LogFormat::Custom(pattern) => self.format_custom(pattern),
        }
    }

    /// `METHOD /path?query` as it appears in a request line.
    fn request_uri(&self) -> String {
        self.query
            .as_ref()
            .map_or_else(|| self.path.clone(), |q| format!("{}?{}", self.path, q))
    }

    /// Apache/Nginx Combined Log Format
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.request_uri(),
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        // Manual JSON building; the field set is small and fixed.
        let optional = |value: Option<&str>| {
            value.map_or_else(|| "null".to_string(), |v| format!("\"{}\"", escape_json(v)))
        };

        format!(
            r#"{{"remote_addr":"{}","time":"{}","method":"{}","path":"{}","query":{},"http_version":"{}","status":{},"body_bytes":{},"referer":{},"user_agent":{},"request_time_us":{}}}"#,
            escape_json(&self.remote_addr),
            self.time.to_rfc3339(),
            escape_json(&self.method),
            escape_json(&self.path),
            optional(self.query.as_deref()),
            escape_json(&self.http_version),
            self.status,
            self.body_bytes,
            optional(self.referer.as_deref()),
            optional(self.user_agent.as_deref()),
            self.request_time_us,
        )
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client IP address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line ("METHOD /path HTTP/version")
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request URI with query string
    /// - `$status` - Response status code
    /// - `$body_bytes_sent` - Response body size
    /// - `$http_referer` - Referer header
    /// - `$http_user_agent` - User-Agent header
    /// - `$request_time` - Request processing time in seconds (3 decimal places)
    fn format_custom(&self, pattern: &str) -> String {
        let request_uri = self.request_uri();
        let request_line = format!("{} {} HTTP/{}", self.method, request_uri, self.http_version);
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        // $request_* variables must be replaced before $request itself,
        // and the header-derived $http_* variables last so client-sent
        // text is never expanded by a later pass.
        let replacements = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", format!("{request_time:.3}")),
            ("$request_method", self.method.clone()),
            ("$request_uri", request_uri),
            ("$request", request_line),
            ("$status", self.status.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            ("$http_referer", self.referer.as_deref().unwrap_or("-").to_string()),
            ("$http_user_agent", self.user_agent.as_deref().unwrap_or("-").to_string()),
        ];

        let mut result = pattern.to_string();
        for (variable, value) in replacements {
            result = result.replace(variable, &value);
        }
        result
    }
}

/// Escape special characters for JSON string
fn escape_json(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "GET".to_string(),
            "/styles.css".to_string(),
        );
        entry.query = Some("v=3".to_string());
        entry.http_version = "1.1".to_string();
        entry.status = 200;
        entry.body_bytes = 1234;
        entry.referer = Some("https://example.com/jobs".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 1500;
        entry
    }

    #[test]
    fn test_format_name_parsing() {
        assert_eq!(LogFormat::from("combined"), LogFormat::Combined);
        assert_eq!(LogFormat::from("common"), LogFormat::Common);
        assert_eq!(LogFormat::from("json"), LogFormat::Json);
        assert_eq!(
            LogFormat::from("$status $request"),
            LogFormat::Custom("$status $request".to_string())
        );
    }

    #[test]
    fn test_format_combined() {
        let entry = create_test_entry();
        let log = entry.format(&LogFormat::Combined);
        assert!(log.contains("192.168.1.1"));
        assert!(log.contains("GET /styles.css?v=3 HTTP/1.1"));
        assert!(log.contains("200 1234"));
        assert!(log.contains("https://example.com/jobs"));
        assert!(log.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_format_common() {
        let entry = create_test_entry();
        let log = entry.format(&LogFormat::Common);
        assert!(log.contains("192.168.1.1"));
        assert!(log.contains("GET /styles.css?v=3 HTTP/1.1"));
        assert!(log.contains("200 1234"));
        // Common format does not include referer/user-agent
        assert!(!log.contains("https://example.com"));
    }

    #[test]
    fn test_format_json() {
        let entry = create_test_entry();
        let log = entry.format(&LogFormat::Json);
        assert!(log.contains(r#""remote_addr":"192.168.1.1""#));
        assert!(log.contains(r#""method":"GET""#));
        assert!(log.contains(r#""status":200"#));
        assert!(log.contains(r#""body_bytes":1234"#));
    }

    #[test]
    fn test_format_json_escapes_quotes() {
        let mut entry = create_test_entry();
        entry.user_agent = Some("agent \"quoted\"".to_string());
        let log = entry.format(&LogFormat::Json);
        assert!(log.contains(r#""user_agent":"agent \"quoted\"""#));
    }

    #[test]
    fn test_format_custom() {
        let entry = create_test_entry();
        let format = LogFormat::from("$remote_addr - $status - $request_time");
        let log = entry.format(&format);
        assert!(log.contains("192.168.1.1"));
        assert!(log.contains("200"));
        // 1500us rounds to 0.002s at 3 decimal places
        assert!(log.contains("0.002"), "got: {log}");
    }

    #[test]
    fn test_format_custom_request_variables_do_not_collide() {
        let entry = create_test_entry();
        let format = LogFormat::from("$request_uri | $request");
        let log = entry.format(&format);
        assert_eq!(log, "/styles.css?v=3 | GET /styles.css?v=3 HTTP/1.1");
    }

    #[test]
    fn test_format_custom_does_not_expand_header_text() {
        let mut entry = create_test_entry();
        // Variable names arriving in a header must stay literal.
        entry.user_agent = Some("$remote_addr $status".to_string());
        let format = LogFormat::from("$http_user_agent | $remote_addr");
        let log = entry.format(&format);
        assert_eq!(log, "$remote_addr $status | 192.168.1.1");
    }

    #[test]
    fn test_missing_optional_fields_print_dashes() {
        let entry = AccessLogEntry::new(
            "10.0.0.1".to_string(),
            "GET".to_string(),
            "/app.js".to_string(),
        );
        let log = entry.format(&LogFormat::Combined);
        assert!(log.ends_with("\"-\" \"-\""));
        assert!(log.contains("GET /app.js HTTP/1.1"));
    }
}
