use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{UsageSnapshot, UsageWindow};

const USAGE_ENDPOINT: &str = "https://api.anthropic.com/api/oauth/usage";
const ANTHROPIC_BETA: &str = "oauth-2025-04-20";
const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("usage API returned status {0}")]
    Status(u16),
    #[error("usage request failed: {0}")]
    Transport(String),
    #[error("malformed usage response: {0}")]
    Parse(String),
}

/// Performs a single usage fetch with an already discovered bearer token.
pub trait UsageClient {
    fn fetch(&self, token: &str) -> Result<UsageSnapshot, FetchError>;
}

/// Production client talking to the OAuth usage endpoint.
pub struct ApiUsageClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl Default for ApiUsageClient {
    fn default() -> Self {
        Self::new(USAGE_ENDPOINT)
    }
}

impl ApiUsageClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            .build()
            .into();
        ApiUsageClient {
            agent,
            endpoint: endpoint.into(),
        }
    }
}

impl UsageClient for ApiUsageClient {
    fn fetch(&self, token: &str) -> Result<UsageSnapshot, FetchError> {
        let mut response = self
            .agent
            .get(self.endpoint.as_str())
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent())
            .header("anthropic-beta", ANTHROPIC_BETA)
            .call()
            .map_err(|err| match err {
                ureq::Error::StatusCode(code) => FetchError::Status(code),
                other => FetchError::Transport(other.to_string()),
            })?;

        let raw: serde_json::Value = response
            .body_mut()
            .read_json()
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        debug!(response = %raw, "usage API response");

        parse_usage_response(raw, Utc::now())
    }
}

fn user_agent() -> String {
    format!("claude-limitline/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize)]
struct UsageLimitDto {
    utilization: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UsageResponseDto {
    five_hour: Option<UsageLimitDto>,
    seven_day: Option<UsageLimitDto>,
    seven_day_opus: Option<UsageLimitDto>,
    seven_day_sonnet: Option<UsageLimitDto>,
}

impl UsageLimitDto {
    /// A window without a reset time resets "now"; missing utilization reads as 0.
    fn into_window(self, now: DateTime<Utc>) -> UsageWindow {
        UsageWindow::new(self.resets_at.unwrap_or(now), self.utilization.unwrap_or(0.0))
    }
}

/// Convert a usage response body into a snapshot. The body must be a JSON object;
/// each window object is optional and `null` counts as absent.
pub fn parse_usage_response(
    raw: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<UsageSnapshot, FetchError> {
    if !raw.is_object() {
        return Err(FetchError::Parse("expected a JSON object".to_string()));
    }
    let dto: UsageResponseDto =
        serde_json::from_value(raw.clone()).map_err(|e| FetchError::Parse(e.to_string()))?;

    Ok(UsageSnapshot {
        five_hour: dto.five_hour.map(|w| w.into_window(now)),
        seven_day: dto.seven_day.map(|w| w.into_window(now)),
        seven_day_opus: dto.seven_day_opus.map(|w| w.into_window(now)),
        seven_day_sonnet: dto.seven_day_sonnet.map(|w| w.into_window(now)),
        raw,
    })
}

fn deserialize_optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    if let Some(s) = opt {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a local port and return its URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
                line.clear();
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{addr}/api/oauth/usage")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_full_response() {
        let body = json!({
            "five_hour": { "utilization": 42.5, "resets_at": "2025-06-01T14:00:00+00:00" },
            "seven_day": { "utilization": 61.0, "resets_at": "2025-06-03T09:00:00Z" },
            "seven_day_opus": null,
            "seven_day_sonnet": { "utilization": 104.0, "resets_at": "2025-06-03T09:00:00Z" }
        });

        let snapshot = parse_usage_response(body, now()).expect("valid body");
        let five = snapshot.five_hour.expect("five hour window");
        assert_eq!(five.percent_used, 42.5);
        assert_eq!(five.reset_at, Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap());
        assert!(!five.is_over_limit);

        assert!(snapshot.seven_day_opus.is_none());
        let sonnet = snapshot.seven_day_sonnet.expect("sonnet window");
        assert_eq!(sonnet.percent_used, 104.0);
        assert!(sonnet.is_over_limit);
        assert_eq!(snapshot.raw["seven_day"]["utilization"], 61.0);
    }

    #[test]
    fn test_missing_fields_default() {
        let body = json!({ "five_hour": {} });
        let snapshot = parse_usage_response(body, now()).expect("valid body");
        let five = snapshot.five_hour.expect("five hour window");
        assert_eq!(five.percent_used, 0.0);
        assert_eq!(five.reset_at, now());
        assert!(snapshot.seven_day.is_none());
    }

    #[test]
    fn test_malformed_response_is_parse_error() {
        assert!(matches!(
            parse_usage_response(json!("nope"), now()),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            parse_usage_response(json!({ "five_hour": { "utilization": "high" } }), now()),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            parse_usage_response(json!({ "seven_day": { "resets_at": "tomorrow" } }), now()),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_error_status_maps_to_status_error() {
        let client = ApiUsageClient::new(serve_once("500 Internal Server Error", ""));
        assert!(matches!(client.fetch("sk-ant-oat01-test"), Err(FetchError::Status(500))));

        let client = ApiUsageClient::new(serve_once("401 Unauthorized", "{}"));
        assert!(matches!(client.fetch("sk-ant-oat01-test"), Err(FetchError::Status(401))));
    }

    #[test]
    fn test_fetch_success_and_bad_body() {
        let body = r#"{"five_hour": {"utilization": 12.0, "resets_at": "2025-06-01T14:00:00Z"}}"#;
        let client = ApiUsageClient::new(serve_once("200 OK", body));
        let snapshot = client.fetch("sk-ant-oat01-test").expect("usage");
        assert_eq!(snapshot.five_hour.map(|w| w.percent_used), Some(12.0));

        let client = ApiUsageClient::new(serve_once("200 OK", "not json"));
        assert!(matches!(client.fetch("sk-ant-oat01-test"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ApiUsageClient::new(format!("http://{addr}/api/oauth/usage"));
        assert!(matches!(client.fetch("sk-ant-oat01-test"), Err(FetchError::Transport(_))));
    }
}
