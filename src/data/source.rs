//! Upstream endpoints and the HTTP transport used to reach them.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};

use crate::data::payload::Payload;
use crate::domain::Filters;
use crate::error::FetchError;

const ACCEPT_VALUE: &str = "application/json,text/plain,*/*";
const USER_AGENT_VALUE: &str = "Indicium-App/1.0";

/// Anything that can turn a URL into a successful payload within a timeout.
///
/// `Sync` so the provider can attempt several endpoints from a thread pool.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> Result<Payload, FetchError>;
}

/// One candidate endpoint.
///
/// The URL may contain `{year}` and `{round}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub url_template: String,
}

impl Source {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
        }
    }

    /// Concrete URL for the given filter selection.
    pub fn url_for(&self, filters: Filters) -> String {
        self.url_template
            .replace("{year}", filters.year.as_str())
            .replace("{round}", filters.round.as_str())
    }

    /// Whether the filters actually change which dataset is requested.
    pub fn is_filtered(&self) -> bool {
        self.url_template.contains("{year}") || self.url_template.contains("{round}")
    }
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| FetchError::Connect(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<Payload, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .timeout(timeout)
            .send()
            .map_err(|e| classify(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // The body read shares the request timeout.
        let body = resp.text().map_err(|e| classify(e, timeout))?;

        Ok(Payload { body, content_type })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else if err.is_decode() || err.is_body() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Connect(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use crate::domain::{ElectionYear, Round};

    #[test]
    fn placeholders_follow_filters() {
        let source = Source::new("https://data.example/{year}/tour-{round}.csv");
        let filters = Filters {
            year: ElectionYear::Y2017,
            round: Round::First,
        };
        assert!(source.is_filtered());
        assert_eq!(source.url_for(filters), "https://data.example/2017/tour-1.csv");

        let fixed = Source::new("https://data.example/latest.csv");
        assert!(!fixed.is_filtered());
        assert_eq!(fixed.url_for(filters), "https://data.example/latest.csv");
    }

    /// Serve exactly one canned HTTP response on a local port.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/")
    }

    #[test]
    fn http_success_carries_body_and_content_type() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: 12\r\nConnection: close\r\n\r\nInscrits,Vot",
        );
        let transport = HttpTransport::new().unwrap();
        let payload = transport.get(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(payload.body, "Inscrits,Vot");
        assert_eq!(payload.content_type.as_deref(), Some("text/csv"));
    }

    #[test]
    fn http_error_status_is_reported() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let transport = HttpTransport::new().unwrap();
        let err = transport.get(&url, Duration::from_secs(5)).unwrap_err();
        assert_eq!(err, FetchError::Status(503));
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        // Accept the connection and then never answer.
        let handle = thread::spawn(move || {
            let conn = listener.accept();
            thread::sleep(Duration::from_millis(800));
            drop(conn);
        });

        let transport = HttpTransport::new().unwrap();
        let timeout = Duration::from_millis(200);
        let err = transport.get(&url, timeout).unwrap_err();
        assert_eq!(err, FetchError::Timeout(timeout));
        let _ = handle.join();
    }

    #[test]
    fn refused_connection_is_a_connect_error() {
        // Bind then drop to obtain a port nobody listens on.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let transport = HttpTransport::new().unwrap();
        let err = transport.get(&format!("http://{addr}/"), Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, FetchError::Connect(_)));
    }
}
