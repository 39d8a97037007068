//! Appliance API client

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{header, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use pihole_common::{PiholeConfig, RawSources, RawSummary};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Why a single request to the appliance failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("unexpected response: {0}")]
    Parse(String),
}

/// One attempt per call, no retries, no shared state
pub trait StatsClient: Send + Sync {
    fn fetch_summary(&self) -> impl Future<Output = Result<RawSummary, FetchError>> + Send;

    fn fetch_sources(&self) -> impl Future<Output = Result<RawSources, FetchError>> + Send;

    /// Whether a cycle should request the top sources at all
    fn sources_enabled(&self) -> bool;
}

impl<C: StatsClient> StatsClient for Arc<C> {
    fn fetch_summary(&self) -> impl Future<Output = Result<RawSummary, FetchError>> + Send {
        (**self).fetch_summary()
    }

    fn fetch_sources(&self) -> impl Future<Output = Result<RawSources, FetchError>> + Send {
        (**self).fetch_sources()
    }

    fn sources_enabled(&self) -> bool {
        (**self).sources_enabled()
    }
}

/// Result of one fetch cycle; each category succeeds or fails on its own
#[derive(Debug)]
pub struct FetchOutcome {
    pub summary: Result<RawSummary, FetchError>,

    /// `None` when sources are disabled
    pub sources: Option<Result<RawSources, FetchError>>,
}

impl FetchOutcome {
    /// True when every requested category succeeded
    pub fn is_success(&self) -> bool {
        self.summary.is_ok() && self.sources.as_ref().map_or(true, |s| s.is_ok())
    }
}

/// Run one fetch cycle: summary and, if enabled, sources side by side
pub async fn fetch_cycle<C: StatsClient>(client: &C) -> FetchOutcome {
    if client.sources_enabled() {
        let (summary, sources) =
            futures::future::join(client.fetch_summary(), client.fetch_sources()).await;
        FetchOutcome {
            summary,
            sources: Some(sources),
        }
    } else {
        FetchOutcome {
            summary: client.fetch_summary().await,
            sources: None,
        }
    }
}

/// HTTP client for the appliance's `api.php`
pub struct HttpStatsClient {
    http: Client<HttpConnector, Empty<Bytes>>,
    summary_uri: Uri,
    sources_uri: Option<Uri>,
    timeout: Duration,
}

impl HttpStatsClient {
    pub fn new(config: &PiholeConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.api.api_url).map_err(|e| {
            FetchError::Network(format!("invalid api_url '{}': {}", config.api.api_url, e))
        })?;
        if base.scheme() != "http" {
            return Err(FetchError::Network(format!(
                "unsupported scheme '{}' in api_url, only http is supported",
                base.scheme()
            )));
        }

        let api_key = config.api.api_key.as_str();
        let summary_uri = endpoint(&base, "summaryRaw", api_key)?;
        let sources_uri = if config.sources.show_sources {
            let query = format!("getQuerySources={}", config.sources.sources_count);
            Some(endpoint(&base, &query, api_key)?)
        } else {
            None
        };

        let http = Client::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            http,
            summary_uri,
            sources_uri,
            timeout: Duration::from_millis(config.api.request_timeout),
        })
    }

    /// GET `uri` and decode its JSON body, bounded by the request timeout
    async fn get_json<T: DeserializeOwned>(&self, uri: &Uri) -> Result<T, FetchError> {
        // The query carries the API key, so only the path is logged
        debug!("Requesting {}", uri.path());

        let body = match tokio::time::timeout(self.timeout, self.get_body(uri)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::Network(format!(
                    "request timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        parse_payload(&body)
    }

    async fn get_body(&self, uri: &Uri) -> Result<Bytes, FetchError> {
        let request = Request::get(uri.clone())
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!("appliance answered {}", status)));
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("appliance answered {}", status)));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .to_bytes();
        Ok(body)
    }
}

impl StatsClient for HttpStatsClient {
    async fn fetch_summary(&self) -> Result<RawSummary, FetchError> {
        self.get_json(&self.summary_uri).await
    }

    async fn fetch_sources(&self) -> Result<RawSources, FetchError> {
        match self.sources_uri {
            Some(ref uri) => self.get_json(uri).await,
            None => Ok(RawSources::default()),
        }
    }

    fn sources_enabled(&self) -> bool {
        self.sources_uri.is_some()
    }
}

/// Build `<base>?<query>[&auth=<key>]`
fn endpoint(base: &Url, query: &str, api_key: &str) -> Result<Uri, FetchError> {
    let mut url = base.clone();
    url.set_query(Some(query));
    if !api_key.is_empty() {
        url.query_pairs_mut().append_pair("auth", api_key);
    }
    url.as_str()
        .parse::<Uri>()
        .map_err(|e| FetchError::Network(format!("invalid endpoint: {}", e)))
}

/// Decode an appliance response body.
///
/// The appliance answers `[]` instead of an object when the token is missing or wrong.
pub fn parse_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, FetchError> {
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => {}
        Some(b'[') => {
            return Err(FetchError::Auth(
                "appliance returned an empty result, check api_key".to_string(),
            ))
        }
        _ => return Err(FetchError::Parse("expected a JSON object".to_string())),
    }
    serde_json::from_slice(body).map_err(|e| FetchError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::Response;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    const SUMMARY: &str = r#"{"domains_being_blocked": 120000, "dns_queries_today": 35000,
        "ads_blocked_today": 4200, "ads_percentage_today": 12.0, "status": "enabled"}"#;
    const SOURCES: &str = r#"{"top_sources": {"router.local|192.168.1.1": 42, "192.168.1.9": 5}}"#;

    type Handler = Arc<dyn Fn(&Uri) -> (StatusCode, &'static str) + Send + Sync>;

    /// Minimal appliance stand-in; records every request target it sees
    async fn spawn_appliance(handler: Handler, delay: Duration) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorder = recorder.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let uri = req.uri().clone();
                        recorder.lock().unwrap().push(uri.to_string());
                        let (status, body) = handler(&uri);
                        async move {
                            tokio::time::sleep(delay).await;
                            let response = Response::builder()
                                .status(status)
                                .header("Content-Type", "application/json")
                                .body(Full::new(Bytes::from(body)))
                                .unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        (addr, seen)
    }

    fn routing_handler() -> Handler {
        Arc::new(|uri: &Uri| {
            let query = uri.query().unwrap_or("");
            if query.starts_with("summaryRaw") {
                (StatusCode::OK, SUMMARY)
            } else if query.starts_with("getQuerySources") {
                (StatusCode::OK, SOURCES)
            } else {
                (StatusCode::NOT_FOUND, "{}")
            }
        })
    }

    fn config_for(addr: SocketAddr, api_key: &str) -> PiholeConfig {
        let mut config = PiholeConfig::default();
        config.api.api_url = format!("http://{}/admin/api.php", addr);
        config.api.api_key = api_key.to_string();
        config
    }

    #[tokio::test]
    async fn test_fetch_summary_and_sources() {
        let (addr, seen) = spawn_appliance(routing_handler(), Duration::ZERO).await;
        let client = HttpStatsClient::new(&config_for(addr, "k3y")).unwrap();

        let summary = client.fetch_summary().await.unwrap();
        assert_eq!(
            summary.domains_being_blocked.and_then(|s| s.to_text()).as_deref(),
            Some("120000")
        );

        let sources = client.fetch_sources().await.unwrap().top_sources.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get("router.local|192.168.1.1"), Some(42));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], "/admin/api.php?summaryRaw&auth=k3y");
        assert_eq!(seen[1], "/admin/api.php?getQuerySources=10&auth=k3y");
    }

    #[tokio::test]
    async fn test_auth_omitted_without_key() {
        let (addr, seen) = spawn_appliance(routing_handler(), Duration::ZERO).await;
        let client = HttpStatsClient::new(&config_for(addr, "")).unwrap();

        client.fetch_summary().await.unwrap();
        assert_eq!(seen.lock().unwrap()[0], "/admin/api.php?summaryRaw");
    }

    #[tokio::test]
    async fn test_fetch_cycle_skips_disabled_sources() {
        let (addr, seen) = spawn_appliance(routing_handler(), Duration::ZERO).await;
        let mut config = config_for(addr, "");
        config.sources.show_sources = false;
        let client = HttpStatsClient::new(&config).unwrap();

        let outcome = fetch_cycle(&client).await;
        assert!(outcome.summary.is_ok());
        assert!(outcome.sources.is_none());
        assert!(outcome.is_success());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_key_is_auth_error() {
        let handler: Handler = Arc::new(|_: &Uri| (StatusCode::UNAUTHORIZED, "{}"));
        let (addr, _) = spawn_appliance(handler, Duration::ZERO).await;
        let client = HttpStatsClient::new(&config_for(addr, "wrong")).unwrap();

        let err = client.fetch_summary().await.unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));
    }

    #[tokio::test]
    async fn test_empty_array_body_is_auth_error() {
        let handler: Handler = Arc::new(|_: &Uri| (StatusCode::OK, "[]"));
        let (addr, _) = spawn_appliance(handler, Duration::ZERO).await;
        let client = HttpStatsClient::new(&config_for(addr, "")).unwrap();

        let err = client.fetch_sources().await.unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let handler: Handler = Arc::new(|_: &Uri| (StatusCode::INTERNAL_SERVER_ERROR, "oops"));
        let (addr, _) = spawn_appliance(handler, Duration::ZERO).await;
        let client = HttpStatsClient::new(&config_for(addr, "")).unwrap();

        let err = client.fetch_summary().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let handler: Handler = Arc::new(|_: &Uri| (StatusCode::OK, "<html>pi-hole</html>"));
        let (addr, _) = spawn_appliance(handler, Duration::ZERO).await;
        let client = HttpStatsClient::new(&config_for(addr, "")).unwrap();

        let err = client.fetch_summary().await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_slow_appliance_times_out() {
        let (addr, _) = spawn_appliance(routing_handler(), Duration::from_secs(5)).await;
        let mut config = config_for(addr, "");
        config.api.request_timeout = 100;
        let client = HttpStatsClient::new(&config).unwrap();

        let err = client.fetch_summary().await.unwrap_err();
        assert_eq!(err, FetchError::Network("request timed out after 100ms".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_appliance_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpStatsClient::new(&config_for(addr, "")).unwrap();
        let outcome = fetch_cycle(&client).await;
        assert!(matches!(outcome.summary, Err(FetchError::Network(_))));
        assert!(matches!(outcome.sources, Some(Err(FetchError::Network(_)))));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        let mut config = PiholeConfig::default();
        config.api.api_url = "https://pi.hole/admin/api.php".to_string();
        assert!(matches!(HttpStatsClient::new(&config), Err(FetchError::Network(_))));

        config.api.api_url = "not a url".to_string();
        assert!(matches!(HttpStatsClient::new(&config), Err(FetchError::Network(_))));
    }

    #[test]
    fn test_parse_payload() {
        let summary: RawSummary = parse_payload(b"  {\"ads_blocked_today\": \"4200\"}").unwrap();
        assert!(summary.ads_blocked_today.is_some());

        assert!(matches!(parse_payload::<RawSummary>(b""), Err(FetchError::Parse(_))));
        assert!(matches!(parse_payload::<RawSummary>(b"\n[]"), Err(FetchError::Auth(_))));
        assert!(matches!(
            parse_payload::<RawSummary>(b"{\"ads_blocked_today\": true}"),
            Err(FetchError::Parse(_))
        ));
    }
}
