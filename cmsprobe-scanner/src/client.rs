use crate::error::{Result, ScanError};
use crate::result::{LookupOutcome, LookupResults, WhatCmsResponse};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://whatcms.org/API/Tech";
pub const DEFAULT_DELAY_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Progress notifications emitted while a batch of lookups runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupEvent {
    /// About to request `url`, the `index`-th (zero based) of `total`.
    Requesting {
        index: usize,
        total: usize,
        url: String,
    },
    /// `url` will be reported as unretrieved.
    Failed { url: String, reason: String },
    /// Pausing before the next request.
    Waiting { delay: Duration },
}

pub type ProgressCallback = Arc<dyn Fn(LookupEvent) + Send + Sync>;

pub struct WhatCmsClient {
    client: Client,
    api_key: String,
    base_url: Url,
    delay: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl WhatCmsClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cmsprobe/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(ScanError::Client)?;

        let base_url = Url::parse(DEFAULT_API_URL).map_err(|e| ScanError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            progress_callback: None,
        })
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Look up every URL in order, pausing for the configured delay after
    /// each one (failures and the final URL included).
    pub async fn lookup_all(&self, urls: &[String]) -> LookupResults {
        info!(
            "Looking up {} URL(s) against {} with a {:?} delay",
            urls.len(),
            self.base_url,
            self.delay
        );

        let mut results = LookupResults::new();
        let total = urls.len();

        for (index, url) in urls.iter().enumerate() {
            self.report(LookupEvent::Requesting {
                index,
                total,
                url: url.clone(),
            });

            let outcome = self.lookup(url).await;
            results.record(outcome);

            if !self.delay.is_zero() {
                self.report(LookupEvent::Waiting { delay: self.delay });
            }
            tokio::time::sleep(self.delay).await;
        }

        info!(
            "Lookups complete: {} retrieved, {} unretrieved",
            results.retrieved,
            results.unretrieved.len()
        );
        results
    }

    /// Look up a single URL, folding every failure into
    /// [`LookupOutcome::Failure`].
    pub async fn lookup(&self, url: &str) -> LookupOutcome {
        match self.fetch(url).await {
            Ok(response) => {
                debug!(
                    "{}: {} technologies, {} socials",
                    url,
                    response.results.len(),
                    response.meta.socials.len()
                );
                LookupOutcome::Success {
                    technologies: response.results,
                    socials: response.meta.socials,
                }
            }
            Err(e) => {
                warn!("Lookup failed for {}: {}", url, e);
                self.report(LookupEvent::Failed {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
                LookupOutcome::Failure {
                    url: url.to_string(),
                }
            }
        }
    }

    /// Request and decode the Tech endpoint's answer for `url`.
    ///
    /// The HTTP status is not inspected; success is decided by `Result.Code`
    /// in the body.
    pub async fn fetch(&self, url: &str) -> Result<WhatCmsResponse> {
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[("key", self.api_key.as_str()), ("url", url)])
            .send()
            .await
            .map_err(ScanError::Transport)?;

        debug!("{} answered HTTP {}", url, response.status().as_u16());

        let body = response.bytes().await.map_err(ScanError::Body)?;
        let parsed: WhatCmsResponse = serde_json::from_slice(&body)?;

        if !parsed.is_success() {
            return Err(ScanError::Status {
                code: parsed.result.code,
                message: parsed.result.msg,
            });
        }

        Ok(parsed)
    }

    fn report(&self, event: LookupEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Technology;
    use std::sync::Mutex;
    use std::time::Instant;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "Result": {"Code": 200, "Msg": "Success"},
            "Results": [{
                "Name": "nginx",
                "Id": 1,
                "Version": "",
                "Categories": ["Web Servers"],
                "URL": "https://example.com"
            }],
            "Meta": {"Socials": [{
                "Network": "github",
                "URL": "https://github.com/example",
                "Profile": "example"
            }]}
        })
    }

    fn client_for(server: &MockServer) -> WhatCmsClient {
        let base = Url::parse(&format!("{}/API/Tech", server.uri())).unwrap();
        WhatCmsClient::with_timeout("secret", 5)
            .unwrap()
            .with_base_url(base)
            .with_delay(Duration::ZERO)
    }

    /// A base URL nothing is listening on.
    fn closed_port_url() -> Url {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Url::parse(&format!("http://127.0.0.1:{}/API/Tech", port)).unwrap()
    }

    #[tokio::test]
    async fn test_sends_key_and_url_as_query_parameters() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/API/Tech"))
            .and(query_param("key", "secret"))
            .and(query_param("url", "https://example.com/?a=1&b=2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let response = client.fetch("https://example.com/?a=1&b=2").await.unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.meta.socials.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_success_returns_records() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&mock_server)
            .await;

        let outcome = client_for(&mock_server).lookup("https://example.com").await;

        let expected = Technology {
            name: "nginx".to_string(),
            id: 1,
            version: String::new(),
            categories: vec!["Web Servers".to_string()],
            url: "https://example.com".to_string(),
        };
        match outcome {
            LookupOutcome::Success {
                technologies,
                socials,
            } => {
                assert_eq!(technologies, vec![expected]);
                assert_eq!(socials[0].network, "github");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_success_code_is_unretrieved() {
        let mock_server = MockServer::start().await;

        // A 401 in the body fails the lookup even when records are present
        let mut body = success_body();
        body["Result"] = serde_json::json!({"Code": 401, "Msg": "Invalid API key"});

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.fetch("https://example.com").await.unwrap_err();
        assert!(matches!(err, ScanError::Status { code: 401, .. }));

        let outcome = client.lookup("https://example.com").await;
        assert_eq!(
            outcome,
            LookupOutcome::Failure {
                url: "https://example.com".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unparseable_body_is_unretrieved() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.fetch("https://example.com").await.unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_unretrieved() {
        let client = WhatCmsClient::with_timeout("secret", 2)
            .unwrap()
            .with_base_url(closed_port_url())
            .with_delay(Duration::ZERO);

        let err = client.fetch("https://example.com").await.unwrap_err();
        assert!(matches!(err, ScanError::Transport(_)));

        let results = client
            .lookup_all(&["https://example.com".to_string()])
            .await;
        assert!(results.technologies.is_empty());
        assert!(results.socials.is_empty());
        assert_eq!(results.unretrieved, vec!["https://example.com"]);
    }

    #[tokio::test]
    async fn test_truncated_body_is_unretrieved() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promises 500 bytes, sends a fragment, then hangs up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 500\r\n\r\n{\"Result\":")
                    .await;
                let _ = socket.shutdown().await;
            }
        });

        let base = Url::parse(&format!("http://127.0.0.1:{}/API/Tech", port)).unwrap();
        let client = WhatCmsClient::with_timeout("secret", 5)
            .unwrap()
            .with_base_url(base)
            .with_delay(Duration::ZERO);

        let err = client.fetch("https://example.com").await.unwrap_err();
        assert!(matches!(err, ScanError::Body(_)), "got {:?}", err);

        let results = client
            .lookup_all(&["https://example.com".to_string()])
            .await;
        assert_eq!(results.retrieved, 0);
        assert_eq!(results.unretrieved, vec!["https://example.com"]);
    }

    #[tokio::test]
    async fn test_lookup_all_preserves_failure_order_and_counts() {
        let mock_server = MockServer::start().await;

        let mut failure = success_body();
        failure["Result"] = serde_json::json!({"Code": 404, "Msg": "Not found"});

        for bad in ["https://bad-one.example", "https://bad-two.example"] {
            Mock::given(method("GET"))
                .and(query_param("url", bad))
                .respond_with(ResponseTemplate::new(200).set_body_json(failure.clone()))
                .mount(&mock_server)
                .await;
        }
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&mock_server)
            .await;

        let urls: Vec<String> = [
            "https://bad-two.example",
            "https://good.example",
            "https://bad-one.example",
            "https://also-good.example",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let results = client_for(&mock_server).lookup_all(&urls).await;

        assert_eq!(
            results.unretrieved,
            vec!["https://bad-two.example", "https://bad-one.example"]
        );
        assert_eq!(results.retrieved, 2);
        assert_eq!(results.total(), urls.len());
        assert_eq!(results.technologies.len(), 2);
        assert_eq!(results.socials.len(), 2);
    }

    #[tokio::test]
    async fn test_delay_applies_after_every_url() {
        let mock_server = MockServer::start().await;

        let mut failure = success_body();
        failure["Result"] = serde_json::json!({"Code": 500, "Msg": "Error"});

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(failure))
            .expect(3)
            .mount(&mock_server)
            .await;

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let client = client_for(&mock_server)
            .with_delay(Duration::from_millis(50))
            .with_progress_callback(Arc::new(move |event: LookupEvent| {
                events_clone.lock().unwrap().push(event);
            }));

        let urls: Vec<String> = (1..=3).map(|i| format!("https://site{}.example", i)).collect();

        let start = Instant::now();
        let results = client.lookup_all(&urls).await;
        let elapsed = start.elapsed();

        assert_eq!(results.unretrieved.len(), 3);
        assert!(
            elapsed >= Duration::from_millis(150),
            "expected three pauses, finished in {:?}",
            elapsed
        );

        let events = events.lock().unwrap();
        let waits = events
            .iter()
            .filter(|e| matches!(e, LookupEvent::Waiting { .. }))
            .count();
        assert_eq!(waits, 3);
        assert_eq!(
            events[0],
            LookupEvent::Requesting {
                index: 0,
                total: 3,
                url: "https://site1.example".to_string()
            }
        );
        assert!(matches!(events[1], LookupEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let results = client_for(&mock_server).lookup_all(&[]).await;
        assert_eq!(results, LookupResults::new());
    }
}
