// src/resolver/http.rs
// =============================================================================
// This module looks up neighbors from the remote neighbors service.
//
// Request:  GET <service_url>/<percent-encoded node id>
// Response: {"node": "...", "neighbors": ["...", "..."]}
//
// Failure modes (all reported as ResolveError, none of them fatal):
// - Connection / DNS / redirect errors
// - Per-call timeout (default 15 seconds)
// - Non-2xx HTTP status
// - Body that isn't JSON, or has no `neighbors` array
//
// Each worker gets its own reqwest Client from connect(), so no connection
// state is shared between workers. It is closed when the worker drops it.
//
// Rust concepts:
// - async/await: For network I/O
// - Result<T, E> and ?: For error propagation
// - serde_json::Value: For loosely-typed JSON inspection
// =============================================================================

use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use url::Url;

use super::{NeighborResolver, ResolveError, ResolverFactory};
use crate::traverse::NodeId;

/// The public graph service the crawler talks to by default.
pub const DEFAULT_SERVICE_URL: &str = "http://hollywood-graph-crawler.bridgesuncc.org/neighbors/";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

// Same cap reqwest uses by default, spelled out so it's visible.
const MAX_REDIRECTS: usize = 10;

/// Configuration shared by every HTTP resolver of a run.
#[derive(Debug, Clone)]
pub struct HttpResolverFactory {
    service_url: Url,
    timeout: Duration,
}

impl HttpResolverFactory {
    /// Validates the service URL. Node ids are appended to it as one extra
    /// path segment.
    pub fn new(service_url: &str, timeout: Duration) -> Result<Self, ResolveError> {
        let service_url = Url::parse(service_url).map_err(|e| {
            ResolveError::Init(format!("invalid service URL '{}': {}", service_url, e))
        })?;

        if service_url.cannot_be_a_base()
            || !(service_url.scheme() == "http" || service_url.scheme() == "https")
        {
            return Err(ResolveError::Init(format!(
                "service URL must be an http(s) URL with a path: {}",
                service_url
            )));
        }

        Ok(Self {
            service_url,
            timeout,
        })
    }

    /// Builds the lookup URL for one node.
    ///
    /// Example:
    ///   service = "http://host/neighbors/", node = "Kevin Bacon"
    ///   result  = "http://host/neighbors/Kevin%20Bacon"
    fn lookup_url(&self, node: &str) -> Url {
        let mut url = self.service_url.clone();
        // Only fails for cannot-be-a-base URLs, which new() rejects.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(node);
        }
        url
    }
}

impl ResolverFactory for HttpResolverFactory {
    type Resolver = HttpResolver;

    fn connect(&self) -> Result<Self::Resolver, ResolveError> {
        // A new client per worker: its connection pool is private to that worker
        let client = Client::builder()
            .timeout(self.timeout)  // covers connect + request + body
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))  // follow 3xx
            .build()
            .map_err(|e| ResolveError::Init(e.to_string()))?;

        Ok(HttpResolver {
            client,
            factory: self.clone(),
        })
    }
}

/// One worker's HTTP session with the neighbors service.
#[derive(Debug)]
pub struct HttpResolver {
    client: Client,
    factory: HttpResolverFactory,
}

impl NeighborResolver for HttpResolver {
    fn resolve(
        &mut self,
        node: &str,
    ) -> impl Future<Output = Result<Vec<NodeId>, ResolveError>> + Send {
        // Build everything the request needs up front so the returned future
        // owns its data and doesn't borrow `self`
        let url = self.factory.lookup_url(node);
        let node = node.to_owned();
        let client = self.client.clone();  // cheap: Client is reference counted

        async move {
            debug!("GET {}", url);

            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| categorize_error(&node, e))?;

            // Redirects were already followed, so anything but 2xx is a failure
            let status = response.status();
            if !status.is_success() {
                return Err(ResolveError::Status {
                    node,
                    status: status.as_u16(),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| categorize_error(&node, e))?;

            parse_neighbors(&node, &body)
        }
    }
}

// Timeouts get their own variant, everything else stays a transport error
fn categorize_error(node: &str, error: reqwest::Error) -> ResolveError {
    if error.is_timeout() {
        ResolveError::Timeout {
            node: node.to_owned(),
        }
    } else {
        ResolveError::Transport {
            node: node.to_owned(),
            source: error,
        }
    }
}

/// Extracts the `neighbors` array from a response body.
///
/// Entries that aren't strings are skipped.
pub fn parse_neighbors(node: &str, body: &str) -> Result<Vec<NodeId>, ResolveError> {
    let malformed = |reason: String| ResolveError::Malformed {
        node: node.to_owned(),
        reason,
    };

    // Parse loosely first, so we can say exactly what was wrong with the shape
    let document: Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

    let items = match document.get("neighbors") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(malformed("`neighbors` is not an array".to_string())),
        None => return Err(malformed("missing `neighbors` field".to_string())),
    };

    // Keep only string entries
    let neighbors: Vec<NodeId> = items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_owned))
        .collect();

    if neighbors.len() != items.len() {
        debug!(
            "skipped {} non-string neighbor(s) of '{}'",
            items.len() - neighbors.len(),
            node
        );
    }

    Ok(neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    // What the test server answers for one request path
    struct Canned {
        status_line: &'static str,
        location: Option<String>,
        body: &'static str,
    }

    impl Canned {
        fn ok(body: &'static str) -> Self {
            Self {
                status_line: "200 OK",
                location: None,
                body,
            }
        }

        fn redirect(to: &str) -> Self {
            Self {
                status_line: "302 Found",
                location: Some(to.to_string()),
                body: "",
            }
        }
    }

    // Serves the same canned response for every path.
    async fn spawn_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, mpsc::UnboundedReceiver<String>) {
        spawn_routed_server(move |_path| Canned {
            status_line,
            location: None,
            body,
        })
        .await
    }

    // Serves responses chosen by request path on localhost and reports each
    // request line.
    async fn spawn_routed_server<R>(route: R) -> (String, mpsc::UnboundedReceiver<String>)
    where
        R: Fn(&str) -> Canned + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };

                // Read until the end of the request headers (GET has no body)
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                // "GET /neighbors/A HTTP/1.1" -> path is the second word
                let text = String::from_utf8_lossy(&request);
                let request_line = text.lines().next().unwrap_or_default().to_string();
                let path = request_line.split(' ').nth(1).unwrap_or("/").to_string();
                let _ = tx.send(request_line);

                let canned = route(&path);
                let location = canned
                    .location
                    .map(|to| format!("Location: {}\r\n", to))
                    .unwrap_or_default();
                let response = format!(
                    "HTTP/1.1 {}\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    canned.status_line,
                    location,
                    canned.body.len(),
                    canned.body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/neighbors/", addr), rx)
    }

    #[test]
    fn test_lookup_url_encodes_node() {
        let factory =
            HttpResolverFactory::new("http://example.com/neighbors/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            factory.lookup_url("Kevin Bacon").as_str(),
            "http://example.com/neighbors/Kevin%20Bacon"
        );
        assert_eq!(
            factory.lookup_url("a/b").as_str(),
            "http://example.com/neighbors/a%2Fb"
        );
    }

    #[test]
    fn test_lookup_url_without_trailing_slash() {
        let factory =
            HttpResolverFactory::new("http://example.com/neighbors", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            factory.lookup_url("A").as_str(),
            "http://example.com/neighbors/A"
        );
    }

    #[test]
    fn test_invalid_service_url() {
        assert!(HttpResolverFactory::new("not a url", DEFAULT_TIMEOUT).is_err());
        assert!(HttpResolverFactory::new("mailto:someone@example.com", DEFAULT_TIMEOUT).is_err());
    }

    #[test]
    fn test_parse_neighbors() {
        let body = r#"{"node": "A", "neighbors": ["B", "C"]}"#;
        let neighbors = parse_neighbors("A", body).unwrap();
        assert_eq!(neighbors, vec!["B", "C"]);
    }

    #[test]
    fn test_parse_skips_non_string_entries() {
        let neighbors = parse_neighbors("A", r#"{"neighbors": ["B", 7, null, "C"]}"#).unwrap();
        assert_eq!(neighbors, vec!["B", "C"]);
    }

    #[test]
    fn test_parse_malformed_payloads() {
        for body in ["", "not json", "{}", r#"{"neighbors": "B"}"#, "[]"] {
            let result = parse_neighbors("A", body);
            assert!(
                matches!(result, Err(ResolveError::Malformed { .. })),
                "body {:?} should be malformed",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_resolve_over_http() {
        let (base, mut requests) = spawn_server("200 OK", r#"{"neighbors": ["B", "C"]}"#).await;
        let factory = HttpResolverFactory::new(&base, DEFAULT_TIMEOUT).unwrap();
        let mut resolver = factory.connect().unwrap();

        let neighbors = resolver.resolve("Kevin Bacon").await.unwrap();
        assert_eq!(neighbors, vec!["B", "C"]);

        let request_line = requests.recv().await.unwrap();
        assert_eq!(request_line, "GET /neighbors/Kevin%20Bacon HTTP/1.1");
    }

    #[tokio::test]
    async fn test_resolve_non_success_status() {
        let (base, _requests) = spawn_server("404 Not Found", "{}").await;
        let factory = HttpResolverFactory::new(&base, DEFAULT_TIMEOUT).unwrap();
        let mut resolver = factory.connect().unwrap();

        let result = resolver.resolve("A").await;
        assert!(matches!(result, Err(ResolveError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_resolve_follows_redirects() {
        let (base, mut requests) = spawn_routed_server(|path| {
            if path.starts_with("/neighbors/") {
                Canned::redirect("/moved/A")
            } else {
                Canned::ok(r#"{"neighbors": ["B"]}"#)
            }
        })
        .await;
        let factory = HttpResolverFactory::new(&base, DEFAULT_TIMEOUT).unwrap();
        let mut resolver = factory.connect().unwrap();

        let neighbors = resolver.resolve("A").await.unwrap();
        assert_eq!(neighbors, vec!["B"]);

        // Both hops reached the server
        assert_eq!(requests.recv().await.unwrap(), "GET /neighbors/A HTTP/1.1");
        assert_eq!(requests.recv().await.unwrap(), "GET /moved/A HTTP/1.1");
    }

    #[tokio::test]
    async fn test_resolve_redirect_loop_is_a_transport_error() {
        // /neighbors/A -> /loop/a -> /loop/b -> /loop/a -> ...
        let (base, _requests) = spawn_routed_server(|path| {
            if path == "/loop/a" {
                Canned::redirect("/loop/b")
            } else {
                Canned::redirect("/loop/a")
            }
        })
        .await;
        let factory = HttpResolverFactory::new(&base, DEFAULT_TIMEOUT).unwrap();
        let mut resolver = factory.connect().unwrap();

        let result = resolver.resolve("A").await;
        assert!(matches!(result, Err(ResolveError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_resolve_times_out() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let base = format!("http://{}/neighbors/", addr);
        let factory = HttpResolverFactory::new(&base, Duration::from_millis(200)).unwrap();
        let mut resolver = factory.connect().unwrap();

        let result = resolver.resolve("A").await;
        assert!(matches!(result, Err(ResolveError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_resolve_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let base = format!("http://{}/neighbors/", addr);
        let factory = HttpResolverFactory::new(&base, DEFAULT_TIMEOUT).unwrap();
        let mut resolver = factory.connect().unwrap();

        let result = resolver.resolve("A").await;
        assert!(matches!(result, Err(ResolveError::Transport { .. })));
    }
}
