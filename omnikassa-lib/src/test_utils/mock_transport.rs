//! Scripted in-memory transport.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::Duration;

use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

type Reply = Result<HttpResponse, TransportError>;

struct Route {
    method: HttpMethod,
    path: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from a script instead of the network.
///
/// Replies are queued per method and path suffix and consumed in order; the
/// last reply of a route is repeated once the queue is down to one entry.
/// Unscripted calls get an empty `404`. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: RwLock<Vec<Route>>,
    requests: RwLock<Vec<HttpRequest>>,
    delay: RwLock<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply for `method` on URLs ending in `path`.
    pub fn reply_json(&self, method: HttpMethod, path: &str, status: u16, body: serde_json::Value) -> &Self {
        self.reply(method, path, HttpResponse::new(status, body.to_string()))
    }

    /// Queue a raw reply.
    pub fn reply(&self, method: HttpMethod, path: &str, response: HttpResponse) -> &Self {
        self.push(method, path, Ok(response))
    }

    /// Queue a transport failure.
    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) -> &Self {
        self.push(method, path, Err(error))
    }

    /// Hold every reply back for `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.write().unwrap() = Some(delay);
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().unwrap().clone()
    }

    /// Number of requests for `method` on URLs ending in `path`.
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && path_matches(&r.url, path))
            .count()
    }

    fn push(&self, method: HttpMethod, path: &str, reply: Reply) -> &Self {
        let mut routes = self.routes.write().unwrap();
        match routes
            .iter_mut()
            .find(|route| route.method == method && route.path == path)
        {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    fn next_reply(&self, request: &HttpRequest) -> Reply {
        let mut routes = self.routes.write().unwrap();
        let route = routes
            .iter_mut()
            .find(|route| route.method == request.method && path_matches(&request.url, &route.path));

        match route {
            Some(route) if route.replies.len() > 1 => route.replies.pop_front().unwrap(),
            Some(route) => route.replies.front().cloned().unwrap(),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

fn path_matches(url: &str, path: &str) -> bool {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query.ends_with(path)
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.write().unwrap().push(request.clone());
        let reply = self.next_reply(&request);

        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
