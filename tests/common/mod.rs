//! Shared utilities for integration tests: a scripted HAL backend and entity types.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use hal_client::entity::{entity_eq, entity_hash};
use hal_client::{
    ClientResult, Configuration, Entity, LinkedResource, MethodTable, MethodTableBuilder, UriSlot,
    WithId, WithUri,
};

/// One scripted response.
#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    body: String,
    location: Option<String>,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            location: None,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            location: None,
        }
    }

    pub fn created(location: &str) -> Self {
        Self {
            status: 201,
            body: String::new(),
            location: Some(location.to_string()),
        }
    }
}

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub body: Option<Value>,
}

type Routes = HashMap<(String, String), VecDeque<Reply>>;

/// HTTP/1.1 backend answering from a route table keyed by method and request target.
///
/// A route with several replies answers them in order and repeats the last.
/// Unknown routes answer 404.
pub struct HalBackend {
    base: Url,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    served: Arc<AtomicUsize>,
}

impl HalBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Mutex<Routes>> = Arc::default();
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();
        let served = Arc::new(AtomicUsize::new(0));

        let (r, q, n) = (routes.clone(), requests.clone(), served.clone());
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let (r, q, n) = (r.clone(), q.clone(), n.clone());
                        tokio::spawn(async move {
                            let _ = serve(socket, r, q, n).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            base: Url::parse(&format!("http://{}", addr)).unwrap(),
            routes,
            requests,
            served,
        }
    }

    /// Requests answered so far, counted before the response is written.
    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of `target` on this backend.
    pub fn url(&self, target: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), target)
    }

    pub fn configuration(&self) -> Configuration {
        Configuration::builder()
            .base_uri(self.base.clone())
            .build()
            .unwrap()
    }

    pub fn on(&self, method: &str, target: &str, reply: Reply) {
        self.on_sequence(method, target, vec![reply]);
    }

    pub fn on_sequence(&self, method: &str, target: &str, replies: Vec<Reply>) {
        self.routes
            .lock()
            .insert((method.to_string(), target.to_string()), replies.into());
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn hits(&self, method: &str, target: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.target == target)
            .count()
    }
}

async fn serve(
    mut socket: TcpStream,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    served: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = serde_json::from_slice(&buf[header_end..]).ok();

    requests.lock().push(Recorded {
        method: method.clone(),
        target: target.clone(),
        body,
    });

    let reply = {
        let mut routes = routes.lock();
        match routes.get_mut(&(method, target)) {
            Some(replies) if replies.len() > 1 => replies.pop_front(),
            Some(replies) => replies.front().cloned(),
            None => None,
        }
    }
    .unwrap_or_else(|| Reply::status(404));
    served.fetch_add(1, Ordering::SeqCst);

    let reason = reqwest::StatusCode::from_u16(reply.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let mut response = format!("HTTP/1.1 {} {}\r\n", reply.status, reason);
    if let Some(location) = &reply.location {
        response.push_str(&format!("Location: {}\r\n", location));
    }
    response.push_str(&format!(
        "Content-Type: application/hal+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.body.len(),
        reply.body
    ));
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(skip)]
    pub uri: UriSlot,
}

impl Parent {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Entity for Parent {
    const KIND: &'static str = "Parent";

    fn resource_path() -> Option<&'static str> {
        Some("/parents")
    }

    fn methods() -> MethodTableBuilder {
        MethodTable::builder(Self::KIND)
            .resource_id("getUri")
            .linked_many::<Child>("getChildren", LinkedResource::new())
            .property("getName")
    }

    fn as_with_uri(&self) -> Option<&dyn WithUri> {
        Some(self)
    }

    fn as_with_uri_mut(&mut self) -> Option<&mut dyn WithUri> {
        Some(self)
    }
}

impl WithUri for Parent {
    fn uri(&self) -> Option<&Url> {
        self.uri.get()
    }

    fn set_uri(&mut self, uri: Url) -> ClientResult<()> {
        self.uri.set(uri)
    }
}

impl WithId for Parent {
    type Id = u64;

    fn id(&self) -> Option<&u64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl PartialEq for Parent {
    fn eq(&self, other: &Self) -> bool {
        entity_eq(self, other, || self.name == other.name)
    }
}

impl Hash for Parent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        entity_hash(self, state, |state| self.name.hash(state));
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Child {
    pub name: String,
    #[serde(skip)]
    pub uri: UriSlot,
}

impl Entity for Child {
    const KIND: &'static str = "Child";

    fn resource_path() -> Option<&'static str> {
        Some("/children")
    }

    fn methods() -> MethodTableBuilder {
        MethodTable::builder(Self::KIND)
            .resource_id("getUri")
            .linked_one::<Parent>("getParent", LinkedResource::new())
            .linked_one::<Child>("getSibling", LinkedResource::new().optional_link(true))
    }

    fn as_with_uri(&self) -> Option<&dyn WithUri> {
        Some(self)
    }

    fn as_with_uri_mut(&mut self) -> Option<&mut dyn WithUri> {
        Some(self)
    }
}

impl WithUri for Child {
    fn uri(&self) -> Option<&Url> {
        self.uri.get()
    }

    fn set_uri(&mut self, uri: Url) -> ClientResult<()> {
        self.uri.set(uri)
    }
}
