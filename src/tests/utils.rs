use crate::book::ProspectBook;
use crate::config::RemoteStoreConfig;
use crate::db::connection::Database;
use crate::domain::ProspectDraft;
use crate::notifier::AppointmentNotifier;
use crate::store::{LocalGateway, RemoteGateway};
use astra::{Body, Request, ResponseBuilder, Server};
use chrono::NaiveDate;
use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A fresh SQLite cache in its own temp dir. Keep the `TempDir` alive.
pub fn temp_cache() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db = Database::new(dir.path().join("cache.sqlite3"));
    (dir, db)
}

pub fn draft(name: &str, phone: &str) -> ProspectDraft {
    ProspectDraft::new(name, phone, day(2024, 5, 2))
}

/// One request as seen by a fake server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub auth: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// In-process HTTP server standing in for the record store or the webhook.
pub struct FakeServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeServer {
    pub fn spawn<F>(respond: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    {
        let addr = TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("pick a free port");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        std::thread::spawn(move || {
            let _ = Server::bind(addr).serve(move |req: Request, _info| {
                let mut req = req;
                let mut body = String::new();
                let _ = req.body_mut().reader().read_to_string(&mut body);
                let recorded = Recorded {
                    method: req.method().as_str().to_string(),
                    path: req.uri().path().to_string(),
                    query: req.uri().query().map(str::to_string),
                    auth: req
                        .headers()
                        .get("Authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body,
                };
                let (status, reply) = respond(&recorded);
                log.lock().unwrap().push(recorded);

                ResponseBuilder::new()
                    .status(status)
                    .header("Content-Type", "application/json")
                    .body(Body::from(reply))
                    .unwrap()
            });
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while TcpStream::connect(addr).is_err() {
            assert!(Instant::now() < deadline, "fake server never came up");
            std::thread::sleep(Duration::from_millis(10));
        }

        Self { addr, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait for at least `n` requests (background senders).
    pub fn wait_for(&self, n: usize) -> Vec<Recorded> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let seen = self.requests();
            if seen.len() >= n || Instant::now() > deadline {
                return seen;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

pub fn remote_config(store: &FakeServer) -> RemoteStoreConfig {
    RemoteStoreConfig {
        api_base: store.url("/v0"),
        token: "pat-test".into(),
        base_id: "app1".into(),
        table_id: "Prospects".into(),
    }
}

pub fn local_book(db: Database, webhook: &FakeServer) -> ProspectBook {
    let gateway = LocalGateway::open(db).expect("open local gateway");
    let book = ProspectBook::new(
        Arc::new(gateway),
        AppointmentNotifier::new(webhook.url("/hook")),
    );
    book.load().expect("initial load");
    book
}

pub fn remote_book(store: &FakeServer, webhook: &FakeServer) -> ProspectBook {
    let gateway = RemoteGateway::new(remote_config(store)).expect("build remote gateway");
    ProspectBook::new(
        Arc::new(gateway),
        AppointmentNotifier::new(webhook.url("/hook")),
    )
}

/// Webhook stand-in that accepts everything.
pub fn ok_webhook() -> FakeServer {
    FakeServer::spawn(|_| (200, "{}".to_string()))
}
