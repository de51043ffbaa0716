//! Live reload notifications over WebSocket
//!
//! Browsers running a live reload client connect to the listener and are
//! greeted with a `hello` message. Every change notification is then sent to
//! all connected clients; clients whose socket fails are dropped.

use crate::error::{ExecutionError, ExecutionResult};
use serde_json::json;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tungstenite::{Message, WebSocket};

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Greeting sent to every new client
pub fn hello_message() -> String {
    json!({
        "command": "hello",
        "protocols": ["http://livereload.com/protocols/official-7"],
        "serverName": env!("CARGO_PKG_NAME"),
    })
    .to_string()
}

/// Notification that `path` changed
pub fn reload_message(path: &str) -> String {
    json!({
        "command": "reload",
        "path": path,
        "liveCSS": true,
    })
    .to_string()
}

/// Running live reload listener
pub struct ReloadServer {
    addr: SocketAddr,
    clients: Clients,
    tx: Sender<String>,
}

impl ReloadServer {
    /// Bind the listener and start the accept and broadcast threads
    pub fn start(host: &str, port: u16) -> ExecutionResult<Self> {
        let listener = TcpListener::bind((host, port))
            .map_err(|e| ExecutionError::Watch(format!("live reload on {}:{}: {}", host, port, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ExecutionError::Watch(e.to_string()))?;

        let clients: Clients = Arc::new(Mutex::new(Vec::new()));
        spawn_accept(listener, clients.clone());
        let tx = spawn_broadcast(clients.clone());

        Ok(ReloadServer { addr, clients, tx })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of clients currently connected
    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Tell every client that `path` changed
    pub fn changed(&self, path: &str) {
        // The broadcast thread only ends with the process
        let _ = self.tx.send(reload_message(path));
    }
}

fn spawn_accept(listener: TcpListener, clients: Clients) {
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else {
                continue;
            };
            let clients = clients.clone();
            thread::spawn(move || handshake(stream, clients));
        }
    });
}

/// Upgrade one connection and register it
///
/// A peer that never finishes the handshake times out instead of holding
/// the thread forever.
fn handshake(stream: TcpStream, clients: Clients) {
    if stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).is_err() {
        return;
    }
    let Ok(mut socket) = tungstenite::accept(stream) else {
        return;
    };
    if socket.get_ref().set_read_timeout(None).is_err() {
        return;
    }

    // Registered under the lock so no broadcast slips in between
    let Ok(mut clients) = clients.lock() else {
        return;
    };
    if socket.send(Message::text(hello_message())).is_ok() {
        clients.push(socket);
    }
}

fn spawn_broadcast(clients: Clients) -> Sender<String> {
    let (tx, rx) = mpsc::channel::<String>();

    thread::spawn(move || {
        while let Ok(message) = rx.recv() {
            let Ok(mut clients) = clients.lock() else {
                return;
            };
            clients.retain_mut(|socket| socket.send(Message::text(message.clone())).is_ok());
        }
    });

    tx
}
