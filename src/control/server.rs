//! `tiny_http` listener thread for [`ControlApi`].

use std::io::{self, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{info, warn};
use serde_json::json;
use tiny_http::{Header, Request, Response, Server};

use super::routes::{ControlApi, ControlResponse};

/// Running control listener.  Dropping it without [`shutdown`](Self::shutdown)
/// leaves the thread serving until the process exits.
pub struct ControlServer {
    server: Arc<Server>,
    addr: String,
    handle: Option<JoinHandle<()>>,
}

impl ControlServer {
    /// Bind `addr` (e.g. `0.0.0.0:8081`) and serve on a dedicated thread.
    pub fn spawn(addr: &str, mut api: ControlApi) -> io::Result<Self> {
        let server = Arc::new(Server::http(addr).map_err(|e| io::Error::other(e.to_string()))?);
        let addr = server.server_addr().to_string();
        info!("[control] listening on http://{addr}");
        info!("[control] GET /health | GET /runtime | POST /commands");

        let worker = Arc::clone(&server);
        let handle = thread::Builder::new()
            .name("control".into())
            .spawn(move || {
                for request in worker.incoming_requests() {
                    serve(&mut api, request);
                }
                info!("[control] listener stopped");
            })?;

        Ok(Self {
            server,
            addr,
            handle: Some(handle),
        })
    }

    /// Bound address, useful when binding port 0.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Stop accepting requests and join the thread.
    pub fn shutdown(mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("[control] listener thread panicked");
            }
        }
    }
}

/// Largest request body the listener will buffer.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

fn serve(api: &mut ControlApi, mut request: Request) {
    let method = request.method().to_string();
    let url = request.url().to_owned();

    let reply = match read_body(request.as_reader()) {
        Ok(body) => api.handle(&method, &url, &body),
        Err(reply) => reply,
    };

    let mut response = Response::from_string(reply.body.to_string()).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!("[control] {method} {url}: failed to respond: {e}");
    }
}

/// Read at most [`MAX_BODY_BYTES`] of UTF-8.  Oversized bodies get `413`,
/// unreadable ones `400`.
fn read_body(reader: impl Read) -> Result<String, ControlResponse> {
    let mut body = String::new();
    match reader.take(MAX_BODY_BYTES + 1).read_to_string(&mut body) {
        Ok(n) if n as u64 > MAX_BODY_BYTES => {
            warn!("[control] request body over {MAX_BODY_BYTES} bytes rejected");
            Err(ControlResponse {
                status: 413,
                body: json!({ "error": "payload too large", "limit": MAX_BODY_BYTES }),
            })
        }
        Ok(_) => Ok(body),
        Err(e) => Err(ControlResponse {
            status: 400,
            body: json!({ "error": "unreadable body", "details": e.to_string() }),
        }),
    }
}
