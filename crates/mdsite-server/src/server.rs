//! HTTP publisher for the artifact store.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tower_http::trace::TraceLayer;

use mdsite_site::dom::Document;
use mdsite_site::{DirEntry, StoreHandle};

/// Configuration for the publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open browser on start
    pub open: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            open: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {0}: {1}")]
    Bind(String, std::io::Error),

    #[error("Server error on {0}: {1}")]
    Serve(SocketAddr, std::io::Error),
}

/// Serves a populated artifact store over HTTP.
pub struct Publisher {
    config: PublisherConfig,
    store: StoreHandle,
}

impl Publisher {
    /// Create a publisher for a store that is already fully built.
    pub fn new(config: PublisherConfig, store: StoreHandle) -> Self {
        Self { config, store }
    }

    /// `host:port` the publisher binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Bind the listener and serve until the process exits.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listen = self.listen_addr();

        let listener = tokio::net::TcpListener::bind(listen.as_str())
            .await
            .map_err(|e| ServerError::Bind(listen.clone(), e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(listen, e))?;

        tracing::info!(
            "Serving {} files at http://{}",
            self.store.len(),
            addr
        );

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        axum::serve(listener, router(self.store))
            .await
            .map_err(|e| ServerError::Serve(addr, e))?;

        Ok(())
    }
}

/// Router mapping every request path directly onto a store path.
pub fn router(store: StoreHandle) -> Router {
    Router::new()
        .fallback(serve_path)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Handler for every request.
async fn serve_path(State(store): State<StoreHandle>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
        )
            .into_response();
    }

    let request_path = uri.path();
    let Some(path) = decode_path(request_path) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if let Some(bytes) = store.read(&path) {
        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        return respond(&method, mime.as_ref(), bytes.to_vec());
    }

    if store.is_dir(&path) {
        // Relative links inside a directory page only resolve with a
        // trailing slash.
        if !request_path.ends_with('/') {
            return Redirect::permanent(&format!("{request_path}/")).into_response();
        }

        let index = join(&path, "index.html");
        if let Some(bytes) = store.read(&index) {
            return respond(&method, "text/html; charset=utf-8", bytes.to_vec());
        }

        let entries = store.list_dir(&path).unwrap_or_default();
        return respond(
            &method,
            "text/html; charset=utf-8",
            directory_listing(request_path, &entries),
        );
    }

    StatusCode::NOT_FOUND.into_response()
}

fn respond(method: &Method, content_type: &str, body: Vec<u8>) -> Response {
    let len = body.len();
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(body)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, len)
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Percent-decode a request path. Returns `None` for paths that do not
/// decode to UTF-8 or that contain `..` segments.
fn decode_path(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(decoded.trim_start_matches('/').to_string())
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Bytes escaped in a listing link.
const LINK_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Plain HTML listing of a directory, one link per entry.
fn directory_listing(request_path: &str, entries: &[DirEntry]) -> Vec<u8> {
    let mut doc = Document::new();
    let root = doc.root();

    let doctype = doc.create_doctype("html".to_string(), String::new(), String::new());
    doc.append(root, doctype);
    let html = doc.create_html_element("html");
    doc.append(root, html);

    let head = doc.create_html_element("head");
    doc.append(html, head);
    let meta = doc.create_html_element("meta");
    doc.set_attr(meta, "charset", "utf-8");
    doc.append(head, meta);
    let title = doc.create_html_element("title");
    doc.append_text(title, &format!("Index of {request_path}"));
    doc.append(head, title);

    let body = doc.create_html_element("body");
    doc.append(html, body);
    let heading = doc.create_html_element("h1");
    doc.append_text(heading, &format!("Index of {request_path}"));
    doc.append(body, heading);

    let list = doc.create_html_element("pre");
    doc.append(body, list);
    for entry in entries {
        let name = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };

        let link = doc.create_html_element("a");
        doc.set_attr(link, "href", utf8_percent_encode(&name, LINK_SEGMENT).to_string());
        doc.append_text(link, &name);
        doc.append(list, link);
        doc.append_text(list, "\n");
    }

    doc.to_bytes()
}
