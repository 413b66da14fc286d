//! HTTP server rendering pages on request

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::CachedStore;
use crate::content::{ContentError, PostRepository, PostStore};
use crate::helpers::TagAnchors;
use crate::og::OgCard;
use crate::render::{PageRenderer, FEED_LIMIT};
use crate::Site;

const HTML: &str = "text/html; charset=utf-8";
const ATOM: &str = "application/atom+xml; charset=utf-8";
const SVG: &str = "image/svg+xml";

/// Shared state of all handlers
pub struct AppState {
    store: Arc<dyn PostStore>,
    pages: PageRenderer,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(store: Arc<dyn PostStore>, pages: PageRenderer, static_dir: PathBuf) -> Self {
        Self {
            store,
            pages,
            static_dir,
        }
    }
}

/// Build the site router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/posts", get(posts_handler))
        .route("/posts/:id", get(post_handler))
        .route("/post/:id", get(post_handler))
        .route("/tags", get(tags_handler))
        .route("/atom.xml", get(feed_handler))
        .route("/api/og", get(og_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16, cache: bool, open: bool) -> Result<()> {
    let cached = cache.then(|| Arc::new(CachedStore::new(site.repository())));
    let store: Arc<dyn PostStore> = match &cached {
        Some(cached) => Arc::clone(cached) as Arc<dyn PostStore>,
        None => Arc::new(site.repository()),
    };

    let pages = PageRenderer::new(&site.config)?;
    let state = Arc::new(AppState::new(store, pages, site.static_dir.clone()));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if cached.is_some() {
        println!("Post cache enabled. Watching {} for changes...", site.posts_dir.display());
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if let Some(cached) = cached {
        let posts_dir = site.posts_dir.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_invalidate(posts_dir, cached) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Clear the cache whenever something in the posts directory changes
fn watch_and_invalidate(posts_dir: PathBuf, cache: Arc<CachedStore<PostRepository>>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(&posts_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", posts_dir);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                for event in &events {
                    tracing::info!("File changed: {}", event.path.display());
                }
                cache.invalidate();
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

async fn home_handler(State(state): State<Arc<AppState>>) -> Response {
    render_page(state, "/".to_string(), HTML, |s| {
        let posts = s.store.list_posts()?;
        s.pages.home(&posts)
    })
    .await
}

async fn posts_handler(State(state): State<Arc<AppState>>) -> Response {
    render_page(state, "/posts".to_string(), HTML, |s| {
        let posts = s.store.list_posts()?;
        s.pages.post_list(&posts)
    })
    .await
}

async fn post_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let path = format!("/posts/{}", id);
    render_page(state, path, HTML, move |s| {
        let post = s.store.get_post(&id)?;
        let anchors = TagAnchors::new(s.store.list_tags()?);
        s.pages.post(&post, &anchors)
    })
    .await
}

async fn tags_handler(State(state): State<Arc<AppState>>) -> Response {
    render_page(state, "/tags".to_string(), HTML, |s| {
        let index = s.store.tag_index()?;
        s.pages.tags(&index)
    })
    .await
}

async fn feed_handler(State(state): State<Arc<AppState>>) -> Response {
    render_page(state, "/atom.xml".to_string(), ATOM, |s| {
        let posts = s
            .store
            .list_posts()?
            .iter()
            .take(FEED_LIMIT)
            .map(|meta| s.store.get_post(&meta.slug))
            .collect::<Result<Vec<_>, _>>()?;
        s.pages.feed(&posts)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct OgQuery {
    title: Option<String>,
    subtitle: Option<String>,
}

async fn og_handler(State(state): State<Arc<AppState>>, Query(query): Query<OgQuery>) -> Response {
    let card = OgCard::from_query(query.title.as_deref(), query.subtitle.as_deref());
    render_page(state, "/api/og".to_string(), SVG, move |s| s.pages.og_image(&card)).await
}

/// Serve files from the static directory, or the 404 page
async fn fallback_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    let mut service = ServeDir::new(&state.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => {
            let missing = path.clone();
            render_page(state, path, HTML, move |_| {
                Err(ContentError::NotFound(missing).into())
            })
            .await
        }
        Err(e) => {
            tracing::error!("Failed to serve {}: {}", path, e);
            internal_error()
        }
    }
}

/// Run a render job on the blocking pool and map its outcome to a response.
///
/// A missing post becomes the 404 page; every other failure is a logged 500.
async fn render_page<F>(
    state: Arc<AppState>,
    path: String,
    content_type: &'static str,
    render: F,
) -> Response
where
    F: FnOnce(&AppState) -> Result<String> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || match render(&state) {
        Ok(body) => Ok((StatusCode::OK, content_type, body)),
        Err(e) if is_not_found(&e) => {
            tracing::debug!("Not found: {}", path);
            match state.pages.not_found(&path) {
                Ok(html) => Ok((StatusCode::NOT_FOUND, HTML, html)),
                Err(e) => Err(e),
            }
        }
        Err(e) => {
            tracing::error!("Failed to render {}: {:#}", path, e);
            Err(e)
        }
    });

    match task.await {
        Ok(Ok((status, content_type, body))) => {
            (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Ok(Err(_)) => internal_error(),
        Err(e) => {
            tracing::error!("Render task failed: {}", e);
            internal_error()
        }
    }
}

fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ContentError>()
        .is_some_and(ContentError::is_not_found)
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
