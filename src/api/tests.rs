use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::catalog::stub::StubCatalog;
use crate::config::Config;
use crate::db::SqliteRepository;
use crate::server::{build_app, AppState};
use crate::share;

struct TestApp {
    _dir: TempDir,
    router: Router,
    catalog: Arc<StubCatalog>,
}

async fn app_with(catalog: StubCatalog, yaml: &str) -> TestApp {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let db = Arc::new(SqliteRepository::new(path.to_str().unwrap()).await.unwrap());
    let config = Config::from_yaml(yaml).unwrap();
    let catalog = Arc::new(catalog);
    let state = AppState::new(config, db, catalog.clone());
    TestApp {
        _dir: dir,
        router: build_app(state),
        catalog,
    }
}

async fn app() -> TestApp {
    app_with(StubCatalog::default(), "auth:\n  autoregister: true\n").await
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "movies.test");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &TestApp, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login() {
    let app = app().await;
    let token = login(&app, "alice").await;

    let (status, me) = send(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "alice");

    // Same user, wrong password.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_first_logins_share_one_user() {
    let app = app().await;
    let (a, b) = tokio::join!(login(&app, "erin"), login(&app, "erin"));

    let (status, me_a) = send(&app, Method::GET, "/api/users/me", Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, me_b) = send(&app, Method::GET, "/api/users/me", Some(&b), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me_a["id"], me_b["id"]);
}

#[tokio::test]
async fn test_login_without_autoregister() {
    let app = app_with(StubCatalog::default(), "{}").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "nobody", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_watched_requires_auth() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/watched", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/watched", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_twice_keeps_one_entry() {
    let app = app().await;
    let token = login(&app, "u1").await;
    let movie = json!({"movie_id": 5, "title": "Alien", "poster_path": "/alien.jpg"});

    let (status, first) = send(&app, Method::POST, "/api/watched", Some(&token), Some(movie.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["added"], true);

    let (status, second) = send(&app, Method::POST, "/api/watched", Some(&token), Some(movie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["added"], false);
    assert_eq!(second["entry"]["added_at"], first["entry"]["added_at"]);

    let (_, list) = send(&app, Method::GET, "/api/watched", Some(&token), None).await;
    assert_eq!(list["watched_movies"].as_array().unwrap().len(), 1);

    let (_, status) = send(&app, Method::GET, "/api/watched/5", Some(&token), None).await;
    assert_eq!(status["watched"], true);
    // The catalog was never needed.
    assert_eq!(app.catalog.calls(), 0);
}

#[tokio::test]
async fn test_add_by_id_uses_catalog() {
    let app = app().await;
    let token = login(&app, "u1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/watched",
        Some(&token),
        Some(json!({"movie_id": 603})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entry"]["title"], "Movie 603");
    assert_eq!(body["entry"]["poster_path"], "/603.jpg");
}

#[tokio::test]
async fn test_add_by_id_catalog_failure() {
    let app = app_with(StubCatalog::failing(&[13]), "auth:\n  autoregister: true\n").await;
    let token = login(&app, "u1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/watched",
        Some(&token),
        Some(json!({"movie_id": 13})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to add movie to watched list");

    let (_, list) = send(&app, Method::GET, "/api/watched", Some(&token), None).await;
    assert!(list["watched_movies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_missing_is_noop() {
    let app = app().await;
    let token = login(&app, "u1").await;
    send(
        &app,
        Method::POST,
        "/api/watched",
        Some(&token),
        Some(json!({"movie_id": 7, "title": "Se7en"})),
    )
    .await;

    let (status, body) = send(&app, Method::DELETE, "/api/watched/5", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);

    let (_, list) = send(&app, Method::GET, "/api/watched", Some(&token), None).await;
    assert_eq!(list["watched_movies"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::DELETE, "/api/watched/7", Some(&token), None).await;
    assert_eq!(body["removed"], true);
}

#[tokio::test]
async fn test_title_filter() {
    let app = app().await;
    let token = login(&app, "u1").await;
    for (id, title) in [(1, "The Matrix"), (2, "Heat"), (3, "The Matrix Reloaded")] {
        send(
            &app,
            Method::POST,
            "/api/watched",
            Some(&token),
            Some(json!({"movie_id": id, "title": title})),
        )
        .await;
    }

    let (_, list) = send(&app, Method::GET, "/api/watched?filter=matrix", Some(&token), None).await;
    assert_eq!(list["watched_movies"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_share_round_trip() {
    let app = app().await;
    let token = login(&app, "u1").await;
    for id in [101, 202, 303] {
        send(
            &app,
            Method::POST,
            "/api/watched",
            Some(&token),
            Some(json!({"movie_id": id, "title": format!("Title {}", id)})),
        )
        .await;
    }

    let (status, link) = send(&app, Method::GET, "/api/watched/share", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let share_token = link["token"].as_str().unwrap();
    assert!(link["url"]
        .as_str()
        .unwrap()
        .starts_with("http://movies.test/share?list="));

    let mut ids = share::decode(share_token);
    ids.sort();
    assert_eq!(ids, vec![101, 202, 303]);

    // Anyone with the link can resolve it.
    let uri = format!("/api/share?list={}", share_token);
    let (status, shared) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let movies = shared["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 3);
    assert_eq!(movies[0]["title"], format!("Movie {}", share::decode(share_token)[0]));
}

#[tokio::test]
async fn test_share_url_uses_public_url() {
    let app = app_with(
        StubCatalog::default(),
        "public_url: https://movies.example.com\nauth:\n  autoregister: true\n",
    )
    .await;
    let token = login(&app, "u1").await;

    let (_, link) = send(&app, Method::GET, "/api/watched/share", Some(&token), None).await;
    assert!(link["url"]
        .as_str()
        .unwrap()
        .starts_with("https://movies.example.com/share?list="));
}

#[tokio::test]
async fn test_shared_list_errors() {
    let app = app_with(StubCatalog::failing(&[202]), "{}").await;

    let (status, body) = send(&app, Method::GET, "/api/share", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No shared list found.");

    let (status, _) = send(&app, Method::GET, "/api/share?list=garbage!!", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/share?list={}", share::codec::encode_ids(&[101, 202, 303]));
    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Failed to load shared movies. The link might be invalid or expired."
    );
    assert!(body.get("movies").is_none());
}

#[tokio::test]
async fn test_catalog_browsing() {
    let app = app().await;

    let (status, page) = send(&app, Method::GET, "/api/movies/popular?page=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 2);
    assert_eq!(page["results"].as_array().unwrap().len(), 3);

    let (_, trending) = send(&app, Method::GET, "/api/movies/trending", None, None).await;
    assert_eq!(trending["results"][0]["id"], 10);

    let (_, movie) = send(&app, Method::GET, "/api/movies/550", None, None).await;
    assert_eq!(movie["title"], "Movie 550");
}

#[tokio::test]
async fn test_search() {
    let app = app().await;

    let (status, results) = send(&app, Method::GET, "/api/movies/search?query=ab", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(results.as_array().unwrap().is_empty());
    assert_eq!(app.catalog.calls(), 0);

    let (_, results) = send(&app, Method::GET, "/api/movies/search?query=alien", None, None).await;
    assert_eq!(results.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_chat() {
    let app = app().await;
    let token = login(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(&token),
        Some(json!({"text": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/api/chat", None, Some(json!({"text": "hi"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    send(&app, Method::POST, "/api/chat", Some(&token), Some(json!({"text": "hello"}))).await;
    send(&app, Method::POST, "/api/chat/603", Some(&token), Some(json!({"text": "neo!"}))).await;

    let (_, lobby) = send(&app, Method::GET, "/api/chat", None, None).await;
    let lobby = lobby.as_array().unwrap();
    assert_eq!(lobby.len(), 1);
    assert_eq!(lobby[0]["username"], "alice");
    assert_eq!(lobby[0]["text"], "hello");

    let (_, room) = send(&app, Method::GET, "/api/chat/603", None, None).await;
    assert_eq!(room[0]["text"], "neo!");
}

#[tokio::test]
async fn test_live_chat_stream() {
    use futures::StreamExt;

    let app = app().await;
    let token = login(&app, "alice").await;

    let req = Request::builder()
        .uri("/api/stream/chat/603")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    let mut events = response.into_body().into_data_stream();

    send(&app, Method::POST, "/api/chat", Some(&token), Some(json!({"text": "lobby"}))).await;
    send(&app, Method::POST, "/api/chat/603", Some(&token), Some(json!({"text": "neo!"}))).await;

    let chunk = tokio::time::timeout(std::time::Duration::from_secs(5), events.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(text.starts_with("event: message\n"), "{}", text);
    assert!(text.contains("\"text\":\"neo!\""));
    assert!(text.contains("\"room\":\"movie:603\""));
}

#[tokio::test]
async fn test_reviews() {
    let app = app().await;
    let token = login(&app, "bob").await;

    let (status, review) = send(
        &app,
        Method::POST,
        "/api/movies/603/reviews",
        Some(&token),
        Some(json!({"content": "Whoa."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = review["id"].as_i64().unwrap();

    let uri = format!("/api/reviews/{}/upvote", id);
    let (_, upvoted) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(upvoted["upvotes"], 1);

    let (status, _) = send(&app, Method::POST, "/api/reviews/9999/upvote", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, reviews) = send(&app, Method::GET, "/api/movies/603/reviews", None, None).await;
    assert_eq!(reviews[0]["upvotes"], 1);
    assert_eq!(reviews[0]["username"], "bob");
}

#[tokio::test]
async fn test_preferences() {
    let app = app().await;
    let token = login(&app, "carol").await;

    let (_, prefs) = send(&app, Method::GET, "/api/preferences", Some(&token), None).await;
    assert_eq!(prefs["dark_mode"], false);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/preferences",
        Some(&token),
        Some(json!({"dark_mode": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, prefs) = send(&app, Method::GET, "/api/preferences", Some(&token), None).await;
    assert_eq!(prefs["dark_mode"], true);
}

#[tokio::test]
async fn test_robots_and_fallback() {
    let app = app().await;
    let req = Request::builder().uri("/robots.txt").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repeated_slashes_reach_route() {
    let app = app().await;
    // The route's own 404 carries a JSON error; the plain fallback does not.
    let (status, body) = send(&app, Method::GET, "//api//share", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No shared list found.");

    let token = login(&app, "carol").await;
    let (status, me) = send(&app, Method::GET, "/api///users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "carol");
}

#[derive(Clone, Default)]
struct Capture(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_request_logs_omit_query_token() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::NEW)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = app().await;
    let token = login(&app, "dave").await;
    let uri = format!("/api/users/me?api_key={}", token);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("/api/users/me"));
    assert!(!output.contains(&token));
}
