//! Router-level tests for the login, registration, logout and home flows.
//!
//! Each test drives the real router with in-memory stores and a temporary
//! template directory, carrying the session cookie between requests the way
//! a browser would.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use parlor_core::domain::NewUser;
use parlor_core::ports::{CredentialHasher, UserStore};
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::Level;
use web_lib::{
    adapters::{Argon2Hasher, InMemorySessionStore, InMemoryUserStore},
    config::{Config, UserStoreKind},
    web::{create_router, AppState, SESSION_COOKIE_NAME},
};

const LOGIN_TEMPLATE: &str = r#"<login next="{{next}}">{{#errors}}[{{field}}:{{message}}]{{/errors}}{{^errors}}no-errors{{/errors}}</login>"#;
const CHAT_TEMPLATE: &str = r#"{{> header}}<chat host="{{host}}" port="{{port}}">{{user}}</chat>{{{js_templates}}}{{> footer}}"#;

//=========================================================================================
// Harness
//=========================================================================================

struct TestApp {
    router: Router,
    users: Arc<InMemoryUserStore>,
    sessions: Arc<InMemorySessionStore>,
    hasher: Arc<Argon2Hasher>,
    _templates: TempDir,
    _media: TempDir,
}

fn write_templates(dir: &TempDir, with_login: bool) {
    if with_login {
        fs::write(dir.path().join("login.html"), LOGIN_TEMPLATE).unwrap();
    }
    fs::write(dir.path().join("chat.html"), CHAT_TEMPLATE).unwrap();
    fs::write(
        dir.path().join("header.html"),
        "<header>{{sitename}} | {{page_title}}</header>",
    )
    .unwrap();
    fs::write(dir.path().join("footer.html"), "<footer/>").unwrap();
    fs::write(
        dir.path().join("js-templates.html"),
        "<script>{{author}}</script>",
    )
    .unwrap();
}

fn test_config(templates: &TempDir, media: &TempDir) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        public_host: "chat.test".to_string(),
        port: 8123,
        user_store: UserStoreKind::Memory,
        database_url: String::new(),
        cookie_secret: "test-secret-key-for-testing-only".to_string(),
        site_name: "Parlor Test".to_string(),
        page_title: "Lobby".to_string(),
        media_url: "/media/".to_string(),
        media_root: media.path().to_path_buf(),
        template_root: templates.path().to_path_buf(),
        debug: false,
        session_max_age: Duration::from_secs(3600),
        log_level: Level::INFO,
    }
}

fn build_app(with_login_template: bool) -> TestApp {
    let templates = TempDir::new().unwrap();
    write_templates(&templates, with_login_template);
    let media = TempDir::new().unwrap();
    fs::write(media.path().join("hello.txt"), "hello from media").unwrap();

    let users = Arc::new(InMemoryUserStore::new());
    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(3600)));
    let hasher = Arc::new(Argon2Hasher::new());
    let state = Arc::new(AppState::new(
        Arc::new(test_config(&templates, &media)),
        users.clone(),
        sessions.clone(),
        hasher.clone(),
    ));

    TestApp {
        router: create_router(state),
        users,
        sessions,
        hasher,
        _templates: templates,
        _media: media,
    }
}

fn create_test_app() -> TestApp {
    build_app(true)
}

impl TestApp {
    async fn seed_user(&self, username: &str, password: &str, first_name: &str) {
        let hash = self.hasher.generate(password).unwrap();
        self.users
            .create(NewUser::new(username, hash, first_name, "Tester"))
            .await
            .unwrap();
    }

    fn browser(&self) -> Browser {
        Browser {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Sends requests and keeps the session cookie like a browser would.
struct Browser {
    router: Router,
    cookie: Option<String>,
}

impl Browser {
    async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(form)).await
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

//=========================================================================================
// Login
//=========================================================================================

#[tokio::test]
async fn login_page_renders_with_next_echoed() {
    let app = create_test_app();
    let mut browser = app.browser();

    let response = browser.get("/login?next=/rooms").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"next="/rooms""#));
    assert!(response.body.contains("no-errors"));
}

#[tokio::test]
async fn valid_credentials_authenticate_and_redirect_to_next() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;
    let mut browser = app.browser();
    browser.get("/login").await;

    let response = browser
        .post_form("/login", "username=alice&password=pw&next=/rooms")
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/rooms");

    let home = browser.get("/").await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains(">Alice</chat>"));
}

#[tokio::test]
async fn next_from_the_query_string_is_used_when_the_body_has_none() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;
    let mut browser = app.browser();

    let response = browser
        .post_form("/login?next=/lobby", "username=alice&password=pw")
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/lobby");
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;

    let mut wrong_password = app.browser();
    let bad_pw = wrong_password
        .post_form("/login", "username=alice&password=nope&next=/")
        .await;

    let mut unknown_user = app.browser();
    let no_user = unknown_user
        .post_form("/login", "username=mallory&password=pw&next=/")
        .await;

    for response in [&bad_pw, &no_user] {
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("no-errors"));
        assert!(response.body.contains(r#"next="/""#));
    }
    assert_eq!(bad_pw.body, no_user.body);

    // Both sessions stay anonymous.
    for browser in [&mut wrong_password, &mut unknown_user] {
        let home = browser.get("/").await;
        assert_eq!(home.status, StatusCode::SEE_OTHER);
        assert_eq!(home.location(), "/login?next=/");
    }
}

#[tokio::test]
async fn empty_login_fields_render_validation_errors() {
    let app = create_test_app();
    let mut browser = app.browser();

    let response = browser
        .post_form("/login", "username=&password=&next=/")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body
        .contains("[password:Password is required][username:Username is required]"));
}

#[tokio::test]
async fn unreadable_login_body_is_treated_as_an_empty_form() {
    let app = create_test_app();
    let mut browser = app.browser();

    // No content type, so the form cannot be decoded.
    let response = browser.send(Method::POST, "/login", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Username is required"));
}

#[tokio::test]
async fn off_site_next_values_redirect_home() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;
    let mut browser = app.browser();

    let response = browser
        .post_form(
            "/login",
            "username=alice&password=pw&next=https%3A%2F%2Fevil.example",
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/");
}

#[tokio::test]
async fn next_values_with_control_characters_redirect_home() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;

    for next in ["/%0Aevil", "/%09/evil.example", "/rooms%0D%0ASet-Cookie:%20x=y"] {
        let mut browser = app.browser();
        let response = browser
            .post_form("/login", &format!("username=alice&password=pw&next={}", next))
            .await;

        assert_eq!(response.status, StatusCode::SEE_OTHER, "next={}", next);
        assert_eq!(response.location(), "/", "next={}", next);
        assert_eq!(browser.get("/").await.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn login_issues_a_new_session_cookie() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;
    let mut browser = app.browser();
    browser.get("/login").await;
    let anonymous_cookie = browser.cookie.clone().unwrap();

    let response = browser
        .post_form("/login", "username=alice&password=pw&next=/")
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response.headers.get(SET_COOKIE).is_some());
    assert_ne!(browser.cookie.as_deref(), Some(anonymous_cookie.as_str()));
    assert_eq!(browser.get("/").await.status, StatusCode::OK);
    assert_eq!(app.sessions.len().await, 1);

    // The cookie held before login does not carry the login with it.
    let mut replayed = app.browser();
    replayed.cookie = Some(anonymous_cookie);
    let home = replayed.get("/").await;
    assert_eq!(home.status, StatusCode::SEE_OTHER);
    assert_eq!(home.location(), "/login?next=/");
}

//=========================================================================================
// Registration
//=========================================================================================

#[tokio::test]
async fn registration_creates_user_and_authenticates_session() {
    let app = create_test_app();
    let mut browser = app.browser();

    let response = browser
        .post_form(
            "/register",
            "username=alice&password=pw&firstName=A&lastName=B&next=/",
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/");
    assert!(response.headers.get(SET_COOKIE).is_some());

    let user = app.users.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.display_name, "A");
    assert_eq!(user.first_name, "A");
    assert_eq!(user.last_name, "B");
    assert_ne!(user.password_hash, "pw");
    assert!(app.hasher.verify("pw", &user.password_hash));

    let home = browser.get("/").await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains(">A</chat>"));
}

#[tokio::test]
async fn registered_user_can_log_in_later() {
    let app = create_test_app();
    let mut first_visit = app.browser();
    first_visit
        .post_form(
            "/register",
            "username=alice&password=pw&firstName=A&lastName=B&next=/",
        )
        .await;

    let mut second_visit = app.browser();
    let response = second_visit
        .post_form("/login", "username=alice&password=pw&next=/")
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(second_visit.get("/").await.status, StatusCode::OK);
}

/// Known defect: usernames are not checked for uniqueness, so registering the
/// same name twice creates two accounts.
#[tokio::test]
async fn duplicate_username_registration_currently_succeeds() {
    let app = create_test_app();
    let form = "username=alice&password=pw&firstName=A&lastName=B&next=/";

    let first = app.browser().post_form("/register", form).await;
    let second = app.browser().post_form("/register", form).await;

    assert_eq!(first.status, StatusCode::SEE_OTHER);
    assert_eq!(second.status, StatusCode::SEE_OTHER);
    assert_eq!(app.users.all_with_username("alice").await.len(), 2);
}

#[tokio::test]
async fn invalid_registration_renders_errors_without_creating_a_user() {
    let app = create_test_app();
    let mut browser = app.browser();

    let response = browser
        .post_form("/register", "username=alice&password=pw&next=/")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("[first_name:First name is required]"));
    assert!(response.body.contains("[last_name:Last name is required]"));
    assert_eq!(app.users.len().await, 0);
    assert_eq!(browser.get("/").await.status, StatusCode::SEE_OTHER);
}

//=========================================================================================
// Home & Logout
//=========================================================================================

#[tokio::test]
async fn anonymous_home_redirects_to_login() {
    let app = create_test_app();
    let mut browser = app.browser();

    let response = browser.get("/").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/login?next=/");
}

#[tokio::test]
async fn home_page_merges_partials_and_connection_parameters() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;
    let mut browser = app.browser();
    browser
        .post_form("/login", "username=alice&password=pw&next=/")
        .await;

    let response = browser.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        r#"<header>Parlor Test | Lobby</header><chat host="chat.test" port="8123">Alice</chat><script>{{author}}</script><footer/>"#
    );
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = create_test_app();
    app.seed_user("alice", "pw", "Alice").await;
    let mut browser = app.browser();
    browser
        .post_form("/login", "username=alice&password=pw&next=/")
        .await;
    assert_eq!(browser.get("/").await.status, StatusCode::OK);

    let response = browser.get("/logout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/login");

    let home = browser.get("/").await;
    assert_eq!(home.status, StatusCode::SEE_OTHER);
    assert_eq!(home.location(), "/login?next=/");
}

#[tokio::test]
async fn logout_of_an_anonymous_session_is_harmless() {
    let app = create_test_app();
    let mut browser = app.browser();

    let first = browser.send(Method::POST, "/logout", None).await;
    let second = browser.get("/logout").await;

    assert_eq!(first.location(), "/login");
    assert_eq!(second.location(), "/login");
}

//=========================================================================================
// Sessions, Media & Faults
//=========================================================================================

#[tokio::test]
async fn first_visit_gets_a_readable_session_cookie() {
    let app = create_test_app();
    let mut browser = app.browser();

    let response = browser.get("/login").await;

    let set_cookie = response
        .headers
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE_NAME)));
    assert!(set_cookie.contains("Path=/"));
    assert!(!set_cookie.contains("HttpOnly"));
    assert_eq!(app.sessions.len().await, 1);

    // A returning browser keeps its session and gets no new cookie.
    let again = browser.get("/login").await;
    assert!(again.headers.get(SET_COOKIE).is_none());
    assert_eq!(app.sessions.len().await, 1);
}

#[tokio::test]
async fn forged_session_cookie_is_replaced() {
    let app = create_test_app();
    let mut browser = app.browser();
    browser.cookie = Some(format!("{}=not-a-signed-value", SESSION_COOKIE_NAME));

    let response = browser.get("/").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response.headers.get(SET_COOKIE).is_some());
}

#[tokio::test]
async fn media_files_are_served_and_missing_ones_are_404() {
    let app = create_test_app();
    let mut browser = app.browser();

    let found = browser.get("/media/hello.txt").await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body, "hello from media");

    let missing = browser.get("/media/nope.txt").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_template_is_a_server_error() {
    let app = build_app(false);
    let mut browser = app.browser();

    let response = browser.get("/login").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}
