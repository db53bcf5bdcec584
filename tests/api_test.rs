//! End-to-end tests for the HTTP API.
//!
//! Each test builds the full router over a fresh on-disk database and image
//! directory, then drives it request by request with `oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use photoshare::config::Config;
use photoshare::db;
use photoshare::routes;
use photoshare::state::AppState;

const BOUNDARY: &str = "photoshare-test-boundary";

struct TestApp {
    router: Router,
    config: Config,
    _dir: TempDir,
}

fn setup() -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.resolve_paths(dir.path());

    let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let router = routes::app(AppState {
        db: pool,
        config: config.clone(),
    });
    TestApp {
        router,
        config,
        _dir: dir,
    }
}

struct Outcome {
    status: StatusCode,
    body: Value,
    cookie: Option<String>,
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> Outcome {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap_or(json!(null))
        };
        Outcome {
            status,
            body,
            cookie,
        }
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Outcome {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    async fn register(&self, login_name: &str, first_name: &str) -> String {
        let r = self
            .call(
                "POST",
                "/api/user",
                None,
                Some(json!({
                    "login_name": login_name,
                    "password": "pw",
                    "first_name": first_name,
                    "last_name": "Jones",
                })),
            )
            .await;
        assert_eq!(r.status, StatusCode::CREATED, "register failed: {}", r.body);
        r.body["_id"].as_str().unwrap().to_string()
    }

    /// Log in and return the `name=value` cookie pair.
    async fn login(&self, login_name: &str) -> String {
        let r = self
            .call(
                "POST",
                "/admin/login",
                None,
                Some(json!({ "login_name": login_name, "password": "pw" })),
            )
            .await;
        assert_eq!(r.status, StatusCode::OK, "login failed: {}", r.body);
        r.cookie.expect("login sets a session cookie")
    }

    async fn upload(&self, cookie: &str, file_name: &str, data: &[u8]) -> Outcome {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{f}\"\r\nContent-Type: image/png\r\n\r\n",
                b = BOUNDARY,
                f = file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/photo/photos/new")
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    async fn new_photo(&self, cookie: &str) -> String {
        let r = self.upload(cookie, "shot.png", b"\x89PNG fake image").await;
        assert_eq!(r.status, StatusCode::CREATED, "upload failed: {}", r.body);
        r.body["_id"].as_str().unwrap().to_string()
    }
}

// -- Root --

#[tokio::test]
async fn root_greets() {
    let app = setup();
    let r = app.call("GET", "/", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert!(r.body["message"].as_str().unwrap().contains("photo-sharing"));
}

// -- Registration and login --

#[tokio::test]
async fn register_login_comment_scenario() {
    let app = setup();

    let r = app
        .call(
            "POST",
            "/api/user",
            None,
            Some(json!({
                "loginName": "bob1",
                "password": "pw",
                "firstName": "Bob",
                "lastName": "Jones",
            })),
        )
        .await;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["login_name"], "bob1");
    let bob_id = r.body["_id"].as_str().unwrap().to_string();

    let r = app
        .call(
            "POST",
            "/admin/login",
            None,
            Some(json!({ "login_name": "bob1", "password": "pw" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["_id"], bob_id.as_str());
    assert_eq!(r.body["first_name"], "Bob");
    assert_eq!(r.body["last_name"], "Jones");
    let cookie = r.cookie.unwrap();
    assert!(cookie.starts_with(&format!("{}=", app.config.auth.cookie_name)));

    let photo_id = app.new_photo(&cookie).await;
    let r = app
        .call(
            "POST",
            &format!("/api/comment/commentsOfPhoto/{}", photo_id),
            Some(&cookie),
            Some(json!({ "comment": "nice shot" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["comment"], "nice shot");
    assert_eq!(r.body["user"]["first_name"], "Bob");
    assert_eq!(r.body["user"]["_id"], bob_id.as_str());
    assert!(r.body["user"].get("password").is_none());

    let r = app
        .call(
            "GET",
            &format!("/api/comment/commentsOfPhoto/{}", photo_id),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(r.status, StatusCode::OK);
    let comments = r.body.as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["comment"], "nice shot");
    assert_eq!(comments[0]["user"]["_id"], bob_id.as_str());
}

#[tokio::test]
async fn duplicate_registration_keeps_one_record() {
    let app = setup();
    app.register("bob1", "Bob").await;

    let r = app
        .call(
            "POST",
            "/api/user",
            None,
            Some(json!({
                "login_name": "bob1",
                "password": "other",
                "first_name": "Robert",
                "last_name": "Smith",
            })),
        )
        .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "Login name already exists.");

    let r = app.call("GET", "/api/user/list", None, None).await;
    let users = r.body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["first_name"], "Bob");
}

#[tokio::test]
async fn registration_requires_core_fields() {
    let app = setup();
    let r = app
        .call(
            "POST",
            "/api/user",
            None,
            Some(json!({ "login_name": "bob1", "password": "pw" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert!(r.body["error"].as_str().unwrap().contains("Required fields"));
}

#[tokio::test]
async fn bad_credentials_do_not_reveal_which_part_was_wrong() {
    let app = setup();
    app.register("bob1", "Bob").await;

    let wrong_password = app
        .call(
            "POST",
            "/admin/login",
            None,
            Some(json!({ "login_name": "bob1", "password": "nope" })),
        )
        .await;
    let unknown_user = app
        .call(
            "POST",
            "/admin/login",
            None,
            Some(json!({ "login_name": "ghost", "password": "pw" })),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password.status, unknown_user.status);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert!(wrong_password.cookie.is_none());
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = setup();
    let r = app
        .call("POST", "/admin/login", None, Some(json!({ "login_name": "bob1" })))
        .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "Login name and password are required");

    app.register("bob1", "Bob").await;
    let r = app
        .call(
            "POST",
            "/admin/login",
            None,
            Some(json!({ "login_name": "   ", "password": "pw" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "Login name and password are required");
    assert!(r.cookie.is_none());
}

#[tokio::test]
async fn unknown_routes_and_methods_answer_in_json() {
    let app = setup();

    let r = app.call("GET", "/api/nothing/here", None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    assert_eq!(r.body["error"], "Not found");

    let r = app.call("PUT", "/admin/login", None, None).await;
    assert_eq!(r.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(r.body["error"], "Method not allowed");
}

#[tokio::test]
async fn malformed_json_is_a_json_400() {
    let app = setup();
    let req = Request::builder()
        .method("POST")
        .uri("/admin/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let r = app.send(req).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert!(r.body["error"].is_string());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = setup();
    app.register("bob1", "Bob").await;
    let cookie = app.login("bob1").await;

    let r = app.call("POST", "/admin/logout", Some(&cookie), None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["message"], "Logged out successfully");

    let r = app.call("POST", "/admin/logout", Some(&cookie), None).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);

    let r = app.call("POST", "/admin/logout", None, None).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "No user is currently logged in");

    let r = app
        .call(
            "GET",
            "/api/comment/commentsOfPhoto/anything",
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
}

// -- User directory --

#[tokio::test]
async fn user_detail_hides_password_and_rejects_bad_ids() {
    let app = setup();
    let bob_id = app.register("bob1", "Bob").await;

    let r = app.call("GET", &format!("/api/user/{}", bob_id), None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["login_name"], "bob1");
    assert_eq!(r.body["first_name"], "Bob");
    assert!(r.body.get("password").is_none());

    let r = app.call("GET", "/api/user/not-an-id", None, None).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "Invalid user ID");

    let unknown = uuid::Uuid::now_v7();
    let r = app.call("GET", &format!("/api/user/{}", unknown), None, None).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "User not found");
}

#[tokio::test]
async fn user_list_exposes_display_fields_only() {
    let app = setup();
    app.register("bob1", "Bob").await;
    app.register("ann", "Ann").await;

    let r = app.call("GET", "/api/user/list", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    let users = r.body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        let mut keys: Vec<&str> = user.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["_id", "first_name", "last_name"]);
    }
}

// -- Comments and replies --

#[tokio::test]
async fn comment_endpoints_require_a_session() {
    let app = setup();
    let r = app
        .call(
            "POST",
            "/api/comment/commentsOfPhoto/some-photo",
            None,
            Some(json!({ "comment": "hi" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
    assert_eq!(r.body["error"], "Unauthorized");

    let r = app
        .call(
            "POST",
            "/api/comment/commentsOfPhoto/some-photo",
            Some("photoshare_session=forged"),
            Some(json!({ "comment": "hi" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn comment_validation_and_missing_photo() {
    let app = setup();
    app.register("bob1", "Bob").await;
    let cookie = app.login("bob1").await;
    let photo_id = app.new_photo(&cookie).await;

    let r = app
        .call(
            "POST",
            &format!("/api/comment/commentsOfPhoto/{}", photo_id),
            Some(&cookie),
            Some(json!({ "comment": "   " })),
        )
        .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "Comment text cannot be empty");

    let r = app
        .call(
            "POST",
            "/api/comment/commentsOfPhoto/no-such-photo",
            Some(&cookie),
            Some(json!({ "comment": "hi" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    assert_eq!(r.body["error"], "Photo not found");

    let r = app
        .call(
            "GET",
            &format!("/api/comment/commentsOfPhoto/{}", photo_id),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(r.body, json!([]));
}

#[tokio::test]
async fn replies_thread_under_their_comment() {
    let app = setup();
    app.register("bob1", "Bob").await;
    app.register("ann", "Ann").await;
    let bob = app.login("bob1").await;
    let ann = app.login("ann").await;
    let photo_id = app.new_photo(&bob).await;

    let r = app
        .call(
            "POST",
            &format!("/api/comment/commentsOfPhoto/{}", photo_id),
            Some(&ann),
            Some(json!({ "comment": "great colours" })),
        )
        .await;
    let comment_id = r.body["_id"].as_str().unwrap().to_string();

    let r = app
        .call(
            "POST",
            &format!(
                "/api/comment/commentsOfPhoto/{}/{}/reply",
                photo_id, comment_id
            ),
            Some(&bob),
            Some(json!({ "comment": "thank you" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["comment"], "thank you");
    assert_eq!(r.body["user"]["first_name"], "Bob");

    let r = app
        .call(
            "GET",
            &format!("/api/comment/commentsOfPhoto/{}", photo_id),
            Some(&ann),
            None,
        )
        .await;
    let comments = r.body.as_array().unwrap();
    assert_eq!(comments[0]["user"]["first_name"], "Ann");
    assert_eq!(comments[0]["replies"][0]["comment"], "thank you");
    assert_eq!(comments[0]["replies"][0]["user"]["first_name"], "Bob");
}

#[tokio::test]
async fn reply_to_comment_on_another_photo_is_rejected() {
    let app = setup();
    app.register("bob1", "Bob").await;
    let cookie = app.login("bob1").await;
    let first = app.new_photo(&cookie).await;
    let second = app.new_photo(&cookie).await;

    let r = app
        .call(
            "POST",
            &format!("/api/comment/commentsOfPhoto/{}", second),
            Some(&cookie),
            Some(json!({ "comment": "on the second photo" })),
        )
        .await;
    let foreign_comment = r.body["_id"].as_str().unwrap().to_string();

    let r = app
        .call(
            "POST",
            &format!(
                "/api/comment/commentsOfPhoto/{}/{}/reply",
                first, foreign_comment
            ),
            Some(&cookie),
            Some(json!({ "comment": "misplaced" })),
        )
        .await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    assert_eq!(r.body["error"], "Comment not found");

    let r = app
        .call(
            "GET",
            &format!("/api/comment/commentsOfPhoto/{}", second),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(r.body[0]["replies"], json!([]));
}

// -- Photos --

#[tokio::test]
async fn uploaded_photo_is_listed_and_served() {
    let app = setup();
    let bob_id = app.register("bob1", "Bob").await;
    let cookie = app.login("bob1").await;

    let r = app.upload(&cookie, "sunset.PNG", b"pixel-data").await;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["user_id"], bob_id.as_str());
    let file_name = r.body["file_name"].as_str().unwrap().to_string();
    assert!(file_name.ends_with(".png"));
    assert!(app.config.uploads_path().join(&file_name).exists());

    let r = app
        .call(
            "GET",
            &format!("/api/photo/photosOfUser/{}", bob_id),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(r.status, StatusCode::OK);
    let photos = r.body.as_array().unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0]["file_name"], file_name.as_str());

    let req = Request::builder()
        .uri(format!("/images/{}", file_name))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"pixel-data");
}

#[tokio::test]
async fn empty_or_missing_upload_is_rejected() {
    let app = setup();
    app.register("bob1", "Bob").await;
    let cookie = app.login("bob1").await;

    let r = app.upload(&cookie, "empty.png", b"").await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "No file provided");

    let r = app
        .call("POST", "/api/photo/photos/new", Some(&cookie), Some(json!({})))
        .await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    assert_eq!(r.body["error"], "No file provided");
}

#[tokio::test]
async fn upload_requires_a_session() {
    let app = setup();
    let r = app.upload("photoshare_session=nope", "a.png", b"data").await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_the_owner_deletes_a_photo() {
    let app = setup();
    app.register("bob1", "Bob").await;
    app.register("ann", "Ann").await;
    let bob = app.login("bob1").await;
    let ann = app.login("ann").await;
    let photo_id = app.new_photo(&bob).await;
    let uri = format!("/api/photo/photos/{}", photo_id);

    let r = app.call("DELETE", &uri, Some(&ann), None).await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);

    let r = app.call("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(r.status, StatusCode::OK);

    let r = app.call("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    assert_eq!(r.body["error"], "Photo not found");

    let r = app
        .call(
            "GET",
            &format!("/api/comment/commentsOfPhoto/{}", photo_id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn images_refuse_unknown_and_traversal_names() {
    let app = setup();
    let r = app.call("GET", "/images/missing.png", None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    assert_eq!(r.body["error"], "Image not found");

    let r = app.call("GET", "/images/..%2Fphotoshare.db", None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
}
