use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use blogbase_backend::config::{Config, WebConfig};
use blogbase_backend::helper::token_helpers::TokenIssuer;
use blogbase_backend::models::db_operations::users_db_operations;
use blogbase_backend::models::{Identity, Role};
use blogbase_backend::routes;
use blogbase_backend::setup::db_setup::{create_memory_pool, create_pool};
use blogbase_backend::DbPool;
use chrono::Duration;
use serde_json::{json, Value};
use std::time::Instant;
use uuid::Uuid;

const SECRET: &str = "integration-test-signing-key-0123456789";

fn test_config() -> Config {
    Config {
        web: WebConfig { host: "127.0.0.1".to_string(), port: 0 },
        database_path: "/tmp".to_string(),
        images_path: std::env::temp_dir().join("blogbase-test-images").display().to_string(),
        allowed_origins: String::new(),
        log_level: "debug".to_string(),
        jwt_secret_key: SECRET.to_string(),
        jwt_issuer: "https://blogbase.test".to_string(),
        jwt_audience: "https://blogbase.test".to_string(),
        jwt_expiry_minutes: 15,
        password_hash_cost: 4,
    }
}

fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET.as_bytes(), "https://blogbase.test", "https://blogbase.test", Duration::minutes(15))
}

fn bearer(roles: &[Role]) -> (header::HeaderName, String) {
    let identity = Identity { id: Uuid::new_v4(), email: "someone@example.com".to_string(), password_hash: String::new() };
    let token = token_issuer().issue_token(&identity, roles).unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

macro_rules! init_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(token_issuer()))
                .configure(routes::config_api),
        )
        .await
    };
}

fn pool() -> DbPool {
    create_memory_pool().unwrap()
}

#[actix_web::test]
async fn writer_routes_reject_missing_and_reader_tokens() {
    let pool = pool();
    let app = init_app!(pool);
    let body = json!({ "name": "Rust", "urlHandle": "rust" });

    let req = test::TestRequest::post().uri("/api/categories").set_json(&body).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer(&[Role::Reader]))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get().uri("/api/categories/count").to_request();
    let count: i64 = test::call_and_read_body_json(&app, req).await;
    assert_eq!(count, 0);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer(&[Role::Reader, Role::Writer]))
        .set_json(&body)
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["name"], "Rust");
    assert_eq!(created["urlHandle"], "rust");
}

#[actix_web::test]
async fn category_listing_filters_sorts_and_pages() {
    let pool = pool();
    let app = init_app!(pool);

    for name in ["Delta", "Alpha", "Charlie", "Bravo", "HTML5"] {
        let req = test::TestRequest::post()
            .uri("/api/categories")
            .insert_header(bearer(&[Role::Writer]))
            .set_json(json!({ "name": name, "urlHandle": name.to_lowercase() }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let names = |value: Value| -> Vec<String> {
        value.as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap().to_string()).collect()
    };

    let req = test::TestRequest::get()
        .uri("/api/categories?sortBy=name&sortDirection=asc&pageNumber=2&pageSize=2")
        .to_request();
    assert_eq!(names(test::call_and_read_body_json(&app, req).await), vec!["Charlie", "Delta"]);

    let req = test::TestRequest::get().uri("/api/categories?sortBy=NAME").to_request();
    assert_eq!(
        names(test::call_and_read_body_json(&app, req).await),
        vec!["HTML5", "Delta", "Charlie", "Bravo", "Alpha"]
    );

    let req = test::TestRequest::get().uri("/api/categories?query=tml").to_request();
    assert_eq!(names(test::call_and_read_body_json(&app, req).await), vec!["HTML5"]);

    let req = test::TestRequest::get().uri("/api/categories/count?query=tml").to_request();
    let count: i64 = test::call_and_read_body_json(&app, req).await;
    assert_eq!(count, 1);

    let req = test::TestRequest::get().uri("/api/categories/count?query=A").to_request();
    let count: i64 = test::call_and_read_body_json(&app, req).await;
    assert_eq!(count, 4);
}

#[actix_web::test]
async fn category_lookup_update_and_delete() {
    let pool = pool();
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer(&[Role::Writer]))
        .set_json(json!({ "name": "Old", "urlHandle": "old" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/categories/{}", id))
        .insert_header(bearer(&[Role::Writer]))
        .set_json(json!({ "name": "New", "urlHandle": "new" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["name"], "New");

    let req = test::TestRequest::put()
        .uri(&format!("/api/categories/{}", Uuid::new_v4()))
        .insert_header(bearer(&[Role::Writer]))
        .set_json(json!({ "name": "Ghost", "urlHandle": "ghost" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/categories/{}", id))
        .insert_header(bearer(&[Role::Writer]))
        .to_request();
    let removed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(removed["urlHandle"], "new");

    let req = test::TestRequest::get().uri(&format!("/api/categories/{}", id)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn blog_post_lifecycle_replaces_categories() {
    let pool = pool();
    let app = init_app!(pool);

    let mut category_ids = Vec::new();
    for name in ["A", "B", "C"] {
        let req = test::TestRequest::post()
            .uri("/api/categories")
            .insert_header(bearer(&[Role::Writer]))
            .set_json(json!({ "name": name, "urlHandle": name.to_lowercase() }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        category_ids.push(created["id"].as_str().unwrap().to_string());
    }
    let (a, b, c) = (&category_ids[0], &category_ids[1], &category_ids[2]);

    let post_body = |url_handle: &str, categories: Vec<String>| {
        json!({
            "title": "Hello",
            "shortDescription": "Short",
            "content": "Body",
            "featuredImageUrl": "",
            "urlHandle": url_handle,
            "publishedDate": "2024-03-01T09:30:00Z",
            "author": "Sam",
            "isVisible": true,
            "categories": categories,
        })
    };
    let category_ids_of = |post: &Value| -> Vec<String> {
        let mut ids: Vec<String> = post["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    };
    let sorted = |mut ids: Vec<String>| {
        ids.sort();
        ids
    };

    let req = test::TestRequest::post()
        .uri("/api/blogposts")
        .insert_header(bearer(&[Role::Writer]))
        .set_json(post_body("hello", vec![a.clone(), b.clone(), Uuid::new_v4().to_string()]))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(category_ids_of(&created), sorted(vec![a.clone(), b.clone()]));
    let post_id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri("/api/blogposts/hello").to_request();
    let by_handle: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(by_handle["id"], post_id.as_str());

    let req = test::TestRequest::put()
        .uri(&format!("/api/blogposts/{}", post_id))
        .insert_header(bearer(&[Role::Writer]))
        .set_json(post_body("hello", vec![b.clone(), c.clone()]))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(category_ids_of(&updated), sorted(vec![b.clone(), c.clone()]));

    let req = test::TestRequest::get().uri(&format!("/api/blogposts/{}", post_id)).to_request();
    let stored: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(category_ids_of(&stored), sorted(vec![b.clone(), c.clone()]));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/blogposts/{}", post_id))
        .insert_header(bearer(&[Role::Writer]))
        .to_request();
    let removed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(removed["urlHandle"], "hello");

    let req = test::TestRequest::get().uri(&format!("/api/blogposts/{}", post_id)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/blogposts").to_request();
    let all: Value = test::call_and_read_body_json(&app, req).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn login_does_not_reveal_which_part_was_wrong() {
    let pool = pool();
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "reader@example.com", "password": "Passw0rd!" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "reader@example.com", "password": "wrong" }))
        .to_request();
    let wrong_password = test::call_service(&app, req).await;
    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    let wrong_password: Value = test::read_body_json(wrong_password).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "Passw0rd!" }))
        .to_request();
    let unknown_email = test::call_service(&app, req).await;
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);
    let unknown_email: Value = test::read_body_json(unknown_email).await;

    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["errors"], json!(["Email or Password Incorrect"]));

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "reader@example.com", "password": "Passw0rd!" }))
        .to_request();
    let login: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(login["email"], "reader@example.com");
    assert_eq!(login["roles"], json!(["Reader"]));

    let claims = token_issuer().verify(login["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.roles, vec!["Reader".to_string()]);
}

#[actix_web::test]
async fn registration_reports_validation_messages() {
    let pool = pool();
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "weak@example.com", "password": "weak" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("at least 6 characters")));
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("digit")));
}

#[actix_web::test]
async fn malformed_bodies_get_a_validation_problem() {
    let pool = pool();
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer(&[Role::Writer]))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"name\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "One or more validation errors occurred.");
    assert_eq!(body["status"], 400);

    let req = test::TestRequest::post()
        .uri("/api/blogposts")
        .insert_header(bearer(&[Role::Writer]))
        .set_json(json!({ "title": "Hello", "urlHandle": "hello", "categories": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().contains("publishedDate"));

    let req = test::TestRequest::get().uri("/api/categories?pageNumber=two").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
}

#[actix_web::test]
async fn password_hashing_does_not_stall_other_requests() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_pool(&dir.path().join("blogbase.db")).unwrap();
    {
        let conn = pool.get().unwrap();
        let identity = users_db_operations::create_user(&conn, "slow@example.com", "Passw0rd!", 11).unwrap();
        users_db_operations::add_user_to_role(&conn, identity.id, Role::Reader).unwrap();
    }
    let app = init_app!(pool);

    let login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "slow@example.com", "password": "Passw0rd!" }))
        .to_request();
    let count = test::TestRequest::get().uri("/api/categories/count").to_request();

    let started = Instant::now();
    let (login_done, count_done) = futures_util::join!(
        async {
            let resp = test::call_service(&app, login).await;
            assert_eq!(resp.status(), StatusCode::OK);
            started.elapsed()
        },
        async {
            let resp = test::call_service(&app, count).await;
            assert_eq!(resp.status(), StatusCode::OK);
            started.elapsed()
        }
    );

    assert!(count_done < login_done, "count finished at {:?}, login at {:?}", count_done, login_done);
}
