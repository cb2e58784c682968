mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use common::{ADMIN, TestServer, medication_server};

async fn register_user(client: &reqwest::Client, srv: &TestServer, username: &str) {
    let res = client
        .post(srv.url("/api/users"))
        .basic_auth(ADMIN.0, Some(ADMIN.1))
        .json(&json!({ "username": username, "password": "pw", "role": "ROLE_ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    // The medication service only ever stores plain users.
    assert_eq!(body["role"], "ROLE_USER");
}

async fn create_medication(
    client: &reqwest::Client,
    srv: &TestServer,
    user: &str,
    name: &str,
    quantity: i64,
) -> i64 {
    let res = client
        .post(srv.url("/api/medication"))
        .basic_auth(user, Some("pw"))
        .json(&json!({
            "name": name,
            "manufacturer": "Acme",
            "type": "TABLET",
            "weight": 250,
            "quantity": quantity,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();
    assert_eq!(location, format!("/api/medication/{id}"));
    id
}

#[tokio::test]
async fn health_is_public_and_api_needs_credentials() {
    let srv = medication_server().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/api/medication")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("www-authenticate"));

    let res = client
        .get(srv.url("/api/medication"))
        .basic_auth(ADMIN.0, Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let srv = medication_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &srv, "alice").await;

    let res = client
        .get(srv.url("/api/users"))
        .basic_auth("alice", Some("pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url("/api/users"))
        .basic_auth(ADMIN.0, Some(ADMIN.1))
        .json(&json!({ "username": "alice", "password": "again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 8002);

    let res = client
        .delete(srv.url("/api/users/nobody"))
        .basic_auth(ADMIN.0, Some(ADMIN.1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn ledger_guard_over_http() {
    let srv = medication_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &srv, "alice").await;
    let id = create_medication(&client, &srv, "alice", "Ibuprofen", 10).await;

    let res = client
        .patch(srv.url(&format!("/api/medication/{id}")))
        .basic_auth("alice", Some("pw"))
        .json(&json!({ "quantity": -4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(srv.url(&format!("/api/medication/{id}")))
        .basic_auth("alice", Some("pw"))
        .json(&json!({ "quantity": -7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "BAD_REQUEST");
    assert_eq!(body["code"], 7203);

    let res = client
        .get(srv.url(&format!("/api/medication/{id}")))
        .basic_auth("alice", Some("pw"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["quantity"], 6);

    let res = client
        .patch(srv.url("/api/medication/999"))
        .basic_auth("alice", Some("pw"))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ownership_and_duplicates() {
    let srv = medication_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &srv, "alice").await;
    register_user(&client, &srv, "bob").await;
    let id = create_medication(&client, &srv, "alice", "Aspirin", 5).await;

    let res = client
        .get(srv.url(&format!("/api/medication/{id}")))
        .basic_auth("bob", Some("pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 7204);

    let res = client
        .get(srv.url("/api/medication"))
        .basic_auth("bob", Some("pw"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());

    let res = client
        .post(srv.url("/api/medication"))
        .basic_auth("bob", Some("pw"))
        .json(&json!({
            "name": "Aspirin",
            "manufacturer": "Other",
            "type": "CAPSULE",
            "weight": 250,
            "quantity": 1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 7202);

    // Upsert by (name, weight) keeps the id.
    let res = client
        .put(srv.url("/api/medication"))
        .basic_auth("alice", Some("pw"))
        .json(&json!({
            "name": "Aspirin",
            "manufacturer": "Acme",
            "type": "TABLET",
            "weight": 250,
            "quantity": 50,
            "additional_info": "after meals",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["quantity"], 50);

    let res = client
        .delete(srv.url(&format!("/api/medication/{id}")))
        .basic_auth(ADMIN.0, Some(ADMIN.1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = client
        .delete(srv.url(&format!("/api/medication/{id}")))
        .basic_auth(ADMIN.0, Some(ADMIN.1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn bad_bodies_are_field_maps() {
    let srv = medication_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &srv, "alice").await;

    let res = client
        .post(srv.url("/api/medication"))
        .basic_auth("alice", Some("pw"))
        .json(&json!({
            "name": " ",
            "manufacturer": "Acme",
            "type": "LOLLIPOP",
            "weight": 0,
            "quantity": 1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("name").is_some());
    assert!(body.get("type").is_some());
    assert!(body.get("weight").is_some());

    let res = client
        .post(srv.url("/api/medication"))
        .basic_auth("alice", Some("pw"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("body").is_some());

    let res = client
        .get(srv.url("/api/medication/not-a-number"))
        .basic_auth("alice", Some("pw"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("id").is_some());
}
