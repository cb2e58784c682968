mod common;

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use medward_core::{MedicationId, UserId};
use medward_infra::inventory_client::LocalInventoryClient;
use medward_infra::repositories::{InMemoryMedicationRepository, MedicationRepository};
use medward_medication::NewMedication;

use common::{ADMIN, TestServer, clock_at, hospital_server, today};

type Ledger = LocalInventoryClient<Arc<InMemoryMedicationRepository>>;

struct Hospital {
    srv: TestServer,
    client: reqwest::Client,
    inventory: Arc<Ledger>,
    medication_id: MedicationId,
}

impl Hospital {
    async fn start(quantity: i64) -> Self {
        let ledger = Arc::new(InMemoryMedicationRepository::new());
        let record = ledger
            .insert(
                NewMedication::parse("Morphine", "Acme", "INJECTION", 10, quantity, None).unwrap(),
                UserId::new(),
            )
            .await
            .unwrap();
        let inventory = Arc::new(LocalInventoryClient::new(ledger));
        let srv = hospital_server(inventory.clone(), clock_at(8)).await;
        Self {
            srv,
            client: reqwest::Client::new(),
            inventory,
            medication_id: record.id,
        }
    }

    async fn as_admin(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> reqwest::Response {
        self.send(ADMIN.0, ADMIN.1, method, path, body).await
    }

    async fn send(
        &self,
        user: &str,
        password: &str,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> reqwest::Response {
        let mut req = self
            .client
            .request(method, self.srv.url(path))
            .basic_auth(user, Some(password));
        if let Some(body) = body {
            req = req.json(&body);
        }
        req.send().await.unwrap()
    }

    async fn department(&self, name: &str) -> i64 {
        let res = self
            .as_admin(
                reqwest::Method::POST,
                "/api/hospital/departments",
                Some(json!({ "name": name, "description": "ward" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    async fn doctor_in(&self, username: &str, department_id: i64) {
        let res = self
            .as_admin(
                reqwest::Method::POST,
                "/api/users",
                Some(json!({ "username": username, "password": "pw", "role": "ROLE_DOCTOR" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let res = self
            .as_admin(
                reqwest::Method::PATCH,
                "/api/hospital/departments/add-user",
                Some(json!({ "username": username, "department_id": department_id })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    fn batch(&self, department_id: i64, start_day: &str, days: i64) -> Value {
        json!({
            "patient": "bed-12",
            "medication_id": self.medication_id.get(),
            "department_id": department_id,
            "start_day": start_day,
            "time_of_issuing": ["09:00:00"],
            "amount_of_days": days,
        })
    }

    async fn quantity(&self) -> i64 {
        self.inventory
            .ledger()
            .get(self.medication_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }
}

#[tokio::test]
async fn department_lifecycle() {
    let h = Hospital::start(10).await;
    let id = h.department("Cardiology").await;

    let res = h
        .as_admin(
            reqwest::Method::POST,
            "/api/hospital/departments",
            Some(json!({ "name": "Cardiology" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 7002);

    let res = h
        .as_admin(
            reqwest::Method::PUT,
            &format!("/api/hospital/departments/{id}"),
            Some(json!({ "name": "Cardiology North" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = h
        .as_admin(
            reqwest::Method::PUT,
            "/api/hospital/departments/404",
            Some(json!({ "name": "Nowhere" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = h
        .as_admin(reqwest::Method::GET, &format!("/api/hospital/departments/{id}"), None)
        .await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Cardiology North");
    assert!(body["tasks"].as_array().unwrap().is_empty());

    let res = h
        .as_admin(reqwest::Method::DELETE, &format!("/api/hospital/departments/{id}"), None)
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = h
        .as_admin(reqwest::Method::DELETE, &format!("/api/hospital/departments/{id}"), None)
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn membership_shows_up_on_the_user() {
    let h = Hospital::start(10).await;
    let id = h.department("ICU").await;
    h.doctor_in("house", id).await;

    let res = h.as_admin(reqwest::Method::GET, "/api/users/house", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "ROLE_DOCTOR");
    assert_eq!(body["departments"][0]["name"], "ICU");
    assert!(body.get("password").is_none());

    let res = h
        .as_admin(
            reqwest::Method::PATCH,
            "/api/hospital/departments/add-user",
            Some(json!({ "username": "ghost", "department_id": id })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 8001);

    let res = h
        .as_admin(
            reqwest::Method::PATCH,
            "/api/hospital/departments/delete-user",
            Some(json!({ "username": "house", "department_id": id })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = h.as_admin(reqwest::Method::GET, "/api/users/house", None).await;
    let body: Value = res.json().await.unwrap();
    assert!(body["departments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn role_policy_is_enforced() {
    let h = Hospital::start(10).await;
    let id = h.department("ER").await;
    h.doctor_in("house", id).await;

    let res = h
        .send("house", "pw", reqwest::Method::GET, "/api/hospital/departments", None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = h
        .send(
            "house",
            "pw",
            reqwest::Method::POST,
            "/api/hospital/departments",
            Some(json!({ "name": "Mine" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = h
        .send("house", "pw", reqwest::Method::GET, "/api/users", None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = h
        .client
        .get(h.srv.url("/api/hospital/tasks"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn task_validation_order_and_errors() {
    let h = Hospital::start(10).await;
    let id = h.department("Oncology").await;
    let other = h.department("Surgery").await;
    h.doctor_in("house", id).await;

    let yesterday = today().pred_opt().unwrap().to_string();
    let res = h
        .send(
            "house",
            "pw",
            reqwest::Method::POST,
            "/api/hospital/tasks",
            Some(h.batch(other, &yesterday, 1)),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 7102);

    let res = h
        .send(
            "house",
            "pw",
            reqwest::Method::POST,
            "/api/hospital/tasks",
            Some(h.batch(other, &today().to_string(), 1)),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 7103);

    let res = h
        .as_admin(
            reqwest::Method::POST,
            "/api/hospital/tasks",
            Some(h.batch(999, &today().to_string(), 1)),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 7001);

    let mut empty = h.batch(id, &today().to_string(), 0);
    empty["patient"] = json!("");
    empty["time_of_issuing"] = json!([]);
    let res = h
        .send("house", "pw", reqwest::Method::POST, "/api/hospital/tasks", Some(empty))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("patient").is_some());
    assert!(body.get("amount_of_days").is_some());
    assert!(body.get("time_of_issuing").is_some());

    let mut oversized = h.batch(id, &today().to_string(), 4_294_967_295);
    oversized["time_of_issuing"] = json!((0..24).map(|hour| format!("{hour:02}:00:00")).collect::<Vec<_>>());
    let res = h
        .send("house", "pw", reqwest::Method::POST, "/api/hospital/tasks", Some(oversized))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("amount_of_days").is_some());

    assert!(h.inventory.calls().is_empty());
    assert_eq!(h.quantity().await, 10);
}

#[tokio::test]
async fn department_with_tasks_cannot_be_deleted() {
    let h = Hospital::start(10).await;
    let id = h.department("Pediatrics").await;
    h.doctor_in("house", id).await;

    let res = h
        .send(
            "house",
            "pw",
            reqwest::Method::POST,
            "/api/hospital/tasks",
            Some(h.batch(id, &today().to_string(), 3)),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let tasks: Value = res.json().await.unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 3);
    assert_eq!(h.quantity().await, 7);

    let res = h
        .as_admin(reqwest::Method::DELETE, &format!("/api/hospital/departments/{id}"), None)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 7003);

    let res = h
        .send("house", "pw", reqwest::Method::GET, "/api/hospital/tasks", None)
        .await;
    let today_tasks: Value = res.json().await.unwrap();
    assert_eq!(today_tasks.as_array().unwrap().len(), 1);
}
