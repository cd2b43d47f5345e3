//! Shared harness for creche-service integration tests.
//!
//! Drives the full router in-process against the in-memory store.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use creche_service::config::{
    BillingSettings, CrecheConfig, ReceiptConfig, StoreBackend, StoreConfig,
};
use creche_service::middleware::tenant::{CRECHE_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use creche_service::middleware::{ActorRole, TenantContext};
use creche_service::services::{
    DirectoryStore, LedgerStore, LocalStorage, MemoryStore, ReceiptRenderer, Storage,
    StoredReceiptRenderer,
};
use creche_service::startup::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const CRECHE_A: &str = "creche-a";
pub const CRECHE_B: &str = "creche-b";
pub const DIRECTOR: &str = "DIRECTOR";
pub const ACCOUNTANT: &str = "ACCOUNTANT";
pub const USER: &str = "user-1";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::build(None).await
    }

    pub async fn spawn_with_renderer(renderer: Arc<dyn ReceiptRenderer>) -> Self {
        Self::build(Some(renderer)).await
    }

    async fn build(renderer: Option<Arc<dyn ReceiptRenderer>>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = CrecheConfig {
            common: service_core::config::Config::default(),
            store: StoreConfig {
                backend: StoreBackend::Memory,
                mongodb_uri: None,
                database: "creche_test".to_string(),
            },
            receipts: ReceiptConfig {
                local_path: dir.path().to_string_lossy().into_owned(),
            },
            billing: BillingSettings::default(),
        };

        let store = Arc::new(MemoryStore::new());
        let ledger: Arc<dyn LedgerStore> = store.clone();
        let directory: Arc<dyn DirectoryStore> = store.clone();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path())
                .await
                .expect("Failed to create storage"),
        );
        let renderer: Arc<dyn ReceiptRenderer> = match renderer {
            Some(renderer) => renderer,
            None => Arc::new(StoredReceiptRenderer::new(storage.clone())),
        };

        let state = AppState::new(config, ledger, directory, storage, renderer);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            store,
            _dir: dir,
        }
    }

    pub fn tenant(creche_id: &str) -> TenantContext {
        TenantContext::new(creche_id, USER, ActorRole::Director)
    }

    /// Sends a request with gateway headers and returns status plus JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        creche_id: &str,
        role: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CRECHE_ID_HEADER, creche_id)
            .header(USER_ID_HEADER, USER)
            .header(USER_ROLE_HEADER, role);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, CRECHE_A, DIRECTOR, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, CRECHE_A, DIRECTOR, Some(body))
            .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, CRECHE_A, DIRECTOR, Some(body))
            .await
    }

    /// Enrols a child in `CRECHE_A` and returns the enrolment payload.
    pub async fn enroll_child(&self, first_name: &str, registration_fee: i64) -> Value {
        let (status, body) = self
            .post(
                "/children",
                json!({
                    "first_name": first_name,
                    "last_name": "Mbarga",
                    "registration_fee": registration_fee,
                    "monthly_fee": 150000
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "enrolment failed: {}", body);
        body["data"].clone()
    }

    pub async fn child_id(&self, first_name: &str) -> String {
        let data = self.enroll_child(first_name, 0).await;
        data["child"]["id"].as_str().unwrap().to_string()
    }

    pub async fn add_staff(&self, status: &str, salary: i64) -> String {
        let (code, body) = self
            .post(
                "/staff",
                json!({
                    "first_name": "Aline",
                    "last_name": "Ngono",
                    "position": "EDUCATOR",
                    "salary": salary,
                    "status": status
                }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED, "staff creation failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn configure_creche(&self, max_capacity: i64) {
        let (code, body) = self
            .put(
                "/creche",
                json!({
                    "name": "Les Petits Pas",
                    "max_capacity": max_capacity,
                    "registration_fee": 0,
                    "monthly_fee": 150000
                }),
            )
            .await;
        assert_eq!(code, StatusCode::OK, "settings update failed: {}", body);
    }

    pub async fn list_payments(&self, query: &str) -> Vec<Value> {
        let (code, body) = self.get(&format!("/payments{}", query)).await;
        assert_eq!(code, StatusCode::OK);
        body["data"].as_array().cloned().unwrap_or_default()
    }

    pub async fn list_invoices(&self, query: &str) -> Vec<Value> {
        let (code, body) = self.get(&format!("/invoices{}", query)).await;
        assert_eq!(code, StatusCode::OK);
        body["data"].as_array().cloned().unwrap_or_default()
    }
}
