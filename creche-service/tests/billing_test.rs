//! Billing flows through the HTTP surface.

mod common;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use chrono::{Datelike, Utc};
use common::{TestApp, ACCOUNTANT, CRECHE_A, CRECHE_B, DIRECTOR};
use creche_service::services::receipts::ReceiptData;
use creche_service::services::ReceiptRenderer;
use serde_json::json;
use service_core::error::AppError;
use std::sync::Arc;

struct OfflineRenderer;

#[async_trait]
impl ReceiptRenderer for OfflineRenderer {
    async fn render(
        &self,
        _receipt: &ReceiptData,
        _receipt_number: &str,
        _actor_id: &str,
    ) -> Result<String, AppError> {
        Err(AppError::Upstream(anyhow::anyhow!("renderer offline")))
    }
}

#[tokio::test]
async fn enrolment_records_paid_registration_payment_and_invoice() {
    let app = TestApp::spawn().await;

    let data = app.enroll_child("Emma", 50_000).await;

    let year = Utc::now().year();
    assert_eq!(
        data["child"]["registration_number"],
        format!("{}-0001", year)
    );
    let registration = &data["registration"];
    assert_eq!(registration["payment"]["category"], "REGISTRATION_FEE");
    assert_eq!(registration["payment"]["status"], "PAID");
    assert_eq!(registration["payment"]["amount_paid"], 50_000);
    assert_eq!(registration["payment"]["method"], "CASH");
    assert_eq!(registration["invoice"]["invoice_type"], "REGISTRATION");
    assert_eq!(registration["invoice"]["status"], "PAID");
    assert_eq!(registration["invoice"]["validated_by"], common::USER);

    assert_eq!(app.list_payments("").await.len(), 1);
    assert_eq!(app.list_invoices("").await.len(), 1);
}

#[tokio::test]
async fn enrolment_without_fee_writes_no_ledger_entries() {
    let app = TestApp::spawn().await;

    let data = app.enroll_child("Noah", 0).await;

    assert!(data["registration"].is_null());
    assert!(app.list_payments("").await.is_empty());
    assert!(app.list_invoices("").await.is_empty());
}

#[tokio::test]
async fn registration_numbers_are_sequential() {
    let app = TestApp::spawn().await;
    let year = Utc::now().year();

    let first = app.enroll_child("Emma", 0).await;
    let second = app.enroll_child("Lucas", 0).await;

    assert_eq!(first["child"]["registration_number"], format!("{}-0001", year));
    assert_eq!(second["child"]["registration_number"], format!("{}-0002", year));
}

#[tokio::test]
async fn second_monthly_charge_for_same_period_conflicts() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    let charge = json!({ "child_id": child_id, "month": 3, "year": 2025 });

    let (status, body) = app.post("/payments/mensualite-auto", charge.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["payment"]["amount"], 150_000);
    assert_eq!(body["data"]["invoice"]["status"], "PAID");

    let (status, body) = app.post("/payments/mensualite-auto", charge).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["category"], "conflict");
    assert_eq!(
        body["error"]["message"],
        "payment already exists for this period"
    );

    assert_eq!(app.list_payments("?category=MONTHLY_FEE").await.len(), 1);
}

#[tokio::test]
async fn monthly_charge_for_unknown_child_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/payments/mensualite-auto",
            json!({ "child_id": "ghost", "month": 3, "year": 2025 }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["category"], "not_found");
}

#[tokio::test]
async fn monthly_charge_settles_existing_pending_invoice() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;

    let (status, invoice) = app
        .post(
            "/invoices",
            json!({
                "child_id": child_id,
                "month": 4,
                "year": 2025,
                "invoice_type": "MONTHLY_FEE"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", invoice);
    assert_eq!(invoice["data"]["status"], "PENDING");

    let (status, body) = app
        .post(
            "/payments/mensualite-auto",
            json!({ "child_id": child_id, "month": 4, "year": 2025, "method": "MOBILE_MONEY_A" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["invoice"]["id"], invoice["data"]["id"]);
    assert_eq!(body["data"]["invoice"]["status"], "PAID");
    assert_eq!(body["data"]["invoice"]["payment_method"], "MOBILE_MONEY_A");

    assert_eq!(app.list_invoices("").await.len(), 1);
}

#[tokio::test]
async fn failed_invoice_write_rolls_back_the_payment() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;

    // A settled invoice for the period blocks a second monthly invoice.
    let (_, invoice) = app
        .post(
            "/invoices",
            json!({
                "child_id": child_id,
                "month": 6,
                "year": 2025,
                "invoice_type": "MONTHLY_FEE"
            }),
        )
        .await;
    let invoice_id = invoice["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .post(
            &format!("/invoices/{}/validate", invoice_id),
            json!({ "payment_method": "CASH" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/payments/mensualite-auto",
            json!({ "child_id": child_id, "month": 6, "year": 2025 }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"]["message"],
        "an invoice of this type already exists for this child and period"
    );
    assert!(app.list_payments("?category=MONTHLY_FEE").await.is_empty());

    let (_, markers) = app.get("/reconciliations").await;
    assert_eq!(markers["count"], 0);
}

#[tokio::test]
async fn salary_for_inactive_staff_is_refused_without_writing() {
    let app = TestApp::spawn().await;
    let staff_id = app.add_staff("INACTIVE", 200_000).await;

    let (status, body) = app
        .post(
            &format!("/staff/{}/salaire", staff_id),
            json!({ "month": 3, "year": 2025 }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["category"], "inactive_entity");
    assert!(app.list_payments("").await.is_empty());
}

#[tokio::test]
async fn salary_defaults_to_contract_amount_by_bank_transfer() {
    let app = TestApp::spawn().await;
    let staff_id = app.add_staff("ACTIVE", 200_000).await;

    let (status, body) = app
        .post(
            &format!("/staff/{}/salaire", staff_id),
            json!({ "month": 3, "year": 2025 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let payment = &body["data"];
    assert_eq!(payment["kind"], "EXPENSE");
    assert_eq!(payment["category"], "SALARIES");
    assert_eq!(payment["amount"], 200_000);
    assert_eq!(payment["method"], "BANK_TRANSFER");
    assert_eq!(payment["staff_id"], staff_id.as_str());

    let (status, history) = app.get(&format!("/staff/{}/salaires", staff_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["count"], 1);
}

#[tokio::test]
async fn invoice_validates_once_with_numbered_receipt() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    let (_, invoice) = app
        .post(
            "/invoices",
            json!({
                "child_id": child_id,
                "month": 2,
                "year": 2025,
                "invoice_type": "MONTHLY_FEE"
            }),
        )
        .await;
    let uri = format!("/invoices/{}/validate", invoice["data"]["id"].as_str().unwrap());

    let (status, body) = app.post(&uri, json!({ "payment_method": "CASH" })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "PAID");
    assert_eq!(
        body["data"]["receipt_number"],
        format!("FAC-{}-0001", Utc::now().year())
    );
    assert!(body["data"]["paid_date"].is_string());

    let (status, body) = app.post(&uri, json!({ "payment_method": "CASH" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["category"], "conflict");

    let (status, _) = app
        .get(&format!(
            "/invoices/{}/receipt",
            invoice["data"]["id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn receipt_failure_leaves_invoice_pending() {
    let app = TestApp::spawn_with_renderer(Arc::new(OfflineRenderer)).await;
    let child_id = app.child_id("Emma").await;
    let (_, invoice) = app
        .post(
            "/invoices",
            json!({
                "child_id": child_id,
                "month": 2,
                "year": 2025,
                "invoice_type": "MONTHLY_FEE"
            }),
        )
        .await;
    let invoice_id = invoice["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            &format!("/invoices/{}/validate", invoice_id),
            json!({ "payment_method": "CASH" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["category"], "upstream");

    let (_, stored) = app.get(&format!("/invoices/{}", invoice_id)).await;
    assert_eq!(stored["data"]["status"], "PENDING");
    assert!(stored["data"]["receipt_number"].is_null());
}

#[tokio::test]
async fn validating_a_payment_settles_only_its_sibling_invoice() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;

    let (status, payment) = app
        .post(
            "/payments",
            json!({
                "category": "MONTHLY_FEE",
                "amount": 150000,
                "status": "PENDING",
                "description": "May fee",
                "month": 5,
                "year": 2025,
                "child_id": child_id
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", payment);
    assert_eq!(payment["data"]["amount_paid"], 0);
    assert_eq!(payment["data"]["child"]["name"], "Emma Mbarga");

    let (_, monthly) = app
        .post(
            "/invoices",
            json!({ "child_id": child_id, "month": 5, "year": 2025, "invoice_type": "MONTHLY_FEE" }),
        )
        .await;
    let (_, registration) = app
        .post(
            "/invoices",
            json!({
                "child_id": child_id,
                "month": 5,
                "year": 2025,
                "amount": 50000,
                "invoice_type": "REGISTRATION"
            }),
        )
        .await;

    let payment_id = payment["data"]["id"].as_str().unwrap();
    let (status, body) = app
        .put(&format!("/payments/{}/valider", payment_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["payment"]["status"], "PAID");
    assert_eq!(body["data"]["payment"]["amount_paid"], 150_000);
    assert_eq!(body["data"]["invoice"]["id"], monthly["data"]["id"]);
    assert_eq!(body["data"]["invoice"]["status"], "PAID");

    let (_, untouched) = app
        .get(&format!(
            "/invoices/{}",
            registration["data"]["id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(untouched["data"]["status"], "PENDING");

    let (status, _) = app
        .put(&format!("/payments/{}/valider", payment_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn child_fees_require_a_child_reference() {
    let app = TestApp::spawn().await;

    for category in ["REGISTRATION_FEE", "MONTHLY_FEE", "LATE_FEE"] {
        let (status, body) = app
            .post(
                "/payments",
                json!({
                    "category": category,
                    "amount": 1000,
                    "description": "missing child",
                    "month": 1,
                    "year": 2025
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", category, body);
        assert_eq!(body["error"]["category"], "validation");
    }
    assert!(app.list_payments("").await.is_empty());
}

#[tokio::test]
async fn payment_subject_must_match_its_kind() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    let staff_id = app.add_staff("ACTIVE", 100_000).await;

    let (status, _) = app
        .post(
            "/payments",
            json!({
                "category": "OTHER_INCOME",
                "amount": 1000,
                "description": "income tied to staff",
                "staff_id": staff_id
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/payments",
            json!({
                "category": "SUPPLIES",
                "amount": 1000,
                "description": "expense tied to child",
                "child_id": child_id
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/payments",
            json!({
                "kind": "EXPENSE",
                "category": "SUPPLIES",
                "amount": 1000,
                "description": "crayons"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["data"]["child_id"].is_null());
    assert!(body["data"]["staff_id"].is_null());
}

#[tokio::test]
async fn partial_payment_tracks_remaining_amount() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;

    let (status, _) = app
        .post(
            "/payments",
            json!({
                "category": "LATE_FEE",
                "amount": 10000,
                "status": "PARTIAL",
                "description": "late pickup",
                "child_id": child_id
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/payments",
            json!({
                "category": "LATE_FEE",
                "amount": 10000,
                "amount_paid": 4000,
                "status": "PARTIAL",
                "description": "late pickup",
                "child_id": child_id
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["amount_remaining"], 6000);

    let id = body["data"]["id"].as_str().unwrap();
    let (status, body) = app
        .put(&format!("/payments/{}", id), json!({ "amount_paid": 10000 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "PAID");

    let (status, _) = app
        .put(&format!("/payments/{}", id), json!({ "amount_paid": 12000 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelled_payment_cannot_be_cancelled_again_or_receipted() {
    let app = TestApp::spawn().await;
    let (_, body) = app
        .post(
            "/payments",
            json!({ "category": "FOOD", "amount": 25000, "description": "market" }),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/payments/{}/recu", id)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = app
        .put(&format!("/payments/{}/annuler", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CANCELLED");

    let (status, _) = app
        .put(&format!("/payments/{}/annuler", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.get(&format!("/payments/{}/recu", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn records_are_invisible_across_tenants() {
    let app = TestApp::spawn().await;
    let data = app.enroll_child("Emma", 50_000).await;
    let child_id = data["child"]["id"].as_str().unwrap();
    let payment_id = data["registration"]["payment"]["id"].as_str().unwrap();

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/children/{}", child_id),
            CRECHE_B,
            DIRECTOR,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/payments/{}", payment_id),
            CRECHE_B,
            DIRECTOR,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            Method::POST,
            "/payments/mensualite-auto",
            CRECHE_B,
            DIRECTOR,
            Some(json!({ "child_id": child_id, "month": 1, "year": 2025 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);

    let (_, listed) = app
        .call(Method::GET, "/payments", CRECHE_B, DIRECTOR, None)
        .await;
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn only_management_can_delete_payments() {
    let app = TestApp::spawn().await;
    let (_, body) = app
        .post(
            "/payments",
            json!({ "category": "RENT", "amount": 300000, "description": "March rent" }),
        )
        .await;
    let uri = format!("/payments/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = app
        .call(Method::DELETE, &uri, CRECHE_A, ACCOUNTANT, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["category"], "forbidden");

    let (status, _) = app.call(Method::DELETE, &uri, CRECHE_A, DIRECTOR, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancelled_invoice_cannot_be_validated() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    let (_, invoice) = app
        .post(
            "/invoices",
            json!({
                "child_id": child_id,
                "month": 9,
                "year": 2025,
                "amount": 20000,
                "invoice_type": "OTHER"
            }),
        )
        .await;
    let id = invoice["data"]["id"].as_str().unwrap();

    let (status, body) = app
        .post(&format!("/invoices/{}/cancel", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CANCELLED");

    let (status, _) = app
        .post(&format!("/invoices/{}/validate", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn child_payments_are_listed_per_child() {
    let app = TestApp::spawn().await;
    let emma = app.enroll_child("Emma", 50_000).await;
    app.enroll_child("Lucas", 50_000).await;
    let emma_id = emma["child"]["id"].as_str().unwrap();

    let (status, body) = app.get(&format!("/payments/enfant/{}", emma_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["child_id"], emma_id);
    assert_eq!(body["data"][0]["child"]["registration_number"], emma["child"]["registration_number"]);
    assert_eq!(app.list_payments("").await.len(), 2);
}

#[tokio::test]
async fn cancelled_invoice_releases_its_period() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    let (status, invoice) = app
        .post(
            "/invoices",
            json!({ "child_id": child_id, "month": 5, "year": 2025, "invoice_type": "MONTHLY_FEE" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", invoice);
    let cancelled_id = invoice["data"]["id"].as_str().unwrap();
    let (status, _) = app
        .post(&format!("/invoices/{}/cancel", cancelled_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/payments/mensualite-auto",
            json!({ "child_id": child_id, "month": 5, "year": 2025 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["invoice"]["status"], "PAID");
    assert_ne!(body["data"]["invoice"]["id"], cancelled_id);

    let (_, stored) = app.get(&format!("/invoices/{}", cancelled_id)).await;
    assert_eq!(stored["data"]["status"], "CANCELLED");
    assert_eq!(app.list_invoices("?month=5&year=2025").await.len(), 2);

    // The new PAID invoice holds the period again.
    let (status, _) = app
        .post(
            "/invoices",
            json!({ "child_id": child_id, "month": 5, "year": 2025, "invoice_type": "MONTHLY_FEE" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;

    for _ in 0..2 {
        let (status, body) = app
            .post(
                "/payments",
                json!({
                    "category": "OTHER_INCOME",
                    "amount": i64::MAX,
                    "description": "Donation"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
        assert_eq!(body["error"]["category"], "validation");
    }

    let (status, body) = app
        .post(
            "/payments/mensualite-auto",
            json!({ "child_id": child_id, "month": 5, "year": 2025, "amount": 1_000_000_000_001i64 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (status, body) = app
        .post(
            "/invoices",
            json!({
                "child_id": child_id,
                "month": 5,
                "year": 2025,
                "amount": i64::MAX,
                "invoice_type": "OTHER"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (status, body) = app.get("/reports/categories").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(app.list_payments("").await.is_empty());
}

#[tokio::test]
async fn validating_a_registration_payment_settles_its_registration_invoice() {
    let app = TestApp::spawn().await;
    let emma = app.child_id("Emma").await;
    let lucas = app.child_id("Lucas").await;

    let (status, payment) = app
        .post(
            "/payments",
            json!({
                "category": "REGISTRATION_FEE",
                "amount": 50000,
                "status": "PENDING",
                "description": "Registration",
                "child_id": emma
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", payment);

    let registration = |child_id: &str| {
        json!({
            "child_id": child_id,
            "month": 9,
            "year": 2025,
            "amount": 50000,
            "invoice_type": "REGISTRATION"
        })
    };
    let (_, emma_registration) = app.post("/invoices", registration(&emma)).await;
    let (_, lucas_registration) = app.post("/invoices", registration(&lucas)).await;
    let (_, emma_monthly) = app
        .post(
            "/invoices",
            json!({ "child_id": emma, "month": 9, "year": 2025, "invoice_type": "MONTHLY_FEE" }),
        )
        .await;

    let payment_id = payment["data"]["id"].as_str().unwrap();
    let (status, body) = app
        .put(&format!("/payments/{}/valider", payment_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["payment"]["status"], "PAID");
    assert_eq!(body["data"]["invoice"]["id"], emma_registration["data"]["id"]);
    assert_eq!(body["data"]["invoice"]["status"], "PAID");
    assert_eq!(body["data"]["invoice"]["validated_by"], common::USER);

    for other in [&lucas_registration, &emma_monthly] {
        let (_, stored) = app
            .get(&format!("/invoices/{}", other["data"]["id"].as_str().unwrap()))
            .await;
        assert_eq!(stored["data"]["status"], "PENDING");
    }
}

#[tokio::test]
async fn invoice_validation_accepts_an_empty_body() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    let (_, invoice) = app
        .post(
            "/invoices",
            json!({ "child_id": child_id, "month": 6, "year": 2025, "invoice_type": "MONTHLY_FEE" }),
        )
        .await;
    let uri = format!("/invoices/{}/validate", invoice["data"]["id"].as_str().unwrap());

    let (status, body) = app.call(Method::POST, &uri, CRECHE_A, DIRECTOR, None).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "PAID");
    assert_eq!(body["data"]["payment_method"], "CASH");
}
