mod common;

use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};
use common::{TestApp, CRECHE_A};
use creche_service::services::reporting::{AlertKind, AlertLevel};
use serde_json::{json, Value};

async fn record(app: &TestApp, payload: Value) -> String {
    let (status, body) = app.post("/payments", payload).await;
    assert_eq!(status, StatusCode::CREATED, "payment failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Income 200k, expense 50k and a cancelled 30k expense on 2025-03-10.
async fn seed_march_ledger(app: &TestApp) {
    record(
        app,
        json!({
            "category": "OTHER_INCOME",
            "amount": 200000,
            "description": "donation",
            "date": "2025-03-10T09:00:00Z"
        }),
    )
    .await;
    record(
        app,
        json!({
            "category": "RENT",
            "amount": 50000,
            "description": "rent",
            "date": "2025-03-10T10:00:00Z"
        }),
    )
    .await;
    let cancelled = record(
        app,
        json!({
            "category": "FOOD",
            "amount": 30000,
            "description": "groceries",
            "date": "2025-03-10T11:00:00Z"
        }),
    )
    .await;
    let (status, _) = app
        .put(&format!("/payments/{}/annuler", cancelled), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

async fn presence(app: &TestApp, child_id: &str, date: chrono::NaiveDate, status: &str) {
    let (code, body) = app
        .post(
            "/presences",
            json!({
                "kind": "CHILD",
                "subject_id": child_id,
                "date": date.to_string(),
                "status": status
            }),
        )
        .await;
    assert_eq!(code, StatusCode::CREATED, "presence failed: {}", body);
}

#[tokio::test]
async fn daily_balance_ignores_cancelled_payments() {
    let app = TestApp::spawn().await;
    seed_march_ledger(&app).await;

    let (status, body) = app.get("/reports/solde-journalier?date=2025-03-10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["date"], "2025-03-10");
    assert_eq!(body["data"]["income"], 200_000);
    assert_eq!(body["data"]["expense"], 50_000);
    assert_eq!(body["data"]["net"], 150_000);

    let (_, other_day) = app.get("/reports/solde-journalier?date=2025-03-11").await;
    assert_eq!(other_day["data"]["net"], 0);
}

#[tokio::test]
async fn financial_report_computes_net_and_margin() {
    let app = TestApp::spawn().await;
    seed_march_ledger(&app).await;

    let (status, body) = app
        .get("/reports/financier?start=2025-03-01&end=2025-03-31")
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let report = &body["data"];
    assert_eq!(report["income"]["total"], 200_000);
    assert_eq!(report["income"]["by_category"]["OTHER_INCOME"], 200_000);
    assert_eq!(report["expense"]["total"], 50_000);
    assert!(report["expense"]["by_category"]["FOOD"].is_null());
    assert_eq!(report["balance"]["net"], 150_000);
    assert_eq!(report["balance"]["margin_pct"], 75.0);

    let (_, categories) = app
        .get("/reports/categories?start=2025-03-01&end=2025-03-31")
        .await;
    assert_eq!(categories["count"], 2);
}

#[tokio::test]
async fn report_range_must_be_ordered() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .get("/reports/financier?start=2025-03-31&end=2025-03-01")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["category"], "validation");
}

#[tokio::test]
async fn capacity_alert_fires_at_ninety_percent() {
    let app = TestApp::spawn().await;
    app.configure_creche(50).await;
    for i in 0..44 {
        app.enroll_child(&format!("Child{}", i), 0).await;
    }

    let (_, body) = app.get("/dashboard/alerts").await;
    assert_eq!(body["count"], 0, "{}", body);

    app.enroll_child("Child44", 0).await;
    let (status, body) = app.get("/dashboard/alerts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["kind"], "capacity_warning");
    assert_eq!(body["data"][0]["level"], "info");
    assert_eq!(body["data"][0]["count"], 45);
}

#[tokio::test]
async fn overdue_alert_counts_earlier_months_of_current_year() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    for (month, year) in [(3, 2025), (6, 2025), (11, 2024)] {
        record(
            &app,
            json!({
                "category": "MONTHLY_FEE",
                "amount": 150000,
                "status": "PENDING",
                "description": "monthly fee",
                "month": month,
                "year": year,
                "child_id": child_id
            }),
        )
        .await;
    }

    let tenant = TestApp::tenant(CRECHE_A);
    let june = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    let alerts = app.state.reporting.alerts(&tenant, june).await.unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::OverduePayments);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert_eq!(alerts[0].count, 1);

    let january = Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap();
    let alerts = app.state.reporting.alerts(&tenant, january).await.unwrap();
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn repeated_absences_raise_a_danger_alert() {
    let app = TestApp::spawn().await;
    let absent = app.child_id("Emma").await;
    let sometimes = app.child_id("Lucas").await;
    let today = Utc::now().date_naive();

    for offset in 0..3 {
        let status = if offset == 1 { "UNEXCUSED_ABSENCE" } else { "ABSENT" };
        presence(&app, &absent, today - Duration::days(offset), status).await;
    }
    presence(&app, &sometimes, today, "ABSENT").await;
    presence(&app, &sometimes, today - Duration::days(1), "ABSENT").await;
    presence(&app, &sometimes, today - Duration::days(2), "PRESENT").await;
    // Outside the trailing week.
    presence(&app, &sometimes, today - Duration::days(10), "ABSENT").await;

    let (status, body) = app.get("/dashboard/alerts").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1, "{}", body);
    assert_eq!(body["data"][0]["kind"], "repeated_absences");
    assert_eq!(body["data"][0]["level"], "danger");
    assert_eq!(body["data"][0]["count"], 1);
}

#[tokio::test]
async fn child_report_combines_attendance_and_billing() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    let today = Utc::now().date_naive();

    presence(&app, &child_id, today - Duration::days(1), "PRESENT").await;
    presence(&app, &child_id, today - Duration::days(2), "PRESENT").await;
    presence(&app, &child_id, today - Duration::days(3), "PRESENT").await;
    presence(&app, &child_id, today - Duration::days(4), "ABSENT").await;
    presence(&app, &child_id, today - Duration::days(5), "HOLIDAY").await;

    let (status, _) = app
        .post(
            "/payments/mensualite-auto",
            json!({ "child_id": child_id, "month": 1, "year": 2025 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            "/invoices",
            json!({ "child_id": child_id, "month": 2, "year": 2025, "invoice_type": "MONTHLY_FEE" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let query = format!(
        "/reports/enfants/{}?start={}&end={}",
        child_id,
        today - Duration::days(9),
        today
    );
    let (status, body) = app.get(&query).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let report = &body["data"];
    assert_eq!(report["child"]["full_name"], "Emma Mbarga");
    assert_eq!(report["presence"]["total_days"], 4);
    assert_eq!(report["presence"]["present_days"], 3);
    assert_eq!(report["presence"]["absent_days"], 1);
    assert_eq!(report["presence"]["presence_rate"], 75.0);
    assert_eq!(report["billing"]["issued_invoices"], 2);
    assert_eq!(report["billing"]["paid_invoices"], 1);
    assert_eq!(report["billing"]["total_due"], 300_000);
    assert_eq!(report["billing"]["balance_due"], 150_000);
    assert_eq!(report["billing"]["paid_ratio"], 50.0);

    let (status, _) = app.get("/reports/enfants/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_report_sums_salaries_paid() {
    let app = TestApp::spawn().await;
    let staff_id = app.add_staff("ACTIVE", 120_000).await;
    let (status, _) = app
        .post(
            &format!("/staff/{}/salaire", staff_id),
            json!({ "month": 1, "year": 2025 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/reports/personnel").await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["salaries_paid"], 120_000);
    assert!(body["data"][0]["last_salary_date"].is_string());
}

#[tokio::test]
async fn dashboard_stats_summarise_today() {
    let app = TestApp::spawn().await;
    let child_id = app.child_id("Emma").await;
    app.add_staff("ACTIVE", 100_000).await;
    app.add_staff("ON_LEAVE", 100_000).await;
    presence(&app, &child_id, Utc::now().date_naive(), "PRESENT").await;

    record(
        &app,
        json!({ "category": "OTHER_INCOME", "amount": 100000, "description": "grant" }),
    )
    .await;
    record(
        &app,
        json!({ "category": "SUPPLIES", "amount": 40000, "description": "paint" }),
    )
    .await;

    let (status, body) = app.get("/dashboard/stats").await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let stats = &body["data"];
    assert_eq!(stats["children"]["active"], 1);
    assert_eq!(stats["children"]["present_today"], 1);
    assert_eq!(stats["staff"]["active"], 1);
    assert_eq!(stats["staff"]["present_today"], 0);
    assert_eq!(stats["today"]["income"], 100_000);
    assert_eq!(stats["today"]["expense"], 40_000);
    assert_eq!(stats["today"]["net"], 60_000);
    assert_eq!(stats["month"]["net"], 60_000);
    assert!(stats["alerts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn late_children_are_not_counted_as_present_today() {
    let app = TestApp::spawn().await;
    let today = Utc::now().date_naive();
    let emma = app.child_id("Emma").await;
    let lucas = app.child_id("Lucas").await;
    presence(&app, &emma, today, "PRESENT").await;
    presence(&app, &lucas, today, "LATE").await;

    let (status, body) = app.get("/dashboard/stats").await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["children"]["active"], 2);
    assert_eq!(body["data"]["children"]["present_today"], 1);
}

#[tokio::test]
async fn dashboard_charts_clamp_the_window() {
    let app = TestApp::spawn().await;
    record(
        &app,
        json!({ "category": "OTHER_INCOME", "amount": 5000, "description": "sale" }),
    )
    .await;

    let (status, body) = app.get("/dashboard/charts?days=7").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let daily = body["data"]["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 7);
    assert_eq!(daily[6]["income"], 5000);
    assert_eq!(body["data"]["categories"][0]["category"], "OTHER_INCOME");

    let (_, body) = app.get("/dashboard/charts?days=0").await;
    assert_eq!(body["data"]["daily"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/dashboard/charts?days=5000").await;
    assert_eq!(body["data"]["daily"].as_array().unwrap().len(), 366);
}

#[tokio::test]
async fn children_report_lists_active_children() {
    let app = TestApp::spawn().await;
    app.child_id("Emma").await;
    app.child_id("Lucas").await;

    let (status, body) = app.get("/reports/enfants").await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["billing"]["issued_invoices"], 0);
    assert_eq!(body["data"][0]["presence"]["presence_rate"], 0.0);
}
