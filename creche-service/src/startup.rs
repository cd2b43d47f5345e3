use crate::config::{CrecheConfig, StoreBackend};
use crate::handlers::{
    self, children, creche, dashboard, invoices, payments, presences, reports, staff,
};
use crate::services::{
    BillingService, DirectoryStore, LedgerStore, LocalStorage, MemoryStore, MongoDb,
    ReceiptRenderer, ReportingService, Storage, StoredReceiptRenderer,
};
use axum::{
    extract::Request,
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: CrecheConfig,
    pub ledger: Arc<dyn LedgerStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub storage: Arc<dyn Storage>,
    pub billing: BillingService,
    pub reporting: ReportingService,
}

impl AppState {
    pub fn new(
        config: CrecheConfig,
        ledger: Arc<dyn LedgerStore>,
        directory: Arc<dyn DirectoryStore>,
        storage: Arc<dyn Storage>,
        renderer: Arc<dyn ReceiptRenderer>,
    ) -> Self {
        let billing = BillingService::new(
            ledger.clone(),
            directory.clone(),
            renderer,
            config.billing,
        );
        let reporting = ReportingService::new(ledger.clone(), directory.clone());
        Self {
            config,
            ledger,
            directory,
            storage,
            billing,
            reporting,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/payments",
            post(payments::create_payment).get(payments::list_payments),
        )
        .route(
            "/payments/mensualite-auto",
            post(payments::record_monthly_charge),
        )
        .route(
            "/payments/enfant/:child_id",
            get(payments::list_child_payments),
        )
        .route(
            "/payments/:id",
            get(payments::get_payment)
                .put(payments::update_payment)
                .delete(payments::delete_payment),
        )
        .route("/payments/:id/valider", put(payments::validate_payment))
        .route("/payments/:id/annuler", put(payments::cancel_payment))
        .route("/payments/:id/recu", get(payments::payment_receipt))
        .route(
            "/invoices",
            post(invoices::create_invoice).get(invoices::list_invoices),
        )
        .route("/invoices/:id", get(invoices::get_invoice))
        .route("/invoices/:id/validate", post(invoices::validate_invoice))
        .route("/invoices/:id/cancel", post(invoices::cancel_invoice))
        .route("/invoices/:id/receipt", get(invoices::download_receipt))
        .route(
            "/children",
            post(children::enroll_child).get(children::list_children),
        )
        .route("/children/:id", get(children::get_child))
        .route("/staff", post(staff::create_staff).get(staff::list_staff))
        .route("/staff/:id", get(staff::get_staff))
        .route("/staff/:id/salaire", post(staff::pay_salary))
        .route("/staff/:id/salaires", get(staff::salary_history))
        .route(
            "/creche",
            get(creche::get_settings).put(creche::update_settings),
        )
        .route(
            "/presences",
            post(presences::record_presence).get(presences::list_presences),
        )
        .route("/reports/financier", get(reports::financial_report))
        .route("/reports/solde-journalier", get(reports::daily_balance))
        .route("/reports/categories", get(reports::category_breakdown))
        .route("/reports/enfants", get(reports::children_report))
        .route("/reports/enfants/:child_id", get(reports::child_report))
        .route("/reports/personnel", get(reports::staff_report))
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/alerts", get(dashboard::alerts))
        .route("/dashboard/charts", get(dashboard::charts))
        .route("/reconciliations", get(dashboard::reconciliations));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(api)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                    creche_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: CrecheConfig) -> Result<Self, AppError> {
        let (ledger, directory): (Arc<dyn LedgerStore>, Arc<dyn DirectoryStore>) =
            match config.store.backend {
                StoreBackend::MongoDb => {
                    let uri = config.store.mongodb_uri.as_deref().ok_or_else(|| {
                        AppError::ConfigError(anyhow::anyhow!("MONGODB_URI is not set"))
                    })?;
                    let db = MongoDb::connect(uri, &config.store.database)
                        .await
                        .map_err(|e| {
                            tracing::error!("Failed to connect to MongoDB: {}", e);
                            e
                        })?;
                    db.initialize_indexes().await.map_err(|e| {
                        tracing::error!("Failed to initialize database indexes: {}", e);
                        e
                    })?;
                    let db = Arc::new(db);
                    let ledger: Arc<dyn LedgerStore> = db.clone();
                    let directory: Arc<dyn DirectoryStore> = db;
                    (ledger, directory)
                }
                StoreBackend::Memory => {
                    tracing::warn!("Using the in-memory store; data is lost on restart");
                    let store = Arc::new(MemoryStore::new());
                    let ledger: Arc<dyn LedgerStore> = store.clone();
                    let directory: Arc<dyn DirectoryStore> = store;
                    (ledger, directory)
                }
            };

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.receipts.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize receipt storage at {}: {}",
                        config.receipts.local_path,
                        e
                    );
                    e
                })?,
        );
        let renderer: Arc<dyn ReceiptRenderer> =
            Arc::new(StoredReceiptRenderer::new(storage.clone()));

        let state = AppState::new(config.clone(), ledger, directory, storage, renderer);
        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
