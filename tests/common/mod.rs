use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use workshop_api::{
    config::AppConfig,
    db,
    entities::{component, employee, process, product, specification, vendor},
    events::{self, EventSender},
    services::{ServiceContainer, ServiceFactory},
    AppState,
};

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        // Pooled in-memory sqlite gives every connection its own database,
        // so the pool is pinned to a single connection.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let factory = ServiceFactory::new(
            db_arc.clone(),
            event_sender.clone(),
            cfg.id_allocation_max_retries,
        );
        let services = ServiceContainer::new(&factory);

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", workshop_api::api_v1_routes())
            .layer(axum::middleware::from_fn(
                workshop_api::tracing::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(&self, id: &str, name: &str) {
        product::ActiveModel {
            id: Set(id.to_string()),
            name: Set(Some(name.to_string())),
            inventory: Set(0),
            deprecated: Set(false),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product");
    }

    pub async fn seed_process(
        &self,
        id: &str,
        product_id: &str,
        name: &str,
        order: i32,
        unit_pay: f64,
    ) {
        process::ActiveModel {
            id: Set(id.to_string()),
            product_id: Set(product_id.to_string()),
            process_name: Set(name.to_string()),
            process_order: Set(order),
            unit_pay: Set(unit_pay),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed process");
    }

    pub async fn seed_vendor(&self, name: &str) -> i32 {
        let result = vendor::Entity::insert(vendor::ActiveModel {
            name: Set(Some(name.to_string())),
            ..Default::default()
        })
        .exec(&*self.state.db)
        .await
        .expect("seed vendor");
        result.last_insert_id
    }

    pub async fn seed_component(&self, id: &str, name: &str, warn_stock: Option<i32>) {
        component::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            warn_stock: Set(warn_stock),
            hide: Set(false),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed component");
    }

    pub async fn seed_specification(
        &self,
        id: &str,
        component_id: &str,
        vendor_id: i32,
        stock: i32,
    ) {
        specification::ActiveModel {
            id: Set(id.to_string()),
            component_id: Set(component_id.to_string()),
            vendor_id: Set(vendor_id),
            gross_price: Set(5.0),
            net_price: Set(4.5),
            use_net: Set(false),
            stock: Set(stock),
            hide: Set(false),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed specification");
    }

    pub async fn seed_employee(&self, id: i32, name: &str) {
        employee::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed employee");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
