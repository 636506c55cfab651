//! Specification stock arithmetic and component low-stock checks.
//!
//! `apply_stock_delta` is the one primitive every stock-moving path
//! shares: material issues, receipt events, and manual corrections all
//! funnel through it so the arithmetic lives in one place.

use crate::{
    db::DbPool,
    entities::{component, specification},
    errors::ServiceError,
    events::{Event, EventSender},
};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Applies a signed delta to a specification's stock and returns the
/// updated row. Negative balances are allowed: the warehouse can be
/// counted into the red and corrected later.
pub async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    specification_id: &str,
    delta: i32,
) -> Result<specification::Model, ServiceError> {
    let spec = specification::Entity::find_by_id(specification_id.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Specification {} not found", specification_id))
        })?;

    let stock = spec.stock + delta;
    let mut active: specification::ActiveModel = spec.into();
    active.stock = Set(stock);
    active.update(conn).await.map_err(ServiceError::db_error)
}

/// Stock posture of one component: its restock threshold against the
/// summed stock of all its specifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub component_id: String,
    pub component_name: String,
    pub warn_stock: Option<i32>,
    pub available: i32,
    pub low: bool,
}

fn stock_level(component: &component::Model, available: i64) -> StockLevel {
    let available = i32::try_from(available).unwrap_or(i32::MAX);
    StockLevel {
        component_id: component.id.clone(),
        component_name: component.name.clone(),
        warn_stock: component.warn_stock,
        available,
        low: component.warn_stock.map_or(false, |warn| warn > available),
    }
}

#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Manual stock correction for one specification.
    #[instrument(skip(self))]
    pub async fn adjust_specification_stock(
        &self,
        specification_id: &str,
        delta: i32,
    ) -> Result<specification::Model, ServiceError> {
        let updated = apply_stock_delta(self.connection(), specification_id, delta).await?;
        counter!(
            "workshop_api.stock.adjustments",
            1,
            "direction" => if delta >= 0 { "in" } else { "out" }
        );
        Ok(updated)
    }

    /// Every visible component below its restock threshold.
    #[instrument(skip(self))]
    pub async fn low_stock_components(&self) -> Result<Vec<StockLevel>, ServiceError> {
        let db = self.connection();
        let components = component::Entity::find()
            .filter(component::Column::Hide.eq(false))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let specs = specification::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let mut totals: HashMap<String, i64> = HashMap::new();
        for spec in specs {
            *totals.entry(spec.component_id).or_insert(0) += spec.stock as i64;
        }

        Ok(components
            .iter()
            .map(|c| stock_level(c, totals.get(&c.id).copied().unwrap_or(0)))
            .filter(|level| level.low)
            .collect())
    }

    /// Stock posture of one component. A low result is also announced
    /// on the event bus so listeners can nag procurement.
    #[instrument(skip(self))]
    pub async fn component_stock_level(
        &self,
        component_id: &str,
    ) -> Result<StockLevel, ServiceError> {
        let db = self.connection();
        let component = component::Entity::find_by_id(component_id.to_string())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Component {} not found", component_id))
            })?;

        let specs = specification::Entity::find()
            .filter(specification::Column::ComponentId.eq(component.id.clone()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let available: i64 = specs.iter().map(|s| s.stock as i64).sum();

        let level = stock_level(&component, available);
        if level.low {
            self.event_sender
                .send_or_log(Event::LowStock {
                    component_id: level.component_id.clone(),
                    warn_stock: level.warn_stock.unwrap_or(0),
                    available: level.available,
                })
                .await;
        }
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use tokio::sync::mpsc;

    async fn service_with_events() -> (StockService, mpsc::Receiver<Event>) {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..DbConfig::default()
        };
        let db = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        let (tx, rx) = mpsc::channel(16);
        let service = StockService::new(Arc::new(db), Arc::new(EventSender::new(tx)));
        (service, rx)
    }

    async fn seed_component(
        service: &StockService,
        id: &str,
        warn_stock: Option<i32>,
        hide: bool,
    ) {
        component::ActiveModel {
            id: Set(id.to_string()),
            name: Set(format!("{} pieces", id)),
            warn_stock: Set(warn_stock),
            hide: Set(hide),
            ..Default::default()
        }
        .insert(service.connection())
        .await
        .unwrap();
    }

    async fn seed_spec(service: &StockService, id: &str, component_id: &str, stock: i32) {
        specification::ActiveModel {
            id: Set(id.to_string()),
            component_id: Set(component_id.to_string()),
            vendor_id: Set(7),
            gross_price: Set(5.0),
            net_price: Set(4.5),
            use_net: Set(false),
            stock: Set(stock),
            hide: Set(false),
            ..Default::default()
        }
        .insert(service.connection())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn adjustments_apply_signed_deltas() {
        let (service, _rx) = service_with_events().await;
        seed_component(&service, "CU-03", None, false).await;
        seed_spec(&service, "CU-03-A", "CU-03", 10).await;

        let up = service.adjust_specification_stock("CU-03-A", 15).await.unwrap();
        assert_eq!(up.stock, 25);

        let down = service.adjust_specification_stock("CU-03-A", -30).await.unwrap();
        assert_eq!(down.stock, -5);

        let err = service
            .adjust_specification_stock("GHOST", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn low_stock_sums_specifications_per_component() {
        let (service, _rx) = service_with_events().await;
        // 4 + 3 = 7 < 10: low.
        seed_component(&service, "CU-03", Some(10), false).await;
        seed_spec(&service, "CU-03-A", "CU-03", 4).await;
        seed_spec(&service, "CU-03-B", "CU-03", 3).await;
        // 20 >= 5: fine.
        seed_component(&service, "AL-01", Some(5), false).await;
        seed_spec(&service, "AL-01-A", "AL-01", 20).await;
        // No threshold: never low.
        seed_component(&service, "FE-09", None, false).await;
        // Hidden components are out of scope even when empty.
        seed_component(&service, "ZZ-99", Some(100), true).await;

        let low = service.low_stock_components().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].component_id, "CU-03");
        assert_eq!(low[0].available, 7);
        assert!(low[0].low);
    }

    #[tokio::test]
    async fn component_without_specifications_counts_as_empty() {
        let (service, _rx) = service_with_events().await;
        seed_component(&service, "CU-03", Some(1), false).await;

        let low = service.low_stock_components().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].available, 0);
    }

    #[tokio::test]
    async fn single_component_check_emits_event_only_when_low() {
        let (service, mut rx) = service_with_events().await;
        seed_component(&service, "CU-03", Some(10), false).await;
        seed_spec(&service, "CU-03-A", "CU-03", 4).await;
        seed_component(&service, "AL-01", Some(5), false).await;
        seed_spec(&service, "AL-01-A", "AL-01", 20).await;

        let level = service.component_stock_level("CU-03").await.unwrap();
        assert!(level.low);
        match rx.recv().await.unwrap() {
            Event::LowStock {
                component_id,
                warn_stock,
                available,
            } => {
                assert_eq!(component_id, "CU-03");
                assert_eq!(warn_stock, 10);
                assert_eq!(available, 4);
            }
            other => panic!("unexpected event {:?}", other),
        }

        let level = service.component_stock_level("AL-01").await.unwrap();
        assert!(!level.low);
        assert!(rx.try_recv().is_err());

        let err = service.component_stock_level("GHOST").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
