//! Purchase forms (instock), their items, and the append-only receipt
//! ledger. A receipt both advances the item's received balance and puts
//! the goods into the specification stock in one transaction.

use crate::{
    db::DbPool,
    entities::{instock_form, instock_item, instock_record, specification, vendor},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{identifiers, stock::apply_stock_delta},
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Forms start here and leave the open-deliveries board once moved on.
const ONGOING: &str = "ongoing";

/// One ordered line on a new purchase form. The item inherits the
/// specification's notice so vendor instructions travel with the order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateInstockItemInput {
    #[validate(length(min = 1, max = 32))]
    pub specification_id: String,
    #[validate(range(min = 1))]
    pub order_quantity: i32,
    pub unit_cost: f64,
    pub instock_date: Option<NaiveDate>,
    pub vendor_instock_date: Option<NaiveDate>,
}

/// Input for creating a purchase form with optional nested items.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseFormInput {
    pub vendor_id: i32,
    /// Defaults to now; also selects the display-id year scope.
    pub create_time: Option<NaiveDateTime>,
    pub form_status: Option<String>,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    pub note: Option<String>,
    pub paid: Option<bool>,
    #[serde(default)]
    #[validate]
    pub items: Vec<CreateInstockItemInput>,
}

/// Partial update of a form, addressed by form id + vendor id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseFormInput {
    pub form_status: Option<String>,
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    pub note: Option<String>,
    pub paid: Option<bool>,
    pub create_time: Option<NaiveDateTime>,
}

/// Input for appending an item to an existing form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddInstockItemInput {
    pub form_id: i32,
    #[validate(length(min = 1, max = 32))]
    pub specification_id: String,
    #[validate(range(min = 1))]
    pub order_quantity: i32,
    pub unit_cost: f64,
    pub last_time: Option<NaiveDateTime>,
    pub instock_date: Option<NaiveDate>,
    pub vendor_instock_date: Option<NaiveDate>,
    pub notice: Option<String>,
}

/// Partial update of an item. A changed `warehouse_quantity` is a
/// receipt correction: the difference is applied to the specification
/// stock.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateInstockItemInput {
    #[validate(length(min = 1, max = 32))]
    pub specification_id: Option<String>,
    #[validate(range(min = 1))]
    pub order_quantity: Option<i32>,
    pub unit_cost: Option<f64>,
    #[validate(range(min = 0))]
    pub warehouse_quantity: Option<i32>,
    pub last_time: Option<NaiveDateTime>,
    pub instock_date: Option<NaiveDate>,
    pub vendor_instock_date: Option<NaiveDate>,
    pub notice: Option<String>,
}

/// Input for booking a delivery against an item.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptInput {
    pub instock_item_id: i32,
    #[validate(range(min = 1))]
    pub amount: i32,
    pub operator: Option<String>,
    pub note: Option<String>,
}

/// Optional form list filters, all combinable.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct FormListFilter {
    pub form_id: Option<i32>,
    pub form_status: Option<String>,
    pub paid: Option<bool>,
}

/// A form with its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseFormDetail {
    pub form: instock_form::Model,
    pub items: Vec<instock_item::Model>,
}

/// An outstanding delivery: an item of an ongoing form that has not
/// fully arrived, with enough form context to render a board row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInstockItem {
    pub display_form_id: String,
    pub vendor_id: i32,
    pub item: instock_item::Model,
}

#[derive(Clone)]
pub struct ProcurementService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    id_retry_budget: u32,
}

impl ProcurementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, id_retry_budget: u32) -> Self {
        Self {
            db_pool,
            event_sender,
            id_retry_budget: id_retry_budget.max(1),
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Creates a form and its items in one transaction. The display id
    /// comes from the per-vendor-per-year allocator; collisions with
    /// concurrent inserts are retried within the configured budget.
    #[instrument(skip(self, input))]
    pub async fn create_form(
        &self,
        input: CreatePurchaseFormInput,
    ) -> Result<PurchaseFormDetail, ServiceError> {
        input.validate()?;
        let db = self.connection();

        vendor::Entity::find_by_id(input.vendor_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor {} not found", input.vendor_id))
            })?;

        let create_time = input.create_time.unwrap_or_else(|| Utc::now().naive_utc());

        let mut attempts = 0u32;
        let detail = loop {
            attempts += 1;
            let display_form_id =
                identifiers::allocate_display_form_id(db, input.vendor_id, create_time).await?;

            match self
                .insert_form_tree(&display_form_id, create_time, &input)
                .await
            {
                Ok(detail) => break detail,
                Err(ServiceError::DatabaseError(err))
                    if identifiers::is_unique_violation(&err) =>
                {
                    if attempts >= self.id_retry_budget {
                        return Err(ServiceError::AllocationConflict(format!(
                            "display form id {} kept colliding after {} attempts",
                            display_form_id, attempts
                        )));
                    }
                    warn!(
                        display_form_id,
                        attempt = attempts,
                        "display form id taken, reallocating"
                    );
                }
                Err(other) => return Err(other),
            }
        };

        counter!("workshop_api.procurement.forms_created", 1);
        info!(
            form_id = detail.form.form_id,
            display_form_id = %detail.form.display_form_id,
            items = detail.items.len(),
            "created purchase form"
        );
        self.event_sender
            .send_or_log(Event::PurchaseFormCreated {
                form_id: detail.form.form_id,
                display_form_id: detail.form.display_form_id.clone(),
                vendor_id: detail.form.vendor_id,
            })
            .await;

        Ok(detail)
    }

    async fn insert_form_tree(
        &self,
        display_form_id: &str,
        create_time: NaiveDateTime,
        input: &CreatePurchaseFormInput,
    ) -> Result<PurchaseFormDetail, ServiceError> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let form = instock_form::ActiveModel {
            display_form_id: Set(display_form_id.to_string()),
            vendor_id: Set(input.vendor_id),
            create_time: Set(create_time),
            form_status: Set(input
                .form_status
                .clone()
                .unwrap_or_else(|| ONGOING.to_string())),
            amount: Set(input.amount),
            note: Set(input.note.clone()),
            paid: Set(input.paid.unwrap_or(false)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let spec = specification::Entity::find_by_id(line.specification_id.clone())
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Specification {} not found",
                        line.specification_id
                    ))
                })?;

            let item = instock_item::ActiveModel {
                form_id: Set(form.form_id),
                specification_id: Set(line.specification_id.clone()),
                order_quantity: Set(line.order_quantity),
                unit_cost: Set(line.unit_cost),
                warehouse_quantity: Set(0),
                last_time: Set(Some(create_time)),
                instock_date: Set(line.instock_date),
                vendor_instock_date: Set(line.vendor_instock_date),
                notice: Set(spec.notice),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(item);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(PurchaseFormDetail { form, items })
    }

    /// A form with its items.
    #[instrument(skip(self))]
    pub async fn get_form(&self, form_id: i32) -> Result<PurchaseFormDetail, ServiceError> {
        let form = instock_form::Entity::find_by_id(form_id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase form {} not found", form_id)))?;

        let items = instock_item::Entity::find()
            .filter(instock_item::Column::FormId.eq(form_id))
            .order_by_asc(instock_item::Column::InstockItemId)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(PurchaseFormDetail { form, items })
    }

    /// Forms matching the filter, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_forms(
        &self,
        filter: &FormListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<instock_form::Model>, u64), ServiceError> {
        let mut query = instock_form::Entity::find();
        if let Some(form_id) = filter.form_id {
            query = query.filter(instock_form::Column::FormId.eq(form_id));
        }
        if let Some(form_status) = &filter.form_status {
            query = query.filter(instock_form::Column::FormStatus.eq(form_status.clone()));
        }
        if let Some(paid) = filter.paid {
            query = query.filter(instock_form::Column::Paid.eq(paid));
        }

        let paginator = query
            .order_by_desc(instock_form::Column::FormId)
            .paginate(self.connection(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let forms = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((forms, total))
    }

    /// Every form that has left the `ongoing` state.
    #[instrument(skip(self))]
    pub async fn historical_forms(&self) -> Result<Vec<instock_form::Model>, ServiceError> {
        instock_form::Entity::find()
            .filter(instock_form::Column::FormStatus.ne(ONGOING))
            .order_by_desc(instock_form::Column::FormId)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Updates a form addressed by form id + vendor id; the vendor scope
    /// keeps one vendor's edit from landing on another vendor's form.
    #[instrument(skip(self, input))]
    pub async fn update_form(
        &self,
        form_id: i32,
        vendor_id: i32,
        input: UpdatePurchaseFormInput,
    ) -> Result<instock_form::Model, ServiceError> {
        input.validate()?;
        let existing = instock_form::Entity::find()
            .filter(instock_form::Column::FormId.eq(form_id))
            .filter(instock_form::Column::VendorId.eq(vendor_id))
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase form {} of vendor {} not found",
                    form_id, vendor_id
                ))
            })?;

        let mut active: instock_form::ActiveModel = existing.into();
        if let Some(form_status) = input.form_status {
            active.form_status = Set(form_status);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(note) = input.note {
            active.note = Set(Some(note));
        }
        if let Some(paid) = input.paid {
            active.paid = Set(paid);
        }
        if let Some(create_time) = input.create_time {
            active.create_time = Set(create_time);
        }

        active
            .update(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Flips the paid flag.
    #[instrument(skip(self))]
    pub async fn set_form_paid(
        &self,
        form_id: i32,
        paid: bool,
    ) -> Result<instock_form::Model, ServiceError> {
        let existing = instock_form::Entity::find_by_id(form_id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase form {} not found", form_id)))?;

        let mut active: instock_form::ActiveModel = existing.into();
        active.paid = Set(paid);
        active
            .update(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Appends an item to an existing form.
    #[instrument(skip(self, input))]
    pub async fn add_item(
        &self,
        input: AddInstockItemInput,
    ) -> Result<instock_item::Model, ServiceError> {
        input.validate()?;
        instock_form::Entity::find_by_id(input.form_id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase form {} not found", input.form_id))
            })?;

        instock_item::ActiveModel {
            form_id: Set(input.form_id),
            specification_id: Set(input.specification_id),
            order_quantity: Set(input.order_quantity),
            unit_cost: Set(input.unit_cost),
            warehouse_quantity: Set(0),
            last_time: Set(Some(
                input.last_time.unwrap_or_else(|| Utc::now().naive_utc()),
            )),
            instock_date: Set(input.instock_date),
            vendor_instock_date: Set(input.vendor_instock_date),
            notice: Set(input.notice),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(ServiceError::db_error)
    }

    /// Applies a partial item update. A changed `warehouse_quantity`
    /// moves the difference through the specification stock in the same
    /// transaction.
    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        instock_item_id: i32,
        input: UpdateInstockItemInput,
    ) -> Result<instock_item::Model, ServiceError> {
        input.validate()?;
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let existing = instock_item::Entity::find_by_id(instock_item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Instock item {} not found", instock_item_id))
            })?;

        let target_specification = input
            .specification_id
            .clone()
            .unwrap_or_else(|| existing.specification_id.clone());
        if let Some(warehouse_quantity) = input.warehouse_quantity {
            let delta = warehouse_quantity - existing.warehouse_quantity;
            if delta != 0 {
                apply_stock_delta(&txn, &target_specification, delta).await?;
            }
        }

        let mut active: instock_item::ActiveModel = existing.into();
        if let Some(specification_id) = input.specification_id {
            active.specification_id = Set(specification_id);
        }
        if let Some(order_quantity) = input.order_quantity {
            active.order_quantity = Set(order_quantity);
        }
        if let Some(unit_cost) = input.unit_cost {
            active.unit_cost = Set(unit_cost);
        }
        if let Some(warehouse_quantity) = input.warehouse_quantity {
            active.warehouse_quantity = Set(warehouse_quantity);
        }
        if let Some(last_time) = input.last_time {
            active.last_time = Set(Some(last_time));
        }
        if let Some(instock_date) = input.instock_date {
            active.instock_date = Set(Some(instock_date));
        }
        if let Some(vendor_instock_date) = input.vendor_instock_date {
            active.vendor_instock_date = Set(Some(vendor_instock_date));
        }
        if let Some(notice) = input.notice {
            active.notice = Set(Some(notice));
        }
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(updated)
    }

    /// The outstanding-deliveries board: items of ongoing forms that
    /// have not fully arrived.
    #[instrument(skip(self))]
    pub async fn open_items(&self) -> Result<Vec<OpenInstockItem>, ServiceError> {
        let db = self.connection();
        let forms = instock_form::Entity::find()
            .filter(instock_form::Column::FormStatus.eq(ONGOING))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if forms.is_empty() {
            return Ok(Vec::new());
        }

        let form_index: HashMap<i32, &instock_form::Model> =
            forms.iter().map(|f| (f.form_id, f)).collect();
        let form_ids: Vec<i32> = forms.iter().map(|f| f.form_id).collect();

        let items = instock_item::Entity::find()
            .filter(instock_item::Column::FormId.is_in(form_ids))
            .order_by_asc(instock_item::Column::InstockItemId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(items
            .into_iter()
            .filter(|item| item.warehouse_quantity < item.order_quantity)
            .filter_map(|item| {
                form_index.get(&item.form_id).map(|form| OpenInstockItem {
                    display_form_id: form.display_form_id.clone(),
                    vendor_id: form.vendor_id,
                    item,
                })
            })
            .collect())
    }

    /// Books a delivery in one transaction: appends a ledger record,
    /// advances the item's received balance, and puts the goods into the
    /// specification stock.
    #[instrument(skip(self, input))]
    pub async fn receive(&self, input: ReceiptInput) -> Result<instock_item::Model, ServiceError> {
        input.validate()?;
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let item = instock_item::Entity::find_by_id(input.instock_item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Instock item {} not found",
                    input.instock_item_id
                ))
            })?;

        let balance = item.warehouse_quantity + input.amount;
        let now = Utc::now().naive_utc();

        instock_record::ActiveModel {
            instock_item_id: Set(item.instock_item_id),
            amount_in: Set(input.amount),
            balance: Set(balance),
            operator: Set(input.operator.clone()),
            record_time: Set(now),
            note: Set(input.note.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let specification_id = item.specification_id.clone();
        let mut active: instock_item::ActiveModel = item.into();
        active.warehouse_quantity = Set(balance);
        active.last_time = Set(Some(now));
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        apply_stock_delta(&txn, &specification_id, input.amount).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("workshop_api.procurement.receipts", 1);
        self.event_sender
            .send_or_log(Event::StockReceived {
                instock_item_id: updated.instock_item_id,
                specification_id,
                amount: input.amount,
                balance,
            })
            .await;

        Ok(updated)
    }

    /// Receipt ledger of one item, oldest first.
    #[instrument(skip(self))]
    pub async fn records_for_item(
        &self,
        instock_item_id: i32,
    ) -> Result<Vec<instock_record::Model>, ServiceError> {
        instock_record::Entity::find()
            .filter(instock_record::Column::InstockItemId.eq(instock_item_id))
            .order_by_asc(instock_record::Column::Id)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Receipt ledger of a whole form, across all its items.
    #[instrument(skip(self))]
    pub async fn records_for_form(
        &self,
        form_id: i32,
    ) -> Result<Vec<instock_record::Model>, ServiceError> {
        let item_ids: Vec<i32> = instock_item::Entity::find()
            .select_only()
            .column(instock_item::Column::InstockItemId)
            .filter(instock_item::Column::FormId.eq(form_id))
            .into_tuple()
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)?;
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        instock_record::Entity::find()
            .filter(instock_record::Column::InstockItemId.is_in(item_ids))
            .order_by_asc(instock_record::Column::Id)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Receipts whose `record_time` falls inside the inclusive range.
    #[instrument(skip(self))]
    pub async fn records_in_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<instock_record::Model>, ServiceError> {
        instock_record::Entity::find()
            .filter(instock_record::Column::RecordTime.gte(from))
            .filter(instock_record::Column::RecordTime.lte(to))
            .order_by_asc(instock_record::Column::RecordTime)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }
}
