//! Scan-derived identifier allocation for batches and purchase forms.
//!
//! Both schemes read the existing rows to derive the next id instead of
//! keeping a counter table. Concurrent allocations can therefore compute
//! the same candidate; callers close that race by inserting under the
//! unique index and retrying on a unique-constraint violation (see
//! `is_unique_violation`).

use chrono::{Datelike, NaiveDateTime};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    SqlErr,
};
use tracing::warn;

use crate::entities::{batch, instock_form};
use crate::errors::ServiceError;

/// Ids per month window. The usable capacity is one less because the
/// window's last slot belongs to the next month's prefix.
const MONTH_WINDOW: i32 = 100;

/// Month prefix for a batch serial: `((year - 2000) * 100 + month) * 100`.
/// March 2024 yields 240300 and its ids run 240301..=240399.
fn month_prefix(start: NaiveDateTime) -> Result<i32, ServiceError> {
    let year = start.year();
    if !(2000..=2099).contains(&year) {
        return Err(ServiceError::InvalidInput(format!(
            "batch start year {} is outside the supported id range (2000-2099)",
            year
        )));
    }
    Ok(((year - 2000) * 100 + start.month() as i32) * MONTH_WINDOW)
}

/// Allocates the next batch serial for the month of `start`.
///
/// Counts the batches already sitting in the month window and hands out
/// `prefix + count + 1`. Monotonic within a month as long as rows are
/// never deleted out from under it; the caller's insert is the final
/// arbiter via the primary key.
pub async fn allocate_batch_id<C>(db: &C, start: NaiveDateTime) -> Result<i32, ServiceError>
where
    C: ConnectionTrait,
{
    let prefix = month_prefix(start)?;

    let existing = batch::Entity::find()
        .filter(batch::Column::Id.gte(prefix))
        .filter(batch::Column::Id.lt(prefix + MONTH_WINDOW))
        .count(db)
        .await
        .map_err(ServiceError::db_error)? as i32;

    if existing >= MONTH_WINDOW - 1 {
        return Err(ServiceError::InvalidOperation(format!(
            "batch id window {}-{:02} is full ({} ids allocated)",
            start.year(),
            start.month(),
            existing
        )));
    }

    Ok(prefix + existing + 1)
}

/// Allocates the display id for a purchase form: `YYYYMMDD-VVV-NNNN`.
///
/// The counter scope is the vendor's forms created since January 1 of the
/// creation year. Legacy rows whose display id does not end in a
/// well-formed `-NNNN` tail are skipped with a warning rather than
/// poisoning the allocation.
pub async fn allocate_display_form_id<C>(
    db: &C,
    vendor_id: i32,
    create_time: NaiveDateTime,
) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
{
    let year_start = chrono::NaiveDate::from_ymd_opt(create_time.year(), 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "cannot derive the start of year {} for display id allocation",
                create_time.year()
            ))
        })?;

    let existing: Vec<String> = instock_form::Entity::find()
        .select_only()
        .column(instock_form::Column::DisplayFormId)
        .filter(instock_form::Column::VendorId.eq(vendor_id))
        .filter(instock_form::Column::CreateTime.gte(year_start))
        .into_tuple()
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    let mut max_count: u32 = 0;
    for display_id in &existing {
        match parse_display_id_count(display_id) {
            Some(count) => max_count = max_count.max(count),
            None => warn!(
                vendor_id,
                display_id, "skipping malformed display id while allocating"
            ),
        }
    }

    Ok(format!(
        "{}-{:03}-{:04}",
        create_time.format("%Y%m%d"),
        vendor_id,
        max_count + 1
    ))
}

/// Extracts the numeric `NNNN` tail of a display id, if well-formed.
fn parse_display_id_count(display_id: &str) -> Option<u32> {
    let tail = display_id.rsplit('-').next()?;
    if tail.len() != 4 {
        return None;
    }
    tail.parse().ok()
}

/// True when the database rejected an insert on a unique constraint, the
/// signal that another allocation won the race and the caller should
/// recompute and retry.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
