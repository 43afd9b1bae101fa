use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};

use crate::{
    enums::InvoiceStatus,
    object_id::{InvoiceId, ProjectId, UserId},
    schema::*,
};

pub use crate::schema::invoices::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(invoice_id))]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    pub project_id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = invoices)]
pub struct NewInvoice {
    pub invoice_id: InvoiceId,
    pub project_id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
}

/// Recalculates the stored total from the invoice's items. Every item
/// mutation must call this inside the same transaction so the stored
/// amount never drifts from the line items.
pub fn recompute_amount(
    conn: &mut PgConnection,
    invoice: InvoiceId,
) -> Result<i64, diesel::result::Error> {
    let items = crate::invoice_items::list_for_invoice(conn, invoice)?;
    let total = crate::invoice_items::total_cents(&items);

    diesel::update(table.filter(invoice_id.eq(invoice)))
        .set((amount_cents.eq(total), updated.eq(Utc::now())))
        .execute(conn)?;

    Ok(total)
}
