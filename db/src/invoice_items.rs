use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};

use crate::{
    object_id::{InvoiceId, InvoiceItemId},
    schema::*,
};

pub use crate::schema::invoice_items::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(invoice_item_id))]
pub struct InvoiceItem {
    pub invoice_item_id: InvoiceItemId,
    pub invoice_id: InvoiceId,
    pub description: String,
    pub quantity: i32,
    pub unit_price_cents: i32,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = invoice_items)]
pub struct NewInvoiceItem {
    pub invoice_item_id: InvoiceItemId,
    pub invoice_id: InvoiceId,
    pub description: String,
    pub quantity: i32,
    pub unit_price_cents: i32,
}

/// Sum of quantity times unit price across the items, widened to i64 so a
/// large line item cannot overflow the total.
pub fn total_cents(items: &[InvoiceItem]) -> i64 {
    items
        .iter()
        .map(|item| item.quantity as i64 * item.unit_price_cents as i64)
        .sum()
}

pub fn list_for_invoice(
    conn: &mut PgConnection,
    invoice: InvoiceId,
) -> Result<Vec<InvoiceItem>, diesel::result::Error> {
    table
        .filter(invoice_id.eq(invoice))
        .order(created.asc())
        .select(InvoiceItem::as_select())
        .load::<InvoiceItem>(conn)
}
