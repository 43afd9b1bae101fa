use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use db::{
    access::AccessLevel,
    invoice_items::{self, InvoiceItem, NewInvoiceItem},
    invoices::{self, Invoice, NewInvoice},
    object_id::{InvoiceId, InvoiceItemId, ProjectId},
    InvoiceStatus, PoolExt,
};
use freelance_desk_db as db;

use crate::{
    auth::{require_project_access, Authenticated},
    invoice_doc,
    shared_state::AppState,
    Error, Result,
};

#[derive(Debug, Serialize)]
struct InvoiceResponse {
    #[serde(flatten)]
    invoice: Invoice,
    items: Vec<InvoiceItem>,
}

#[derive(Debug, Deserialize)]
struct InvoiceItemPayload {
    description: String,
    quantity: i32,
    unit_price_cents: i32,
}

impl InvoiceItemPayload {
    fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::invalid("description", "Description must not be empty"));
        }
        if self.quantity < 1 {
            return Err(Error::invalid("quantity", "Quantity must be at least 1"));
        }
        if self.unit_price_cents < 0 {
            return Err(Error::invalid(
                "unit_price_cents",
                "Unit price must not be negative",
            ));
        }

        Ok(())
    }

    fn into_row(self, invoice: InvoiceId) -> NewInvoiceItem {
        NewInvoiceItem {
            invoice_item_id: InvoiceItemId::new(),
            invoice_id: invoice,
            description: self.description,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
        }
    }
}

fn load_invoice(
    conn: &mut diesel::PgConnection,
    project: ProjectId,
    invoice: InvoiceId,
) -> Result<Invoice> {
    invoices::table
        .filter(
            invoices::invoice_id
                .eq(invoice)
                .and(invoices::project_id.eq(project)),
        )
        .select(Invoice::as_select())
        .first::<Invoice>(conn)
        .optional()?
        .ok_or(Error::NotFound)
}

fn invoice_with_items(
    conn: &mut diesel::PgConnection,
    project: ProjectId,
    invoice: InvoiceId,
) -> Result<InvoiceResponse> {
    let invoice = load_invoice(conn, project, invoice)?;
    let items = invoice_items::list_for_invoice(conn, invoice.invoice_id)?;
    Ok(InvoiceResponse { invoice, items })
}

async fn list_invoices(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse> {
    let invoices = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;

            invoices::table
                .filter(invoices::project_id.eq(project_id))
                .order(invoices::created.asc())
                .select(Invoice::as_select())
                .load::<Invoice>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok(Json(invoices))
}

#[derive(Debug, Deserialize)]
struct CreateInvoicePayload {
    title: String,
    #[serde(default)]
    items: Vec<InvoiceItemPayload>,
}

async fn create_invoice(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<CreateInvoicePayload>,
) -> Result<impl IntoResponse> {
    if payload.title.trim().is_empty() {
        return Err(Error::invalid("title", "Title must not be empty"));
    }
    for item in &payload.items {
        item.validate()?;
    }

    let response = state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let invoice = diesel::insert_into(invoices::table)
                .values(&NewInvoice {
                    invoice_id: InvoiceId::new(),
                    project_id,
                    owner_id: user_id,
                    title: payload.title,
                    amount_cents: 0,
                    status: InvoiceStatus::Open,
                })
                .get_result::<Invoice>(conn)?;

            for item in payload.items {
                diesel::insert_into(invoice_items::table)
                    .values(&item.into_row(invoice.invoice_id))
                    .execute(conn)?;
            }

            invoices::recompute_amount(conn, invoice.invoice_id)?;
            invoice_with_items(conn, project_id, invoice.invoice_id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_invoice(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invoice_id)): Path<(ProjectId, InvoiceId)>,
) -> Result<impl IntoResponse> {
    let response = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            invoice_with_items(conn, project_id, invoice_id)
        })
        .await?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct UpdateInvoicePayload {
    title: String,
    status: InvoiceStatus,
}

async fn update_invoice(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invoice_id)): Path<(ProjectId, InvoiceId)>,
    Json(payload): Json<UpdateInvoicePayload>,
) -> Result<impl IntoResponse> {
    if payload.title.trim().is_empty() {
        return Err(Error::invalid("title", "Title must not be empty"));
    }

    let response = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;
            load_invoice(conn, project_id, invoice_id)?;

            diesel::update(invoices::table.filter(invoices::invoice_id.eq(invoice_id)))
                .set((
                    invoices::title.eq(payload.title),
                    invoices::status.eq(payload.status),
                    invoices::updated.eq(Utc::now()),
                ))
                .execute(conn)?;

            invoice_with_items(conn, project_id, invoice_id)
        })
        .await?;

    Ok(Json(response))
}

async fn delete_invoice(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invoice_id)): Path<(ProjectId, InvoiceId)>,
) -> Result<impl IntoResponse> {
    state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            // Items go with it via the foreign key cascade.
            let deleted = diesel::delete(
                invoices::table.filter(
                    invoices::invoice_id
                        .eq(invoice_id)
                        .and(invoices::project_id.eq(project_id)),
                ),
            )
            .execute(conn)?;

            if deleted == 0 {
                Err(Error::NotFound)
            } else {
                Ok(())
            }
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn add_item(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invoice_id)): Path<(ProjectId, InvoiceId)>,
    Json(payload): Json<InvoiceItemPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let response = state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;
            load_invoice(conn, project_id, invoice_id)?;

            diesel::insert_into(invoice_items::table)
                .values(&payload.into_row(invoice_id))
                .execute(conn)?;
            invoices::recompute_amount(conn, invoice_id)?;

            invoice_with_items(conn, project_id, invoice_id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_item(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invoice_id, item_id)): Path<(ProjectId, InvoiceId, InvoiceItemId)>,
    Json(payload): Json<InvoiceItemPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let response = state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;
            load_invoice(conn, project_id, invoice_id)?;

            let updated = diesel::update(
                invoice_items::table.filter(
                    invoice_items::invoice_item_id
                        .eq(item_id)
                        .and(invoice_items::invoice_id.eq(invoice_id)),
                ),
            )
            .set((
                invoice_items::description.eq(payload.description),
                invoice_items::quantity.eq(payload.quantity),
                invoice_items::unit_price_cents.eq(payload.unit_price_cents),
            ))
            .execute(conn)?;

            if updated == 0 {
                return Err(Error::NotFound);
            }

            invoices::recompute_amount(conn, invoice_id)?;
            invoice_with_items(conn, project_id, invoice_id)
        })
        .await?;

    Ok(Json(response))
}

async fn delete_item(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invoice_id, item_id)): Path<(ProjectId, InvoiceId, InvoiceItemId)>,
) -> Result<impl IntoResponse> {
    let response = state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;
            load_invoice(conn, project_id, invoice_id)?;

            let deleted = diesel::delete(
                invoice_items::table.filter(
                    invoice_items::invoice_item_id
                        .eq(item_id)
                        .and(invoice_items::invoice_id.eq(invoice_id)),
                ),
            )
            .execute(conn)?;

            if deleted == 0 {
                return Err(Error::NotFound);
            }

            invoices::recompute_amount(conn, invoice_id)?;
            invoice_with_items(conn, project_id, invoice_id)
        })
        .await?;

    Ok(Json(response))
}

/// Renders the invoice as a Markdown document for download.
async fn invoice_document(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invoice_id)): Path<(ProjectId, InvoiceId)>,
) -> Result<impl IntoResponse> {
    let (invoice, items, project_name) = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;

            let invoice = load_invoice(conn, project_id, invoice_id)?;
            let items = invoice_items::list_for_invoice(conn, invoice_id)?;
            let project_name = db::projects::table
                .filter(db::projects::project_id.eq(project_id))
                .select(db::projects::name)
                .first::<String>(conn)?;

            Ok::<_, Error>((invoice, items, project_name))
        })
        .await?;

    let document = invoice_doc::render_markdown(&invoice, &project_name, &items);
    let disposition = format!("attachment; filename=\"invoice-{}.md\"", invoice.invoice_id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    ))
}

pub fn configure() -> Router {
    Router::new()
        .route(
            "/projects/:project_id/invoices",
            get(list_invoices).post(create_invoice),
        )
        .route(
            "/projects/:project_id/invoices/:invoice_id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route(
            "/projects/:project_id/invoices/:invoice_id/document",
            get(invoice_document),
        )
        .route(
            "/projects/:project_id/invoices/:invoice_id/items",
            post(add_item),
        )
        .route(
            "/projects/:project_id/invoices/:invoice_id/items/:item_id",
            put(update_item).delete(delete_item),
        )
}
