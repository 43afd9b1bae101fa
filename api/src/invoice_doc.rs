use db::{invoice_items::InvoiceItem, invoices::Invoice, InvoiceStatus};
use freelance_desk_db as db;

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

/// Renders an invoice as a Markdown document, one table row per line item.
/// The total row uses the stored amount, which item mutations keep equal to
/// the sum of the rows.
pub fn render_markdown(invoice: &Invoice, project_name: &str, items: &[InvoiceItem]) -> String {
    let status = match invoice.status {
        InvoiceStatus::Open => "Open",
        InvoiceStatus::Paid => "Paid",
    };

    let mut content = String::new();
    content.push_str(&format!("# Invoice: {}\n\n", invoice.title));
    content.push_str(&format!("**Project:** {project_name}  \n"));
    content.push_str(&format!("**Status:** {status}  \n"));
    content.push_str(&format!(
        "**Issued:** {}\n\n",
        invoice.created.format("%Y-%m-%d")
    ));

    content.push_str("| Description | Qty | Unit price | Amount |\n");
    content.push_str("| --- | ---: | ---: | ---: |\n");
    for item in items {
        let amount = item.quantity as i64 * item.unit_price_cents as i64;
        content.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            item.description,
            item.quantity,
            format_cents(item.unit_price_cents as i64),
            format_cents(amount),
        ));
    }

    content.push_str(&format!(
        "\n**Total: {}**\n",
        format_cents(invoice.amount_cents)
    ));

    content
}
