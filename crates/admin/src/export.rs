//! CSV export of the admin order list.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tienda_core::Order;
use tracing::{info, instrument};

use crate::error::AdminError;

/// Header row of every export.
pub const CSV_HEADER: &str = "order_id,user_id,status_id,total,date_order,total_products";

/// Quote a field when it holds a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render orders as CSV, one row per order, header first.
#[must_use]
pub fn orders_to_csv(orders: &[Order]) -> String {
    let mut csv = String::with_capacity((orders.len() + 1) * 48);
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for order in orders {
        let row = [
            order.order_id.to_string(),
            order.user_id.to_string(),
            order.status_id.to_string(),
            order.total.normalize().to_string(),
            order.date_order.clone(),
            order.total_products.to_string(),
        ];
        let row: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

/// Write the export to `orders_export_<millis>.csv` inside `dir`.
///
/// # Errors
///
/// Returns `AdminError::Export` if the directory or file cannot be written.
#[instrument(skip(orders), fields(count = orders.len()))]
pub async fn export_orders_to_file(orders: &[Order], dir: &Path) -> Result<PathBuf, AdminError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "orders_export_{}.csv",
        Utc::now().timestamp_millis()
    ));
    tokio::fs::write(&path, orders_to_csv(orders)).await?;
    info!(path = %path.display(), "Orders exported");
    Ok(path)
}
