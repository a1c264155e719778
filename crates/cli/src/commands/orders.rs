//! Paged order listing.

use tienda_core::{Order, format_cop};
use tienda_storefront::paging::OrderPager;
use tracing::instrument;

use super::{CliError, Context, parse_status};

#[allow(clippy::print_stdout)]
pub(crate) fn print_orders(orders: &[Order]) {
    for order in orders {
        println!(
            "#{:<6} usuario {:<5} {:<12} {:>16}  {} productos  {}{}",
            order.order_id.as_i64(),
            order.user_id.as_i64(),
            order.status_label(),
            format_cop(order.total),
            order.total_products,
            order.date_order,
            order
                .tracking_number
                .as_deref()
                .map(|t| format!("  guía {t}"))
                .unwrap_or_default()
        );
    }
}

/// Print one page of orders, newest first.
///
/// # Errors
///
/// Returns an error for an unknown status or when orders cannot be loaded.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn list(
    ctx: &Context,
    page: usize,
    size: usize,
    status: Option<&str>,
    search: Option<String>,
) -> Result<(), CliError> {
    let status = status.map(parse_status).transpose()?;
    let pager = OrderPager::new(ctx.repos.orders.clone(), status, search);
    let loaded = pager.load(Some(page), size.max(1)).await?;

    if loaded.data.is_empty() {
        println!("No hay pedidos");
        return Ok(());
    }
    print_orders(&loaded.data);
    println!(
        "Página {}{}{}",
        page.max(1),
        loaded
            .prev_key
            .map(|p| format!("  anterior: {p}"))
            .unwrap_or_default(),
        loaded
            .next_key
            .map(|n| format!("  siguiente: {n}"))
            .unwrap_or_default()
    );
    Ok(())
}
