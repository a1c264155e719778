//! Administrator commands: order status, tracking, refunds, export and the
//! client list.

use std::path::Path;

use tienda_admin::clients::{ClientList, ClientSort, ClientStats};
use tienda_admin::export::export_orders_to_file;
use tienda_admin::orders::{AdminOrders, BulkOutcome};
use tienda_core::{OrderId, OrderStatus, format_cop};
use tienda_storefront::repository::Repositories;
use tracing::{info, instrument, warn};

use super::orders::print_orders;
use super::{CliError, Context, parse_status};

/// Require a logged-in administrator.
///
/// # Errors
///
/// `NotLoggedIn` or `NotAdmin`.
pub async fn require_admin(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.require_user().await?;
    if !user.is_admin() {
        warn!(user_id = %user.id, "Admin command refused");
        return Err(CliError::NotAdmin);
    }
    Ok(())
}

async fn loaded(ctx: &Context) -> Result<AdminOrders<Repositories>, CliError> {
    let mut admin = AdminOrders::new(ctx.repos.clone());
    admin.refresh().await?;
    Ok(admin)
}

/// Print a filtered page of orders with per-status counts.
///
/// # Errors
///
/// Returns an error for an unknown status or when orders cannot be loaded.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn orders(
    ctx: &Context,
    page: usize,
    size: usize,
    status: Option<&str>,
    search: Option<String>,
) -> Result<(), CliError> {
    let status = status.map(parse_status).transpose()?;
    let mut admin = loaded(ctx).await?;

    let counts = admin.status_counts();
    let summary: Vec<String> = OrderStatus::ALL
        .iter()
        .map(|s| format!("{}: {}", s.label(), counts.get(&s.id()).copied().unwrap_or(0)))
        .collect();
    println!("{} pedidos  ({})", admin.orders().len(), summary.join(", "));

    admin.set_filter(status, search);
    print_orders(&admin.page(page, size.max(1)));
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_outcome(outcome: &BulkOutcome, status: OrderStatus) {
    println!(
        "{} pedidos marcados como {}",
        outcome.updated.len(),
        status.label()
    );
    if !outcome.failed.is_empty() {
        let failed: Vec<String> = outcome.failed.iter().map(ToString::to_string).collect();
        println!("No se pudieron actualizar: {}", failed.join(", "));
    }
    if !outcome.skipped.is_empty() {
        let skipped: Vec<String> = outcome.skipped.iter().map(ToString::to_string).collect();
        println!("Pedidos no encontrados: {}", skipped.join(", "));
    }
}

/// Change the status of the given orders.
///
/// A single order goes through the optimistic path; several go through the
/// bulk action.
///
/// # Errors
///
/// Returns an error for an unknown status, an empty id list, or a backend
/// failure.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn set_status(ctx: &Context, status: &str, order_ids: &[i64]) -> Result<(), CliError> {
    let status = parse_status(status)?;
    let mut admin = loaded(ctx).await?;

    if let [only] = order_ids {
        admin
            .update_order_status_optimistic(OrderId::new(*only), status)
            .await?;
        println!("Pedido #{only} marcado como {}", status.label());
        return Ok(());
    }

    for id in order_ids {
        admin.select(OrderId::new(*id));
    }
    let outcome = if status == OrderStatus::Shipped {
        admin.mark_selected_as_shipped().await?
    } else {
        admin.mark_selected_as(status).await?
    };
    print_outcome(&outcome, status);
    Ok(())
}

/// Attach a tracking number to an order.
///
/// # Errors
///
/// Returns an error for a blank number or a backend failure.
#[allow(clippy::print_stdout)]
pub async fn track(ctx: &Context, order_id: i64, tracking_number: &str) -> Result<(), CliError> {
    let mut admin = AdminOrders::new(ctx.repos.clone());
    let order = admin
        .assign_tracking(OrderId::new(order_id), tracking_number)
        .await?;
    println!(
        "Pedido #{} con guía {}",
        order.order_id,
        order.tracking_number.unwrap_or_default()
    );
    Ok(())
}

/// Refund an order and restock its lines.
///
/// # Errors
///
/// Returns an error if the order is already refunded or the backend fails.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn refund(ctx: &Context, order_id: i64) -> Result<(), CliError> {
    let mut admin = loaded(ctx).await?;
    let outcome = admin.refund_order(OrderId::new(order_id)).await?;
    println!(
        "Pedido #{} reembolsado ({}), {} líneas devueltas al inventario",
        outcome.order.order_id,
        format_cop(outcome.order.total),
        outcome.restocked_lines
    );
    Ok(())
}

/// Export every order to a CSV file in `dir`.
///
/// # Errors
///
/// Returns an error if orders cannot be loaded or the file written.
#[allow(clippy::print_stdout)]
pub async fn export(ctx: &Context, dir: &Path) -> Result<(), CliError> {
    let admin = loaded(ctx).await?;
    let path = export_orders_to_file(admin.orders(), dir).await?;
    println!("{}", path.display());
    Ok(())
}

/// Print customers matching `search`, ordered by `sort`.
///
/// # Errors
///
/// Returns an error for an unknown sort or when clients cannot be loaded.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn clients(ctx: &Context, search: &str, sort: &str) -> Result<(), CliError> {
    let sort: ClientSort = sort.parse().map_err(CliError::InvalidArgument)?;
    let mut list = ClientList::new(ctx.repos.users.clone());
    let total = list.load().await?;
    let view = list.view(search, sort);
    info!(total, shown = view.len(), sort = sort.label(), "Client list");

    for client in &view {
        let stats = ClientStats::for_client(client);
        println!(
            "{:>5}  {:<20} {:<30} {:>3} pedidos {:>16}  último {}",
            client.id.as_i64(),
            client.username,
            client.email,
            stats.total_orders,
            format_cop(stats.total_spent),
            stats.last_order_date.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
