//! Cart commands and checkout.
//!
//! The cart lives in the local store between invocations; every mutation
//! loads it, applies the change and writes it back.

use tienda_core::{ProductId, format_cop, format_price};
use tienda_storefront::cart::Cart;
use tienda_storefront::checkout::{Checkout, CheckoutResult};
use tracing::{info, instrument, warn};

use super::{CliError, Context};

async fn load(ctx: &Context) -> Cart {
    let mut cart = Cart::with_events(ctx.events.clone());
    cart.load_from(&ctx.store).await;
    cart
}

async fn save(ctx: &Context, cart: &Cart) -> Result<(), CliError> {
    cart.save_to(&ctx.store).await?;
    ctx.flush_events().await;
    Ok(())
}

/// Print the cart lines and totals.
pub async fn show(ctx: &Context) {
    let cart = load(ctx).await;
    print_cart(&cart);
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("El carrito está vacío");
        return;
    }
    for item in cart.items() {
        println!(
            "{:>5}  {:<40} x{:<3} {:>16}",
            item.product.id.as_i64(),
            item.product.name,
            item.quantity,
            format_price(item.product.price, item.quantity)
        );
    }
    println!(
        "Total: {} ({} productos)",
        format_cop(cart.total_price()),
        cart.total_quantity()
    );
}

/// Add `quantity` units of a product, read fresh from the backend.
///
/// # Errors
///
/// Returns an error for a non-positive quantity, a missing product, or a
/// stock violation.
#[instrument(skip(ctx))]
pub async fn add(ctx: &Context, product_id: i64, quantity: i32) -> Result<(), CliError> {
    if quantity < 1 {
        return Err(CliError::InvalidArgument(
            "quantity must be at least 1".to_string(),
        ));
    }
    let product_id = ProductId::new(product_id);
    let product = ctx.repos.products.fetch_by_id(product_id).await?;

    let mut cart = load(ctx).await;
    cart.add_to_cart(&product)?;
    if quantity > 1 {
        let current = cart
            .items()
            .iter()
            .find(|i| i.product.id == product_id)
            .map_or(0, |i| i.quantity);
        let target = i32::try_from(current).unwrap_or(i32::MAX).saturating_add(quantity - 1);
        cart.update_quantity(product_id, target)?;
    }
    save(ctx, &cart).await
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns the cart error for negative or excessive quantities.
#[instrument(skip(ctx))]
pub async fn set(ctx: &Context, product_id: i64, quantity: i32) -> Result<(), CliError> {
    let mut cart = load(ctx).await;
    cart.update_quantity(ProductId::new(product_id), quantity)?;
    save(ctx, &cart).await
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
#[instrument(skip(ctx))]
pub async fn remove(ctx: &Context, product_id: i64) -> Result<(), CliError> {
    let mut cart = load(ctx).await;
    cart.remove_from_cart(ProductId::new(product_id));
    save(ctx, &cart).await
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub async fn clear(ctx: &Context) -> Result<(), CliError> {
    let mut cart = load(ctx).await;
    cart.clear_cart();
    save(ctx, &cart).await
}

/// Re-read stock for every line, clamping quantities.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
#[instrument(skip(ctx))]
pub async fn refresh(ctx: &Context) -> Result<(), CliError> {
    let mut cart = load(ctx).await;
    let failed = cart.refresh_all_products_stock(&ctx.repos.products).await;
    if !failed.is_empty() {
        warn!(?failed, "Some products could not be refreshed");
    }
    save(ctx, &cart).await?;
    print_cart(&cart);
    Ok(())
}

/// Place an order for the whole cart as the logged-in user.
///
/// Lines that made it into the order leave the cart; failed lines stay so
/// the shopper can adjust and retry.
///
/// # Errors
///
/// Returns an error when nobody is logged in, the cart is empty, or the
/// order cannot be created.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn checkout(ctx: &Context, rollback: bool) -> Result<(), CliError> {
    let user = ctx.require_user().await?;
    let mut cart = load(ctx).await;

    let stale = cart.refresh_all_products_stock(&ctx.repos.products).await;
    if !stale.is_empty() {
        warn!(?stale, "Checking out with unrefreshed stock");
    }

    let checkout = Checkout::new(ctx.repos.clone());
    let result = if rollback {
        checkout
            .process_checkout_with_rollback(cart.items(), user.id)
            .await?
    } else {
        checkout.process_checkout(cart.items(), user.id).await?
    };

    settle(&mut cart, &result);
    save(ctx, &cart).await?;

    match (&result.order_id, result.failure_summary()) {
        (Some(order_id), None) => {
            info!(%order_id, "Checkout complete");
            println!("Pedido #{order_id} creado");
        }
        (Some(order_id), Some(summary)) => {
            println!("Pedido #{order_id} creado con errores. {summary}");
        }
        (None, summary) => {
            println!("No se creó el pedido. {}", summary.unwrap_or_default());
        }
    }
    for failed in &result.failed_items {
        println!("  - {}", failed.message);
    }
    Ok(())
}

fn settle(cart: &mut Cart, result: &CheckoutResult) {
    if result.success {
        cart.clear_cart();
        return;
    }
    for line in &result.created_order_products {
        cart.remove_from_cart(line.product_id.unwrap_or(line.product.id));
    }
}
