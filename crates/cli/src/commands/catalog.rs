//! Product catalog listing.

use tienda_core::{CategoryId, format_cop};
use tracing::instrument;

use super::{CliError, Context};

/// Print every product, or those in `category`, with price and stock.
///
/// # Errors
///
/// Returns the backend error when the list cannot be loaded.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn list(ctx: &Context, refresh: bool, category: Option<i64>) -> Result<(), CliError> {
    let products = match category {
        Some(id) => {
            ctx.repos
                .products_in_category(CategoryId::new(id), refresh)
                .await?
        }
        None => ctx.repos.products.get_all(refresh).await?,
    };
    if products.is_empty() {
        println!("No hay productos disponibles");
        return Ok(());
    }
    for product in &products {
        let stock = if product.in_stock() {
            format!("{} en stock", product.stock)
        } else {
            "Agotado".to_string()
        };
        println!(
            "{:>5}  {:<40} {:>16}  {stock}",
            product.id.as_i64(),
            product.name,
            format_cop(product.price)
        );
    }
    Ok(())
}
