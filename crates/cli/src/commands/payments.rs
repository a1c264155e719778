//! Payment method and payment detail commands.

use tienda_core::validation::mask_card_number;
use tienda_core::{PaymentDetailId, PaymentId, SettingId};
use tienda_storefront::payments::PaymentMethods;
use tracing::instrument;

use super::{CliError, Context};

fn service(ctx: &Context) -> PaymentMethods {
    PaymentMethods::new(ctx.repos.clone(), ctx.events.clone())
}

/// Print the payment methods the store offers.
///
/// # Errors
///
/// Returns the backend error.
#[allow(clippy::print_stdout)]
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    for payment in service(ctx).payments(true).await? {
        println!(
            "{:>4}  {:<30} {:<12} {}",
            payment.id.as_i64(),
            payment.name,
            payment.method,
            if payment.is_active { "activo" } else { "inactivo" }
        );
    }
    Ok(())
}

/// Print the logged-in user's saved payment details.
///
/// # Errors
///
/// Returns an error when nobody is logged in or the backend call fails.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn details(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.require_user().await?;
    let details = service(ctx).fetch_payment_details(user.id).await?;
    if details.is_empty() {
        println!("No hay métodos de pago guardados");
    }
    for detail in &details {
        let name = detail
            .payment
            .as_ref()
            .map_or_else(|| format!("pago {}", detail.payment_id), |p| p.name.clone());
        let card = detail
            .card_number
            .as_deref()
            .map(mask_card_number)
            .unwrap_or_default();
        println!("{:>4}  {name:<30} {card}", detail.id.as_i64());
    }
    Ok(())
}

/// Delete one of the logged-in user's saved payment details.
///
/// # Errors
///
/// Returns an error when nobody is logged in, the detail is not the
/// user's, or the backend refuses.
#[instrument(skip(ctx))]
pub async fn delete(ctx: &Context, detail_id: i64) -> Result<(), CliError> {
    let user = ctx.require_user().await?;
    let service = service(ctx);
    let id = PaymentDetailId::new(detail_id);
    let owned = service.fetch_payment_details(user.id).await?;
    if !owned.iter().any(|d| d.id == id) {
        return Err(CliError::InvalidArgument(format!(
            "payment detail {detail_id} not found for this user"
        )));
    }
    let result = service.delete_payment_detail(id).await;
    ctx.flush_events().await;
    result?;
    Ok(())
}

/// Print a store setting with the payments it accepts.
///
/// # Errors
///
/// Returns the backend error.
#[allow(clippy::print_stdout)]
pub async fn settings(ctx: &Context, setting_id: i64) -> Result<(), CliError> {
    let setting = service(ctx)
        .store_settings(SettingId::new(setting_id))
        .await?;
    println!("{} ({})", setting.name, setting.nickname);
    println!("{}, {}  tel. {}", setting.address, setting.city, setting.phone);
    for payment in &setting.payments {
        println!("  - {} [{}]", payment.name, payment.method);
    }
    Ok(())
}

/// Accept a payment method in a store setting.
///
/// # Errors
///
/// Returns the backend error.
#[instrument(skip(ctx))]
pub async fn accept(ctx: &Context, setting_id: i64, payment_id: i64) -> Result<(), CliError> {
    service(ctx)
        .add_payment_method(SettingId::new(setting_id), PaymentId::new(payment_id))
        .await?;
    ctx.flush_events().await;
    Ok(())
}
