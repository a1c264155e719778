//! Session and email verification commands.

use secrecy::ExposeSecret;
use tienda_core::{CallbackConfig, Email, EmailVerificationRequest};
use tienda_storefront::auth::AuthError;
use tracing::instrument;

use super::{CliError, Context};

/// Log in and remember the session in the local store.
///
/// # Errors
///
/// Returns the login error with the backend's explanation when present.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx, password))]
pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<(), CliError> {
    let user = ctx.auth.login(email, password).await?;
    let role = if user.is_admin() { "administrador" } else { "cliente" };
    println!("Sesión iniciada como {} ({role})", user.username);
    Ok(())
}

/// Forget the saved session.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
#[allow(clippy::print_stdout)]
pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.auth.logout().await?;
    println!("Sesión cerrada");
    Ok(())
}

/// Ask the backend to verify `email`, calling `callback_url` when done.
///
/// The configured email API key, if any, is sent as the callback's bearer
/// token.
///
/// # Errors
///
/// Returns an error for an invalid address or a failed backend call.
#[allow(clippy::print_stdout)]
#[instrument(skip(ctx))]
pub async fn verify_start(ctx: &Context, email: &str, callback_url: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(AuthError::from)?;
    let bearer = ctx
        .config
        .email_api_key
        .as_ref()
        .map(|key| key.expose_secret().to_string());
    let request = EmailVerificationRequest {
        email: email.into_inner(),
        callback: CallbackConfig::post(callback_url, bearer.as_deref()),
    };
    let response = ctx.repos.email_verification.start(&request).await?;
    println!(
        "Verificación {} para {}: {}",
        response.verification_id, response.email, response.status
    );
    if !response.message.is_empty() {
        println!("{}", response.message);
    }
    Ok(())
}

/// Print the state of a verification.
///
/// # Errors
///
/// Returns the backend error.
#[allow(clippy::print_stdout)]
pub async fn verify_status(ctx: &Context, verification_id: &str) -> Result<(), CliError> {
    let status = ctx.repos.email_verification.status(verification_id).await?;
    println!(
        "{} ({}): {:?}",
        status.email_address,
        status.verification_id,
        status.state()
    );
    if let Some(verified_at) = &status.verified_at {
        println!("Verificado el {verified_at}");
    }
    Ok(())
}

/// Print the verification service description.
///
/// # Errors
///
/// Returns the backend error.
#[allow(clippy::print_stdout)]
pub async fn verify_info(ctx: &Context) -> Result<(), CliError> {
    let info = ctx.repos.email_verification.info().await?;
    println!("{} {}", info.service, info.version);
    if !info.description.is_empty() {
        println!("{}", info.description);
    }
    for (name, path) in &info.endpoints {
        println!("  {name}: {path}");
    }
    Ok(())
}
