//! Errors returned by every backend call.
//!
//! Failures fall in two groups: connectivity problems (the request never got
//! an answer) and HTTP responses with a non-success status. Both map to a
//! Spanish message for the shopper via [`ApiError::user_message`].

use thiserror::Error;

/// Marker the backend puts in stock conflict bodies.
const STOCK_MARKER: &str = "stock insuficiente";

/// Errors that can occur when talking to the store backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// No connection could be opened, so the request was never sent.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The connection broke after the request may have been sent.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl ApiError {
    /// HTTP status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request never reached a server answer.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connect(_) | Self::Unreachable(_))
    }

    /// Whether the request failed before anything reached the server.
    /// Only these failures are safe to resend for non-idempotent calls.
    #[must_use]
    pub const fn is_connect(&self) -> bool {
        matches!(self, Self::Connect(_))
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) | Self::Unreachable(_) => true,
            Self::Http { status, .. } => *status >= 500 && *status <= 599,
            Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }

    /// Whether the backend rejected the request for lack of stock.
    #[must_use]
    pub fn is_stock_conflict(&self) -> bool {
        match self {
            Self::Http { status: 409, .. } => true,
            Self::Http { body, .. } => body.to_lowercase().contains(STOCK_MARKER),
            _ => false,
        }
    }

    /// Whether the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// Spanish message for any backend call.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => "Error de conexión: Tiempo de espera agotado. Por favor, verifica tu conexión a internet.".to_string(),
            Self::Connect(_) | Self::Unreachable(_) => "Error de conexión: No se pudo conectar al servidor. Verifica que el servidor esté en ejecución.".to_string(),
            Self::Http { status, body } => match status {
                400 => "Solicitud inválida".to_string(),
                401 => "No autorizado".to_string(),
                403 => "Acceso denegado".to_string(),
                404 => "Recurso no encontrado".to_string(),
                408 => "Tiempo de espera agotado".to_string(),
                500 => "Error interno del servidor".to_string(),
                502 => "Servidor no disponible".to_string(),
                503 => "Servicio temporalmente no disponible".to_string(),
                400..=499 => format!("Error del cliente: {}", summarize(body, *status)),
                500..=599 => format!("Error del servidor: {}", summarize(body, *status)),
                _ => format!("Error de red: {}", summarize(body, *status)),
            },
            Self::Decode(msg) | Self::InvalidUrl(msg) => format!("Error inesperado: {msg}"),
        }
    }

    /// Spanish message for order line (`/api/order-products`) calls.
    #[must_use]
    pub fn order_line_message(&self) -> String {
        match self {
            Self::Timeout => "Tiempo de espera agotado. Verifique su conexión.".to_string(),
            Self::Connect(_) | Self::Unreachable(_) => "Error de conexión. Verifique su conexión a internet.".to_string(),
            Self::Http { status: 400, body } => {
                let lower = body.to_lowercase();
                if lower.contains(STOCK_MARKER) {
                    "No hay suficiente stock disponible".to_string()
                } else if lower.contains("product id es requerido") {
                    "ID del producto es requerido".to_string()
                } else if lower.contains("order id es requerido") {
                    "ID del pedido es requerido".to_string()
                } else {
                    "Datos inválidos en la solicitud".to_string()
                }
            }
            Self::Http { status: 404, .. } => "Producto o pedido no encontrado".to_string(),
            Self::Http { status: 409, .. } => "Stock insuficiente para este producto".to_string(),
            Self::Http { status: 500, .. } => {
                "Error interno del servidor. Intente nuevamente.".to_string()
            }
            Self::Http { status, .. } => format!("Error del servidor ({status})"),
            Self::Decode(msg) | Self::InvalidUrl(msg) => msg.clone(),
        }
    }
}

/// First line of an error body, or the bare status when empty.
fn summarize(body: &str, status: u16) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        status.to_string()
    } else {
        line.chars().take(200).collect()
    }
}
