//! Unified error handling for admin.

use thiserror::Error;
use tienda_core::OrderId;
use tienda_storefront::api::ApiError;

/// Admin operation error.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Backend call failed.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// The order is not in the loaded list.
    #[error("Pedido no encontrado: {0}")]
    OrderNotFound(OrderId),

    /// Bulk action requested with an empty selection.
    #[error("No hay pedidos seleccionados")]
    NothingSelected,

    /// Undo requested with no bulk action recorded.
    #[error("No hay ninguna acción para deshacer")]
    NothingToUndo,

    /// Blank tracking number.
    #[error("El número de guía no puede estar vacío")]
    EmptyTracking,

    /// Refund requested twice.
    #[error("El pedido {0} ya fue reembolsado")]
    AlreadyRefunded(OrderId),

    /// Writing the export file failed.
    #[error("Error al exportar CSV: {0}")]
    Export(#[from] std::io::Error),
}
