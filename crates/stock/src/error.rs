//! Stock error model.

use thiserror::Error;

use estoque_core::DomainError;

pub type StockResult<T> = Result<T, StockError>;

/// Failures of stock operations.
///
/// Display strings are stable: existing consumers match on them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("Preço inválido para o produto.")]
    InvalidPrice,

    #[error("Quantidade inválida para o produto.")]
    InvalidQuantity,

    #[error("Nome inválido para o produto.")]
    InvalidName,

    #[error("Produto já existente no estoque.")]
    DuplicateProduct { name: String },

    #[error("Produto não encontrado no estoque.")]
    ProductNotFound { name: String },

    /// Zero delta, or a delta that would take the quantity below zero.
    #[error("Quantidade inválida para atualização.")]
    InvalidQuantityUpdate { name: String, delta: i64 },

    #[error("estoque indisponível: lock envenenado")]
    LockPoisoned,
}

impl StockError {
    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        Self::ProductNotFound { name: name.into() }
    }
}

impl From<StockError> for DomainError {
    fn from(err: StockError) -> Self {
        let msg = err.to_string();
        match err {
            StockError::InvalidPrice
            | StockError::InvalidQuantity
            | StockError::InvalidName
            | StockError::InvalidQuantityUpdate { .. } => DomainError::validation(msg),
            StockError::DuplicateProduct { .. } => DomainError::conflict(msg),
            StockError::ProductNotFound { .. } => DomainError::not_found(msg),
            StockError::LockPoisoned => DomainError::invariant(msg),
        }
    }
}
