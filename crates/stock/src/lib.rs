//! Stock domain module.
//!
//! An in-memory product stock keyed by product name, implemented as a
//! deterministic command/event aggregate (no IO, no storage). [`SharedStock`]
//! wraps it behind a single lock for multi-caller use.

pub mod error;
pub mod product;
pub mod shared;
pub mod stock;

pub use error::{StockError, StockResult};
pub use product::{Money, NewProduct, ProductName, ProductRecord, ProductSnapshot};
pub use shared::SharedStock;
pub use stock::{
    AddProduct, ProductAdded, ProductDepleted, ProductRemoved, QuantityAdjusted, RemoveProduct,
    Stock, StockCommand, StockEvent, UpdateQuantity,
};
