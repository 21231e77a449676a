use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use estoque_core::AggregateRoot;

use crate::error::{StockError, StockResult};
use crate::product::{NewProduct, ProductName, ProductSnapshot};
use crate::stock::Stock;

/// A [`Stock`] behind one lock guarding the whole mapping.
///
/// Clones share the same stock. Mutations take the write lock, reads take the
/// read lock.
#[derive(Debug, Clone, Default)]
pub struct SharedStock {
    inner: Arc<RwLock<Stock>>,
}

impl SharedStock {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StockResult<RwLockReadGuard<'_, Stock>> {
        self.inner.read().map_err(|_| {
            tracing::error!("stock lock poisoned (read)");
            StockError::LockPoisoned
        })
    }

    fn write(&self) -> StockResult<RwLockWriteGuard<'_, Stock>> {
        self.inner.write().map_err(|_| {
            tracing::error!("stock lock poisoned (write)");
            StockError::LockPoisoned
        })
    }

    pub fn add(&self, product: NewProduct) -> StockResult<()> {
        self.write()?.add(product)
    }

    pub fn update_quantity(&self, name: &str, delta: i64) -> StockResult<()> {
        self.write()?.update_quantity(name, delta)
    }

    pub fn remove(&self, name: &str) -> StockResult<()> {
        self.write()?.remove(name)
    }

    pub fn query(&self, name: &str) -> StockResult<ProductSnapshot> {
        self.read()?.query(name)
    }

    pub fn list(&self) -> StockResult<BTreeMap<ProductName, ProductSnapshot>> {
        Ok(self.read()?.list())
    }

    pub fn version(&self) -> StockResult<u64> {
        Ok(self.read()?.version())
    }

    /// Clone of the current stock state.
    pub fn snapshot(&self) -> StockResult<Stock> {
        Ok(self.read()?.clone())
    }
}

impl From<Stock> for SharedStock {
    fn from(stock: Stock) -> Self {
        Self {
            inner: Arc::new(RwLock::new(stock)),
        }
    }
}
