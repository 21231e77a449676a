use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estoque_core::{Aggregate, AggregateRoot, Entity};
use estoque_events::Event;

use crate::error::{StockError, StockResult};
use crate::product::{Money, NewProduct, ProductName, ProductRecord, ProductSnapshot};

/// Aggregate root: Stock.
///
/// Owns every product record, keyed by name. Records present always have a
/// positive quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stock {
    products: BTreeMap<ProductName, ProductRecord>,
    version: u64,
}

impl AggregateRoot for Stock {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProduct {
    pub product: NewProduct,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateQuantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuantity {
    pub name: String,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCommand {
    AddProduct(AddProduct),
    UpdateQuantity(UpdateQuantity),
    RemoveProduct(RemoveProduct),
}

/// Event: ProductAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAdded {
    pub name: ProductName,
    pub quantity: i64,
    pub unit_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityAdjusted. The record stays in stock with `new_quantity > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityAdjusted {
    pub name: ProductName,
    pub delta: i64,
    pub new_quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductDepleted. A quantity update brought the record to exactly zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDepleted {
    pub name: ProductName,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRemoved {
    pub name: ProductName,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    ProductAdded(ProductAdded),
    QuantityAdjusted(QuantityAdjusted),
    ProductDepleted(ProductDepleted),
    ProductRemoved(ProductRemoved),
}

impl StockEvent {
    pub fn name(&self) -> &ProductName {
        match self {
            StockEvent::ProductAdded(e) => &e.name,
            StockEvent::QuantityAdjusted(e) => &e.name,
            StockEvent::ProductDepleted(e) => &e.name,
            StockEvent::ProductRemoved(e) => &e.name,
        }
    }
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::ProductAdded(_) => "stock.product.added",
            StockEvent::QuantityAdjusted(_) => "stock.product.quantity_adjusted",
            StockEvent::ProductDepleted(_) => "stock.product.depleted",
            StockEvent::ProductRemoved(_) => "stock.product.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::ProductAdded(e) => e.occurred_at,
            StockEvent::QuantityAdjusted(e) => e.occurred_at,
            StockEvent::ProductDepleted(e) => e.occurred_at,
            StockEvent::ProductRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Stock {
    type Command = StockCommand;
    type Event = StockEvent;
    type Error = StockError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StockEvent::ProductAdded(e) => {
                let record = ProductRecord {
                    name: e.name.clone(),
                    quantity: e.quantity,
                    unit_price: e.unit_price,
                };
                self.products.insert(record.id().clone(), record);
            }
            StockEvent::QuantityAdjusted(e) => {
                if let Some(record) = self.products.get_mut(&e.name) {
                    record.quantity = e.new_quantity;
                }
            }
            StockEvent::ProductDepleted(ProductDepleted { name, .. })
            | StockEvent::ProductRemoved(ProductRemoved { name, .. }) => {
                self.products.remove(name);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StockCommand::AddProduct(cmd) => self.handle_add(cmd),
            StockCommand::UpdateQuantity(cmd) => self.handle_update(cmd),
            StockCommand::RemoveProduct(cmd) => self.handle_remove(cmd),
        }
    }
}

/// Pair each event with the aggregate version reached once it was applied,
/// given the version after the whole batch.
fn numbered(version_after: u64, events: &[StockEvent]) -> impl Iterator<Item = (u64, &StockEvent)> {
    let first = version_after + 1 - events.len() as u64;
    (first..).zip(events)
}

impl Stock {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, name: &str) -> StockResult<&ProductRecord> {
        self.products
            .get(name)
            .ok_or_else(|| StockError::not_found(name))
    }

    // Check order: price, quantity, name, duplicate.
    fn handle_add(&self, cmd: &AddProduct) -> StockResult<Vec<StockEvent>> {
        let product = &cmd.product;
        if !product.unit_price.is_positive() {
            return Err(StockError::InvalidPrice);
        }
        if product.quantity <= 0 {
            return Err(StockError::InvalidQuantity);
        }
        let name = ProductName::parse(product.name.clone()).ok_or(StockError::InvalidName)?;
        if self.products.contains_key(&name) {
            return Err(StockError::DuplicateProduct {
                name: product.name.clone(),
            });
        }

        Ok(vec![StockEvent::ProductAdded(ProductAdded {
            name,
            quantity: product.quantity,
            unit_price: product.unit_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateQuantity) -> StockResult<Vec<StockEvent>> {
        let record = self.record(&cmd.name)?;
        let invalid = || StockError::InvalidQuantityUpdate {
            name: cmd.name.clone(),
            delta: cmd.delta,
        };

        if cmd.delta == 0 {
            return Err(invalid());
        }
        let new_quantity = record.quantity.checked_add(cmd.delta).ok_or_else(invalid)?;

        let event = match new_quantity {
            q if q < 0 => return Err(invalid()),
            0 => StockEvent::ProductDepleted(ProductDepleted {
                name: record.name.clone(),
                delta: cmd.delta,
                occurred_at: cmd.occurred_at,
            }),
            _ => StockEvent::QuantityAdjusted(QuantityAdjusted {
                name: record.name.clone(),
                delta: cmd.delta,
                new_quantity,
                occurred_at: cmd.occurred_at,
            }),
        };
        Ok(vec![event])
    }

    fn handle_remove(&self, cmd: &RemoveProduct) -> StockResult<Vec<StockEvent>> {
        let record = self.record(&cmd.name)?;
        Ok(vec![StockEvent::ProductRemoved(ProductRemoved {
            name: record.name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Execute a command, logging the outcome.
    ///
    /// Either every resulting event is applied or the stock is left untouched.
    pub fn submit(&mut self, command: StockCommand) -> StockResult<Vec<StockEvent>> {
        match self.execute(&command) {
            Ok(events) => {
                for (version, event) in numbered(self.version, &events) {
                    tracing::debug!(
                        event_type = event.event_type(),
                        name = %event.name(),
                        version,
                        "stock event applied"
                    );
                }
                Ok(events)
            }
            Err(err) => {
                tracing::warn!(?command, error = ?err, "stock command rejected");
                Err(err)
            }
        }
    }

    /// Add a new product. Fails if the price or quantity is not positive, the
    /// name is blank, or a product with the same name already exists.
    pub fn add(&mut self, product: NewProduct) -> StockResult<()> {
        self.submit(StockCommand::AddProduct(AddProduct {
            product,
            occurred_at: Utc::now(),
        }))
        .map(|_| ())
    }

    /// Apply a signed quantity delta.
    ///
    /// Reaching exactly zero removes the product; going below zero is rejected
    /// and leaves the product unchanged.
    pub fn update_quantity(&mut self, name: &str, delta: i64) -> StockResult<()> {
        self.submit(StockCommand::UpdateQuantity(UpdateQuantity {
            name: name.to_string(),
            delta,
            occurred_at: Utc::now(),
        }))
        .map(|_| ())
    }

    pub fn remove(&mut self, name: &str) -> StockResult<()> {
        self.submit(StockCommand::RemoveProduct(RemoveProduct {
            name: name.to_string(),
            occurred_at: Utc::now(),
        }))
        .map(|_| ())
    }

    pub fn query(&self, name: &str) -> StockResult<ProductSnapshot> {
        self.record(name).map(ProductRecord::snapshot)
    }

    pub fn list(&self) -> BTreeMap<ProductName, ProductSnapshot> {
        self.products
            .iter()
            .map(|(name, record)| (name.clone(), record.snapshot()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.products.contains_key(name)
    }

    /// Sum of every product's total value (saturating).
    pub fn total_value(&self) -> Money {
        self.products
            .values()
            .fold(Money::ZERO, |acc, record| acc.saturating_add(record.total_value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn product(name: &str, quantity: i64, price: f64) -> NewProduct {
        NewProduct::new(name, quantity, Money::from_major(price))
    }

    fn stock_with(name: &str, quantity: i64, price: f64) -> Stock {
        let mut stock = Stock::new();
        stock.add(product(name, quantity, price)).unwrap();
        stock
    }

    fn update(name: &str, delta: i64) -> StockCommand {
        StockCommand::UpdateQuantity(UpdateQuantity {
            name: name.to_string(),
            delta,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn add_product_emits_product_added_event() {
        let stock = Stock::new();
        let occurred_at = test_time();
        let cmd = StockCommand::AddProduct(AddProduct {
            product: product("Teclado", 10, 100.00),
            occurred_at,
        });

        let events = stock.handle(&cmd).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            StockEvent::ProductAdded(e) => {
                assert_eq!(e.name.as_str(), "Teclado");
                assert_eq!(e.quantity, 10);
                assert_eq!(e.unit_price, Money::from_cents(10_000));
                assert_eq!(e.occurred_at, occurred_at);
            }
            other => panic!("Expected ProductAdded event, got {other:?}"),
        }
        assert_eq!(events[0].event_type(), "stock.product.added");
        // handle() alone never mutates.
        assert!(stock.is_empty());
        assert_eq!(stock.version(), 0);
    }

    #[test]
    fn add_validates_price_then_quantity_then_name_then_duplicate() {
        let mut stock = stock_with("Notebook", 5, 2000.00);

        assert_eq!(stock.add(product("", 0, -1.0)), Err(StockError::InvalidPrice));
        assert_eq!(stock.add(product("", 0, 0.0)), Err(StockError::InvalidPrice));
        assert_eq!(stock.add(product("", 0, 10.0)), Err(StockError::InvalidQuantity));
        assert_eq!(stock.add(product("  ", 1, 10.0)), Err(StockError::InvalidName));
        assert_eq!(
            stock.add(product("Notebook", 10, 2200.00)),
            Err(StockError::DuplicateProduct { name: "Notebook".into() })
        );
        assert_eq!(stock.len(), 1);
        assert_eq!(stock.query("Notebook").unwrap().quantity, 5);
    }

    #[test]
    fn update_increments_quantity_in_place() {
        let mut stock = stock_with("Mouse", 5, 50.00);
        stock.update_quantity("Mouse", 10).unwrap();

        let snapshot = stock.query("Mouse").unwrap();
        assert_eq!(snapshot.quantity, 15);
        assert_eq!(snapshot.total_value, Money::from_major(750.00));
    }

    #[test]
    fn update_to_exactly_zero_depletes_the_product() {
        let mut stock = stock_with("Smartphone", 10, 1200.00);
        let events = stock.submit(update("Smartphone", -10)).unwrap();

        assert!(matches!(events[0], StockEvent::ProductDepleted(_)));
        assert_eq!(events[0].event_type(), "stock.product.depleted");
        assert!(!stock.contains("Smartphone"));
        assert_eq!(
            stock.query("Smartphone"),
            Err(StockError::not_found("Smartphone"))
        );
    }

    #[test]
    fn update_below_zero_is_rejected_without_change() {
        let mut stock = stock_with("Fone de Ouvido", 3, 150.00);
        let before = stock.clone();

        assert_eq!(
            stock.update_quantity("Fone de Ouvido", -5),
            Err(StockError::InvalidQuantityUpdate {
                name: "Fone de Ouvido".into(),
                delta: -5
            })
        );
        assert_eq!(stock, before);
    }

    #[test]
    fn zero_delta_is_rejected() {
        let mut stock = stock_with("Monitor", 2, 800.00);
        assert!(matches!(
            stock.update_quantity("Monitor", 0),
            Err(StockError::InvalidQuantityUpdate { delta: 0, .. })
        ));
        assert_eq!(stock.version(), 1);
    }

    #[test]
    fn overflowing_delta_is_rejected() {
        let mut stock = stock_with("Parafuso", 2, 0.10);
        assert!(matches!(
            stock.update_quantity("Parafuso", i64::MAX),
            Err(StockError::InvalidQuantityUpdate { .. })
        ));
        assert_eq!(stock.query("Parafuso").unwrap().quantity, 2);
    }

    #[test]
    fn unknown_names_are_not_found() {
        let mut stock = Stock::new();
        assert_eq!(
            stock.update_quantity("Celular", 10),
            Err(StockError::not_found("Celular"))
        );
        assert_eq!(stock.remove("Tablet"), Err(StockError::not_found("Tablet")));
        assert!(matches!(
            stock.query("Teclado Mecânico"),
            Err(StockError::ProductNotFound { .. })
        ));
    }

    #[test]
    fn not_found_takes_precedence_over_zero_delta() {
        let mut stock = Stock::new();
        assert_eq!(
            stock.update_quantity("Celular", 0),
            Err(StockError::not_found("Celular"))
        );
    }

    #[test]
    fn remove_deletes_record_and_emits_event() {
        let mut stock = stock_with("Impressora", 1, 500.00);
        let events = stock
            .submit(StockCommand::RemoveProduct(RemoveProduct {
                name: "Impressora".into(),
                occurred_at: test_time(),
            }))
            .unwrap();

        assert_eq!(events[0].event_type(), "stock.product.removed");
        assert!(stock.is_empty());
        assert_eq!(stock.remove("Impressora"), Err(StockError::not_found("Impressora")));
    }

    #[test]
    fn list_is_ordered_by_name_and_totals_sum() {
        let mut stock = Stock::new();
        stock.add(product("Teclado", 10, 100.00)).unwrap();
        stock.add(product("Cadeira Gamer", 4, 500.00)).unwrap();

        let names: Vec<_> = stock.list().keys().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["Cadeira Gamer", "Teclado"]);
        assert_eq!(stock.total_value(), Money::from_major(3000.00));
    }

    #[test]
    fn version_tracks_applied_events() {
        let mut stock = Stock::new();
        stock.add(product("Mouse", 5, 50.00)).unwrap();
        stock.update_quantity("Mouse", 1).unwrap();
        assert!(matches!(
            stock.update_quantity("Mouse", -100),
            Err(StockError::InvalidQuantityUpdate { delta: -100, .. })
        ));
        stock.remove("Mouse").unwrap();
        assert_eq!(stock.version(), 3);
    }

    #[test]
    fn batch_events_are_numbered_with_their_own_version() {
        let removed = |name: &str| {
            StockEvent::ProductRemoved(ProductRemoved {
                name: ProductName::parse(name).unwrap(),
                occurred_at: test_time(),
            })
        };
        let events = vec![removed("Mouse"), removed("Teclado")];

        let versions: Vec<_> = numbered(7, &events)
            .map(|(version, event)| (version, event.name().to_string()))
            .collect();
        assert_eq!(
            versions,
            vec![(6, "Mouse".to_string()), (7, "Teclado".to_string())]
        );
        assert_eq!(numbered(3, &[]).count(), 0);
    }

    #[test]
    fn events_serialize_with_variant_tag() {
        let mut stock = Stock::new();
        let events = stock
            .submit(StockCommand::AddProduct(AddProduct {
                product: product("Monitor", 2, 800.00),
                occurred_at: test_time(),
            }))
            .unwrap();

        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["ProductAdded"]["name"], "Monitor");
        assert_eq!(json["ProductAdded"]["unit_price"], 80_000);

        let back: StockEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, events[0]);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Update(i64),
        Remove,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (-20i64..20i64).prop_map(Op::Update),
            1 => Just(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every distinct valid product added is listed once, with
        /// total value equal to quantity × unit price.
        #[test]
        fn added_products_are_listed_with_consistent_totals(
            entries in prop::collection::btree_map("[a-z]{1,8}", (1i64..1_000, 1i64..1_000_000), 0..20)
        ) {
            let mut stock = Stock::new();
            for (name, (quantity, cents)) in &entries {
                stock.add(NewProduct::new(name.clone(), *quantity, Money::from_cents(*cents))).unwrap();
            }

            let listed = stock.list();
            prop_assert_eq!(listed.len(), entries.len());
            for (name, (quantity, cents)) in &entries {
                let snapshot = &listed[name.as_str()];
                prop_assert_eq!(snapshot.quantity, *quantity);
                prop_assert_eq!(snapshot.total_value, Money::from_cents(quantity * cents));
            }
        }

        /// Property: a single product tracked through random updates/removals
        /// matches a simple model, and rejected commands change nothing.
        #[test]
        fn updates_match_quantity_model(
            initial in 1i64..50,
            ops in prop::collection::vec(op_strategy(), 1..30)
        ) {
            let mut stock = stock_with("Caneta", initial, 2.50);
            let mut model = Some(initial);

            for op in ops {
                let before = stock.clone();
                let result = match op {
                    Op::Update(delta) => stock.update_quantity("Caneta", delta),
                    Op::Remove => stock.remove("Caneta"),
                };

                match (op, model) {
                    (_, None) => {
                        let missing = matches!(result, Err(StockError::ProductNotFound { .. }));
                        prop_assert!(missing);
                    }
                    (Op::Remove, Some(_)) => {
                        prop_assert!(result.is_ok());
                        model = None;
                    }
                    (Op::Update(delta), Some(q)) if delta == 0 || q + delta < 0 => {
                        let rejected = matches!(result, Err(StockError::InvalidQuantityUpdate { .. }));
                        prop_assert!(rejected);
                    }
                    (Op::Update(delta), Some(q)) => {
                        prop_assert!(result.is_ok());
                        model = Some(q + delta).filter(|q| *q > 0);
                    }
                }

                if result.is_err() {
                    prop_assert_eq!(&stock, &before);
                } else {
                    prop_assert_eq!(stock.version(), before.version() + 1);
                }
                prop_assert_eq!(stock.query("Caneta").ok().map(|s| s.quantity), model);
                prop_assert!(stock.list().values().all(|s| s.quantity > 0));
            }
        }
    }
}
