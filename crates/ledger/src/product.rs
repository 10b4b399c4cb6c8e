//! Product catalog reference data.
//!
//! Products are static rows (price, daily yield, cycle length, resale value)
//! owned by nobody; accounts hold *positions* referencing them.

use std::collections::HashMap;

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyMinor};

/// An investment product definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: MoneyMinor,
    pub daily_yield: MoneyMinor,
    pub cycle_days: i64,
    /// What an account gets back (into the withdrawal wallet) when selling a
    /// position on this product. Zero means not resellable.
    pub resale_value: MoneyMinor,
    pub retired: bool,
}

/// In-memory `product id -> Product` lookup handed to the purchase path.
#[derive(Debug, Default)]
pub struct ProductCatalog {
    products: HashMap<Uuid, Product>,
}

impl ProductCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Look up a purchasable product. Retired products stay in the catalog so
    /// existing positions keep their metadata, but cannot be purchased.
    pub fn purchasable(&self, id: Uuid) -> Result<&Product, LedgerError> {
        match self.products.get(&id) {
            Some(product) if !product.retired => Ok(product),
            Some(_) => Err(LedgerError::KeyNotFound(format!("product {id} is retired"))),
            None => Err(LedgerError::KeyNotFound(format!("product {id} not exists"))),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub price_minor: i64,
    pub daily_yield_minor: i64,
    pub cycle_days: i64,
    pub resale_value_minor: i64,
    pub retired: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Product> for ActiveModel {
    fn from(product: &Product) -> Self {
        Self {
            id: ActiveValue::Set(product.id.to_string()),
            name: ActiveValue::Set(product.name.clone()),
            price_minor: ActiveValue::Set(product.price.minor()),
            daily_yield_minor: ActiveValue::Set(product.daily_yield.minor()),
            cycle_days: ActiveValue::Set(product.cycle_days),
            resale_value_minor: ActiveValue::Set(product.resale_value.minor()),
            retired: ActiveValue::Set(product.retired),
        }
    }
}

impl TryFrom<Model> for Product {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::KeyNotFound("product not exists".to_string()))?,
            name: model.name,
            price: MoneyMinor::new(model.price_minor),
            daily_yield: MoneyMinor::new(model.daily_yield_minor),
            cycle_days: model.cycle_days,
            resale_value: MoneyMinor::new(model.resale_value_minor),
            retired: model.retired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(retired: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Wind Plan".to_string(),
            price: MoneyMinor::new(60000),
            daily_yield: MoneyMinor::new(2000),
            cycle_days: 45,
            resale_value: MoneyMinor::new(30000),
            retired,
        }
    }

    #[test]
    fn purchasable_skips_retired() {
        let live = product(false);
        let retired = product(true);
        let catalog = ProductCatalog::new([live.clone(), retired.clone()]);

        assert_eq!(catalog.purchasable(live.id).unwrap().name, "Wind Plan");
        assert!(catalog.purchasable(retired.id).is_err());
        assert!(catalog.purchasable(Uuid::new_v4()).is_err());
        // Retired products are still resolvable for existing positions.
        assert!(catalog.get(retired.id).is_some());
    }
}
