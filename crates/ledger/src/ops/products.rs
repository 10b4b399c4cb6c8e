use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{Product, ProductCatalog, ResultLedger, product};

use super::{Engine, with_tx};

impl Engine {
    /// Catalog snapshot for display (retired products excluded).
    pub async fn products(&self) -> ResultLedger<Vec<Product>> {
        with_tx!(self, |db_tx| {
            let catalog = self.load_catalog(&db_tx).await?;
            let mut products: Vec<Product> =
                catalog.iter().filter(|p| !p.retired).cloned().collect();
            products.sort_by(|a, b| a.price.cmp(&b.price));
            Ok(products)
        })
    }

    pub(crate) async fn load_catalog(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultLedger<ProductCatalog> {
        let products = product::Entity::find()
            .all(db_tx)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;
        Ok(ProductCatalog::new(products))
    }
}
