use serde::{Deserialize, Serialize};

/// Ranking view of a catalog product. Menu details live in the external catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub sales_count: u64,
    pub is_automated_best_seller: bool,
    pub is_manual_best_seller: bool,
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl Product {
    pub fn is_best_seller(&self) -> bool {
        self.is_manual_best_seller || self.is_automated_best_seller
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub is_best_seller: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let is_best_seller = product.is_best_seller();
        Self {
            product,
            is_best_seller,
        }
    }
}
