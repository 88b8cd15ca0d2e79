use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::observability::metrics::Metrics;
use crate::store::{Catalog, OrderStore};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingReport {
    pub products_counted: usize,
    /// `(category, product_id)` pairs, one per category with sales.
    pub best_sellers: Vec<(String, String)>,
}

/// Recomputes automated best sellers from historical order items.
///
/// Runs are idempotent and convergent: an overlapping, stale run is corrected
/// by the next one.
#[derive(Clone)]
pub struct RankingEngine {
    orders: Arc<OrderStore>,
    catalog: Arc<Catalog>,
    metrics: Metrics,
}

impl RankingEngine {
    pub fn new(orders: Arc<OrderStore>, catalog: Arc<Catalog>, metrics: Metrics) -> Self {
        Self {
            orders,
            catalog,
            metrics,
        }
    }

    pub fn recompute(&self) -> RankingReport {
        let start = Instant::now();

        self.catalog.reset_rankings();

        let mut sales: HashMap<String, u64> = HashMap::new();
        for (product_id, quantity) in self.orders.line_items() {
            *sales.entry(product_id).or_default() += quantity;
        }

        let mut products_counted = 0;
        for (product_id, count) in &sales {
            if self.catalog.set_sales_count(product_id, *count) {
                products_counted += 1;
            } else {
                debug!(product_id = %product_id, "sales recorded for unknown product");
            }
        }

        // Products come back in insertion order, so the first maximum wins ties.
        let mut leaders: Vec<(String, String, u64)> = Vec::new();
        for product in self.catalog.products() {
            match leaders.iter_mut().find(|(category, _, _)| *category == product.category) {
                Some(leader) if product.sales_count > leader.2 => {
                    leader.1 = product.id;
                    leader.2 = product.sales_count;
                }
                Some(_) => {}
                None => leaders.push((product.category, product.id, product.sales_count)),
            }
        }

        let mut best_sellers = Vec::new();
        for (category, product_id, count) in leaders {
            if count > 0 && self.catalog.mark_automated_best_seller(&product_id) {
                best_sellers.push((category, product_id));
            }
        }

        self.metrics
            .ranking_duration_seconds
            .with_label_values(&["success"])
            .observe(start.elapsed().as_secs_f64());

        info!(
            products_counted,
            categories_ranked = best_sellers.len(),
            "automated best sellers updated"
        );

        RankingReport {
            products_counted,
            best_sellers,
        }
    }
}
