use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::models::user::CustomerSummary;

/// Result of resolving an order reference.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Order),
    NotFound,
}

/// Outcome of an idempotent insert keyed by the business identifier.
#[derive(Debug, Clone)]
pub enum Insert {
    Created(Order),
    Existing(Order),
}

/// Orders keyed by storage id, with a unique index on the business `order_id`.
#[derive(Default)]
pub struct OrderStore {
    orders: DashMap<Uuid, Order>,
    by_order_id: DashMap<String, Uuid>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Inserts `order` unless its `order_id` is already taken.
    ///
    /// The index entry stays locked until the record is written, so two racing
    /// inserts for the same business key produce exactly one record.
    pub fn insert_if_absent(&self, order: Order) -> Insert {
        match self.by_order_id.entry(order.order_id.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = self.orders.get(entry.get()).map(|order| order.clone());
                match existing {
                    Some(existing) => Insert::Existing(existing),
                    None => {
                        self.orders.insert(order.id, order.clone());
                        entry.insert(order.id);
                        Insert::Created(order)
                    }
                }
            }
            Entry::Vacant(entry) => {
                self.orders.insert(order.id, order.clone());
                entry.insert(order.id);
                Insert::Created(order)
            }
        }
    }

    pub fn find_by_order_id(&self, order_id: &str) -> Option<Order> {
        let id = *self.by_order_id.get(order_id)?;
        self.orders.get(&id).map(|order| order.clone())
    }

    /// Resolves `reference` as a business key first, then as a storage id.
    pub fn find_order(&self, reference: &str) -> Lookup {
        if let Some(order) = self.find_by_order_id(reference) {
            return Lookup::Found(order);
        }

        Uuid::parse_str(reference)
            .ok()
            .and_then(|id| self.orders.get(&id).map(|order| order.clone()))
            .map_or(Lookup::NotFound, Lookup::Found)
    }

    /// Applies `mutate` to the stored record atomically and returns its result.
    ///
    /// `updated_at` is refreshed only when the closure succeeds.
    pub fn update<T, F>(&self, id: Uuid, mutate: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Order) -> Result<T, AppError>,
    {
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::order_not_found(&id.to_string()))?;

        let mut draft = order.clone();
        let result = mutate(&mut draft)?;
        draft.updated_at = chrono::Utc::now();
        *order = draft;
        Ok(result)
    }

    /// All orders, newest first, optionally restricted to one customer email.
    pub fn list(&self, email: Option<&str>) -> Vec<Order> {
        let email = email.map(|email| email.trim().to_lowercase());
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| {
                email
                    .as_deref()
                    .is_none_or(|email| entry.value().user.email == email)
            })
            .map(|entry| entry.value().clone())
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Order count, spend and latest order per customer email, most recent
    /// customer first. Profile fields are left for the caller to fill in.
    pub fn customer_summaries(&self) -> Vec<CustomerSummary> {
        let mut by_email: HashMap<String, CustomerSummary> = HashMap::new();
        for entry in self.orders.iter() {
            let order = entry.value();
            by_email
                .entry(order.user.email.clone())
                .and_modify(|summary| summary.record(order))
                .or_insert_with(|| CustomerSummary::first(order));
        }

        let mut summaries: Vec<CustomerSummary> = by_email.into_values().collect();
        summaries.sort_by(|a, b| b.last_order.cmp(&a.last_order));
        summaries
    }

    /// Whether `rider_id` carries an out-for-delivery order other than `except`.
    pub fn rider_has_active_delivery(&self, rider_id: Uuid, except: Uuid) -> bool {
        self.orders.iter().any(|entry| {
            let order = entry.value();
            order.id != except
                && order.assigned_rider == Some(rider_id)
                && order.status == OrderStatus::OutForDelivery
        })
    }

    /// `(product_id, quantity)` for every line item of every stored order.
    pub fn line_items(&self) -> Vec<(String, u64)> {
        self.orders
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .items
                    .iter()
                    .map(|item| (item.product_id.clone(), u64::from(item.quantity)))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
