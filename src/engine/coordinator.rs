//! Order lifecycle and rider coupling.
//!
//! [`DispatchCoordinator`] is the only writer that changes order status and
//! rider availability together. A rider is `Busy` exactly while assigned to an
//! order that is `OutForDelivery`; every transition below keeps that true.
//!
//! Each operation completes its primary write first. Rider updates, promo
//! redemption, ranking and push notifications follow as isolated side effects:
//! their failures are logged and never undo or fail the primary write.

use std::sync::Arc;

use chrono::{FixedOffset, Offset, TimeDelta, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::lifecycle::check_transition;
use crate::engine::queue::{BackgroundTask, TaskQueue};
use crate::error::AppError;
use crate::events::{Event, EventBus, Topic};
use crate::models::order::{NewOrder, Order, OrderStatus, Ping};
use crate::models::rider::RiderStatus;
use crate::notify::PushPayload;
use crate::observability::metrics::Metrics;
use crate::store::{Catalog, Insert, Lookup, OrderStore, RiderRegistry};

const DEFAULT_DELIVERED_BY: &str = "Admin";

/// Where an order creation request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOrigin {
    Storefront,
    /// Replayed from a verified payment webhook; payment is already captured,
    /// so business hours are not enforced.
    PaymentWebhook,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub order: Order,
    pub created: bool,
}

#[derive(Clone)]
pub struct DispatchCoordinator {
    orders: Arc<OrderStore>,
    riders: Arc<RiderRegistry>,
    catalog: Arc<Catalog>,
    events: EventBus,
    tasks: TaskQueue,
    metrics: Metrics,
    ping_cooldown: TimeDelta,
    store_offset: FixedOffset,
    notification_icon: String,
    order_tracking_url: String,
}

impl DispatchCoordinator {
    pub fn new(
        orders: Arc<OrderStore>,
        riders: Arc<RiderRegistry>,
        catalog: Arc<Catalog>,
        events: EventBus,
        tasks: TaskQueue,
        metrics: Metrics,
        config: &Config,
    ) -> Self {
        let ping_cooldown =
            TimeDelta::from_std(config.ping_cooldown).unwrap_or_else(|_| TimeDelta::minutes(3));
        let store_offset = FixedOffset::east_opt(config.store_utc_offset_minutes * 60)
            .unwrap_or_else(|| {
                warn!(
                    offset_minutes = config.store_utc_offset_minutes,
                    "store utc offset out of range; using UTC"
                );
                Utc.fix()
            });

        Self {
            orders,
            riders,
            catalog,
            events,
            tasks,
            metrics,
            ping_cooldown,
            store_offset,
            notification_icon: config.notification_icon.clone(),
            order_tracking_url: config.order_tracking_url.clone(),
        }
    }

    pub fn create_order(
        &self,
        new_order: NewOrder,
        origin: OrderOrigin,
    ) -> Result<CreateOutcome, AppError> {
        let now = Utc::now();

        if origin == OrderOrigin::Storefront {
            let local_time = now.with_timezone(&self.store_offset).time();
            if !self.catalog.settings().accepts_orders_at(local_time) {
                self.metrics
                    .orders_created_total
                    .with_label_values(&["store_closed"])
                    .inc();
                info!(order_id = %new_order.order_id, "order rejected: store closed");
                return Err(AppError::StoreClosed);
            }
        }

        new_order.validate().map_err(AppError::Validation)?;

        let order = match self.orders.insert_if_absent(new_order.into_order(now)) {
            Insert::Existing(existing) => {
                self.metrics
                    .orders_created_total
                    .with_label_values(&["duplicate"])
                    .inc();
                info!(order_id = %existing.order_id, ?origin, "order already exists; returning existing");
                return Ok(CreateOutcome {
                    order: existing,
                    created: false,
                });
            }
            Insert::Created(order) => order,
        };

        self.metrics
            .orders_created_total
            .with_label_values(&["created"])
            .inc();
        info!(order_id = %order.order_id, id = %order.id, ?origin, "order created");

        self.catalog.upsert_user(&order.user, now);
        self.tasks.dispatch(BackgroundTask::RecomputeBestSellers);

        if order.status != OrderStatus::PendingPayment {
            self.events.publish_global(Event::NewOrder(order.clone()));
        }

        if let Some(code) = &order.promo_code {
            match self.catalog.redeem_promo(code) {
                Ok(promo) => {
                    debug!(code = %promo.code, used_count = promo.used_count, "promo code redeemed");
                    self.events.publish_global(Event::PromoUpdated(promo));
                }
                Err(err) => {
                    warn!(order_id = %order.order_id, code = %code, error = %err, "failed to increment promo usage");
                }
            }
        }

        Ok(CreateOutcome {
            order,
            created: true,
        })
    }

    /// Moves a `PendingPayment` order to `Pending`. Any other status is left as is.
    pub fn confirm_payment(&self, order_id: &str) -> Result<Order, AppError> {
        let order = self
            .orders
            .find_by_order_id(order_id)
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        let (confirmed, order) = self.orders.update(order.id, |order| {
            if order.status != OrderStatus::PendingPayment {
                return Ok((false, order.clone()));
            }
            order.status = OrderStatus::Pending;
            Ok((true, order.clone()))
        })?;

        if !confirmed {
            debug!(order_id, status = order.status.as_str(), "payment confirmation ignored");
            return Ok(order);
        }

        self.record_transition(OrderStatus::Pending);
        info!(order_id, "payment confirmed; order moved to Pending");

        self.tasks.dispatch(BackgroundTask::RecomputeBestSellers);
        self.events.publish_global(Event::NewOrder(order.clone()));

        Ok(order)
    }

    pub fn update_status(
        &self,
        reference: &str,
        status: OrderStatus,
        source: Option<&str>,
    ) -> Result<Order, AppError> {
        let current = self.resolve(reference)?;
        if current.status == status {
            debug!(order_id = %current.order_id, status = status.as_str(), "status unchanged");
            return Ok(current);
        }

        let source = source
            .map(str::trim)
            .filter(|source| !source.is_empty())
            .unwrap_or(DEFAULT_DELIVERED_BY)
            .to_string();

        let (previous, order) = self.orders.update(current.id, |order| {
            check_transition(order.status, status)?;
            let previous = order.status;
            order.status = status;
            if status == OrderStatus::Delivered {
                order.delivered_at = Some(Utc::now());
                order.delivered_by = Some(source);
            }
            Ok((previous, order.clone()))
        })?;

        self.record_transition(status);
        info!(
            order_id = %order.order_id,
            from = previous.as_str(),
            to = status.as_str(),
            "order status updated"
        );
        self.events.publish_global(Event::OrderUpdated(order.clone()));

        if let Some(rider_id) = order.assigned_rider {
            if status == OrderStatus::OutForDelivery {
                self.occupy_rider(rider_id, &order);
            } else if previous == OrderStatus::OutForDelivery || status.is_terminal() {
                self.release_rider(rider_id, &order);
            }
        }

        self.tasks.dispatch(BackgroundTask::PushNotification {
            recipient: order.user.email.clone(),
            payload: PushPayload::status_change(
                &order,
                status,
                &self.notification_icon,
                &self.order_tracking_url,
            ),
        });

        Ok(order)
    }

    pub fn assign_rider(&self, reference: &str, rider_id: Option<Uuid>) -> Result<Order, AppError> {
        let current = self.resolve(reference)?;

        if let Some(rider_id) = rider_id {
            if !self.riders.contains(rider_id) {
                return Err(AppError::NotFound(format!("rider {rider_id} not found")));
            }
        }

        let (previous, order) = self.orders.update(current.id, |order| {
            if order.status == OrderStatus::Delivered {
                return Err(AppError::InvalidTransition(
                    "cannot change rider on a delivered order".to_string(),
                ));
            }
            let previous = order.assigned_rider;
            order.assigned_rider = rider_id;
            Ok((previous, order.clone()))
        })?;

        info!(
            order_id = %order.order_id,
            previous_rider = ?previous,
            rider = ?rider_id,
            "rider assignment changed"
        );

        if let Some(previous) = previous.filter(|previous| Some(*previous) != rider_id) {
            self.release_rider(previous, &order);
        }

        if let Some(rider_id) = rider_id {
            if order.status == OrderStatus::OutForDelivery && previous != Some(rider_id) {
                self.occupy_rider(rider_id, &order);
            }
        }

        self.events.publish_global(Event::OrderUpdated(order.clone()));
        Ok(order)
    }

    pub fn ping_kitchen(&self, order_id: &str) -> Result<Order, AppError> {
        let current = self.resolve(order_id)?;
        let cooldown = self.ping_cooldown;

        let order = self.orders.update(current.id, |order| {
            let now = Utc::now();
            if let Some(last) = order.last_ping() {
                let elapsed = now.signed_duration_since(last.at);
                if elapsed < cooldown {
                    return Err(AppError::RateLimited {
                        retry_after_secs: retry_after(cooldown - elapsed),
                    });
                }
            }
            order.pings.push(Ping {
                at: now,
                acknowledged: false,
                acknowledged_at: None,
            });
            Ok(order.clone())
        })?;

        info!(order_id = %order.order_id, pings = order.pings.len(), "kitchen pinged");
        self.events.publish_global(Event::AdminOrderPinged {
            order_id: order.order_id.clone(),
            user_email: order.user.email.clone(),
        });

        Ok(order)
    }

    pub fn acknowledge_ping(&self, order_id: &str) -> Result<Order, AppError> {
        let current = self.resolve(order_id)?;

        let (acknowledged, order) = self.orders.update(current.id, |order| {
            let now = Utc::now();
            let mut acknowledged = 0;
            for ping in order.pings.iter_mut().filter(|ping| !ping.acknowledged) {
                ping.acknowledged = true;
                ping.acknowledged_at = Some(now);
                acknowledged += 1;
            }
            Ok((acknowledged, order.clone()))
        })?;

        info!(order_id = %order.order_id, acknowledged, "kitchen pings acknowledged");
        self.events.publish(
            Topic::order(&order.order_id),
            Event::OrderPingAcknowledged(order.clone()),
        );

        Ok(order)
    }

    pub fn find_order(&self, reference: &str) -> Result<Order, AppError> {
        self.resolve(reference)
    }

    fn resolve(&self, reference: &str) -> Result<Order, AppError> {
        match self.orders.find_order(reference) {
            Lookup::Found(order) => Ok(order),
            Lookup::NotFound => Err(AppError::order_not_found(reference)),
        }
    }

    fn record_transition(&self, status: OrderStatus) {
        self.metrics
            .status_transitions_total
            .with_label_values(&[status.as_str()])
            .inc();
    }

    fn occupy_rider(&self, rider_id: Uuid, order: &Order) {
        match self.riders.set_status(rider_id, RiderStatus::Busy) {
            Ok(rider) => {
                info!(rider_id = %rider_id, order_id = %order.order_id, "rider marked busy");
                self.events.publish_global(Event::RiderUpdated(rider));
            }
            Err(err) => {
                warn!(rider_id = %rider_id, order_id = %order.order_id, error = %err, "failed to mark rider busy");
            }
        }
    }

    /// Frees a rider unless they still carry another out-for-delivery order.
    fn release_rider(&self, rider_id: Uuid, order: &Order) {
        if self.orders.rider_has_active_delivery(rider_id, order.id) {
            debug!(rider_id = %rider_id, "rider still delivering another order; keeping busy");
            return;
        }

        match self.riders.release(rider_id) {
            Ok(Some(rider)) => {
                info!(rider_id = %rider_id, order_id = %order.order_id, "rider released");
                self.events.publish_global(Event::RiderUpdated(rider));
            }
            Ok(None) => {
                debug!(rider_id = %rider_id, "rider was not busy; status left unchanged");
            }
            Err(err) => {
                warn!(rider_id = %rider_id, order_id = %order.order_id, error = %err, "failed to release rider");
            }
        }
    }
}

fn retry_after(remaining: TimeDelta) -> u64 {
    let millis = u64::try_from(remaining.num_milliseconds()).unwrap_or(0);
    millis.div_ceil(1000).max(1)
}
