use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::engine::coordinator::DispatchCoordinator;
use crate::engine::queue::{BackgroundTask, TaskQueue};
use crate::engine::ranking::RankingEngine;
use crate::events::EventBus;
use crate::notify::{LogDispatcher, NotificationDispatcher};
use crate::observability::metrics::Metrics;
use crate::store::{Catalog, OrderStore, RatingStore, RiderRegistry, SubscriptionStore};

pub struct AppState {
    pub orders: Arc<OrderStore>,
    pub riders: Arc<RiderRegistry>,
    pub catalog: Arc<Catalog>,
    pub ratings: RatingStore,
    pub subscriptions: Arc<SubscriptionStore>,
    pub events: EventBus,
    pub coordinator: DispatchCoordinator,
    pub ranking: RankingEngine,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub webhook_secret: String,
    pub vapid_public_key: String,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> (Self, mpsc::Receiver<BackgroundTask>) {
        let subscriptions = Arc::new(SubscriptionStore::new());
        let notifier = Arc::new(LogDispatcher::new(subscriptions.clone()));
        Self::build(config, subscriptions, notifier)
    }

    pub fn with_notifier(
        config: &Config,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> (Self, mpsc::Receiver<BackgroundTask>) {
        Self::build(config, Arc::new(SubscriptionStore::new()), notifier)
    }

    fn build(
        config: &Config,
        subscriptions: Arc<SubscriptionStore>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> (Self, mpsc::Receiver<BackgroundTask>) {
        let metrics = Metrics::new();
        let orders = Arc::new(OrderStore::new());
        let riders = Arc::new(RiderRegistry::new());
        let catalog = Arc::new(Catalog::new());
        let events = EventBus::new(config.event_buffer_size);
        let (tasks, task_rx) = TaskQueue::new(config.task_queue_size, metrics.clone());

        let coordinator = DispatchCoordinator::new(
            orders.clone(),
            riders.clone(),
            catalog.clone(),
            events.clone(),
            tasks,
            metrics.clone(),
            config,
        );
        let ranking = RankingEngine::new(orders.clone(), catalog.clone(), metrics.clone());

        (
            Self {
                orders,
                riders,
                catalog,
                ratings: RatingStore::new(),
                subscriptions,
                events,
                coordinator,
                ranking,
                notifier,
                webhook_secret: config.payment_webhook_secret.clone(),
                vapid_public_key: config.vapid_public_key.clone(),
                metrics,
            },
            task_rx,
        )
    }
}
