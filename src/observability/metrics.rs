use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounterVec,
    pub status_transitions_total: IntCounterVec,
    pub background_tasks_total: IntCounterVec,
    pub tasks_in_queue: IntGauge,
    pub ranking_duration_seconds: HistogramVec,
    pub webhook_events_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total = IntCounterVec::new(
            Opts::new("orders_created_total", "Order creation requests by outcome"),
            &["outcome"],
        )
        .expect("valid orders_created_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions by target status"),
            &["status"],
        )
        .expect("valid order_status_transitions_total metric");

        let background_tasks_total = IntCounterVec::new(
            Opts::new("background_tasks_total", "Background tasks by kind and outcome"),
            &["kind", "outcome"],
        )
        .expect("valid background_tasks_total metric");

        let tasks_in_queue = IntGauge::new("tasks_in_queue", "Current number of queued background tasks")
            .expect("valid tasks_in_queue metric");

        let ranking_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "ranking_duration_seconds",
                "Duration of best-seller recomputation in seconds",
            ),
            &["outcome"],
        )
        .expect("valid ranking_duration_seconds metric");

        let webhook_events_total = IntCounterVec::new(
            Opts::new("payment_webhook_events_total", "Payment webhook deliveries by outcome"),
            &["outcome"],
        )
        .expect("valid payment_webhook_events_total metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register order_status_transitions_total");
        registry
            .register(Box::new(background_tasks_total.clone()))
            .expect("register background_tasks_total");
        registry
            .register(Box::new(tasks_in_queue.clone()))
            .expect("register tasks_in_queue");
        registry
            .register(Box::new(ranking_duration_seconds.clone()))
            .expect("register ranking_duration_seconds");
        registry
            .register(Box::new(webhook_events_total.clone()))
            .expect("register payment_webhook_events_total");

        Self {
            registry,
            orders_created_total,
            status_transitions_total,
            background_tasks_total,
            tasks_in_queue,
            ranking_duration_seconds,
            webhook_events_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
