// Prometheus counters exposed on `/metrics`.
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub directives: IntCounterVec,
    pub publishes: IntCounter,
    pub publish_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let directives = IntCounterVec::new(
            Opts::new("directives_total", "Directives received, by namespace and name"),
            &["namespace", "name"],
        )?;
        let publishes = IntCounter::new("mqtt_publishes_total", "Feeder commands acknowledged by the broker")?;
        let publish_failures =
            IntCounter::new("mqtt_publish_failures_total", "Feeder commands that failed or timed out")?;

        registry.register(Box::new(directives.clone()))?;
        registry.register(Box::new(publishes.clone()))?;
        registry.register(Box::new(publish_failures.clone()))?;

        Ok(Metrics {
            registry,
            directives,
            publishes,
            publish_failures,
        })
    }
}
