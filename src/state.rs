// Shared, read-only state handed to every HTTP handler.
use std::sync::Arc;

use crate::config::FeederCommand;
use crate::metrics::Metrics;
use crate::mqtt::Publisher;

pub struct SkillState {
    pub publisher: Arc<dyn Publisher>,
    pub feeder: FeederCommand,
    pub metrics: Metrics,
}

pub type SharedState = Arc<SkillState>;
