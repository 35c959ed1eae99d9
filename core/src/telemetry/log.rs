use log::{info, warn};

/// Prefixes pipeline log lines with the input being processed.
pub struct LogManager {
    context: String,
}

impl LogManager {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.context, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.context, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("pipeline")
    }
}
