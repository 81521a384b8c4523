//! Training loop configuration

/// Training configuration
#[derive(Clone, Debug, PartialEq)]
pub struct TrainConfig {
    /// Log the loss every N epochs (0 disables)
    pub log_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { log_interval: 25 }
    }
}

impl TrainConfig {
    /// Create a new training configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set logging interval
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    /// Whether `epoch` (zero-based) falls on a logging boundary
    pub fn should_log(&self, epoch: usize) -> bool {
        self.log_interval > 0 && (epoch + 1) % self.log_interval == 0
    }
}
