//! Configuration for a play session.

/// Configuration for a play session.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// RNG seed for random events.
    pub seed: u64,
    /// Treat conditions that are neither `item` nor `item:qty` as unmet
    /// instead of satisfied.
    pub strict_conditions: bool,
    /// Roll `[RANDOM_EVENT]` entries after each forward move into a step.
    pub random_events: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            strict_conditions: false,
            random_events: false,
        }
    }
}

impl EngineConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject unrecognized conditions.
    pub fn with_strict_conditions(mut self, strict: bool) -> Self {
        self.strict_conditions = strict;
        self
    }

    /// Enable random events.
    pub fn with_random_events(mut self, enabled: bool) -> Self {
        self.random_events = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.seed, 42);
        assert!(!cfg.strict_conditions);
        assert!(!cfg.random_events);
    }

    #[test]
    fn builder_methods() {
        let cfg = EngineConfig::default()
            .with_seed(7)
            .with_strict_conditions(true)
            .with_random_events(true);
        assert_eq!(cfg.seed, 7);
        assert!(cfg.strict_conditions);
        assert!(cfg.random_events);
    }
}
