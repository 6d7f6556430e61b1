#![forbid(unsafe_code)]

//! Stack configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! | Variable                  | Field           | Default       |
//! |---------------------------|-----------------|---------------|
//! | `AUTOSTACK_CONTAINER`     | `container`     | `"container"` |
//! | `AUTOSTACK_SETTLE_BUDGET` | `settle_budget` | `64`          |
//!
//! Unparsable values fall back to the default.

use autostack_core::ObserveOptions;

/// Name of the attachment point a stack mounts into by default.
pub const DEFAULT_CONTAINER: &str = "container";

/// Default number of steps a host may take to reach a fixed point.
pub const DEFAULT_SETTLE_BUDGET: usize = 64;

/// Configuration for mounting and driving a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// Name of the host container to mount into.
    pub container: String,
    /// Mutation observation options for every box.
    pub observe: ObserveOptions,
    /// Upper bound on steps spent settling after a change.
    pub settle_budget: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_owned(),
            observe: ObserveOptions::default(),
            settle_budget: DEFAULT_SETTLE_BUDGET,
        }
    }
}

impl StackConfig {
    /// Read overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(container) = lookup("AUTOSTACK_CONTAINER")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
        {
            config.container = container;
        }
        if let Some(budget) = lookup("AUTOSTACK_SETTLE_BUDGET")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|b| *b > 0)
        {
            config.settle_budget = budget;
        }
        config
    }

    /// Set the container name.
    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    /// Set the observation options.
    #[must_use]
    pub fn with_observe(mut self, observe: ObserveOptions) -> Self {
        self.observe = observe;
        self
    }

    /// Set the settle budget.
    #[must_use]
    pub fn with_settle_budget(mut self, budget: usize) -> Self {
        self.settle_budget = budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = StackConfig::default();
        assert_eq!(config.container, "container");
        assert_eq!(config.settle_budget, 64);
        assert_eq!(config.observe, ObserveOptions::default());
    }

    #[test]
    fn lookup_overrides() {
        let config = StackConfig::from_lookup(lookup(&[
            ("AUTOSTACK_CONTAINER", " app-root "),
            ("AUTOSTACK_SETTLE_BUDGET", "12"),
        ]));
        assert_eq!(config.container, "app-root");
        assert_eq!(config.settle_budget, 12);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = StackConfig::from_lookup(lookup(&[
            ("AUTOSTACK_CONTAINER", "   "),
            ("AUTOSTACK_SETTLE_BUDGET", "lots"),
        ]));
        assert_eq!(config, StackConfig::default());

        let zero = StackConfig::from_lookup(lookup(&[("AUTOSTACK_SETTLE_BUDGET", "0")]));
        assert_eq!(zero.settle_budget, DEFAULT_SETTLE_BUDGET);
    }

    #[test]
    fn builders_chain() {
        let config = StackConfig::default()
            .with_container("main")
            .with_settle_budget(5)
            .with_observe(ObserveOptions::default().with_subtree(false));
        assert_eq!(config.container, "main");
        assert_eq!(config.settle_budget, 5);
        assert!(!config.observe.subtree);
    }
}
