//! Instance configuration

use boa_engine::vm::RuntimeLimits;

/// Runtime limits applied to every new instance
///
/// Exceeding a limit throws a `RangeError` into the running script, which
/// surfaces as an exception result. The loop limit doubles as an
/// evaluation budget for untrusted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum iterations of any single loop
    pub loop_iteration_limit: u64,
    /// Maximum call depth
    pub recursion_limit: usize,
    /// Maximum interpreter stack slots
    pub stack_size_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            loop_iteration_limit: u64::MAX,
            recursion_limit: 512,
            stack_size_limit: 1024,
        }
    }
}

impl EngineOptions {
    pub fn with_loop_iteration_limit(mut self, limit: u64) -> Self {
        self.loop_iteration_limit = limit;
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_stack_size_limit(mut self, limit: usize) -> Self {
        self.stack_size_limit = limit;
        self
    }

    pub(crate) fn apply(&self, limits: &mut RuntimeLimits) {
        limits.set_loop_iteration_limit(self.loop_iteration_limit);
        limits.set_recursion_limit(self.recursion_limit);
        limits.set_stack_size_limit(self.stack_size_limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = EngineOptions::default()
            .with_loop_iteration_limit(10)
            .with_recursion_limit(32);
        assert_eq!(options.loop_iteration_limit, 10);
        assert_eq!(options.recursion_limit, 32);
        assert_eq!(options.stack_size_limit, EngineOptions::default().stack_size_limit);
    }

    #[test]
    fn test_apply() {
        let mut limits = RuntimeLimits::default();
        EngineOptions::default().with_loop_iteration_limit(99).apply(&mut limits);
        assert_eq!(limits.loop_iteration_limit(), 99);
    }
}
