//! Per-invoke timings and running loop statistics.

use glimmer_core::OpCode;

/// Timings of the most recent successful [`invoke`](crate::MicroInterpreter::invoke).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvokeMetrics {
    /// Wall time of the whole invoke, in microseconds.
    pub total_us: u64,
    /// Per-node wall time in execution order.
    pub node_us: Vec<(OpCode, u64)>,
    /// Successful invokes so far.
    pub invocations: u64,
}

/// Running statistics of a [`ControlLoop`](crate::ControlLoop).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoopMetrics {
    /// Completed iterations.
    pub iterations: u64,
    /// Invoke time of the latest iteration, in microseconds.
    pub last_invoke_us: u64,
    /// Slowest invoke so far, in microseconds.
    pub max_invoke_us: u64,
    /// Sum of `|prediction - reference|` over all iterations.
    pub abs_error_sum: f64,
    /// Largest single `|prediction - reference|`.
    pub max_abs_error: f32,
    /// Diagnostic lines that could not be written.
    pub diagnostic_failures: u64,
}

impl LoopMetrics {
    /// Fold one completed iteration into the totals.
    pub fn record(&mut self, invoke_us: u64, abs_error: f32) {
        self.iterations += 1;
        self.last_invoke_us = invoke_us;
        self.max_invoke_us = self.max_invoke_us.max(invoke_us);
        self.abs_error_sum += f64::from(abs_error);
        self.max_abs_error = self.max_abs_error.max(abs_error);
    }

    /// Mean `|prediction - reference|`, or 0 before the first iteration.
    pub fn mean_abs_error(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.abs_error_sum / self.iterations as f64
        }
    }
}
