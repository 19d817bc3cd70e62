//! Start-up and the inference-to-actuator control loop.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──start()──▶ Ready ──step()──▶ Running ──error──▶ Halted
//!   (Startup)                 (ControlLoop)       ▲   │
//!                                                 └───┘ step()
//! ```
//!
//! [`Startup`] is the `Uninitialized` state. Its [`start`](Startup::start)
//! is the only fallible transition that builds anything: config
//! validation, model load (with the schema-version gate), operator
//! registration, arena creation, interpreter allocation, handle lookup,
//! and actuator init, in that order. The first failure aborts start-up
//! with a [`StartupError`].
//!
//! The resulting [`ControlLoop`] owns the interpreter and the board
//! [`Peripherals`]. Each [`step`](ControlLoop::step) samples the clock,
//! runs one inference, writes one diagnostic line, and sets the actuator
//! level. It never sleeps; [`run`](ControlLoop::run) adds the fixed
//! period between iterations. An error during a step halts the loop for
//! good.

use std::io::{self, Write};
use std::time::Duration;

use glimmer_arena::TensorArena;
use glimmer_core::{Actuator, Clock};
use glimmer_model::Model;
use glimmer_ops::{OpResolver, RegistryError};
use tracing::{debug, error, info, trace, warn};

use crate::actuator::brightness;
use crate::adapter;
use crate::config::{ConfigError, LoopConfig};
use crate::diagnostic::Diagnostic;
use crate::error::{LoopError, StartupError};
use crate::interpreter::{MicroInterpreter, TensorHandle};
use crate::metrics::LoopMetrics;
use crate::signal::SignalGenerator;

// ── LoopState ───────────────────────────────────────────────────

/// Where the loop is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Nothing has been built yet.
    Uninitialized,
    /// Start-up succeeded; no iteration has run.
    Ready,
    /// At least one iteration has run and none has failed.
    Running,
    /// An iteration failed. Terminal.
    Halted,
}

// ── Peripherals ─────────────────────────────────────────────────

/// The board as seen by the loop.
#[derive(Clone, Debug, Default)]
pub struct Peripherals<C, A, W> {
    /// Monotonic time since boot.
    pub clock: C,
    /// Output driven by the prediction.
    pub actuator: A,
    /// Sink for diagnostic lines.
    pub diagnostics: W,
}

impl<C, A, W> Peripherals<C, A, W> {
    /// Bundle a clock, an actuator, and a diagnostic sink.
    pub fn new(clock: C, actuator: A, diagnostics: W) -> Self {
        Self {
            clock,
            actuator,
            diagnostics,
        }
    }
}

// ── Iteration / RunReport ───────────────────────────────────────

/// What one [`ControlLoop::step`] computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Iteration {
    /// Zero-based iteration number since start-up.
    pub index: u64,
    /// Clock reading at the start of the iteration.
    pub elapsed: Duration,
    /// Model input in `[0, 2π)`.
    pub phase: f32,
    /// Model output.
    pub prediction: f32,
    /// `sin(phase)`.
    pub reference: f32,
    /// Level sent to the actuator.
    pub brightness: u8,
}

impl Iteration {
    /// The diagnostic line for this iteration.
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            prediction: self.prediction,
            reference: self.reference,
        }
    }
}

/// Summary returned by [`ControlLoop::run`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunReport {
    /// Iterations completed by this call.
    pub iterations: u64,
    /// Clock time spent in this call, sleeps included.
    pub elapsed: Duration,
    /// Mean absolute prediction error since start-up.
    pub mean_abs_error: f64,
    /// Largest absolute prediction error since start-up.
    pub max_abs_error: f32,
}

// ── Startup ─────────────────────────────────────────────────────

/// The `Uninitialized` state: a validated-on-start configuration.
#[derive(Clone, Debug, Default)]
pub struct Startup {
    config: LoopConfig,
}

impl Startup {
    /// Prepare to start with `config`. Nothing is validated yet.
    pub fn new(config: LoopConfig) -> Self {
        Self { config }
    }

    /// Always [`LoopState::Uninitialized`].
    pub fn state(&self) -> LoopState {
        LoopState::Uninitialized
    }

    /// The configuration start-up will use.
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Registry with the four stock operators, bounded by `op_capacity`.
    pub fn resolver(&self) -> Result<OpResolver, RegistryError> {
        let mut resolver = OpResolver::with_capacity(self.config.op_capacity);
        resolver.add_fully_connected()?;
        resolver.add_relu()?;
        resolver.add_quantize()?;
        resolver.add_dequantize()?;
        debug!(
            ops = resolver.len(),
            capacity = resolver.capacity(),
            "operators registered"
        );
        Ok(resolver)
    }

    /// Build everything and return a [`Ready`](LoopState::Ready) loop.
    pub fn start<C, A, W>(
        self,
        blob: &[u8],
        peripherals: Peripherals<C, A, W>,
    ) -> Result<ControlLoop<C, A, W>, StartupError>
    where
        C: Clock,
        A: Actuator,
        W: Write,
    {
        let result = self.validated_model(blob).and_then(|model| {
            let resolver = self.resolver()?;
            self.launch(model, resolver, peripherals)
        });
        log_failure(result)
    }

    /// Like [`start`](Self::start), with a caller-built operator registry.
    pub fn start_with_resolver<C, A, W>(
        self,
        blob: &[u8],
        resolver: OpResolver,
        peripherals: Peripherals<C, A, W>,
    ) -> Result<ControlLoop<C, A, W>, StartupError>
    where
        C: Clock,
        A: Actuator,
        W: Write,
    {
        let result = self
            .validated_model(blob)
            .and_then(|model| self.launch(model, resolver, peripherals));
        log_failure(result)
    }

    fn validated_model(&self, blob: &[u8]) -> Result<Model, StartupError> {
        self.config.validate()?;
        info!(bytes = blob.len(), "loading model");
        Ok(Model::load(blob)?)
    }

    fn launch<C, A, W>(
        &self,
        model: Model,
        resolver: OpResolver,
        mut peripherals: Peripherals<C, A, W>,
    ) -> Result<ControlLoop<C, A, W>, StartupError>
    where
        C: Clock,
        A: Actuator,
        W: Write,
    {
        let schema_version = model.schema_version();
        let arena = TensorArena::new(self.config.arena_config()).map_err(ConfigError::from)?;
        let mut interpreter = MicroInterpreter::new(model, resolver, arena)?;
        interpreter.allocate_tensors()?;
        let input = interpreter.input(self.config.input_index)?;
        let output = interpreter.output(self.config.output_index)?;
        peripherals.actuator.init();
        info!(
            schema_version,
            arena_used = interpreter.arena_used(),
            arena_capacity = interpreter.arena_capacity(),
            period_ms = self.config.period_ms,
            "inference loop ready"
        );
        Ok(ControlLoop {
            signal: SignalGenerator::new(self.config.phase_rate),
            config: self.config.clone(),
            interpreter,
            input,
            output,
            peripherals,
            state: LoopState::Ready,
            metrics: LoopMetrics::default(),
        })
    }
}

fn log_failure<T>(result: Result<T, StartupError>) -> Result<T, StartupError> {
    if let Err(e) = &result {
        error!(error = %e, "start-up failed");
    }
    result
}

// ── ControlLoop ─────────────────────────────────────────────────

/// A started inference loop. See the [module docs](self).
#[derive(Debug)]
pub struct ControlLoop<C, A, W> {
    config: LoopConfig,
    signal: SignalGenerator,
    interpreter: MicroInterpreter,
    input: TensorHandle,
    output: TensorHandle,
    peripherals: Peripherals<C, A, W>,
    state: LoopState,
    metrics: LoopMetrics,
}

impl<C, A, W> ControlLoop<C, A, W>
where
    C: Clock,
    A: Actuator,
    W: Write,
{
    /// Run one iteration without sleeping.
    ///
    /// On error the loop moves to [`LoopState::Halted`]; this and every
    /// later call then fail.
    pub fn step(&mut self) -> Result<Iteration, LoopError> {
        if self.state == LoopState::Halted {
            return Err(LoopError::Halted);
        }
        self.state = LoopState::Running;
        self.iterate().inspect_err(|e| {
            error!(error = %e, iteration = self.metrics.iterations, "control loop halted");
            self.state = LoopState::Halted;
        })
    }

    /// Step, then sleep one period, for as long as `should_continue`
    /// returns true. The predicate sees the number of iterations this call
    /// has completed.
    ///
    /// ```ignore
    /// let report = control.run(|n| n < 500)?;
    /// ```
    pub fn run(
        &mut self,
        mut should_continue: impl FnMut(u64) -> bool,
    ) -> Result<RunReport, LoopError> {
        let period = self.config.period();
        let start = self.peripherals.clock.now();
        let mut completed = 0;
        while should_continue(completed) {
            self.step()?;
            completed += 1;
            self.peripherals.clock.sleep(period);
        }
        Ok(RunReport {
            iterations: completed,
            elapsed: self.peripherals.clock.now().saturating_sub(start),
            mean_abs_error: self.metrics.mean_abs_error(),
            max_abs_error: self.metrics.max_abs_error,
        })
    }

    fn iterate(&mut self) -> Result<Iteration, LoopError> {
        let elapsed = self.peripherals.clock.now();
        let phase = self.signal.phase(elapsed);
        let prediction = self.infer(phase)?;
        let reference = SignalGenerator::reference(phase);
        let diagnostic = Diagnostic {
            prediction,
            reference,
        };
        self.emit(&diagnostic);
        let level = brightness(prediction);
        self.peripherals.actuator.set_level(level);

        let index = self.metrics.iterations;
        self.metrics
            .record(self.interpreter.metrics().total_us, diagnostic.abs_error());
        trace!(index, phase, prediction, reference, level, "iteration");
        Ok(Iteration {
            index,
            elapsed,
            phase,
            prediction,
            reference,
            brightness: level,
        })
    }

    fn infer(&mut self, x: f32) -> Result<f32, LoopError> {
        let mut input = self.interpreter.tensor_mut(self.input)?;
        adapter::write_input(&mut input, x)?;
        self.interpreter.invoke()?;
        let output = self.interpreter.tensor(self.output)?;
        Ok(adapter::read_output(&output)?)
    }

    fn emit(&mut self, diagnostic: &Diagnostic) {
        let sink = &mut self.peripherals.diagnostics;
        let written: io::Result<()> = writeln!(sink, "{diagnostic}").and_then(|()| sink.flush());
        if let Err(e) = written {
            if self.metrics.diagnostic_failures == 0 {
                warn!(error = %e, "diagnostic output failed, continuing without it");
            }
            self.metrics.diagnostic_failures += 1;
        }
    }
}

impl<C, A, W> ControlLoop<C, A, W> {
    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The configuration the loop was started with.
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Running statistics.
    pub fn metrics(&self) -> &LoopMetrics {
        &self.metrics
    }

    /// The interpreter, for inspection.
    pub fn interpreter(&self) -> &MicroInterpreter {
        &self.interpreter
    }

    /// The board.
    pub fn peripherals(&self) -> &Peripherals<C, A, W> {
        &self.peripherals
    }

    /// Mutable access to the board, e.g. to advance a simulated clock.
    pub fn peripherals_mut(&mut self) -> &mut Peripherals<C, A, W> {
        &mut self.peripherals
    }

    /// Stop the loop and hand the board back.
    pub fn into_peripherals(self) -> Peripherals<C, A, W> {
        self.peripherals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_core::OpCode;
    use glimmer_model::{ModelError, SineEncoding};
    use glimmer_test_utils::fixtures::{
        mismatched_version_blob, resolver_with_failing, sine_blob, FailingWriter,
    };
    use glimmer_test_utils::{RecordingActuator, SimClock};

    use crate::error::InterpreterError;

    type Board = Peripherals<SimClock, RecordingActuator, Vec<u8>>;

    fn board() -> Board {
        Peripherals::new(SimClock::new(), RecordingActuator::new(), Vec::new())
    }

    fn started(encoding: SineEncoding) -> ControlLoop<SimClock, RecordingActuator, Vec<u8>> {
        Startup::default().start(&sine_blob(encoding), board()).unwrap()
    }

    #[test]
    fn start_reaches_ready_and_inits_actuator_once() {
        let startup = Startup::default();
        assert_eq!(startup.state(), LoopState::Uninitialized);
        let control = startup
            .start(&sine_blob(SineEncoding::Int8), board())
            .unwrap();
        assert_eq!(control.state(), LoopState::Ready);
        let board = control.into_peripherals();
        assert_eq!(board.actuator.init_calls(), 1);
        assert!(board.actuator.levels().is_empty());
        assert!(board.diagnostics.is_empty());
    }

    #[test]
    fn schema_mismatch_fails_start() {
        let err = Startup::default()
            .start(&mismatched_version_blob(), board())
            .unwrap_err();
        assert!(matches!(
            err,
            StartupError::Model(ModelError::SchemaMismatch {
                found: 2,
                supported: 3
            })
        ));
    }

    #[test]
    fn invalid_config_fails_before_model_load() {
        let config = LoopConfig {
            period_ms: 0,
            ..LoopConfig::default()
        };
        let err = Startup::new(config)
            .start(&mismatched_version_blob(), board())
            .unwrap_err();
        assert!(matches!(err, StartupError::Config(ConfigError::ZeroPeriod)));
    }

    #[test]
    fn small_registry_fails_start() {
        let config = LoopConfig {
            op_capacity: 3,
            ..LoopConfig::default()
        };
        let err = Startup::new(config)
            .start(&sine_blob(SineEncoding::Float32), board())
            .unwrap_err();
        assert!(matches!(
            err,
            StartupError::Registry(RegistryError::CapacityExceeded { capacity: 3 })
        ));
    }

    #[test]
    fn small_arena_fails_start() {
        let config = LoopConfig {
            arena_bytes: 64,
            ..LoopConfig::default()
        };
        let err = Startup::new(config)
            .start(&sine_blob(SineEncoding::Float32), board())
            .unwrap_err();
        assert!(matches!(
            err,
            StartupError::Interpreter(InterpreterError::Allocation { .. })
        ));
    }

    #[test]
    fn missing_output_index_fails_start() {
        let config = LoopConfig {
            output_index: 1,
            ..LoopConfig::default()
        };
        let err = Startup::new(config)
            .start(&sine_blob(SineEncoding::Float32), board())
            .unwrap_err();
        assert!(matches!(
            err,
            StartupError::Interpreter(InterpreterError::NoSuchOutput { index: 1, count: 1 })
        ));
    }

    #[test]
    fn step_writes_line_and_sets_level() {
        let mut control = started(SineEncoding::Float32);
        control
            .peripherals_mut()
            .clock
            .advance(Duration::from_millis(1000));
        let it = control.step().unwrap();
        assert_eq!(control.state(), LoopState::Running);
        assert_eq!(it.index, 0);
        assert!((it.phase - 1.57).abs() < 1e-6);
        assert!((it.prediction - 1.0).abs() < 0.05);
        assert_eq!(it.brightness, brightness(it.prediction));

        let board = control.peripherals();
        assert_eq!(board.actuator.levels(), &[it.brightness]);
        let text = String::from_utf8(board.diagnostics.clone()).unwrap();
        assert_eq!(text, format!("{}\n", it.diagnostic()));
    }

    #[test]
    fn step_does_not_sleep() {
        let mut control = started(SineEncoding::Int8);
        control.step().unwrap();
        control.step().unwrap();
        assert!(control.peripherals().clock.sleeps().is_empty());
        assert_eq!(control.metrics().iterations, 2);
    }

    #[test]
    fn run_sleeps_one_period_per_iteration() {
        let mut control = started(SineEncoding::Int8);
        let report = control.run(|n| n < 10).unwrap();
        assert_eq!(report.iterations, 10);
        assert_eq!(report.elapsed, Duration::from_millis(200));
        let sleeps = control.peripherals().clock.sleeps();
        assert_eq!(sleeps.len(), 10);
        assert!(sleeps.iter().all(|&d| d == Duration::from_millis(20)));
    }

    #[test]
    fn kernel_failure_halts_for_good() {
        let blob = sine_blob(SineEncoding::Int8);
        let mut control = Startup::default()
            .start_with_resolver(&blob, resolver_with_failing(OpCode::Relu, 2), board())
            .unwrap();
        control.step().unwrap();
        control.step().unwrap();
        let err = control.step().unwrap_err();
        assert!(matches!(
            err,
            LoopError::Interpreter(InterpreterError::KernelFailed {
                op: OpCode::Relu,
                ..
            })
        ));
        assert_eq!(control.state(), LoopState::Halted);
        assert_eq!(control.step(), Err(LoopError::Halted));
        assert_eq!(control.run(|_| true), Err(LoopError::Halted));
        assert_eq!(control.peripherals().actuator.levels().len(), 2);
    }

    #[test]
    fn diagnostic_failure_is_counted_not_fatal() {
        let board = Peripherals::new(SimClock::new(), RecordingActuator::new(), FailingWriter::new());
        let mut control = Startup::default()
            .start(&sine_blob(SineEncoding::Float32), board)
            .unwrap();
        let report = control.run(|n| n < 3).unwrap();
        assert_eq!(report.iterations, 3);
        assert_eq!(control.state(), LoopState::Running);
        assert_eq!(control.metrics().diagnostic_failures, 3);
        assert_eq!(control.peripherals().actuator.levels().len(), 3);
    }
}
