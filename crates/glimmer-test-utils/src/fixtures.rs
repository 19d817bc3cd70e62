//! Reusable kernel, model, and I/O fixtures.
//!
//! - [`FailingKernel`] wraps a real kernel and fails after N evaluations.
//! - [`builtin_resolver`] / [`resolver_with_failing`] build registries.
//! - [`sine_blob`], [`mismatched_version_blob`], [`wide_relu_blob`] are
//!   serialized models for loader and startup tests.
//! - [`FailingWriter`] rejects every write.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use glimmer_core::{ElementType, KernelError, OpCode, OpNode, TensorDef};
use glimmer_model::{sine_model, ModelBuilder, SineEncoding, SCHEMA_VERSION};
use glimmer_ops::{
    Dequantize, FullyConnected, Kernel, KernelContext, OpResolver, Quantize, Relu,
};

/// Delegates to an inner kernel, then fails deterministically after a
/// configurable number of successful evaluations.
///
/// `prepare` always delegates. Uses `AtomicUsize` for the call counter so
/// it satisfies `Send`.
pub struct FailingKernel {
    inner: Box<dyn Kernel>,
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingKernel {
    /// Wrap `inner` so that it succeeds `succeed_count` times then fails.
    pub fn new(inner: Box<dyn Kernel>, succeed_count: usize) -> Self {
        Self {
            inner,
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `eval()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Reset the call counter.
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::Relaxed);
    }
}

impl Kernel for FailingKernel {
    fn opcode(&self) -> OpCode {
        self.inner.opcode()
    }

    fn prepare(&self, ctx: &KernelContext<'_>) -> Result<(), KernelError> {
        self.inner.prepare(ctx)
    }

    fn eval(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(KernelError::ExecutionFailed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        self.inner.eval(ctx)
    }
}

/// The stock kernel for `op`.
pub fn builtin(op: OpCode) -> Box<dyn Kernel> {
    match op {
        OpCode::FullyConnected => Box::new(FullyConnected),
        OpCode::Relu => Box::new(Relu),
        OpCode::Quantize => Box::new(Quantize),
        OpCode::Dequantize => Box::new(Dequantize),
    }
}

/// Resolver with every stock kernel, default capacity.
pub fn builtin_resolver() -> OpResolver {
    let mut resolver = OpResolver::default();
    for op in OpCode::ALL {
        resolver
            .register(builtin(op))
            .expect("default capacity holds every builtin");
    }
    resolver
}

/// Like [`builtin_resolver`], but `failing` is wrapped in a
/// [`FailingKernel`] that succeeds `succeed_count` times.
pub fn resolver_with_failing(failing: OpCode, succeed_count: usize) -> OpResolver {
    let mut resolver = OpResolver::default();
    for op in OpCode::ALL {
        let kernel: Box<dyn Kernel> = if op == failing {
            Box::new(FailingKernel::new(builtin(op), succeed_count))
        } else {
            builtin(op)
        };
        resolver
            .register(kernel)
            .expect("default capacity holds every builtin");
    }
    resolver
}

// ── Model blobs ──────────────────────────────────────────────────

/// Serialized sine model.
pub fn sine_blob(encoding: SineEncoding) -> Vec<u8> {
    sine_model(encoding).to_bytes()
}

/// Float sine model stamped with the schema version before the current one.
pub fn mismatched_version_blob() -> Vec<u8> {
    let mut builder = sine_model(SineEncoding::Float32);
    builder.with_schema_version(SCHEMA_VERSION - 1);
    builder.to_bytes()
}

/// Single float relu over `elements` values: `x -> relu -> y`.
///
/// Needs `2 * 4 * elements` arena bytes plus alignment padding, which
/// makes it handy for exhausting small arenas.
pub fn wide_relu_blob(elements: u32) -> Vec<u8> {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor(TensorDef::activation("x", ElementType::Float32, [elements]));
    let y = b.add_tensor(TensorDef::activation("y", ElementType::Float32, [elements]));
    b.add_node(OpNode::new(OpCode::Relu, [Some(x)], [y]))
        .set_inputs([x])
        .set_outputs([y]);
    b.to_bytes()
}

// ── I/O ──────────────────────────────────────────────────────────

/// [`io::Write`] sink whose every write fails.
#[derive(Clone, Debug, Default)]
pub struct FailingWriter {
    attempts: usize,
}

impl FailingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many writes were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl io::Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.attempts += 1;
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "diagnostic sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
