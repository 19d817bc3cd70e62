//! The [`Kernel`] trait.

use glimmer_core::{KernelError, OpCode};

use crate::context::KernelContext;

/// The implementation of one operator.
///
/// # Contract
///
/// - `prepare()` runs once per node after tensors are allocated. It
///   checks element types and shapes and must not write outputs.
/// - `eval()` runs once per node per invoke and must be deterministic.
/// - `&self`: kernels are stateless; the resolver shares one instance
///   across every node with the same opcode.
///
/// # Examples
///
/// A kernel that fills its float output with a constant:
///
/// ```
/// use glimmer_core::{KernelError, OpCode};
/// use glimmer_ops::{Kernel, KernelContext};
///
/// struct Fill(f32);
///
/// impl Kernel for Fill {
///     fn opcode(&self) -> OpCode { OpCode::Relu }
///
///     fn eval(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
///         let mut out = ctx.output(0)?;
///         let values = vec![self.0; out.len()];
///         out.store_f32(&values)?;
///         Ok(())
///     }
/// }
///
/// assert_eq!(Fill(1.0).name(), "RELU");
/// ```
pub trait Kernel: Send + 'static {
    /// The operator this kernel implements.
    fn opcode(&self) -> OpCode;

    /// Name for logs and error reports.
    fn name(&self) -> &str {
        self.opcode().name()
    }

    /// Validate a node before the first invoke.
    ///
    /// Default: accept everything.
    fn prepare(&self, ctx: &KernelContext<'_>) -> Result<(), KernelError> {
        let _ = ctx;
        Ok(())
    }

    /// Execute the node.
    fn eval(&self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError>;
}
