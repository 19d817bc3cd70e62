//! Reference models compiled into the binary.
//!
//! Generated by the build script from
//! [`sine_model`](glimmer_model::sine_model), so they always match the
//! current [`SCHEMA_VERSION`](glimmer_model::SCHEMA_VERSION).

use glimmer_model::SineEncoding;

/// Int8 sine model: quantized input and output, all four operators.
pub static SINE_INT8: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/sine_int8.glm"));

/// Float32 sine model.
pub static SINE_F32: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/sine_f32.glm"));

/// The compiled-in blob for `encoding`.
pub fn builtin(encoding: SineEncoding) -> &'static [u8] {
    match encoding {
        SineEncoding::Int8 => SINE_INT8,
        SineEncoding::Float32 => SINE_F32,
    }
}
