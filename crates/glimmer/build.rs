//! Serializes the reference sine models into `OUT_DIR` for `include_bytes!`.

use std::env;
use std::fs;
use std::path::PathBuf;

use glimmer_model::{sine_model, SineEncoding};

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("cargo sets OUT_DIR"));
    for encoding in [SineEncoding::Int8, SineEncoding::Float32] {
        let path = out_dir.join(format!("sine_{}.glm", encoding.name()));
        fs::write(&path, sine_model(encoding).to_bytes())
            .unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));
    }
    println!("cargo:rerun-if-changed=build.rs");
}
