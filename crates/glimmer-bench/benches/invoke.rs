//! Criterion benchmarks for one inference and one control-loop iteration.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use glimmer_bench::{sine_interpreter, sine_loop, sweep};
use glimmer_engine::adapter::{read_output, write_input};
use glimmer_model::SineEncoding;

fn bench_invoke(c: &mut Criterion) {
    for encoding in [SineEncoding::Int8, SineEncoding::Float32] {
        let mut interp = sine_interpreter(encoding);
        let input = interp.input(0).unwrap();
        let output = interp.output(0).unwrap();
        let phases = sweep();
        let mut i = 0;

        c.bench_function(&format!("invoke_{}", encoding.name()), |b| {
            b.iter(|| {
                let x = phases[i % phases.len()];
                i += 1;
                write_input(&mut interp.tensor_mut(input).unwrap(), x).unwrap();
                interp.invoke().unwrap();
                black_box(read_output(&interp.tensor(output).unwrap()).unwrap());
            });
        });
    }
}

fn bench_step(c: &mut Criterion) {
    for encoding in [SineEncoding::Int8, SineEncoding::Float32] {
        let mut control = sine_loop(encoding);
        c.bench_function(&format!("step_{}", encoding.name()), |b| {
            b.iter(|| {
                let it = control.step().unwrap();
                control
                    .peripherals_mut()
                    .clock
                    .advance(std::time::Duration::from_millis(20));
                black_box(it);
            });
        });
    }
}

criterion_group!(benches, bench_invoke, bench_step);
criterion_main!(benches);
