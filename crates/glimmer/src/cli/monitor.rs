//! `glimmer monitor`: the plotting companion.
//!
//! A reader thread pulls raw lines from a serial device, a file, or stdin
//! and hands them over a bounded channel. The main thread parses each
//! `Pred:…,True:…` line, keeps a rolling window of absolute errors, and
//! prints `Err:<current>,Mean:<window mean>` per sample. Text around the
//! diagnostic is ignored; lines without one, or with non-finite values,
//! are skipped.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use glimmer_engine::Diagnostic;
use tracing::{debug, info};

/// Default rolling window length.
pub const DEFAULT_WINDOW: usize = 200;

/// Lines buffered between the reader thread and the consumer.
const CHANNEL_CAPACITY: usize = 64;

// ── ErrorWindow ─────────────────────────────────────────────────────

/// The last `capacity` absolute prediction errors.
#[derive(Clone, Debug)]
pub struct ErrorWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl ErrorWindow {
    /// An empty window. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a sample, evicting the oldest once full.
    pub fn push(&mut self, abs_error: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(abs_error);
    }

    /// Mean of the samples held, or 0 when empty.
    pub fn mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// Samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been pushed.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ── Reader thread ───────────────────────────────────────────────────

/// Forward lines from `reader` until EOF or until the consumer hangs up.
///
/// Bytes are decoded lossily; serial links do not guarantee UTF-8.
fn pump(mut reader: impl BufRead, tx: Sender<String>) -> io::Result<u64> {
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(lines);
        }
        lines += 1;
        if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
            return Ok(lines);
        }
    }
}

/// Consume lines from `rx` until the sender side closes, writing one
/// report line per diagnostic.
pub fn watch(rx: &Receiver<String>, window: &mut ErrorWindow, out: &mut impl Write) -> Result<u64> {
    let mut ignored = 0u64;
    for line in rx.iter() {
        match line.parse::<Diagnostic>() {
            Ok(d) => {
                window.push(d.abs_error());
                writeln!(out, "Err:{:.3},Mean:{:.3}", d.abs_error(), window.mean())?;
            }
            Err(e) => {
                ignored += 1;
                debug!(%e, "ignoring line");
            }
        }
    }
    Ok(ignored)
}

/// Read diagnostics from `path` (stdin when `None`) and report error.
pub fn monitor(path: Option<&Path>, window: usize) -> Result<()> {
    let reader: Box<dyn BufRead + Send> = match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("cannot open {}", p.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (tx, rx) = bounded(CHANNEL_CAPACITY);
    let reader = thread::Builder::new()
        .name("glimmer-monitor-reader".into())
        .spawn(move || pump(reader, tx))
        .context("cannot spawn reader thread")?;

    let mut errors = ErrorWindow::new(window);
    let stdout = io::stdout();
    let ignored = watch(&rx, &mut errors, &mut stdout.lock())?;
    let lines = reader
        .join()
        .map_err(|_| anyhow!("reader thread panicked"))?
        .context("read failed")?;

    info!(
        lines,
        ignored,
        window = errors.len(),
        mean_abs_error = errors.mean(),
        "input closed"
    );
    Ok(())
}
