//! Terminal progress for chunked uploads.

use std::collections::HashMap;
use std::time::Duration;

use gphotos_transfer::{SpeedCalculator, UploadProgress};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Prints one line per confirmed chunk until the task is aborted or the
/// channel closes.
pub fn spawn_printer(mut rx: broadcast::Receiver<UploadProgress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut board = ProgressBoard::default();
        loop {
            match rx.recv().await {
                Ok(p) => eprintln!("{}", board.line(&p)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "progress printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Rate and ETA per file, so concurrent uploads do not share one estimate.
#[derive(Default)]
struct ProgressBoard {
    files: HashMap<String, SpeedCalculator>,
}

impl ProgressBoard {
    fn line(&mut self, p: &UploadProgress) -> String {
        let speed = self
            .files
            .entry(p.file_name.clone())
            .or_insert_with(|| SpeedCalculator::new(None, None));
        speed.add_sample(p.chunk_size);

        let remaining = p.total_bytes.saturating_sub(p.bytes_uploaded);
        let line = progress_line(p, speed.bytes_per_second(), speed.eta(remaining));
        if remaining == 0 {
            self.files.remove(&p.file_name);
        }
        line
    }
}

fn progress_line(p: &UploadProgress, bytes_per_second: f64, eta: Option<Duration>) -> String {
    format!(
        "{} {:5.1}% {}/{} {}/s eta {}",
        p.file_name,
        p.percent(),
        human_bytes(p.bytes_uploaded),
        human_bytes(p.total_bytes),
        human_bytes(bytes_per_second as u64),
        format_eta(eta)
    )
}

pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn format_eta(eta: Option<Duration>) -> String {
    let Some(eta) = eta else {
        return "--:--".into();
    };
    let secs = eta.as_secs();
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
