use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer of the progress broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Emitted after each chunk the service has confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub file_name: String,
    pub total_bytes: u64,
    /// 0-based index of the confirmed chunk.
    pub chunk_index: u64,
    /// Offset at which the confirmed chunk started.
    pub offset: u64,
    pub bytes_uploaded: u64,
    pub chunk_size: u64,
}

impl UploadProgress {
    /// Completion in the range `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.bytes_uploaded as f64 / self.total_bytes as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// ProgressChannel
// ---------------------------------------------------------------------------

/// Fan-out of progress events to any number of observers.
///
/// Sending never blocks; a slow receiver sees `RecvError::Lagged` instead of
/// holding up the upload.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: broadcast::Sender<UploadProgress>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadProgress> {
        self.tx.subscribe()
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn emit(&self, progress: UploadProgress) {
        tracing::trace!(
            file = %progress.file_name,
            chunk = progress.chunk_index,
            uploaded = progress.bytes_uploaded,
            total = progress.total_bytes,
            "upload progress"
        );
        let _ = self.tx.send(progress);
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SpeedCalculator
// ---------------------------------------------------------------------------

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
const DEFAULT_MAX_SAMPLES: usize = 100;

/// Upload rate over a sliding time window, fed from progress events.
///
/// Shared between threads; a front end typically calls
/// [`add_sample`](Self::add_sample) with each confirmed chunk size.
pub struct SpeedCalculator {
    window: Duration,
    max_samples: usize,
    samples: Mutex<VecDeque<(Instant, u64)>>,
}

impl SpeedCalculator {
    /// `window` defaults to 5 s and `max_samples` to 100.
    pub fn new(window: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            window: window.unwrap_or(DEFAULT_WINDOW),
            max_samples: max_samples.unwrap_or(DEFAULT_MAX_SAMPLES).max(2),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    fn samples(&self) -> MutexGuard<'_, VecDeque<(Instant, u64)>> {
        self.samples.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_sample(&self, bytes: u64) {
        self.add_sample_at(Instant::now(), bytes);
    }

    fn add_sample_at(&self, at: Instant, bytes: u64) {
        let mut samples = self.samples();
        samples.push_back((at, bytes));
        while samples
            .front()
            .is_some_and(|(t, _)| at.saturating_duration_since(*t) > self.window)
        {
            samples.pop_front();
        }
        while samples.len() > self.max_samples {
            samples.pop_front();
        }
    }

    /// Bytes per second between the oldest and newest sample in the window.
    /// The oldest sample only marks the start time. Zero until two samples
    /// with distinct timestamps exist.
    pub fn bytes_per_second(&self) -> f64 {
        let samples = self.samples();
        let (Some((first, _)), Some((last, _))) = (samples.front(), samples.back()) else {
            return 0.0;
        };
        let elapsed = last.saturating_duration_since(*first);
        if elapsed.is_zero() {
            return 0.0;
        }
        let sent: u64 = samples.iter().skip(1).map(|(_, bytes)| bytes).sum();
        sent as f64 / elapsed.as_secs_f64()
    }

    /// Time left for `remaining_bytes` at the current rate.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let rate = self.bytes_per_second();
        (rate > 0.0).then(|| Duration::from_secs_f64(remaining_bytes as f64 / rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn event(chunk_index: u64, offset: u64, chunk_size: u64) -> UploadProgress {
        UploadProgress {
            file_name: "clip.mp4".into(),
            total_bytes: 300,
            chunk_index,
            offset,
            bytes_uploaded: offset + chunk_size,
            chunk_size,
        }
    }

    #[tokio::test]
    async fn every_subscriber_sees_events() {
        let channel = ProgressChannel::new();
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();
        assert_eq!(channel.receiver_count(), 2);

        channel.emit(event(0, 0, 100));
        channel.emit(event(1, 100, 100));

        assert_eq!(a.recv().await.unwrap().chunk_index, 0);
        assert_eq!(a.recv().await.unwrap().offset, 100);
        assert_eq!(b.recv().await.unwrap().chunk_index, 0);
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let channel = ProgressChannel::with_capacity(1);
        channel.emit(event(0, 0, 100));
        channel.emit(event(1, 100, 100));
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let channel = ProgressChannel::with_capacity(2);
        let mut rx = channel.subscribe();
        for i in 0..5 {
            channel.emit(event(i, i * 10, 10));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }

    #[test]
    fn percent_complete() {
        assert_eq!(event(2, 200, 100).percent(), 100.0);
        let mut e = event(0, 0, 150);
        e.total_bytes = 0;
        assert_eq!(e.percent(), 0.0);
    }

    #[test]
    fn camel_case_json() {
        let json = serde_json::to_value(event(0, 0, 100)).unwrap();
        assert_eq!(json["bytesUploaded"], 100);
        assert_eq!(json["chunkIndex"], 0);
        assert_eq!(json["fileName"], "clip.mp4");
    }

    #[test]
    fn rate_needs_two_samples() {
        let speed = SpeedCalculator::new(None, None);
        assert_eq!(speed.bytes_per_second(), 0.0);
        assert!(speed.eta(1024).is_none());

        speed.add_sample(4096);
        assert_eq!(speed.bytes_per_second(), 0.0);
    }

    #[test]
    fn rate_counts_bytes_after_first_sample() {
        let speed = SpeedCalculator::new(None, None);
        let t0 = Instant::now();
        speed.add_sample_at(t0, 1000);
        speed.add_sample_at(t0 + Duration::from_secs(1), 500);
        speed.add_sample_at(t0 + Duration::from_secs(2), 1500);

        assert_eq!(speed.bytes_per_second(), 1000.0);
        assert_eq!(speed.eta(3000), Some(Duration::from_secs(3)));
    }

    #[test]
    fn old_samples_leave_the_window() {
        let speed = SpeedCalculator::new(Some(Duration::from_secs(2)), None);
        let t0 = Instant::now();
        speed.add_sample_at(t0, 0);
        speed.add_sample_at(t0 + Duration::from_secs(1), 100_000);
        speed.add_sample_at(t0 + Duration::from_secs(10), 0);
        speed.add_sample_at(t0 + Duration::from_secs(11), 10);

        assert_eq!(speed.samples().len(), 2);
        assert_eq!(speed.bytes_per_second(), 10.0);
    }

    #[test]
    fn sample_count_is_capped() {
        let speed = SpeedCalculator::new(Some(Duration::from_secs(600)), Some(4));
        let t0 = Instant::now();
        for i in 0..10 {
            speed.add_sample_at(t0 + Duration::from_secs(i), 64);
        }
        assert_eq!(speed.samples().len(), 4);
        assert_eq!(speed.bytes_per_second(), 64.0);
    }

    #[test]
    fn shared_across_threads() {
        let speed = Arc::new(SpeedCalculator::new(None, None));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let speed = Arc::clone(&speed);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        speed.add_sample(512);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert!(speed.samples().len() <= DEFAULT_MAX_SAMPLES);
    }
}
