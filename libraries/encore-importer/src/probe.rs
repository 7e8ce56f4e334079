//! Duration probing
//!
//! Probing is best effort: a file whose duration cannot be read within
//! the timeout is imported with duration 0 and refined on first playback.

use lofty::{AudioFile, Probe};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Reads the playing time of an encoded file
///
/// Implementations are blocking; the pipeline runs them off the async
/// executor.
pub trait DurationProbe: Send + Sync {
    /// Duration in seconds, or `None` if the data could not be parsed
    fn probe(&self, bytes: &[u8], extension: &str) -> Option<f64>;
}

/// Probe backed by lofty's container parsers
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyProbe;

impl DurationProbe for LoftyProbe {
    fn probe(&self, bytes: &[u8], extension: &str) -> Option<f64> {
        match read_duration(bytes) {
            Ok(seconds) if seconds > 0.0 => Some(seconds),
            Ok(_) => None,
            Err(e) => {
                debug!("lofty could not read .{} data: {}", extension, e);
                None
            }
        }
    }
}

fn read_duration(bytes: &[u8]) -> Result<f64, String> {
    let tagged_file = Probe::new(Cursor::new(bytes))
        .guess_file_type()
        .map_err(|e| format!("Failed to detect format: {}", e))?
        .read()
        .map_err(|e| format!("Failed to read audio properties: {}", e))?;

    Ok(tagged_file.properties().duration().as_secs_f64())
}

/// Run `probe` on the blocking pool, giving up after `timeout`
///
/// Returns 0 on timeout, parse failure or a panicking probe.
pub async fn measure_duration(
    probe: Arc<dyn DurationProbe>,
    bytes: Vec<u8>,
    extension: String,
    timeout: Duration,
) -> f64 {
    let task = tokio::task::spawn_blocking(move || probe.probe(&bytes, &extension));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Some(seconds))) => seconds,
        Ok(Ok(None)) => 0.0,
        Ok(Err(e)) => {
            warn!("Duration probe failed: {}", e);
            0.0
        }
        Err(_) => {
            warn!("Duration probe timed out after {:?}", timeout);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<f64>);

    impl DurationProbe for Fixed {
        fn probe(&self, _bytes: &[u8], _extension: &str) -> Option<f64> {
            self.0
        }
    }

    struct Sleepy;

    impl DurationProbe for Sleepy {
        fn probe(&self, _bytes: &[u8], _extension: &str) -> Option<f64> {
            std::thread::sleep(Duration::from_millis(300));
            Some(99.0)
        }
    }

    struct Panicky;

    impl DurationProbe for Panicky {
        fn probe(&self, _bytes: &[u8], _extension: &str) -> Option<f64> {
            panic!("corrupt frame header");
        }
    }

    #[test]
    fn lofty_rejects_garbage() {
        assert_eq!(LoftyProbe.probe(b"definitely not audio", "mp3"), None);
        assert_eq!(LoftyProbe.probe(&[], "flac"), None);
    }

    #[tokio::test]
    async fn reported_duration_is_used() {
        let secs = measure_duration(
            Arc::new(Fixed(Some(212.5))),
            vec![1, 2, 3],
            "mp3".into(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(secs, 212.5);
    }

    #[tokio::test]
    async fn unreadable_defaults_to_zero() {
        let secs =
            measure_duration(Arc::new(Fixed(None)), vec![], "ogg".into(), Duration::from_secs(1))
                .await;
        assert_eq!(secs, 0.0);
    }

    #[tokio::test]
    async fn slow_probe_times_out_to_zero() {
        let secs = measure_duration(
            Arc::new(Sleepy),
            vec![],
            "wav".into(),
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(secs, 0.0);
    }

    #[tokio::test]
    async fn panicking_probe_defaults_to_zero() {
        let secs =
            measure_duration(Arc::new(Panicky), vec![], "m4a".into(), Duration::from_secs(1))
                .await;
        assert_eq!(secs, 0.0);
    }
}
