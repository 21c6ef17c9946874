use super::{OcrConfig, RecognizeError, TextRecognizer};
use image::GrayImage;
use log::warn;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Runs a recognizer as a bounded unit of work.
///
/// With a timeout, each call runs on a worker thread that hands the engine
/// its deadline through [`TextRecognizer::recognize_until`], so engines
/// backed by a process kill it when the deadline passes. The caller gets
/// [`RecognizeError::Timeout`] at the deadline either way; a late result from
/// an in-process engine is dropped. Panics inside the engine are reported as
/// [`RecognizeError::Crashed`].
#[derive(Clone)]
pub struct GuardedRecognizer {
    inner: Arc<dyn TextRecognizer>,
    timeout: Option<Duration>,
}

impl GuardedRecognizer {
    pub fn new(inner: Arc<dyn TextRecognizer>, timeout: Option<Duration>) -> Self {
        Self { inner, timeout }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<String, RecognizeError> {
        let Some(timeout) = self.timeout else {
            return catch_unwind(AssertUnwindSafe(|| self.inner.recognize(image, config)))
                .unwrap_or(Err(RecognizeError::Crashed));
        };

        let deadline = Instant::now() + timeout;
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let image = image.clone();
        let config = config.clone();
        let spawned = thread::Builder::new()
            .name("ocr-attempt".to_string())
            .spawn(move || {
                let _ = tx.send(inner.recognize_until(&image, &config, deadline));
            });
        if let Err(err) = spawned {
            return Err(RecognizeError::Engine(format!("cannot spawn OCR worker: {err}")));
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let ms = timeout.as_millis() as u64;
                warn!("{} exceeded {} ms, treating cell as empty", self.inner.name(), ms);
                Err(RecognizeError::Timeout { ms })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RecognizeError::Crashed),
        }
    }
}

impl std::fmt::Debug for GuardedRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedRecognizer")
            .field("engine", &self.inner.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sleepy(Duration);

    impl TextRecognizer for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }
        fn recognize(&self, _: &GrayImage, _: &OcrConfig) -> Result<String, RecognizeError> {
            thread::sleep(self.0);
            Ok("late".to_string())
        }
    }

    /// Polls its deadline like a process-backed engine and records stopping.
    #[derive(Default)]
    struct Cancellable {
        stopped: std::sync::atomic::AtomicBool,
    }

    impl TextRecognizer for Cancellable {
        fn name(&self) -> &str {
            "cancellable"
        }
        fn recognize(&self, _: &GrayImage, _: &OcrConfig) -> Result<String, RecognizeError> {
            thread::sleep(Duration::from_secs(30));
            Ok("never".to_string())
        }
        fn recognize_until(
            &self,
            _: &GrayImage,
            _: &OcrConfig,
            deadline: Instant,
        ) -> Result<String, RecognizeError> {
            while Instant::now() < deadline {
                thread::sleep(Duration::from_millis(2));
            }
            self.stopped.store(true, std::sync::atomic::Ordering::SeqCst);
            Err(RecognizeError::Timeout { ms: 0 })
        }
    }

    struct Panicky;

    impl TextRecognizer for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }
        fn recognize(&self, _: &GrayImage, _: &OcrConfig) -> Result<String, RecognizeError> {
            panic!("corrupt buffer")
        }
    }

    #[test]
    fn slow_engine_times_out() {
        let guard = GuardedRecognizer::new(
            Arc::new(Sleepy(Duration::from_millis(500))),
            Some(Duration::from_millis(20)),
        );
        let res = guard.recognize(&GrayImage::new(8, 8), &OcrConfig::free_text("t", 7));
        assert_eq!(res, Err(RecognizeError::Timeout { ms: 20 }));
    }

    #[test]
    fn engine_receives_the_deadline_and_stops() {
        let engine = Arc::new(Cancellable::default());
        let guard = GuardedRecognizer::new(engine.clone(), Some(Duration::from_millis(30)));
        let res = guard.recognize(&GrayImage::new(8, 8), &OcrConfig::numeric("n", 7));
        assert!(matches!(res, Err(RecognizeError::Timeout { .. })));

        let waited = Instant::now();
        while !engine.stopped.load(std::sync::atomic::Ordering::SeqCst) {
            assert!(waited.elapsed() < Duration::from_secs(2), "engine kept running");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn fast_engine_passes_through() {
        let guard = GuardedRecognizer::new(
            Arc::new(Sleepy(Duration::from_millis(0))),
            Some(Duration::from_secs(5)),
        );
        let res = guard.recognize(&GrayImage::new(8, 8), &OcrConfig::free_text("t", 7));
        assert_eq!(res.as_deref(), Ok("late"));
    }

    #[test]
    fn panics_become_crashes() {
        let cfg = OcrConfig::numeric("n", 7);
        let threaded = GuardedRecognizer::new(Arc::new(Panicky), Some(Duration::from_secs(1)));
        assert_eq!(threaded.recognize(&GrayImage::new(8, 8), &cfg), Err(RecognizeError::Crashed));
        let inline = GuardedRecognizer::new(Arc::new(Panicky), None);
        assert_eq!(inline.recognize(&GrayImage::new(8, 8), &cfg), Err(RecognizeError::Crashed));
    }
}
