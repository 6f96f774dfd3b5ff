use std::sync::Arc;

use crate::liveness::domain::liveness_config::LivenessConfig;
use crate::liveness::domain::motion_score::{analyze_frames, LivenessResult, MotionAnalysis};
use crate::liveness::domain::video_source::VideoSource;
use crate::pipeline::attempt_observer::{AttemptObserver, NullAttemptObserver};
use crate::shared::BoxError;

/// Liveness check: capture N frames at a fixed interval, then score motion.
pub struct EvaluateLivenessUseCase {
    config: LivenessConfig,
    observer: Arc<dyn AttemptObserver>,
}

impl EvaluateLivenessUseCase {
    pub fn new(config: LivenessConfig, observer: Arc<dyn AttemptObserver>) -> Self {
        Self { config, observer }
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    /// Never fails: capture or comparison errors produce a failed result.
    pub async fn execute(&self, source: &mut dyn VideoSource) -> LivenessResult {
        let result = if !self.config.liveness_required {
            log::debug!("Liveness not required, skipping capture");
            LivenessResult::not_required()
        } else {
            match self.analyze(source).await {
                Ok(analysis) => {
                    log::debug!(
                        "Motion pairs {:?}, {} counted, mean {:.4}",
                        analysis.pair_scores,
                        analysis.counted_pairs,
                        analysis.mean_motion
                    );
                    analysis.result
                }
                Err(e) => {
                    log::warn!("Liveness capture failed: {e}");
                    LivenessResult::failed()
                }
            }
        };
        self.observer.liveness_evaluated(&result);
        result
    }

    /// Captures `num_frames` frames and returns the full motion breakdown.
    pub async fn analyze(&self, source: &mut dyn VideoSource) -> Result<MotionAnalysis, BoxError> {
        log::debug!(
            "Capturing {} frames every {} ms ({} sensitivity)",
            self.config.num_frames,
            self.config.frame_interval,
            self.config.sensitivity
        );

        let mut frames = Vec::with_capacity(self.config.num_frames);
        for i in 0..self.config.num_frames {
            if i > 0 {
                tokio::time::sleep(self.config.interval()).await;
            }
            frames.push(source.current_frame()?);
        }

        Ok(analyze_frames(&frames, self.config.movement_threshold)?)
    }
}

/// One-shot liveness evaluation without an observer.
pub async fn evaluate_liveness(
    source: &mut dyn VideoSource,
    config: &LivenessConfig,
) -> LivenessResult {
    EvaluateLivenessUseCase::new(config.clone(), Arc::new(NullAttemptObserver))
        .execute(source)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::attempt_observer::LoggingAttemptObserver;
    use crate::shared::frame::Frame;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    // --- Stubs ---

    struct StubVideoSource {
        frames: VecDeque<Result<Frame, String>>,
        captures: Arc<Mutex<Vec<tokio::time::Instant>>>,
    }

    impl StubVideoSource {
        fn new(frames: Vec<Result<Frame, String>>) -> Self {
            Self {
                frames: frames.into(),
                captures: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn gray(values: &[u8]) -> Self {
            Self::new(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| Ok(gray_frame(v, i)))
                    .collect(),
            )
        }
    }

    impl VideoSource for StubVideoSource {
        fn current_frame(&mut self) -> Result<Frame, BoxError> {
            self.captures.lock().unwrap().push(tokio::time::Instant::now());
            match self.frames.pop_front() {
                Some(Ok(frame)) => Ok(frame),
                Some(Err(msg)) => Err(msg.into()),
                None => Err("camera closed".into()),
            }
        }
    }

    // --- Helpers ---

    fn gray_frame(value: u8, index: usize) -> Frame {
        let mut data = Vec::with_capacity(32 * 32 * 4);
        for _ in 0..(32 * 32) {
            data.extend_from_slice(&[value, value, value, 255]);
        }
        Frame::rgba(data, 32, 32, index)
    }

    fn config(num_frames: usize) -> LivenessConfig {
        LivenessConfig {
            num_frames,
            ..LivenessConfig::default()
        }
    }

    // --- Tests ---

    #[tokio::test(start_paused = true)]
    async fn test_not_required_skips_capture() {
        let mut source = StubVideoSource::gray(&[100, 100]);
        let captures = source.captures.clone();
        let cfg = LivenessConfig {
            liveness_required: false,
            ..LivenessConfig::default()
        };

        let result = evaluate_liveness(&mut source, &cfg).await;

        assert!(result.passed);
        assert_relative_eq!(result.score, 1.0);
        assert!(captures.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_frames_fail() {
        let mut source = StubVideoSource::gray(&[120, 120, 120, 120]);
        let result = evaluate_liveness(&mut source, &config(4)).await;
        assert!(!result.passed);
        assert_relative_eq!(result.score, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_moving_subject_passes() {
        // Pair scores 0.05, 0.1, 0.025: all counted, mean above 0.04
        let mut source = StubVideoSource::gray(&[100, 102, 106, 107]);
        let result = evaluate_liveness(&mut source, &config(4)).await;
        assert!(result.passed);
        assert_relative_eq!(result.score, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_captures_only() {
        let mut source = StubVideoSource::gray(&[100, 102, 106, 107]);
        let captures = source.captures.clone();
        let start = tokio::time::Instant::now();

        evaluate_liveness(&mut source, &config(4)).await;

        let captures = captures.lock().unwrap();
        assert_eq!(captures.len(), 4);
        assert_eq!(captures[0] - start, Duration::ZERO);
        for pair in captures.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(800));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_error_fails_without_error() {
        let mut source = StubVideoSource::new(vec![
            Ok(gray_frame(100, 0)),
            Err("device busy".into()),
            Ok(gray_frame(140, 2)),
        ]);
        let captures = source.captures.clone();

        let result = evaluate_liveness(&mut source, &config(3)).await;

        assert_eq!(result, LivenessResult::failed());
        assert_eq!(captures.lock().unwrap().len(), 2, "no retries after failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_layout_mismatch_is_capture_error() {
        let small = Frame::rgba(vec![0; 4 * 4 * 4], 4, 4, 1);
        let mut source = StubVideoSource::new(vec![Ok(gray_frame(100, 0)), Ok(small)]);

        let result = evaluate_liveness(&mut source, &config(2)).await;

        assert_eq!(result, LivenessResult::failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_fails() {
        let no_channels = Frame::new(vec![0; 32 * 32], 32, 32, 0, 1);
        let short = Frame::rgba(vec![0; 7], 32, 32, 1);
        for bad in [no_channels, short] {
            let mut source = StubVideoSource::new(vec![Ok(gray_frame(100, 0)), Ok(bad)]);
            let result = evaluate_liveness(&mut source, &config(2)).await;
            assert_eq!(result, LivenessResult::failed());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_frame_cannot_pass() {
        let mut source = StubVideoSource::gray(&[100]);
        let result = evaluate_liveness(&mut source, &config(1)).await;
        assert!(!result.passed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_exposes_pair_scores() {
        let uc = EvaluateLivenessUseCase::new(config(3), Arc::new(NullAttemptObserver));
        let mut source = StubVideoSource::gray(&[100, 102, 102]);

        let analysis = uc.analyze(&mut source).await.unwrap();

        assert_eq!(analysis.pair_scores.len(), 2);
        assert_relative_eq!(analysis.pair_scores[0], 0.05, epsilon = 1e-9);
        assert_relative_eq!(analysis.pair_scores[1], 0.0);
        assert_eq!(analysis.counted_pairs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_to_observer() {
        let observer = Arc::new(LoggingAttemptObserver::new());
        let uc = EvaluateLivenessUseCase::new(config(2), observer.clone());

        uc.execute(&mut StubVideoSource::gray(&[100, 100])).await;

        assert_eq!(observer.counts().liveness_failed, 1);
    }
}
