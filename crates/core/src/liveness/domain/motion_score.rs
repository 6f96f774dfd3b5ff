//! Frame-difference motion scoring used as a lightweight liveness signal.
//!
//! A printed photo held in front of the camera produces near-identical
//! frames; a live subject asked to move produces measurable luma changes.
//! Only every 8th pixel is sampled so the check stays cheap enough for
//! real-time capture.

use thiserror::Error;

use crate::shared::constants::{LIVENESS_PASS_SCORE, MOTION_NORMALIZER, MOTION_PIXEL_STRIDE};
use crate::shared::frame::Frame;

#[derive(Error, Debug, PartialEq)]
pub enum MotionError {
    #[error("frame {index} is empty")]
    EmptyFrame { index: usize },
    #[error("frame {index} has no channels or a buffer that does not match its size")]
    Malformed { index: usize },
    #[error("frames {a} and {b} differ in size or channel layout")]
    LayoutMismatch { a: usize, b: usize },
}

/// Pass/fail liveness decision with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivenessResult {
    pub passed: bool,
    pub score: f64,
}

impl LivenessResult {
    /// Result used when the caller does not require liveness.
    pub fn not_required() -> Self {
        Self {
            passed: true,
            score: 1.0,
        }
    }

    /// Result used when frames could not be captured or compared.
    pub fn failed() -> Self {
        Self {
            passed: false,
            score: 0.0,
        }
    }
}

/// Full breakdown of one liveness evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionAnalysis {
    /// Motion score of every consecutive frame pair, in capture order.
    pub pair_scores: Vec<f64>,
    /// Pairs whose score exceeded the movement threshold.
    pub counted_pairs: usize,
    pub mean_motion: f64,
    pub result: LivenessResult,
}

/// Rec. 601 luma.
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

fn sample_luma(px: &[u8]) -> f64 {
    if px.len() >= 3 {
        luma(px[0], px[1], px[2])
    } else {
        px[0] as f64
    }
}

/// Normalized motion between two frames of identical layout.
///
/// Averages the absolute luma difference over every 8th pixel, divides by
/// 40 and clamps to `[0, 1]`.
pub fn motion_score(prev: &Frame, curr: &Frame) -> Result<f64, MotionError> {
    if prev.is_empty() {
        return Err(MotionError::EmptyFrame { index: prev.index() });
    }
    if curr.is_empty() {
        return Err(MotionError::EmptyFrame { index: curr.index() });
    }
    for frame in [prev, curr] {
        if !frame.is_well_formed() {
            return Err(MotionError::Malformed {
                index: frame.index(),
            });
        }
    }
    if !prev.same_layout(curr) {
        return Err(MotionError::LayoutMismatch {
            a: prev.index(),
            b: curr.index(),
        });
    }

    let channels = prev.channels() as usize;
    let stride = MOTION_PIXEL_STRIDE * channels;
    let a = prev.data();
    let b = curr.data();

    let mut total_diff = 0.0;
    let mut samples = 0usize;
    let mut offset = 0;
    while offset + channels <= a.len() {
        let la = sample_luma(&a[offset..offset + channels]);
        let lb = sample_luma(&b[offset..offset + channels]);
        total_diff += (la - lb).abs();
        samples += 1;
        offset += stride;
    }

    if samples == 0 {
        return Ok(0.0);
    }
    let avg_diff = total_diff / samples as f64;
    Ok((avg_diff / MOTION_NORMALIZER).clamp(0.0, 1.0))
}

/// Converts per-pair motion scores into a liveness decision.
///
/// Pairs count only when strictly above `movement_threshold`. With fewer
/// than two counted pairs the mean is taken as zero.
pub fn score_motion(pair_scores: &[f64], movement_threshold: f64) -> MotionAnalysis {
    let counted: Vec<f64> = pair_scores
        .iter()
        .copied()
        .filter(|s| *s > movement_threshold)
        .collect();
    let counted_pairs = counted.len();

    let mean_motion = if counted_pairs >= 2 {
        counted.iter().sum::<f64>() / counted_pairs as f64
    } else {
        0.0
    };

    let mut score: f64 = 0.0;
    if mean_motion > 0.01 {
        score += 0.3;
    }
    if mean_motion > 0.02 {
        score += 0.3;
    }
    if mean_motion > 0.04 {
        score += 0.2;
    }
    if mean_motion > 0.08 {
        score += 0.2;
    }
    if counted_pairs >= 2 {
        score += 0.2;
    }
    let score = score.clamp(0.0, 1.0);

    MotionAnalysis {
        pair_scores: pair_scores.to_vec(),
        counted_pairs,
        mean_motion,
        result: LivenessResult {
            passed: score >= LIVENESS_PASS_SCORE,
            score,
        },
    }
}

/// Scores every consecutive pair of `frames` and aggregates the result.
pub fn analyze_frames(
    frames: &[Frame],
    movement_threshold: f64,
) -> Result<MotionAnalysis, MotionError> {
    let pair_scores = frames
        .windows(2)
        .map(|pair| motion_score(&pair[0], &pair[1]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(score_motion(&pair_scores, movement_threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn gray_frame(value: u8, width: u32, height: u32, index: usize) -> Frame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&[value, value, value, 255]);
        }
        Frame::rgba(data, width, height, index)
    }

    #[test]
    fn test_luma_weights() {
        assert_relative_eq!(luma(255, 0, 0), 76.245, epsilon = 1e-9);
        assert_relative_eq!(luma(0, 255, 0), 149.685, epsilon = 1e-9);
        assert_relative_eq!(luma(0, 0, 255), 29.07, epsilon = 1e-9);
        assert_relative_eq!(luma(100, 100, 100), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_frames_have_zero_motion() {
        let a = gray_frame(120, 16, 16, 0);
        let b = gray_frame(120, 16, 16, 1);
        assert_eq!(motion_score(&a, &b).unwrap(), 0.0);
    }

    #[rstest]
    #[case(100, 102, 0.05)]
    #[case(100, 104, 0.1)]
    #[case(0, 20, 0.5)]
    #[case(0, 255, 1.0)]
    fn test_uniform_shift_normalized_by_forty(
        #[case] from: u8,
        #[case] to: u8,
        #[case] expected: f64,
    ) {
        let a = gray_frame(from, 16, 16, 0);
        let b = gray_frame(to, 16, 16, 1);
        assert_relative_eq!(motion_score(&a, &b).unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_only_every_eighth_pixel_is_sampled() {
        // 16x1 frame: pixels 0 and 8 are sampled. Changing pixel 1 has no effect.
        let a = gray_frame(50, 16, 1, 0);
        let mut data = a.data().to_vec();
        data[4..7].copy_from_slice(&[250, 250, 250]);
        let b = Frame::rgba(data, 16, 1, 1);
        assert_eq!(motion_score(&a, &b).unwrap(), 0.0);

        let mut data = a.data().to_vec();
        data[32..35].copy_from_slice(&[90, 90, 90]);
        let c = Frame::rgba(data, 16, 1, 2);
        // One of two samples differs by 40 → avg 20 → 0.5
        assert_relative_eq!(motion_score(&a, &c).unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_layout_mismatch_is_error() {
        let a = gray_frame(0, 8, 8, 0);
        let b = gray_frame(0, 4, 8, 1);
        assert_eq!(
            motion_score(&a, &b),
            Err(MotionError::LayoutMismatch { a: 0, b: 1 })
        );
    }

    #[test]
    fn test_empty_frame_is_error() {
        let a = Frame::rgba(Vec::new(), 0, 0, 3);
        let b = gray_frame(0, 4, 4, 4);
        assert_eq!(
            motion_score(&a, &b),
            Err(MotionError::EmptyFrame { index: 3 })
        );
    }

    #[test]
    fn test_zero_channel_frame_is_error() {
        let a = Frame::new(vec![0u8; 16], 2, 2, 0, 5);
        let b = Frame::new(vec![0u8; 16], 2, 2, 0, 6);
        assert_eq!(
            motion_score(&a, &b),
            Err(MotionError::Malformed { index: 5 })
        );
    }

    #[test]
    fn test_short_buffer_is_error() {
        let a = gray_frame(0, 4, 4, 0);
        let b = Frame::rgba(vec![0u8; 10], 4, 4, 1);
        assert_eq!(
            motion_score(&a, &b),
            Err(MotionError::Malformed { index: 1 })
        );
        assert!(analyze_frames(&[a, b], 0.01).is_err());
    }

    #[test]
    fn test_three_counted_pairs_pass_with_high_score() {
        let analysis = score_motion(&[0.05, 0.09, 0.03], 0.01);
        assert_eq!(analysis.counted_pairs, 3);
        assert_relative_eq!(analysis.mean_motion, 0.17 / 3.0, epsilon = 1e-9);
        // 0.3 + 0.3 + 0.2 tiers + 0.2 bonus
        assert_relative_eq!(analysis.result.score, 1.0, epsilon = 1e-9);
        assert!(analysis.result.passed);
    }

    #[test]
    fn test_no_motion_fails() {
        let analysis = score_motion(&[0.0, 0.0, 0.0], 0.01);
        assert_eq!(analysis.counted_pairs, 0);
        assert_eq!(analysis.result, LivenessResult::failed());
    }

    #[test]
    fn test_single_counted_pair_fails() {
        let analysis = score_motion(&[0.5, 0.0, 0.0], 0.01);
        assert_eq!(analysis.counted_pairs, 1);
        assert_eq!(analysis.mean_motion, 0.0);
        assert!(!analysis.result.passed);
    }

    #[test]
    fn test_threshold_is_strict() {
        let analysis = score_motion(&[0.01, 0.01, 0.01], 0.01);
        assert_eq!(analysis.counted_pairs, 0);
        assert!(!analysis.result.passed);
    }

    #[rstest]
    #[case(&[0.015, 0.015], 0.5)]
    #[case(&[0.03, 0.03], 0.8)]
    #[case(&[0.05, 0.05], 1.0)]
    #[case(&[0.2, 0.3, 0.4], 1.0)]
    fn test_tiers(#[case] scores: &[f64], #[case] expected: f64) {
        let analysis = score_motion(scores, 0.01);
        assert_relative_eq!(analysis.result.score, expected, epsilon = 1e-9);
        assert!(analysis.result.passed);
    }

    #[test]
    fn test_analyze_frames_over_sequence() {
        let frames = vec![
            gray_frame(100, 16, 16, 0),
            gray_frame(102, 16, 16, 1),
            gray_frame(106, 16, 16, 2),
            gray_frame(107, 16, 16, 3),
        ];
        let analysis = analyze_frames(&frames, 0.01).unwrap();
        assert_eq!(analysis.pair_scores.len(), 3);
        assert_relative_eq!(analysis.pair_scores[0], 0.05, epsilon = 1e-9);
        assert_relative_eq!(analysis.pair_scores[1], 0.1, epsilon = 1e-9);
        assert_relative_eq!(analysis.pair_scores[2], 0.025, epsilon = 1e-9);
        assert_eq!(analysis.counted_pairs, 3);
        assert!(analysis.result.passed);
    }

    #[test]
    fn test_analyze_frames_static_sequence_fails() {
        let frames: Vec<Frame> = (0..4).map(|i| gray_frame(80, 16, 16, i)).collect();
        let analysis = analyze_frames(&frames, 0.01).unwrap();
        assert!(!analysis.result.passed);
        assert_eq!(analysis.result.score, 0.0);
    }
}
