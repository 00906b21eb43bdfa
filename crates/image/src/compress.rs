//! Budget-driven recompression.
//!
//! The compressor renders once at the policy's initial quality. If the
//! payload is over budget it steps quality down to the floor, then trades
//! resolution for quality: every dimension step shrinks the image and resets
//! quality. When the attempt ceiling runs out a final forced step renders at
//! a conservative quality and a smaller size.

use crate::media::MediaType;
use crate::meter::measure;
use crate::raster::{Rasterizer, RenderRequest, Rendered};
use crate::envelope::scale_dimensions;
use crate::payload::EncodedPayload;
use crate::{ImageError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tolerance for comparing accumulated quality steps against the floor.
const QUALITY_EPSILON: f32 = 1e-4;

/// What to do when the forced final step is still over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Exhaustion {
    /// Accept the forced render regardless of size
    #[default]
    BestEffort,
    /// Fail with [`ImageError::BudgetUnreachable`]
    Fail,
}

/// Tunable knobs of the convergence loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionPolicy {
    /// Quality of the first pass
    pub initial_quality: f32,
    /// Below this quality, dimensions shrink instead
    pub quality_floor: f32,
    /// Quality decrement per attempt
    pub quality_step: f32,
    /// Quality restored after each dimension step
    pub reset_quality: f32,
    /// Dimension multiplier per dimension step
    pub shrink_ratio: f32,
    /// Convergence attempts before the forced step
    pub max_attempts: usize,
    /// Quality of the forced final step
    pub final_quality: f32,
    /// Dimension multiplier of the forced final step
    pub final_shrink_ratio: f32,
    /// Behaviour when the forced step misses the budget
    pub on_exhausted: Exhaustion,
    /// Output media type
    pub media_type: MediaType,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::product()
    }
}

impl CompressionPolicy {
    /// Policy used for product photos.
    pub fn product() -> Self {
        Self {
            initial_quality: 0.5,
            quality_floor: 0.6,
            quality_step: 0.02,
            reset_quality: 0.8,
            shrink_ratio: 0.95,
            max_attempts: 30,
            final_quality: 0.5,
            final_shrink_ratio: 0.9,
            on_exhausted: Exhaustion::BestEffort,
            media_type: MediaType::Jpeg,
        }
    }

    /// Policy used for portfolio main and detail images.
    pub fn portfolio() -> Self {
        Self {
            initial_quality: 0.7,
            quality_step: 0.1,
            ..Self::product()
        }
    }

    /// Builder-style method to set the exhaustion behaviour
    #[must_use]
    pub fn with_exhaustion(mut self, on_exhausted: Exhaustion) -> Self {
        self.on_exhausted = on_exhausted;
        self
    }

    /// Check that every knob is in range.
    pub fn validate(&self) -> Result<()> {
        let qualities = [
            ("initial_quality", self.initial_quality),
            ("quality_floor", self.quality_floor),
            ("reset_quality", self.reset_quality),
            ("final_quality", self.final_quality),
        ];
        for (name, value) in qualities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ImageError::InvalidData(format!("{name} must be within [0, 1], got {value}")));
            }
        }

        if !(self.quality_step > 0.0 && self.quality_step <= 1.0) {
            return Err(ImageError::InvalidData(format!(
                "quality_step must be within (0, 1], got {}",
                self.quality_step
            )));
        }

        for (name, value) in [
            ("shrink_ratio", self.shrink_ratio),
            ("final_shrink_ratio", self.final_shrink_ratio),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ImageError::InvalidData(format!("{name} must be within (0, 1), got {value}")));
            }
        }

        if !self.media_type.is_renderable() {
            return Err(ImageError::InvalidData(format!(
                "cannot encode {}",
                self.media_type.mime_type()
            )));
        }

        Ok(())
    }
}

/// Loop state: the quality and envelope of one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    /// Encoder quality
    pub quality: f32,
    /// Envelope width
    pub width: u32,
    /// Envelope height
    pub height: u32,
}

impl Attempt {
    /// The attempt that follows this one.
    ///
    /// Quality steps down while it is above the floor; at the floor both
    /// dimensions shrink and quality resets.
    #[must_use]
    pub fn next(self, policy: &CompressionPolicy) -> Self {
        if self.quality > policy.quality_floor + QUALITY_EPSILON {
            return Self {
                quality: (self.quality - policy.quality_step).max(policy.quality_floor),
                ..self
            };
        }

        let (width, height) = scale_dimensions(self.width, self.height, policy.shrink_ratio);
        Self {
            quality: policy.reset_quality,
            width,
            height,
        }
    }

    /// The forced final step taken once the attempt ceiling is reached.
    #[must_use]
    pub fn forced(self, policy: &CompressionPolicy) -> Self {
        let (width, height) = scale_dimensions(self.width, self.height, policy.final_shrink_ratio);
        Self {
            quality: policy.final_quality,
            width,
            height,
        }
    }

    fn request(&self, media_type: MediaType) -> RenderRequest {
        RenderRequest {
            max_width: self.width,
            max_height: self.height,
            quality: self.quality,
            media_type,
        }
    }
}

/// Result of a compression run.
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    /// Final payload
    pub payload: EncodedPayload,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Quality of the final render
    pub quality: f32,
    /// Convergence attempts after the first pass (forced step included)
    pub attempts: usize,
    /// Decoded payload size in bytes
    pub bytes: usize,
    /// Whether the forced final step produced the payload
    pub forced: bool,
}

impl Compressed {
    fn new(rendered: Rendered, quality: f32, attempts: usize, bytes: usize, forced: bool) -> Self {
        Self {
            payload: rendered.payload,
            width: rendered.width,
            height: rendered.height,
            quality,
            attempts,
            bytes,
            forced,
        }
    }
}

/// Drives a [`Rasterizer`] until its output fits a byte budget.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveCompressor<R> {
    rasterizer: R,
    policy: CompressionPolicy,
}

impl<R: Rasterizer> AdaptiveCompressor<R> {
    /// Create a compressor with the given rasterizer and policy.
    pub fn new(rasterizer: R, policy: CompressionPolicy) -> Self {
        Self { rasterizer, policy }
    }

    /// Policy in use.
    pub fn policy(&self) -> &CompressionPolicy {
        &self.policy
    }

    /// Rasterizer in use.
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Decode `source` and compress it to at most `budget` decoded bytes.
    pub fn compress(
        &self,
        source: &[u8],
        budget: usize,
        max_width: u32,
        max_height: u32,
    ) -> Result<Compressed> {
        let decoded = self.rasterizer.decode(source)?;
        self.compress_decoded(&decoded, budget, max_width, max_height)
    }

    /// Compress an already decoded source.
    pub fn compress_decoded(
        &self,
        source: &R::Source,
        budget: usize,
        max_width: u32,
        max_height: u32,
    ) -> Result<Compressed> {
        let policy = &self.policy;
        let first = self.rasterizer.render(
            source,
            &Attempt {
                quality: policy.initial_quality,
                width: max_width,
                height: max_height,
            }
            .request(policy.media_type),
        )?;
        let bytes = measure(first.payload.as_str());
        debug!(
            width = first.width,
            height = first.height,
            quality = policy.initial_quality,
            bytes,
            budget,
            "First pass rendered"
        );
        if bytes <= budget {
            return Ok(Compressed::new(first, policy.initial_quality, 0, bytes, false));
        }

        let mut attempt = Attempt {
            quality: policy.initial_quality,
            width: first.width,
            height: first.height,
        };

        for n in 1..=policy.max_attempts {
            attempt = attempt.next(policy);
            let rendered = self.rasterizer.render(source, &attempt.request(policy.media_type))?;
            let bytes = measure(rendered.payload.as_str());
            debug!(
                attempt = n,
                width = rendered.width,
                height = rendered.height,
                quality = attempt.quality,
                bytes,
                budget,
                "Recompressed"
            );
            if bytes <= budget {
                return Ok(Compressed::new(rendered, attempt.quality, n, bytes, false));
            }
        }

        attempt = attempt.forced(policy);
        let attempts = policy.max_attempts + 1;
        warn!(
            attempts = policy.max_attempts,
            width = attempt.width,
            height = attempt.height,
            quality = attempt.quality,
            "Attempt ceiling reached, forcing final step"
        );
        let rendered = self.rasterizer.render(source, &attempt.request(policy.media_type))?;
        let bytes = measure(rendered.payload.as_str());

        if bytes > budget {
            match policy.on_exhausted {
                Exhaustion::Fail => {
                    return Err(ImageError::BudgetUnreachable {
                        measured: bytes,
                        budget,
                        attempts,
                    });
                }
                Exhaustion::BestEffort => {
                    warn!(bytes, budget, "Accepting best-effort payload over budget");
                }
            }
        }

        Ok(Compressed::new(rendered, attempt.quality, attempts, bytes, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::fit_within;
    use std::cell::RefCell;

    /// Source whose encoded size is `width * height * quality` bytes.
    #[derive(Default)]
    struct LinearRasterizer {
        requests: RefCell<Vec<RenderRequest>>,
    }

    impl Rasterizer for LinearRasterizer {
        type Source = (u32, u32);

        fn decode(&self, bytes: &[u8]) -> Result<(u32, u32)> {
            match bytes {
                [w, h] => Ok((u32::from(*w) * 10, u32::from(*h) * 10)),
                _ => Err(ImageError::Decode("expected two bytes".into())),
            }
        }

        fn dimensions(&self, source: &(u32, u32)) -> (u32, u32) {
            *source
        }

        fn render(&self, source: &(u32, u32), request: &RenderRequest) -> Result<Rendered> {
            self.requests.borrow_mut().push(*request);
            let (width, height) = fit_within(source.0, source.1, request.max_width, request.max_height);
            let size = ((width * height) as f32 * request.quality) as usize;
            Ok(Rendered {
                payload: EncodedPayload::from_bytes(request.media_type, &vec![0; size]),
                width,
                height,
            })
        }
    }

    /// Source that never gets smaller than a fixed size.
    struct StubbornRasterizer(usize);

    impl Rasterizer for StubbornRasterizer {
        type Source = ();

        fn decode(&self, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        fn dimensions(&self, _source: &()) -> (u32, u32) {
            (100, 100)
        }

        fn render(&self, _source: &(), request: &RenderRequest) -> Result<Rendered> {
            Ok(Rendered {
                payload: EncodedPayload::from_bytes(request.media_type, &vec![0; self.0]),
                width: request.max_width.min(100),
                height: request.max_height.min(100),
            })
        }
    }

    fn tuned_policy() -> CompressionPolicy {
        CompressionPolicy {
            initial_quality: 0.9,
            quality_floor: 0.3,
            quality_step: 0.1,
            reset_quality: 0.6,
            ..CompressionPolicy::product()
        }
    }

    #[test]
    fn test_pass_through_when_first_pass_fits() {
        let compressor = AdaptiveCompressor::new(LinearRasterizer::default(), CompressionPolicy::product());
        let result = compressor.compress(&[20, 20], 1_000_000, 2560, 2560).unwrap();

        assert_eq!(result.attempts, 0);
        assert!(!result.forced);
        assert_eq!((result.width, result.height), (200, 200));
        assert_eq!(compressor.rasterizer().requests.borrow().len(), 1);
    }

    #[test]
    fn test_converges_on_compressible_source() {
        let compressor = AdaptiveCompressor::new(LinearRasterizer::default(), tuned_policy());
        let result = compressor.compress(&[20, 20], 8_000, 2560, 2560).unwrap();

        assert!(result.bytes <= 8_000);
        assert_eq!(measure(result.payload.as_str()), result.bytes);
        assert!(result.attempts <= 30);
        assert!(!result.forced);
        assert!(result.width < 200);
    }

    #[test]
    fn test_quality_steps_before_dimensions() {
        let compressor = AdaptiveCompressor::new(LinearRasterizer::default(), tuned_policy());
        compressor.compress(&[20, 20], 8_000, 2560, 2560).unwrap();

        let requests = compressor.rasterizer().requests.borrow();
        // First pass, then six quality steps at full size before any shrink
        for request in &requests[1..7] {
            assert_eq!((request.max_width, request.max_height), (200, 200));
        }
        assert!(requests[1].quality < requests[0].quality);
        assert!((requests[6].quality - 0.3).abs() < 1e-4);
        assert_eq!((requests[7].max_width, requests[7].max_height), (190, 190));
        assert!((requests[7].quality - 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_forced_step_accepted_as_best_effort() {
        let compressor = AdaptiveCompressor::new(StubbornRasterizer(5_000), CompressionPolicy::product());
        let result = compressor.compress(&[], 1_000, 100, 100).unwrap();

        assert!(result.forced);
        assert_eq!(result.attempts, 31);
        assert_eq!(result.bytes, 5_000);
        assert!((result.quality - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fail_policy_surfaces_budget_unreachable() {
        let policy = CompressionPolicy::product().with_exhaustion(Exhaustion::Fail);
        let compressor = AdaptiveCompressor::new(StubbornRasterizer(5_000), policy);
        let err = compressor.compress(&[], 1_000, 100, 100).unwrap_err();

        assert!(matches!(
            err,
            ImageError::BudgetUnreachable { measured: 5_000, budget: 1_000, attempts: 31 }
        ));
    }

    #[test]
    fn test_decode_error_is_not_retried() {
        let compressor = AdaptiveCompressor::new(LinearRasterizer::default(), CompressionPolicy::product());
        assert!(matches!(compressor.compress(&[1, 2, 3], 10, 10, 10), Err(ImageError::Decode(_))));
        assert!(compressor.rasterizer().requests.borrow().is_empty());
    }

    #[test]
    fn test_attempt_below_floor_shrinks_and_resets() {
        // Product first pass (0.5) already sits under the floor (0.6)
        let policy = CompressionPolicy::product();
        let next = Attempt { quality: 0.5, width: 2000, height: 1000 }.next(&policy);
        assert_eq!((next.width, next.height), (1900, 950));
        assert!((next.quality - 0.8).abs() < f32::EPSILON);

        let stepped = next.next(&policy);
        assert_eq!((stepped.width, stepped.height), (1900, 950));
        assert!((stepped.quality - 0.78).abs() < 1e-4);
    }

    #[test]
    fn test_attempt_quality_clamps_at_floor() {
        let policy = CompressionPolicy::portfolio();
        let next = Attempt { quality: 0.65, width: 10, height: 10 }.next(&policy);
        assert!((next.quality - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_forced_attempt() {
        let policy = CompressionPolicy::product();
        let forced = Attempt { quality: 0.7, width: 1000, height: 500 }.forced(&policy);
        assert_eq!((forced.width, forced.height), (900, 450));
        assert!((forced.quality - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_policy_validation() {
        assert!(CompressionPolicy::product().validate().is_ok());
        assert!(CompressionPolicy::portfolio().validate().is_ok());

        let bad_quality = CompressionPolicy { initial_quality: 1.5, ..CompressionPolicy::product() };
        assert!(bad_quality.validate().is_err());

        let bad_ratio = CompressionPolicy { shrink_ratio: 1.0, ..CompressionPolicy::product() };
        assert!(bad_ratio.validate().is_err());

        let bad_step = CompressionPolicy { quality_step: 0.0, ..CompressionPolicy::product() };
        assert!(bad_step.validate().is_err());

        let bad_type = CompressionPolicy { media_type: MediaType::Gif, ..CompressionPolicy::product() };
        assert!(bad_type.validate().is_err());
    }
}
