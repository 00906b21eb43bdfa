//! Target dimension calculation inside a pixel envelope.

/// Fit `(width, height)` inside `max_width` x `max_height`, preserving aspect ratio.
///
/// Landscape and square images are width-led, portrait images height-led;
/// the other side is re-derived if it still overflows. Never upscales and
/// never returns a zero dimension.
///
/// # Example
/// ```
/// use sheetcell_image::fit_within;
///
/// assert_eq!(fit_within(4000, 3000, 2560, 2560), (2560, 1920));
/// assert_eq!(fit_within(3000, 4000, 2560, 2560), (1920, 2560));
/// assert_eq!(fit_within(800, 600, 2560, 2560), (800, 600));
/// ```
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);

    if width >= height {
        let (w, h) = lead_with(width, height, max_width);
        if h > max_height {
            let (h, w) = lead_with(height, width, max_height);
            return (w, h);
        }
        (w, h)
    } else {
        let (h, w) = lead_with(height, width, max_height);
        if w > max_width {
            return lead_with(width, height, max_width);
        }
        (w, h)
    }
}

/// Clamp `lead` to `limit` and scale `follow` by the same factor.
fn lead_with(lead: u32, follow: u32, limit: u32) -> (u32, u32) {
    if lead <= limit {
        return (lead, follow);
    }
    let ratio = limit as f64 / lead as f64;
    let scaled = (follow as f64 * ratio).round() as u32;
    (limit, scaled.max(1))
}

/// Scale both dimensions by `ratio` (expected in `(0, 1)`).
///
/// Each side rounds to the nearest pixel but always loses at least one
/// pixel while it is larger than one.
pub fn scale_dimensions(width: u32, height: u32, ratio: f32) -> (u32, u32) {
    let scale = |side: u32| {
        let scaled = (side as f64 * f64::from(ratio)).round() as u32;
        scaled.min(side.saturating_sub(1)).max(1)
    };
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_upscale() {
        assert_eq!(fit_within(500, 400, 2560, 2560), (500, 400));
        assert_eq!(fit_within(1, 1, 2560, 2560), (1, 1));
    }

    #[test]
    fn test_landscape_clamped_by_height() {
        // Width fits after the width-led pass but height still overflows
        assert_eq!(fit_within(2000, 1500, 1800, 1000), (1333, 1000));
    }

    #[test]
    fn test_portrait_clamped_by_width() {
        assert_eq!(fit_within(1500, 2000, 1000, 1800), (1000, 1333));
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within(10_000, 2, 100, 100), (100, 1));
    }

    #[test]
    fn test_scale_dimensions() {
        assert_eq!(scale_dimensions(2560, 1920, 0.95), (2432, 1824));
        assert_eq!(scale_dimensions(1, 1, 0.5), (1, 1));
        // Rounding alone would leave these unchanged
        assert_eq!(scale_dimensions(10, 3, 0.99), (9, 2));
    }

    proptest! {
        #[test]
        fn fit_stays_in_envelope_and_keeps_aspect(
            w0 in 1u32..8000,
            h0 in 1u32..8000,
            max_w in 16u32..4000,
            max_h in 16u32..4000,
        ) {
            let (w, h) = fit_within(w0, h0, max_w, max_h);
            prop_assert!(w <= max_w && h <= max_h);
            prop_assert!(w <= w0 && h <= h0);
            prop_assert!(w >= 1 && h >= 1);
            // Rounding moves the short side by at most half a pixel
            let expected_h = w as f64 * h0 as f64 / w0 as f64;
            let expected_w = h as f64 * w0 as f64 / h0 as f64;
            prop_assert!((h as f64 - expected_h).abs() <= 1.0 || (w as f64 - expected_w).abs() <= 1.0);
        }
    }
}
