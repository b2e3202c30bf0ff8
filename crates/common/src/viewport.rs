use serde::{Deserialize, Serialize};

/// Drawable width/height of the output surface, in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Projection aspect ratio, exactly `width / height`.
    ///
    /// Height is clamped to 1 so a collapsed window never yields a NaN
    /// projection matrix.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Upper bound on the applied device pixel ratio. High-density displays are
/// rendered at 2x at most.
pub const MAX_PIXEL_SCALE: f64 = 2.0;

/// Clamp a platform-reported device pixel ratio to [`MAX_PIXEL_SCALE`].
pub fn clamp_pixel_scale(reported: f64) -> f64 {
    reported.min(MAX_PIXEL_SCALE)
}

/// Extent of the rendered surface in physical pixels, after the pixel-scale
/// clamp has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceExtent {
    pub width: u32,
    pub height: u32,
}

impl SurfaceExtent {
    /// Derive the rendered extent from the platform-reported physical size
    /// and device pixel ratio.
    ///
    /// The logical size is recovered by dividing out the reported scale, then
    /// multiplied by the clamped scale. A display at 3x therefore renders at
    /// 2x its logical size. Pure function of its inputs: repeated resizes
    /// collapse to whatever the final dimensions were.
    pub fn compute(physical: Viewport, reported_scale: f64) -> Self {
        let scale = if reported_scale > 0.0 { reported_scale } else { 1.0 };
        let applied = clamp_pixel_scale(scale);
        let width = (physical.width as f64 / scale * applied).round() as u32;
        let height = (physical.height as f64 / scale * applied).round() as u32;
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_exact_ratio() {
        assert_eq!(Viewport::new(1920, 1080).aspect(), 1920.0 / 1080.0);
        assert_eq!(Viewport::new(800, 600).aspect(), 800.0 / 600.0);
    }

    #[test]
    fn aspect_survives_zero_height() {
        let v = Viewport::new(640, 0);
        assert!(v.aspect().is_finite());
        assert_eq!(v.aspect(), 640.0);
    }

    #[test]
    fn pixel_scale_clamps_above_two() {
        assert_eq!(clamp_pixel_scale(3.0), 2.0);
        assert_eq!(clamp_pixel_scale(2.0), 2.0);
        assert_eq!(clamp_pixel_scale(1.5), 1.5);
        assert_eq!(clamp_pixel_scale(1.0), 1.0);
    }

    #[test]
    fn extent_passthrough_at_low_scale() {
        let e = SurfaceExtent::compute(Viewport::new(1920, 1080), 1.0);
        assert_eq!(e, SurfaceExtent { width: 1920, height: 1080 });
    }

    #[test]
    fn extent_clamped_on_dense_display() {
        // 3x display reporting 3000x1500 physical = 1000x500 logical.
        let e = SurfaceExtent::compute(Viewport::new(3000, 1500), 3.0);
        assert_eq!(e, SurfaceExtent { width: 2000, height: 1000 });
    }

    #[test]
    fn repeated_resize_equals_final_resize() {
        let steps = [(300, 200), (1024, 768), (1920, 1080)];
        let mut last = None;
        for (w, h) in steps {
            last = Some(SurfaceExtent::compute(Viewport::new(w, h), 1.25));
        }
        let (w, h) = steps[steps.len() - 1];
        assert_eq!(last.unwrap(), SurfaceExtent::compute(Viewport::new(w, h), 1.25));
    }

    #[test]
    fn degenerate_size_stays_positive() {
        let e = SurfaceExtent::compute(Viewport::new(0, 0), 2.0);
        assert_eq!(e, SurfaceExtent { width: 1, height: 1 });
    }
}
