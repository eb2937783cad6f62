use eframe::egui::{Rect, Vec2};

use crate::config::CameraTuning;

/// A pan offset in screen pixels plus a uniform zoom. World coordinates map
/// to the viewport as `center + offset + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Camera {
    pub offset: Vec2,
    pub scale: f32,
}

impl Camera {
    pub const IDENTITY: Self = Self {
        offset: Vec2::ZERO,
        scale: 1.0,
    };
}

/// Smoothed camera state. Programmatic moves (cluster framing, reset) set the
/// target and let `step` close the gap; direct manipulation (drag, wheel
/// zoom) writes both so the view never fights the pointer.
pub(super) struct CameraController {
    pub current: Camera,
    pub target: Camera,
}

impl CameraController {
    pub(super) fn new() -> Self {
        Self {
            current: Camera::IDENTITY,
            target: Camera::IDENTITY,
        }
    }

    /// Moves `current` a fixed fraction toward `target`. Frame-rate tied on
    /// purpose: the exponential ease reads the same at any refresh rate that
    /// matters here.
    pub(super) fn step(&mut self, tuning: &CameraTuning) {
        let t = tuning.lerp_fraction;
        self.current.offset += (self.target.offset - self.current.offset) * t;
        self.current.scale += (self.target.scale - self.current.scale) * t;
    }

    pub(super) fn is_settled(&self) -> bool {
        (self.target.offset - self.current.offset).length() < 0.05
            && (self.target.scale - self.current.scale).abs() < 1e-3
    }

    pub(super) fn drag_by(&mut self, delta: Vec2) {
        self.current.offset += delta;
        self.target.offset += delta;
    }

    /// Zooms about a fixed point given in pixels relative to the viewport
    /// center, so the world position under the cursor stays put.
    pub(super) fn zoom_about(&mut self, anchor: Vec2, scroll_pixels: f32, tuning: &CameraTuning) {
        if scroll_pixels == 0.0 {
            return;
        }

        let ticks = scroll_pixels / tuning.wheel_pixels_per_tick;
        let factor = if ticks > 0.0 {
            tuning.zoom_in_factor.powf(ticks)
        } else {
            tuning.zoom_out_factor.powf(-ticks)
        };

        let world_anchor = (anchor - self.current.offset) / self.current.scale;
        let scale = (self.current.scale * factor).clamp(tuning.min_scale, tuning.max_scale);

        self.current = Camera {
            offset: anchor - world_anchor * scale,
            scale,
        };
        self.target = self.current;
    }

    /// Eases toward a view that fits `bounds` (world coordinates) into a
    /// viewport of `view_size` pixels with padding on every side.
    pub(super) fn frame_bounds(&mut self, bounds: Rect, view_size: Vec2, tuning: &CameraTuning) {
        let padded_w = bounds.width() + 2.0 * tuning.frame_padding;
        let padded_h = bounds.height() + 2.0 * tuning.frame_padding;
        if padded_w <= 0.0 || padded_h <= 0.0 {
            return;
        }

        let scale = (view_size.x / padded_w)
            .min(view_size.y / padded_h)
            .clamp(tuning.frame_min_scale, tuning.frame_max_scale);

        self.target = Camera {
            offset: -bounds.center().to_vec2() * scale,
            scale,
        };
    }

    pub(super) fn reset_target(&mut self) {
        self.target = Camera::IDENTITY;
    }

    pub(super) fn snap_identity(&mut self) {
        self.current = Camera::IDENTITY;
        self.target = Camera::IDENTITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn tuning() -> CameraTuning {
        CameraTuning::default()
    }

    #[test]
    fn step_converges_without_overshoot() {
        let mut controller = CameraController::new();
        controller.target = Camera {
            offset: vec2(140.0, -60.0),
            scale: 2.2,
        };

        let mut previous = (controller.target.offset - controller.current.offset).length();
        for _ in 0..240 {
            controller.step(&tuning());
            let remaining = (controller.target.offset - controller.current.offset).length();
            assert!(remaining <= previous + 1e-4, "distance must shrink");
            assert!(controller.current.scale <= controller.target.scale + 1e-4);
            previous = remaining;
        }

        assert!(controller.is_settled());
    }

    #[test]
    fn drag_moves_current_and_target_together() {
        let mut controller = CameraController::new();
        controller.drag_by(vec2(12.0, -7.0));
        assert_eq!(controller.current.offset, vec2(12.0, -7.0));
        assert_eq!(controller.target.offset, vec2(12.0, -7.0));
        assert!(controller.is_settled());
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut controller = CameraController::new();
        controller.current.offset = vec2(30.0, 10.0);
        controller.target = controller.current;

        let anchor = vec2(90.0, -40.0);
        let world_before = (anchor - controller.current.offset) / controller.current.scale;
        controller.zoom_about(anchor, 50.0, &tuning());
        let world_after = (anchor - controller.current.offset) / controller.current.scale;

        assert!((world_after - world_before).length() < 1e-3);
        assert!(controller.current.scale > 1.0);
    }

    #[test]
    fn zoom_respects_scale_limits() {
        let tuning = tuning();
        let mut controller = CameraController::new();
        for _ in 0..100 {
            controller.zoom_about(Vec2::ZERO, 200.0, &tuning);
        }
        assert!((controller.current.scale - tuning.max_scale).abs() < 1e-4);

        for _ in 0..200 {
            controller.zoom_about(Vec2::ZERO, -200.0, &tuning);
        }
        assert!((controller.current.scale - tuning.min_scale).abs() < 1e-4);
    }

    #[test]
    fn framing_clamps_scale_and_centers_bounds() {
        let tuning = tuning();
        let mut controller = CameraController::new();
        let bounds = Rect::from_min_size(pos2(100.0, 100.0), vec2(40.0, 40.0));

        controller.frame_bounds(bounds, vec2(1200.0, 800.0), &tuning);

        assert!((controller.target.scale - tuning.frame_max_scale).abs() < 1e-4);
        let expected = -bounds.center().to_vec2() * controller.target.scale;
        assert!((controller.target.offset - expected).length() < 1e-3);
    }

    #[test]
    fn snap_jumps_to_identity() {
        let mut controller = CameraController::new();
        controller.drag_by(vec2(50.0, 50.0));
        controller.target.scale = 3.0;
        controller.snap_identity();
        assert_eq!(controller.current, Camera::IDENTITY);
        assert_eq!(controller.target, Camera::IDENTITY);
    }
}
