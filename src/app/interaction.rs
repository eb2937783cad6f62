use eframe::egui::Vec2;

use crate::config::InteractionTuning;

/// Nearest node whose circle (plus a zoom-compensated tolerance ring)
/// contains the world-space pointer. Ties go to the closest center so
/// overlapping small nodes stay individually clickable.
pub(super) fn hit_test(
    world: Vec2,
    positions: &[Vec2],
    radii: &[f32],
    scale: f32,
    tuning: &InteractionTuning,
) -> Option<usize> {
    let tolerance = tuning.hit_tolerance_px / scale.max(1e-3);

    positions
        .iter()
        .zip(radii)
        .enumerate()
        .filter_map(|(index, (position, radius))| {
            let distance = (*position - world).length();
            (distance <= radius + tolerance).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Gesture {
    Click,
    Drag,
}

/// Classifies a press/release pair as a click or a drag by accumulated
/// pointer travel, so a shaky click does not clear the selection.
#[derive(Default)]
pub(super) struct PointerTracker {
    down: bool,
    travelled: f32,
}

impl PointerTracker {
    pub(super) fn press(&mut self) {
        self.down = true;
        self.travelled = 0.0;
    }

    pub(super) fn track(&mut self, delta: Vec2) {
        if self.down {
            self.travelled += delta.length();
        }
    }

    pub(super) fn is_down(&self) -> bool {
        self.down
    }

    pub(super) fn is_dragging(&self, tuning: &InteractionTuning) -> bool {
        self.down && self.travelled > tuning.drag_threshold_px
    }

    pub(super) fn release(&mut self, tuning: &InteractionTuning) -> Option<Gesture> {
        if !self.down {
            return None;
        }
        self.down = false;
        if self.travelled > tuning.drag_threshold_px {
            Some(Gesture::Drag)
        } else {
            Some(Gesture::Click)
        }
    }
}

/// Hovered node plus the time the pointer arrived on it. The tooltip only
/// shows once the pointer has rested for the configured delay.
#[derive(Default)]
pub(super) struct HoverState {
    pub node: Option<usize>,
    since: f64,
}

impl HoverState {
    pub(super) fn update(&mut self, node: Option<usize>, now: f64) {
        if node != self.node {
            self.node = node;
            self.since = now;
        }
    }

    pub(super) fn tooltip_ready(&self, now: f64, tuning: &InteractionTuning) -> bool {
        self.node.is_some() && now - self.since >= tuning.tooltip_delay_secs
    }

    pub(super) fn clear(&mut self) {
        self.node = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    fn tuning() -> InteractionTuning {
        InteractionTuning::default()
    }

    #[test]
    fn hit_inside_radius_returns_node() {
        let positions = [vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let radii = [10.0, 8.0];

        assert_eq!(
            hit_test(vec2(3.0, 4.0), &positions, &radii, 1.0, &tuning()),
            Some(0)
        );
        assert_eq!(
            hit_test(vec2(104.0, 0.0), &positions, &radii, 1.0, &tuning()),
            Some(1)
        );
    }

    #[test]
    fn miss_outside_every_tolerance_ring_returns_none() {
        let positions = [vec2(0.0, 0.0)];
        let radii = [10.0];

        // Radius 10 plus a 6 px tolerance at scale 1.
        assert!(hit_test(vec2(17.0, 0.0), &positions, &radii, 1.0, &tuning()).is_none());
        assert_eq!(
            hit_test(vec2(15.5, 0.0), &positions, &radii, 1.0, &tuning()),
            Some(0)
        );
    }

    #[test]
    fn overlapping_nodes_resolve_to_nearest_center() {
        let positions = [vec2(0.0, 0.0), vec2(12.0, 0.0)];
        let radii = [10.0, 10.0];

        assert_eq!(
            hit_test(vec2(5.0, 0.0), &positions, &radii, 1.0, &tuning()),
            Some(0)
        );
        assert_eq!(
            hit_test(vec2(7.0, 0.0), &positions, &radii, 1.0, &tuning()),
            Some(1)
        );
    }

    #[test]
    fn tolerance_shrinks_in_world_units_when_zoomed_in() {
        let positions = [vec2(0.0, 0.0)];
        let radii = [10.0];

        // 4 world units past the rim: a hit at scale 1, a miss at scale 3.
        assert!(hit_test(vec2(14.0, 0.0), &positions, &radii, 1.0, &tuning()).is_some());
        assert!(hit_test(vec2(14.0, 0.0), &positions, &radii, 3.0, &tuning()).is_none());
    }

    #[test]
    fn small_movement_still_counts_as_click() {
        let mut pointer = PointerTracker::default();
        pointer.press();
        pointer.track(vec2(1.0, 0.0));
        pointer.track(vec2(0.0, 1.5));
        assert!(!pointer.is_dragging(&tuning()));
        assert_eq!(pointer.release(&tuning()), Some(Gesture::Click));
    }

    #[test]
    fn travel_past_threshold_becomes_drag() {
        let mut pointer = PointerTracker::default();
        pointer.press();
        pointer.track(vec2(2.5, 0.0));
        pointer.track(vec2(2.5, 0.0));
        assert!(pointer.is_dragging(&tuning()));
        assert_eq!(pointer.release(&tuning()), Some(Gesture::Drag));
        assert_eq!(pointer.release(&tuning()), None);
    }

    #[test]
    fn tooltip_waits_for_rest_delay() {
        let tuning = tuning();
        let mut hover = HoverState::default();

        hover.update(Some(2), 10.0);
        assert!(!hover.tooltip_ready(10.05, &tuning));
        assert!(hover.tooltip_ready(10.2, &tuning));

        // Moving to another node restarts the clock.
        hover.update(Some(3), 10.2);
        assert!(!hover.tooltip_ready(10.3, &tuning));
        assert!(hover.tooltip_ready(10.4, &tuning));

        hover.clear();
        assert!(!hover.tooltip_ready(99.0, &tuning));
    }
}
