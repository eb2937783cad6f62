use eframe::egui::{Pos2, Rect, Vec2, pos2};

use crate::config::RenderTuning;

/// A label that wants to sit to the right of its node, vertically centered.
pub(super) struct LabelCandidate {
    pub node: usize,
    pub anchor: Pos2,
    pub radius: f32,
    pub size: Vec2,
}

pub(super) struct PlacedLabel {
    pub node: usize,
    pub rect: Rect,
}

/// Greedy single-pass placement. Each label starts at its preferred spot,
/// flips to the other side of the node when it would leave the viewport,
/// then gets pushed below any earlier label it still overlaps. Callers pass
/// candidates most-important first so prominent labels keep their spot.
pub(super) fn place_labels(
    candidates: &[LabelCandidate],
    bounds: Rect,
    tuning: &RenderTuning,
) -> Vec<PlacedLabel> {
    let mut placed: Vec<PlacedLabel> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let size = candidate.size;
        let mut min = pos2(
            candidate.anchor.x + candidate.radius + tuning.label_gap,
            candidate.anchor.y - size.y * 0.5,
        );

        if min.x + size.x > bounds.right() {
            min.x = candidate.anchor.x - candidate.radius - tuning.label_gap - size.x;
        }
        if min.y + size.y > bounds.bottom() {
            min.y = bounds.bottom() - size.y;
        }
        min.x = min.x.max(bounds.left());
        min.y = min.y.max(bounds.top());

        // Push below colliding labels. Restart the scan after each push since
        // the new spot can collide with a label already checked. When the
        // bottom edge leaves no room underneath, slide sideways past the
        // blocker instead.
        let mut rounds = 0;
        let mut index = 0;
        while index < placed.len() {
            let other = placed[index].rect;
            if Rect::from_min_size(min, size).intersects(other) {
                let below = other.bottom() + 1.0;
                if below + size.y <= bounds.bottom() {
                    min.y = below;
                } else {
                    min.y = (bounds.bottom() - size.y).max(bounds.top());
                    min.x = if other.right() + 1.0 + size.x <= bounds.right() {
                        other.right() + 1.0
                    } else {
                        (other.left() - size.x - 1.0).max(bounds.left())
                    };
                }
                rounds += 1;
                if rounds > placed.len() * 2 + 8 {
                    break;
                }
                index = 0;
                continue;
            }
            index += 1;
        }

        // Overlap resolution gives up before it lets a box leave the viewport.
        min.x = min.x.clamp(bounds.left(), (bounds.right() - size.x).max(bounds.left()));
        min.y = min.y.clamp(bounds.top(), (bounds.bottom() - size.y).max(bounds.top()));

        placed.push(PlacedLabel {
            node: candidate.node,
            rect: Rect::from_min_size(min, size),
        });
    }

    placed
}

/// Labels shrink as the camera zooms in so they do not dwarf the nodes, but
/// only down to a readable floor.
pub(super) fn label_font_size(scale: f32, tuning: &RenderTuning) -> f32 {
    (tuning.label_font_base / scale.max(1e-3).sqrt())
        .clamp(tuning.label_font_min, tuning.label_font_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    fn tuning() -> RenderTuning {
        RenderTuning::default()
    }

    fn bounds() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    fn candidate(node: usize, x: f32, y: f32) -> LabelCandidate {
        LabelCandidate {
            node,
            anchor: pos2(x, y),
            radius: 10.0,
            size: vec2(60.0, 16.0),
        }
    }

    #[test]
    fn stacked_anchors_never_overlap() {
        let candidates = vec![
            candidate(0, 200.0, 100.0),
            candidate(1, 202.0, 103.0),
            candidate(2, 198.0, 98.0),
            candidate(3, 205.0, 101.0),
        ];

        let placed = place_labels(&candidates, bounds(), &tuning());
        assert_eq!(placed.len(), 4);
        for (i, a) in placed.iter().enumerate() {
            for b in placed.iter().skip(i + 1) {
                assert!(!a.rect.intersects(b.rect), "{} vs {}", a.node, b.node);
            }
        }
    }

    #[test]
    fn labels_stay_inside_the_viewport() {
        let candidates = vec![
            candidate(0, 5.0, 5.0),
            candidate(1, 795.0, 595.0),
            candidate(2, 400.0, 2.0),
        ];

        let placed = place_labels(&candidates, bounds(), &tuning());
        for label in &placed {
            assert!(bounds().contains_rect(label.rect), "node {}", label.node);
        }
    }

    #[test]
    fn bottom_edge_stack_stays_inside_the_viewport() {
        let candidates = vec![
            candidate(0, 400.0, 592.0),
            candidate(1, 402.0, 595.0),
            candidate(2, 398.0, 596.0),
        ];

        let placed = place_labels(&candidates, bounds(), &tuning());
        assert_eq!(placed.len(), 3);
        for label in &placed {
            assert!(bounds().contains_rect(label.rect), "node {}", label.node);
        }
        for (i, a) in placed.iter().enumerate() {
            for b in placed.iter().skip(i + 1) {
                assert!(!a.rect.intersects(b.rect), "{} vs {}", a.node, b.node);
            }
        }
    }

    #[test]
    fn right_edge_anchor_flips_to_the_left() {
        let candidates = vec![candidate(0, 790.0, 300.0)];
        let placed = place_labels(&candidates, bounds(), &tuning());

        assert!(placed[0].rect.right() < 790.0, "label must sit left of the node");
    }

    #[test]
    fn font_size_tracks_inverse_zoom_with_clamps() {
        let tuning = tuning();

        assert!((label_font_size(1.0, &tuning) - tuning.label_font_base).abs() < 1e-4);
        assert_eq!(label_font_size(6.0, &tuning), tuning.label_font_min);
        assert_eq!(label_font_size(0.3, &tuning), tuning.label_font_max);

        let mid = label_font_size(1.2, &tuning);
        assert!(mid < tuning.label_font_base && mid > tuning.label_font_min);
    }
}
