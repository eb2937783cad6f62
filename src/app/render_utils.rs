use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use super::camera::Camera;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn world_to_screen(rect: Rect, camera: &Camera, world: Vec2) -> Pos2 {
    rect.center() + camera.offset + world * camera.scale
}

pub(super) fn screen_to_world(rect: Rect, camera: &Camera, screen: Pos2) -> Vec2 {
    (screen - rect.center() - camera.offset) / camera.scale
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, camera: &Camera) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(15, 19, 26));

    let step = (56.0 * camera.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + camera.offset;
    let grid_stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(52, 62, 74, 60));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            grid_stroke,
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            grid_stroke,
        );
        y += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    #[test]
    fn transforms_invert_each_other() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        let camera = Camera {
            offset: vec2(40.0, -25.0),
            scale: 1.7,
        };

        let world = vec2(120.0, -64.0);
        let screen = world_to_screen(rect, &camera, world);
        let back = screen_to_world(rect, &camera, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn identity_camera_maps_origin_to_center() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        let screen = world_to_screen(rect, &Camera::IDENTITY, Vec2::ZERO);
        assert_eq!(screen, rect.center());
    }

    #[test]
    fn offscreen_circles_are_culled() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(50.0, 50.0), 5.0));
        assert!(circle_visible(rect, pos2(-3.0, 50.0), 5.0));
        assert!(!circle_visible(rect, pos2(-20.0, 50.0), 5.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -10.0), 2.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 2.0));
    }
}
