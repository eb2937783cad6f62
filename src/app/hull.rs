use eframe::egui::Vec2;

/// Convex hull of the member positions, pushed outward from its centroid by
/// `margin` so the outline clears the node circles. Returns `None` when
/// fewer than three distinct non-collinear points exist, in which case no
/// outline is drawn.
pub(super) fn cluster_hull(points: &[Vec2], margin: f32) -> Option<Vec<Vec2>> {
    let hull = convex_hull(points)?;

    let centroid = hull.iter().fold(Vec2::ZERO, |sum, p| sum + *p) / hull.len() as f32;
    let expanded = hull
        .into_iter()
        .map(|point| {
            let away = point - centroid;
            let length = away.length();
            if length < 1e-6 {
                point
            } else {
                point + away * (margin / length)
            }
        })
        .collect();

    Some(expanded)
}

fn cross(origin: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a.x - origin.x) * (b.y - origin.y) - (a.y - origin.y) * (b.x - origin.x)
}

/// Andrew's monotone chain, counterclockwise output.
fn convex_hull(points: &[Vec2]) -> Option<Vec<Vec2>> {
    if points.len() < 3 {
        return None;
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup_by(|a, b| (*a - *b).length() < 1e-6);
    if sorted.len() < 3 {
        return None;
    }

    let mut hull: Vec<Vec2> = Vec::with_capacity(sorted.len() * 2);

    for &point in &sorted {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], point) <= 0.0 {
            hull.pop();
        }
        hull.push(point);
    }

    let lower_len = hull.len() + 1;
    for &point in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], point) <= 0.0
        {
            hull.pop();
        }
        hull.push(point);
    }

    hull.pop();
    if hull.len() < 3 {
        return None;
    }
    Some(hull)
}
