use eframe::egui::{self, Color32, FontId, Pos2, Sense, Shape, Stroke, StrokeKind, Ui, vec2};

use crate::util::{format_market_cap, format_percent};

use super::interaction::{Gesture, hit_test};
use super::labels::{LabelCandidate, label_font_size, place_labels};
use super::render_utils::{
    circle_visible, draw_background, edge_visible, screen_to_world, with_alpha, world_to_screen,
};
use super::style::{ModeView, POSITIVE_COLOR, ViewMode};
use super::{ViewModel, hull};

/// Ambient drift rides intra-cluster edges, but only those the current
/// selection leaves lit; a dimmed edge keeps its particles off too.
fn ambient_particle_edge(view: &ModeView, graph: &super::RenderGraph, index: usize) -> bool {
    if !graph.edges[index].intra {
        return false;
    }
    let style = view.edge_style(graph, index);
    style.visible && style.color.a() >= 60
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let time = ui.ctx().input(|input| input.time);

        self.update_progress(time);
        self.handle_pointer(ui, rect, &response, time);

        // Deferred cluster framing: the world bounds were picked in the side
        // panel, the viewport size is only known here.
        if let Some(bounds) = self.pending_frame.take() {
            self.camera
                .frame_bounds(bounds, rect.size(), &self.tuning.camera);
        }
        if !self.pointer.is_down() {
            self.camera.step(&self.tuning.camera);
        }

        let camera = self.camera.current;
        draw_background(&painter, rect, &camera);

        self.scratch.screen_positions.clear();
        self.scratch.screen_radii.clear();
        for node in &self.graph.nodes {
            self.scratch
                .screen_positions
                .push(world_to_screen(rect, &camera, node.world_pos));
            self.scratch.screen_radii.push(node.radius * camera.scale);
        }

        let view = self.mode_view();
        let graph = &self.graph;
        let dataset = &self.dataset;
        let tuning = &self.tuning;
        let positions = &self.scratch.screen_positions;
        let radii = &self.scratch.screen_radii;
        let hovered = self.hover.node;

        // Hull under everything else, selected cluster only.
        if let Some(cluster) = self.selected_cluster
            && self.mode == ViewMode::Topology
        {
            let members = graph
                .nodes
                .iter()
                .filter(|node| node.cluster == Some(cluster))
                .map(|node| node.world_pos)
                .collect::<Vec<_>>();

            if let Some(outline) = hull::cluster_hull(&members, tuning.render.hull_margin) {
                let points = outline
                    .iter()
                    .map(|point| world_to_screen(rect, &camera, *point))
                    .collect::<Vec<_>>();
                let color = graph.cluster_colors[cluster];
                painter.add(Shape::convex_polygon(
                    points,
                    with_alpha(color, 26),
                    Stroke::new(1.2, with_alpha(color, 120)),
                ));
            }
        }

        let mut visible_edges = 0usize;
        for (index, edge) in graph.edges.iter().enumerate() {
            if !dataset.edges[edge.edge].active {
                continue;
            }

            let style = view.edge_style(graph, index);
            if !style.visible {
                continue;
            }

            let start = positions[edge.source];
            let end = positions[edge.target];
            if !edge_visible(rect, start, end, 4.0) {
                continue;
            }

            let width = (style.width * camera.scale.sqrt()).clamp(0.5, 6.0);
            if style.glow > 0.0 {
                painter.line_segment(
                    [start, end],
                    Stroke::new(
                        width + 3.0,
                        with_alpha(style.color, (style.glow * 60.0) as u8),
                    ),
                );
            }
            painter.line_segment([start, end], Stroke::new(width, style.color));
            visible_edges += 1;
        }
        self.visible_edge_count = visible_edges;

        Self::draw_mode_overlays(&painter, rect, &view, graph, dataset, positions, time, tuning);

        let mut visible_nodes = 0usize;
        for index in 0..graph.nodes.len() {
            let style = view.node_style(graph, dataset, index, hovered, time, &tuning.render);
            let position = positions[index];
            let radius = radii[index] * style.radius_scale;
            if !circle_visible(rect, position, radius + 8.0) {
                continue;
            }
            visible_nodes += 1;

            if style.glow > 0.0 {
                painter.circle_filled(
                    position,
                    radius * 1.6,
                    with_alpha(style.fill, (style.glow * 70.0) as u8),
                );
            }
            painter.circle_filled(position, radius, style.fill);
            if style.outline_width > 0.0 {
                painter.circle_stroke(
                    position,
                    radius + 1.5,
                    Stroke::new(style.outline_width, style.outline),
                );
            }
            if let Some(ring) = &style.ring {
                painter.circle_stroke(
                    position,
                    radius + ring.gap,
                    Stroke::new(ring.width, ring.color),
                );
            }
        }
        self.visible_node_count = visible_nodes;

        self.draw_labels(&painter, rect, &view, hovered);

        if self.hover.tooltip_ready(time, &tuning.interaction) && !self.pointer.is_down() {
            if let Some(index) = hovered {
                Self::draw_tooltip(&painter, rect, positions[index], radii[index], dataset, graph, index);
            }
        }

        // Portfolio is the only still mode; everything else animates.
        let animating = self.mode != ViewMode::Portfolio
            || !self.camera.is_settled()
            || self.pointer.is_down();
        if animating {
            ui.ctx().request_repaint();
        }
    }

    fn handle_pointer(
        &mut self,
        ui: &mut Ui,
        rect: egui::Rect,
        response: &egui::Response,
        time: f64,
    ) {
        let interaction = self.tuning.interaction;

        if response.hovered() {
            let scroll = ui.ctx().input(|input| input.raw_scroll_delta.y);
            if scroll != 0.0
                && let Some(pointer) = response.hover_pos()
            {
                let anchor = pointer - rect.center();
                self.camera
                    .zoom_about(anchor, scroll, &self.tuning.camera);
            }
        }

        let (pressed, released, delta) = ui.ctx().input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.delta(),
            )
        });

        if pressed && response.hovered() {
            self.pointer.press();
        }
        if self.pointer.is_down() {
            self.pointer.track(delta);
            if self.pointer.is_dragging(&interaction) {
                self.camera.drag_by(delta);
                self.hover.clear();
            }
        }

        let camera = self.camera.current;
        let (world_positions, world_radii) = self.world_lookup();
        let hit = response.hover_pos().and_then(|pointer| {
            let world = screen_to_world(rect, &camera, pointer);
            hit_test(world, world_positions, world_radii, camera.scale, &interaction)
        });

        if !self.pointer.is_dragging(&interaction) {
            self.hover.update(hit, time);
            if hit.is_some() {
                ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
            }
        }

        if released
            && let Some(gesture) = self.pointer.release(&interaction)
            && gesture == Gesture::Click
        {
            match hit {
                Some(index) => self.on_node_click(index),
                None => self.on_background_click(),
            }
        }
    }

    /// Mode-specific animated decoration drawn between edges and nodes:
    /// ambient drift in topology, traveling pulses and flow particles in
    /// propagation, directional particles along a signal path, dashed
    /// connectors in portfolio.
    fn draw_mode_overlays(
        painter: &egui::Painter,
        rect: egui::Rect,
        view: &ModeView,
        graph: &super::RenderGraph,
        dataset: &crate::data::Dataset,
        positions: &[Pos2],
        time: f64,
        tuning: &crate::config::Tuning,
    ) {
        match view {
            ModeView::Topology { .. } => {
                for (index, edge) in graph.edges.iter().enumerate() {
                    if !ambient_particle_edge(view, graph, index) {
                        continue;
                    }
                    let start = positions[edge.source];
                    let end = positions[edge.target];
                    if !edge_visible(rect, start, end, 4.0) {
                        continue;
                    }

                    let phase = index as f64 * 0.37;
                    let mut fraction =
                        ((time * tuning.render.ambient_particle_rate + phase).fract()) as f32;
                    if dataset.edges[edge.edge].direction.sign() < 0.0 {
                        fraction = 1.0 - fraction;
                    }
                    let point = start + (end - start) * fraction;
                    let color = edge
                        .cluster_color(graph)
                        .unwrap_or(super::style::CROSS_EDGE_COLOR);
                    painter.circle_filled(point, 1.6, with_alpha(color, 120));
                }
            }
            ModeView::Propagation(Some(view)) => {
                for hop in &view.hops {
                    let (Some(source), Some(target)) = (hop.source, hop.target) else {
                        continue;
                    };
                    if view.progress < hop.reveal {
                        continue;
                    }

                    let start = positions[source];
                    let end = positions[target];
                    let color = super::style::signed_color(hop.value);

                    if hop.travel < 1.0 {
                        // The glowing dot carrying the shock along the edge.
                        let point = start + (end - start) * hop.travel;
                        painter.circle_filled(point, 5.0, with_alpha(color, 70));
                        painter.circle_filled(point, 3.0, color);
                    } else {
                        for lane in 0..2 {
                            let phase = lane as f64 * 0.5;
                            let fraction = ((time * tuning.render.flow_particle_rate + phase)
                                .fract()) as f32;
                            let point = start + (end - start) * fraction;
                            painter.circle_filled(point, 1.8, with_alpha(color, 160));
                        }
                    }
                }
            }
            ModeView::Signals(Some(view)) => {
                let color = super::style::side_color(view.side);
                for &index in &view.edges {
                    let edge = &graph.edges[index];
                    let start = positions[edge.source];
                    let end = positions[edge.target];
                    for lane in 0..2 {
                        let phase = lane as f64 * 0.5;
                        let fraction =
                            ((time * tuning.render.flow_particle_rate + phase).fract()) as f32;
                        let point = start + (end - start) * fraction;
                        painter.circle_filled(point, 1.8, with_alpha(color, 170));
                    }
                }
            }
            ModeView::Portfolio { connectors, .. } => {
                for &(a, b) in connectors {
                    let start = positions[a];
                    let end = positions[b];
                    if !edge_visible(rect, start, end, 4.0) {
                        continue;
                    }
                    painter.extend(Shape::dashed_line(
                        &[start, end],
                        Stroke::new(1.2, with_alpha(POSITIVE_COLOR, 110)),
                        6.0,
                        5.0,
                    ));
                }
            }
            _ => {}
        }
    }

    fn draw_labels(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        view: &ModeView,
        hovered: Option<usize>,
    ) {
        let render = &self.tuning.render;
        let font = FontId::proportional(label_font_size(self.camera.current.scale, render));
        let pad = vec2(render.label_pad_x, render.label_pad_y);

        let mut entries = Vec::new();
        for (index, node) in self.graph.nodes.iter().enumerate() {
            let position = self.scratch.screen_positions[index];
            let radius = self.scratch.screen_radii[index];
            if !circle_visible(rect, position, radius + 40.0) {
                continue;
            }
            if !view.label_worthy(&self.graph, &self.dataset, index, hovered, radius, render) {
                continue;
            }

            let galley = painter.layout_no_wrap(
                node.ticker.clone(),
                font.clone(),
                Color32::from_gray(235),
            );
            let size = galley.size() + pad * 2.0;
            entries.push((
                LabelCandidate {
                    node: index,
                    anchor: position,
                    radius,
                    size,
                },
                galley,
            ));
        }

        // Most prominent first so important labels keep their spot.
        entries.sort_by(|a, b| {
            let key = |entry: &(LabelCandidate, _)| {
                let priority = hovered == Some(entry.0.node)
                    || self.selected_node == Some(entry.0.node);
                (priority, entry.0.radius)
            };
            key(b).partial_cmp(&key(a)).unwrap_or(std::cmp::Ordering::Equal)
        });

        let (candidates, galleys): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let placed = place_labels(&candidates, rect, render);

        for (label, galley) in placed.iter().zip(galleys) {
            painter.rect_filled(
                label.rect,
                3.0,
                Color32::from_rgba_unmultiplied(10, 14, 20, 200),
            );
            painter.galley(label.rect.min + pad, galley, Color32::from_gray(235));
        }
    }

    fn draw_tooltip(
        painter: &egui::Painter,
        rect: egui::Rect,
        position: Pos2,
        radius: f32,
        dataset: &crate::data::Dataset,
        graph: &super::RenderGraph,
        index: usize,
    ) {
        let record = &dataset.nodes[graph.nodes[index].node];
        let mut lines = vec![format!("{}  {}", record.ticker, record.name)];
        if let Some(cap) = record.market_cap {
            lines.push(format!("mkt cap {}", format_market_cap(cap)));
        }
        lines.push(format!(
            "1d {}  sentiment {:+.2}",
            format_percent(record.return_1d),
            record.sentiment
        ));
        let text = lines.join("\n");

        let galley = painter.layout_no_wrap(
            text,
            FontId::proportional(12.0),
            Color32::from_gray(235),
        );
        let pad = vec2(8.0, 6.0);
        let size = galley.size() + pad * 2.0;

        let mut corner = position + vec2(radius + 12.0, -size.y * 0.5);
        corner.x = corner.x.min(rect.right() - size.x);
        corner.y = corner.y.clamp(rect.top(), rect.bottom() - size.y);

        let plate = egui::Rect::from_min_size(corner, size);
        painter.rect_filled(plate, 4.0, Color32::from_rgba_unmultiplied(16, 21, 30, 235));
        painter.rect_stroke(
            plate,
            4.0,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(90, 104, 120, 160)),
            StrokeKind::Outside,
        );
        painter.galley(plate.min + pad, galley, Color32::from_gray(235));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RenderGraph;
    use crate::config::Tuning;
    use crate::data::bundled_dataset;

    #[test]
    fn selection_dimming_silences_ambient_particles() {
        let dataset = bundled_dataset().expect("bundled dataset is valid");
        let tuning = Tuning::default();
        let graph = RenderGraph::build(&dataset, &tuning, crate::layout::DEFAULT_SEED);

        let intra = graph
            .edges
            .iter()
            .position(|edge| edge.intra)
            .expect("bundled data has an intra-cluster edge");

        let idle = ModeView::topology(&graph, None, None);
        assert!(ambient_particle_edge(&idle, &graph, intra));

        let outsider = (0..graph.nodes.len())
            .find(|&node| !graph.incident[node].contains(&intra))
            .expect("some node avoids the edge");
        let selected = ModeView::topology(&graph, Some(outsider), None);
        assert!(!ambient_particle_edge(&selected, &graph, intra));
    }

    #[test]
    fn cross_cluster_edges_never_carry_ambient_particles() {
        let dataset = bundled_dataset().expect("bundled dataset is valid");
        let tuning = Tuning::default();
        let graph = RenderGraph::build(&dataset, &tuning, crate::layout::DEFAULT_SEED);

        let cross = graph
            .edges
            .iter()
            .position(|edge| !edge.intra)
            .expect("bundled data has a cross-cluster edge");

        let idle = ModeView::topology(&graph, None, None);
        assert!(!ambient_particle_edge(&idle, &graph, cross));
    }
}
