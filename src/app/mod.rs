use std::collections::{HashMap, VecDeque};

use eframe::egui::{Color32, Context, Pos2, Rect, Vec2, pos2};

use crate::config::Tuning;
use crate::data::Dataset;
use crate::layout;
use crate::util::parse_hex_color;

mod camera;
mod hull;
mod interaction;
mod labels;
mod propagation;
mod render_utils;
mod style;
mod ui;
mod view;

pub struct MarketGraphApp {
    model: ViewModel,
}

impl MarketGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        dataset: Dataset,
        seed: u64,
        tuning: Tuning,
    ) -> Self {
        Self {
            model: ViewModel::new(dataset, tuning, seed),
        }
    }
}

impl eframe::App for MarketGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.show(ctx);
    }
}

/// All mutable state shared between the event handlers, the side panels and
/// the per-frame draw loop. Single-threaded by construction; every frame
/// reads whatever the handlers wrote earlier in the same pass.
struct ViewModel {
    dataset: Dataset,
    graph: RenderGraph,
    tuning: Tuning,
    mode: style::ViewMode,
    camera: camera::CameraController,
    pointer: interaction::PointerTracker,
    hover: interaction::HoverState,
    selected_node: Option<usize>,
    selected_cluster: Option<usize>,
    selected_signal: Option<usize>,
    selected_position: Option<usize>,
    selected_scenario: usize,
    run_state: RunState,
    run_started_secs: Option<f64>,
    progress: f32,
    /// World bounds waiting to be framed once the viewport size is known.
    pending_frame: Option<Rect>,
    search: String,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
    visible_node_count: usize,
    visible_edge_count: usize,
    scratch: ViewScratch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    Complete,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    world_positions: Vec<Vec2>,
    world_radii: Vec<f32>,
}

struct RenderNode {
    node: usize,
    ticker: String,
    world_pos: Vec2,
    radius: f32,
    cluster: Option<usize>,
}

struct RenderEdge {
    edge: usize,
    source: usize,
    target: usize,
    weight: f32,
    confidence: f32,
    intra: bool,
}

impl RenderEdge {
    fn cluster_color(&self, graph: &RenderGraph) -> Option<Color32> {
        let cluster = graph.nodes[self.source].cluster?;
        graph.cluster_colors.get(cluster).copied()
    }
}

/// The laid-out graph: positions frozen after the one-shot simulation, plus
/// the adjacency and lookup tables every frame leans on.
struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_ticker: HashMap<String, usize>,
    neighbors: Vec<Vec<usize>>,
    incident: Vec<Vec<usize>>,
    cluster_colors: Vec<Color32>,
}

impl RenderGraph {
    fn build(dataset: &Dataset, tuning: &Tuning, seed: u64) -> Self {
        let positions = layout::layout(
            &dataset.nodes,
            &dataset.edges,
            &dataset.clusters,
            &tuning.layout,
            seed,
        );
        let assignments = layout::cluster_assignments(&dataset.nodes, &dataset.clusters);

        let nodes = dataset
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| RenderNode {
                node: index,
                ticker: node.ticker.clone(),
                world_pos: positions[index],
                radius: layout::node_radius(node, &tuning.layout),
                cluster: assignments[index],
            })
            .collect::<Vec<_>>();

        let index_by_ticker = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.ticker.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut edges = Vec::new();
        let mut neighbors = vec![Vec::new(); nodes.len()];
        let mut incident = vec![Vec::new(); nodes.len()];
        for (source, target, edge) in layout::resolved_edges(&dataset.nodes, &dataset.edges) {
            let index = edges.len();
            let intra = assignments[source].is_some() && assignments[source] == assignments[target];
            edges.push(RenderEdge {
                edge,
                source,
                target,
                weight: dataset.edges[edge].weight,
                confidence: dataset.edges[edge].confidence,
                intra,
            });
            neighbors[source].push(target);
            neighbors[target].push(source);
            incident[source].push(index);
            incident[target].push(index);
        }

        let cluster_colors = dataset
            .clusters
            .iter()
            .map(|cluster| {
                parse_hex_color(&cluster.color)
                    .map(|[r, g, b]| Color32::from_rgb(r, g, b))
                    .unwrap_or(style::CROSS_EDGE_COLOR)
            })
            .collect();

        Self {
            nodes,
            edges,
            index_by_ticker,
            neighbors,
            incident,
            cluster_colors,
        }
    }

    fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.incident[a].iter().copied().find(|&index| {
            let edge = &self.edges[index];
            (edge.source == a && edge.target == b) || (edge.source == b && edge.target == a)
        })
    }

    /// World-space bounding box of a cluster's member circles.
    fn cluster_bounds(&self, cluster: usize) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for node in self.nodes.iter().filter(|node| node.cluster == Some(cluster)) {
            let rect = Rect::from_center_size(
                pos2(node.world_pos.x, node.world_pos.y),
                Vec2::splat(node.radius * 2.0),
            );
            bounds = Some(match bounds {
                Some(existing) => existing.union(rect),
                None => rect,
            });
        }
        bounds
    }
}

impl ViewModel {
    fn set_mode(&mut self, mode: style::ViewMode) {
        if self.mode == mode {
            return;
        }

        self.mode = mode;
        self.camera.snap_identity();
        self.pending_frame = None;
        self.selected_node = None;
        self.selected_cluster = None;
        self.hover.clear();
        self.reset_run();
    }

    fn on_node_click(&mut self, node: usize) {
        self.selected_node = if self.selected_node == Some(node) {
            None
        } else {
            Some(node)
        };
    }

    fn on_background_click(&mut self) {
        self.selected_node = None;
        if self.selected_cluster.take().is_some() {
            self.camera.reset_target();
        }
        self.pending_frame = None;
    }

    fn select_cluster(&mut self, cluster: Option<usize>) {
        if self.selected_cluster == cluster {
            return;
        }

        self.selected_cluster = cluster;
        self.selected_node = None;
        match cluster.and_then(|cluster| self.graph.cluster_bounds(cluster)) {
            Some(bounds) => self.pending_frame = Some(bounds),
            None => {
                self.pending_frame = None;
                self.camera.reset_target();
            }
        }
    }

    fn select_scenario(&mut self, index: usize) {
        if self.selected_scenario != index {
            self.selected_scenario = index;
            self.reset_run();
        }
    }

    fn start_run(&mut self, now: f64) {
        self.run_state = RunState::Running;
        self.run_started_secs = Some(now);
        self.progress = 0.0;
    }

    fn reset_run(&mut self) {
        self.run_state = RunState::Idle;
        self.run_started_secs = None;
        self.progress = 0.0;
    }

    fn update_progress(&mut self, now: f64) {
        if self.run_state != RunState::Running {
            return;
        }

        let Some(started) = self.run_started_secs else {
            self.reset_run();
            return;
        };

        let duration = self.tuning.render.propagation_duration_secs;
        self.progress = (((now - started) / duration) as f32).clamp(0.0, 1.0);
        if self.progress >= 1.0 {
            self.run_state = RunState::Complete;
        }
    }

    /// Hit-testing reads world positions, which are frozen after layout;
    /// the lookup buffers fill on first use and are reused every frame.
    fn world_lookup(&mut self) -> (&[Vec2], &[f32]) {
        if self.scratch.world_positions.len() != self.graph.nodes.len() {
            self.scratch.world_positions = self
                .graph
                .nodes
                .iter()
                .map(|node| node.world_pos)
                .collect();
            self.scratch.world_radii = self.graph.nodes.iter().map(|node| node.radius).collect();
        }
        (&self.scratch.world_positions, &self.scratch.world_radii)
    }

    /// Resolves the active mode plus selection state into the per-frame
    /// style view consumed by the draw loop.
    fn mode_view(&self) -> style::ModeView {
        match self.mode {
            style::ViewMode::Topology => {
                style::ModeView::topology(&self.graph, self.selected_node, self.selected_cluster)
            }
            style::ViewMode::Propagation => {
                let scenario = (self.run_state != RunState::Idle
                    && self.selected_scenario < self.dataset.scenarios.len())
                .then_some(self.selected_scenario);
                style::ModeView::propagation(
                    &self.graph,
                    &self.dataset,
                    scenario,
                    self.progress,
                    self.run_state == RunState::Running,
                )
            }
            style::ViewMode::Signals => {
                style::ModeView::signals(&self.graph, &self.dataset, self.selected_signal)
            }
            style::ViewMode::Portfolio => style::ModeView::portfolio(&self.graph, &self.dataset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bundled_dataset;

    fn model() -> ViewModel {
        let dataset = bundled_dataset().expect("bundled dataset is valid");
        ViewModel::new(dataset, Tuning::default(), layout::DEFAULT_SEED)
    }

    #[test]
    fn render_graph_indexes_every_node() {
        let model = model();
        assert_eq!(model.graph.nodes.len(), model.dataset.nodes.len());
        for (ticker, &index) in &model.graph.index_by_ticker {
            assert_eq!(&model.graph.nodes[index].ticker, ticker);
        }
    }

    #[test]
    fn edge_between_is_undirected() {
        let model = model();
        let wti = model.graph.index_by_ticker["WTI"];
        let xom = model.graph.index_by_ticker["XOM"];

        let forward = model.graph.edge_between(wti, xom);
        let backward = model.graph.edge_between(xom, wti);
        assert!(forward.is_some());
        assert_eq!(forward, backward);
        assert!(model.graph.edge_between(wti, wti).is_none());
    }

    #[test]
    fn node_click_toggles_selection() {
        let mut model = model();
        model.on_node_click(3);
        assert_eq!(model.selected_node, Some(3));
        model.on_node_click(3);
        assert_eq!(model.selected_node, None);
    }

    #[test]
    fn background_click_clears_selection_and_retargets_camera() {
        let mut model = model();
        model.select_cluster(Some(0));
        assert!(model.pending_frame.is_some());

        model.on_background_click();
        assert_eq!(model.selected_cluster, None);
        assert!(model.pending_frame.is_none());
        assert_eq!(model.camera.target, camera::Camera::IDENTITY);
    }

    #[test]
    fn mode_switch_snaps_camera_and_resets_the_run() {
        let mut model = model();
        model.camera.drag_by(eframe::egui::vec2(80.0, 40.0));
        model.start_run(1.0);
        model.on_node_click(1);

        model.set_mode(style::ViewMode::Propagation);
        assert_eq!(model.camera.current, camera::Camera::IDENTITY);
        assert_eq!(model.run_state, RunState::Idle);
        assert_eq!(model.selected_node, None);
    }

    #[test]
    fn progress_ramps_linearly_and_completes() {
        let mut model = model();
        model.start_run(10.0);

        model.update_progress(12.5);
        assert_eq!(model.run_state, RunState::Running);
        assert!((model.progress - 0.5).abs() < 1e-6);

        model.update_progress(15.0);
        assert_eq!(model.run_state, RunState::Complete);
        assert!((model.progress - 1.0).abs() < 1e-6);

        // Complete latches; time moving on does not restart anything.
        model.update_progress(20.0);
        assert_eq!(model.run_state, RunState::Complete);
    }

    #[test]
    fn world_lookup_fills_once_and_matches_the_graph() {
        let mut model = model();
        let node_count = model.graph.nodes.len();
        let first_pos = model.graph.nodes[0].world_pos;
        let first_radius = model.graph.nodes[0].radius;

        let (positions, radii) = model.world_lookup();
        assert_eq!(positions.len(), node_count);
        assert_eq!(radii.len(), node_count);
        assert_eq!(positions[0], first_pos);
        assert_eq!(radii[0], first_radius);

        // Positions are frozen, so repeated calls reuse the same buffer.
        let buffer = model.world_lookup().0.as_ptr();
        assert_eq!(model.world_lookup().0.as_ptr(), buffer);
    }

    #[test]
    fn cluster_bounds_cover_member_circles() {
        let model = model();
        let bounds = model.graph.cluster_bounds(0).expect("cluster 0 has members");

        for node in &model.graph.nodes {
            if node.cluster == Some(0) {
                let center = pos2(node.world_pos.x, node.world_pos.y);
                assert!(bounds.contains(center));
            }
        }
    }
}
