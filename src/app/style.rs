//! Per-mode styling. `ModeView` is resolved once per frame from the current
//! selection and animation state; the draw loop then asks it for an
//! `EdgeStyle`/`NodeStyle` per element and stays mode-agnostic.

use std::collections::{HashMap, HashSet};

use eframe::egui::Color32;

use crate::config::RenderTuning;
use crate::data::{Dataset, NodeKind, TradeSide};

use super::render_utils::{blend_color, dim_color, with_alpha};
use super::{RenderGraph, propagation};

pub(super) const POSITIVE_COLOR: Color32 = Color32::from_rgb(34, 197, 94);
pub(super) const NEGATIVE_COLOR: Color32 = Color32::from_rgb(239, 68, 68);
pub(super) const MACRO_COLOR: Color32 = Color32::from_rgb(148, 163, 184);
pub(super) const CROSS_EDGE_COLOR: Color32 = Color32::from_rgb(100, 112, 126);
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

pub(super) fn signed_color(value: f32) -> Color32 {
    if value >= 0.0 {
        POSITIVE_COLOR
    } else {
        NEGATIVE_COLOR
    }
}

pub(super) fn side_color(side: TradeSide) -> Color32 {
    match side {
        TradeSide::Long => POSITIVE_COLOR,
        TradeSide::Short => NEGATIVE_COLOR,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ViewMode {
    Topology,
    Propagation,
    Signals,
    Portfolio,
}

impl ViewMode {
    pub(super) const ALL: [Self; 4] = [
        Self::Topology,
        Self::Propagation,
        Self::Signals,
        Self::Portfolio,
    ];

    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Topology => "Topology",
            Self::Propagation => "Propagation",
            Self::Signals => "Signals",
            Self::Portfolio => "Portfolio",
        }
    }
}

pub(super) struct EdgeStyle {
    pub visible: bool,
    pub color: Color32,
    pub width: f32,
    pub glow: f32,
}

impl EdgeStyle {
    fn hidden() -> Self {
        Self {
            visible: false,
            color: Color32::TRANSPARENT,
            width: 0.0,
            glow: 0.0,
        }
    }

    fn solid(color: Color32, width: f32) -> Self {
        Self {
            visible: true,
            color,
            width,
            glow: 0.0,
        }
    }
}

pub(super) struct NodeStyle {
    pub fill: Color32,
    pub outline: Color32,
    pub outline_width: f32,
    pub radius_scale: f32,
    pub glow: f32,
    pub ring: Option<Ring>,
}

pub(super) struct Ring {
    pub color: Color32,
    pub width: f32,
    pub gap: f32,
}

impl NodeStyle {
    fn plain(fill: Color32) -> Self {
        Self {
            fill,
            outline: Color32::TRANSPARENT,
            outline_width: 0.0,
            radius_scale: 1.0,
            glow: 0.0,
            ring: None,
        }
    }
}

/// One hop of the active scenario resolved against the render graph. Index
/// lookups that fail leave `None` and the hop is simply not drawn.
pub(super) struct HopView {
    pub source: Option<usize>,
    pub target: Option<usize>,
    pub edge: Option<usize>,
    pub reveal: f32,
    pub travel: f32,
    pub value: f32,
}

pub(super) struct PropagationView {
    pub source: Option<usize>,
    pub hops: Vec<HopView>,
    pub arrivals: HashMap<usize, (f32, f32)>,
    pub progress: f32,
    pub active: bool,
}

pub(super) struct SignalPathView {
    pub nodes: HashSet<usize>,
    pub edges: HashSet<usize>,
    pub terminal: Option<usize>,
    pub side: TradeSide,
}

pub(super) enum ModeView {
    Topology {
        selected: Option<usize>,
        neighbors: HashSet<usize>,
        incident: HashSet<usize>,
        cluster: Option<usize>,
        member_mask: Vec<bool>,
    },
    Propagation(Option<PropagationView>),
    Signals(Option<SignalPathView>),
    Portfolio {
        held: HashMap<usize, (TradeSide, f32)>,
        connectors: Vec<(usize, usize)>,
    },
}

impl ModeView {
    pub(super) fn topology(
        graph: &RenderGraph,
        selected: Option<usize>,
        cluster: Option<usize>,
    ) -> Self {
        let mut neighbors = HashSet::new();
        let mut incident = HashSet::new();
        if let Some(index) = selected {
            neighbors.extend(graph.neighbors[index].iter().copied());
            incident.extend(graph.incident[index].iter().copied());
        }

        let member_mask = match cluster {
            Some(cluster) => graph
                .nodes
                .iter()
                .map(|node| node.cluster == Some(cluster))
                .collect(),
            None => vec![false; graph.nodes.len()],
        };

        Self::Topology {
            selected,
            neighbors,
            incident,
            cluster,
            member_mask,
        }
    }

    pub(super) fn propagation(
        graph: &RenderGraph,
        dataset: &Dataset,
        scenario: Option<usize>,
        progress: f32,
        active: bool,
    ) -> Self {
        let Some(scenario) = scenario.and_then(|index| dataset.scenarios.get(index)) else {
            return Self::Propagation(None);
        };

        let result = &scenario.result;
        let hops = result
            .hops
            .iter()
            .map(|hop| {
                let source = graph.index_by_ticker.get(hop.source.as_str()).copied();
                let target = graph.index_by_ticker.get(hop.target.as_str()).copied();
                let edge = match (source, target) {
                    (Some(a), Some(b)) => graph.edge_between(a, b),
                    _ => None,
                };
                HopView {
                    source,
                    target,
                    edge,
                    reveal: propagation::reveal_fraction(hop, result.max_lag_minutes),
                    travel: propagation::hop_travel(hop, result.max_lag_minutes, progress),
                    value: hop.output_value,
                }
            })
            .collect();

        let arrivals = propagation::arrived_impacts(result, progress)
            .into_iter()
            .filter_map(|(ticker, value)| {
                let index = graph.index_by_ticker.get(ticker).copied()?;
                let arrival = result
                    .hops
                    .iter()
                    .filter(|hop| hop.target == ticker)
                    .map(|hop| propagation::arrival_fraction(hop, result.max_lag_minutes))
                    .min_by(f32::total_cmp)?;
                Some((index, (arrival, value)))
            })
            .collect();

        Self::Propagation(Some(PropagationView {
            source: graph
                .index_by_ticker
                .get(scenario.shock.source.as_str())
                .copied(),
            hops,
            arrivals,
            progress,
            active,
        }))
    }

    pub(super) fn signals(graph: &RenderGraph, dataset: &Dataset, signal: Option<usize>) -> Self {
        let Some(signal) = signal.and_then(|index| dataset.signals.get(index)) else {
            return Self::Signals(None);
        };

        let mut nodes = HashSet::new();
        let mut edges = HashSet::new();
        for hop in &signal.path {
            let source = graph.index_by_ticker.get(hop.source.as_str()).copied();
            let target = graph.index_by_ticker.get(hop.target.as_str()).copied();
            nodes.extend(source);
            nodes.extend(target);
            if let (Some(a), Some(b)) = (source, target) {
                edges.extend(graph.edge_between(a, b));
            }
        }

        Self::Signals(Some(SignalPathView {
            nodes,
            edges,
            terminal: graph.index_by_ticker.get(signal.ticker.as_str()).copied(),
            side: signal.side,
        }))
    }

    pub(super) fn portfolio(graph: &RenderGraph, dataset: &Dataset) -> Self {
        let mut held = HashMap::new();
        for position in &dataset.positions {
            if let Some(index) = graph.index_by_ticker.get(position.ticker.as_str()) {
                held.insert(*index, (position.side, position.weight));
            }
        }

        // Same-cluster pairs without a modeled edge get a dashed connector.
        let mut connectors = Vec::new();
        let indices: Vec<usize> = held.keys().copied().collect();
        for (i, &a) in indices.iter().enumerate() {
            for &b in &indices[i + 1..] {
                let same_cluster = graph.nodes[a].cluster.is_some()
                    && graph.nodes[a].cluster == graph.nodes[b].cluster;
                if same_cluster && graph.edge_between(a, b).is_none() {
                    connectors.push((a.min(b), a.max(b)));
                }
            }
        }

        Self::Portfolio { held, connectors }
    }

    pub(super) fn has_selection(&self) -> bool {
        match self {
            Self::Topology {
                selected, cluster, ..
            } => selected.is_some() || cluster.is_some(),
            Self::Propagation(view) => view.is_some(),
            Self::Signals(view) => view.is_some(),
            Self::Portfolio { .. } => false,
        }
    }

    pub(super) fn edge_style(&self, graph: &RenderGraph, edge_index: usize) -> EdgeStyle {
        let edge = &graph.edges[edge_index];
        // Low-confidence relationships fade into the background.
        let base_alpha = (70.0 + edge.confidence * 60.0) as u8;
        let base_color = if edge.intra {
            edge.cluster_color(graph)
                .map(|color| with_alpha(color, base_alpha))
                .unwrap_or(with_alpha(CROSS_EDGE_COLOR, base_alpha))
        } else {
            with_alpha(CROSS_EDGE_COLOR, base_alpha)
        };
        let base_width = 0.8 + edge.weight * 1.8;

        match self {
            Self::Topology {
                selected,
                incident,
                cluster,
                member_mask,
                ..
            } => {
                if selected.is_some() {
                    if incident.contains(&edge_index) {
                        let mut style = EdgeStyle::solid(with_alpha(base_color, 230), base_width + 1.0);
                        style.glow = 0.5;
                        style
                    } else {
                        EdgeStyle::solid(with_alpha(base_color, 28), base_width * 0.7)
                    }
                } else if cluster.is_some() {
                    let inside =
                        member_mask[edge.source] && member_mask[edge.target];
                    if inside {
                        EdgeStyle::solid(with_alpha(base_color, 200), base_width + 0.6)
                    } else {
                        EdgeStyle::solid(with_alpha(base_color, 30), base_width * 0.7)
                    }
                } else {
                    EdgeStyle::solid(base_color, base_width)
                }
            }
            Self::Propagation(view) => {
                let Some(view) = view else {
                    return EdgeStyle::solid(with_alpha(base_color, 40), base_width * 0.8);
                };

                let hop = view
                    .hops
                    .iter()
                    .find(|hop| hop.edge == Some(edge_index) && view.progress >= hop.reveal);
                match hop {
                    Some(hop) => {
                        let color = signed_color(hop.value);
                        let traveling = hop.travel < 1.0;
                        let mut style =
                            EdgeStyle::solid(with_alpha(color, 215), base_width + 1.2);
                        style.glow = if traveling { 0.9 } else { 0.35 };
                        style
                    }
                    None => EdgeStyle::solid(with_alpha(base_color, 26), base_width * 0.7),
                }
            }
            Self::Signals(view) => {
                let Some(view) = view else {
                    return EdgeStyle::solid(with_alpha(base_color, 40), base_width * 0.8);
                };

                if view.edges.contains(&edge_index) {
                    let mut style =
                        EdgeStyle::solid(with_alpha(side_color(view.side), 220), base_width + 1.2);
                    style.glow = 0.7;
                    style
                } else {
                    EdgeStyle::solid(
                        with_alpha(dim_color(base_color, 0.5), 20),
                        base_width * 0.6,
                    )
                }
            }
            Self::Portfolio { held, .. } => {
                let both_held =
                    held.contains_key(&edge.source) && held.contains_key(&edge.target);
                if !both_held {
                    return EdgeStyle::hidden();
                }
                let alpha = if edge.intra { 190 } else { 110 };
                EdgeStyle::solid(with_alpha(base_color, alpha), base_width)
            }
        }
    }

    pub(super) fn node_style(
        &self,
        graph: &RenderGraph,
        dataset: &Dataset,
        node_index: usize,
        hovered: Option<usize>,
        time: f64,
        tuning: &RenderTuning,
    ) -> NodeStyle {
        let render_node = &graph.nodes[node_index];
        let record = &dataset.nodes[render_node.node];
        let base_fill = match render_node.cluster {
            Some(cluster) => graph.cluster_colors[cluster],
            None if record.kind == NodeKind::Macro => MACRO_COLOR,
            None => CROSS_EDGE_COLOR,
        };

        let mut style = match self {
            Self::Topology {
                selected,
                neighbors,
                cluster,
                member_mask,
                ..
            } => {
                let mut style = NodeStyle::plain(base_fill);

                if let Some(selected) = *selected {
                    if selected == node_index {
                        style.outline = SELECTED_COLOR;
                        style.outline_width = 2.5;
                        style.glow = 0.6;
                    } else if !neighbors.contains(&node_index) {
                        style.fill = dim_color(style.fill, 0.35);
                    }
                } else if cluster.is_some() {
                    if !member_mask[node_index] {
                        style.fill = dim_color(style.fill, 0.35);
                    }
                } else {
                    // Idle view: breathing plus a faint 1-day return ring.
                    let phase = (render_node.world_pos.x * 0.013
                        + render_node.world_pos.y * 0.017) as f64;
                    let wave = (time * tuning.breathing_rate + phase).sin() as f32;
                    style.radius_scale = 1.0 + tuning.breathing_amplitude * wave;

                    if record.return_1d != 0.0 {
                        style.ring = Some(Ring {
                            color: with_alpha(signed_color(record.return_1d), 90),
                            width: (1.0 + record.return_1d.abs() * 60.0).min(3.5),
                            gap: 3.0,
                        });
                    }
                }
                style
            }
            Self::Propagation(view) => {
                let Some(view) = view else {
                    return NodeStyle::plain(dim_color(base_fill, 0.7));
                };

                if view.source == Some(node_index) {
                    let mut style = NodeStyle::plain(SELECTED_COLOR);
                    if view.active {
                        style.radius_scale = 1.0 + 0.12 * (time * 4.0).sin() as f32;
                        style.glow = 0.8;
                    }
                    style
                } else if let Some((arrival, value)) = view.arrivals.get(&node_index) {
                    let age = (view.progress - arrival).max(0.0);
                    let flash = (1.0 - age * 6.0).clamp(0.0, 1.0);
                    let mut style = NodeStyle::plain(signed_color(*value));
                    style.radius_scale = 1.0 + 0.3 * flash;
                    style.glow = 0.3 + 0.7 * flash;
                    style
                } else {
                    NodeStyle::plain(dim_color(base_fill, 0.4))
                }
            }
            Self::Signals(view) => {
                let Some(view) = view else {
                    return NodeStyle::plain(dim_color(base_fill, 0.7));
                };

                if view.nodes.contains(&node_index) {
                    let mut style = NodeStyle::plain(base_fill);
                    style.glow = 0.5;
                    if view.terminal == Some(node_index) {
                        style.ring = Some(Ring {
                            color: side_color(view.side),
                            width: 2.5,
                            gap: 3.5,
                        });
                    }
                    style
                } else {
                    NodeStyle::plain(dim_color(blend_color(base_fill, CROSS_EDGE_COLOR, 0.5), 0.35))
                }
            }
            Self::Portfolio { held, .. } => match held.get(&node_index) {
                Some((side, weight)) => {
                    let mut style = NodeStyle::plain(side_color(*side));
                    style.radius_scale = 1.0 + weight * 2.5;
                    style.glow = 0.3;
                    style
                }
                None => NodeStyle::plain(dim_color(base_fill, 0.3)),
            },
        };

        if hovered == Some(node_index) && !self.has_selection() {
            style.fill = blend_color(style.fill, Color32::WHITE, 0.25);
        }
        style
    }

    /// Whether a node's label should be offered to the placement pass.
    pub(super) fn label_worthy(
        &self,
        graph: &RenderGraph,
        dataset: &Dataset,
        node_index: usize,
        hovered: Option<usize>,
        screen_radius: f32,
        tuning: &RenderTuning,
    ) -> bool {
        if hovered == Some(node_index) {
            return true;
        }

        match self {
            Self::Topology {
                selected,
                neighbors,
                cluster,
                member_mask,
                ..
            } => {
                if let Some(selected) = *selected {
                    return selected == node_index || neighbors.contains(&node_index);
                }
                if cluster.is_some() {
                    return member_mask[node_index];
                }
                let record = &dataset.nodes[graph.nodes[node_index].node];
                record.kind != NodeKind::Stock || screen_radius >= tuning.label_min_screen_radius
            }
            Self::Propagation(view) => view.as_ref().is_some_and(|view| {
                view.source == Some(node_index) || view.arrivals.contains_key(&node_index)
            }),
            Self::Signals(view) => view
                .as_ref()
                .is_some_and(|view| view.nodes.contains(&node_index)),
            Self::Portfolio { held, .. } => held.contains_key(&node_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::data::bundled_dataset;

    fn graph_and_dataset() -> (RenderGraph, Dataset) {
        let dataset = bundled_dataset().expect("bundled dataset is valid");
        let tuning = Tuning::default();
        let graph = RenderGraph::build(&dataset, &tuning, crate::layout::DEFAULT_SEED);
        (graph, dataset)
    }

    #[test]
    fn topology_selection_dims_non_neighbors() {
        let (graph, dataset) = graph_and_dataset();
        let tuning = Tuning::default();

        let wti = graph.index_by_ticker["WTI"];
        let view = ModeView::topology(&graph, Some(wti), None);

        let xom = graph.index_by_ticker["XOM"];
        let aapl = graph.index_by_ticker["AAPL"];

        let xom_style = view.node_style(&graph, &dataset, xom, None, 0.0, &tuning.render);
        let aapl_style = view.node_style(&graph, &dataset, aapl, None, 0.0, &tuning.render);
        assert!(aapl_style.fill.a() < xom_style.fill.a(), "off-path node is dimmed");

        let selected = view.node_style(&graph, &dataset, wti, None, 0.0, &tuning.render);
        assert_eq!(selected.outline, SELECTED_COLOR);
    }

    #[test]
    fn topology_incident_edges_outshine_the_rest() {
        let (graph, _) = graph_and_dataset();
        let wti = graph.index_by_ticker["WTI"];
        let view = ModeView::topology(&graph, Some(wti), None);

        let incident = graph.incident[wti][0];
        let other = (0..graph.edges.len())
            .find(|index| !graph.incident[wti].contains(index))
            .expect("some edge avoids WTI");

        let bright = view.edge_style(&graph, incident);
        let dim = view.edge_style(&graph, other);
        assert!(bright.color.a() > dim.color.a());
        assert!(bright.width > dim.width);
    }

    #[test]
    fn propagation_edges_reveal_with_progress() {
        let (graph, dataset) = graph_and_dataset();
        let scenario = dataset
            .scenarios
            .iter()
            .position(|scenario| scenario.id == "oil-shock");

        // WTI -> DAL path: JETS -> DAL departs at 35/60 of the window.
        let jets = graph.index_by_ticker["JETS"];
        let dal = graph.index_by_ticker["DAL"];
        let edge = graph.edge_between(jets, dal).expect("JETS-DAL edge");

        let early = ModeView::propagation(&graph, &dataset, scenario, 0.2, true);
        let late = ModeView::propagation(&graph, &dataset, scenario, 0.9, true);

        assert_eq!(early.edge_style(&graph, edge).glow, 0.0);
        assert!(late.edge_style(&graph, edge).glow > 0.0);
    }

    #[test]
    fn propagation_arrived_nodes_take_the_impact_sign() {
        let (graph, dataset) = graph_and_dataset();
        let tuning = Tuning::default();
        let scenario = dataset
            .scenarios
            .iter()
            .position(|scenario| scenario.id == "oil-shock");

        let view = ModeView::propagation(&graph, &dataset, scenario, 1.0, false);
        let jets = graph.index_by_ticker["JETS"];
        let xom = graph.index_by_ticker["XOM"];

        let jets_style = view.node_style(&graph, &dataset, jets, None, 0.0, &tuning.render);
        let xom_style = view.node_style(&graph, &dataset, xom, None, 0.0, &tuning.render);
        assert_eq!(jets_style.fill, NEGATIVE_COLOR);
        assert_eq!(xom_style.fill, POSITIVE_COLOR);
    }

    #[test]
    fn signal_terminal_gets_a_side_colored_ring() {
        let (graph, dataset) = graph_and_dataset();
        let tuning = Tuning::default();
        let index = dataset
            .signals
            .iter()
            .position(|signal| signal.id == "sig-jets")
            .expect("short JETS signal");

        let view = ModeView::signals(&graph, &dataset, Some(index));
        let jets = graph.index_by_ticker["JETS"];

        let style = view.node_style(&graph, &dataset, jets, None, 0.0, &tuning.render);
        let ring = style.ring.expect("terminal ring");
        assert_eq!(ring.color, NEGATIVE_COLOR);
    }

    #[test]
    fn portfolio_hides_edges_to_unheld_nodes() {
        let (graph, dataset) = graph_and_dataset();
        let view = ModeView::portfolio(&graph, &dataset);

        let held: HashSet<&str> = dataset
            .positions
            .iter()
            .map(|position| position.ticker.as_str())
            .collect();

        for (index, edge) in graph.edges.iter().enumerate() {
            let style = view.edge_style(&graph, index);
            let source = graph.nodes[edge.source].ticker.as_str();
            let target = graph.nodes[edge.target].ticker.as_str();
            let both_held = held.contains(source) && held.contains(target);
            assert_eq!(style.visible, both_held, "{source} -> {target}");
        }
    }

    #[test]
    fn portfolio_connects_same_cluster_positions_without_an_edge() {
        let (graph, dataset) = graph_and_dataset();
        let view = ModeView::portfolio(&graph, &dataset);

        let ModeView::Portfolio { connectors, .. } = &view else {
            unreachable!()
        };

        // XOM and SLB sit in the energy cluster with no modeled edge.
        let xom = graph.index_by_ticker["XOM"];
        let slb = graph.index_by_ticker["SLB"];
        let pair = (xom.min(slb), xom.max(slb));
        assert!(connectors.contains(&pair));
    }

    #[test]
    fn hover_brightening_yields_to_selection() {
        let (graph, dataset) = graph_and_dataset();
        let tuning = Tuning::default();
        let wti = graph.index_by_ticker["WTI"];
        let aapl = graph.index_by_ticker["AAPL"];

        let idle = ModeView::topology(&graph, None, None);
        let plain = idle.node_style(&graph, &dataset, aapl, None, 0.0, &tuning.render);
        let hovered = idle.node_style(&graph, &dataset, aapl, Some(aapl), 0.0, &tuning.render);
        assert_ne!(plain.fill, hovered.fill);

        let selected = ModeView::topology(&graph, Some(wti), None);
        let plain = selected.node_style(&graph, &dataset, aapl, None, 0.0, &tuning.render);
        let hovered = selected.node_style(&graph, &dataset, aapl, Some(aapl), 0.0, &tuning.render);
        assert_eq!(plain.fill, hovered.fill, "selection overrides hover styling");
    }

    #[test]
    fn hovered_nodes_are_always_label_worthy() {
        let (graph, dataset) = graph_and_dataset();
        let tuning = Tuning::default();
        let wti = graph.index_by_ticker["WTI"];
        let aapl = graph.index_by_ticker["AAPL"];

        let view = ModeView::topology(&graph, Some(wti), None);
        assert!(view.label_worthy(&graph, &dataset, aapl, Some(aapl), 5.0, &tuning.render));
        assert!(!view.label_worthy(&graph, &dataset, aapl, None, 5.0, &tuning.render));
    }
}
