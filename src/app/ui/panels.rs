use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout, RichText, Sense, Shape, Stroke, Ui, pos2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::config::Tuning;
use crate::data::Dataset;
use crate::util::{format_minutes, format_percent};

use super::super::style::ViewMode;
use super::super::{
    RenderGraph, RunState, ViewModel, ViewScratch, camera, interaction,
};

impl ViewModel {
    const SEARCH_RESULT_ROWS: usize = 8;

    pub(in crate::app) fn new(dataset: Dataset, tuning: Tuning, seed: u64) -> Self {
        let graph = RenderGraph::build(&dataset, &tuning, seed);

        Self {
            dataset,
            graph,
            tuning,
            mode: ViewMode::Topology,
            camera: camera::CameraController::new(),
            pointer: interaction::PointerTracker::default(),
            hover: interaction::HoverState::default(),
            selected_node: None,
            selected_cluster: None,
            selected_signal: None,
            selected_position: None,
            selected_scenario: 0,
            run_state: RunState::Idle,
            run_started_secs: None,
            progress: 0.0,
            pending_frame: None,
            search: String::new(),
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
            visible_node_count: 0,
            visible_edge_count: 0,
            scratch: ViewScratch::default(),
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("marketgraph");
                    ui.separator();
                    for mode in ViewMode::ALL {
                        if ui
                            .selectable_label(self.mode == mode, mode.label())
                            .clicked()
                        {
                            self.set_mode(mode);
                        }
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.checkbox(&mut self.show_fps_bar, "fps");
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                        ui.label(self.visible_graph_text());
                    });
                });
            });

        egui::SidePanel::right("inspector")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| match self.mode {
                    ViewMode::Topology => self.draw_topology_panel(ui),
                    ViewMode::Propagation => self.draw_propagation_panel(ui),
                    ViewMode::Signals => self.draw_signals_panel(ui),
                    ViewMode::Portfolio => self.draw_portfolio_panel(ui),
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    fn draw_topology_panel(&mut self, ui: &mut Ui) {
        ui.heading("Assets");
        ui.add_space(4.0);
        ui.text_edit_singleline(&mut self.search);

        let query = self.search.trim();
        if !query.is_empty() {
            let matcher = SkimMatcherV2::default();
            let mut matches = self
                .graph
                .nodes
                .iter()
                .enumerate()
                .filter_map(|(index, node)| {
                    let record = &self.dataset.nodes[node.node];
                    let haystack = format!("{} {}", record.ticker, record.name);
                    matcher
                        .fuzzy_match(&haystack, query)
                        .map(|score| (score, index))
                })
                .collect::<Vec<_>>();
            matches.sort_by(|a, b| b.0.cmp(&a.0));

            for (_, index) in matches.into_iter().take(Self::SEARCH_RESULT_ROWS) {
                let record = &self.dataset.nodes[self.graph.nodes[index].node];
                let text = format!("{}  {}", record.ticker, record.name);
                if ui
                    .selectable_label(self.selected_node == Some(index), text)
                    .clicked()
                {
                    self.on_node_click(index);
                }
            }
            ui.add_space(6.0);
        }

        ui.separator();
        ui.heading("Clusters");
        ui.add_space(4.0);
        for index in 0..self.dataset.clusters.len() {
            let cluster = &self.dataset.clusters[index];
            let text = format!(
                "{}  ({} assets, density {:.2})",
                cluster.name,
                cluster.members.len(),
                cluster.density
            );
            if ui
                .selectable_label(self.selected_cluster == Some(index), text)
                .clicked()
            {
                let next = (self.selected_cluster != Some(index)).then_some(index);
                self.select_cluster(next);
            }
        }

        self.draw_cluster_density(ui);

        if let Some(index) = self.selected_node {
            let record = &self.dataset.nodes[self.graph.nodes[index].node];
            ui.separator();
            ui.heading(format!("{}  {}", record.ticker, record.name));
            ui.label(format!("1d return: {}", format_percent(record.return_1d)));
            ui.label(format!("sentiment: {:+.2}", record.sentiment));
            ui.label(format!("sector beta: {:.2}", record.sector_beta));
            ui.label(format!(
                "up probability: {:.0}%",
                record.up_probability * 100.0
            ));
            if !record.macro_betas.is_empty() {
                let betas = record
                    .macro_betas
                    .iter()
                    .map(|beta| format!("{beta:.2}"))
                    .collect::<Vec<_>>()
                    .join(" / ");
                ui.label(format!("macro betas: {betas}"));
            }

            if !self.graph.incident[index].is_empty() {
                ui.add_space(4.0);
                ui.label(RichText::new("relationships").strong());
                for &edge_index in &self.graph.incident[index] {
                    let edge = &self.dataset.edges[self.graph.edges[edge_index].edge];
                    ui.label(format!(
                        "{} -> {}  w {:.2}  {}",
                        edge.source,
                        edge.target,
                        edge.weight,
                        format_minutes(edge.lag_minutes)
                    ));
                }
            }
        }
    }

    /// Sparkline of the selected cluster's historical density.
    fn draw_cluster_density(&self, ui: &mut Ui) {
        let Some(index) = self.selected_cluster else {
            return;
        };
        let cluster = &self.dataset.clusters[index];
        if cluster.density_history.len() < 2 {
            return;
        }

        ui.add_space(4.0);
        ui.label(RichText::new("density history").strong());
        let (rect, _) = ui.allocate_exact_size(
            vec2(ui.available_width().min(220.0), 36.0),
            Sense::hover(),
        );
        let painter = ui.painter_at(rect);

        let peak = cluster
            .density_history
            .iter()
            .copied()
            .fold(f32::EPSILON, f32::max);
        let last = (cluster.density_history.len() - 1) as f32;
        let points = cluster
            .density_history
            .iter()
            .enumerate()
            .map(|(i, value)| {
                pos2(
                    rect.left() + rect.width() * i as f32 / last,
                    rect.bottom() - rect.height() * (value / peak),
                )
            })
            .collect::<Vec<_>>();

        let color = self.graph.cluster_colors[index];
        painter.add(Shape::line(points, Stroke::new(1.5, color)));
    }

    fn draw_propagation_panel(&mut self, ui: &mut Ui) {
        ui.heading("Shock scenarios");
        ui.add_space(4.0);

        for index in 0..self.dataset.scenarios.len() {
            let name = self.dataset.scenarios[index].name.clone();
            if ui
                .selectable_label(self.selected_scenario == index, name)
                .clicked()
            {
                self.select_scenario(index);
            }
        }

        let Some(scenario) = self.dataset.scenarios.get(self.selected_scenario) else {
            ui.label("No scenarios in this dataset.");
            return;
        };

        ui.add_space(6.0);
        ui.label(scenario.description.clone());
        let source_name = self
            .dataset
            .node_by_ticker(&scenario.shock.source)
            .map(|node| node.name.as_str())
            .unwrap_or(scenario.shock.source.as_str());
        ui.label(format!(
            "{}  ({}, {})",
            scenario.shock.label,
            source_name,
            format_percent(scenario.shock.magnitude)
        ));

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let run_label = match self.run_state {
                RunState::Idle => "Run propagation",
                RunState::Running => "Running...",
                RunState::Complete => "Run again",
            };
            let now = ui.input(|input| input.time);
            if ui
                .add_enabled(
                    self.run_state != RunState::Running,
                    egui::Button::new(run_label),
                )
                .clicked()
            {
                self.start_run(now);
            }
            if ui.button("Reset").clicked() {
                self.reset_run();
            }
        });

        ui.add_space(4.0);
        ui.add(egui::ProgressBar::new(self.progress).show_percentage());

        if self.run_state == RunState::Complete {
            let result = &self.dataset.scenarios[self.selected_scenario].result;
            ui.add_space(6.0);
            ui.label(format!("nodes impacted: {}", result.nodes_impacted));
            ui.label(format!("average depth: {:.1}", result.average_depth));
            ui.label(format!(
                "propagation time: {}",
                format_minutes(result.max_lag_minutes)
            ));

            if !result.top_impacts.is_empty() {
                ui.add_space(4.0);
                ui.label(RichText::new("top impacts").strong());
                for impact in &result.top_impacts {
                    ui.label(format!(
                        "{}  {}",
                        impact.ticker,
                        format_percent(impact.value)
                    ));
                }
            }
        }
    }

    fn draw_signals_panel(&mut self, ui: &mut Ui) {
        ui.heading("Trading signals");
        ui.add_space(4.0);

        for index in 0..self.dataset.signals.len() {
            let signal = &self.dataset.signals[index];
            let text = format!(
                "{}  {}  ({})",
                signal.side.label(),
                signal.ticker,
                signal.confidence.label()
            );
            if ui
                .selectable_label(self.selected_signal == Some(index), text)
                .clicked()
            {
                self.selected_signal = (self.selected_signal != Some(index)).then_some(index);
            }
        }

        let Some(signal) = self
            .selected_signal
            .and_then(|index| self.dataset.signals.get(index))
        else {
            ui.add_space(6.0);
            ui.label("Select a signal to trace its transmission path.");
            return;
        };

        ui.separator();
        ui.label(format!(
            "expected return: {} -> {}",
            format_percent(signal.expected_return_before),
            format_percent(signal.expected_return_after)
        ));
        ui.label(format!(
            "up probability: {:.0}% -> {:.0}%",
            signal.probability_before * 100.0,
            signal.probability_after * 100.0
        ));

        if !signal.path.is_empty() {
            ui.add_space(4.0);
            ui.label(RichText::new("path").strong());
            for hop in &signal.path {
                ui.label(format!(
                    "{} -> {}  ({} -> {}, {})",
                    hop.source,
                    hop.target,
                    format_percent(hop.input_value),
                    format_percent(hop.output_value),
                    format_minutes(hop.lag_minutes)
                ));
            }
        }

        if !signal.factors.is_empty() {
            ui.add_space(4.0);
            ui.label(RichText::new("factors").strong());
            for factor in &signal.factors {
                ui.label(format!("{}  {:.0}%", factor.name, factor.weight * 100.0));
            }
        }
    }

    fn draw_portfolio_panel(&mut self, ui: &mut Ui) {
        ui.heading("Positions");
        ui.add_space(4.0);

        for index in 0..self.dataset.positions.len() {
            let position = &self.dataset.positions[index];
            let text = format!(
                "{}  {}  {:.0}%  ({})",
                position.side.label(),
                position.ticker,
                position.weight * 100.0,
                position.cluster.as_deref().unwrap_or("unclustered")
            );
            if ui
                .selectable_label(self.selected_position == Some(index), text)
                .clicked()
            {
                self.selected_position = (self.selected_position != Some(index)).then_some(index);
            }
        }

        if let Some(position) = self
            .selected_position
            .and_then(|index| self.dataset.positions.get(index))
            && !position.neighbor_exposures.is_empty()
        {
            ui.add_space(4.0);
            ui.label(RichText::new("correlated exposure").strong());
            for exposure in &position.neighbor_exposures {
                ui.label(format!("{}  {:.0}%", exposure.ticker, exposure.weight * 100.0));
            }
        }

        let risk = &self.dataset.risk;
        if !risk.cluster_exposures.is_empty() {
            ui.separator();
            ui.heading("Cluster exposure");
            for entry in &risk.cluster_exposures {
                let name = self
                    .dataset
                    .cluster_index(&entry.cluster)
                    .map(|index| self.dataset.clusters[index].name.as_str())
                    .unwrap_or(entry.cluster.as_str());
                ui.label(format!("{}  {}", name, format_percent(entry.exposure)));
            }
        }

        if !risk.stress_scenarios.is_empty() {
            ui.add_space(6.0);
            ui.heading("Stress scenarios");
            for entry in &risk.stress_scenarios {
                ui.label(format!("{}  {}", entry.name, format_percent(entry.impact)));
            }
        }
    }
}
