//! The static dataset consumed by the visualizer: nodes, edges, clusters,
//! shock scenarios, trading signals and portfolio records. All records are
//! immutable input; nothing here is computed by the engine.

mod load;

pub use load::{bundled_dataset, load_dataset};

use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Stock,
    Etf,
    Macro,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub ticker: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub cluster: Option<String>,
    /// Absent for macro factors.
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub centrality: f32,
    #[serde(default)]
    pub sector_beta: f32,
    #[serde(default)]
    pub macro_betas: Vec<f32>,
    #[serde(default)]
    pub sentiment: f32,
    #[serde(default)]
    pub return_1d: f32,
    #[serde(default)]
    pub up_probability: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    Positive,
    Negative,
}

impl EdgeDirection {
    pub fn sign(self) -> f32 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: f32,
    pub lag_minutes: f32,
    pub direction: EdgeDirection,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    #[serde(default)]
    pub density: f32,
    /// `#rrggbb`.
    pub color: String,
    #[serde(default)]
    pub density_history: Vec<f32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Shock {
    pub source: String,
    pub magnitude: f32,
    pub label: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PropagationHop {
    pub source: String,
    pub target: String,
    pub input_value: f32,
    pub weight: f32,
    pub output_value: f32,
    pub lag_minutes: f32,
    pub cumulative_lag_minutes: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImpactEntry {
    pub ticker: String,
    pub value: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PropagationResult {
    pub hops: Vec<PropagationHop>,
    pub nodes_impacted: usize,
    pub average_depth: f32,
    pub max_lag_minutes: f32,
    #[serde(default)]
    pub top_impacts: Vec<ImpactEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub shock: Shock,
    pub result: PropagationResult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn label(self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FactorContribution {
    pub name: String,
    pub weight: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Signal {
    pub id: String,
    pub ticker: String,
    pub side: TradeSide,
    /// The transmission path this recommendation is derived from.
    pub path: Vec<PropagationHop>,
    #[serde(default)]
    pub factors: Vec<FactorContribution>,
    pub expected_return_before: f32,
    pub expected_return_after: f32,
    pub probability_before: f32,
    pub probability_after: f32,
    pub confidence: ConfidenceLevel,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NeighborExposure {
    pub ticker: String,
    pub weight: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HeldPosition {
    pub ticker: String,
    pub side: TradeSide,
    pub weight: f32,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub neighbor_exposures: Vec<NeighborExposure>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClusterExposure {
    pub cluster: String,
    pub exposure: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StressImpact {
    pub name: String,
    pub impact: f32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PortfolioRisk {
    #[serde(default)]
    pub cluster_exposures: Vec<ClusterExposure>,
    #[serde(default)]
    pub stress_scenarios: Vec<StressImpact>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Dataset {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub positions: Vec<HeldPosition>,
    #[serde(default)]
    pub risk: PortfolioRisk,
}

impl Dataset {
    pub fn node_by_ticker(&self, ticker: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.ticker == ticker)
    }

    pub fn cluster_index(&self, id: &str) -> Option<usize> {
        self.clusters.iter().position(|cluster| cluster.id == id)
    }
}
