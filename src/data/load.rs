use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use super::{Cluster, Dataset, GraphNode, PropagationResult};

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    parse_dataset(&raw)
}

pub fn bundled_dataset() -> Result<Dataset> {
    parse_dataset(include_str!("../../assets/demo.json"))
}

fn parse_dataset(raw: &str) -> Result<Dataset> {
    let mut dataset: Dataset = serde_json::from_str(raw).context("invalid dataset JSON")?;
    validate(&mut dataset);
    info!(
        "dataset loaded: {} nodes, {} edges, {} clusters, {} scenarios",
        dataset.nodes.len(),
        dataset.edges.len(),
        dataset.clusters.len(),
        dataset.scenarios.len()
    );
    Ok(dataset)
}

/// Drops edges whose endpoints are unknown and flags scenarios with
/// out-of-order hop chains. Malformed input degrades, it never errors.
fn validate(dataset: &mut Dataset) {
    let mut seen_ids = HashSet::new();
    for node in &dataset.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            warn!("duplicate node id {}", node.id);
        }
    }

    let known = dataset
        .nodes
        .iter()
        .map(|node| node.ticker.as_str())
        .collect::<HashSet<_>>();

    dataset.edges.retain(|edge| {
        let keep = known.contains(edge.source.as_str()) && known.contains(edge.target.as_str());
        if !keep {
            warn!(
                "dropping edge {} ({} -> {}): unknown endpoint",
                edge.id, edge.source, edge.target
            );
        }
        keep
    });

    for node in &dataset.nodes {
        if !cluster_declaration_matches(node, &dataset.clusters) {
            warn!(
                "node {}: declared cluster {:?} does not list it as a member",
                node.ticker, node.cluster
            );
        }
    }

    for scenario in &dataset.scenarios {
        if !hops_monotonic(&scenario.result) {
            warn!(
                "scenario {}: hop chain is not monotonic in cumulative lag",
                scenario.id
            );
        }
    }

    for signal in &dataset.signals {
        debug!(
            "signal {}: {} {} over {} hops",
            signal.id,
            signal.side.label(),
            signal.ticker,
            signal.path.len()
        );
    }
}

/// A node's declared cluster must list the node among its members. Layout
/// trusts the member lists, so a mismatch strands the node outside the
/// cluster it claims.
fn cluster_declaration_matches(node: &GraphNode, clusters: &[Cluster]) -> bool {
    match node.cluster.as_deref() {
        Some(declared) => clusters.iter().any(|cluster| {
            cluster.id == declared && cluster.members.iter().any(|member| member == &node.ticker)
        }),
        None => true,
    }
}

/// Cumulative lag must cover the hop's own lag and never decrease along a
/// path (a hop leaving a node cannot arrive before the hop that reached it).
fn hops_monotonic(result: &PropagationResult) -> bool {
    const EPS: f32 = 1e-3;

    for hop in &result.hops {
        if hop.cumulative_lag_minutes + EPS < hop.lag_minutes {
            return false;
        }
    }

    for upstream in &result.hops {
        for downstream in &result.hops {
            if upstream.target == downstream.source
                && downstream.cumulative_lag_minutes + EPS
                    < upstream.cumulative_lag_minutes + downstream.lag_minutes
            {
                return false;
            }
        }
    }

    true
}
