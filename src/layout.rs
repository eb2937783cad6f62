//! One-shot force-directed layout. Runs to a fixed iteration count at
//! load time and returns frozen positions; nothing here touches the
//! render loop or the camera.

use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::config::LayoutTuning;
use crate::data::{Cluster, GraphEdge, GraphNode, NodeKind};

pub const DEFAULT_SEED: u64 = 0x6d6b_7467;

/// Linear congruential generator (Knuth MMIX constants). Layout must be
/// bit-identical across runs and platforms for a given seed, so the
/// platform RNG is never used here.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15).wrapping_add(1))
    }

    fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 40) as f32) / ((1u64 << 24) as f32)
    }

    /// Uniform in [-1, 1).
    fn next_unit(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }
}

pub fn node_radius(node: &GraphNode, tuning: &LayoutTuning) -> f32 {
    if node.kind == NodeKind::Macro {
        return tuning.macro_radius;
    }

    match node.market_cap {
        Some(cap) if cap > 0.0 => ((cap.log10() as f32 - 8.0) * 4.0)
            .clamp(tuning.node_radius_min, tuning.node_radius_max),
        _ => tuning.fallback_radius,
    }
}

/// Maps edges onto node indices, silently skipping edges whose source or
/// target ticker is unknown and self-loops. Returns
/// `(source_index, target_index, edge_index)` triples.
pub fn resolved_edges(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<(usize, usize, usize)> {
    let index_by_ticker = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.ticker.as_str(), index))
        .collect::<HashMap<_, _>>();

    edges
        .iter()
        .enumerate()
        .filter_map(|(edge_index, edge)| {
            let source = *index_by_ticker.get(edge.source.as_str())?;
            let target = *index_by_ticker.get(edge.target.as_str())?;
            (source != target).then_some((source, target, edge_index))
        })
        .collect()
}

/// Maps each node index to its cluster index, from the clusters' member
/// lists. Macro factors and unlisted nodes get `None`.
pub fn cluster_assignments(nodes: &[GraphNode], clusters: &[Cluster]) -> Vec<Option<usize>> {
    let mut cluster_by_ticker = HashMap::new();
    for (cluster_index, cluster) in clusters.iter().enumerate() {
        for member in &cluster.members {
            cluster_by_ticker.insert(member.as_str(), cluster_index);
        }
    }

    nodes
        .iter()
        .map(|node| cluster_by_ticker.get(node.ticker.as_str()).copied())
        .collect()
}

fn pair_direction(delta: Vec2, distance: f32, i: usize, j: usize) -> Vec2 {
    if distance > 1e-4 {
        delta / distance
    } else {
        let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * TAU;
        vec2(angle.cos(), angle.sin())
    }
}

enum MacroSlot {
    Inner,
    Outer { ordinal: usize, count: usize },
}

/// Computes a stable position for every node. Deterministic for a given
/// seed; edges with unknown endpoints are excluded, never an error.
pub fn layout(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    clusters: &[Cluster],
    tuning: &LayoutTuning,
    seed: u64,
) -> Vec<Vec2> {
    let n = nodes.len();
    if n == 0 {
        return Vec::new();
    }

    let cluster_of = cluster_assignments(nodes, clusters);
    let links = resolved_edges(nodes, edges);
    let radii = nodes
        .iter()
        .map(|node| node_radius(node, tuning))
        .collect::<Vec<_>>();

    // Each cluster claims a fixed angular slot on a shared ring.
    let slot_count = clusters.len().max(1);
    let anchors = (0..clusters.len())
        .map(|index| {
            let angle = (index as f32 / slot_count as f32) * TAU;
            vec2(angle.cos(), angle.sin()) * tuning.cluster_ring_radius
        })
        .collect::<Vec<_>>();

    // Macro factors split into a small inner set pinned near the origin
    // (highest centrality first) and an evenly spaced outer ring.
    let mut macro_indices = (0..n)
        .filter(|&index| nodes[index].kind == NodeKind::Macro)
        .collect::<Vec<_>>();
    macro_indices.sort_by(|&a, &b| {
        nodes[b]
            .centrality
            .total_cmp(&nodes[a].centrality)
            .then(a.cmp(&b))
    });
    let inner_count = tuning.macro_inner_count.min(macro_indices.len());
    let outer_count = macro_indices.len() - inner_count;
    let mut macro_slots = HashMap::new();
    for (rank, &index) in macro_indices.iter().enumerate() {
        let slot = if rank < inner_count {
            MacroSlot::Inner
        } else {
            MacroSlot::Outer {
                ordinal: rank - inner_count,
                count: outer_count,
            }
        };
        macro_slots.insert(index, slot);
    }

    let mut rng = Lcg::new(seed);
    let mut positions = Vec::with_capacity(n);
    for index in 0..n {
        let jitter = vec2(rng.next_unit(), rng.next_unit());
        let position = if let Some(cluster) = cluster_of[index] {
            anchors[cluster] + jitter * tuning.cluster_scatter
        } else {
            match macro_slots.get(&index) {
                Some(MacroSlot::Inner) => jitter * 18.0,
                Some(MacroSlot::Outer { ordinal, count }) => {
                    let angle = (*ordinal as f32 / (*count).max(1) as f32) * TAU;
                    vec2(angle.cos(), angle.sin()) * tuning.macro_outer_radius + jitter * 8.0
                }
                None => jitter * tuning.cluster_ring_radius * 1.2,
            }
        };
        positions.push(position);
    }

    let mut velocities = vec![Vec2::ZERO; n];
    let mut forces = vec![Vec2::ZERO; n];

    for _ in 0..tuning.iterations {
        forces.fill(Vec2::ZERO);

        // Charge repulsion and collision share one pair scan.
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance_sq = delta.length_sq();
                let distance = distance_sq.sqrt();
                let direction = pair_direction(delta, distance, i, j);

                let repulsion =
                    tuning.repulsion_strength / (distance_sq + tuning.softening);
                forces[i] += direction * repulsion;
                forces[j] -= direction * repulsion;

                let min_distance = radii[i] + radii[j] + tuning.collision_margin;
                if distance < min_distance {
                    let push = (min_distance - distance) * tuning.collision_strength;
                    forces[i] += direction * push;
                    forces[j] -= direction * push;
                }
            }
        }

        // Link attraction: intra-cluster edges sit closer and pull harder.
        for &(source, target, edge_index) in &links {
            let edge = &edges[edge_index];
            let intra = match (cluster_of[source], cluster_of[target]) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            let (rest, stiffness) = if intra {
                (tuning.intra_rest_length, tuning.intra_stiffness)
            } else {
                (tuning.cross_rest_length, tuning.cross_stiffness)
            };

            let delta = positions[source] - positions[target];
            let distance = delta.length();
            let direction = pair_direction(delta, distance, source, target);
            let spring = (distance - rest) * stiffness * edge.weight;
            forces[source] -= direction * spring;
            forces[target] += direction * spring;
        }

        for index in 0..n {
            // Weak global centering.
            forces[index] -= positions[index] * tuning.centering_pull;

            // Cluster members chase their angular anchor; macro factors
            // hold their inner pin or outer ring.
            if let Some(cluster) = cluster_of[index] {
                forces[index] +=
                    (anchors[cluster] - positions[index]) * tuning.cluster_anchor_pull;
            } else {
                match macro_slots.get(&index) {
                    Some(MacroSlot::Inner) => {
                        forces[index] -= positions[index] * tuning.inner_pin_pull;
                    }
                    Some(MacroSlot::Outer { .. }) => {
                        let radius = positions[index].length();
                        if radius > 1e-4 && radius < tuning.macro_min_radius {
                            forces[index] += (positions[index] / radius)
                                * (tuning.macro_min_radius - radius)
                                * tuning.macro_outward_push;
                        }
                    }
                    None => {}
                }
            }
        }

        for index in 0..n {
            let mut velocity = (velocities[index] + forces[index]) * tuning.velocity_damping;
            let speed = velocity.length();
            if speed > tuning.max_speed {
                velocity *= tuning.max_speed / speed;
            }
            velocities[index] = velocity;
            positions[index] += velocity;
        }
    }

    // Direct relaxation clears any residual overlap before positions
    // freeze; velocities are discarded.
    for _ in 0..tuning.separation_passes {
        let mut moved = false;
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length();
                let min_distance = radii[i] + radii[j];
                if distance < min_distance {
                    let direction = pair_direction(delta, distance, i, j);
                    let correction = direction * (min_distance - distance) * 0.5;
                    positions[i] += correction;
                    positions[j] -= correction;
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }

    positions
}
