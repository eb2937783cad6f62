use std::collections::HashMap;

use crate::data::{PropagationHop, PropagationResult};

/// Timeline fractions for a single hop. The wave departs when the upstream
/// hop has landed (`cumulative - lag`) and arrives at `cumulative`, both
/// normalized by the scenario's worst-case lag.
pub(super) fn reveal_fraction(hop: &PropagationHop, max_lag_minutes: f32) -> f32 {
    if max_lag_minutes <= 0.0 {
        return 0.0;
    }
    ((hop.cumulative_lag_minutes - hop.lag_minutes) / max_lag_minutes).clamp(0.0, 1.0)
}

pub(super) fn arrival_fraction(hop: &PropagationHop, max_lag_minutes: f32) -> f32 {
    if max_lag_minutes <= 0.0 {
        return 1.0;
    }
    (hop.cumulative_lag_minutes / max_lag_minutes).clamp(0.0, 1.0)
}

/// How far along its own edge a hop's traveling pulse is at `progress`.
pub(super) fn hop_travel(hop: &PropagationHop, max_lag_minutes: f32, progress: f32) -> f32 {
    let reveal = reveal_fraction(hop, max_lag_minutes);
    let arrival = arrival_fraction(hop, max_lag_minutes);
    if arrival - reveal < 1e-6 {
        return if progress >= arrival { 1.0 } else { 0.0 };
    }
    ((progress - reveal) / (arrival - reveal)).clamp(0.0, 1.0)
}

/// Impact per ticker at `progress`, keyed by target. A node latches once its
/// first hop lands and keeps the strongest value if several paths reach it.
pub(super) fn arrived_impacts<'a>(
    result: &'a PropagationResult,
    progress: f32,
) -> HashMap<&'a str, f32> {
    let mut impacts: HashMap<&str, f32> = HashMap::new();

    for hop in &result.hops {
        if progress + 1e-6 < arrival_fraction(hop, result.max_lag_minutes) {
            continue;
        }
        let entry = impacts.entry(hop.target.as_str()).or_insert(0.0);
        if hop.output_value.abs() > entry.abs() {
            *entry = hop.output_value;
        }
    }

    impacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bundled_dataset;

    fn hop(lag: f32, cumulative: f32, value: f32) -> PropagationHop {
        PropagationHop {
            source: "A".into(),
            target: "B".into(),
            input_value: 0.1,
            weight: 0.5,
            output_value: value,
            lag_minutes: lag,
            cumulative_lag_minutes: cumulative,
        }
    }

    #[test]
    fn first_hop_departs_at_zero() {
        let hop = hop(15.0, 15.0, 0.05);
        assert_eq!(reveal_fraction(&hop, 60.0), 0.0);
        assert!((arrival_fraction(&hop, 60.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn chained_hop_departs_when_upstream_lands() {
        let hop = hop(25.0, 60.0, -0.04);
        assert!((reveal_fraction(&hop, 60.0) - 35.0 / 60.0).abs() < 1e-6);
        assert!((arrival_fraction(&hop, 60.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn travel_interpolates_between_reveal_and_arrival() {
        let hop = hop(30.0, 60.0, 0.02);
        assert_eq!(hop_travel(&hop, 60.0, 0.4), 0.0);
        assert!((hop_travel(&hop, 60.0, 0.75) - 0.5).abs() < 1e-6);
        assert_eq!(hop_travel(&hop, 60.0, 1.0), 1.0);
    }

    #[test]
    fn degenerate_max_lag_lands_immediately() {
        let hop = hop(0.0, 0.0, 0.01);
        assert_eq!(reveal_fraction(&hop, 0.0), 0.0);
        assert_eq!(arrival_fraction(&hop, 0.0), 1.0);
    }

    #[test]
    fn impacts_latch_and_grow_monotonically() {
        let dataset = bundled_dataset().expect("bundled dataset is valid");
        let scenario = &dataset.scenarios[0].result;

        let early = arrived_impacts(scenario, 0.3);
        let late = arrived_impacts(scenario, 1.0);

        for ticker in early.keys() {
            assert!(late.contains_key(ticker), "{ticker} must stay impacted");
        }
        assert!(late.len() >= early.len());
    }

    #[test]
    fn oil_shock_impacts_match_attenuated_values() {
        let dataset = bundled_dataset().expect("bundled dataset is valid");
        let oil = dataset
            .scenarios
            .iter()
            .find(|scenario| scenario.id == "oil-shock")
            .expect("oil shock scenario");

        let impacts = arrived_impacts(&oil.result, 1.0);
        assert_eq!(impacts.len(), oil.result.nodes_impacted);

        let jets = impacts.get("JETS").expect("JETS impacted");
        assert!((jets - (-0.0592)).abs() < 1e-6);

        let dal = impacts.get("DAL").expect("DAL impacted");
        assert!((dal - (-0.040256)).abs() < 1e-6);

        assert!(impacts.get("XOM").is_some_and(|v| *v > 0.0));
        assert!(impacts.get("CVX").is_some_and(|v| *v > 0.0));
    }

    #[test]
    fn partial_progress_respects_lag_ordering() {
        let dataset = bundled_dataset().expect("bundled dataset is valid");
        let oil = dataset
            .scenarios
            .iter()
            .find(|scenario| scenario.id == "oil-shock")
            .expect("oil shock scenario");

        // 0.3 of a 60 minute window is minute 18: XOM (lag 15) has landed,
        // CVX (lag 20) has not.
        let impacts = arrived_impacts(&oil.result, 0.3);
        assert!(impacts.contains_key("XOM"));
        assert!(!impacts.contains_key("CVX"));
    }
}
