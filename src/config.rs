//! Every tuning constant in one place, grouped by the subsystem that
//! consumes it. The defaults are the reference values the rest of the
//! code is calibrated against.

#[derive(Clone, Copy, Debug)]
pub struct LayoutTuning {
    pub iterations: usize,
    pub cluster_ring_radius: f32,
    pub cluster_scatter: f32,
    pub macro_outer_radius: f32,
    pub macro_min_radius: f32,
    pub macro_inner_count: usize,
    pub intra_rest_length: f32,
    pub cross_rest_length: f32,
    pub intra_stiffness: f32,
    pub cross_stiffness: f32,
    pub repulsion_strength: f32,
    pub softening: f32,
    pub centering_pull: f32,
    pub inner_pin_pull: f32,
    pub cluster_anchor_pull: f32,
    pub macro_outward_push: f32,
    pub collision_margin: f32,
    pub collision_strength: f32,
    pub separation_passes: usize,
    pub velocity_damping: f32,
    pub max_speed: f32,
    pub macro_radius: f32,
    pub node_radius_min: f32,
    pub node_radius_max: f32,
    pub fallback_radius: f32,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            iterations: 400,
            cluster_ring_radius: 260.0,
            cluster_scatter: 64.0,
            macro_outer_radius: 430.0,
            macro_min_radius: 330.0,
            macro_inner_count: 2,
            intra_rest_length: 90.0,
            cross_rest_length: 230.0,
            intra_stiffness: 0.035,
            cross_stiffness: 0.012,
            repulsion_strength: 2600.0,
            softening: 900.0,
            centering_pull: 0.0015,
            inner_pin_pull: 0.08,
            cluster_anchor_pull: 0.02,
            macro_outward_push: 0.05,
            collision_margin: 4.0,
            collision_strength: 0.6,
            separation_passes: 60,
            velocity_damping: 0.82,
            max_speed: 24.0,
            macro_radius: 10.0,
            node_radius_min: 6.0,
            node_radius_max: 24.0,
            fallback_radius: 7.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CameraTuning {
    /// Fraction of the remaining distance covered per frame while easing.
    pub lerp_fraction: f32,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub wheel_pixels_per_tick: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub frame_padding: f32,
    pub frame_min_scale: f32,
    pub frame_max_scale: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            lerp_fraction: 0.08,
            zoom_in_factor: 1.08,
            zoom_out_factor: 0.92,
            wheel_pixels_per_tick: 50.0,
            min_scale: 0.3,
            max_scale: 6.0,
            frame_padding: 80.0,
            frame_min_scale: 0.85,
            frame_max_scale: 1.6,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InteractionTuning {
    /// Total pointer travel (px) past which a press counts as a drag.
    pub drag_threshold_px: f32,
    pub hit_tolerance_px: f32,
    pub tooltip_delay_secs: f64,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            drag_threshold_px: 3.0,
            hit_tolerance_px: 6.0,
            tooltip_delay_secs: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderTuning {
    pub propagation_duration_secs: f64,
    pub hull_margin: f32,
    pub breathing_amplitude: f32,
    pub breathing_rate: f64,
    pub ambient_particle_rate: f64,
    pub flow_particle_rate: f64,
    pub label_gap: f32,
    pub label_pad_x: f32,
    pub label_pad_y: f32,
    pub label_font_base: f32,
    pub label_font_min: f32,
    pub label_font_max: f32,
    pub label_min_screen_radius: f32,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            propagation_duration_secs: 5.0,
            hull_margin: 18.0,
            breathing_amplitude: 0.06,
            breathing_rate: 2.0,
            ambient_particle_rate: 0.12,
            flow_particle_rate: 0.45,
            label_gap: 6.0,
            label_pad_x: 5.0,
            label_pad_y: 2.5,
            label_font_base: 12.0,
            label_font_min: 10.0,
            label_font_max: 20.0,
            label_min_screen_radius: 15.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Tuning {
    pub layout: LayoutTuning,
    pub camera: CameraTuning,
    pub interaction: InteractionTuning,
    pub render: RenderTuning,
}
