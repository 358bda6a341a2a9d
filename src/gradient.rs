use serde::{Deserialize, Serialize};

use crate::notice::Rejection;
use crate::state::Color;

/// Stop-count bounds enforced at every mutation point.
pub const MIN_STOPS: usize = 2;
pub const MAX_STOPS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position along the gradient line, `0.0..=1.0`.
    pub position: f32,
    pub color: Color,
}

impl ColorStop {
    pub fn new(position: f32, color: Color) -> Self {
        Self { position, color }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Ordered color-stop list plus a direction angle.
///
/// Positions are not required to be sorted or distinct; renderers treat
/// them as canvas-style gradient stops. Only the stop count is validated.
pub struct GradientSpec {
    pub angle_degrees: i32,
    pub stops: Vec<ColorStop>,
}

impl Default for GradientSpec {
    fn default() -> Self {
        Self {
            angle_degrees: 0,
            stops: vec![
                ColorStop::new(0.0, Color::rgb(0xff, 0x00, 0x00)),
                ColorStop::new(0.5, Color::rgb(0x00, 0xff, 0x00)),
                ColorStop::new(1.0, Color::rgb(0x00, 0x00, 0xff)),
            ],
        }
    }
}

/// Editor preset names, in menu order.
pub const PRESET_NAMES: [&str; 5] = ["rainbow", "sunset", "ocean", "fire", "forest"];

fn preset_stops(name: &str) -> Option<Vec<(f32, u32)>> {
    let stops: &[(f32, u32)] = match name {
        "rainbow" => &[
            (0.0, 0xff0000),
            (0.17, 0xff8000),
            (0.33, 0xffff00),
            (0.5, 0x80ff00),
            (0.67, 0x00ff00),
            (0.83, 0x0080ff),
            (1.0, 0x0000ff),
        ],
        "sunset" => &[(0.0, 0xff6b35), (0.5, 0xf7931e), (1.0, 0xffb627)],
        "ocean" => &[(0.0, 0x001122), (0.5, 0x0066cc), (1.0, 0x00aaff)],
        "fire" => &[
            (0.0, 0x000000),
            (0.33, 0xff4400),
            (0.67, 0xffaa00),
            (1.0, 0xffff00),
        ],
        "forest" => &[(0.0, 0x0d4f3c), (0.5, 0x2d6a4f), (1.0, 0x52b788)],
        _ => return None,
    };
    Some(stops.to_vec())
}

fn rgb(packed: u32) -> Color {
    Color::rgb((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
}

impl GradientSpec {
    pub fn from_table(angle_degrees: i32, stops: &[(f32, u32)]) -> Self {
        Self {
            angle_degrees,
            stops: stops
                .iter()
                .map(|&(pos, color)| ColorStop::new(pos, rgb(color)))
                .collect(),
        }
    }

    /// Appends a white stop at the midpoint. Rejects at the 10-stop cap,
    /// leaving the list unchanged.
    pub fn add_stop(&mut self) -> Result<usize, Rejection> {
        if self.stops.len() >= MAX_STOPS {
            return Err(Rejection::TooManyStops);
        }
        self.stops
            .push(ColorStop::new(0.5, Color::rgb(0xff, 0xff, 0xff)));
        Ok(self.stops.len() - 1)
    }

    /// Removes the stop at `index`. Rejects at the 2-stop floor, leaving
    /// the list unchanged.
    pub fn remove_stop_at(&mut self, index: usize) -> Result<(), Rejection> {
        if self.stops.len() <= MIN_STOPS {
            return Err(Rejection::TooFewStops);
        }
        if index < self.stops.len() {
            self.stops.remove(index);
        }
        Ok(())
    }

    /// Spreads the stops evenly: position `i / (n - 1)`, endpoints exact.
    pub fn make_equidistant(&mut self) {
        let denom = (self.stops.len() - 1).max(1) as f32;
        for (i, stop) in self.stops.iter_mut().enumerate() {
            stop.position = i as f32 / denom;
        }
    }

    /// Replaces the stop list with a named preset and resets the angle.
    /// Unknown names leave the spec untouched.
    pub fn load_preset(&mut self, name: &str) -> bool {
        let Some(stops) = preset_stops(name) else {
            return false;
        };
        self.stops = stops
            .into_iter()
            .map(|(pos, color)| ColorStop::new(pos, rgb(color)))
            .collect();
        self.angle_degrees = 0;
        true
    }

    /// Stops ordered by position (stable, so duplicates keep list order).
    pub fn sorted_stops(&self) -> Vec<ColorStop> {
        let mut stops = self.stops.clone();
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        stops
    }

    /// Samples the ramp at `t`, linearly interpolating between the two
    /// neighboring stops and clamping past the ends.
    pub fn sample(&self, t: f32) -> Color {
        let stops = self.sorted_stops();
        let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
            return Color::rgb(0, 0, 0);
        };
        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }
        for pair in stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.position {
                let span = hi.position - lo.position;
                if span <= f32::EPSILON {
                    return hi.color;
                }
                let f = (t - lo.position) / span;
                return lerp(lo.color, hi.color, f);
            }
        }
        last.color
    }
}

fn lerp(a: Color, b: Color, f: f32) -> Color {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * f).round() as u8;
    Color {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: mix(a.a, b.a),
    }
}

#[cfg(test)]
mod tests {
    use super::{GradientSpec, MAX_STOPS, MIN_STOPS};
    use crate::notice::Rejection;
    use crate::state::Color;

    #[test]
    fn add_stop_rejects_at_cap_and_leaves_list_unchanged() {
        let mut spec = GradientSpec::default();
        while spec.stops.len() < MAX_STOPS {
            spec.add_stop().unwrap();
        }
        let before = spec.clone();
        assert_eq!(spec.add_stop(), Err(Rejection::TooManyStops));
        assert_eq!(spec, before);
    }

    #[test]
    fn remove_stop_rejects_at_floor_and_leaves_list_unchanged() {
        let mut spec = GradientSpec::default();
        spec.remove_stop_at(1).unwrap();
        assert_eq!(spec.stops.len(), MIN_STOPS);
        let before = spec.clone();
        assert_eq!(spec.remove_stop_at(0), Err(Rejection::TooFewStops));
        assert_eq!(spec, before);
    }

    #[test]
    fn stop_count_never_leaves_bounds() {
        let mut spec = GradientSpec::default();
        for _ in 0..30 {
            let _ = spec.add_stop();
        }
        assert_eq!(spec.stops.len(), MAX_STOPS);
        for _ in 0..30 {
            let _ = spec.remove_stop_at(0);
        }
        assert_eq!(spec.stops.len(), MIN_STOPS);
    }

    #[test]
    fn equidistant_on_three_stops_is_exact() {
        let mut spec = GradientSpec::default();
        spec.stops[0].position = 0.2;
        spec.stops[1].position = 0.21;
        spec.stops[2].position = 0.9;
        spec.make_equidistant();
        let positions: Vec<f32> = spec.stops.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn preset_load_replaces_stops_and_resets_angle() {
        let mut spec = GradientSpec::default();
        spec.angle_degrees = 135;
        assert!(spec.load_preset("rainbow"));
        assert_eq!(spec.stops.len(), 7);
        assert_eq!(spec.angle_degrees, 0);
        assert_eq!(spec.stops[0].color, Color::rgb(0xff, 0, 0));
    }

    #[test]
    fn unknown_preset_is_a_no_op() {
        let mut spec = GradientSpec::default();
        let before = spec.clone();
        assert!(!spec.load_preset("plasma"));
        assert_eq!(spec, before);
    }

    #[test]
    fn sample_clamps_outside_the_stop_range() {
        let spec = GradientSpec::from_table(0, &[(0.2, 0x000000), (0.8, 0xffffff)]);
        assert_eq!(spec.sample(0.0), Color::rgb(0, 0, 0));
        assert_eq!(spec.sample(1.0), Color::rgb(255, 255, 255));
    }

    #[test]
    fn sample_interpolates_midpoints() {
        let spec = GradientSpec::from_table(0, &[(0.0, 0x000000), (1.0, 0xff0000)]);
        let mid = spec.sample(0.5);
        assert_eq!(mid.g, 0);
        assert!((mid.r as i32 - 128).abs() <= 1);
    }

    #[test]
    fn sample_tolerates_unsorted_stops() {
        let spec = GradientSpec::from_table(0, &[(1.0, 0xffffff), (0.0, 0x000000)]);
        assert_eq!(spec.sample(0.0), Color::rgb(0, 0, 0));
        assert_eq!(spec.sample(1.0), Color::rgb(255, 255, 255));
    }
}
