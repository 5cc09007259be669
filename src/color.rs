use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Station;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Station → Color32
// ---------------------------------------------------------------------------

/// Assigns each station a fixed colour shared by every chart.  Built from the
/// full station list so colours don't shift when the selection changes.
#[derive(Debug, Clone, Default)]
pub struct StationColors {
    mapping: BTreeMap<Station, Color32>,
}

impl StationColors {
    pub fn new(stations: &BTreeSet<Station>) -> Self {
        let palette = generate_palette(stations.len());
        StationColors {
            mapping: stations.iter().cloned().zip(palette).collect(),
        }
    }

    pub fn color_for(&self, station: &Station) -> Color32 {
        self.mapping.get(station).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
    }

    #[test]
    fn stations_get_distinct_colors() {
        let stations: BTreeSet<Station> = ["Dingling", "Dongsi", "Gucheng"]
            .into_iter()
            .map(Station::from)
            .collect();
        let colors = StationColors::new(&stations);
        let assigned: BTreeSet<[u8; 4]> = stations
            .iter()
            .map(|s| colors.color_for(s).to_array())
            .collect();
        assert_eq!(assigned.len(), 3);
        assert_eq!(colors.color_for(&Station::from("Unknown")), Color32::GRAY);
    }
}
