use eframe::egui::{Ui, Vec2b};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::data::model::Season;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;
const UNIT: &str = "PM2.5 (µg/m³)";

// ---------------------------------------------------------------------------
// Central panel – the three aggregate views
// ---------------------------------------------------------------------------

/// Render every chart in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data loaded  (File → Open source config… or Reload)");
        });
        return;
    }

    if state.aggregates.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Nothing selected");
        });
        return;
    }

    eframe::egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Mean PM2.5 per station");
            station_chart(ui, state);
            station_table(ui, state);
            ui.add_space(12.0);

            ui.heading("Yearly mean PM2.5 trend");
            yearly_chart(ui, state);
            ui.add_space(12.0);

            ui.heading("PM2.5 per season");
            seasonal_chart(ui, state);
        });
}

/// Bars in ascending order of mean, one colour per station.
fn station_chart(ui: &mut Ui, state: &AppState) {
    Plot::new("station_means")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(UNIT)
        .allow_scroll(false)
        .allow_drag(Vec2b::new(true, false))
        .show(ui, |plot_ui| {
            for (i, m) in state.aggregates.by_station.iter().enumerate() {
                let bar = Bar::new(i as f64, m.mean)
                    .name(format!("{}: {:.1}", m.station, m.mean))
                    .width(0.7);
                let chart = BarChart::new(vec![bar])
                    .name(m.station.as_str())
                    .color(state.colors.color_for(&m.station));
                plot_ui.bar_chart(chart);
            }
        });
}

fn station_table(ui: &mut Ui, state: &AppState) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(120.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Station");
            });
            header.col(|ui| {
                ui.strong(UNIT);
            });
            header.col(|ui| {
                ui.strong("Readings");
            });
        })
        .body(|mut body| {
            for m in &state.aggregates.by_station {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(m.station.as_str());
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.2}", m.mean));
                    });
                    row.col(|ui| {
                        ui.label(m.count.to_string());
                    });
                });
            }
        });
}

/// One line with circle markers per station, x = year.
fn yearly_chart(ui: &mut Ui, state: &AppState) {
    Plot::new("yearly_trend")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label(UNIT)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for station in &state.selection.stations {
                // BTreeMap order: chronological within a station
                let series: Vec<[f64; 2]> = state
                    .aggregates
                    .by_year_station
                    .iter()
                    .filter(|((_, s), _)| s == station)
                    .map(|((year, _), g)| [*year as f64, g.mean()])
                    .collect();
                if series.is_empty() {
                    continue;
                }
                let color = state.colors.color_for(station);
                plot_ui.line(
                    Line::new(PlotPoints::from(series.clone()))
                        .name(station.as_str())
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(series))
                        .name(station.as_str())
                        .color(color)
                        .shape(MarkerShape::Circle)
                        .radius(4.0),
                );
            }
        });
}

/// Season groups on the x axis, one bar per station inside each group.
fn seasonal_chart(ui: &mut Ui, state: &AppState) {
    let stations: Vec<_> = state.selection.stations.iter().collect();
    let n = stations.len().max(1) as f64;
    let bar_width = 0.8 / n;

    Plot::new("seasonal_means")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Winter · Spring · Summer · Fall")
        .y_axis_label(UNIT)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (j, station) in stations.iter().enumerate() {
                let offset = (j as f64 - (n - 1.0) / 2.0) * bar_width;
                let bars: Vec<Bar> = Season::ALL
                    .iter()
                    .enumerate()
                    .filter_map(|(i, season)| {
                        let g = state
                            .aggregates
                            .by_season_station
                            .get(&(*season, (*station).clone()))?;
                        Some(
                            Bar::new(i as f64 + offset, g.mean())
                                .name(format!("{season} · {station}: {:.1}", g.mean()))
                                .width(bar_width),
                        )
                    })
                    .collect();
                if bars.is_empty() {
                    continue;
                }
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(station.as_str())
                        .color(state.colors.color_for(station)),
                );
            }
        });
}
