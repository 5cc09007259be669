use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel: station and year multi-selects.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let stations = state.options.stations.clone();
    let years = state.options.years.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let header = format!(
                "Stations  ({}/{})",
                state.selection.stations.len(),
                stations.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("stations")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_stations();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_stations();
                        }
                    });

                    for station in &stations {
                        let mut checked = state.selection.stations.contains(station);
                        let text =
                            RichText::new(station.as_str()).color(state.colors.color_for(station));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_station(station);
                        }
                    }
                });

            ui.separator();

            let header = format!("Years  ({}/{})", state.selection.years.len(), years.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("years")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_years();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_years();
                        }
                    });

                    for &year in &years {
                        let mut checked = state.selection.years.contains(&year);
                        if ui.checkbox(&mut checked, year.to_string()).changed() {
                            state.toggle_year(year);
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open source config…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            ui.separator();
            let can_export = !state.aggregates.is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Export aggregates…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(summary) = state.load_summary() {
            ui.label(summary);
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open station source config")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open_config(&path) {
            log::error!("Failed to open source config: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export aggregates")
        .add_filter("JSON", &["json"])
        .set_file_name("pm25_aggregates.json")
        .save_file();

    if let Some(path) = file {
        if let Err(e) =
            crate::data::export::write_json(&path, &state.selection, &state.aggregates)
        {
            log::error!("Failed to export aggregates: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
