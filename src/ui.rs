use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::sim::{AppState, Difficulty, GameSettings, ResetEvent, SimStats};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .add_systems(Update, hud_system.run_if(in_state(AppState::Playing)))
            .add_systems(Update, game_over_ui.run_if(in_state(AppState::GameOver)));
    }
}

fn hud_system(
    mut contexts: EguiContexts,
    mut settings: ResMut<GameSettings>,
    stats: Res<SimStats>,
) {
    egui::Window::new("Freefall").show(contexts.ctx_mut(), |ui| {
        ui.label(format!("Depth: {:.1}", stats.depth));
        ui.label(format!(
            "Platforms: {}  Recycled: {}",
            stats.platforms, stats.recycled
        ));

        ui.separator();

        egui::ComboBox::from_label("Difficulty")
            .selected_text(format!("{:?}", settings.difficulty))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut settings.difficulty, Difficulty::Calm, "Calm");
                ui.selectable_value(&mut settings.difficulty, Difficulty::Classic, "Classic");
                ui.selectable_value(&mut settings.difficulty, Difficulty::Frantic, "Frantic");
            });
        ui.small("Takes effect on reset (R).");
    });

    if settings.show_help {
        egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
            ui.label("Left/Right or A/D: Move");
            ui.label("R: Reset");
            ui.label("H: Toggle Help");
            ui.label("Don't touch the blocks.");
        });
    }
}

fn game_over_ui(
    mut contexts: EguiContexts,
    stats: Res<SimStats>,
    mut ev_reset: EventWriter<ResetEvent>,
) {
    egui::Window::new("Game Over").show(contexts.ctx_mut(), |ui| {
        ui.label("You touched a block!");
        ui.label(format!("Depth reached: {:.1}", stats.depth));
        if ui.button("Retry").clicked() {
            ev_reset.send(ResetEvent);
        }
    });
}
