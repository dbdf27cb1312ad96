mod contact;
mod input;
mod mover;
mod sim;
mod spawner;
mod ui;

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use input::InputPlugin;
use sim::{GameSettings, SimPlugin};
use ui::UiPlugin;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.04, 0.05, 0.09)))
        .insert_resource(Msaa::Sample4)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "freefall".into(),
                        resolution: (720., 1080.).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "info,wgpu=error,naga=warn,freefall=debug".into(),
                    level: Level::INFO,
                    ..default()
                }),
        )
        .add_plugins((SimPlugin, InputPlugin, UiPlugin))
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands, settings: Res<GameSettings>) {
    let mut camera = Camera2dBundle::default();
    // The view always spans the same world height; width follows the window.
    camera.projection.scaling_mode = ScalingMode::FixedVertical(settings.view_half_height * 2.0);
    camera.transform = Transform::from_xyz(0.0, 0.0, 999.0);
    commands.spawn((camera, MainCamera));
}

#[derive(Component)]
pub struct MainCamera;
