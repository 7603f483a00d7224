//! Interactive plotter.
//!
//! - Left / Right: previous / next preset for the current mode
//! - Up / Down: resolution ±10 (30..=150)
//! - Space: switch between curve and surface

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use bevy_function_plot::{
    Configuration, FunctionPlot, FunctionPlotPlugin, Mode, PlotBounds,
    plugin::{PlotEvaluator, PlotGeometry},
};
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

const CURVE_PRESETS: &[&str] = &[
    "sin(x)",
    "x^2 / 4",
    "x^3 / 20 - x",
    "abs(x) < 3 ? sqrt(9 - x^2) : 0",
    "tan(x)",
    "1/x",
    "exp(-x^2) * 5",
];

const SURFACE_PRESETS: &[&str] = &[
    "sin(x) * cos(y)",
    "x*y/4",
    "(x^2 - y^2) / 6",
    "8 * exp(-(x^2 + y^2) / 8)",
    "sin(sqrt(x^2 + y^2)) * 3",
    "atan2(y, x)",
];

#[derive(Resource, Default)]
struct PresetCursor(usize);

#[derive(Resource)]
struct PlotMaterials {
    curve: Handle<StandardMaterial>,
    surface: Handle<StandardMaterial>,
}

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            FunctionPlotPlugin::default(),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .init_resource::<PresetCursor>()
        .add_systems(Startup, setup)
        .add_systems(Update, (handle_keys, orient_plot))
        .run();
}

fn setup(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 200.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(14., 12., 14.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let plot_materials = PlotMaterials {
        curve: materials.add(StandardMaterial {
            unlit: true,
            ..Default::default()
        }),
        surface: materials.add(StandardMaterial {
            double_sided: true,
            cull_mode: None,
            perceptual_roughness: 0.8,
            ..Default::default()
        }),
    };

    commands.spawn((
        FunctionPlot::new(Configuration::curve(CURVE_PRESETS[0], 100)),
        MeshMaterial3d(plot_materials.curve.clone()),
    ));
    commands.insert_resource(plot_materials);
}

fn handle_keys(
    keys: Res<ButtonInput<KeyCode>>,
    evaluator: Res<PlotEvaluator>,
    mut cursor: ResMut<PresetCursor>,
    mut plots: Query<&mut FunctionPlot>,
) {
    let bounds = PlotBounds::default();

    for mut plot in &mut plots {
        let config = plot.config().clone();
        let presets = match config.mode {
            Mode::Curve => CURVE_PRESETS,
            Mode::Surface => SURFACE_PRESETS,
        };

        if keys.just_pressed(KeyCode::Space) {
            let mode = config.mode.toggled();
            plot.set_mode(mode);
            cursor.0 = 0;
            let first = match mode {
                Mode::Curve => CURVE_PRESETS[0],
                Mode::Surface => SURFACE_PRESETS[0],
            };
            commit(&mut plot, first, &evaluator);
        }
        if keys.just_pressed(KeyCode::ArrowRight) {
            cursor.0 = (cursor.0 + 1) % presets.len();
            commit(&mut plot, presets[cursor.0], &evaluator);
        }
        if keys.just_pressed(KeyCode::ArrowLeft) {
            cursor.0 = (cursor.0 + presets.len() - 1) % presets.len();
            commit(&mut plot, presets[cursor.0], &evaluator);
        }
        if keys.just_pressed(KeyCode::ArrowUp) {
            plot.set_resolution(bounds.clamp_ui_resolution(config.resolution + 10));
        }
        if keys.just_pressed(KeyCode::ArrowDown) {
            plot.set_resolution(bounds.clamp_ui_resolution(config.resolution.saturating_sub(10)));
        }
    }
}

fn commit(plot: &mut FunctionPlot, expression: &str, evaluator: &PlotEvaluator) {
    match plot.commit_expression(expression, evaluator.get()) {
        Ok(()) => info!("plotting {expression}"),
        Err(err) => warn!("{expression}: {err}"),
    }
}

/// Stands surfaces up in Bevy's y-up world and picks a matching material.
fn orient_plot(
    mut commands: Commands,
    materials: Res<PlotMaterials>,
    mut plots: Query<(Entity, &PlotGeometry, &mut Transform), Changed<PlotGeometry>>,
) {
    for (entity, geometry, mut transform) in &mut plots {
        let (rotation, material) = match geometry.0.mode {
            Mode::Curve => (Quat::IDENTITY, materials.curve.clone()),
            // (x, y, z) → (x, z, -y): the function value points up
            Mode::Surface => (Quat::from_rotation_x(-FRAC_PI_2), materials.surface.clone()),
        };
        transform.rotation = rotation;
        commands.entity(entity).insert(MeshMaterial3d(material));
    }
}
