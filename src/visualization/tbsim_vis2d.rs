use bevy::log::LogPlugin;
use bevy::math::primitives::Circle;
use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};

use crate::simulation::states::{NVec2, N_BODIES};
use crate::simulation::trajectory::Trajectory;

#[derive(Component)]
struct BodyIndex(pub usize);

/// Finished trajectory being replayed, one sample per frame
#[derive(Resource)]
struct Playback {
    trajectory: Trajectory,
    frame: usize,
    scale: f32,
}

const MARKER_RADIUS: f32 = 6.0;
const VIEW_HALF_WIDTH: f32 = 300.0;
const BODY_COLORS: [Color; N_BODIES] = [
    Color::srgb(0.95, 0.3, 0.3),
    Color::srgb(0.3, 0.85, 0.4),
    Color::srgb(0.35, 0.5, 0.95),
];

pub fn run_2d(trajectory: Trajectory) {
    log::info!("run_2d: replaying {} samples", trajectory.len());

    let scale = fit_scale(&trajectory);
    App::new()
        .insert_resource(Playback {
            trajectory,
            frame: 0,
            scale,
        })
        // env_logger already owns the global logger
        .add_plugins(DefaultPlugins.build().disable::<LogPlugin>())
        .add_systems(Startup, setup_bodies_system)
        .add_systems(Update, (advance_frame_system, sync_transforms_system, draw_paths_system))
        .run();
}

/// World-to-screen factor that keeps every sampled position in view
fn fit_scale(trajectory: &Trajectory) -> f32 {
    let extent = trajectory
        .iter()
        .flat_map(|s| s.state.positions())
        .map(|x| x.x.abs().max(x.y.abs()))
        .fold(0.0_f64, f64::max);
    if extent > 0.0 {
        VIEW_HALF_WIDTH / extent as f32
    } else {
        VIEW_HALF_WIDTH
    }
}

fn to_screen(x: NVec2, scale: f32) -> Vec2 {
    Vec2::new(x.x as f32 * scale, x.y as f32 * scale)
}

fn setup_bodies_system(
    mut commands: Commands,
    playback: Res<Playback>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    // 2D camera
    commands.spawn(Camera2dBundle::default());

    let Some(positions) = playback.trajectory.positions_at(0) else {
        return;
    };

    for (i, x) in positions.iter().enumerate() {
        let p = to_screen(*x, playback.scale);
        commands.spawn((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(meshes.add(Circle::new(MARKER_RADIUS))),
                material: materials.add(ColorMaterial::from(BODY_COLORS[i])),
                transform: Transform::from_xyz(p.x, p.y, 1.0),
                ..Default::default()
            },
            BodyIndex(i),
        ));
    }
}

fn advance_frame_system(mut playback: ResMut<Playback>) {
    // hold the last frame once the replay is over
    if playback.frame + 1 < playback.trajectory.len() {
        playback.frame += 1;
    }
}

fn sync_transforms_system(playback: Res<Playback>, mut query: Query<(&BodyIndex, &mut Transform)>) {
    let Some(positions) = playback.trajectory.positions_at(playback.frame) else {
        return;
    };
    for (BodyIndex(i), mut transform) in &mut query {
        if let Some(x) = positions.get(*i) {
            let p = to_screen(*x, playback.scale);
            transform.translation.x = p.x;
            transform.translation.y = p.y;
        }
    }
}

/// Growing path of each body up to the current frame
fn draw_paths_system(playback: Res<Playback>, mut gizmos: Gizmos) {
    let end = (playback.frame + 1).min(playback.trajectory.len());
    let samples = &playback.trajectory.samples()[..end];
    if samples.len() < 2 {
        return;
    }
    for (i, color) in BODY_COLORS.iter().enumerate() {
        gizmos.linestrip_2d(
            samples.iter().map(|s| to_screen(s.state.position(i), playback.scale)),
            *color,
        );
    }
}
