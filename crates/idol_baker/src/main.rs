use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;

use crate::asset_sink::JsonAssetSink;
use crate::tracking::Baker;

mod api;
mod asset_sink;
mod input;
mod live_mesh;
mod tracking;

#[derive(Parser, Debug)]
struct Options {
    #[arg(long, default_value = "127.0.0.1:8888")]
    pub api_bind: String,
    /// Directory baked assets are written to.
    #[arg(long, short = 'o', default_value = "assets")]
    pub output_dir: PathBuf,
    /// Base name of baked assets.
    #[arg(long, short = 'n', default_value = "Face")]
    pub asset_name: String,
    /// Run without a window; recording is then only driven over HTTP.
    #[arg(long)]
    pub headless: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let options = Options::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let baker = Baker::new(JsonAssetSink::new(&options.output_dir, &options.asset_name));
    tracing::info!(dir = %options.output_dir.display(), name = %options.asset_name, "writing blend shape assets");

    let api_addr: SocketAddr = options.api_bind.parse()?;
    let api_state = api::ApiState::new(baker.clone());
    runtime.spawn(async move {
        tracing::info!("serving API on {}", api_addr);
        if let Err(err) = axum_server::bind(api_addr)
            .serve(api::new_api().with_state(api_state).into_make_service()).await {
            tracing::error!("failed to serve API: {}", err);
        }
    });

    let mut app = App::new();
    if options.headless {
        app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))));
    } else {
        // Logging is already set up above.
        app.add_plugins(DefaultPlugins.build().disable::<LogPlugin>())
            .add_systems(Startup, (init, live_mesh::spawn_live_face))
            .add_systems(Update, (
                input::keyboard_triggers,
                live_mesh::update_live_face,
            ));
    }
    app.insert_resource(baker);
    app.run();
    Ok(())
}

fn init(mut commands: Commands) {
    commands.spawn(DirectionalLightBundle {
        transform: Transform::from_xyz(0., 1., 1.)
            .looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });

    // Tracked faces are in metres, roughly half a metre in front of the origin.
    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(0., 0., 0.6)
            .looking_at(Vec3::new(0., 0., -0.5), Vec3::Y),
        ..default()
    });
}
