use macroquad::prelude::*;
use pixel_tilemap::{Config, DirectionKeys, MacroquadSurface, Scene};
use tracing_subscriber::EnvFilter;

fn window_conf() -> Conf {
    Conf {
        window_title: "Pellet Town".into(),
        window_width: 1280,
        window_height: 960,
        high_dpi: false,
        ..Default::default()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn load_scene() -> anyhow::Result<Scene> {
    // optional first argument: path to a JSON config
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Scene::load(&config, screen_width(), screen_height()).await
}

#[macroquad::main(window_conf)]
async fn main() {
    init_tracing();

    let mut scene = match load_scene().await {
        Ok(scene) => scene,
        Err(err) => {
            tracing::error!(error = ?err, "startup_failed");
            return;
        }
    };
    let mut surface = MacroquadSurface::new();

    loop {
        scene.resize(screen_width(), screen_height());

        let stats = scene.tick(DirectionKeys::poll(), &mut surface);

        draw_text(
            &format!("FPS: {}  draws: {}  culled: {}", get_fps(), stats.drawn, stats.culled),
            10.0,
            24.0,
            24.0,
            RED,
        );

        next_frame().await;
    }
}
