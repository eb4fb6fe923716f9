use clap::Parser;
use client::config::{resolve_server, ClientConfig};
use client::input::InputManager;
use client::network::ClientEngine;
use client::rendering::Renderer;
use client::scene::{reconcile, SceneGraph};
use log::info;
use macroquad::prelude::{is_key_pressed, next_frame, Conf, KeyCode};
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address, `ip[:port]` or `host[:port]`
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: i32,
}

fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let server = match resolve_server(&args.server) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Could not resolve {}: {}", args.server, e);
            process::exit(1);
        }
    };

    info!("Connecting to: {}", server);
    let mut engine = match ClientEngine::connect(server, ClientConfig::default()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Could not connect: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = engine.start() {
        eprintln!("Could not start networking: {}", e);
        process::exit(1);
    }
    info!("Controls: arrows or A/D to move, W/Up to jump, Space to shoot, Esc to quit");

    let conf = Conf {
        window_title: "Skyfall Brawl".to_string(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, run(engine));
}

/// Render loop. Runs on the window thread until Esc or a fatal network error.
async fn run(mut engine: ClientEngine) {
    let mut renderer = Renderer::new();
    let mut input = InputManager::new();
    let mut scene = SceneGraph::new();
    let sync = engine.sync_state();
    let mut shown_version = 0;

    loop {
        if let Some(error) = engine.take_failure() {
            engine.disconnect();
            eprintln!("{}", error);
            process::exit(1);
        }

        engine.push_controls(input.sample());

        let (state, winner) = {
            let sync = sync.blocking_read();
            if sync.version() != shown_version {
                shown_version = sync.version();
                reconcile(&mut scene, sync.snapshot());
            }
            (sync.state(), sync.winner().map(str::to_string))
        };

        renderer.render(&scene, state, winner.as_deref());

        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        next_frame().await;
    }

    engine.disconnect();
    process::exit(0);
}
