use clap::Parser;
use log::{info, warn};
use server::arena::Arena;
use server::config::ServerConfig;
use server::host::{HostCommand, HostInput, HOST_HELP};
use server::menu::{Flow, Menu, MenuAction};
use server::network::{Server, SharedGame};
use server::utils::{discover_local_ip, rate_to_interval};
use shared::{MatchState, PORT};
use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

// Cap the maximum delta time to 50ms
const MAX_DELTA_TIME: f32 = 1.0 / 20.0;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// IP address to bind to, defaults to this machine's LAN address
    #[clap(short = 'H', long)]
    host: Option<IpAddr>,
    /// Port to listen on
    #[clap(short, long, default_value_t = PORT)]
    port: u16,
    /// Simulation ticks per second
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Snapshot broadcasts per second
    #[clap(short, long, default_value = "60")]
    broadcast_rate: u32,
    /// Seconds of silence after which a player is dropped
    #[clap(short, long, default_value = "5")]
    session_timeout: u64,
    /// Take part in the match from this console
    #[clap(long)]
    host_player: bool,
}

/// Binds the server, starts the network thread and runs the fixed-rate tick
/// loop together with the operator console on this thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let host = args.host.unwrap_or_else(discover_local_ip);
    let config = ServerConfig {
        bind: SocketAddr::new(host, args.port),
        broadcast_interval: rate_to_interval(args.broadcast_rate),
        session_timeout: Duration::from_secs(args.session_timeout),
        tick_rate: args.tick_rate,
        host_player: args.host_player,
        ..ServerConfig::default()
    };

    let mut server = Server::bind(config.clone(), Arena::new())?;
    server.start()?;
    println!("Server listening on {}", server.local_addr());
    if config.host_player {
        println!("{}", HOST_HELP);
    }

    let result = run_game_loop(server.game(), config.tick_duration()).await;
    server.stop();
    result
}

async fn run_game_loop(game: SharedGame<Arena>, tick: Duration) -> Result<(), Box<dyn Error>> {
    let mut interval_timer = interval(tick);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_update = Instant::now();

    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;
    let mut shown: Option<MatchState> = None;
    let mut host_input = HostInput::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let state = game.read().await.state();
        if shown != Some(state) {
            print!("{}", Menu::for_state(state));
            shown = Some(state);
        }

        tokio::select! {
            _ = interval_timer.tick() => {
                let now = Instant::now();
                let mut delta_time = (now - last_update).as_secs_f32();
                last_update = now;

                if delta_time > MAX_DELTA_TIME {
                    warn!("Large delta time detected ({:.3}s), capping to {:.3}s", delta_time, MAX_DELTA_TIME);
                    delta_time = MAX_DELTA_TIME;
                }

                let mut game = game.write().await;
                game.set_host_controls(host_input.next_controls());
                game.tick(delta_time);
            }
            line = console.next_line(), if console_open => {
                match line? {
                    Some(line) => {
                        if run_command(&game, &mut host_input, &line).await == Flow::Exit {
                            break;
                        }
                    }
                    None => {
                        info!("Console closed, serving until Ctrl+C");
                        console_open = false;
                    }
                }
            }
            _ = &mut shutdown => {
                println!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    Ok(())
}

/// Looks the typed line up in the current state's menu and runs it.
async fn run_command(game: &SharedGame<Arena>, host_input: &mut HostInput, line: &str) -> Flow {
    if line.trim().is_empty() {
        return Flow::Continue;
    }

    let mut game = game.write().await;
    if game.is_hosted() {
        if let Some(command) = HostCommand::parse(line) {
            host_input.apply(command);
            return Flow::Continue;
        }
    }

    let menu = Menu::for_state(game.state());
    let Some(action) = menu.select(line) else {
        println!("Unknown command {:?}", line.trim());
        print!("{}", menu);
        return Flow::Continue;
    };

    if action == MenuAction::Start && game.participant_count() < 2 {
        warn!(
            "Starting with {} player(s); the match ends on the first tick",
            game.participant_count()
        );
    }

    match action.apply(&mut *game) {
        Ok(flow) => flow,
        Err(e) => {
            println!("{}", e);
            Flow::Continue
        }
    }
}
