mod game;
mod input;
mod prediction;
mod remote;
mod session;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use skirmish::net::{MoveKeys, DEFAULT_CLIENT_RATE, DEFAULT_TCP_PORT};

use game::ClientGame;

#[derive(Parser)]
#[command(name = "skirmish-client")]
#[command(about = "Skirmish game client")]
struct Args {
    #[arg(short, long, help = "Server address, e.g. 127.0.0.1:27800")]
    server: Option<String>,

    #[arg(short, long, default_value_t = DEFAULT_CLIENT_RATE)]
    rate: u32,

    #[arg(short, long, default_value_t = 10, help = "Seconds to stay connected")]
    duration: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let server_addr = args
        .server
        .unwrap_or_else(|| format!("127.0.0.1:{DEFAULT_TCP_PORT}"));

    let mut game = ClientGame::connect(server_addr.as_str(), args.rate)
        .with_context(|| format!("failed to connect to {server_addr}"))?;

    log::info!(
        "connected as player {} ({} walls in map)",
        game.client_id(),
        game.map().walls.len()
    );

    walk_pattern(&game, Duration::from_secs(args.duration));

    let (position, _) = game.local_pose();
    let stats = game.stats();
    game.stop().context("disconnect failed")?;
    log::info!(
        "session over at ({:.2}, {:.2}): {} datagrams sent, {} received",
        position.x,
        position.y,
        stats.datagrams_sent,
        stats.datagrams_received
    );

    Ok(())
}

/// Scripted movement standing in for a real input device: walk forward,
/// sweep the view slowly, switch strafe direction every couple of seconds
/// with a pointer flick toward the new side.
fn walk_pattern(game: &ClientGame, duration: Duration) {
    let input = game.input();
    let prediction = game.prediction();
    let deadline = Instant::now() + duration;

    input.press(MoveKeys::FORWARD);
    input.press(MoveKeys::LEFT);

    let mut strafe_left = true;
    let mut steps = 0u32;
    let mut last_report = Instant::now();

    while Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
        input.turn_radians(0.02);

        steps += 1;
        if steps % 40 == 0 {
            strafe_left = !strafe_left;
            if strafe_left {
                input.release(MoveKeys::RIGHT);
                input.press(MoveKeys::LEFT);
                input.turn(40.0);
            } else {
                input.release(MoveKeys::LEFT);
                input.press(MoveKeys::RIGHT);
                input.turn(-40.0);
            }
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            let body = prediction.body();
            log::info!(
                "tick {}: at ({:.2}, {:.2}) facing {:.2}, speed {:.3}, {} unacked, {} others in view",
                prediction.tick(),
                body.position.x,
                body.position.y,
                body.view_angle,
                body.velocity.length(),
                prediction.pending_len(),
                game.remote_poses().len()
            );
            last_report = Instant::now();
        }
    }

    // Let go of everything and coast to a stop before disconnecting.
    input.set_keys(MoveKeys::empty());
    thread::sleep(Duration::from_millis(300));
}
