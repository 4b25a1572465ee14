mod config;
mod server;
mod session;
mod simulation;

use std::io::BufRead;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use config::ServerConfig;
use server::GameServer;
use simulation::Simulation;
use skirmish::{arena, WorldMap, DEFAULT_TCP_PORT, DEFAULT_TICK_RATE, DEFAULT_UDP_PORT};

#[derive(Parser)]
#[command(name = "skirmish-server")]
#[command(about = "Skirmish authoritative game server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(long, default_value_t = DEFAULT_TCP_PORT)]
    tcp_port: u16,

    #[arg(long, default_value_t = DEFAULT_UDP_PORT)]
    udp_port: u16,

    #[arg(short, long, default_value_t = DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(short, long, help = "JSON map file; defaults to the built-in arena")]
    map: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: args.bind,
        tcp_port: args.tcp_port,
        udp_port: args.udp_port,
        tick_rate: args.tick_rate,
        map_path: args.map,
    };

    let map = match &config.map_path {
        Some(path) => WorldMap::from_file(path)
            .with_context(|| format!("failed to load map {}", path.display()))?,
        None => arena(),
    };

    let mut server = GameServer::start(config, map).context("failed to start server")?;

    {
        let running = server.running();
        let simulation = Arc::clone(server.simulation());
        let tcp_addr = server.tcp_addr();
        let udp_addr = server.udp_addr();
        thread::spawn(move || control_loop(running, simulation, tcp_addr, udp_addr));
    }

    server.run();
    server.shutdown();

    Ok(())
}

/// Console commands on stdin. With stdin closed (a service deployment) the
/// loop ends immediately and the server just runs until killed.
fn control_loop(
    running: Arc<AtomicBool>,
    simulation: Arc<Simulation>,
    tcp_addr: SocketAddr,
    udp_addr: SocketAddr,
) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "quit" | "stop" => {
                running.store(false, Ordering::SeqCst);
                return;
            }
            "status" => {
                println!(
                    "tick {}, {} players, sessions on {}, datagrams on {}",
                    simulation.tick(),
                    simulation.player_count(),
                    tcp_addr,
                    udp_addr
                );
            }
            "" => {}
            other => println!("unknown command {:?} (try status, quit)", other),
        }
    }
}
