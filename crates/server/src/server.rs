use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use skirmish::{Datagram, DatagramPayload, Ticker, UdpEndpoint, WorldMap};

use crate::config::ServerConfig;
use crate::session;
use crate::simulation::Simulation;

pub struct GameServer {
    endpoint: Arc<UdpEndpoint>,
    simulation: Arc<Simulation>,
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
    tcp_addr: SocketAddr,
}

impl GameServer {
    /// Bind both channels and start the session, receive and tick threads.
    pub fn start(config: ServerConfig, map: WorldMap) -> io::Result<Self> {
        let endpoint = Arc::new(UdpEndpoint::bind((
            config.bind_addr.as_str(),
            config.udp_port,
        ))?);
        let listener = TcpListener::bind((config.bind_addr.as_str(), config.tcp_port))?;
        let tcp_addr = listener.local_addr()?;

        let simulation = Arc::new(Simulation::new(map));
        let running = Arc::new(AtomicBool::new(true));

        log::info!(
            "listening on {} (sessions) / {} (datagrams), {} Hz",
            tcp_addr,
            endpoint.local_addr(),
            config.tick_rate
        );

        let mut threads = Vec::new();

        threads.push(session::spawn_listener(
            listener,
            Arc::clone(&simulation),
            endpoint.port(),
            Arc::clone(&running),
        ));

        {
            let endpoint = Arc::clone(&endpoint);
            let simulation = Arc::clone(&simulation);
            let running = Arc::clone(&running);
            threads.push(thread::spawn(move || {
                receive_loop(&endpoint, &simulation, &running);
            }));
        }

        {
            let endpoint = Arc::clone(&endpoint);
            let simulation = Arc::clone(&simulation);
            let running = Arc::clone(&running);
            let tick_rate = config.tick_rate;
            threads.push(thread::spawn(move || {
                tick_loop(&endpoint, &simulation, &running, tick_rate);
            }));
        }

        Ok(Self {
            endpoint,
            simulation,
            running,
            threads,
            tcp_addr,
        })
    }

    pub fn tcp_addr(&self) -> SocketAddr {
        self.tcp_addr
    }

    pub fn udp_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn simulation(&self) -> &Arc<Simulation> {
        &self.simulation
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Block until the running flag is cleared.
    pub fn run(&self) {
        while self.running.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(200));
        }
    }

    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        log::info!("server stopped at tick {}", self.simulation.tick());
    }
}

fn receive_loop(endpoint: &UdpEndpoint, simulation: &Simulation, running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        match endpoint.recv() {
            Ok(Some((datagram, _))) => {
                if let DatagramPayload::Input(frame) = datagram.payload {
                    simulation.queue_input(frame);
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("receive failed: {}", e);
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

fn tick_loop(
    endpoint: &UdpEndpoint,
    simulation: &Simulation,
    running: &AtomicBool,
    tick_rate: u32,
) {
    let mut ticker = Ticker::from_rate(tick_rate);

    while running.load(Ordering::SeqCst) {
        ticker.wait();

        for (addr, snapshot) in simulation.step() {
            let datagram = Datagram::new(DatagramPayload::Snapshot(snapshot));
            if let Err(e) = endpoint.send_to(&datagram, addr) {
                log::warn!("snapshot to {} failed: {}", addr, e);
            }
        }
    }
}
