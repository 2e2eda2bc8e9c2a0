use std::cell::{Cell, RefCell};
use std::net::{SocketAddr, ToSocketAddrs};

use clap::Parser;
use connection::RoamingSocket;
use crypto::Role;
use predict::PredictionEngine;
use state::{KeystrokeState, TerminalState};
use tether::config::ClientConfig;
use tether::Orchestrator;

const TERMINAL_ROWS: usize = 24;
const TERMINAL_COLS: usize = 80;

/// Grace period and expiration window handed to the prediction engine on
/// every keystroke (§4.6). The orchestrator's live SRTT isn't reachable from
/// inside these closures — it's borrowed mutably for the duration of `run` —
/// so these track mosh's own fixed defaults rather than adapting per-sample.
const PREDICTION_GRACE_MS: u64 = 50;
const PREDICTION_EXPIRATION_MS: u64 = 1000;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let config = ClientConfig::parse();

    let key = config.key().unwrap_or_else(|e| fail(&e));
    let mode = config.prediction_mode().unwrap_or_else(|e| fail(&e));

    let peer_addr = match resolve(&config.host, config.port) {
        Ok(addr) => addr,
        Err(e) => fail(&format!("could not resolve {}:{}: {e}", config.host, config.port)),
    };

    let mut socket = match RoamingSocket::bind_dual_stack(0).await {
        Ok(socket) => socket,
        Err(e) => fail(&format!("failed to bind a local UDP socket: {e}")),
    };
    socket.set_initial_peer(peer_addr);

    let local_keystrokes = KeystrokeState::new();
    let remote_terminal = TerminalState::new(TERMINAL_ROWS, TERMINAL_COLS);
    let mut orchestrator = Orchestrator::new(socket, &key, Role::Client, config.mtu, local_keystrokes, remote_terminal);

    let engine = RefCell::new(PredictionEngine::new(mode));
    let was_stale = Cell::new(false);
    let stdin = tokio::io::stdin();

    let session = orchestrator.run(
        stdin,
        |bytes, remote_terminal| {
            let now = common_types::now_ms();
            let mut engine = engine.borrow_mut();
            for &byte in bytes {
                engine.predict_keystroke(now, byte, remote_terminal, PREDICTION_GRACE_MS, PREDICTION_EXPIRATION_MS);
            }
        },
        |remote_terminal, server_time_ms, is_stale| {
            let now = common_types::now_ms();
            engine.borrow_mut().reconcile(now, server_time_ms, remote_terminal);
            let display = engine.borrow().render(now, remote_terminal);
            render_to_stdout(&display);
            announce_staleness(&was_stale, is_stale);
        },
    );

    tokio::select! {
        result = session => {
            if let Err(e) = result {
                log::error!("session ended: {e}");
                eprintln!("[connection lost: {e}]");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("received interrupt, exiting");
            std::process::exit(0);
        }
    }
}

fn resolve(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no address found"))
}

/// A minimal framebuffer dump: clear the screen and print every row. A real
/// client would diff against what's already on screen and move the cursor
/// surgically; full terminal rendering is out of scope here (§6).
fn render_to_stdout(display: &TerminalState) {
    let (rows, cols) = display.dimensions();
    print!("\x1b[H\x1b[2J");
    for row in 0..rows {
        let line: String = (0..cols).map(|col| display.get(row, col).ch).collect();
        println!("{line}");
    }
}

/// Prints the "[connection lost]"/"[connection restored]" transition banner
/// exactly once per edge (§7), not on every render.
fn announce_staleness(was_stale: &Cell<bool>, is_stale: bool) {
    if is_stale && !was_stale.get() {
        eprintln!("[connection lost]");
    } else if !is_stale && was_stale.get() {
        eprintln!("[connection restored]");
    }
    was_stale.set(is_stale);
}

fn fail(message: &impl std::fmt::Display) -> ! {
    eprintln!("tether-client: {message}");
    std::process::exit(1);
}
