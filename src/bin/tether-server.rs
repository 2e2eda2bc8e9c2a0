use std::cell::Cell;
use std::io;
use std::ops::RangeInclusive;

use clap::Parser;
use connection::RoamingSocket;
use crypto::Role;
use state::{KeystrokeState, TerminalState};
use tether::config::ServerConfig;
use tether::Orchestrator;

const TERMINAL_ROWS: usize = 24;
const TERMINAL_COLS: usize = 80;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let config = ServerConfig::parse();

    if config.verbose {
        log::info!("verbose logging requested; set RUST_LOG for finer control");
    }

    let port_range = config.port_range().unwrap_or_else(|e| fail(&e));
    let key = config.key().unwrap_or_else(|e| fail(&e));

    let socket = match bind_first_free_port(port_range).await {
        Ok(socket) => socket,
        Err(e) => fail(&format!("failed to bind a UDP port in the configured range: {e}")),
    };
    let bound_port = socket.local_addr().expect("a just-bound socket has a local address").port();

    // Printed exactly once, and only this: the handshake line a wrapper
    // script parses to discover where and how to connect (§6).
    println!("MOSH_CONNECT {} {}", bound_port, key.to_base64());

    let local_terminal = TerminalState::new(TERMINAL_ROWS, TERMINAL_COLS);
    let remote_keystrokes = KeystrokeState::new();
    let mut orchestrator = Orchestrator::new(socket, &key, Role::Server, config.mtu, local_terminal, remote_keystrokes);

    // The real PTY the shell is attached to is the named-but-out-of-scope
    // external collaborator (§6); stdin stands in for "bytes produced by
    // the local session" so this binary exercises the transport end to end.
    let pty_output = tokio::io::stdin();

    let was_stale = Cell::new(false);

    let session = orchestrator.run(
        pty_output,
        |_bytes, _remote_keystrokes| {},
        |received_keystrokes, _server_time_ms, is_stale| {
            log::trace!("{} bytes of keystrokes confirmed from client", received_keystrokes.len());
            announce_staleness(&was_stale, is_stale);
        },
    );

    tokio::select! {
        result = session => {
            if let Err(e) = result {
                log::error!("session ended: {e}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("received interrupt, exiting");
            std::process::exit(0);
        }
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

async fn bind_first_free_port(range: RangeInclusive<u16>) -> io::Result<RoamingSocket> {
    let mut last_err = None;
    for port in range {
        match RoamingSocket::bind_dual_stack(port).await {
            Ok(socket) => return Ok(socket),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "port range is empty")))
}

fn fail(message: &impl std::fmt::Display) -> ! {
    eprintln!("tether-server: {message}");
    std::process::exit(1);
}
