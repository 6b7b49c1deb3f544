//! Coin Pusher - headless host
//!
//! Runs a session with autoplay for a fixed span of simulated frames, forwarding events to
//! a logging sink, then prints the economy save envelope as JSON.
//!
//! Usage: `coin-pusher [config.json]`

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;
#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use coin_pusher::{AudioSink, LogAudio, Session, SimConfig};

/// Host frame interval (60 Hz)
#[cfg(not(target_arch = "wasm32"))]
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Seconds of play
#[cfg(not(target_arch = "wasm32"))]
const RUN_SECONDS: u32 = 10;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    log::info!("Coin Pusher (headless) starting...");

    let mut config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(Path::new(&path)),
        None => SimConfig::default(),
    };
    config.autoplay = true;

    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to start session: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut audio = LogAudio::new();

    let frames = RUN_SECONDS * 60;
    let mut now_ms = 0.0;
    for _ in 0..=frames {
        let Some(report) = session.frame(now_ms) else {
            break;
        };
        for effect in &report.events {
            audio.play(*effect);
        }
        if let Some(fps) = report.fps {
            log::info!(
                "fps {} | balance {} | score {} | net {} | coins {}",
                fps,
                report.economy.balance,
                report.economy.score,
                report.economy.net_profit,
                report.snapshot.visible_count()
            );
        }
        now_ms += FRAME_MS;
    }

    if let Some(state) = session.state() {
        log::info!("Stats: {:?}", state.stats());
    }
    log::info!("{} events", audio.played());

    let envelope = session.save_envelope(now_ms);
    session.stop();

    match envelope.map(|e| e.to_json()) {
        Some(Ok(json)) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Some(Err(e)) => {
            log::error!("Failed to serialize save: {}", e);
            ExitCode::FAILURE
        }
        None => ExitCode::FAILURE,
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive `Session` from the library; there is no wasm entry point here
}
