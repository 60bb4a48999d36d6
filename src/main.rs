//! Arena Four Demo Driver
//!
//! Runs a scripted match against the standard arena and logs events as they
//! happen. Useful for eyeballing simulation behavior without a renderer.

use anyhow::Context;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use arena_four::game::{arena, events::GameEvent, frame, IntentFrame, MatchStatus, SimState};
use arena_four::{FRAME_DT, TICK_RATE, VERSION};

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Arena Four Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let world = arena::standard_world().context("building standard arena")?;
    let tubes = arena::standard_tubes();
    let mut state = SimState::new(world, tubes, 12345);
    state.set_stabilized(true);

    // Script: alternate transits by teleporting each avatar to a tube entry
    // once the previous transit has finished. Red feeds columns 0..4 while
    // Yellow feeds column 6, so Red wins on its fourth piece.
    let schedule: [(usize, usize); 7] = [
        (0, 0),
        (1, 6),
        (0, 1),
        (1, 6),
        (0, 2),
        (1, 6),
        (0, 3),
    ];
    let mut next = 0;

    let idle = [IntentFrame::new(), IntentFrame::new()];
    let mut total_events = 0;

    for _ in 0..(60 * TICK_RATE) {
        // Launch the next scripted transit once both avatars are free
        if next < schedule.len()
            && state.avatars.iter().all(|a| a.transit.tracks_tubes())
            && !state.board.status().is_decided()
        {
            let (slot, tube) = schedule[next];
            state.avatars[slot].position = state.tubes[tube].entry();
            next += 1;
        }

        let result = frame(&mut state, &idle, FRAME_DT);
        for event in &result.events {
            match event {
                GameEvent::PiecePlaced { row, col, color, .. } => {
                    info!(?color, row, col, "piece placed");
                }
                GameEvent::MatchEnded { status, .. } => {
                    info!(?status, "match ended");
                }
                _ => {}
            }
        }
        total_events += result.events.len();

        if result.status.is_decided() && state.scheduler.active_count() == 0 {
            break;
        }
    }

    let status = state.board.status();
    info!(
        hash = %hex::encode(state.compute_hash()),
        frames = state.frame,
        "final state"
    );

    let summary = json!({
        "frames": state.frame,
        "events": total_events,
        "pieces": state.board.piece_count(),
        "status": match status {
            MatchStatus::InProgress => "in progress".to_string(),
            MatchStatus::Won { color, .. } => format!("{color:?} wins"),
            MatchStatus::Drawn => "draw".to_string(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
