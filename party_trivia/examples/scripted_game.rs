//! Scripted Game Example
//!
//! Runs a short two-player game against the built-in sample catalog and
//! prints every event the session emits.

use party_trivia::{
    audio::TimedAudio,
    catalog::InMemoryCatalog,
    game::{CommandOutcome, PowerCardKind, RoundPhase, SessionCommand},
    history::{MemoryStandingsRecorder, StandingsRecorder},
    session::{Collaborators, SessionConfig, SessionHandle, SessionManager},
};
use std::{sync::Arc, time::Duration};

async fn wait_for(handle: &SessionHandle, phase: RoundPhase) {
    loop {
        let current = handle.snapshot().await.ok().and_then(|s| s.round.map(|r| r.phase));
        if current == Some(phase) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn run(handle: &SessionHandle, command: SessionCommand) {
    let label = command.label();
    match handle.execute(command).await {
        Ok(outcome) => println!("> {label}: {outcome:?}"),
        Err(e) => println!("> {label} rejected ({}): {e}", e.kind()),
    }
}

#[tokio::main]
async fn main() {
    println!("=== Party Trivia Scripted Game ===\n");

    let recorder = Arc::new(MemoryStandingsRecorder::new());
    let manager = SessionManager::new(Collaborators {
        catalog: Arc::new(InMemoryCatalog::sample().with_seed(2024)),
        audio: Arc::new(TimedAudio),
        recorder: Some(recorder.clone()),
    });

    let mut config = SessionConfig::new("Scripted");
    config.seed = Some(7);
    config.settings.betting_secs = 2;

    let Ok(id) = manager.create_session(config).await else {
        eprintln!("invalid session config");
        return;
    };
    let Some(handle) = manager.get_session(id).await else {
        return;
    };

    let Ok((_, _, mut updates)) = handle.subscribe(64).await else {
        return;
    };
    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            for event in update.events {
                println!("  * {event}");
            }
        }
    });

    for name in ["Ada", "Grace"] {
        run(&handle, SessionCommand::AddPlayer { name: name.into() }).await;
    }
    run(&handle, SessionCommand::StartGame).await;

    // Round 1: no betting, Ada answers correctly.
    run(&handle, SessionCommand::RequestNextRound).await;
    wait_for(&handle, RoundPhase::Question).await;
    run(&handle, SessionCommand::PlaceBet { player_id: 1, token: 1 }).await;
    run(&handle, SessionCommand::RevealAnswer { winner: Some(1) }).await;
    run(&handle, SessionCommand::PrepareNextRound).await;

    // Grace scans a steal card and takes one of Ada's.
    run(
        &handle,
        SessionCommand::AcquireCard {
            player_id: 1,
            kind: PowerCardKind::Boost,
        },
    )
    .await;
    if let Ok(CommandOutcome::CardAcquired { card_id }) = handle
        .execute(SessionCommand::AcquireCard {
            player_id: 2,
            kind: PowerCardKind::Steal,
        })
        .await
    {
        run(&handle, SessionCommand::UsePowerCard { player_id: 2, card_id }).await;
        run(
            &handle,
            SessionCommand::SelectStealTarget {
                player_id: 2,
                target_id: 1,
            },
        )
        .await;
    }

    // Round 2: betting opens after the preview.
    run(&handle, SessionCommand::RequestNextRound).await;
    wait_for(&handle, RoundPhase::Betting).await;
    run(&handle, SessionCommand::PlaceBet { player_id: 2, token: 3 }).await;
    wait_for(&handle, RoundPhase::Question).await;
    run(&handle, SessionCommand::RevealAnswer { winner: Some(2) }).await;

    run(&handle, SessionCommand::EndSession).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    if let Ok(standings) = recorder.recent(1).await
        && let Some(last) = standings.first()
    {
        println!("\nFinal standings for '{}':", last.session_name);
        for entry in &last.entries {
            println!("  {}. {} - {} points", entry.rank, entry.name, entry.score);
        }
    }

    manager.close_all().await;
}
