//! Seats three scripted bots at one table and plays a few hands end to end,
//! logging the event stream.
//!
//! ```text
//! RUST_LOG=debug cargo run -p holdem-table --bin table_demo
//! ```

use anyhow::Result;
use holdem_domain::{ActionType, Chips, HandEventKind, LegalAction, TableConfig};
use holdem_table::{init_tracing, spawn_room};
use rand::Rng;
use rand::rngs::ThreadRng;
use tracing::{debug, info};

const HANDS_TO_PLAY: u64 = 5;

fn main() -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run())
}

async fn run() -> Result<()> {
    init_tracing("table-demo");

    let room = spawn_room(TableConfig::default(), 32);
    let mut events = room.subscribe();
    let mut rng = rand::thread_rng();

    for (id, name, seat) in [
        ("alice", "Alice", 0),
        ("bob", "Bob", 1),
        ("carol", "Carol", 2),
    ] {
        room.add_player(id, name, seat)
            .await
            .map_err(anyhow::Error::msg)?;
    }

    room.start_hand().await.map_err(anyhow::Error::msg)?;

    let mut hands_played = 0;
    while let Ok(event) = events.recv().await {
        debug!(payload = %serde_json::to_string(&event)?, "event");

        match event.kind {
            HandEventKind::ActionOn {
                player_id,
                legal_actions,
                pot,
                ..
            } => {
                let (action, amount) = choose(&mut rng, &legal_actions);
                info!(player = %player_id, ?action, pot = %pot, "bot acts");
                room.act(player_id, action, amount)
                    .await
                    .map_err(anyhow::Error::msg)?;
            }
            HandEventKind::Community { cards, street } => {
                let board: Vec<String> = cards.iter().map(ToString::to_string).collect();
                info!(?street, board = %board.join(" "), "board");
            }
            HandEventKind::Showdown { results } => {
                for entry in results {
                    let cards: Vec<String> =
                        entry.hole_cards.iter().map(ToString::to_string).collect();
                    let hand = entry
                        .hand
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "mucked".to_string());
                    info!(
                        player = %entry.player_id,
                        cards = %cards.join(" "),
                        hand = %hand,
                        won = %entry.win_amount,
                        "showdown"
                    );
                }
            }
            HandEventKind::HandEnd { players } => {
                for player in &players {
                    info!(player = %player.id, chips = %player.chips, "stack");
                }
                hands_played += 1;
                if hands_played >= HANDS_TO_PLAY
                    || !room.can_start_hand().await.map_err(anyhow::Error::msg)?
                {
                    break;
                }
                room.start_hand().await.map_err(anyhow::Error::msg)?;
            }
            _ => {}
        }
    }

    info!(hands_played, "demo finished");
    Ok(())
}

/// Passive-aggressive bot: mostly checks and calls, raises a fifth of the
/// time, folds to big bets occasionally.
fn choose(rng: &mut ThreadRng, legal: &[LegalAction]) -> (ActionType, Option<Chips>) {
    let find = |kind: ActionType| legal.iter().find(|a| a.action_type == kind);

    if let Some(raise) = find(ActionType::Raise)
        && rng.gen_bool(0.2)
        && let (Some(min), Some(max)) = (raise.min_amount, raise.max_amount)
    {
        return (
            ActionType::Raise,
            Some(Chips(rng.gen_range(min.as_u64()..=max.as_u64()))),
        );
    }
    if find(ActionType::Check).is_some() {
        return (ActionType::Check, None);
    }
    if find(ActionType::Call).is_some() {
        if rng.gen_bool(0.85) {
            return (ActionType::Call, None);
        }
        return (ActionType::Fold, None);
    }
    (ActionType::Fold, None)
}
