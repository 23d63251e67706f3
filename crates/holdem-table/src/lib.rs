mod telemetry;

pub use telemetry::{init_tracing, init_tracing_with_filter};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use holdem_domain::{
    ActionType, Chips, HandEvent, LegalAction, PlayerId, PlayerPublic, SeatIndex, TableConfig,
};
use holdem_engine::{EventSink, TableEngine};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

/// Everything the operator can ask a room to do. All engine access is
/// serialized through this mailbox, which is the concurrency model the
/// engine requires.
#[derive(Debug)]
pub enum RoomCommand {
    AddPlayer {
        id: PlayerId,
        name: String,
        seat: SeatIndex,
        reply: oneshot::Sender<Result<(), String>>,
    },
    RemovePlayer {
        id: PlayerId,
        reply: oneshot::Sender<Result<(), String>>,
    },
    SetConnected {
        id: PlayerId,
        connected: bool,
        reply: oneshot::Sender<Result<(), String>>,
    },
    CanStartHand {
        reply: oneshot::Sender<bool>,
    },
    StartHand {
        reply: oneshot::Sender<Result<(), String>>,
    },
    Act {
        id: PlayerId,
        action: ActionType,
        amount: Option<Chips>,
        reply: oneshot::Sender<Result<(), String>>,
    },
    LegalActions {
        id: PlayerId,
        reply: oneshot::Sender<Vec<LegalAction>>,
    },
    Roster {
        reply: oneshot::Sender<Vec<PlayerPublic>>,
    },
}

/// The engine's sink inside the actor: events queue up during an engine
/// call and are re-broadcast once it returns, so nothing ever re-enters
/// the engine.
#[derive(Debug, Default, Clone)]
struct QueueSink {
    queue: Arc<Mutex<VecDeque<HandEvent>>>,
}

impl EventSink for QueueSink {
    fn emit(&self, event: &HandEvent) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(event.clone());
        }
    }
}

/// Cloneable client side of one room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
    events: broadcast::Sender<HandEvent>,
}

impl RoomHandle {
    /// Live feed of hand events. Slow subscribers may observe `Lagged`.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HandEvent> {
        self.events.subscribe()
    }

    pub async fn add_player(
        &self,
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        seat: SeatIndex,
    ) -> Result<(), String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::AddPlayer {
            id: id.into(),
            name: name.into(),
            seat,
            reply,
        })
        .await?;
        rx.await.map_err(closed)?
    }

    pub async fn remove_player(&self, id: impl Into<PlayerId>) -> Result<(), String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::RemovePlayer {
            id: id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(closed)?
    }

    pub async fn set_connected(
        &self,
        id: impl Into<PlayerId>,
        connected: bool,
    ) -> Result<(), String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::SetConnected {
            id: id.into(),
            connected,
            reply,
        })
        .await?;
        rx.await.map_err(closed)?
    }

    pub async fn can_start_hand(&self) -> Result<bool, String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::CanStartHand { reply }).await?;
        rx.await.map_err(closed)
    }

    pub async fn start_hand(&self) -> Result<(), String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::StartHand { reply }).await?;
        rx.await.map_err(closed)?
    }

    pub async fn act(
        &self,
        id: impl Into<PlayerId>,
        action: ActionType,
        amount: Option<Chips>,
    ) -> Result<(), String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Act {
            id: id.into(),
            action,
            amount,
            reply,
        })
        .await?;
        rx.await.map_err(closed)?
    }

    pub async fn legal_actions(&self, id: impl Into<PlayerId>) -> Result<Vec<LegalAction>, String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::LegalActions {
            id: id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(closed)
    }

    pub async fn roster(&self) -> Result<Vec<PlayerPublic>, String> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Roster { reply }).await?;
        rx.await.map_err(closed)
    }

    async fn send(&self, command: RoomCommand) -> Result<(), String> {
        self.sender.send(command).await.map_err(closed)
    }
}

fn closed<E>(_: E) -> String {
    "room closed".to_string()
}

/// Spawns the actor task owning one engine. The task sleeps on either the
/// mailbox or the engine's action deadline; expiry delivers a timeout tick
/// that auto-folds the stalled player.
#[must_use]
pub fn spawn_room(config: TableConfig, queue_capacity: usize) -> RoomHandle {
    let (tx, mut rx) = mpsc::channel(queue_capacity);
    let (event_tx, _) = broadcast::channel(256);
    let handle = RoomHandle {
        sender: tx,
        events: event_tx.clone(),
    };

    tokio::spawn(async move {
        let sink = QueueSink::default();
        let mut engine = TableEngine::new(config, Arc::new(sink.clone()));

        loop {
            let command = match engine.action_deadline() {
                Some(deadline) => {
                    let wait = (deadline - Utc::now()).to_std().unwrap_or_default();
                    tokio::select! {
                        command = rx.recv() => match command {
                            Some(command) => Some(command),
                            None => break,
                        },
                        () = tokio::time::sleep(wait) => None,
                    }
                }
                None => match rx.recv().await {
                    Some(command) => Some(command),
                    None => break,
                },
            };

            match command {
                Some(command) => apply_command(&mut engine, command),
                None => {
                    if engine.tick_timeout(Utc::now()) {
                        debug!(table = %engine.table_id(), "timeout tick auto-folded");
                    }
                }
            }

            forward_events(&sink, &event_tx);
        }
        debug!("room actor stopped");
    });

    handle
}

fn apply_command(engine: &mut TableEngine, command: RoomCommand) {
    match command {
        RoomCommand::AddPlayer {
            id,
            name,
            seat,
            reply,
        } => {
            let result = engine.add_player(id, name, seat).map_err(|e| e.to_string());
            let _ = reply.send(result);
        }
        RoomCommand::RemovePlayer { id, reply } => {
            let result = engine.remove_player(&id).map_err(|e| e.to_string());
            let _ = reply.send(result);
        }
        RoomCommand::SetConnected {
            id,
            connected,
            reply,
        } => {
            let result = engine
                .set_connected(&id, connected)
                .map_err(|e| e.to_string());
            let _ = reply.send(result);
        }
        RoomCommand::CanStartHand { reply } => {
            let _ = reply.send(engine.can_start_hand());
        }
        RoomCommand::StartHand { reply } => {
            let result = engine.start_hand().map_err(|e| e.to_string());
            let _ = reply.send(result);
        }
        RoomCommand::Act {
            id,
            action,
            amount,
            reply,
        } => {
            let result = engine
                .handle_action(&id, action, amount)
                .map_err(|e| e.to_string());
            let _ = reply.send(result);
        }
        RoomCommand::LegalActions { id, reply } => {
            let _ = reply.send(engine.legal_actions(&id));
        }
        RoomCommand::Roster { reply } => {
            let _ = reply.send(engine.roster());
        }
    }
}

fn forward_events(sink: &QueueSink, tx: &broadcast::Sender<HandEvent>) {
    let drained: Vec<HandEvent> = match sink.queue.lock() {
        Ok(mut queue) => queue.drain(..).collect(),
        Err(_) => return,
    };
    for event in drained {
        // No subscribers is fine; events are observability, not state.
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_domain::HandEventKind;
    use std::time::Duration;

    fn three_seat_config() -> TableConfig {
        TableConfig {
            action_timeout: Duration::from_secs(30),
            ..TableConfig::default()
        }
    }

    async fn next_event(rx: &mut broadcast::Receiver<HandEvent>) -> HandEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within deadline")
            .expect("channel open")
    }

    #[tokio::test]
    async fn commands_round_trip_and_events_broadcast() {
        let room = spawn_room(three_seat_config(), 32);
        let mut events = room.subscribe();

        room.add_player("a", "A", 0).await.expect("seat a");
        room.add_player("b", "B", 1).await.expect("seat b");
        assert!(room.can_start_hand().await.expect("reply"));
        assert_eq!(room.roster().await.expect("reply").len(), 2);

        room.start_hand().await.expect("start");
        let first = next_event(&mut events).await;
        assert!(matches!(first.kind, HandEventKind::HandStart { .. }));

        // Drive the hand from the event stream until it completes.
        let mut done = false;
        while !done {
            let event = next_event(&mut events).await;
            match event.kind {
                HandEventKind::ActionOn { player_id, .. } => {
                    room.act(player_id, ActionType::Fold, None)
                        .await
                        .expect("fold accepted");
                }
                HandEventKind::HandEnd { players } => {
                    let total: Chips = players.iter().map(|p| p.chips).sum();
                    assert_eq!(total, Chips(400));
                    done = true;
                }
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn illegal_commands_report_errors() {
        let room = spawn_room(three_seat_config(), 8);
        room.add_player("a", "A", 0).await.expect("seat a");

        let err = room.add_player("b", "B", 0).await.expect_err("seat taken");
        assert!(err.contains("taken"));
        let err = room.start_hand().await.expect_err("not enough players");
        assert!(err.contains("players"));
        let err = room.remove_player("ghost").await.expect_err("unknown");
        assert!(err.contains("not seated"));
    }

    #[tokio::test]
    async fn stalled_player_is_folded_by_the_timer() {
        let config = TableConfig {
            action_timeout: Duration::from_millis(50),
            ..TableConfig::default()
        };
        let room = spawn_room(config, 8);
        let mut events = room.subscribe();

        room.add_player("a", "A", 0).await.expect("seat a");
        room.add_player("b", "B", 1).await.expect("seat b");
        room.start_hand().await.expect("start");

        // Nobody acts: the timer folds the opener, then the hand resolves.
        let mut saw_auto_fold = false;
        loop {
            let event = next_event(&mut events).await;
            match event.kind {
                HandEventKind::PlayerActed {
                    action: ActionType::Fold,
                    ..
                } => saw_auto_fold = true,
                HandEventKind::HandEnd { .. } => break,
                _ => {}
            }
        }
        assert!(saw_auto_fold);
    }
}
