use std::cell::Cell;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use holdem_domain::{
    ActionType, Card, Chips, DomainError, HandEventKind, HandId, LegalAction, MAX_SEATS, PlayerId,
    PlayerPublic, SeatIndex, ShowdownEntry, Street, TableConfig, TableId,
};
use tracing::{debug, info, warn};

use crate::betting::BettingRound;
use crate::deck::Deck;
use crate::eval::evaluate_best;
use crate::events::EventSink;
use crate::player::Player;
use crate::pot::{PotContribution, build_side_pots};

#[derive(Debug)]
struct HandState {
    hand_id: HandId,
    street: Street,
    community: Vec<Card>,
    deck: Deck,
    betting: BettingRound,
    active_seat: Option<SeatIndex>,
    deadline: Option<DateTime<Utc>>,
    event_seq: u32,
}

/// One table's hand engine. Owns the roster, conducts hands from blind
/// posting through showdown, and reports everything observable through the
/// event sink.
///
/// Single-threaded and run-to-completion: every public operation finishes
/// before returning, and callers must serialize access (the service layer
/// does so with a mailbox). The sink is called synchronously and must not
/// re-enter the engine.
pub struct TableEngine {
    table_id: TableId,
    config: TableConfig,
    /// Seat-ordered roster. Players are addressed by id from outside and by
    /// seat index internally; nothing holds a reference across operations.
    players: Vec<Player>,
    dealer_seat: Option<SeatIndex>,
    hand_no: u64,
    hand: Option<HandState>,
    sink: Arc<dyn EventSink>,
    emitting: Cell<bool>,
}

impl TableEngine {
    #[must_use]
    pub fn new(config: TableConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            table_id: TableId::new(),
            config,
            players: Vec::new(),
            dealer_seat: None,
            hand_no: 0,
            hand: None,
            sink,
            emitting: Cell::new(false),
        }
    }

    // ---- roster management -------------------------------------------------

    /// Seats a new player with the configured buy-in. Only between hands.
    pub fn add_player(
        &mut self,
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        seat: SeatIndex,
    ) -> Result<(), DomainError> {
        self.assert_not_reentrant();
        if self.hand.is_some() {
            return Err(DomainError::HandInProgress);
        }
        if seat >= MAX_SEATS {
            return Err(DomainError::InvalidSeat(seat));
        }
        if self.players.iter().any(|p| p.seat == seat) {
            return Err(DomainError::SeatTaken(seat));
        }
        let id = id.into();
        if self.players.iter().any(|p| p.id == id) {
            return Err(DomainError::DuplicateId);
        }
        if self.players.len() >= usize::from(MAX_SEATS) {
            return Err(DomainError::RosterFull);
        }

        info!(table = %self.table_id, player = %id, seat, "player seated");
        let player = Player::new(id, name.into(), seat, self.config.buy_in);
        let pos = self.players.partition_point(|p| p.seat < seat);
        self.players.insert(pos, player);
        Ok(())
    }

    /// Between hands, drops the player from the roster. Mid-hand, folds them
    /// (advancing action if they held it) and marks them disconnected so the
    /// end-of-hand purge can collect them.
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<(), DomainError> {
        self.assert_not_reentrant();
        let Some(idx) = self.players.iter().position(|p| p.id == *id) else {
            return Err(DomainError::UnknownPlayer);
        };

        if self.hand.is_none() || !self.players[idx].dealt_in {
            let player = self.players.remove(idx);
            info!(table = %self.table_id, player = %player.id, "player removed");
            return Ok(());
        }

        self.players[idx].is_connected = false;
        if self.players[idx].has_folded {
            return Ok(());
        }
        let seat = self.players[idx].seat;
        info!(table = %self.table_id, player = %id, seat, "player removed mid-hand, folding");
        self.force_fold(seat);
        Ok(())
    }

    pub fn set_connected(&mut self, id: &PlayerId, connected: bool) -> Result<(), DomainError> {
        self.assert_not_reentrant();
        let Some(player) = self.players.iter_mut().find(|p| p.id == *id) else {
            return Err(DomainError::UnknownPlayer);
        };
        player.is_connected = connected;
        debug!(player = %id, connected, "connectivity updated");
        Ok(())
    }

    pub fn set_sitting_out(&mut self, id: &PlayerId, sitting_out: bool) -> Result<(), DomainError> {
        self.assert_not_reentrant();
        let Some(player) = self.players.iter_mut().find(|p| p.id == *id) else {
            return Err(DomainError::UnknownPlayer);
        };
        player.is_sitting_out = sitting_out;
        debug!(player = %id, sitting_out, "sit-out updated");
        Ok(())
    }

    // ---- hand lifecycle ----------------------------------------------------

    #[must_use]
    pub fn can_start_hand(&self) -> bool {
        self.hand.is_none()
            && self
                .players
                .iter()
                .filter(|p| p.eligible_for_next_hand())
                .count()
                >= 2
    }

    pub fn start_hand(&mut self) -> Result<(), DomainError> {
        self.start_hand_with_deck(Deck::shuffled_os())
    }

    /// Starts a hand from a caller-supplied deck, for replays and rigged
    /// tests. The engine trusts its operator for shuffle integrity.
    pub fn start_hand_with_deck(&mut self, deck: Deck) -> Result<(), DomainError> {
        self.assert_not_reentrant();
        if self.hand.is_some() {
            return Err(DomainError::HandInProgress);
        }

        if self
            .players
            .iter()
            .filter(|p| p.eligible_for_next_hand())
            .count()
            < 2
        {
            return Err(DomainError::NotEnoughPlayers);
        }

        // Busted and disconnected players leave the table; sitting-out
        // players keep their seats but are not dealt in.
        self.players
            .retain(|p| p.is_connected && !p.chips.is_zero());
        for player in &mut self.players {
            player.reset_for_hand();
            player.dealt_in = player.eligible_for_next_hand();
        }

        let dealer = self.advance_dealer().ok_or(DomainError::NotEnoughPlayers)?;
        self.hand_no += 1;
        self.hand = Some(HandState {
            hand_id: HandId::new(),
            street: Street::Preflop,
            community: Vec::new(),
            deck,
            betting: BettingRound::new(self.config.big_blind),
            active_seat: None,
            deadline: None,
            event_seq: 0,
        });
        info!(table = %self.table_id, hand_no = self.hand_no, dealer, "hand started");

        // The button posts the small blind at every table size, so heads-up
        // (button small blind, button first to act) needs no special case.
        // A blind a player cannot cover puts them all-in for less.
        let order = self.dealt_in_seats_from(dealer);
        let (sb_seat, bb_seat) = (order[0], order[1 % order.len()]);
        let (small_blind, big_blind) = (self.config.small_blind, self.config.big_blind);
        if let Some(player) = self.players.iter_mut().find(|p| p.seat == sb_seat) {
            player.commit(small_blind);
        }
        if let Some(player) = self.players.iter_mut().find(|p| p.seat == bb_seat) {
            player.commit(big_blind);
        }
        if let Some(hand) = self.hand.as_mut() {
            hand.betting.current_bet = big_blind;
        }

        self.emit(HandEventKind::HandStart {
            dealer_seat: dealer,
            hand_no: self.hand_no,
            players: self.roster(),
        });

        // Two cards each, one at a time around the table. Running the deck
        // dry here is a driver bug, not a table condition: legal play never
        // needs more than 19 of the 52 cards.
        let dealt_count = self.players.iter().filter(|p| p.dealt_in).count();
        let cards = self
            .hand
            .as_mut()
            .expect("hand state just created")
            .deck
            .deal_n(dealt_count * 2)
            .expect("a fresh deck covers every hole card");
        let mut next_card = cards.into_iter();
        for _round in 0..2 {
            for player in self.players.iter_mut().filter(|p| p.dealt_in) {
                if let Some(card) = next_card.next() {
                    player.hole_cards.push(card);
                }
            }
        }
        let dealt: Vec<(PlayerId, [Card; 2])> = self
            .players
            .iter()
            .filter(|p| p.dealt_in)
            .filter_map(|p| match p.hole_cards.as_slice() {
                [first, second] => Some((p.id.clone(), [*first, *second])),
                _ => None,
            })
            .collect();
        for (player_id, cards) in dealt {
            self.emit(HandEventKind::HoleCards { player_id, cards });
        }

        // First voluntary action sits after the big blind; blinds that went
        // all-in are skipped, and with no one able to act the board simply
        // runs out.
        let first = self
            .hand
            .as_ref()
            .and_then(|h| h.betting.find_next_actor(&self.players, bb_seat));
        match first {
            Some(seat) => self.seat_actor(seat),
            None => self.finish_round(),
        }
        Ok(())
    }

    /// Applies an action for the player on action. Anything illegal is
    /// rejected with no state change.
    pub fn handle_action(
        &mut self,
        id: &PlayerId,
        action: ActionType,
        amount: Option<Chips>,
    ) -> Result<(), DomainError> {
        self.assert_not_reentrant();
        let Some(hand) = self.hand.as_mut() else {
            return Err(DomainError::NoActiveHand);
        };
        let Some(seat) = hand.active_seat else {
            return Err(DomainError::NotActivePlayer);
        };
        let Some(player) = self.players.iter_mut().find(|p| p.seat == seat) else {
            return Err(DomainError::UnknownPlayer);
        };
        if player.id != *id {
            warn!(player = %id, "action from a player not on action");
            return Err(DomainError::NotActivePlayer);
        }

        let applied = hand.betting.apply(player, action, amount)?;
        let player_id = player.id.clone();
        let chips = player.chips;
        debug!(
            player = %player_id,
            action = ?applied.action,
            committed = %applied.committed,
            "action applied"
        );

        let pot = self.pot_total();
        self.emit(HandEventKind::PlayerActed {
            player_id,
            action: applied.action,
            amount: applied.new_bet,
            pot,
            chips,
        });
        self.advance_after(seat, true);
        Ok(())
    }

    /// Auto-folds the active player once `now` reaches the recorded
    /// deadline. Returns whether a fold fired; at most one per call.
    pub fn tick_timeout(&mut self, now: DateTime<Utc>) -> bool {
        self.assert_not_reentrant();
        let Some(hand) = self.hand.as_ref() else {
            return false;
        };
        let (Some(seat), Some(deadline)) = (hand.active_seat, hand.deadline) else {
            return false;
        };
        if now < deadline {
            return false;
        }
        warn!(table = %self.table_id, seat, "action timed out, auto-folding");
        self.force_fold(seat);
        true
    }

    // ---- queries -----------------------------------------------------------

    #[must_use]
    pub fn hand_in_progress(&self) -> bool {
        self.hand.is_some()
    }

    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        let seat = self.hand.as_ref()?.active_seat?;
        self.players
            .iter()
            .find(|p| p.seat == seat)
            .map(|p| p.id.clone())
    }

    /// Legal actions for `id`, empty unless they are on action.
    #[must_use]
    pub fn legal_actions(&self, id: &PlayerId) -> Vec<LegalAction> {
        let Some(hand) = self.hand.as_ref() else {
            return Vec::new();
        };
        let Some(seat) = hand.active_seat else {
            return Vec::new();
        };
        self.players
            .iter()
            .find(|p| p.seat == seat && p.id == *id)
            .map(|p| hand.betting.legal_actions(p))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn roster(&self) -> Vec<PlayerPublic> {
        self.players.iter().map(Player::public).collect()
    }

    #[must_use]
    pub fn community(&self) -> Vec<Card> {
        self.hand
            .as_ref()
            .map(|h| h.community.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pot(&self) -> Chips {
        if self.hand.is_some() {
            self.pot_total()
        } else {
            Chips::ZERO
        }
    }

    #[must_use]
    pub fn action_deadline(&self) -> Option<DateTime<Utc>> {
        self.hand.as_ref()?.deadline
    }

    #[must_use]
    pub fn dealer_seat(&self) -> Option<SeatIndex> {
        self.dealer_seat
    }

    #[must_use]
    pub fn hand_no(&self) -> u64 {
        self.hand_no
    }

    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    // ---- internals ---------------------------------------------------------

    fn assert_not_reentrant(&self) {
        debug_assert!(
            !self.emitting.get(),
            "event sink re-entered the engine; queue events instead"
        );
    }

    fn emit(&mut self, kind: HandEventKind) {
        let Some(hand) = self.hand.as_mut() else {
            return;
        };
        hand.event_seq += 1;
        let event = holdem_domain::HandEvent {
            table_id: self.table_id,
            hand_id: hand.hand_id,
            hand_no: self.hand_no,
            event_seq: hand.event_seq,
            occurred_at: Utc::now(),
            kind,
        };
        let sink = Arc::clone(&self.sink);
        self.emitting.set(true);
        sink.emit(&event);
        self.emitting.set(false);
    }

    fn pot_total(&self) -> Chips {
        self.players.iter().map(|p| p.contributed).sum()
    }

    fn contributions(&self) -> Vec<PotContribution> {
        self.players
            .iter()
            .filter(|p| p.dealt_in)
            .map(|p| PotContribution {
                player_id: p.id.clone(),
                total: p.contributed,
                folded: p.has_folded,
                all_in: p.is_all_in && !p.has_folded,
            })
            .collect()
    }

    /// Dealt-in seats in table order, rotated so `start` comes first.
    fn dealt_in_seats_from(&self, start: SeatIndex) -> Vec<SeatIndex> {
        let mut seats: Vec<SeatIndex> = self
            .players
            .iter()
            .filter(|p| p.dealt_in)
            .map(|p| p.seat)
            .collect();
        let pivot = seats.iter().position(|&s| s == start).unwrap_or(0);
        seats.rotate_left(pivot);
        seats
    }

    /// First hand: the button starts on the lowest dealt-in seat. After
    /// that it moves to the next dealt-in seat in index order, wrapping.
    fn advance_dealer(&mut self) -> Option<SeatIndex> {
        let seats: Vec<SeatIndex> = self
            .players
            .iter()
            .filter(|p| p.dealt_in)
            .map(|p| p.seat)
            .collect();
        let dealer = match self.dealer_seat {
            Some(prev) => seats
                .iter()
                .copied()
                .find(|&s| s > prev)
                .or_else(|| seats.first().copied()),
            None => seats.first().copied(),
        }?;
        self.dealer_seat = Some(dealer);
        Some(dealer)
    }

    /// Folds `seat` outside the normal action path (timeout, removal) and
    /// runs the same continuation an acted fold would.
    fn force_fold(&mut self, seat: SeatIndex) {
        let was_active = self.hand.as_ref().and_then(|h| h.active_seat) == Some(seat);
        let player = self
            .players
            .iter_mut()
            .find(|p| p.seat == seat)
            .expect("folding seat is seated");
        player.fold();
        let player_id = player.id.clone();
        let amount = player.current_bet;
        let chips = player.chips;

        let pot = self.pot_total();
        self.emit(HandEventKind::PlayerActed {
            player_id,
            action: ActionType::Fold,
            amount,
            pot,
            chips,
        });
        self.advance_after(seat, was_active);
    }

    /// Post-action continuation: uncontested win, next actor, or round end.
    fn advance_after(&mut self, seat: SeatIndex, was_active: bool) {
        let live: Vec<SeatIndex> = self
            .players
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| p.seat)
            .collect();
        if let [winner] = live.as_slice() {
            self.award_uncontested(*winner);
            return;
        }
        if !was_active {
            // Someone else still holds the action; nothing moves.
            return;
        }

        let next = match self.hand.as_ref() {
            Some(hand) => hand.betting.find_next_actor(&self.players, seat),
            None => return,
        };
        if let Some(hand) = self.hand.as_mut() {
            hand.active_seat = None;
            hand.deadline = None;
        }
        match next {
            Some(next_seat) => self.seat_actor(next_seat),
            None => self.finish_round(),
        }
    }

    /// Puts `seat` on action: records the deadline, then announces it.
    fn seat_actor(&mut self, seat: SeatIndex) {
        let deadline = Utc::now() + self.config.action_timeout;
        let Some(hand) = self.hand.as_mut() else {
            return;
        };
        hand.active_seat = Some(seat);
        hand.deadline = Some(deadline);
        let current_bet = hand.betting.current_bet;
        let Some(player) = self.players.iter().find(|p| p.seat == seat) else {
            return;
        };
        let player_id = player.id.clone();
        let legal_actions = hand.betting.legal_actions(player);
        let pot = self.players.iter().map(|p| p.contributed).sum();

        self.emit(HandEventKind::ActionOn {
            player_id,
            legal_actions,
            pot,
            current_bet,
            deadline,
        });
    }

    /// Closes the betting round, then either opens the next street, runs the
    /// board out for all-in players, or goes to showdown.
    fn finish_round(&mut self) {
        let side_pots = build_side_pots(&self.contributions());
        let pot = self.pot_total();
        self.emit(HandEventKind::PotUpdate { pot, side_pots });

        loop {
            let street = match self.hand.as_ref() {
                Some(hand) => hand.street,
                None => return,
            };
            if street == Street::River {
                self.showdown();
                return;
            }
            let Some(next_street) = street.next() else {
                return;
            };

            let community = {
                let Some(hand) = self.hand.as_mut() else {
                    return;
                };
                hand.betting.begin_street(&mut self.players);
                hand.street = next_street;
                // Exhaustion is a driver bug: the burns and board fit the
                // deck with room to spare.
                hand.deck.burn().expect("deck covers every burn");
                let count = if next_street == Street::Flop { 3 } else { 1 };
                let cards = hand
                    .deck
                    .deal_n(count)
                    .expect("deck covers every board card");
                hand.community.extend(cards);
                hand.community.clone()
            };
            debug!(street = ?next_street, board = %board_string(&community), "community dealt");
            self.emit(HandEventKind::Community {
                cards: community,
                street: next_street,
            });

            let actionable = self.players.iter().filter(|p| p.can_act()).count();
            if actionable > 1 {
                let dealer = self.dealer_seat.unwrap_or_default();
                let first = self
                    .hand
                    .as_ref()
                    .and_then(|h| h.betting.find_next_actor(&self.players, dealer));
                if let Some(seat) = first {
                    self.seat_actor(seat);
                    return;
                }
            }
            // Betting is settled for the rest of the hand; keep dealing.
        }
    }

    /// Everyone else folded: the pot moves without a showdown and the
    /// winner's cards stay hidden.
    fn award_uncontested(&mut self, seat: SeatIndex) {
        let pot = self.pot_total();
        if let Some(hand) = self.hand.as_mut() {
            hand.street = Street::Showdown;
            hand.active_seat = None;
            hand.deadline = None;
        }
        let player = self
            .players
            .iter_mut()
            .find(|p| p.seat == seat)
            .expect("winner seat is seated");
        player.chips = player
            .chips
            .checked_add(pot)
            .expect("chip totals fit in u64");
        let player_id = player.id.clone();
        info!(table = %self.table_id, player = %player_id, pot = %pot, "hand won uncontested");

        self.emit(HandEventKind::Showdown {
            results: vec![ShowdownEntry {
                player_id,
                hole_cards: Vec::new(),
                hand: None,
                win_amount: pot,
            }],
        });
        self.end_hand();
    }

    fn showdown(&mut self) {
        let community = {
            let Some(hand) = self.hand.as_mut() else {
                return;
            };
            hand.street = Street::Showdown;
            hand.active_seat = None;
            hand.deadline = None;
            hand.community.clone()
        };

        struct Revealed {
            seat: SeatIndex,
            player_id: PlayerId,
            hole_cards: Vec<Card>,
            hand: holdem_domain::EvaluatedHand,
            won: Chips,
        }

        let mut revealed: Vec<Revealed> = Vec::new();
        for player in self.players.iter().filter(|p| p.in_hand()) {
            let mut cards = player.hole_cards.clone();
            cards.extend_from_slice(&community);
            // Two hole cards plus a full board; fewer means the hand was
            // driven into showdown incorrectly.
            let hand = evaluate_best(&cards).expect("showdown hands have seven cards");
            revealed.push(Revealed {
                seat: player.seat,
                player_id: player.id.clone(),
                hole_cards: player.hole_cards.clone(),
                hand,
                won: Chips::ZERO,
            });
        }

        let pots = build_side_pots(&self.contributions());
        let dealer = self.dealer_seat.unwrap_or_default();

        for pot in &pots {
            let contenders: Vec<usize> = revealed
                .iter()
                .enumerate()
                .filter(|(_, r)| pot.eligible_players.contains(&r.player_id))
                .map(|(i, _)| i)
                .collect();
            let Some(best) = contenders.iter().map(|&i| revealed[i].hand.clone()).max() else {
                continue;
            };
            let mut winners: Vec<usize> = contenders
                .into_iter()
                .filter(|&i| revealed[i].hand == best)
                .collect();
            // Equal shares; odd chips go out one at a time starting from the
            // seat closest left of the button.
            winners.sort_by_key(|&i| seats_left_of(dealer, revealed[i].seat));
            let share = pot.amount.as_u64() / winners.len() as u64;
            let remainder = pot.amount.as_u64() % winners.len() as u64;
            for (position, &i) in winners.iter().enumerate() {
                let extra = u64::from((position as u64) < remainder);
                revealed[i].won += Chips(share + extra);
            }
        }

        for r in &revealed {
            if r.won.is_zero() {
                continue;
            }
            if let Some(player) = self.players.iter_mut().find(|p| p.seat == r.seat) {
                player.chips = player
                    .chips
                    .checked_add(r.won)
                    .expect("chip totals fit in u64");
                info!(table = %self.table_id, player = %r.player_id, amount = %r.won, hand = %r.hand, "pot awarded");
            }
        }

        let results: Vec<ShowdownEntry> = revealed
            .into_iter()
            .map(|r| ShowdownEntry {
                player_id: r.player_id,
                hole_cards: r.hole_cards,
                hand: Some(r.hand),
                win_amount: r.won,
            })
            .collect();
        self.emit(HandEventKind::Showdown { results });
        self.end_hand();
    }

    fn end_hand(&mut self) {
        if let Some(hand) = self.hand.as_mut() {
            hand.street = Street::Complete;
        }
        // Seats abandoned mid-hand come free once their stake is gone; a
        // disconnected player with chips keeps the seat until the next
        // start-of-hand purge, so a quick reconnect can save it.
        self.players
            .retain(|p| p.is_connected || !p.chips.is_zero());
        let players = self.roster();
        info!(table = %self.table_id, hand_no = self.hand_no, "hand complete");
        self.emit(HandEventKind::HandEnd { players });
        self.hand = None;
    }
}

/// Seats between the button and `seat`, going left; the button itself is
/// farthest at `MAX_SEATS - 1`.
fn seats_left_of(dealer: SeatIndex, seat: SeatIndex) -> SeatIndex {
    (seat + MAX_SEATS - dealer - 1) % MAX_SEATS
}

fn board_string(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
