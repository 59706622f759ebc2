//! Room state machine: seating, betting, turn rotation, and settlement.
//!
//! All mutation entry points are synchronous and run on the owning room
//! actor's single consumer loop, so within one room there are no
//! interleavings to reason about. Changes collaborators must react to
//! (timer arming, broadcasts) are emitted as [`RoomEvent`]s and drained by
//! the actor after every call.
//!
//! Every operation either completes all of its invariant-restoring steps
//! (turn reassignment, settlement) or performs no mutation at all.

use std::collections::VecDeque;

use rand::Rng;

use crate::net::messages::{ActionKind, ChatView, PlayerSummary, PlayerView, RoomView};
use crate::room::config::RoomConfig;

use super::GameError;
use super::entities::{
    Card, ChatMessage, Chips, ConnectionId, Deck, Player, PlayerProfile, PlayerStatus, RoomId,
    SeatIndex, UserId,
};
use super::hand::{HandScore, rank_hand};

/// Room lifecycle status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoomPhase {
    /// Waiting for enough funded players to deal.
    Lobby,
    /// A round is active: cards dealt, betting in progress.
    InRound,
}

/// The single action holder while a round is active. Keeping this on the
/// room (rather than a flag per player) makes a second turn holder
/// unrepresentable.
#[derive(Clone, Copy, Debug)]
pub struct Turn {
    pub seat: SeatIndex,
    /// Milliseconds since the epoch.
    pub started_at: i64,
}

/// State transitions the owning actor reacts to: timer (re)arming,
/// broadcasts, and unicast rejections.
#[derive(Clone, Debug)]
pub enum RoomEvent {
    RoundStarted {
        first_turn_user_id: UserId,
    },
    /// A new turn began; any previously armed turn timer is stale.
    TurnStarted {
        user_id: UserId,
        started_at: i64,
    },
    PlayerFolded {
        user_id: UserId,
        auto: bool,
    },
    /// The round settled; hands list every contender's revealed cards.
    RoundEnded {
        winner_user_id: UserId,
        winner_username: String,
        winnings: Chips,
        hands: Vec<(UserId, Vec<Card>)>,
        hand_type: String,
    },
    /// Advisory rejection addressed to one connection only.
    Rejected {
        connection_id: ConnectionId,
        error: GameError,
    },
}

/// How to locate a player for removal.
#[derive(Clone, Copy, Debug)]
pub enum RemovalKey<'a> {
    /// Explicit leave, keyed by user identity.
    User(&'a str),
    /// Transport disconnect, keyed by connection identity.
    Connection(ConnectionId),
}

/// Identity of a player that was removed from the room.
#[derive(Clone, Debug)]
pub struct RemovedPlayer {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub username: String,
}

/// A single room: seated players, pot, turn pointer, and chat log.
#[derive(Debug)]
pub struct RoomState {
    id: RoomId,
    config: RoomConfig,
    is_private: bool,
    players: Vec<Player>,
    pot: Chips,
    boot_amount: Chips,
    phase: RoomPhase,
    turn: Option<Turn>,
    chat: VecDeque<ChatMessage>,
    events: VecDeque<RoomEvent>,
}

impl RoomState {
    pub fn new(id: RoomId, config: RoomConfig, is_private: bool) -> Self {
        let boot_amount = config.boot_amount;
        Self {
            id,
            config,
            is_private,
            players: Vec::new(),
            pot: 0,
            boot_amount,
            phase: RoomPhase::Lobby,
            turn: None,
            chat: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn playing_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_playing()).count()
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn turn(&self) -> Option<Turn> {
        self.turn
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.seat_of_user(user_id).is_some()
    }

    /// Take all pending events for the owning actor to act on.
    pub fn drain_events(&mut self) -> VecDeque<RoomEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seat a player, or refresh the connection handle if the same user is
    /// already seated (reconnect). Returns the replaced connection id on
    /// reconnect.
    pub fn add_player(
        &mut self,
        profile: PlayerProfile,
        connection_id: ConnectionId,
    ) -> Result<Option<ConnectionId>, GameError> {
        if let Some(seat) = self.seat_of_user(&profile.user_id) {
            let previous = self.players[seat].connection_id;
            self.players[seat].connection_id = connection_id;
            return Ok(Some(previous));
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::RoomFull);
        }
        log::info!("Room {}: {} joined", self.id, profile.username);
        self.players.push(Player::new(profile, connection_id));
        Ok(None)
    }

    /// Roster summary for join confirmations.
    pub fn roster(&self) -> Vec<PlayerSummary> {
        self.players
            .iter()
            .map(|p| PlayerSummary {
                user_id: p.user_id.clone(),
                username: p.username.clone(),
                avatar_url: p.avatar_url.clone(),
                balance: p.balance,
            })
            .collect()
    }

    /// Remove a player by user or connection identity.
    ///
    /// Leaves splice the seat order; survivors keep their relative
    /// positions. If the removed player held the turn mid-round, the turn
    /// moves to the next active seat before this returns; if at most one
    /// active player remains, the round settles.
    pub fn remove_player(&mut self, key: RemovalKey, now: i64) -> Option<RemovedPlayer> {
        let seat = match key {
            RemovalKey::User(user_id) => self.seat_of_user(user_id),
            RemovalKey::Connection(connection_id) => self.seat_of_connection(connection_id),
        }?;
        let removed = self.players.remove(seat);
        let was_playing = removed.is_playing();
        let held_turn = matches!(self.turn, Some(t) if t.seat == seat);

        // Seats above the vacated one shift down; keep the turn pointer on
        // the same player.
        match self.turn {
            Some(t) if t.seat == seat => self.turn = None,
            Some(t) if t.seat > seat => {
                self.turn = Some(Turn {
                    seat: t.seat - 1,
                    started_at: t.started_at,
                });
            }
            _ => {}
        }

        log::info!("Room {}: {} left", self.id, removed.username);

        if self.phase == RoomPhase::InRound && was_playing {
            if self.playing_count() <= 1 {
                self.settle();
            } else if held_turn {
                // Search forward from the vacated seat, wrapping.
                let start = seat % self.players.len();
                if let Some(next) = self.next_playing_seat_from(start) {
                    self.begin_turn(next, now);
                }
            }
        }

        Some(RemovedPlayer {
            user_id: removed.user_id,
            connection_id: removed.connection_id,
            username: removed.username,
        })
    }

    /// Deal a new round. No-op unless the room is in the lobby and at least
    /// two players can cover the boot.
    pub fn start_round(&mut self, now: i64) -> bool {
        if self.phase == RoomPhase::InRound {
            return false;
        }
        let eligible: Vec<SeatIndex> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.balance >= self.config.boot_amount)
            .map(|(seat, _)| seat)
            .collect();
        if eligible.len() < 2 {
            log::debug!("Room {}: not enough funded players to deal", self.id);
            return false;
        }

        self.pot = 0;
        self.boot_amount = self.config.boot_amount;

        let mut deck = Deck::default();
        deck.shuffle();

        for player in &mut self.players {
            player.reset_for_round();
        }
        for &seat in &eligible {
            let player = &mut self.players[seat];
            player.hand = deck.deal_hand().to_vec();
            player.status = PlayerStatus::Blind;
            player.balance -= self.boot_amount;
            self.pot += self.boot_amount;
        }

        let opener = eligible[rand::rng().random_range(0..eligible.len())];
        self.phase = RoomPhase::InRound;
        self.events.push_back(RoomEvent::RoundStarted {
            first_turn_user_id: self.players[opener].user_id.clone(),
        });
        self.begin_turn(opener, now);

        log::info!(
            "Room {}: round started, {} players dealt, pot {}",
            self.id,
            eligible.len(),
            self.pot
        );
        true
    }

    /// Validate and apply a player action.
    ///
    /// Preconditions: round active, the actor exists, holds the turn, and
    /// is still playing; otherwise the action is ignored with no state
    /// change and no broadcast. Returns whether state changed.
    pub fn apply_action(
        &mut self,
        user_id: &str,
        action: ActionKind,
        amount: Chips,
        now: i64,
    ) -> bool {
        if self.phase != RoomPhase::InRound {
            return false;
        }
        let Some(seat) = self.seat_of_user(user_id) else {
            return false;
        };
        let holds_turn = matches!(self.turn, Some(t) if t.seat == seat);
        if !holds_turn || !self.players[seat].is_playing() {
            return false;
        }

        match action {
            ActionKind::Fold => self.fold_player(seat, false, now),
            ActionKind::See => self.see_hand(seat),
            ActionKind::Blind => self.bet_blind(seat, amount, now),
            ActionKind::Chaal => self.bet_chaal(seat, amount, now),
        }
    }

    fn see_hand(&mut self, seat: SeatIndex) -> bool {
        if self.players[seat].has_seen() {
            self.reject(seat, GameError::AlreadySeen);
            return false;
        }
        self.players[seat].status = PlayerStatus::Seen;
        log::debug!(
            "Room {}: {} saw their cards",
            self.id,
            self.players[seat].username
        );
        true
    }

    fn bet_blind(&mut self, seat: SeatIndex, amount: Chips, now: i64) -> bool {
        if self.players[seat].has_seen() {
            self.reject(seat, GameError::BlindAfterSeen);
            return false;
        }
        let stake = amount.clamp(self.config.min_bet, self.config.max_bet);
        if self.players[seat].balance < stake {
            // Insufficient funds never block play; they force a fold.
            return self.fold_player(seat, false, now);
        }
        self.players[seat].balance -= stake;
        self.pot += stake;
        log::info!(
            "Room {}: {} played blind {}",
            self.id,
            self.players[seat].username,
            stake
        );
        self.finish_bet(seat, now);
        true
    }

    fn bet_chaal(&mut self, seat: SeatIndex, amount: Chips, now: i64) -> bool {
        let required_min = if self.players[seat].has_seen() {
            self.config.min_bet * 2
        } else {
            self.config.min_bet
        };
        let stake = amount.clamp(required_min, self.config.max_bet);
        if self.players[seat].balance < stake {
            return self.fold_player(seat, false, now);
        }
        self.players[seat].balance -= stake;
        self.pot += stake;
        if !self.players[seat].has_seen() {
            self.players[seat].status = PlayerStatus::Seen;
        }
        log::info!(
            "Room {}: {} played chaal {}",
            self.id,
            self.players[seat].username,
            stake
        );
        self.finish_bet(seat, now);
        true
    }

    /// After a successful bet: settle at the pot cap, otherwise pass the
    /// turn to the next active seat.
    fn finish_bet(&mut self, seat: SeatIndex, now: i64) {
        if self.pot >= self.config.pot_limit {
            log::info!("Room {}: pot limit reached at {}", self.id, self.pot);
            self.settle();
            return;
        }
        if self.playing_count() <= 1 {
            self.settle();
            return;
        }
        if let Some(next) = self.next_playing_seat_after(seat) {
            self.turn = None;
            self.begin_turn(next, now);
        }
    }

    /// Fold a playing player. No-op when they already folded or left, which
    /// makes the timeout path idempotent against stale firings.
    fn fold_player(&mut self, seat: SeatIndex, auto: bool, now: i64) -> bool {
        if !self.players[seat].is_playing() {
            return false;
        }
        let held_turn = matches!(self.turn, Some(t) if t.seat == seat);
        self.players[seat].status = PlayerStatus::Folded;
        if held_turn {
            self.turn = None;
        }
        log::info!(
            "Room {}: {} {}",
            self.id,
            self.players[seat].username,
            if auto { "auto-folded" } else { "folded" }
        );
        self.events.push_back(RoomEvent::PlayerFolded {
            user_id: self.players[seat].user_id.clone(),
            auto,
        });

        let remaining = self.playing_count();
        if remaining == 1 {
            self.settle();
        } else if remaining > 1 && held_turn {
            if let Some(next) = self.next_playing_seat_after(seat) {
                self.begin_turn(next, now);
            }
        }
        true
    }

    /// Timeout path: fold the exact player the timer was armed for, not
    /// whoever currently holds the turn.
    pub fn auto_fold(&mut self, user_id: &str, now: i64) -> bool {
        if self.phase != RoomPhase::InRound {
            return false;
        }
        match self.seat_of_user(user_id) {
            Some(seat) => self.fold_player(seat, true, now),
            None => false,
        }
    }

    /// Heads-up manual showdown: allowed only for a seen, playing requester
    /// with exactly two players left in the round.
    pub fn request_show(&mut self, user_id: &str) -> bool {
        if self.phase != RoomPhase::InRound {
            return false;
        }
        let Some(seat) = self.seat_of_user(user_id) else {
            return false;
        };
        if !self.players[seat].is_playing() {
            return false;
        }
        if !self.players[seat].has_seen() {
            self.reject(seat, GameError::ShowRequiresSeen);
            return false;
        }
        if self.playing_count() != 2 {
            self.reject(seat, GameError::ShowRequiresHeadsUp);
            return false;
        }
        log::info!(
            "Room {}: {} requested a show",
            self.id,
            self.players[seat].username
        );
        self.settle();
        true
    }

    /// Settle the round: award the whole pot to the best hand among the
    /// remaining contenders (first encountered wins ties), then reset all
    /// round state.
    fn settle(&mut self) {
        if self.phase != RoomPhase::InRound {
            return;
        }
        let contenders: Vec<SeatIndex> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_playing() && p.hand.len() == 3)
            .map(|(seat, _)| seat)
            .collect();

        let mut best: Option<(SeatIndex, HandScore)> = None;
        for &seat in &contenders {
            let Ok(cards) = <[Card; 3]>::try_from(self.players[seat].hand.as_slice()) else {
                continue;
            };
            let score = rank_hand(cards);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((seat, score));
            }
        }

        let Some((winner, score)) = best else {
            log::debug!("Room {}: round ended with no contenders", self.id);
            self.phase = RoomPhase::Lobby;
            self.turn = None;
            return;
        };

        let hands: Vec<(UserId, Vec<Card>)> = contenders
            .iter()
            .map(|&seat| {
                (
                    self.players[seat].user_id.clone(),
                    self.players[seat].hand.clone(),
                )
            })
            .collect();

        let winnings = self.pot;
        self.players[winner].balance += winnings;
        let winner_user_id = self.players[winner].user_id.clone();
        let winner_username = self.players[winner].username.clone();
        log::info!(
            "Room {}: {} won {} with {}",
            self.id,
            winner_username,
            winnings,
            score.category
        );

        self.phase = RoomPhase::Lobby;
        self.pot = 0;
        self.boot_amount = self.config.boot_amount;
        self.turn = None;
        for player in &mut self.players {
            player.reset_for_round();
        }

        self.events.push_back(RoomEvent::RoundEnded {
            winner_user_id,
            winner_username,
            winnings,
            hands,
            hand_type: score.category.to_string(),
        });
    }

    /// Append a chat message from a seated connection. Empty messages are
    /// dropped silently; overlong ones are rejected.
    pub fn add_chat(
        &mut self,
        connection_id: ConnectionId,
        username: &str,
        avatar_url: &str,
        content: &str,
        now: i64,
    ) -> Result<bool, GameError> {
        if self.seat_of_connection(connection_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        if trimmed.chars().count() > self.config.max_chat_message_len {
            return Err(GameError::MessageTooLong);
        }
        self.chat.push_back(ChatMessage {
            username: username.to_string(),
            avatar_url: avatar_url.to_string(),
            content: trimmed.to_string(),
            sent_at: now,
        });
        while self.chat.len() > self.config.max_chat_messages {
            self.chat.pop_front();
        }
        Ok(true)
    }

    /// Build the room-wide snapshot.
    ///
    /// The same view is sent to every member, including each hand's owner:
    /// a dealt hand is revealed only once its player has seen it, and is
    /// otherwise sent as opaque placeholders.
    pub fn snapshot(&self) -> RoomView {
        RoomView {
            room_id: self.id.to_string(),
            room_money: self.pot,
            boot_amount: self.boot_amount,
            is_game_on: self.phase == RoomPhase::InRound,
            chat: self
                .chat
                .iter()
                .map(|m| ChatView {
                    username: m.username.clone(),
                    avatar_url: m.avatar_url.clone(),
                    content: m.content.clone(),
                })
                .collect(),
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(seat, p)| {
                    let holds_turn = matches!(self.turn, Some(t) if t.seat == seat);
                    PlayerView {
                        user_id: p.user_id.clone(),
                        username: p.username.clone(),
                        avatar_url: p.avatar_url.clone(),
                        balance: p.balance,
                        playing: p.is_playing(),
                        hand: masked_hand(p),
                        turn: holds_turn,
                        turn_start_time: self
                            .turn
                            .filter(|t| t.seat == seat)
                            .map(|t| t.started_at),
                        seen: p.has_seen(),
                    }
                })
                .collect(),
        }
    }

    fn begin_turn(&mut self, seat: SeatIndex, now: i64) {
        self.turn = Some(Turn {
            seat,
            started_at: now,
        });
        log::debug!(
            "Room {}: turn moved to {}",
            self.id,
            self.players[seat].username
        );
        self.events.push_back(RoomEvent::TurnStarted {
            user_id: self.players[seat].user_id.clone(),
            started_at: now,
        });
    }

    fn reject(&mut self, seat: SeatIndex, error: GameError) {
        self.events.push_back(RoomEvent::Rejected {
            connection_id: self.players[seat].connection_id,
            error,
        });
    }

    fn seat_of_user(&self, user_id: &str) -> Option<SeatIndex> {
        self.players.iter().position(|p| p.user_id == user_id)
    }

    fn seat_of_connection(&self, connection_id: ConnectionId) -> Option<SeatIndex> {
        self.players
            .iter()
            .position(|p| p.connection_id == connection_id)
    }

    fn next_playing_seat_after(&self, seat: SeatIndex) -> Option<SeatIndex> {
        let len = self.players.len();
        (1..=len)
            .map(|i| (seat + i) % len)
            .find(|&idx| self.players[idx].is_playing())
    }

    fn next_playing_seat_from(&self, start: SeatIndex) -> Option<SeatIndex> {
        let len = self.players.len();
        (0..len)
            .map(|i| (start + i) % len)
            .find(|&idx| self.players[idx].is_playing())
    }
}

fn masked_hand(player: &Player) -> Vec<String> {
    if player.hand.is_empty() {
        Vec::new()
    } else if player.has_seen() {
        player.hand.iter().map(|c| c.code()).collect()
    } else {
        vec!["?".to_string(); player.hand.len()]
    }
}
