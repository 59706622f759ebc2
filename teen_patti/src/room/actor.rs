//! Room actor with single-consumer event handling.
//!
//! The actor owns a [`RoomState`] and processes every external event and
//! timer firing on one loop, so room mutations never interleave. It also
//! owns the turn scheduler: at most one pending timer exists per room, and
//! arming a new one replaces (cancels) the previous one by construction.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::game::GameError;
use crate::game::entities::{ConnectionId, RoomId, UserId};
use crate::game::state::{RemovalKey, RoomEvent, RoomPhase, RoomState};
use crate::net::messages::ServerEvent;

use super::messages::{JoinReply, RemovalTarget, RemoveOutcome, RoomMessage};

/// Room actor handle for sending messages.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    /// Get the room id.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Send a message to the room. Fails once the room has been deleted.
    pub async fn send(&self, message: RoomMessage) -> Result<(), GameError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::RoomNotFound)
    }
}

/// The single pending delayed callback a room may hold: either the
/// auto-fold deadline for the current turn holder, or the round restart
/// attempt after settlement. One slot for both makes a second pending
/// timer unrepresentable.
#[derive(Debug)]
enum PendingTimer {
    /// Fires the auto-fold path for this exact player identity, not
    /// whoever holds the turn at firing time.
    TurnTimeout { user_id: UserId, deadline: Instant },
    /// Re-checks eligibility and deals the next round.
    Restart { deadline: Instant },
}

impl PendingTimer {
    fn deadline(&self) -> Instant {
        match self {
            Self::TurnTimeout { deadline, .. } | Self::Restart { deadline } => *deadline,
        }
    }
}

/// Room actor owning one room's state, subscribers, and timer.
pub struct RoomActor {
    state: RoomState,
    inbox: mpsc::Receiver<RoomMessage>,
    /// Per-connection outbound senders for event delivery.
    subscribers: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    timer: Option<PendingTimer>,
    closed: bool,
}

impl RoomActor {
    /// Create the actor and its handle.
    pub fn new(state: RoomState) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(64);
        let room_id = state.id();
        let actor = Self {
            state,
            inbox,
            subscribers: HashMap::new(),
            timer: None,
            closed: false,
        };
        (actor, RoomHandle { sender, room_id })
    }

    /// Run the actor event loop until the room closes.
    pub async fn run(mut self) {
        log::debug!("Room {}: actor started", self.state.id());

        loop {
            let deadline = self.timer.as_ref().map(PendingTimer::deadline);
            tokio::select! {
                maybe = self.inbox.recv() => {
                    match maybe {
                        Some(message) => self.handle_message(message),
                        None => break,
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.handle_timer_fired();
                }
            }

            if self.closed {
                break;
            }
        }

        log::debug!("Room {}: actor stopped", self.state.id());
    }

    fn handle_message(&mut self, message: RoomMessage) {
        let now = Utc::now().timestamp_millis();
        match message {
            RoomMessage::Join {
                profile,
                connection_id,
                sender,
                response,
            } => match self.state.add_player(profile, connection_id) {
                Ok(replaced) => {
                    if let Some(old) = replaced {
                        self.subscribers.remove(&old);
                    }
                    self.subscribers.insert(connection_id, sender);
                    let roster = self.state.roster();
                    // Confirm to the joiner before any round-start events.
                    self.unicast(
                        connection_id,
                        ServerEvent::JoinedRoom {
                            room_id: self.state.id().to_string(),
                            players: roster.clone(),
                        },
                    );
                    let _ = response.send(Ok(JoinReply {
                        room_id: self.state.id(),
                        players: roster,
                    }));
                    // Every join attempts to deal a round.
                    self.state.start_round(now);
                    self.flush(true);
                }
                Err(e) => {
                    let _ = response.send(Err(e));
                }
            },

            RoomMessage::Remove { target, response } => {
                let key = match &target {
                    RemovalTarget::User(user_id) => RemovalKey::User(user_id),
                    RemovalTarget::Connection(connection_id) => {
                        RemovalKey::Connection(*connection_id)
                    }
                };
                let removed = self.state.remove_player(key, now);
                let outcome = removed.map(|r| {
                    self.subscribers.remove(&r.connection_id);
                    RemoveOutcome {
                        user_id: r.user_id,
                        connection_id: r.connection_id,
                        remaining: self.state.player_count(),
                    }
                });
                let mutated = outcome.is_some();
                if self.state.is_empty() {
                    self.closed = true;
                    self.timer = None;
                }
                let _ = response.send(outcome);
                if mutated && !self.closed {
                    self.flush(true);
                } else {
                    self.state.drain_events();
                }
            }

            RoomMessage::TakeAction {
                user_id,
                action,
                amount,
            } => {
                let mutated = self.state.apply_action(&user_id, action, amount, now);
                self.flush(mutated);
            }

            RoomMessage::RequestShow { user_id } => {
                let mutated = self.state.request_show(&user_id);
                self.flush(mutated);
            }

            RoomMessage::SendChat {
                connection_id,
                username,
                avatar_url,
                content,
            } => match self
                .state
                .add_chat(connection_id, &username, &avatar_url, &content, now)
            {
                Ok(mutated) => self.flush(mutated),
                Err(e) => self.unicast(
                    connection_id,
                    ServerEvent::Error {
                        message: e.to_string(),
                    },
                ),
            },

            RoomMessage::Close => {
                self.closed = true;
            }
        }
    }

    /// A fired callback always re-validates current state before mutating:
    /// the auto-fold path is a no-op when the player already folded or
    /// left, and restart re-checks eligibility.
    fn handle_timer_fired(&mut self) {
        let now = Utc::now().timestamp_millis();
        match self.timer.take() {
            Some(PendingTimer::TurnTimeout { user_id, .. }) => {
                log::info!(
                    "Room {}: auto-folding {} on turn timeout",
                    self.state.id(),
                    user_id
                );
                let mutated = self.state.auto_fold(&user_id, now);
                self.flush(mutated);
            }
            Some(PendingTimer::Restart { .. }) => {
                let started = self.state.start_round(now);
                if started {
                    self.flush(true);
                }
            }
            None => {}
        }
    }

    /// Drain state events: deliver outbound notifications, reconcile the
    /// timer slot, and broadcast the room snapshot if anything changed.
    fn flush(&mut self, mutated: bool) {
        let events = self.state.drain_events();
        let mut round_ended = false;
        let mut turn_started: Option<UserId> = None;

        for event in events {
            match event {
                RoomEvent::RoundStarted { first_turn_user_id } => {
                    self.broadcast(ServerEvent::GameStarted { first_turn_user_id });
                }
                RoomEvent::TurnStarted {
                    user_id,
                    started_at,
                } => {
                    self.broadcast(ServerEvent::TurnStarted {
                        user_id: user_id.clone(),
                        turn_start_time: started_at,
                        duration: self.state.config().turn_duration.as_millis() as u64,
                    });
                    turn_started = Some(user_id);
                }
                RoomEvent::PlayerFolded { user_id, auto } => {
                    self.broadcast(ServerEvent::PlayerFolded {
                        user_id,
                        is_auto: auto,
                    });
                }
                RoomEvent::RoundEnded {
                    winner_user_id,
                    winner_username,
                    winnings,
                    hands,
                    hand_type,
                } => {
                    round_ended = true;
                    let hands = hands
                        .into_iter()
                        .map(|(user_id, cards)| {
                            (user_id, cards.iter().map(|c| c.code()).collect())
                        })
                        .collect();
                    self.broadcast(ServerEvent::GameEnded {
                        winner_user_id,
                        winner_username,
                        winnings,
                        hands,
                        hand_type,
                    });
                }
                RoomEvent::Rejected {
                    connection_id,
                    error,
                } => {
                    self.unicast(
                        connection_id,
                        ServerEvent::Error {
                            message: error.to_string(),
                        },
                    );
                }
            }
        }

        // Reconcile the timer slot. A reschedule replaces the previous
        // handle, so cancellation always precedes re-arming.
        if round_ended {
            self.timer = Some(PendingTimer::Restart {
                deadline: Instant::now() + self.state.config().restart_delay,
            });
        } else if let Some(user_id) = turn_started {
            self.timer = Some(PendingTimer::TurnTimeout {
                user_id,
                deadline: Instant::now() + self.state.config().turn_duration,
            });
        } else if self.state.phase() == RoomPhase::Lobby
            && matches!(self.timer, Some(PendingTimer::TurnTimeout { .. }))
        {
            self.timer = None;
        }

        if mutated {
            self.broadcast(ServerEvent::RoomUpdate(self.state.snapshot()));
        }
    }

    fn broadcast(&mut self, event: ServerEvent) {
        self.subscribers
            .retain(|_, sender| sender.send(event.clone()).is_ok());
    }

    fn unicast(&mut self, connection_id: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.subscribers.get(&connection_id) {
            let _ = sender.send(event);
        }
    }
}
