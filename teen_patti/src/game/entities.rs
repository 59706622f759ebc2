use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    /// Stable lowercase identifier used in wire card codes.
    pub fn code(self) -> &'static str {
        match self {
            Self::Spade => "spades",
            Self::Heart => "hearts",
            Self::Diamond => "diamonds",
            Self::Club => "clubs",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values. Aces are 1u8; sequence detection treats
/// them as high where the rules call for it.
pub type Value = u8;

/// A card is a tuple of a uInt8 value (ace=1u8 ... king=13u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    /// Wire identifier, e.g. `"spades-13"`.
    pub fn code(&self) -> String {
        format!("{}-{}", self.1.code(), self.0)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            1 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    pub deck_idx: usize,
}

impl Deck {
    pub fn deal_card(&mut self) -> Card {
        let card = self.cards[self.deck_idx];
        self.deck_idx += 1;
        card
    }

    /// Deal a complete three-card hand.
    pub fn deal_hand(&mut self) -> [Card; 3] {
        [self.deal_card(), self.deal_card(), self.deal_card()]
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
        self.deck_idx = 0;
    }
}

impl Default for Deck {
    fn default() -> Self {
        const SUITS: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];
        let cards = std::array::from_fn(|i| Card((i / 4 + 1) as Value, SUITS[i % 4]));
        Self { cards, deck_idx: 0 }
    }
}

/// Type alias for whole chips. All bets and player balances are represented
/// as whole chips; balances persist only in memory for a room's lifetime.
pub type Chips = u32;

/// Type alias for seat positions within a room. Seat order determines turn
/// rotation and is preserved across joins and leaves.
pub type SeatIndex = usize;

/// Stable external identity, unique within a room. Used to re-locate a
/// player across reconnects.
pub type UserId = String;

/// Transient handle to a live connection; changes on reconnect. Used only
/// for removal-by-disconnect and direct replies.
pub type ConnectionId = Uuid;

/// Type alias for generated room identifiers.
pub type RoomId = Uuid;

/// Round status for a seated player.
///
/// Explicit states keep illegal flag combinations (such as a "seen" player
/// that was never dealt in) unrepresentable.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PlayerStatus {
    /// Seated, waiting for the next deal.
    Waiting,
    /// Dealt in and betting without having looked at the hand.
    Blind,
    /// Dealt in and has looked at the hand; seen stakes apply.
    Seen,
    /// Out of the current round.
    Folded,
}

/// Join-time player identity and display metadata.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: String,
    pub balance: Chips,
}

/// A seated player. Owned exclusively by one room for its lifetime there.
#[derive(Clone, Debug)]
pub struct Player {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub username: String,
    pub avatar_url: String,
    pub balance: Chips,
    /// Zero cards, or exactly three while dealt in.
    pub hand: Vec<Card>,
    pub status: PlayerStatus,
}

impl Player {
    pub fn new(profile: PlayerProfile, connection_id: ConnectionId) -> Self {
        Self {
            user_id: profile.user_id,
            connection_id,
            username: profile.username,
            avatar_url: profile.avatar_url,
            balance: profile.balance,
            hand: Vec::new(),
            status: PlayerStatus::Waiting,
        }
    }

    /// Seated and still active in the current round.
    pub fn is_playing(&self) -> bool {
        matches!(self.status, PlayerStatus::Blind | PlayerStatus::Seen)
    }

    /// Has looked at their hand this round.
    pub fn has_seen(&self) -> bool {
        self.status == PlayerStatus::Seen
    }

    pub(crate) fn reset_for_round(&mut self) {
        self.status = PlayerStatus::Waiting;
        self.hand.clear();
    }
}

/// One entry of a room's bounded chat log.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChatMessage {
    pub username: String,
    pub avatar_url: String,
    pub content: String,
    /// Milliseconds since the epoch.
    pub sent_at: i64,
}
