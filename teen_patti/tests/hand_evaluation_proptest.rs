/// Property-based tests for three-card hand ranking, plus an exhaustive
/// sweep of every 3-card combination from a 52-card deck.
use proptest::prelude::*;
use std::collections::BTreeMap;
use teen_patti::game::entities::{Card, Suit, Value};
use teen_patti::game::hand::{ACE_HIGH, HandCategory, rank_hand};

const SUITS: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];

fn card_strategy() -> impl Strategy<Value = Card> {
    (1u8..=13, 0usize..4).prop_map(|(value, suit)| Card(value, SUITS[suit]))
}

// Three distinct cards, as dealt from a single deck.
fn hand_strategy() -> impl Strategy<Value = [Card; 3]> {
    [card_strategy(), card_strategy(), card_strategy()].prop_filter(
        "cards must be unique",
        |cards| cards[0] != cards[1] && cards[1] != cards[2] && cards[0] != cards[2],
    )
}

// Three distinct values sharing one suit.
fn one_suit_hand_strategy() -> impl Strategy<Value = [Card; 3]> {
    (0usize..4, [1u8..=13, 1u8..=13, 1u8..=13])
        .prop_filter("values must be distinct", |(_, v)| {
            v[0] != v[1] && v[1] != v[2] && v[0] != v[2]
        })
        .prop_map(|(suit, v)| {
            [
                Card(v[0], SUITS[suit]),
                Card(v[1], SUITS[suit]),
                Card(v[2], SUITS[suit]),
            ]
        })
}

proptest! {
    #[test]
    fn ranking_is_deterministic(hand in hand_strategy()) {
        prop_assert_eq!(rank_hand(hand), rank_hand(hand));
    }

    #[test]
    fn ranking_ignores_card_order(hand in hand_strategy()) {
        let rotated = [hand[1], hand[2], hand[0]];
        let swapped = [hand[2], hand[1], hand[0]];
        prop_assert_eq!(rank_hand(hand), rank_hand(rotated));
        prop_assert_eq!(rank_hand(hand), rank_hand(swapped));
    }

    #[test]
    fn trail_exactly_when_all_values_match(hand in hand_strategy()) {
        let trail = hand[0].0 == hand[1].0 && hand[1].0 == hand[2].0;
        prop_assert_eq!(rank_hand(hand).category == HandCategory::Trail, trail);
    }

    #[test]
    fn one_suit_hands_are_pure_sequence_or_color(hand in one_suit_hand_strategy()) {
        let category = rank_hand(hand).category;
        prop_assert!(
            category == HandCategory::PureSequence || category == HandCategory::Color,
            "unexpected category {:?}",
            category
        );
    }

    #[test]
    fn category_strength_dominates_comparison(a in hand_strategy(), b in hand_strategy()) {
        let (ra, rb) = (rank_hand(a), rank_hand(b));
        if ra.category.strength() > rb.category.strength() {
            prop_assert!(ra > rb);
        }
    }
}

#[test]
fn ace_high_runs_share_the_top_tiebreak() {
    let qka = rank_hand([Card(12, Suit::Heart), Card(13, Suit::Spade), Card(1, Suit::Club)]);
    assert_eq!(qka.category, HandCategory::Sequence);
    assert_eq!(qka.tiebreak, ACE_HIGH);

    let ajq = rank_hand([Card(1, Suit::Heart), Card(11, Suit::Spade), Card(12, Suit::Club)]);
    assert_eq!(ajq.category, HandCategory::Sequence);
    assert_eq!(ajq.tiebreak, ACE_HIGH);

    // Every natural run tops out below the ace-high value.
    let kqj = rank_hand([Card(13, Suit::Heart), Card(12, Suit::Spade), Card(11, Suit::Club)]);
    assert_eq!(kqj.category, HandCategory::Sequence);
    assert!(kqj.tiebreak < qka.tiebreak);
    assert!(kqj < qka);
}

#[test]
fn ace_low_run_is_a_three_high_sequence() {
    let low = rank_hand([Card(1, Suit::Heart), Card(2, Suit::Spade), Card(3, Suit::Club)]);
    assert_eq!(low.category, HandCategory::Sequence);
    assert_eq!(low.tiebreak, 3);

    let pure = rank_hand([Card(1, Suit::Heart), Card(2, Suit::Heart), Card(3, Suit::Heart)]);
    assert_eq!(pure.category, HandCategory::PureSequence);
    assert!(pure > low);
}

/// Sweep all C(52, 3) = 22 100 hands and pin the category census. The
/// run set counts 13 rank triples: eleven natural runs plus the two
/// ace-wrap triples.
#[test]
fn exhaustive_category_census() {
    let mut deck = Vec::with_capacity(52);
    for value in 1u8..=13 {
        for suit in SUITS {
            deck.push(Card(value, suit));
        }
    }

    let mut census: BTreeMap<u8, usize> = BTreeMap::new();
    for i in 0..deck.len() {
        for j in (i + 1)..deck.len() {
            for k in (j + 1)..deck.len() {
                let score = rank_hand([deck[i], deck[j], deck[k]]);
                assert!(
                    (1..=6).contains(&score.category.strength()),
                    "strength out of range"
                );
                let max_expected: Value = if score.category == HandCategory::Sequence
                    || score.category == HandCategory::PureSequence
                {
                    ACE_HIGH
                } else {
                    13
                };
                assert!(score.tiebreak >= 1 && score.tiebreak <= max_expected);
                *census.entry(score.category.strength()).or_default() += 1;
            }
        }
    }

    assert_eq!(census.values().sum::<usize>(), 22_100);
    assert_eq!(census[&HandCategory::Trail.strength()], 52);
    assert_eq!(census[&HandCategory::PureSequence.strength()], 52);
    assert_eq!(census[&HandCategory::Sequence.strength()], 780);
    assert_eq!(census[&HandCategory::Color.strength()], 1_092);
    assert_eq!(census[&HandCategory::Pair.strength()], 3_744);
    assert_eq!(census[&HandCategory::HighCard.strength()], 16_380);
}
