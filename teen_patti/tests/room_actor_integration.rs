/// Integration tests for the room actor and registry.
///
/// These tests run the real actor tasks with shortened timers and observe
/// the event streams a connected client would see.
use std::sync::Arc;
use std::time::Duration;

use teen_patti::game::GameError;
use teen_patti::game::entities::{Chips, ConnectionId, PlayerProfile};
use teen_patti::net::messages::{ActionKind, ServerEvent};
use teen_patti::room::config::RoomConfig;
use teen_patti::room::manager::RoomManager;
use teen_patti::room::messages::JoinReply;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

type EventRx = mpsc::UnboundedReceiver<ServerEvent>;

fn profile(id: &str, balance: Chips) -> PlayerProfile {
    PlayerProfile {
        user_id: id.to_string(),
        username: id.to_string(),
        avatar_url: format!("https://avatars.test/{id}.png"),
        balance,
    }
}

async fn join_public(
    manager: &RoomManager,
    id: &str,
    balance: Chips,
) -> (JoinReply, ConnectionId, EventRx) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = Uuid::new_v4();
    let reply = manager
        .assign_public_room(profile(id, balance), connection_id, tx)
        .await
        .expect("public join should succeed");
    (reply, connection_id, rx)
}

async fn next_event(rx: &mut EventRx) -> ServerEvent {
    timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn wait_for(rx: &mut EventRx, mut pred: impl FnMut(&ServerEvent) -> bool) -> ServerEvent {
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn public_joins_are_idempotent_per_user() {
    let manager = Arc::new(RoomManager::new(RoomConfig::default()));

    let (first, _, _rx1) = join_public(&manager, "alice", 10_000).await;
    let (second, _, _rx2) = join_public(&manager, "alice", 10_000).await;

    assert_eq!(first.room_id, second.room_id);
    assert_eq!(second.players.len(), 1);
    assert_eq!(manager.active_room_count().await, 1);
    assert_eq!(
        manager.find_room_for_user("alice").await,
        Some(first.room_id)
    );
}

#[tokio::test]
async fn private_rooms_are_skipped_by_public_assignment() {
    let manager = Arc::new(RoomManager::new(RoomConfig::default()));

    let (tx, _rx) = mpsc::unbounded_channel();
    let private = manager
        .create_private_room(profile("alice", 10_000), Uuid::new_v4(), tx)
        .await
        .unwrap();

    let (public, _, _rx2) = join_public(&manager, "bob", 10_000).await;

    assert_ne!(private.room_id, public.room_id);
    assert_eq!(manager.active_room_count().await, 2);
}

#[tokio::test]
async fn join_by_id_checks_existence_and_capacity() {
    let manager = Arc::new(RoomManager::new(RoomConfig::default()));

    let (tx, _rx) = mpsc::unbounded_channel();
    let missing = manager
        .join_room_by_id(Uuid::new_v4(), profile("alice", 10_000), Uuid::new_v4(), tx)
        .await;
    assert_eq!(missing.unwrap_err(), GameError::RoomNotFound);

    // Fill one public room to capacity.
    let mut rxs = Vec::new();
    let (first, _, rx) = join_public(&manager, "u0", 10_000).await;
    rxs.push(rx);
    for i in 1..5 {
        let (reply, _, rx) = join_public(&manager, &format!("u{i}"), 10_000).await;
        assert_eq!(reply.room_id, first.room_id);
        rxs.push(rx);
    }

    let (tx, _rx) = mpsc::unbounded_channel();
    let full = manager
        .join_room_by_id(first.room_id, profile("late", 10_000), Uuid::new_v4(), tx)
        .await;
    assert_eq!(full.unwrap_err(), GameError::RoomFull);
}

#[tokio::test]
async fn turn_timeout_auto_folds_the_holder() {
    let config = RoomConfig {
        turn_duration: Duration::from_millis(150),
        restart_delay: Duration::from_millis(150),
        ..RoomConfig::default()
    };
    let manager = Arc::new(RoomManager::new(config));

    let (_r1, _, _rx_a) = join_public(&manager, "alice", 10_000).await;
    let (_r2, _, mut rx_b) = join_public(&manager, "bob", 10_000).await;

    wait_for(&mut rx_b, |e| matches!(e, ServerEvent::GameStarted { .. })).await;
    let holder = match wait_for(&mut rx_b, |e| matches!(e, ServerEvent::TurnStarted { .. })).await {
        ServerEvent::TurnStarted { user_id, .. } => user_id,
        _ => unreachable!(),
    };

    let folded =
        wait_for(&mut rx_b, |e| matches!(e, ServerEvent::PlayerFolded { .. })).await;
    match folded {
        ServerEvent::PlayerFolded { user_id, is_auto } => {
            assert_eq!(user_id, holder);
            assert!(is_auto);
        }
        _ => unreachable!(),
    }

    // Heads-up, so the fold settles the round for the survivor.
    let ended = wait_for(&mut rx_b, |e| matches!(e, ServerEvent::GameEnded { .. })).await;
    match ended {
        ServerEvent::GameEnded {
            winner_user_id,
            winnings,
            ..
        } => {
            assert_ne!(winner_user_id, holder);
            assert_eq!(winnings, 1_000);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn disconnecting_turn_holder_moves_turn_and_timer() {
    let config = RoomConfig {
        turn_duration: Duration::from_millis(300),
        restart_delay: Duration::from_millis(100),
        ..RoomConfig::default()
    };
    let manager = Arc::new(RoomManager::new(config));

    let (_r1, conn_a, mut rx_a) = join_public(&manager, "a", 10_000).await;
    let (reply, conn_b, _rx_b) = join_public(&manager, "b", 10_000).await;
    let (_r3, conn_c, mut rx_c) = join_public(&manager, "c", 10_000).await;
    let room_id = reply.room_id;

    // The first round started heads-up before c was seated; once it ends,
    // the automatic restart deals all three players.
    wait_for(&mut rx_c, |e| matches!(e, ServerEvent::GameStarted { .. })).await;
    let holder = match wait_for(&mut rx_c, |e| matches!(e, ServerEvent::TurnStarted { .. })).await {
        ServerEvent::TurnStarted { user_id, .. } => user_id,
        _ => unreachable!(),
    };

    let holder_conn = match holder.as_str() {
        "a" => conn_a,
        "b" => conn_b,
        _ => conn_c,
    };
    manager.disconnect(holder_conn).await;

    // Observe from a connection that stays: rx_c unless c itself left.
    let observer = if holder == "c" { &mut rx_a } else { &mut rx_c };
    if holder == "c" {
        // Sync rx_a up to the same point in the stream.
        wait_for(
            observer,
            |e| matches!(e, ServerEvent::TurnStarted { user_id, .. } if *user_id == holder),
        )
        .await;
    }

    let next_holder = match wait_for(observer, |e| {
        matches!(e, ServerEvent::TurnStarted { .. })
    })
    .await
    {
        ServerEvent::TurnStarted { user_id, .. } => user_id,
        _ => unreachable!(),
    };
    assert_ne!(next_holder, holder);

    // The departed player's timer never fires: the next auto-fold names
    // the reassigned holder.
    let folded = wait_for(observer, |e| {
        matches!(e, ServerEvent::PlayerFolded { is_auto: true, .. })
    })
    .await;
    match folded {
        ServerEvent::PlayerFolded { user_id, .. } => assert_eq!(user_id, next_holder),
        _ => unreachable!(),
    }

    assert_eq!(manager.find_room_for_user(&holder).await, None);
    assert_eq!(manager.find_room_for_user(&next_holder).await, Some(room_id));
}

#[tokio::test]
async fn settlement_schedules_an_automatic_restart() {
    let config = RoomConfig {
        turn_duration: Duration::from_secs(30),
        restart_delay: Duration::from_millis(100),
        ..RoomConfig::default()
    };
    let manager = Arc::new(RoomManager::new(config));

    let (_r1, _, _rx_a) = join_public(&manager, "alice", 10_000).await;
    let (reply, _, mut rx_b) = join_public(&manager, "bob", 10_000).await;
    let room_id = reply.room_id;

    wait_for(&mut rx_b, |e| matches!(e, ServerEvent::GameStarted { .. })).await;
    let holder = match wait_for(&mut rx_b, |e| matches!(e, ServerEvent::TurnStarted { .. })).await {
        ServerEvent::TurnStarted { user_id, .. } => user_id,
        _ => unreachable!(),
    };

    manager
        .player_action(room_id, &holder, ActionKind::Fold, 0)
        .await
        .unwrap();

    wait_for(&mut rx_b, |e| matches!(e, ServerEvent::GameEnded { .. })).await;
    // Both players can still cover the boot, so play resumes by itself.
    wait_for(&mut rx_b, |e| matches!(e, ServerEvent::GameStarted { .. })).await;
}

#[tokio::test]
async fn rooms_are_deleted_once_empty() {
    let manager = Arc::new(RoomManager::new(RoomConfig::default()));

    let (reply, _, _rx_a) = join_public(&manager, "alice", 10_000).await;
    let (_r2, _, _rx_b) = join_public(&manager, "bob", 10_000).await;
    let room_id = reply.room_id;

    manager.leave(room_id, "alice").await.unwrap();
    assert_eq!(manager.active_room_count().await, 1);

    manager.leave(room_id, "bob").await.unwrap();
    assert_eq!(manager.active_room_count().await, 0);
    assert_eq!(manager.find_room_for_user("alice").await, None);
    assert_eq!(manager.find_room_for_user("bob").await, None);
}

#[tokio::test]
async fn chat_is_relayed_and_validated() {
    let manager = Arc::new(RoomManager::new(RoomConfig::default()));

    let (reply, conn_a, mut rx_a) = join_public(&manager, "alice", 10_000).await;
    let (_r2, _, mut rx_b) = join_public(&manager, "bob", 10_000).await;
    let room_id = reply.room_id;

    manager
        .send_chat(room_id, conn_a, "alice", "", "hello there")
        .await
        .unwrap();
    let update = wait_for(&mut rx_b, |e| {
        matches!(e, ServerEvent::RoomUpdate(view) if !view.chat.is_empty())
    })
    .await;
    match update {
        ServerEvent::RoomUpdate(view) => {
            assert_eq!(view.chat.len(), 1);
            assert_eq!(view.chat[0].content, "hello there");
        }
        _ => unreachable!(),
    }

    manager
        .send_chat(room_id, conn_a, "alice", "", &"x".repeat(300))
        .await
        .unwrap();
    let error = wait_for(&mut rx_a, |e| matches!(e, ServerEvent::Error { .. })).await;
    match error {
        ServerEvent::Error { message } => assert_eq!(message, "Message too long"),
        _ => unreachable!(),
    }
}
