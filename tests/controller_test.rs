//! Controller mode transitions against a simulated maze.
//!
//! Run with: cargo test --test controller_test

mod common;

use common::{drain_gotos, session_in, spawn_maze, Maze};
use skov_lib::automation::{ControlError, Controller, ExplorationState, Mode, PathExecutionState};
use skov_lib::broker::{Broker, ChannelBroker};
use skov_lib::config::{StorageConfig, TimingConfig};
use skov_lib::state::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn wait_for_mode(controller: &Controller, mode: Mode) {
    controller
        .subscribe_mode()
        .wait_for(|current| *current == mode)
        .await
        .unwrap();
}

async fn forest_controller() -> (Arc<ChannelBroker>, Controller) {
    let broker = Arc::new(ChannelBroker::new());
    let maze = Maze::forest();
    let ctx = session_in(&broker, &maze, 300).await;
    spawn_maze(broker.clone(), maze, Duration::from_millis(100));
    let controller = Controller::new(ctx, broker.clone(), TimingConfig::default());
    (broker, controller)
}

#[tokio::test(start_paused = true)]
async fn test_explore_then_collect_then_stop() {
    let (broker, controller) = forest_controller().await;
    let mut sent = broker.subscribe_outbound();

    controller.start_exploration().await.unwrap();
    assert_eq!(controller.mode(), Mode::Exploring);
    assert!(matches!(
        controller.start_collecting().await,
        Err(ControlError::Busy(Mode::Exploring))
    ));

    wait_for_mode(&controller, Mode::Idle).await;
    let status = controller.status().await;
    assert_eq!(status.exploration, ExplorationState::Complete);
    assert_eq!(status.route.rooms(), &[300, 301, 302]);
    assert_eq!(status.rooms_known, 3);
    assert_eq!(drain_gotos(&mut sent), vec![301, 302]);

    assert!(matches!(
        controller.start_exploration().await,
        Err(ControlError::AlreadyExplored)
    ));

    controller.start_collecting().await.unwrap();
    assert_eq!(controller.mode(), Mode::Executing);
    assert!(matches!(
        controller.start_exploration().await,
        Err(ControlError::Busy(Mode::Executing))
    ));

    sent.recv().await.unwrap();
    assert!(controller.stop().await);
    wait_for_mode(&controller, Mode::Idle).await;

    let status = controller.status().await;
    assert_eq!(status.execution, PathExecutionState::Stopped);
    assert!(!controller.stop().await);

    // Patrol can be resumed on the same route
    controller.start_collecting().await.unwrap();
    assert_eq!(controller.mode(), Mode::Executing);
    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_collect_requires_exploration() {
    let (_broker, controller) = forest_controller().await;
    assert!(matches!(
        controller.start_collecting().await,
        Err(ControlError::NotExplored)
    ));
    assert_eq!(controller.mode(), Mode::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_refuses_and_ignores_snapshots() {
    let (broker, controller) = forest_controller().await;
    controller.set_enabled(false);

    assert!(matches!(
        controller.start_exploration().await,
        Err(ControlError::Disabled)
    ));
    assert!(matches!(
        controller.start_auto().await,
        Err(ControlError::Disabled)
    ));

    broker.deliver(Maze::forest().snapshot(301).unwrap().to_message());
    tokio::time::sleep(Duration::from_millis(10)).await;
    let status = controller.status().await;
    assert!(!status.enabled);
    assert_eq!(status.rooms_known, 1);
    assert_eq!(status.current_room, Some(301));
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_exploration_allows_restart() {
    let (broker, controller) = forest_controller().await;
    let mut sent = broker.subscribe_outbound();

    controller.start_exploration().await.unwrap();
    sent.recv().await.unwrap();
    assert!(controller.stop().await);
    wait_for_mode(&controller, Mode::Idle).await;
    assert_eq!(
        controller.status().await.exploration,
        ExplorationState::InProgress
    );

    controller.start_exploration().await.unwrap();
    wait_for_mode(&controller, Mode::Idle).await;
    assert_eq!(
        controller.status().await.exploration,
        ExplorationState::Complete
    );
}

#[tokio::test(start_paused = true)]
async fn test_auto_start_explores_then_patrols() {
    let (broker, controller) = forest_controller().await;
    let mut sent = broker.subscribe_outbound();

    controller.start_auto().await.unwrap();
    wait_for_mode(&controller, Mode::Executing).await;

    let status = controller.status().await;
    assert_eq!(status.exploration, ExplorationState::Complete);
    assert_eq!(status.execution, PathExecutionState::Running);

    // Exploration gotos, then the first patrol hop back toward 300
    for expected in [301, 302, 301] {
        assert_eq!(sent.recv().await.unwrap().target_room(), expected);
    }
    controller.stop().await;
    wait_for_mode(&controller, Mode::Idle).await;
}

#[tokio::test(start_paused = true)]
async fn test_saved_session_restores_route_and_graph() {
    let dir = TempDir::new().unwrap();
    let storage = StorageConfig {
        path: Some(dir.path().join("nested").join("session.json")),
        persist_graph: true,
    };

    let (_broker, controller) = forest_controller().await;
    let controller = controller.with_store(SessionStore::new(storage.resolved_path()), &storage);
    controller.start_exploration().await.unwrap();
    wait_for_mode(&controller, Mode::Idle).await;

    let saved = SessionStore::new(storage.resolved_path()).load().unwrap();
    assert_eq!(saved.route.rooms(), &[300, 301, 302]);
    assert_eq!(saved.graph.as_ref().map(|g| g.len()), Some(3));
    assert_eq!(saved.discovered, vec![300, 301, 302]);

    // A fresh host picks up where the last one left off
    let (_broker, restored) = forest_controller().await;
    assert!(restored.restore(saved).await);
    let status = restored.status().await;
    assert_eq!(status.exploration, ExplorationState::Complete);
    assert_eq!(status.route.rooms(), &[300, 301, 302]);
    assert_eq!(status.rooms_known, 3);

    restored.start_collecting().await.unwrap();
    assert_eq!(restored.mode(), Mode::Executing);
    restored.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_route_only_save_needs_exploration() {
    let dir = TempDir::new().unwrap();
    let storage = StorageConfig {
        path: Some(dir.path().join("session.json")),
        persist_graph: false,
    };

    let (_broker, controller) = forest_controller().await;
    let controller = controller.with_store(SessionStore::new(storage.resolved_path()), &storage);
    controller.start_exploration().await.unwrap();
    wait_for_mode(&controller, Mode::Idle).await;

    let saved = SessionStore::new(storage.resolved_path()).load().unwrap();
    assert!(saved.graph.is_none());

    let (_broker, restored) = forest_controller().await;
    assert!(!restored.restore(saved).await);
    assert_eq!(
        restored.status().await.exploration,
        ExplorationState::NotStarted
    );
}
