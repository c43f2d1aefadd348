//! Host-facing entry points: explore, collect (patrol) and stop.
//!
//! Exploration and patrol share the command channel and the room graph, so
//! they are modes of one state machine and never run at the same time.

use super::cancel::CancelToken;
use super::executor::{PathExecutionState, PathExecutor};
use super::explorer::{ExplorationState, Explorer};
use crate::broker::Broker;
use crate::config::{StorageConfig, TimingConfig};
use crate::graph::{Room, RoomGraph, RoomId};
use crate::planning::{Route, RouteOptimizer};
use crate::state::{SavedSession, SessionContext, SessionStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Idle,
    Exploring,
    Executing,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControllerStatus {
    pub mode: Mode,
    pub enabled: bool,
    pub exploration: ExplorationState,
    pub execution: PathExecutionState,
    pub current_room: Option<RoomId>,
    pub rooms_known: usize,
    pub route: Route,
}

struct ControlState {
    exploration: ExplorationState,
    execution: PathExecutionState,
    route: Route,
    token: Option<CancelToken>,
}

#[derive(Clone)]
pub struct Controller {
    ctx: Arc<SessionContext>,
    broker: Arc<dyn Broker>,
    timing: TimingConfig,
    store: Option<Arc<SessionStore>>,
    persist_graph: bool,
    state: Arc<Mutex<ControlState>>,
    mode: Arc<watch::Sender<Mode>>,
}

impl Controller {
    pub fn new(ctx: Arc<SessionContext>, broker: Arc<dyn Broker>, timing: TimingConfig) -> Self {
        let (mode, _) = watch::channel(Mode::Idle);
        Self {
            ctx,
            broker,
            timing,
            store: None,
            persist_graph: false,
            state: Arc::new(Mutex::new(ControlState {
                exploration: ExplorationState::NotStarted,
                execution: PathExecutionState::Idle,
                route: Route::default(),
                token: None,
            })),
            mode: Arc::new(mode),
        }
    }

    /// Save the route (and optionally the graph) after each completed exploration.
    pub fn with_store(mut self, store: SessionStore, storage: &StorageConfig) -> Self {
        self.store = Some(Arc::new(store));
        self.persist_graph = storage.persist_graph;
        self
    }

    pub fn mode(&self) -> Mode {
        *self.mode.borrow()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<Mode> {
        self.mode.subscribe()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.ctx.set_enabled(enabled);
        info!("Tracking {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Start discovering the maze. The route is planned once the frontier empties.
    pub async fn start_exploration(&self) -> Result<(), ControlError> {
        self.begin_exploration(false).await
    }

    /// Explore, then patrol the planned route right away.
    pub async fn start_auto(&self) -> Result<(), ControlError> {
        self.begin_exploration(true).await
    }

    /// Start or resume patrolling the route. Requires a completed exploration.
    pub async fn start_collecting(&self) -> Result<(), ControlError> {
        if !self.ctx.is_enabled() {
            return Err(ControlError::Disabled);
        }

        let mut state = self.state.lock().await;
        let mode = self.mode();
        if mode != Mode::Idle {
            return Err(ControlError::Busy(mode));
        }
        self.launch_patrol(&mut state).await
    }

    /// Caller holds the state lock and has checked the mode.
    async fn launch_patrol(&self, state: &mut ControlState) -> Result<(), ControlError> {
        if !self.ctx.is_enabled() {
            return Err(ControlError::Disabled);
        }
        if state.exploration != ExplorationState::Complete {
            return Err(ControlError::NotExplored);
        }
        if state.route.is_empty() {
            state.route = self.plan_route().await;
        }
        if state.route.is_empty() {
            info!("No route to patrol");
            return Err(ControlError::EmptyRoute);
        }

        let token = CancelToken::new();
        state.token = Some(token.clone());
        state.execution = PathExecutionState::Running;
        self.mode.send_replace(Mode::Executing);

        let route = state.route.clone();
        let this = self.clone();
        tokio::spawn(async move { this.patrol(route, token).await });
        Ok(())
    }

    /// Cancel whatever is running. Returns false when nothing was.
    ///
    /// Takes effect at the next hop or frontier step; commands already sent stand.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        match state.token.take() {
            Some(token) => {
                token.cancel();
                info!("Stop requested while {:?}", self.mode());
                true
            }
            None => false,
        }
    }

    pub async fn status(&self) -> ControllerStatus {
        let state = self.state.lock().await;
        ControllerStatus {
            mode: self.mode(),
            enabled: self.ctx.is_enabled(),
            exploration: state.exploration,
            execution: state.execution,
            current_room: self.ctx.current_room(),
            rooms_known: self.ctx.graph().await.len(),
            route: state.route.clone(),
        }
    }

    pub async fn route(&self) -> Route {
        self.state.lock().await.route.clone()
    }

    pub async fn graph(&self) -> BTreeMap<RoomId, Room> {
        self.ctx.graph().await.rooms().clone()
    }

    /// Resume from a saved session. Only sessions carrying their graph can be
    /// patrolled, so route-only saves are ignored.
    pub async fn restore(&self, saved: SavedSession) -> bool {
        let Some(rooms) = saved.graph else {
            info!("Saved session has no graph, exploration needed");
            return false;
        };

        let mut state = self.state.lock().await;
        if self.mode() != Mode::Idle {
            warn!("Cannot restore while {:?}", self.mode());
            return false;
        }

        let graph = RoomGraph::from_rooms(rooms, &saved.discovered, self.ctx.excluded());
        info!(rooms = graph.len(), route = saved.route.len(), "Restored saved session");
        self.ctx.replace_graph(graph).await;
        state.route = saved.route;
        state.exploration = ExplorationState::Complete;
        true
    }

    async fn begin_exploration(&self, then_patrol: bool) -> Result<(), ControlError> {
        if !self.ctx.is_enabled() {
            return Err(ControlError::Disabled);
        }

        let mut state = self.state.lock().await;
        let mode = self.mode();
        if mode != Mode::Idle {
            return Err(ControlError::Busy(mode));
        }
        if state.exploration == ExplorationState::Complete {
            return Err(ControlError::AlreadyExplored);
        }

        let token = CancelToken::new();
        state.token = Some(token.clone());
        state.exploration = ExplorationState::InProgress;
        self.mode.send_replace(Mode::Exploring);

        let this = self.clone();
        tokio::spawn(async move { this.explore(token, then_patrol).await });
        Ok(())
    }

    async fn explore(self, token: CancelToken, then_patrol: bool) {
        let mut explorer = Explorer::new(
            self.ctx.clone(),
            self.broker.clone(),
            self.timing.settle_timeout(),
        );
        let outcome = explorer.run(&token).await;

        let route = match outcome {
            ExplorationState::Complete => {
                let route = self.plan_route().await;
                info!("Planned route: {:?}", route.rooms());
                self.persist(route.clone()).await;
                Some(route)
            }
            _ => None,
        };
        let planned = route.is_some();

        let mut state = self.state.lock().await;
        state.exploration = outcome;
        state.token = None;
        if let Some(route) = route {
            state.route = route;
        }

        // Patrol starts under the same lock a stop takes, so a stop lands on
        // either this token or the patrol's
        if planned && then_patrol && !token.is_cancelled() {
            match self.launch_patrol(&mut state).await {
                Ok(()) => return,
                Err(e) => warn!("Could not start patrol after exploration: {}", e),
            }
        }
        self.mode.send_replace(Mode::Idle);
    }

    async fn patrol(self, route: Route, token: CancelToken) {
        let mut executor = PathExecutor::new(
            self.ctx.clone(),
            self.broker.clone(),
            self.timing.hop_interval(),
        );
        let outcome = executor.run(&route, &token).await;

        let mut state = self.state.lock().await;
        state.execution = outcome;
        state.token = None;
        self.mode.send_replace(Mode::Idle);
    }

    async fn plan_route(&self) -> Route {
        let graph = self.ctx.graph().await;
        RouteOptimizer::new(&graph).compute(self.ctx.start_room())
    }

    async fn persist(&self, route: Route) {
        let Some(store) = &self.store else {
            return;
        };
        let mut session = SavedSession::new(route);
        if self.persist_graph {
            let graph = self.ctx.graph().await;
            session = session.with_graph(graph.rooms().clone(), graph.discovered().to_vec());
        }
        match store.save(&session) {
            Ok(()) => info!("Route saved to {:?}", store.path()),
            Err(e) => warn!("Failed to save route: {}", e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Automation is disabled")]
    Disabled,
    #[error("Already {0:?}")]
    Busy(Mode),
    #[error("Exploration already complete")]
    AlreadyExplored,
    #[error("Exploration has not completed")]
    NotExplored,
    #[error("Route is empty")]
    EmptyRoute,
}
