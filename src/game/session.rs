//! Session state and authoritative tick loop
//!
//! One tokio task owns the world state, its RNG, and all inbound message
//! handling, so ticks and handlers are serialized and no one ever observes a
//! half-updated world.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::game::roster::{self, Player};
use crate::game::snapshot::BroadcastGate;
use crate::game::state::GameState;
use crate::game::{collision, physics, progression, spawner, PlayerInput};
use crate::util::time::{unix_millis, BROADCAST_TPS, SIMULATION_TPS, TICK_DURATION_MICROS};
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Delay between the end-of-session notice and closing the connections
const SESSION_END_GRACE: Duration = Duration::from_millis(500);

/// Inbound events from WebSocket connections
#[derive(Debug)]
pub enum SessionEvent {
    /// A connection completed its join handshake; the sender is the
    /// connection's outbound handle, registered on success
    Joined {
        player_id: Uuid,
        name: String,
        tx: mpsc::UnboundedSender<ServerMsg>,
    },
    /// A parsed client message from a joined player
    Message(PlayerInput),
    /// The transport closed
    Disconnected { player_id: Uuid },
}

/// Identity-keyed map from player id to a send-capable connection handle.
/// The session task is the only writer; the health endpoint reads counts.
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, mpsc::UnboundedSender<ServerMsg>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn insert(&self, player_id: Uuid, tx: mpsc::UnboundedSender<ServerMsg>) {
        self.connections.insert(player_id, tx);
    }

    pub fn remove(&self, player_id: Uuid) {
        self.connections.remove(&player_id);
    }

    /// Drop every connection handle; writer tasks close their sockets when
    /// their channel closes
    pub fn clear(&self) {
        self.connections.clear();
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Push a message to every registered connection. A failed send is
    /// logged and skipped; it never aborts the rest of the broadcast.
    pub fn broadcast(&self, msg: &ServerMsg) {
        for entry in self.connections.iter() {
            if entry.value().send(msg.clone()).is_err() {
                warn!(player_id = %entry.key(), "Dropping broadcast to closed connection");
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub events_tx: mpsc::Sender<SessionEvent>,
    pub registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn connected_players(&self) -> usize {
        self.registry.len()
    }
}

/// The authoritative ride session
pub struct GameSession {
    state: GameState,
    rng: ChaCha8Rng,
    events_rx: mpsc::Receiver<SessionEvent>,
    registry: Arc<ConnectionRegistry>,
    gate: BroadcastGate,
    running: Arc<AtomicBool>,
    last_tick: std::time::Instant,
}

impl GameSession {
    /// Create a new session and its handle
    pub fn new(seed: u64) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::channel(256);
        let registry = Arc::new(ConnectionRegistry::new());
        let running = Arc::new(AtomicBool::new(false));

        let handle = SessionHandle {
            events_tx,
            registry: registry.clone(),
            running: running.clone(),
        };

        let session = Self {
            state: GameState::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            events_rx,
            registry,
            gate: BroadcastGate::new(SIMULATION_TPS / BROADCAST_TPS),
            running,
            last_tick: std::time::Instant::now(),
        };

        (session, handle)
    }

    /// Run the session task: the tick loop and all message handling,
    /// serialized on this task
    pub async fn run(mut self) {
        info!("Session task started");

        let tick_duration = Duration::from_micros(TICK_DURATION_MICROS);
        let mut ticker = interval(tick_duration);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick(), if self.state.is_game_started => {
                    self.run_tick().await;
                }
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }
            }
        }

        info!("Session task stopped");
    }

    /// Run a single simulation tick. Component order is fixed: collision
    /// resolution depends on the integrator's position and the spawner's
    /// freshly placed objects.
    async fn run_tick(&mut self) {
        let now = std::time::Instant::now();
        let delta_time = (now - self.last_tick).as_secs_f32();
        self.last_tick = now;

        physics::integrate(&mut self.state, delta_time);
        spawner::advance_objects(&mut self.state, &mut self.rng, delta_time);
        spawner::try_spawn(&mut self.state, &mut self.rng);
        let collided = collision::detect_and_resolve(&mut self.state, &mut self.rng);
        let leveled = progression::advance(&mut self.state, delta_time);

        if self.state.lives == 0 {
            self.end_session().await;
            return;
        }

        if collided || leveled {
            self.gate.force_next();
        }
        if self.gate.should_send() {
            self.broadcast_state();
        }
    }

    /// Handle one inbound event
    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Joined { player_id, name, tx } => {
                self.handle_join(player_id, name, tx);
            }
            SessionEvent::Message(input) => {
                self.handle_message(input);
            }
            SessionEvent::Disconnected { player_id } => {
                self.handle_disconnect(player_id);
            }
        }
    }

    fn handle_join(&mut self, player_id: Uuid, name: String, tx: mpsc::UnboundedSender<ServerMsg>) {
        let welcome = ServerMsg::Welcome {
            player_id,
            server_time: unix_millis(),
        };
        if tx.send(welcome).is_err() {
            warn!(player_id = %player_id, "Connection closed before welcome");
            return;
        }

        self.state.players.push(Player::new(player_id, name));
        self.registry.insert(player_id, tx);

        info!(
            player_id = %player_id,
            player_count = self.state.players.len(),
            "Player joined session"
        );

        self.broadcast_state();
    }

    fn handle_message(&mut self, input: PlayerInput) {
        match input.msg {
            ClientMsg::Join { .. } => {
                warn!(player_id = %input.player_id, "Duplicate join ignored");
            }
            ClientMsg::RequestStart => {
                self.handle_request_start();
            }
            ClientMsg::Ready => {
                roster::mark_ready(&mut self.state.players, input.player_id);
                self.broadcast_state();
            }
            ClientMsg::MoveInput { direction, pressed } => {
                if self.state.is_game_started {
                    physics::apply_move_input(&mut self.state, direction, pressed);
                }
                // Presses are latency-sensitive: bypass the throttle
                self.broadcast_state();
            }
            ClientMsg::MinigameFinished { player_id, score } => {
                self.handle_minigame_finished(player_id, score);
            }
        }
    }

    fn handle_request_start(&mut self) {
        if self.state.players.is_empty() || self.state.is_game_started {
            return;
        }

        self.state.is_game_started = true;
        self.last_tick = std::time::Instant::now();
        self.running.store(true, Ordering::Relaxed);

        info!(
            player_count = self.state.players.len(),
            "Session started"
        );

        self.registry.broadcast(&ServerMsg::SessionStarted);
        self.broadcast_state();
    }

    fn handle_minigame_finished(&mut self, player_id: Uuid, score: u32) {
        if !roster::finish_minigame(&mut self.state.players, player_id) {
            warn!(player_id = %player_id, "Minigame report from player not in the minigame");
            return;
        }

        self.state.score += score;
        self.state
            .set_message(format!("Finished operation (+{score} points)"));

        info!(player_id = %player_id, score, "Operation minigame finished");
        self.broadcast_state();
    }

    fn handle_disconnect(&mut self, player_id: Uuid) {
        roster::remove_player(&mut self.state.players, player_id);
        self.registry.remove(player_id);

        info!(
            player_id = %player_id,
            player_count = self.state.players.len(),
            "Player left session"
        );

        if self.registry.is_empty() {
            // Nobody can observe the session; stop ticking and reset
            info!("No active connections, resetting session");
            self.reset();
        } else {
            self.broadcast_state();
        }
    }

    /// Final broadcast, end-of-session notice, grace delay, then close every
    /// connection and reset for the next ride
    async fn end_session(&mut self) {
        let final_score = self.state.score;
        info!(final_score, "Session over");

        self.broadcast_state();
        self.registry
            .broadcast(&ServerMsg::SessionEnded { final_score });

        tokio::time::sleep(SESSION_END_GRACE).await;
        self.registry.clear();
        self.reset();
    }

    fn reset(&mut self) {
        self.state = GameState::new();
        self.gate.reset();
        self.running.store(false, Ordering::Relaxed);
    }

    /// Serialize the full world state to every registered connection
    fn broadcast_state(&mut self) {
        self.state.last_update_time = unix_millis();
        self.registry.broadcast(&ServerMsg::State {
            state: self.state.clone(),
        });
        self.gate.reset();
    }
}
