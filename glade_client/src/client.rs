//! Client implementation.
//!
//! The client maintains:
//! - One framed TCP connection to the relay
//! - A mirror of the room state (players, world, trees, scoreboard, chat)
//! - The local kinematic model and look controller
//! - Interpolation state for every remote entity
//! - View-only projectiles
//!
//! Once per rendered frame the integrator advances and the resulting
//! transform is reported fire-and-forget; a dropped report is simply
//! superseded by the next frame's.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};

use glade_shared::config::GameConfig;
use glade_shared::math::Vec3;
use glade_shared::player::{Player, MAX_HEALTH};
use glade_shared::protocol::{
    ChatLine, ClientMsg, Connection, MoveUpdate, PlayerId, ServerMsg, PROTOCOL_VERSION,
};
use glade_shared::world::{HeightSource, World};

use crate::input::{InputState, LookController};
use crate::interp::{Interpolator, TrackedId};
use crate::kinematics::{KinematicConfig, KinematicModel, Obstacle};
use crate::projectile::ProjectileSet;

/// Collision radius for trees.
const TREE_RADIUS: f32 = 2.0;
/// Combined-collision radius contribution of an animal.
const ANIMAL_RADIUS: f32 = 1.5;
/// How long `poll` waits for one more pending event.
const POLL_BUDGET: Duration = Duration::from_millis(2);

/// High-level game client.
pub struct GameClient {
    pub id: PlayerId,
    /// Room this client currently belongs to.
    pub room: Option<String>,
    /// Last known room state as reported by the relay, self included.
    pub players: HashMap<PlayerId, Player>,
    pub world: Option<World>,
    pub health: i32,
    pub scoreboard: Vec<Player>,
    pub chat_log: Vec<ChatLine>,

    pub kinematics: KinematicModel,
    pub look: LookController,
    pub interp: Interpolator,
    pub projectiles: ProjectileSet,

    conn: Connection,
    name: String,
}

impl GameClient {
    /// Connects to the relay and performs the handshake.
    pub async fn connect(cfg: &GameConfig) -> anyhow::Result<Self> {
        info!(relay = %cfg.listen_addr, "Connecting to relay");
        let mut conn = Connection::connect(&cfg.listen_addr).await?;

        conn.send(&ClientMsg::Hello {
            protocol: PROTOCOL_VERSION,
        })
        .await?;

        let id = match conn.recv().await.context("welcome")? {
            ServerMsg::Welcome { id } => id,
            other => anyhow::bail!("expected Welcome, got {other:?}"),
        };
        info!(player = %id, "Connected to relay");

        Ok(Self {
            id,
            room: None,
            players: HashMap::new(),
            world: None,
            health: MAX_HEALTH,
            scoreboard: Vec::new(),
            chat_log: Vec::new(),
            kinematics: KinematicModel::new(KinematicConfig::default()),
            look: LookController::default(),
            interp: Interpolator::default(),
            projectiles: ProjectileSet::default(),
            conn,
            name: cfg.player_name.clone(),
        })
    }

    /// Enters a room, abandoning any previous one without state transfer.
    pub async fn join(&mut self, code: &str) -> anyhow::Result<()> {
        self.players.clear();
        self.world = None;
        self.scoreboard.clear();
        self.interp.clear();
        self.projectiles.clear();
        self.kinematics.set_statics(Vec::new());
        self.health = MAX_HEALTH;

        self.conn
            .send(&ClientMsg::Join {
                code: code.to_string(),
                name: Some(self.name.clone()),
            })
            .await?;
        self.room = Some(code.to_string());
        info!(room = %code, "Join requested");
        Ok(())
    }

    /// Receives and applies one relay event, waiting at most `timeout`.
    pub async fn next_event(&mut self, timeout: Duration) -> anyhow::Result<Option<ServerMsg>> {
        match self.conn.recv_timeout(timeout).await? {
            Some(msg) => {
                self.apply(&msg);
                Ok(Some(msg))
            }
            None => Ok(None),
        }
    }

    /// Drains whatever events are pending right now.
    pub async fn poll(&mut self) -> anyhow::Result<()> {
        while self.next_event(POLL_BUDGET).await?.is_some() {}
        Ok(())
    }

    fn apply(&mut self, msg: &ServerMsg) {
        match msg {
            ServerMsg::Welcome { id } => {
                debug!(player = %id, "Duplicate welcome ignored");
            }
            ServerMsg::CurrentPlayers(players) => {
                self.players = players.clone();
                for player in players.values() {
                    if player.id != self.id {
                        self.track_player(player);
                    }
                }
                if let Some(me) = players.get(&self.id) {
                    self.health = me.health;
                    self.kinematics.teleport(me.x, me.y, me.z);
                }
            }
            ServerMsg::LevelConfig(payload) => {
                self.world = Some(World::from(payload.clone()));
            }
            ServerMsg::TreeConfig(trees) => {
                self.kinematics.set_statics(
                    trees
                        .iter()
                        .map(|t| Obstacle {
                            x: t.x,
                            z: t.z,
                            radius: TREE_RADIUS,
                        })
                        .collect(),
                );
            }
            ServerMsg::CurrentAnimals(animals) => {
                for animal in animals.values() {
                    self.interp.update_target(
                        TrackedId::Animal(animal.id),
                        Vec3::new(animal.x, animal.y, animal.z),
                        animal.rotation,
                        0.0,
                        true,
                    );
                }
            }
            ServerMsg::PlayerJoined(player) => {
                self.players.insert(player.id, player.clone());
                self.track_player(player);
            }
            ServerMsg::PlayerMoved(player) => {
                self.players.insert(player.id, player.clone());
                self.track_player(player);
            }
            ServerMsg::PlayerShot { id } => {
                if let Some(shooter) = self.players.get(id) {
                    self.projectiles.spawn_from_view(
                        Vec3::new(shooter.x, shooter.y, shooter.z),
                        shooter.rotation,
                        shooter.rx,
                    );
                }
            }
            ServerMsg::PlayerDamaged { id, health } => {
                if let Some(player) = self.players.get_mut(id) {
                    player.health = *health;
                }
                if *id == self.id {
                    self.health = *health;
                }
            }
            ServerMsg::PlayerRespawn(player) => {
                self.players.insert(player.id, player.clone());
                if player.id == self.id {
                    self.health = player.health;
                    self.kinematics.teleport(player.x, player.y, player.z);
                } else {
                    self.track_player(player);
                }
            }
            ServerMsg::Scoreboard(board) => {
                self.scoreboard = board.clone();
            }
            ServerMsg::Chat(line) => {
                self.chat_log.push(line.clone());
            }
            ServerMsg::PlayerLeft { id } => {
                self.players.remove(id);
                self.interp.remove(TrackedId::Player(*id));
            }
            ServerMsg::AnimalMoved(m) => {
                self.interp.update_target(
                    TrackedId::Animal(m.id),
                    Vec3::new(m.x, m.y, m.z),
                    m.rotation,
                    0.0,
                    true,
                );
            }
        }
    }

    fn track_player(&mut self, player: &Player) {
        if player.id == self.id {
            return;
        }
        self.interp.update_target(
            TrackedId::Player(player.id),
            Vec3::new(player.x, player.y, player.z),
            player.rotation,
            player.rx,
            false,
        );
    }

    /// One cooperative frame step: integrate the local viewpoint, ease
    /// remote entities, advance tracers, then report the new transform.
    pub async fn frame(&mut self, dt: f32, input: &mut InputState) -> anyhow::Result<()> {
        let animals = self.interp.animal_positions();
        let ground = self.world.as_ref().map(|w| w as &dyn HeightSource);

        self.kinematics
            .step(dt, input, self.look.yaw, &animals, ANIMAL_RADIUS, ground);
        self.interp.advance(dt);
        self.projectiles.advance(dt);

        if self.room.is_some() {
            self.conn
                .send(&ClientMsg::Move(MoveUpdate {
                    x: self.kinematics.position.x,
                    y: self.kinematics.position.y,
                    z: self.kinematics.position.z,
                    rotation: self.look.yaw,
                    rx: self.look.pitch,
                }))
                .await?;
        }
        Ok(())
    }

    /// Fires: spawns the local tracer and notifies the room.
    pub async fn shoot(&mut self) -> anyhow::Result<()> {
        self.projectiles
            .spawn_from_view(self.kinematics.position, self.look.yaw, self.look.pitch);
        self.conn.send(&ClientMsg::Shoot).await
    }

    /// Reports a client-side hit claim on another player.
    pub async fn claim_hit(&mut self, target: PlayerId) -> anyhow::Result<()> {
        self.conn.send(&ClientMsg::Hit { target }).await
    }

    pub async fn say(&mut self, message: &str) -> anyhow::Result<()> {
        self.conn
            .send(&ClientMsg::Chat {
                message: message.to_string(),
            })
            .await
    }

    pub async fn leave(&mut self) -> anyhow::Result<()> {
        self.room = None;
        self.conn.send(&ClientMsg::Leave).await
    }

    /// Chat lines accumulated past `seen`, for incremental display.
    pub fn chat_since(&self, seen: usize) -> &[ChatLine] {
        &self.chat_log[seen.min(self.chat_log.len())..]
    }
}
