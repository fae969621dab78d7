//! Session state.
//!
//! A session is one isolated game-world instance: the world generated for a
//! room code, the players currently inside it, its animals, and its static
//! obstacles. All mutation happens under the session's lock (one logical
//! writer per room), so every peer observes the room's events in the order
//! the relay processed them. Nothing here touches sockets directly; outbound
//! traffic goes through per-peer channels drained by writer tasks.

use std::collections::HashMap;

use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use glade_shared::animal::AnimalSet;
use glade_shared::config::GameConfig;
use glade_shared::player::{scoreboard, Player, HIT_DAMAGE, MAX_HEALTH};
use glade_shared::protocol::{ChatLine, ChatSender, MoveUpdate, PlayerId, ServerMsg, Tree};
use glade_shared::world::World;

/// Players spawn with x and z uniform in `[-SPAWN_SPREAD, SPAWN_SPREAD)`.
const SPAWN_SPREAD: f32 = 20.0;
const SPAWN_EYE_Y: f32 = 2.0;
/// Tree positions below this elevation are discarded (underwater).
const TREE_MIN_HEIGHT: f32 = -10.0;

pub struct Session {
    code: String,
    world: World,
    players: HashMap<PlayerId, Player>,
    peers: HashMap<PlayerId, UnboundedSender<ServerMsg>>,
    animals: AnimalSet,
    trees: Vec<Tree>,
    /// Monotonic join counter backing the fallback `Player N` names.
    joined_total: u32,
    /// Set by the registry when the last player leaves; stops the tick task.
    pub(crate) destroyed: bool,
}

impl Session {
    /// Generates a fresh world for a new room code.
    pub fn create(code: &str, cfg: &GameConfig, rng: &mut impl Rng) -> Self {
        let world = World::generate(cfg, rng);

        let mut trees = Vec::new();
        let mut animals = AnimalSet::default();
        if let World::Terrain(field) = &world {
            let half = cfg.world_size / 2.0;
            for _ in 0..cfg.tree_count {
                let x = rng.gen_range(-half..half);
                let z = rng.gen_range(-half..half);
                let y = field.height_at(x, z);
                if y > TREE_MIN_HEIGHT {
                    trees.push(Tree { x, y, z });
                }
            }
            animals = AnimalSet::populate(cfg.animal_count, field, rng);
        }

        info!(
            room = %code,
            trees = trees.len(),
            animals = animals.len(),
            "Session created"
        );

        Self {
            code: code.to_string(),
            world,
            players: HashMap::new(),
            peers: HashMap::new(),
            animals,
            trees,
            joined_total: 0,
            destroyed: false,
        }
    }

    pub fn has_animals(&self) -> bool {
        !self.animals.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    fn spawn_position(&self, rng: &mut impl Rng) -> (f32, f32, f32) {
        match &self.world {
            World::Terrain(_) => (
                rng.gen_range(-SPAWN_SPREAD..SPAWN_SPREAD),
                SPAWN_EYE_Y,
                rng.gen_range(-SPAWN_SPREAD..SPAWN_SPREAD),
            ),
            // Dungeons always start in the origin room.
            World::Dungeon(_) => (0.0, SPAWN_EYE_Y, 0.0),
        }
    }

    /// Adds a player, sends the full snapshot bundle to the joining
    /// connection only, and announces the join to the rest of the room.
    pub fn join(
        &mut self,
        id: PlayerId,
        name: Option<String>,
        tx: UnboundedSender<ServerMsg>,
        rng: &mut impl Rng,
    ) {
        self.joined_total += 1;
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Player {}", self.joined_total));

        let (x, y, z) = self.spawn_position(rng);
        let player = Player::new(id, name, x, y, z);
        self.players.insert(id, player.clone());
        self.peers.insert(id, tx.clone());

        let _ = tx.send(ServerMsg::CurrentPlayers(self.players.clone()));
        let _ = tx.send(ServerMsg::LevelConfig(self.world.to_payload()));
        let _ = tx.send(ServerMsg::TreeConfig(self.trees.clone()));
        let _ = tx.send(ServerMsg::CurrentAnimals(self.animals.snapshot()));
        let _ = tx.send(ServerMsg::Scoreboard(scoreboard(self.players.values())));

        self.broadcast_except(id, ServerMsg::PlayerJoined(player));

        let _ = tx.send(ServerMsg::Chat(ChatLine {
            id: ChatSender::System,
            message: format!("Joined room {}", self.code),
        }));

        info!(room = %self.code, player = %id, "Player joined");
    }

    /// Overwrites the sender's transform verbatim and relays it to everyone
    /// else. The sender never receives its own echo.
    pub fn apply_move(&mut self, id: PlayerId, update: &MoveUpdate) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        player.apply_move(update);
        let moved = player.clone();
        self.broadcast_except(id, ServerMsg::PlayerMoved(moved));
    }

    /// Visual-only shot fan-out; no hit arbitration here.
    pub fn shoot(&mut self, id: PlayerId) {
        if !self.players.contains_key(&id) {
            return;
        }
        self.broadcast_except(id, ServerMsg::PlayerShot { id });
    }

    /// Applies a client-reported hit: fixed damage, and on a kill the full
    /// respawn sequence (reset, relocate, tallies, kill feed, scoreboard).
    pub fn hit(&mut self, attacker: PlayerId, target: PlayerId, rng: &mut impl Rng) {
        let health = match self.players.get_mut(&target) {
            Some(t) => {
                t.health -= HIT_DAMAGE;
                t.health
            }
            None => {
                debug!(room = %self.code, ?target, "Hit on unknown player ignored");
                return;
            }
        };
        self.broadcast_all(ServerMsg::PlayerDamaged { id: target, health });

        if health > 0 {
            return;
        }

        let (x, y, z) = self.spawn_position(rng);
        let victim = match self.players.get_mut(&target) {
            Some(t) => {
                t.health = MAX_HEALTH;
                t.deaths += 1;
                t.x = x;
                t.y = y;
                t.z = z;
                t.clone()
            }
            None => return,
        };

        let killer_name = match self.players.get_mut(&attacker) {
            Some(killer) => {
                killer.kills += 1;
                killer.name.clone()
            }
            // The attacker may have left between firing and the kill landing.
            None => "Unknown".to_string(),
        };

        info!(
            room = %self.code,
            victim = %victim.name,
            killer = %killer_name,
            "Player killed"
        );

        self.broadcast_all(ServerMsg::Chat(ChatLine {
            id: ChatSender::System,
            message: format!("{} \u{1F52B} {}", victim.name, killer_name),
        }));
        self.broadcast_all(ServerMsg::Scoreboard(scoreboard(self.players.values())));
        self.broadcast_all(ServerMsg::PlayerRespawn(victim));
    }

    /// Relays a chat line to the whole room, tagged with the sender.
    pub fn chat(&mut self, id: PlayerId, message: String) {
        if !self.players.contains_key(&id) {
            return;
        }
        self.broadcast_all(ServerMsg::Chat(ChatLine {
            id: ChatSender::Player(id),
            message,
        }));
    }

    /// Removes a player and announces the departure. Returns true when the
    /// room is now empty and should be torn down.
    pub fn leave(&mut self, id: PlayerId) -> bool {
        if self.players.remove(&id).is_some() {
            self.peers.remove(&id);
            self.broadcast_all(ServerMsg::PlayerLeft { id });
            info!(room = %self.code, player = %id, "Player left");
        }
        self.players.is_empty()
    }

    /// One fixed AI tick: advance every animal and report the movers.
    pub fn tick(&mut self, dt: f32, rng: &mut impl Rng) {
        let moved = match &self.world {
            World::Terrain(field) => self.animals.step(dt, field, rng),
            World::Dungeon(_) => return,
        };
        for movement in moved {
            self.broadcast_all(ServerMsg::AnimalMoved(movement));
        }
    }

    fn broadcast_all(&self, msg: ServerMsg) {
        for tx in self.peers.values() {
            // A closed channel means the peer is mid-disconnect; its read
            // loop will run the leave path shortly.
            let _ = tx.send(msg.clone());
        }
    }

    fn broadcast_except(&self, skip: PlayerId, msg: ServerMsg) {
        for (peer, tx) in &self.peers {
            if *peer != skip {
                let _ = tx.send(msg.clone());
            }
        }
    }
}
