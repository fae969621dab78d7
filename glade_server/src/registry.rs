//! Room registry.
//!
//! Maps join codes to live sessions. A room is created on the first join to
//! its code and destroyed the moment its last player leaves; the next join
//! to the same code generates a brand-new world. Lock order is always
//! registry map first, then session; the tick task takes only the session
//! lock and so can never participate in an ordering cycle.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, info};

use glade_shared::config::GameConfig;
use glade_shared::protocol::{PlayerId, ServerMsg};

use crate::session::Session;

pub struct RoomRegistry {
    cfg: GameConfig,
    rooms: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl RoomRegistry {
    pub fn new(cfg: GameConfig) -> Arc<Self> {
        Arc::new(Self {
            cfg,
            rooms: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    /// Joins `id` to the room for `code`, creating the room (and its world,
    /// and its AI tick task) if this is the first join. Returns the session
    /// handle the connection should route room events through.
    pub async fn join(
        self: &Arc<Self>,
        code: &str,
        id: PlayerId,
        name: Option<String>,
        tx: UnboundedSender<ServerMsg>,
    ) -> Arc<Mutex<Session>> {
        let mut rooms = self.rooms.lock().await;

        let room = match rooms.get(code) {
            Some(room) => Arc::clone(room),
            None => {
                let session = {
                    let mut rng = rand::thread_rng();
                    Session::create(code, &self.cfg, &mut rng)
                };
                let ticks = session.has_animals();
                let room = Arc::new(Mutex::new(session));
                rooms.insert(code.to_string(), Arc::clone(&room));

                if ticks {
                    let period = Duration::from_millis(self.cfg.tick_ms);
                    tokio::spawn(animal_tick_loop(Arc::downgrade(&room), period));
                }
                room
            }
        };

        {
            let mut session = room.lock().await;
            let mut rng = rand::thread_rng();
            session.join(id, name, tx, &mut rng);
        }

        room
    }

    /// Removes `id` from the room for `code` and tears the room down if it
    /// is now empty. Unknown codes and absent players are ignored.
    pub async fn leave(&self, code: &str, id: PlayerId) {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(code) else {
            return;
        };

        let empty = {
            let mut session = room.lock().await;
            let empty = session.leave(id);
            if empty {
                session.destroyed = true;
            }
            empty
        };

        if empty {
            rooms.remove(code);
            info!(room = %code, "Room deleted (empty)");
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Human-readable status for the relay console.
    pub async fn status_lines(&self) -> Vec<String> {
        let rooms = self.rooms.lock().await;
        let mut out = Vec::new();
        out.push(format!("Rooms: {}", rooms.len()));
        for (code, room) in rooms.iter() {
            let session = room.lock().await;
            out.push(format!("  {}: {} player(s)", code, session.player_count()));
        }
        out
    }
}

/// Fixed-period AI tick for one room. Holds only a weak handle so the task
/// winds down once the registry and every connection have dropped the room.
/// The step delta is fixed by the configured period; wall-clock jitter never
/// changes how far an animal walks per tick.
async fn animal_tick_loop(room: Weak<Mutex<Session>>, period: Duration) {
    let dt = period.as_secs_f32();
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        let Some(room) = room.upgrade() else {
            break;
        };
        let mut session = room.lock().await;
        if session.destroyed {
            break;
        }
        let mut rng = rand::thread_rng();
        session.tick(dt, &mut rng);
    }
    debug!("Animal tick loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use glade_shared::config::WorldKind;
    use tokio::sync::mpsc;

    fn test_config() -> GameConfig {
        GameConfig {
            world: WorldKind::Terrain,
            grid_size: 8,
            world_size: 80.0,
            animal_count: 2,
            tree_count: 5,
            ..GameConfig::default()
        }
    }

    #[tokio::test]
    async fn first_join_creates_room_second_reuses_it() {
        let registry = RoomRegistry::new(test_config());

        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let room_a = registry.join("alpha", PlayerId(1), None, tx_a).await;
        assert_eq!(registry.room_count().await, 1);

        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let room_b = registry.join("alpha", PlayerId(2), None, tx_b).await;
        assert_eq!(registry.room_count().await, 1);
        assert!(Arc::ptr_eq(&room_a, &room_b), "same code reuses the world");

        assert_eq!(room_a.lock().await.player_count(), 2);
    }

    #[tokio::test]
    async fn distinct_codes_are_isolated() {
        let registry = RoomRegistry::new(test_config());

        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let room_a = registry.join("alpha", PlayerId(1), None, tx_a).await;
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let room_b = registry.join("beta", PlayerId(2), None, tx_b).await;

        assert_eq!(registry.room_count().await, 2);
        assert!(!Arc::ptr_eq(&room_a, &room_b));
        assert_eq!(room_a.lock().await.player_count(), 1);
        assert_eq!(room_b.lock().await.player_count(), 1);
    }

    #[tokio::test]
    async fn last_leave_destroys_room_and_next_join_regenerates() {
        let registry = RoomRegistry::new(test_config());

        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let first = registry.join("alpha", PlayerId(1), None, tx_a).await;

        registry.leave("alpha", PlayerId(1)).await;
        assert_eq!(registry.room_count().await, 0);
        assert!(first.lock().await.destroyed);

        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let second = registry.join("alpha", PlayerId(2), None, tx_b).await;
        assert_eq!(registry.room_count().await, 1);
        assert!(
            !Arc::ptr_eq(&first, &second),
            "a new join builds a new session"
        );
    }

    #[tokio::test]
    async fn leave_of_unknown_room_is_ignored() {
        let registry = RoomRegistry::new(test_config());
        registry.leave("nowhere", PlayerId(1)).await;
        assert_eq!(registry.room_count().await, 0);
    }
}
