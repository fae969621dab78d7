//! Relay implementation.
//!
//! One TCP endpoint. Each connection gets a read task (this function) and a
//! writer task draining that peer's outbound channel, so a slow socket never
//! blocks room mutation. The relay never recomputes client transforms; it
//! routes events into the session owning the connection's current room.
//!
//! Failure containment: a malformed or dead connection only tears down its
//! own player. Nothing in here is allowed to panic the process.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use glade_shared::config::GameConfig;
use glade_shared::protocol::{
    ClientMsg, FrameReader, FrameWriter, PlayerId, ServerMsg, PROTOCOL_VERSION,
};

use crate::registry::RoomRegistry;

pub struct Relay {
    listener: TcpListener,
    registry: std::sync::Arc<RoomRegistry>,
}

impl Relay {
    /// Binds the relay endpoint.
    pub async fn bind(cfg: GameConfig) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.listen_addr.parse().context("parse listen_addr")?;
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        let registry = RoomRegistry::new(cfg);
        Ok(Self { listener, registry })
    }

    /// Returns the local address (after binding).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> std::sync::Arc<RoomRegistry> {
        std::sync::Arc::clone(&self.registry)
    }

    /// Accept loop; runs until the process exits.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(addr = %self.local_addr()?, "Relay listening");
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let registry = std::sync::Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(registry, stream, peer).await {
                            debug!(%peer, error = %e, "Connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                }
            }
        }
    }
}

async fn handle_connection(
    registry: std::sync::Arc<RoomRegistry>,
    stream: TcpStream,
    peer: SocketAddr,
) -> anyhow::Result<()> {
    let (read, write) = stream.into_split();
    let mut reader = FrameReader::new(read);
    let mut writer = FrameWriter::new(write);

    // Handshake: first frame must be a protocol-compatible Hello.
    match reader.recv::<ClientMsg>().await? {
        ClientMsg::Hello { protocol } if protocol == PROTOCOL_VERSION => {}
        other => anyhow::bail!("unexpected handshake msg: {other:?}"),
    }

    let id = PlayerId::new_unique();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMsg>();

    // Writer task: drains this peer's outbound queue onto the socket.
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if writer.send(&msg).await.is_err() {
                break;
            }
        }
    });

    let _ = tx.send(ServerMsg::Welcome { id });
    info!(player = %id, %peer, "Client connected");

    // The room this connection currently belongs to, if any. A connection is
    // in at most one room; rejoining abandons the previous one.
    let mut current: Option<(String, std::sync::Arc<tokio::sync::Mutex<crate::session::Session>>)> =
        None;

    loop {
        let msg = match reader.recv::<ClientMsg>().await {
            Ok(msg) => msg,
            // Transport loss is an implicit leave, not an error condition.
            Err(e) => {
                debug!(player = %id, error = %e, "Read loop ended");
                break;
            }
        };

        match msg {
            ClientMsg::Hello { .. } => {
                debug!(player = %id, "Duplicate hello ignored");
            }
            ClientMsg::Join { code, name } => {
                if let Some((old_code, _)) = current.take() {
                    registry.leave(&old_code, id).await;
                }
                let room = registry.join(&code, id, name, tx.clone()).await;
                current = Some((code, room));
            }
            ClientMsg::Move(update) => {
                if let Some((_, room)) = &current {
                    room.lock().await.apply_move(id, &update);
                }
            }
            ClientMsg::Shoot => {
                if let Some((_, room)) = &current {
                    room.lock().await.shoot(id);
                }
            }
            ClientMsg::Hit { target } => {
                if let Some((_, room)) = &current {
                    let mut session = room.lock().await;
                    let mut rng = rand::thread_rng();
                    session.hit(id, target, &mut rng);
                }
            }
            ClientMsg::Chat { message } => {
                if let Some((_, room)) = &current {
                    room.lock().await.chat(id, message);
                }
            }
            ClientMsg::Leave => {
                if let Some((old_code, _)) = current.take() {
                    registry.leave(&old_code, id).await;
                }
            }
        }
    }

    if let Some((code, _)) = current {
        registry.leave(&code, id).await;
    }
    info!(player = %id, "Client disconnected");
    Ok(())
}

/// Helper for tests: bind to an ephemeral port.
pub async fn bind_ephemeral(mut cfg: GameConfig) -> anyhow::Result<(Relay, GameConfig)> {
    cfg.listen_addr = "127.0.0.1:0".to_string();
    let relay = Relay::bind(cfg.clone()).await?;
    cfg.listen_addr = relay.local_addr()?.to_string();
    Ok((relay, cfg))
}
