//! Wire protocol.
//!
//! One TCP relay endpoint carries every event as a length-prefixed JSON
//! frame. Inbound and outbound traffic are separate typed enums so each side
//! can match exhaustively; adding a variant is a compile error everywhere it
//! matters.
//!
//! Trust model: the relay accepts each client's self-reported transform
//! without validation and arbitrates only shared facts (health, kills,
//! deaths, fan-out). That boundary is deliberate and documented; do not
//! bolt server-side movement checks onto it without a design pass.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time,
};

use crate::animal::{Animal, AnimalMovement};
use crate::dungeon::DungeonGraph;
use crate::player::Player;
use crate::terrain::HeightField;

/// Protocol version for compatibility checks.
pub const PROTOCOL_VERSION: u32 = 1;

/// Frames larger than this are treated as a corrupt stream.
const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

static NEXT_PLAYER_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies a connected player within the relay process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    pub fn new_unique() -> Self {
        PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-reported transform. Applied verbatim to the sender's record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveUpdate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Yaw in radians.
    pub rotation: f32,
    /// Pitch in radians.
    pub rx: f32,
}

/// Events a client sends to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ClientMsg {
    /// Transport handshake; must be the first frame on a connection.
    Hello { protocol: u32 },
    /// Enter a room by code, abandoning any previous room. The relay assigns
    /// a fallback display name when none is given.
    Join {
        code: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// Per-frame transform report; fire-and-forget.
    Move(MoveUpdate),
    /// Visual-only shot notification.
    Shoot,
    /// Client-side hit claim against another player.
    Hit { target: PlayerId },
    Chat { message: String },
    /// Explicit leave; connection loss implies the same.
    Leave,
}

/// Events the relay sends to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ServerMsg {
    // ─── Connection ───
    Welcome { id: PlayerId },

    // ─── Join snapshot (to the joining connection only) ───
    CurrentPlayers(HashMap<PlayerId, Player>),
    LevelConfig(WorldPayload),
    TreeConfig(Vec<Tree>),
    CurrentAnimals(BTreeMap<u32, Animal>),

    // ─── Room broadcasts ───
    PlayerJoined(Player),
    PlayerMoved(Player),
    PlayerShot { id: PlayerId },
    PlayerDamaged { id: PlayerId, health: i32 },
    PlayerRespawn(Player),
    Scoreboard(Vec<Player>),
    Chat(ChatLine),
    PlayerLeft { id: PlayerId },
    AnimalMoved(AnimalMovement),
}

/// Static tree placement; doubles as a circular obstacle for the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// World data shipped to a joining client, one shape per game mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorldPayload {
    Terrain(TerrainPayload),
    Dungeon(DungeonGraph),
}

/// Raw height grid in the shape clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainPayload {
    pub size: usize,
    pub world_size: f32,
    pub height_map: Vec<Vec<f32>>,
}

impl From<&HeightField> for TerrainPayload {
    fn from(field: &HeightField) -> Self {
        Self {
            size: field.grid_size(),
            world_size: field.world_size(),
            height_map: field.samples().clone(),
        }
    }
}

impl From<TerrainPayload> for HeightField {
    fn from(payload: TerrainPayload) -> Self {
        HeightField::from_samples(payload.height_map, payload.size, payload.world_size)
    }
}

/// A relayed chat line. `System` is reserved for relay-authored text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    pub id: ChatSender,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSender {
    Player(PlayerId),
    System,
}

impl std::fmt::Display for ChatSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatSender::Player(id) => write!(f, "{id}"),
            ChatSender::System => write!(f, "System"),
        }
    }
}

// On the wire a sender is either a numeric player id or the literal string
// "System"; any other string is rejected.
impl Serialize for ChatSender {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChatSender::Player(id) => id.serialize(serializer),
            ChatSender::System => serializer.serialize_str("System"),
        }
    }
}

impl<'de> Deserialize<'de> for ChatSender {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(u32),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Ok(ChatSender::Player(PlayerId(id))),
            Raw::Text(s) if s == "System" => Ok(ChatSender::System),
            Raw::Text(other) => Err(serde::de::Error::custom(format!(
                "unknown chat sender {other:?}"
            ))),
        }
    }
}

// ─── Framing ───

/// Reads length-prefixed JSON frames from a stream half.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub async fn recv<M: DeserializeOwned>(&mut self) -> anyhow::Result<M> {
        let mut len_buf = [0u8; 4];
        self.inner
            .read_exact(&mut len_buf)
            .await
            .context("read frame len")?;
        let len = u32::from_be_bytes(len_buf) as usize;
        anyhow::ensure!(len <= MAX_FRAME_LEN, "frame of {len} bytes exceeds limit");
        let mut payload = vec![0u8; len];
        self.inner
            .read_exact(&mut payload)
            .await
            .context("read frame payload")?;
        serde_json::from_slice(&payload).context("deserialize frame")
    }

    /// Receives one frame within the given timeout; `None` on timeout.
    pub async fn recv_timeout<M: DeserializeOwned>(
        &mut self,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<M>> {
        match time::timeout(timeout, self.recv()).await {
            Ok(res) => res.map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// Writes length-prefixed JSON frames to a stream half.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn send<M: Serialize>(&mut self, msg: &M) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(msg).context("serialize frame")?;
        let mut buf = BytesMut::with_capacity(4 + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(&payload);
        self.inner.write_all(&buf).await.context("write frame")?;
        Ok(())
    }
}

/// Client-side connection: one TCP stream split into framed halves.
#[derive(Debug)]
pub struct Connection {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
}

impl Connection {
    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();
        Self {
            reader: FrameReader::new(read),
            writer: FrameWriter::new(write),
        }
    }

    pub async fn send(&mut self, msg: &ClientMsg) -> anyhow::Result<()> {
        self.writer.send(msg).await
    }

    pub async fn recv(&mut self) -> anyhow::Result<ServerMsg> {
        self.reader.recv().await
    }

    pub async fn recv_timeout(
        &mut self,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Option<ServerMsg>> {
        self.reader.recv_timeout(timeout).await
    }
}

/// Convenience codec helpers.
pub fn encode_to_bytes<M: Serialize>(msg: &M) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(msg).context("serialize")
}

pub fn decode_from_bytes<M: DeserializeOwned>(b: &[u8]) -> anyhow::Result<M> {
    serde_json::from_slice(b).context("deserialize")
}
