//! Wire protocol and player model shared by the relay server and its clients.
//!
//! Messages are plain ASCII text: a `CMD_<TAG>` line, one line per field and
//! the `<EOF>` sentinel. There is no length prefix, so [`codec::FrameDecoder`]
//! finds message boundaries by scanning for the sentinel.

pub mod codec;
pub mod command;
pub mod error;

pub use codec::{FrameDecoder, FrameReader};
pub use command::Command;
pub use error::ProtocolError;

/// Marker that terminates every frame.
pub const SENTINEL: &str = "<EOF>";
/// Prefix that precedes the 4-character command tag.
pub const COMMAND_PREFIX: &str = "CMD_";
/// Length of a command tag.
pub const TAG_LEN: usize = 4;
/// Bare reply to a ping. Not wrapped in a frame.
pub const PONG: &str = "PONG";
/// Value of every text field before the client sets it.
pub const UNASSIGNED: &str = "UNASSIGNED";
/// Largest frame the server accumulates before giving up on a connection.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

pub const TAG_PLAYER_DATA: &str = "SPDA";
pub const TAG_PLAYER_POSITION: &str = "SPPO";
pub const TAG_DISCONNECT: &str = "DISC";
pub const TAG_PING: &str = "PING";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Overwrites only the coordinates that are present.
    pub fn apply(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        if let Some(x) = x {
            self.x = x;
        }
        if let Some(y) = y {
            self.y = y;
        }
        if let Some(z) = z {
            self.z = z;
        }
    }
}

/// State relayed for one connected participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub team: String,
    pub position: Position,
}

impl Player {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: UNASSIGNED.to_string(),
            color: UNASSIGNED.to_string(),
            team: UNASSIGNED.to_string(),
            position: Position::default(),
        }
    }

    /// Frame announcing identity, name, color and team.
    pub fn data_frame(&self) -> String {
        codec::encode_frame(
            TAG_PLAYER_DATA,
            &[
                self.id.to_string(),
                self.name.clone(),
                self.color.clone(),
                self.team.clone(),
            ],
        )
    }

    /// Frame announcing identity and coordinates only.
    pub fn position_frame(&self) -> String {
        codec::encode_frame(
            TAG_PLAYER_POSITION,
            &[
                self.id.to_string(),
                self.position.x.to_string(),
                self.position.y.to_string(),
                self.position.z.to_string(),
            ],
        )
    }
}
