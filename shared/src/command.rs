//! Maps frame text to typed commands.

use crate::{
    ProtocolError, COMMAND_PREFIX, SENTINEL, TAG_DISCONNECT, TAG_LEN, TAG_PING,
    TAG_PLAYER_DATA, TAG_PLAYER_POSITION,
};

/// Fields carried by `SPDA` and `SPPO` frames.
pub const UPDATE_FIELD_COUNT: usize = 3;

/// A frame split into its tag and non-empty field lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrame<'a> {
    /// `None` when the text holds no `CMD_` prefix.
    pub tag: Option<&'a str>,
    pub fields: Vec<&'a str>,
}

impl<'a> ParsedFrame<'a> {
    /// Locates the first `CMD_` prefix and takes the four characters after it
    /// as the tag. The rest of the tag line is ignored; every following
    /// non-empty line up to the sentinel is a field.
    pub fn parse(text: &'a str) -> Self {
        let Some(start) = text.find(COMMAND_PREFIX) else {
            return Self {
                tag: None,
                fields: Vec::new(),
            };
        };

        let rest = &text[start + COMMAND_PREFIX.len()..];
        let rest = rest.split(SENTINEL).next().unwrap_or_default();

        // A tag cut short by the sentinel or a line break is still a tag, just
        // not one we know.
        let line_end = rest
            .find(|c: char| c == '\r' || c == '\n')
            .unwrap_or(rest.len());
        let tag_end = if line_end >= TAG_LEN && rest.is_char_boundary(TAG_LEN) {
            TAG_LEN
        } else {
            line_end
        };
        let tag = &rest[..tag_end];

        let fields = rest[tag_end..]
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .collect();

        Self {
            tag: Some(tag),
            fields,
        }
    }

    /// Reports frames that will be applied only partially, or not at all.
    pub fn check(&self) -> Result<(), ProtocolError> {
        let command = match self.tag {
            Some(TAG_PLAYER_DATA) => TAG_PLAYER_DATA,
            Some(TAG_PLAYER_POSITION) => TAG_PLAYER_POSITION,
            Some(TAG_PING) | Some(TAG_DISCONNECT) | None => return Ok(()),
            Some(other) => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };

        if self.fields.len() < UPDATE_FIELD_COUNT {
            return Err(ProtocolError::MalformedFrame {
                command,
                expected: UPDATE_FIELD_COUNT,
                found: self.fields.len(),
            });
        }
        Ok(())
    }

    fn text_field(&self, index: usize) -> Option<String> {
        self.fields.get(index).map(|field| field.to_string())
    }

    fn numeric_field(&self, index: usize) -> Option<f64> {
        self.fields
            .get(index)
            .and_then(|field| field.trim().parse().ok())
            .filter(|value: &f64| value.is_finite())
    }
}

/// Everything a client can ask of the server.
///
/// Absent fields of an update are `None` and leave the stored value as it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    Disconnect,
    SetPlayerData {
        name: Option<String>,
        color: Option<String>,
        team: Option<String>,
    },
    SetPlayerPosition {
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    },
    /// A well-formed tag the server does not handle.
    Unknown(String),
    /// No command prefix in the frame.
    None,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        Self::from(&ParsedFrame::parse(text))
    }
}

impl From<&ParsedFrame<'_>> for Command {
    fn from(frame: &ParsedFrame<'_>) -> Self {
        match frame.tag {
            None => Command::None,
            Some(TAG_PLAYER_DATA) => Command::SetPlayerData {
                name: frame.text_field(0),
                color: frame.text_field(1),
                team: frame.text_field(2),
            },
            Some(TAG_PLAYER_POSITION) => Command::SetPlayerPosition {
                x: frame.numeric_field(0),
                y: frame.numeric_field(1),
                z: frame.numeric_field(2),
            },
            Some(TAG_DISCONNECT) => Command::Disconnect,
            Some(TAG_PING) => Command::Ping,
            Some(other) => Command::Unknown(other.to_string()),
        }
    }
}
