//! Query packet codec
//!
//! Pure encode/decode of query datagrams; no I/O happens here.
//!
//! ## Wire Format
//!
//! ```text
//! request:  "SAMP" | ip[4] | port u16 LE | opcode
//! response: "SAMP" | ip[4] | port u16 LE | opcode | payload
//! ```
//!
//! Every decoder takes the whole response datagram, checks the echoed
//! header and then walks the payload with a bounds-checked reader. Any
//! structural violation is `Error::Malformed`. Trailing bytes are ignored.

mod reader;
pub mod rules;

pub use rules::{Parsed, ServerRules};

use byteorder::{ByteOrder, LittleEndian};
use reader::{PacketReader, encode_text};
use sampq_core::{Error, PlayerRecord, Result};
use std::net::SocketAddrV4;

/// Magic prefix of every query datagram
pub const MAGIC: &[u8; 4] = b"SAMP";

/// Length of the request and of the echoed response header
pub const HEADER_LEN: usize = 11;

/// Query packet types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Basic server information (`i`)
    Info,
    /// Server rules (`r`)
    Rules,
    /// Brief player list, name and score only (`c`)
    PlayersBrief,
    /// Detailed player list with id and ping (`d`)
    PlayersDetailed,
    /// open.mp extension probe (`o`)
    OpenMpProbe,
}

impl PacketKind {
    /// Opcode byte on the wire
    pub fn opcode(self) -> u8 {
        match self {
            PacketKind::Info => b'i',
            PacketKind::Rules => b'r',
            PacketKind::PlayersBrief => b'c',
            PacketKind::PlayersDetailed => b'd',
            PacketKind::OpenMpProbe => b'o',
        }
    }

    /// Packet kind for an opcode byte
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            b'i' => Some(PacketKind::Info),
            b'r' => Some(PacketKind::Rules),
            b'c' => Some(PacketKind::PlayersBrief),
            b'd' => Some(PacketKind::PlayersDetailed),
            b'o' => Some(PacketKind::OpenMpProbe),
            _ => None,
        }
    }
}

/// Decoded `info` reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub password: bool,
    pub players: u16,
    pub max_players: u16,
    pub hostname: String,
    pub game_mode: String,
    pub language: String,
}

/// Build the request datagram for `kind` addressed to `target`
pub fn encode_request(kind: PacketKind, target: SocketAddrV4) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_LEN);
    write_header(&mut packet, kind, target);
    packet
}

fn write_header(packet: &mut Vec<u8>, kind: PacketKind, target: SocketAddrV4) {
    packet.extend_from_slice(MAGIC);
    packet.extend_from_slice(&target.ip().octets());
    let mut port = [0u8; 2];
    LittleEndian::write_u16(&mut port, target.port());
    packet.extend_from_slice(&port);
    packet.push(kind.opcode());
}

/// Check the echoed header and return the payload
pub fn payload(kind: PacketKind, datagram: &[u8]) -> Result<&[u8]> {
    if datagram.len() < HEADER_LEN {
        return Err(Error::malformed(format!(
            "response shorter than header ({} bytes)",
            datagram.len()
        )));
    }
    if &datagram[..4] != MAGIC {
        return Err(Error::malformed("missing SAMP magic"));
    }
    let opcode = datagram[HEADER_LEN - 1];
    if opcode != kind.opcode() {
        return Err(Error::malformed(format!(
            "expected '{}' reply, got opcode 0x{:02x}",
            char::from(kind.opcode()),
            opcode
        )));
    }
    Ok(&datagram[HEADER_LEN..])
}

/// Decode an `info` reply
pub fn decode_info(datagram: &[u8]) -> Result<ServerInfo> {
    let mut reader = PacketReader::new(payload(PacketKind::Info, datagram)?);
    Ok(ServerInfo {
        password: reader.bool("password")?,
        players: reader.u16("players")?,
        max_players: reader.u16("max players")?,
        hostname: reader.string_i32("hostname")?,
        game_mode: reader.string_i32("game mode")?,
        language: reader.string_i32("language")?,
    })
}

/// Decode a `rules` reply into raw name/value pairs in wire order
pub fn decode_rule_pairs(datagram: &[u8]) -> Result<Vec<(String, String)>> {
    let mut reader = PacketReader::new(payload(PacketKind::Rules, datagram)?);
    let count = reader.count("rule")?;
    let mut pairs = Vec::with_capacity(count.min(reader.remaining() / 2));
    for _ in 0..count {
        let name = reader.string_u8("rule name")?;
        let value = reader.string_u8("rule value")?;
        pairs.push((name, value));
    }
    Ok(pairs)
}

/// Decode a `rules` reply into typed rules
pub fn decode_rules(datagram: &[u8]) -> Result<ServerRules> {
    let pairs = decode_rule_pairs(datagram)?;
    Ok(ServerRules::from_pairs(
        pairs.iter().map(|(name, value)| (name.as_str(), value.as_str())),
    ))
}

/// Decode a player list reply of either variant
///
/// The brief variant carries no id or ping; both are reported as 0.
pub fn decode_players(kind: PacketKind, datagram: &[u8]) -> Result<Vec<PlayerRecord>> {
    let detailed = match kind {
        PacketKind::PlayersDetailed => true,
        PacketKind::PlayersBrief => false,
        other => {
            return Err(Error::invalid_input(format!(
                "{other:?} is not a player list packet"
            )));
        }
    };

    let mut reader = PacketReader::new(payload(kind, datagram)?);
    let count = reader.count("player")?;
    let mut players = Vec::with_capacity(count.min(reader.remaining() / 5));
    for _ in 0..count {
        let player = if detailed {
            let id = reader.u8("player id")?;
            let name = reader.string_u8("player name")?;
            let score = reader.i32("player score")?;
            let ping = reader.i32("player ping")?;
            PlayerRecord::new(u16::from(id), name, score, ping)
        } else {
            let name = reader.string_u8("player name")?;
            let score = reader.i32("player score")?;
            PlayerRecord::brief(name, score)
        };
        players.push(player);
    }
    Ok(players)
}

/// Response encoders
///
/// Build server-side replies in the same format the decoders accept. Used by
/// local responders and test fixtures.
pub mod response {
    use super::*;

    fn header(kind: PacketKind, target: SocketAddrV4) -> Vec<u8> {
        let mut packet = Vec::with_capacity(64);
        write_header(&mut packet, kind, target);
        packet
    }

    fn push_i32(packet: &mut Vec<u8>, value: i32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_i32(&mut bytes, value);
        packet.extend_from_slice(&bytes);
    }

    fn push_count(packet: &mut Vec<u8>, count: usize) {
        let count = i16::try_from(count).unwrap_or(i16::MAX);
        let mut bytes = [0u8; 2];
        LittleEndian::write_i16(&mut bytes, count);
        packet.extend_from_slice(&bytes);
    }

    fn push_short_text(packet: &mut Vec<u8>, text: &str) {
        let mut bytes = encode_text(text);
        bytes.truncate(usize::from(u8::MAX));
        packet.push(bytes.len() as u8);
        packet.extend_from_slice(&bytes);
    }

    fn push_long_text(packet: &mut Vec<u8>, text: &str) {
        let bytes = encode_text(text);
        push_i32(packet, i32::try_from(bytes.len()).unwrap_or(i32::MAX));
        packet.extend_from_slice(&bytes);
    }

    /// Encode an `info` reply
    pub fn info(target: SocketAddrV4, info: &ServerInfo) -> Vec<u8> {
        let mut packet = header(PacketKind::Info, target);
        packet.push(u8::from(info.password));
        let mut counts = [0u8; 4];
        LittleEndian::write_u16(&mut counts[..2], info.players);
        LittleEndian::write_u16(&mut counts[2..], info.max_players);
        packet.extend_from_slice(&counts);
        push_long_text(&mut packet, &info.hostname);
        push_long_text(&mut packet, &info.game_mode);
        push_long_text(&mut packet, &info.language);
        packet
    }

    /// Encode a `rules` reply
    pub fn rules(target: SocketAddrV4, pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut packet = header(PacketKind::Rules, target);
        push_count(&mut packet, pairs.len());
        for (name, value) in pairs {
            push_short_text(&mut packet, name);
            push_short_text(&mut packet, value);
        }
        packet
    }

    /// Encode a player list reply; ids above 255 are truncated on the wire
    pub fn players(target: SocketAddrV4, kind: PacketKind, players: &[PlayerRecord]) -> Vec<u8> {
        let mut packet = header(kind, target);
        push_count(&mut packet, players.len());
        for player in players {
            if kind == PacketKind::PlayersDetailed {
                packet.push(player.id as u8);
            }
            push_short_text(&mut packet, &player.name);
            push_i32(&mut packet, player.score);
            if kind == PacketKind::PlayersDetailed {
                push_i32(&mut packet, player.ping);
            }
        }
        packet
    }

    /// Encode an empty acknowledgement (open.mp probe reply)
    pub fn ack(target: SocketAddrV4, kind: PacketKind) -> Vec<u8> {
        header(kind, target)
    }
}
