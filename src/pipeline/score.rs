//! Decoder for the Playtune bytestream
//!
//! Format (all values are single bytes unless noted):
//! ```text
//! [ 'P' 't' header_length flags1 flags2 generator_count ... ]   optional header
//! 0x00..=0x7F lo          wait (hi << 8 | lo) milliseconds
//! 0x9T note [velocity]    note on, generator T (velocity iff flags1 & 0x80)
//! 0x8T                    note off, generator T
//! 0xCT patch              instrument change, generator T
//! 0xE?                    restart from just past the header
//! 0xF?                    stop
//! 0xA? 0xB? 0xD?          reserved, ignored
//! ```
//! Notes >= 128 are percussion keys (note - 128).

/// Signature at the start of a score carrying a header
pub const HEADER_SIGNATURE: [u8; 2] = *b"Pt";
/// Bytes of header the decoder understands
pub const HEADER_SIZE: usize = 6;

/// Header flag: every note-on carries a velocity byte
pub const FLAG1_VELOCITY: u8 = 0x80;
/// Header flag: the score contains instrument changes
pub const FLAG1_INSTRUMENTS: u8 = 0x40;
/// Header flag: the score contains translated percussion notes
pub const FLAG1_PERCUSSION: u8 = 0x20;

/// Optional score header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreHeader {
    /// Total header length; decoding starts this many bytes into the score
    pub header_length: u8,
    pub flags1: u8,
    pub flags2: u8,
    /// Generators the score was written for, as stored (unclamped)
    pub generator_count: u8,
}

impl ScoreHeader {
    /// Read the header at the start of `score`
    ///
    /// Returns `None` unless the signature matches and all six bytes are
    /// present.
    pub fn parse(score: &[u8]) -> Option<Self> {
        match score {
            [b'P', b't', header_length, flags1, flags2, generator_count, ..] => Some(Self {
                header_length: *header_length,
                flags1: *flags1,
                flags2: *flags2,
                generator_count: *generator_count,
            }),
            _ => None,
        }
    }

    pub fn velocity_present(&self) -> bool {
        self.flags1 & FLAG1_VELOCITY != 0
    }

    pub fn instruments_present(&self) -> bool {
        self.flags1 & FLAG1_INSTRUMENTS != 0
    }

    pub fn percussion_present(&self) -> bool {
        self.flags1 & FLAG1_PERCUSSION != 0
    }
}

/// A decoded score command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Pause decoding for a number of milliseconds (0..=0x7FFF)
    Wait { millis: u16 },
    NoteOn { generator: u8, note: u8, velocity: u8 },
    NoteOff { generator: u8 },
    /// Patch number from the score, not yet mapped to an instrument
    SetInstrument { generator: u8, patch: u8 },
    Restart,
    Stop,
    /// 0xA?, 0xB? or 0xD? command byte
    Reserved { opcode: u8 },
}

/// Decoding errors
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// No bytes left where a command was expected
    EndOfScore { offset: usize },
    /// A command ran out of bytes before its arguments
    Truncated { offset: usize, opcode: u8 },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::EndOfScore { offset } => write!(f, "End of score at offset {}", offset),
            DecodeError::Truncated { offset, opcode } => write!(
                f,
                "Command 0x{:02X} at offset {} is missing its arguments",
                opcode, offset
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Cursor over a borrowed score
///
/// Never copies or mutates the score; every read is bounds-checked.
#[derive(Debug, Clone)]
pub struct ScoreReader<'a> {
    score: &'a [u8],
    header: Option<ScoreHeader>,
    /// Offset of the first command, where restart returns to
    start: usize,
    cursor: usize,
    velocity_present: bool,
}

impl<'a> ScoreReader<'a> {
    /// Create a reader positioned on the first command
    ///
    /// # Arguments
    /// * `score` - complete bytestream, header included if any
    /// * `assume_velocity` - whether note-ons carry a velocity byte when
    ///   the score has no header
    pub fn new(score: &'a [u8], assume_velocity: bool) -> Self {
        let header = ScoreHeader::parse(score);
        let (start, velocity_present) = match header {
            Some(header) => (
                (header.header_length as usize).min(score.len()),
                header.velocity_present(),
            ),
            None => (0, assume_velocity),
        };
        Self {
            score,
            header,
            start,
            cursor: start,
            velocity_present,
        }
    }

    pub fn header(&self) -> Option<&ScoreHeader> {
        self.header.as_ref()
    }

    pub fn velocity_present(&self) -> bool {
        self.velocity_present
    }

    /// Offset of the next byte to decode
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Offset restart returns to
    pub fn start_position(&self) -> usize {
        self.start
    }

    /// Move the cursor back to the first command
    pub fn rewind(&mut self) {
        self.cursor = self.start;
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.score.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(byte)
    }

    /// Read an argument byte of the command starting at `offset`
    fn argument(&mut self, offset: usize, opcode: u8) -> Result<u8, DecodeError> {
        self.next_byte()
            .ok_or(DecodeError::Truncated { offset, opcode })
    }

    /// Decode the next command
    ///
    /// On error the cursor is left past whatever bytes were consumed.
    pub fn next_event(&mut self) -> Result<Event, DecodeError> {
        let offset = self.cursor;
        let command = self
            .next_byte()
            .ok_or(DecodeError::EndOfScore { offset })?;

        if command < 0x80 {
            let low = self.argument(offset, command)?;
            return Ok(Event::Wait {
                millis: (command as u16) << 8 | low as u16,
            });
        }

        let generator = command & 0x0F;
        let event = match command & 0xF0 {
            0x90 => {
                let note = self.argument(offset, command)?;
                let velocity = if self.velocity_present {
                    self.argument(offset, command)?
                } else {
                    127
                };
                Event::NoteOn {
                    generator,
                    note,
                    velocity,
                }
            }
            0x80 => Event::NoteOff { generator },
            0xC0 => Event::SetInstrument {
                generator,
                patch: self.argument(offset, command)?,
            },
            0xE0 => Event::Restart,
            0xF0 => Event::Stop,
            _ => Event::Reserved { opcode: command },
        };
        Ok(event)
    }
}
