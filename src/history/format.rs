//! On-disk layout of `.ecah` history files.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::compute::{Row, Rule, Word, words_for};

/// Magic bytes identifying a history file.
pub const HISTORY_MAGIC: &[u8; 4] = b"ECAH";

/// Current format version.
pub const HISTORY_VERSION: u16 = 1;

/// How frame payloads are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionType {
    /// Encoded rows as is.
    #[default]
    None,
    /// LZ4 block with a prepended size (needs the `lz4` feature).
    Lz4,
}

impl CompressionType {
    fn code(self) -> u16 {
        match self {
            CompressionType::None => 0,
            CompressionType::Lz4 => 1,
        }
    }

    fn from_code(code: u16) -> io::Result<Self> {
        match code & 0x0F {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Lz4),
            other => Err(invalid(format!("Unknown compression type {}", other))),
        }
    }

    /// Compression this build can actually write.
    pub fn applied(self) -> Self {
        if cfg!(feature = "lz4") {
            self
        } else {
            CompressionType::None
        }
    }

    pub(super) fn pack(self, raw: &[u8]) -> Vec<u8> {
        match self {
            CompressionType::None => raw.to_vec(),
            CompressionType::Lz4 => lz4::compress(raw),
        }
    }

    pub(super) fn unpack(self, stored: Vec<u8>) -> io::Result<Vec<u8>> {
        match self {
            CompressionType::None => Ok(stored),
            CompressionType::Lz4 => lz4::decompress(&stored),
        }
    }
}

#[cfg(feature = "lz4")]
mod lz4 {
    use std::io;

    pub fn compress(raw: &[u8]) -> Vec<u8> {
        lz4_flex::compress_prepend_size(raw)
    }

    pub fn decompress(stored: &[u8]) -> io::Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(stored).map_err(|e| super::invalid(e.to_string()))
    }
}

// Without the feature `applied` never selects Lz4 for writing, and LZ4
// frames written elsewhere cannot be read.
#[cfg(not(feature = "lz4"))]
mod lz4 {
    use std::io;

    pub fn compress(raw: &[u8]) -> Vec<u8> {
        raw.to_vec()
    }

    pub fn decompress(_stored: &[u8]) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "History frames are LZ4 compressed; rebuild with the `lz4` feature",
        ))
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Fixed-size file header.
///
/// ```text
/// 0  magic "ECAH"    4  version u16   6  compression u16
/// 8  word bits u16   10 rule u8       11 reserved
/// 12 frames u64      20 first generation u64   28 reserved (4)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryHeader {
    pub word_bits: u32,
    pub rule: Rule,
    pub frame_count: u64,
    /// Generation number of frame 0.
    pub first_generation: u64,
    pub compression: CompressionType,
}

impl HistoryHeader {
    pub const SIZE: usize = 32;

    pub fn new<W: Word>(rule: Rule, first_generation: u64, compression: CompressionType) -> Self {
        Self {
            word_bits: W::BITS,
            rule,
            frame_count: 0,
            first_generation,
            compression,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(HISTORY_MAGIC);
        bytes[4..6].copy_from_slice(&HISTORY_VERSION.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.compression.code().to_le_bytes());
        bytes[8..10].copy_from_slice(&(self.word_bits as u16).to_le_bytes());
        bytes[10] = self.rule.number();
        bytes[12..20].copy_from_slice(&self.frame_count.to_le_bytes());
        bytes[20..28].copy_from_slice(&self.first_generation.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> io::Result<Self> {
        if &bytes[0..4] != HISTORY_MAGIC {
            return Err(invalid("Invalid ECAH magic bytes"));
        }
        let version = le_u16(bytes, 4);
        if version != HISTORY_VERSION {
            return Err(invalid(format!("Unsupported ECAH version: {}", version)));
        }
        let word_bits = u32::from(le_u16(bytes, 8));
        if !matches!(word_bits, 8 | 16 | 32 | 64 | 128) {
            return Err(invalid(format!("Unsupported word width {}", word_bits)));
        }
        Ok(Self {
            word_bits,
            rule: Rule::new(bytes[10]),
            frame_count: le_u64(bytes, 12),
            first_generation: le_u64(bytes, 20),
            compression: CompressionType::from_code(le_u16(bytes, 6))?,
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; Self::SIZE];
        r.read_exact(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}

/// Location of one stored frame: `(offset u64, size u64)` in the trailing
/// index table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex {
    pub offset: u64,
    pub size: u64,
}

impl FrameIndex {
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..8].copy_from_slice(&self.offset.to_le_bytes());
        bytes[8..].copy_from_slice(&self.size.to_le_bytes());
        w.write_all(&bytes)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; Self::SIZE];
        r.read_exact(&mut bytes)?;
        Ok(Self {
            offset: le_u64(&bytes, 0),
            size: le_u64(&bytes, 8),
        })
    }
}

/// Encode a row as its length followed by its words.
pub fn encode_frame<W: Word>(row: &Row<W>, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(8 + row.word_count() * W::BYTES);
    out.extend_from_slice(&(row.len() as u64).to_le_bytes());
    for &word in row.words() {
        word.write_le(out);
    }
}

/// Decode a frame written by [`encode_frame`].
pub fn decode_frame<W: Word>(bytes: &[u8]) -> io::Result<Row<W>> {
    let (length_bytes, word_bytes) = bytes
        .split_first_chunk::<8>()
        .ok_or_else(|| invalid(format!("Frame of {} bytes has no length", bytes.len())))?;
    let length = usize::try_from(u64::from_le_bytes(*length_bytes))
        .map_err(|_| invalid("Frame length does not fit in memory"))?;

    let expected = words_for::<W>(length) * W::BYTES;
    if word_bytes.len() != expected {
        return Err(invalid(format!(
            "Frame size mismatch: {} bytes for {} cells (expected {})",
            word_bytes.len(),
            length,
            expected
        )));
    }

    let words = word_bytes.chunks_exact(W::BYTES).map(W::read_le).collect();
    Row::new(words, length).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::rules;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let mut header = HistoryHeader::new::<u64>(rules::RULE_110, 7, CompressionType::Lz4);
        header.frame_count = 1000;

        let bytes = header.to_bytes();
        assert_eq!(&bytes[..4], HISTORY_MAGIC);
        assert_eq!(&bytes[6..11], &[1, 0, 64, 0, 110]);
        assert_eq!(
            HistoryHeader::read_from(&mut Cursor::new(&bytes)).unwrap(),
            header
        );
    }

    #[test]
    fn test_header_rejects_bad_magic_and_width() {
        let mut bytes = HistoryHeader::new::<u8>(rules::RULE_30, 0, CompressionType::None).to_bytes();
        bytes[8] = 12;
        let err = HistoryHeader::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        bytes[..4].copy_from_slice(b"FLWA");
        assert!(HistoryHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_frame_layout() {
        let row: Row<u16> = "10000000000000011".parse().unwrap();
        let mut bytes = Vec::new();
        encode_frame(&row, &mut bytes);
        assert_eq!(
            bytes,
            vec![17, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x80, 0x00, 0x80]
        );
        assert_eq!(decode_frame::<u16>(&bytes).unwrap(), row);
    }

    #[test]
    fn test_frame_size_mismatch() {
        let row: Row<u8> = "101".parse().unwrap();
        let mut bytes = Vec::new();
        encode_frame(&row, &mut bytes);
        bytes.push(0);
        let err = decode_frame::<u8>(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(decode_frame::<u8>(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_applied_compression_matches_build() {
        assert_eq!(CompressionType::None.applied(), CompressionType::None);
        let expected = if cfg!(feature = "lz4") {
            CompressionType::Lz4
        } else {
            CompressionType::None
        };
        assert_eq!(CompressionType::Lz4.applied(), expected);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_pack_roundtrip() {
        let raw = vec![0u8; 4096];
        let packed = CompressionType::Lz4.pack(&raw);
        assert!(packed.len() < raw.len());
        assert_eq!(CompressionType::Lz4.unpack(packed).unwrap(), raw);
    }

    #[cfg(not(feature = "lz4"))]
    #[test]
    fn test_lz4_frames_unreadable_without_feature() {
        let err = CompressionType::Lz4.unpack(vec![1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
