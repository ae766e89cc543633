//! Generation history recording and playback.
//!
//! A history file stores successive rows of one automaton run so they can
//! be rendered or analysed later without recomputing them.
//!
//! # File Format
//!
//! The `.ecah` (Elementary CA History) format, all integers little-endian:
//!
//! ```text
//! Header (32 bytes):
//!   Magic: "ECAH" (4 bytes)
//!   Version: u16
//!   Compression: u16 (0 none, 1 LZ4)
//!   Word bits: u16
//!   Rule: u8
//!   Reserved: 1 byte
//!   Frame count: u64
//!   First generation: u64
//!   Reserved: 4 bytes
//!
//! Frame data (variable):
//!   Length: u64
//!   ceil(length / word bits) words, word bits / 8 bytes each
//!   LZ4 compressed as a whole when the header says so; the header only
//!   says so when the writing build has the `lz4` feature
//!
//! Frame index table at end of file (frame_count * 16 bytes):
//!   Offset: u64
//!   Stored size: u64
//! ```

mod format;
mod player;
mod recorder;

pub use format::{CompressionType, FrameIndex, HISTORY_MAGIC, HISTORY_VERSION, HistoryHeader};
pub use player::{FrameIterator, HistoryPlayer};
pub use recorder::{HistoryRecorder, HistoryStats, RecorderConfig};
