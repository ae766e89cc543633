//! Appends the rows of one run to a history file.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;

use super::format::{CompressionType, FrameIndex, HistoryHeader, encode_frame};
use crate::compute::{Row, Rule, Word};

/// Which rows to keep and how to store them.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Requested compression; see [`CompressionType::applied`].
    pub compression: CompressionType,
    /// Keep every Nth row offered, starting with the first.
    pub frame_skip: u32,
    /// Stop keeping rows after this many (0 = unlimited).
    pub max_frames: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::None,
            frame_skip: 1,
            max_frames: 0,
        }
    }
}

/// Writer for `.ecah` files of `W`-bit rows.
///
/// ```ignore
/// let mut recorder = HistoryRecorder::<u64>::create("run.ecah", rule, 0, Default::default())?;
/// recorder.record(automaton.row())?;
/// for _ in 0..100 {
///     automaton.advance(rule, 1)?;
///     recorder.record(automaton.row())?;
/// }
/// recorder.finalize()?;
/// ```
pub struct HistoryRecorder<W: Word = u64> {
    writer: BufWriter<File>,
    header: HistoryHeader,
    index: Vec<FrameIndex>,
    config: RecorderConfig,
    /// Rows offered so far.
    offered: u64,
    /// End of the frame data written so far.
    position: u64,
    frame: Vec<u8>,
    _word: PhantomData<W>,
}

impl<W: Word> HistoryRecorder<W> {
    /// Create a history file at `path` whose frame 0 will be generation
    /// `first_generation`.
    ///
    /// The header records the compression that is actually applied, so a
    /// build without `lz4` writes uncompressed files even if LZ4 was asked
    /// for.
    pub fn create<P: AsRef<Path>>(
        path: P,
        rule: Rule,
        first_generation: u64,
        config: RecorderConfig,
    ) -> io::Result<Self> {
        let compression = config.compression.applied();
        if compression != config.compression {
            log::warn!(
                "{:?} compression unavailable in this build; writing uncompressed history",
                config.compression
            );
        }

        let header = HistoryHeader::new::<W>(rule, first_generation, compression);
        let mut writer = BufWriter::new(File::create(path)?);
        // Frame count is patched in by finalize.
        header.write_to(&mut writer)?;

        Ok(Self {
            writer,
            header,
            index: Vec::new(),
            config,
            offered: 0,
            position: HistoryHeader::SIZE as u64,
            frame: Vec::new(),
            _word: PhantomData,
        })
    }

    /// Offer a row. Returns whether it was written.
    pub fn record(&mut self, row: &Row<W>) -> io::Result<bool> {
        let skip = u64::from(self.config.frame_skip.max(1));
        let due = self.offered % skip == 0;
        self.offered += 1;
        let full = self.config.max_frames > 0 && self.frames_written() >= self.config.max_frames;
        if !due || full {
            return Ok(false);
        }

        encode_frame(row, &mut self.frame);
        let stored = match self.header.compression {
            CompressionType::None => None,
            compression => Some(compression.pack(&self.frame)),
        };
        let bytes = stored.as_deref().unwrap_or(&self.frame);
        self.writer.write_all(bytes)?;

        let size = bytes.len() as u64;
        self.index.push(FrameIndex {
            offset: self.position,
            size,
        });
        self.position += size;
        Ok(true)
    }

    /// Append the index table and patch the header's frame count.
    pub fn finalize(mut self) -> io::Result<HistoryStats> {
        for entry in &self.index {
            entry.write_to(&mut self.writer)?;
        }
        self.header.frame_count = self.frames_written();
        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut self.writer)?;
        self.writer.flush()?;

        let frame_bytes = self.position - HistoryHeader::SIZE as u64;
        let stats = HistoryStats {
            frame_count: self.header.frame_count,
            total_bytes: self.position + self.header.frame_count * FrameIndex::SIZE as u64,
            average_frame_size: frame_bytes.checked_div(self.header.frame_count).unwrap_or(0),
            compression: self.header.compression,
        };
        log::debug!("History finalized: {}", stats);
        Ok(stats)
    }

    pub fn frames_written(&self) -> u64 {
        self.index.len() as u64
    }

    /// Compression written to the header.
    pub fn compression(&self) -> CompressionType {
        self.header.compression
    }
}

/// Summary of a finished recording.
#[derive(Debug, Clone)]
pub struct HistoryStats {
    pub frame_count: u64,
    /// File size including header and index.
    pub total_bytes: u64,
    /// Mean stored size of a frame.
    pub average_frame_size: u64,
    pub compression: CompressionType,
}

impl fmt::Display for HistoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames in {} bytes ({} bytes/frame, {:?} compression)",
            self.frame_count, self.total_bytes, self.average_frame_size, self.compression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::rules;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_recorder_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ecah");

        let row: Row<u64> = Row::single_cell();
        let mut recorder =
            HistoryRecorder::create(&path, rules::RULE_30, 0, RecorderConfig::default()).unwrap();

        for _ in 0..10 {
            assert!(recorder.record(&row).unwrap());
        }
        assert_eq!(recorder.frames_written(), 10);

        let stats = recorder.finalize().unwrap();
        assert_eq!(stats.frame_count, 10);
        // 8-byte length plus one word per frame
        assert_eq!(stats.average_frame_size, 16);

        let len = fs::metadata(&path).unwrap().len();
        assert_eq!(stats.total_bytes, len);
        assert_eq!(
            len,
            (HistoryHeader::SIZE + 10 * 16 + 10 * FrameIndex::SIZE) as u64
        );
    }

    #[test]
    fn test_recorder_frame_skip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.ecah");

        let row: Row<u8> = "101".parse().unwrap();
        let config = RecorderConfig {
            frame_skip: 5,
            ..Default::default()
        };
        let mut recorder = HistoryRecorder::create(&path, rules::RULE_90, 0, config).unwrap();

        // Rows 0, 5, 10, 15 of 20
        let written: Vec<bool> = (0..20).map(|_| recorder.record(&row).unwrap()).collect();
        assert!(written[0] && written[5] && written[10] && written[15]);
        assert!(!written[1] && !written[19]);

        let stats = recorder.finalize().unwrap();
        assert_eq!(stats.frame_count, 4);
    }

    #[test]
    fn test_recorder_max_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("max.ecah");

        let row: Row<u32> = Row::single_cell();
        let config = RecorderConfig {
            max_frames: 5,
            ..Default::default()
        };
        let mut recorder = HistoryRecorder::create(&path, rules::RULE_110, 0, config).unwrap();

        for _ in 0..100 {
            recorder.record(&row).unwrap();
        }

        let stats = recorder.finalize().unwrap();
        assert_eq!(stats.frame_count, 5);
    }

    #[test]
    fn test_recorder_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.ecah");

        let recorder =
            HistoryRecorder::<u16>::create(&path, rules::RULE_30, 3, RecorderConfig::default())
                .unwrap();
        let stats = recorder.finalize().unwrap();
        assert_eq!(stats.frame_count, 0);
        assert_eq!(stats.average_frame_size, 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), HistoryHeader::SIZE as u64);
    }

    #[test]
    fn test_header_flag_matches_frame_encoding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lz4.ecah");

        let row: Row<u64> = Row::from_bits(std::iter::repeat_n(false, 4096));
        let config = RecorderConfig {
            compression: CompressionType::Lz4,
            ..Default::default()
        };
        let mut recorder = HistoryRecorder::create(&path, rules::RULE_30, 0, config).unwrap();
        assert_eq!(recorder.compression(), CompressionType::Lz4.applied());
        recorder.record(&row).unwrap();
        let stats = recorder.finalize().unwrap();

        let bytes = fs::read(&path).unwrap();
        let mut header_bytes = [0u8; HistoryHeader::SIZE];
        header_bytes.copy_from_slice(&bytes[..HistoryHeader::SIZE]);
        let header = HistoryHeader::from_bytes(&header_bytes).unwrap();
        assert_eq!(header.compression, stats.compression);

        let mut raw = Vec::new();
        encode_frame(&row, &mut raw);
        let frame = &bytes[HistoryHeader::SIZE..bytes.len() - FrameIndex::SIZE];
        match header.compression {
            // An uncompressed frame starts with its cell count.
            CompressionType::None => assert_eq!(frame, &raw[..]),
            CompressionType::Lz4 => {
                assert!(frame.len() < raw.len());
                assert_eq!(header.compression.unpack(frame.to_vec()).unwrap(), raw);
            }
        }
    }
}
