//! Random access to the frames of a history file.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::Path;

use super::format::{FrameIndex, HistoryHeader, decode_frame};
use crate::compute::{Row, Rule, Word};

/// Reader for `.ecah` files.
///
/// ```ignore
/// let mut player = HistoryPlayer::open("run.ecah")?;
/// println!("{} frames of {}", player.frame_count(), player.rule());
///
/// let row = player.read_frame::<u64>(10)?;
///
/// for row in player.frames::<u64>() {
///     println!("{}", row?);
/// }
/// ```
pub struct HistoryPlayer {
    reader: BufReader<File>,
    header: HistoryHeader,
    index: Vec<FrameIndex>,
}

impl HistoryPlayer {
    /// Open a history file, loading its index table.
    ///
    /// Every indexed frame must lie between the header and the table.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = HistoryHeader::read_from(&mut reader)?;

        let file_len = reader.seek(SeekFrom::End(0))?;
        let table_start = header
            .frame_count
            .checked_mul(FrameIndex::SIZE as u64)
            .and_then(|table| file_len.checked_sub(table))
            .filter(|&start| start >= HistoryHeader::SIZE as u64)
            .ok_or_else(|| {
                corrupt(format!(
                    "File of {} bytes is too short for {} frames",
                    file_len, header.frame_count
                ))
            })?;

        reader.seek(SeekFrom::Start(table_start))?;
        let index = (0..header.frame_count)
            .map(|_| {
                let entry = FrameIndex::read_from(&mut reader)?;
                let in_bounds = entry.offset >= HistoryHeader::SIZE as u64
                    && entry.offset.saturating_add(entry.size) <= table_start;
                if in_bounds {
                    Ok(entry)
                } else {
                    Err(corrupt(format!("Frame at offset {} is out of bounds", entry.offset)))
                }
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            reader,
            header,
            index,
        })
    }

    pub fn header(&self) -> &HistoryHeader {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    /// Rule the recorded run applied.
    pub fn rule(&self) -> Rule {
        self.header.rule
    }

    /// Width of the stored words.
    pub fn word_bits(&self) -> u32 {
        self.header.word_bits
    }

    /// Generation number of frame 0.
    pub fn first_generation(&self) -> u64 {
        self.header.first_generation
    }

    /// Read frame `frame` as a row of `W`-bit words.
    ///
    /// `W` must be the width the file was recorded with.
    pub fn read_frame<W: Word>(&mut self, frame: u64) -> io::Result<Row<W>> {
        if W::BITS != self.header.word_bits {
            return Err(corrupt(format!(
                "History stores {}-bit words, requested {}-bit",
                self.header.word_bits,
                W::BITS
            )));
        }
        let entry = usize::try_from(frame)
            .ok()
            .and_then(|i| self.index.get(i).copied())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Frame {} out of range ({} frames)", frame, self.index.len()),
                )
            })?;

        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut stored = vec![0u8; entry.size as usize];
        self.reader.read_exact(&mut stored)?;
        decode_frame(&self.header.compression.unpack(stored)?)
    }

    /// Iterate over all frames in order.
    pub fn frames<W: Word>(&mut self) -> FrameIterator<'_, W> {
        FrameIterator {
            player: self,
            next: 0,
            _word: PhantomData,
        }
    }
}

fn corrupt(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Iterator returned by [`HistoryPlayer::frames`].
pub struct FrameIterator<'a, W: Word> {
    player: &'a mut HistoryPlayer,
    next: u64,
    _word: PhantomData<W>,
}

impl<W: Word> Iterator for FrameIterator<'_, W> {
    type Item = io::Result<Row<W>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.player.frame_count() {
            return None;
        }
        let frame = self.player.read_frame(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.player.frame_count() - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl<W: Word> ExactSizeIterator for FrameIterator<'_, W> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{Stepper, WordStepper, rules};
    use crate::history::{CompressionType, HistoryRecorder, RecorderConfig};
    use std::fs;
    use tempfile::tempdir;

    fn record_run<W: Word>(path: &Path, config: RecorderConfig, generations: u64) -> Vec<Row<W>> {
        let mut row: Row<W> = Row::single_cell();
        let mut rows = vec![row.clone()];
        let mut recorder = HistoryRecorder::create(path, rules::RULE_30, 0, config).unwrap();
        recorder.record(&row).unwrap();
        for _ in 0..generations {
            row = WordStepper.step(&row, rules::RULE_30);
            recorder.record(&row).unwrap();
            rows.push(row.clone());
        }
        recorder.finalize().unwrap();
        rows
    }

    #[test]
    fn test_player_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.ecah");

        let rows = record_run::<u8>(&path, RecorderConfig::default(), 4);

        let mut player = HistoryPlayer::open(&path).unwrap();
        assert_eq!(player.frame_count(), 5);
        assert_eq!(player.rule(), rules::RULE_30);
        assert_eq!(player.word_bits(), 8);
        assert_eq!(player.first_generation(), 0);

        let last = player.read_frame::<u8>(4).unwrap();
        assert_eq!(last.to_bit_string(), "110010001");
        assert_eq!(last, rows[4]);
    }

    #[test]
    fn test_player_iterator() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iter.ecah");

        let rows = record_run::<u64>(&path, RecorderConfig::default(), 40);

        let mut player = HistoryPlayer::open(&path).unwrap();
        let frames = player.frames::<u64>();
        assert_eq!(frames.len(), 41);
        let loaded: Vec<Row<u64>> = frames.collect::<io::Result<_>>().unwrap();
        assert_eq!(loaded, rows);
        assert_eq!(loaded[40].len(), 81);
    }

    #[test]
    fn test_player_frame_skip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.ecah");

        let config = RecorderConfig {
            frame_skip: 2,
            ..Default::default()
        };
        let rows = record_run::<u16>(&path, config, 4);

        let mut player = HistoryPlayer::open(&path).unwrap();
        assert_eq!(player.frame_count(), 3);
        assert_eq!(player.read_frame::<u16>(1).unwrap(), rows[2]);
        assert_eq!(player.read_frame::<u16>(2).unwrap(), rows[4]);
    }

    #[test]
    fn test_player_compressed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lz4.ecah");

        let config = RecorderConfig {
            compression: CompressionType::Lz4,
            ..Default::default()
        };
        let rows = record_run::<u32>(&path, config, 20);

        let mut player = HistoryPlayer::open(&path).unwrap();
        assert_eq!(player.header().compression, CompressionType::Lz4.applied());
        assert_eq!(player.read_frame::<u32>(20).unwrap(), rows[20]);
    }

    #[test]
    fn test_player_width_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("width.ecah");

        record_run::<u8>(&path, RecorderConfig::default(), 2);

        let mut player = HistoryPlayer::open(&path).unwrap();
        let err = player.read_frame::<u64>(0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_player_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("range.ecah");

        record_run::<u8>(&path, RecorderConfig::default(), 2);

        let mut player = HistoryPlayer::open(&path).unwrap();
        let err = player.read_frame::<u8>(3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_player_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncated.ecah");

        record_run::<u8>(&path, RecorderConfig::default(), 3);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..HistoryHeader::SIZE + 4]).unwrap();

        let err = HistoryPlayer::open(&path).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
