//! Fixed-length text form of a [`Subset`].
//!
//! A record is the universe size right-aligned in a 10-character field,
//! followed by one flag byte per index of the universe: `T` for a member, `F`
//! otherwise. Because every record of a given universe has the same length,
//! single flags can be patched in place with [`add_to_subset_in_stream`] and
//! [`remove_from_subset_in_stream`].

use std::{
    fmt::{self, Write as _},
    io::{Read, Seek, SeekFrom, Write},
    str::FromStr,
};

use log::{debug, trace};

use crate::{
    error::{Error, Result},
    subset::Subset,
};

const SET_SIZE_WIDTH: usize = 10;
/// Exclusive bound on the universe size, so that the size always fits the
/// fixed-width header.
pub(crate) const MAX_SET_SIZE: u64 = 10u64.pow(SET_SIZE_WIDTH as u32);
const IN_SET: u8 = b'T';
const NOT_IN_SET: u8 = b'F';

impl Subset {
    /// Exact number of bytes a record for a universe of `original_set_size`
    /// occupies.
    #[inline]
    pub const fn data_stream_length(original_set_size: usize) -> usize {
        SET_SIZE_WIDTH + original_set_size
    }

    #[inline]
    pub fn stream_len(&self) -> usize {
        Subset::data_stream_length(self.original_set_size())
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let record = self.to_string();
        debug_assert_eq!(record.len(), self.stream_len());
        writer.write_all(record.as_bytes())?;
        debug!(
            "wrote subset record: {} of {} indices",
            self.len(),
            self.original_set_size()
        );
        Ok(())
    }

    /// Reads exactly one record; anything after it is left unread.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Subset> {
        let mut header = [0u8; SET_SIZE_WIDTH];
        reader.read_exact(&mut header)?;
        let size = parse_header(&header)?;
        if size == 0 {
            return Err(Error::EmptyUniverse);
        }

        // 不按 size 预分配，损坏的头部不应导致巨大的分配
        let mut flags = Vec::new();
        reader.take(size as u64).read_to_end(&mut flags)?;
        if flags.len() < size {
            return Err(Error::TruncatedStream {
                expected: size,
                found: flags.len(),
            });
        }

        let mut indices = Vec::new();
        for (offset, &flag) in flags.iter().enumerate() {
            match flag {
                IN_SET => indices.push(offset + 1),
                NOT_IN_SET => {}
                _ => {
                    return Err(Error::InvalidFlag {
                        index: offset + 1,
                        flag: char::from(flag),
                    });
                }
            }
        }
        let subset = Subset::from_sorted(size, indices);
        debug!("read subset record: {} of {size} indices", subset.len());
        Ok(subset)
    }
}

fn parse_header(header: &[u8; SET_SIZE_WIDTH]) -> Result<usize> {
    let malformed = || Error::MalformedHeader(String::from_utf8_lossy(header).into_owned());
    let text = std::str::from_utf8(header).map_err(|_| malformed())?;
    text.trim().parse().map_err(|_| malformed())
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>width$}",
            self.original_set_size(),
            width = SET_SIZE_WIDTH
        )?;
        let mut members = self.iter().peekable();
        for index in 1..=self.original_set_size() {
            let flag = if members.next_if_eq(&index).is_some() {
                IN_SET
            } else {
                NOT_IN_SET
            };
            f.write_char(char::from(flag))?;
        }
        Ok(())
    }
}

impl FromStr for Subset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Subset::read_from(s.as_bytes())
    }
}

/// Marks `index` as a member of the subset record that starts at the
/// stream's current position, without reading the rest of the record.
///
/// Afterwards the stream is positioned just past the patched flag.
pub fn add_to_subset_in_stream<S: Read + Write + Seek>(stream: &mut S, index: usize) -> Result<()> {
    patch_flag(stream, index, IN_SET)
}

/// Counterpart of [`add_to_subset_in_stream`].
pub fn remove_from_subset_in_stream<S: Read + Write + Seek>(
    stream: &mut S,
    index: usize,
) -> Result<()> {
    patch_flag(stream, index, NOT_IN_SET)
}

fn patch_flag<S: Read + Write + Seek>(stream: &mut S, index: usize, flag: u8) -> Result<()> {
    let start = stream.stream_position()?;
    let mut header = [0u8; SET_SIZE_WIDTH];
    stream.read_exact(&mut header)?;
    let size = parse_header(&header)?;
    if !(1..=size).contains(&index) {
        return Err(Error::IndexOutOfUniverse { index, size });
    }
    let offset = start + (SET_SIZE_WIDTH + index - 1) as u64;
    stream.seek(SeekFrom::Start(offset))?;
    stream.write_all(&[flag])?;
    trace!(
        "patched subset flag {} at byte {offset}",
        char::from(flag)
    );
    Ok(())
}
