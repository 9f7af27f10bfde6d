//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Block-level archive stream writer and reader

use crate::error::{PackError, PackResult};
use crate::file_handle::{ScopedFile, DEFAULT_READ_LEN};
use crate::header::{
    is_zero_block, padding_needed, parse_string, round_up_block, TarHeader, BLOCK_SIZE,
};
use std::io::Cursor;

/// Number of zero blocks written as the end-of-archive marker
pub const TRAILER_BLOCKS: usize = 12;

/// Long names beyond this are treated as a damaged record
const MAX_LONG_NAME: u64 = 64 * 1024;

/// Static zero buffer for padding and end-of-archive markers
static ZERO_BLOCK: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// Destination of archive bytes
pub trait ByteSink {
    fn write_bytes(&mut self, data: &[u8]) -> PackResult<()>;
}

/// Origin of archive bytes
pub trait ByteSource {
    /// Read up to `max_len` bytes; fewer only at end of stream
    fn read_bytes(&mut self, max_len: usize) -> PackResult<Vec<u8>>;

    fn at_end(&self) -> PackResult<bool>;
}

impl ByteSink for ScopedFile {
    fn write_bytes(&mut self, data: &[u8]) -> PackResult<()> {
        self.write(data)
    }
}

impl ByteSource for ScopedFile {
    fn read_bytes(&mut self, max_len: usize) -> PackResult<Vec<u8>> {
        self.read(max_len)
    }

    fn at_end(&self) -> PackResult<bool> {
        self.eof()
    }
}

impl ByteSink for Vec<u8> {
    fn write_bytes(&mut self, data: &[u8]) -> PackResult<()> {
        self.extend_from_slice(data);
        Ok(())
    }
}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
    fn read_bytes(&mut self, max_len: usize) -> PackResult<Vec<u8>> {
        let data = self.get_ref().as_ref();
        let start = std::cmp::min(self.position() as usize, data.len());
        let end = std::cmp::min(start.saturating_add(max_len), data.len());
        let out = data[start..end].to_vec();
        self.set_position(end as u64);
        Ok(out)
    }

    fn at_end(&self) -> PackResult<bool> {
        Ok(self.position() as usize >= self.get_ref().as_ref().len())
    }
}

/// Writes header and data blocks, padding every entry to 512 bytes
pub struct TarWriter<S: ByteSink> {
    sink: S,
    bytes_written: u64,
}

impl<S: ByteSink> TarWriter<S> {
    pub fn new(sink: S) -> Self {
        TarWriter {
            sink,
            bytes_written: 0,
        }
    }

    /// Write pre-encoded header blocks (see [`TarHeader::encode`])
    pub fn write_header(&mut self, encoded: &[u8]) -> PackResult<()> {
        self.sink.write_bytes(encoded)?;
        self.bytes_written = 0;
        Ok(())
    }

    /// Write data for the current entry
    pub fn write_data(&mut self, data: &[u8]) -> PackResult<()> {
        self.sink.write_bytes(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Finish writing data for the current entry (handles padding)
    pub fn finish_entry(&mut self) -> PackResult<()> {
        let padding = padding_needed(self.bytes_written);
        if padding > 0 {
            self.sink.write_bytes(&ZERO_BLOCK[..padding])?;
        }
        self.bytes_written = 0;
        Ok(())
    }

    /// Write the end-of-archive trailer
    pub fn finish(&mut self) -> PackResult<()> {
        for _ in 0..TRAILER_BLOCKS {
            self.sink.write_bytes(&ZERO_BLOCK)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

/// Reads header records and entry data from an archive stream
pub struct TarReader<S: ByteSource> {
    source: S,
}

impl<S: ByteSource> TarReader<S> {
    pub fn new(source: S) -> Self {
        TarReader { source }
    }

    pub fn is_eof(&self) -> PackResult<bool> {
        self.source.at_end()
    }

    /// Read the next entry header, resolving long-name records
    ///
    /// Returns `Ok(None)` at end of stream and for zero (trailer) blocks.
    /// A damaged record is reported as `CorruptRecord`; the stream is left
    /// positioned after it so the caller may keep reading.
    pub fn read_header(&mut self) -> PackResult<Option<TarHeader>> {
        let mut long_name: Option<String> = None;
        let mut long_link: Option<String> = None;

        loop {
            let block = self.source.read_bytes(BLOCK_SIZE)?;
            if block.len() < BLOCK_SIZE {
                if !block.is_empty() {
                    log::debug!("ignoring {} trailing bytes", block.len());
                }
                return Ok(None);
            }
            if is_zero_block(&block) {
                log::trace!("zero block");
                return Ok(None);
            }

            let mut header = TarHeader::decode(&block)?;

            if header.is_long_name() {
                long_name = Some(self.read_long_payload(&header)?);
                continue;
            }
            if header.is_long_link() {
                long_link = Some(self.read_long_payload(&header)?);
                continue;
            }

            if let Some(name) = long_name.take() {
                header.name = name;
            }
            if let Some(target) = long_link.take() {
                header.linkname = target;
            }
            return Ok(Some(header));
        }
    }

    /// Data block of an `L`/`K` record as a string
    fn read_long_payload(&mut self, header: &TarHeader) -> PackResult<String> {
        if header.size > MAX_LONG_NAME {
            return Err(PackError::CorruptRecord(format!(
                "long name of {} bytes",
                header.size
            )));
        }
        let payload = self.source.read_bytes(round_up_block(header.size) as usize)?;
        let len = std::cmp::min(header.size as usize, payload.len());
        Ok(parse_string(&payload[..len]))
    }

    /// Copy `size` bytes of entry data into `sink`, consuming the padding
    ///
    /// Returns the number of bytes copied, which is short only when the
    /// archive ends early.
    pub fn copy_data<W: ByteSink>(&mut self, size: u64, sink: &mut W) -> PackResult<u64> {
        let mut remaining = size;
        let mut to_consume = round_up_block(size);

        while to_consume > 0 {
            let want = std::cmp::min(to_consume, DEFAULT_READ_LEN as u64) as usize;
            let chunk = self.source.read_bytes(want)?;
            if chunk.is_empty() {
                break;
            }
            let take = std::cmp::min(remaining, chunk.len() as u64) as usize;
            if take > 0 {
                sink.write_bytes(&chunk[..take])?;
                remaining -= take as u64;
            }
            to_consume -= chunk.len() as u64;
            if chunk.len() < want {
                break;
            }
        }

        if remaining > 0 {
            log::warn!("archive truncated: {} of {} data bytes missing", remaining, size);
        }
        Ok(size - remaining)
    }

    /// Skip `size` bytes of entry data plus padding
    pub fn skip_data(&mut self, size: u64) -> PackResult<()> {
        let mut to_skip = round_up_block(size);
        while to_skip > 0 {
            let want = std::cmp::min(to_skip, DEFAULT_READ_LEN as u64) as usize;
            let chunk = self.source.read_bytes(want)?;
            to_skip -= chunk.len() as u64;
            if chunk.len() < want {
                break;
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}
