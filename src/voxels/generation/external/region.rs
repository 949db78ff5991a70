//! Foreign region files.
//!
//! A region file groups a `span x span` grid of chunks (32 x 32 in practice):
//!
//! - Location table: one 4-byte entry per chunk, index `z * span + x`. The
//!   first three bytes are the big-endian sector offset, the last byte the
//!   sector count. A zero entry means the chunk was never written.
//! - Timestamp table: same size, ignored on read.
//! - Sectors of 4 KiB. A chunk starts with a big-endian `u32` length (counting
//!   the compression byte), one compression byte (1 gzip, 2 zlib,
//!   3 uncompressed) and the compressed payload.
//!
//! A decompressed chunk payload is a big-endian `i32` minimum y, a big-endian
//! `u16` height, then `height * chunk_span * chunk_span` big-endian `i16` block
//! ids ordered y, then z, then x.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{WorldError, WorldResult};
use crate::voxels::block::BlockId;
use crate::voxels::coords::{ChunkInRegionCoordinate, RegionCoordinate};

/// Size of one sector in bytes.
pub const SECTOR_SIZE: usize = 4096;

const CHUNK_HEADER_SIZE: usize = 5;
const PAYLOAD_HEADER_SIZE: usize = 6;

/// Sectors taken by one header table for a region of `span x span` chunks.
fn table_sectors(span: i32) -> usize {
    (span as usize * span as usize * 4).div_ceil(SECTOR_SIZE)
}

/// Cells in a chunk of `height` layers of `span x span` columns. `None` for a
/// negative extent or one that overflows `usize`.
fn cell_count(height: i32, span: i32) -> Option<usize> {
    let height = usize::try_from(height).ok()?;
    let span = usize::try_from(span).ok()?;
    height.checked_mul(span)?.checked_mul(span)
}

/// Largest decompressed payload a chunk of `span x span` columns can have.
fn max_payload_size(span: i32) -> u64 {
    cell_count(u16::MAX as i32, span)
        .and_then(|cells| cells.checked_mul(2))
        .and_then(|bytes| bytes.checked_add(PAYLOAD_HEADER_SIZE))
        .map_or(u64::MAX, |bytes| bytes as u64)
}

/// Compression applied to a stored chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkCompression {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

impl ChunkCompression {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(ChunkCompression::Gzip),
            2 => Some(ChunkCompression::Zlib),
            3 => Some(ChunkCompression::Uncompressed),
            _ => None,
        }
    }
}

/// One decoded foreign chunk: a column of block ids spanning `height` layers
/// starting at `min_y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedChunk {
    min_y: i32,
    height: i32,
    chunk_span: i32,
    blocks: Vec<i16>,
}

impl DecodedChunk {
    /// Wraps a y, z, x ordered id array. `None` when the array length
    /// disagrees with the extent.
    pub fn new(min_y: i32, height: i32, chunk_span: i32, blocks: Vec<i16>) -> Option<Self> {
        let expected = cell_count(height.max(0), chunk_span)?;
        (blocks.len() == expected).then_some(DecodedChunk {
            min_y,
            height: height.max(0),
            chunk_span,
            blocks,
        })
    }

    /// A chunk of one id everywhere. An extent too large to address is empty.
    pub fn filled(min_y: i32, height: i32, chunk_span: i32, id: i16) -> Self {
        let height = height.max(0);
        let (height, cells) = match cell_count(height, chunk_span) {
            Some(cells) => (height, cells),
            None => (0, 0),
        };
        DecodedChunk {
            min_y,
            height,
            chunk_span,
            blocks: vec![id; cells],
        }
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn offset(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let layer = y - self.min_y;
        let inside = (0..self.height).contains(&layer)
            && (0..self.chunk_span).contains(&x)
            && (0..self.chunk_span).contains(&z);
        let span = self.chunk_span as usize;
        inside.then(|| (layer as usize * span + z as usize) * span + x as usize)
    }

    /// Block id at chunk-local `(x, z)` and absolute source height `y`.
    /// `None` outside the stored column.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        self.offset(x, y, z).map(|i| BlockId::from(self.blocks[i]))
    }

    /// Overwrites one cell. Out of range writes are ignored.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: i16) {
        if let Some(i) = self.offset(x, y, z) {
            self.blocks[i] = id;
        }
    }

    fn encode_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PAYLOAD_HEADER_SIZE + self.blocks.len() * 2);
        out.extend_from_slice(&self.min_y.to_be_bytes());
        out.extend_from_slice(&(self.height as u16).to_be_bytes());
        for id in &self.blocks {
            out.extend_from_slice(&id.to_be_bytes());
        }
        out
    }

    fn decode_payload(bytes: &[u8], chunk_span: i32) -> Option<Self> {
        if bytes.len() < PAYLOAD_HEADER_SIZE {
            return None;
        }
        let min_y = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let height = u16::from_be_bytes([bytes[4], bytes[5]]) as i32;
        let body = &bytes[PAYLOAD_HEADER_SIZE..];
        let expected = cell_count(height, chunk_span)?.checked_mul(2)?;
        if body.len() != expected {
            return None;
        }
        let blocks = body
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Some(DecodedChunk {
            min_y,
            height,
            chunk_span,
            blocks,
        })
    }
}

/// An opened region resource that can decode its chunks on request.
pub trait RegionSource {
    /// Decodes the chunk at a region-local coordinate. `None` when the chunk is
    /// missing or its data is corrupt.
    fn decode_chunk(&self, local: ChunkInRegionCoordinate) -> Option<DecodedChunk>;
}

/// Opens region resources by coordinate.
pub trait RegionOpener {
    /// # Errors
    /// `SourceUnavailable` when the resource cannot be read or parsed.
    fn open(&mut self, region: RegionCoordinate) -> WorldResult<Box<dyn RegionSource>>;
}

#[derive(Debug, Clone, Copy)]
struct Location {
    offset: usize,
    sectors: usize,
}

/// A parsed region file. The header is validated up front; chunks are
/// decompressed only when asked for.
pub struct RegionFile {
    coordinate: RegionCoordinate,
    span: i32,
    chunk_span: i32,
    data: Vec<u8>,
    locations: Vec<Option<Location>>,
}

impl RegionFile {
    /// Parses a region file held in memory.
    ///
    /// # Errors
    /// `SourceUnavailable` when the data is shorter than the header tables.
    pub fn from_bytes(
        data: Vec<u8>,
        coordinate: RegionCoordinate,
        span: i32,
        chunk_span: i32,
    ) -> WorldResult<Self> {
        let header_sectors = 2 * table_sectors(span);
        if data.len() < header_sectors * SECTOR_SIZE {
            return Err(WorldError::SourceUnavailable {
                region: coordinate,
                reason: format!(
                    "file is {} bytes, header needs {}",
                    data.len(),
                    header_sectors * SECTOR_SIZE
                ),
            });
        }

        let entries = (span * span) as usize;
        let mut locations = Vec::with_capacity(entries);
        for i in 0..entries {
            let entry = &data[i * 4..i * 4 + 4];
            let offset = u32::from_be_bytes([0, entry[0], entry[1], entry[2]]) as usize;
            let sectors = entry[3] as usize;
            if offset == 0 && sectors == 0 {
                locations.push(None);
                continue;
            }
            let fits = offset >= header_sectors
                && sectors > 0
                && (offset + sectors) * SECTOR_SIZE <= data.len();
            if !fits {
                log::debug!(
                    "region ({}, {}): dropping location entry {i} (offset {offset}, {sectors} sectors)",
                    coordinate.x,
                    coordinate.z
                );
                locations.push(None);
                continue;
            }
            locations.push(Some(Location { offset, sectors }));
        }

        Ok(RegionFile {
            coordinate,
            span,
            chunk_span,
            data,
            locations,
        })
    }

    pub fn coordinate(&self) -> RegionCoordinate {
        self.coordinate
    }

    /// Number of chunks with a valid location entry.
    pub fn chunk_count(&self) -> usize {
        self.locations.iter().flatten().count()
    }

    fn unavailable(&self, reason: String) -> WorldError {
        WorldError::SourceUnavailable {
            region: self.coordinate,
            reason,
        }
    }

    /// Reads and decodes one chunk.
    ///
    /// # Errors
    /// `SourceUnavailable` when the stored chunk is truncated, uses an unknown
    /// compression, fails to decompress or holds a malformed payload.
    pub fn read_chunk(&self, local: ChunkInRegionCoordinate) -> WorldResult<Option<DecodedChunk>> {
        let Some(location) = self.locations.get(local.table_index(self.span)).copied().flatten()
        else {
            return Ok(None);
        };

        let start = location.offset * SECTOR_SIZE;
        let end = start + location.sectors * SECTOR_SIZE;
        let sector_data = &self.data[start..end];
        let length = u32::from_be_bytes([
            sector_data[0],
            sector_data[1],
            sector_data[2],
            sector_data[3],
        ]) as usize;
        if length <= 1 || 4 + length > sector_data.len() {
            return Err(self.unavailable(format!(
                "chunk ({}, {}) has bad length {length}",
                local.x(),
                local.z()
            )));
        }

        let compressed = &sector_data[CHUNK_HEADER_SIZE..4 + length];
        let compression = ChunkCompression::from_byte(sector_data[4]).ok_or_else(|| {
            self.unavailable(format!("unknown compression type {}", sector_data[4]))
        })?;

        // Decompression stops at the largest well-formed payload; anything
        // longer fails the length check below.
        let limit = max_payload_size(self.chunk_span);
        let mut payload = Vec::new();
        let read = match compression {
            ChunkCompression::Gzip => GzDecoder::new(compressed)
                .take(limit)
                .read_to_end(&mut payload),
            ChunkCompression::Zlib => ZlibDecoder::new(compressed)
                .take(limit)
                .read_to_end(&mut payload),
            ChunkCompression::Uncompressed => {
                payload.extend_from_slice(compressed);
                Ok(payload.len())
            }
        };
        read.map_err(|err| self.unavailable(format!("decompression failed: {err}")))?;

        DecodedChunk::decode_payload(&payload, self.chunk_span)
            .map(Some)
            .ok_or_else(|| {
                self.unavailable(format!(
                    "chunk ({}, {}) payload is malformed",
                    local.x(),
                    local.z()
                ))
            })
    }
}

impl RegionSource for RegionFile {
    fn decode_chunk(&self, local: ChunkInRegionCoordinate) -> Option<DecodedChunk> {
        match self.read_chunk(local) {
            Ok(chunk) => chunk,
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }
}

/// Writes region files in the layout [`RegionFile`] reads.
pub struct RegionFileBuilder {
    span: i32,
    chunks: BTreeMap<usize, (DecodedChunk, ChunkCompression)>,
}

impl RegionFileBuilder {
    pub fn new(span: i32) -> Self {
        RegionFileBuilder {
            span,
            chunks: BTreeMap::new(),
        }
    }

    /// Stores a chunk at a region-local coordinate, replacing any previous one.
    pub fn insert_chunk(
        &mut self,
        local: ChunkInRegionCoordinate,
        chunk: DecodedChunk,
        compression: ChunkCompression,
    ) -> &mut Self {
        self.chunks
            .insert(local.table_index(self.span), (chunk, compression));
        self
    }

    /// Serialises the region.
    pub fn build(&self) -> std::io::Result<Vec<u8>> {
        let header_sectors = 2 * table_sectors(self.span);
        let mut out = vec![0u8; header_sectors * SECTOR_SIZE];

        for (index, (chunk, compression)) in &self.chunks {
            let payload = chunk.encode_payload();
            let compressed = match compression {
                ChunkCompression::Gzip => {
                    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                    encoder.write_all(&payload)?;
                    encoder.finish()?
                }
                ChunkCompression::Zlib => {
                    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                    encoder.write_all(&payload)?;
                    encoder.finish()?
                }
                ChunkCompression::Uncompressed => payload,
            };

            let sector_offset = out.len() / SECTOR_SIZE;
            let stored = CHUNK_HEADER_SIZE + compressed.len();
            let sectors = stored.div_ceil(SECTOR_SIZE);
            if sectors > u8::MAX as usize {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("chunk {index} needs {sectors} sectors"),
                ));
            }

            out.extend_from_slice(&((compressed.len() + 1) as u32).to_be_bytes());
            out.push(*compression as u8);
            out.extend_from_slice(&compressed);
            out.resize((sector_offset + sectors) * SECTOR_SIZE, 0);

            let entry = ((sector_offset as u32) << 8) | sectors as u32;
            out[index * 4..index * 4 + 4].copy_from_slice(&entry.to_be_bytes());
        }

        Ok(out)
    }

    /// Serialises the region into `r.<x>.<z>.mca` under `dir`.
    pub fn write_to(&self, dir: &Path, region: RegionCoordinate) -> std::io::Result<PathBuf> {
        let path = RegionDirectory::region_path(dir, region);
        std::fs::write(&path, self.build()?)?;
        Ok(path)
    }
}

/// Opens region files from a directory of `r.<x>.<z>.mca` files.
pub struct RegionDirectory {
    root: PathBuf,
    span: i32,
    chunk_span: i32,
}

impl RegionDirectory {
    pub fn new(root: impl Into<PathBuf>, span: i32, chunk_span: i32) -> Self {
        RegionDirectory {
            root: root.into(),
            span,
            chunk_span,
        }
    }

    /// File name a region is stored under.
    pub fn region_path(root: &Path, region: RegionCoordinate) -> PathBuf {
        root.join(format!("r.{}.{}.mca", region.x, region.z))
    }
}

impl RegionOpener for RegionDirectory {
    fn open(&mut self, region: RegionCoordinate) -> WorldResult<Box<dyn RegionSource>> {
        let path = Self::region_path(&self.root, region);
        let data = std::fs::read(&path).map_err(|err| WorldError::SourceUnavailable {
            region,
            reason: format!("{}: {err}", path.display()),
        })?;
        log::debug!("opened {} ({} bytes)", path.display(), data.len());
        let file = RegionFile::from_bytes(data, region, self.span, self.chunk_span)?;
        Ok(Box::new(file))
    }
}
