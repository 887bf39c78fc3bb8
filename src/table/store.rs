//! Versioned binary persistence for hash tables.
//!
//! Explicit little-endian layout, independent of the in-memory
//! representation: magic, format version, record count, then the five
//! columns whole (codes, origins, rotations, scales, star indices). All
//! stored values are f32/u32, so a round trip reproduces every bit.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::quad::{CODE_DIM, QUAD_STARS};
use crate::table::HashTable;

const MAGIC: &[u8; 4] = b"ASTQ";
const VERSION: u32 = 1;

/// Failure to persist or restore a hash table.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid magic bytes (not a hash table file)")]
    BadMagic,
    #[error("unsupported hash table format version {0}")]
    UnsupportedVersion(u32),
    /// I/O failure, including truncated files.
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f32(w: &mut impl Write, v: f32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f32(r: &mut impl Read) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

impl HashTable {
    /// Write the table to `path`.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        w.write_all(MAGIC)?;
        write_u32(&mut w, VERSION)?;
        write_u64(&mut w, self.len() as u64)?;

        for code in self.codes() {
            for &v in code {
                write_f32(&mut w, v)?;
            }
        }
        for record in self.iter() {
            for &v in &record.origin {
                write_f32(&mut w, v)?;
            }
        }
        for record in self.iter() {
            write_f32(&mut w, record.rotation)?;
        }
        for record in self.iter() {
            write_f32(&mut w, record.scale)?;
        }
        for record in self.iter() {
            for &id in &record.stars {
                write_u32(&mut w, id)?;
            }
        }

        w.flush()?;
        Ok(())
    }

    /// Read a table back from `path`. Yields either a fully populated
    /// table or an error; a truncated file never produces a partial one.
    pub fn load(path: &Path) -> Result<HashTable, StoreError> {
        let file = File::open(path)?;
        let mut r = BufReader::new(file);

        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(StoreError::BadMagic);
        }
        let version = read_u32(&mut r)?;
        if version != VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }

        let len = read_u64(&mut r)? as usize;

        let mut codes = Vec::with_capacity(len);
        for _ in 0..len {
            let mut code = [0.0f32; CODE_DIM];
            for v in &mut code {
                *v = read_f32(&mut r)?;
            }
            codes.push(code);
        }

        let mut origins = Vec::with_capacity(len);
        for _ in 0..len {
            let mut origin = [0.0f32; 2];
            for v in &mut origin {
                *v = read_f32(&mut r)?;
            }
            origins.push(origin);
        }

        let mut rotations = Vec::with_capacity(len);
        for _ in 0..len {
            rotations.push(read_f32(&mut r)?);
        }

        let mut scales = Vec::with_capacity(len);
        for _ in 0..len {
            scales.push(read_f32(&mut r)?);
        }

        let mut stars = Vec::with_capacity(len);
        for _ in 0..len {
            let mut ids = [0u32; QUAD_STARS];
            for id in &mut ids {
                *id = read_u32(&mut r)?;
            }
            stars.push(ids);
        }

        Ok(HashTable {
            codes,
            origins,
            rotations,
            scales,
            stars,
        })
    }
}
