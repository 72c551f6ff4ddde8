//! The trace map: per-frame fold counters backing the sparse-frame model
//!
//! Mapped datasets keep an `int32[total_frames]` array in a file named
//! `TraceMap` under the primary directory. One volume's worth of entries is
//! cached in memory; touching a frame of another volume evicts the cached
//! slice. Unmapped datasets answer every fold query with the frame size.

use crate::error::{JsError, Result};
use crate::io;
use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the on-disk fold array
pub const TRACE_MAP_FILE: &str = "TraceMap";

#[derive(Debug)]
struct MapCache {
    /// 0-based index of the cached volume, if any
    volume: Option<u64>,
    folds: Vec<i32>,
    loads: u64,
}

/// Fold counters for every frame of a dataset
#[derive(Debug)]
pub struct TraceMap {
    path: PathBuf,
    mapped: bool,
    frames_per_volume: u64,
    total_frames: u64,
    traces_per_frame: i32,
    cache: Mutex<MapCache>,
}

impl TraceMap {
    /// Attach to the map of an existing dataset. No volume is loaded until
    /// the first fold query.
    pub fn open(
        primary: &Path,
        mapped: bool,
        frames_per_volume: u64,
        total_frames: u64,
        traces_per_frame: usize,
    ) -> Self {
        Self {
            path: primary.join(TRACE_MAP_FILE),
            mapped,
            frames_per_volume,
            total_frames,
            traces_per_frame: traces_per_frame as i32,
            cache: Mutex::new(MapCache {
                volume: None,
                folds: Vec::new(),
                loads: 0,
            }),
        }
    }

    /// Create the map of a new dataset as an all-zero array.
    pub fn create(
        primary: &Path,
        mapped: bool,
        frames_per_volume: u64,
        total_frames: u64,
        traces_per_frame: usize,
    ) -> Result<Self> {
        let map = Self::open(primary, mapped, frames_per_volume, total_frames, traces_per_frame);
        if mapped {
            map.reset()?;
        }
        Ok(map)
    }

    /// Rewrite the on-disk array as zeros and drop the cached volume.
    pub fn reset(&self) -> Result<()> {
        if !self.mapped {
            return Ok(());
        }
        let zeros = vec![0u8; self.total_frames as usize * 4];
        io::write_all(&self.path, &zeros)?;
        let mut cache = self.cache.lock();
        cache.volume = None;
        cache.folds.clear();
        Ok(())
    }

    /// Fold of a 1-based linear frame index. Unmapped datasets are presumed
    /// dense.
    pub fn fold(&self, frame: u64) -> Result<i32> {
        self.check_frame(frame)?;
        if !self.mapped {
            return Ok(self.traces_per_frame);
        }
        let volume = (frame - 1) / self.frames_per_volume;
        let position = ((frame - 1) % self.frames_per_volume) as usize;

        let mut cache = self.cache.lock();
        if cache.volume != Some(volume) {
            let mut bytes = vec![0u8; self.volume_len(volume) * 4];
            io::read_at(&self.path, volume * self.frames_per_volume * 4, &mut bytes)?;
            cache.folds.resize(bytes.len() / 4, 0);
            LittleEndian::read_i32_into(&bytes, &mut cache.folds);
            cache.volume = Some(volume);
            cache.loads += 1;
            debug!(volume, loads = cache.loads, "paged in trace map volume");
        }
        Ok(cache.folds[position])
    }

    /// Record the fold of a frame. Ignored for unmapped datasets.
    pub fn set_fold(&self, frame: u64, fold: i32) -> Result<()> {
        self.check_frame(frame)?;
        if !self.mapped {
            return Ok(());
        }
        let mut bytes = [0u8; 4];
        LittleEndian::write_i32(&mut bytes, fold);
        io::write_at(&self.path, (frame - 1) * 4, &bytes)?;

        let mut cache = self.cache.lock();
        let volume = (frame - 1) / self.frames_per_volume;
        if cache.volume == Some(volume) {
            let position = ((frame - 1) % self.frames_per_volume) as usize;
            cache.folds[position] = fold;
        }
        Ok(())
    }

    /// Number of volume page-ins performed so far.
    pub fn volume_loads(&self) -> u64 {
        self.cache.lock().loads
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// Entry count of a 0-based volume; the last volume may be shorter.
    fn volume_len(&self, volume: u64) -> usize {
        let start = volume * self.frames_per_volume;
        self.frames_per_volume.min(self.total_frames - start) as usize
    }

    fn check_frame(&self, frame: u64) -> Result<()> {
        if frame < 1 || frame > self.total_frames {
            return Err(JsError::Precondition(format!(
                "frame {} outside [1, {}]",
                frame, self.total_frames
            )));
        }
        Ok(())
    }
}
