//! Extent layout and frame addressing
//!
//! Trace and header data form two independent logical byte streams, each
//! split across fixed-size extent files that may live under secondary
//! storage roots. This module computes the extent set, resolves extent
//! directories, and converts between N-D logical frame addresses and the
//! linear frame index the byte streams are laid out by.

use crate::error::{JsError, Result};
use crate::types::Axis;
use std::env;
use std::path::{Path, PathBuf};

/// Extent growth unit of the default count heuristic
const EXTENT_CHUNK_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Environment variables naming the data-home prefix used for secondary
/// path rewriting
pub const DATA_HOME_VARS: [&str; 2] = ["JAVASEIS_DATA_HOME", "PROMAX_DATA_HOME"];

/// One contiguous file carrying a slice of a dataset's trace or header stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    /// File name, e.g. `TraceFile3`
    pub name: String,
    /// Full path of the extent file
    pub path: PathBuf,
    /// Position of the extent in the stream
    pub index: usize,
    /// Byte offset of the extent's first byte in the logical stream
    pub start: u64,
    /// Byte capacity of the extent
    pub size: u64,
}

/// Default extent count: one extent per 2 GiB plus ten, clamped to
/// `[1, 256]` and never more than the number of frames.
pub fn default_extent_count(total_bytes: u64, total_frames: u64) -> usize {
    let chunks = total_bytes.div_ceil(EXTENT_CHUNK_BYTES);
    let n = (10 + chunks).clamp(1, 256);
    n.min(total_frames.max(1)) as usize
}

/// Plan the extent set for one stream of a new dataset.
///
/// Every extent but the last has capacity `ceil(frames / nextents)` frames;
/// the effective count shrinks when the ceiling division over-covers.
/// Extents are round-robined across the secondary roots in order.
pub fn plan_extents(
    base_name: &str,
    dataset: &Path,
    secondaries: &[String],
    nextents: usize,
    total_frames: u64,
    frame_bytes: u64,
) -> Result<Vec<Extent>> {
    if nextents == 0 || total_frames == 0 || frame_bytes == 0 {
        return Err(JsError::Precondition(
            "extent planning needs at least one extent, frame and byte".to_string(),
        ));
    }
    let frames_per_extent = total_frames.div_ceil(nextents as u64);
    let extent_size = frames_per_extent * frame_bytes;
    let total_bytes = total_frames * frame_bytes;
    build_extents(base_name, dataset, secondaries, extent_size, total_bytes)
}

/// Rebuild the extent set of an existing stream from its declared extent
/// size and total byte length.
pub fn extents_from_meta(
    base_name: &str,
    dataset: &Path,
    secondaries: &[String],
    extent_size: u64,
    max_file: usize,
    total_bytes: u64,
    frame_bytes: u64,
) -> Result<Vec<Extent>> {
    if extent_size == 0 || frame_bytes == 0 || extent_size % frame_bytes != 0 {
        return Err(JsError::Malformed(format!(
            "extent size {} is not a positive multiple of the frame record size {}",
            extent_size, frame_bytes
        )));
    }
    let count = total_bytes.div_ceil(extent_size) as usize;
    if count > max_file {
        return Err(JsError::Malformed(format!(
            "stream of {} bytes needs {} extents but only {} are declared",
            total_bytes, count, max_file
        )));
    }
    build_extents(base_name, dataset, secondaries, extent_size, total_bytes)
}

fn build_extents(
    base_name: &str,
    dataset: &Path,
    secondaries: &[String],
    extent_size: u64,
    total_bytes: u64,
) -> Result<Vec<Extent>> {
    if secondaries.is_empty() {
        return Err(JsError::Precondition(
            "at least one secondary storage root is required".to_string(),
        ));
    }
    let count = total_bytes.div_ceil(extent_size) as usize;
    let mut extents = Vec::with_capacity(count);
    for index in 0..count {
        let start = index as u64 * extent_size;
        let size = extent_size.min(total_bytes - start);
        let name = format!("{}{}", base_name, index);
        let secondary = &secondaries[index % secondaries.len()];
        let path = extent_dir(secondary, dataset)?.join(&name);
        extents.push(Extent {
            name,
            path,
            index,
            start,
            size,
        });
    }
    Ok(extents)
}

/// Resolve the directory holding a dataset's extents under one secondary
/// storage root.
///
/// `"."` keeps extents under the primary directory. Otherwise, when a
/// data-home environment variable prefixes the dataset path, that prefix is
/// rewritten to the secondary root; a data-home that does not cover the
/// dataset is a configuration error. Without a data-home the dataset path is
/// appended to the root, dropping any leading separator.
pub fn extent_dir(secondary: &str, dataset: &Path) -> Result<PathBuf> {
    if secondary == "." {
        return absolute(dataset);
    }
    let home = DATA_HOME_VARS
        .iter()
        .find_map(|var| env::var(var).ok().filter(|v| !v.is_empty()));
    match home {
        Some(home) => {
            let abs = absolute(dataset)?;
            match abs.strip_prefix(&home) {
                Ok(rest) => Ok(Path::new(secondary).join(rest)),
                Err(_) => Err(JsError::Environment(format!(
                    "data home {} does not contain dataset {}",
                    home,
                    abs.display()
                ))),
            }
        }
        None => {
            let rest = dataset
                .strip_prefix("/")
                .unwrap_or(dataset);
            Ok(Path::new(secondary).join(rest))
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Locate the extent holding a stream byte offset. Relies on every extent
/// but the last having the same size.
pub fn extent_for(extents: &[Extent], offset: u64) -> Result<&Extent> {
    let first = extents.first().ok_or_else(|| {
        JsError::Malformed("dataset declares no extents".to_string())
    })?;
    let index = (offset / first.size) as usize;
    extents.get(index).ok_or_else(|| {
        JsError::Malformed(format!(
            "offset {} lies beyond the {} declared extents",
            offset,
            extents.len()
        ))
    })
}

/// Total frame count across the frame, volume and hypercube axes.
pub fn total_frames(axes: &[Axis]) -> u64 {
    axes[2..].iter().map(|a| a.length as u64).product()
}

/// Linear 1-based frame index of an N-D logical address `(i3, i4, ...)`.
pub fn frame_index(axes: &[Axis], addr: &[i64]) -> Result<u64> {
    if addr.len() != axes.len() - 2 {
        return Err(JsError::Precondition(format!(
            "frame address needs {} coordinates, got {}",
            axes.len() - 2,
            addr.len()
        )));
    }
    let mut grids = Vec::with_capacity(addr.len());
    for (axis, &coord) in axes[2..].iter().zip(addr) {
        grids.push(axis.grid_index(coord)?);
    }
    Ok(frame_index_from_grid(axes, &grids))
}

/// Linear 1-based frame index from 1-based per-axis grid indices.
pub fn frame_index_from_grid(axes: &[Axis], grids: &[usize]) -> u64 {
    let mut index = 0u64;
    let mut stride = 1u64;
    for (axis, &grid) in axes[2..].iter().zip(grids) {
        index += (grid as u64 - 1) * stride;
        stride *= axis.length as u64;
    }
    index + 1
}

/// N-D logical address of a linear 1-based frame index (column-major
/// inverse of [`frame_index`]).
pub fn frame_address(axes: &[Axis], index: u64) -> Result<Vec<i64>> {
    let total = total_frames(axes);
    if index < 1 || index > total {
        return Err(JsError::Precondition(format!(
            "frame index {} outside [1, {}]",
            index, total
        )));
    }
    let mut rest = index - 1;
    let mut addr = Vec::with_capacity(axes.len() - 2);
    for axis in &axes[2..] {
        let grid = (rest % axis.length as u64) as usize + 1;
        rest /= axis.length as u64;
        addr.push(axis.logical_coord(grid));
    }
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Axis;

    fn test_axes() -> Vec<Axis> {
        let mut frame = Axis::new("FRAME", 10);
        frame.logical_origin = 3;
        frame.logical_delta = 2;
        vec![
            Axis::new("TIME", 128),
            Axis::new("TRACE", 64),
            frame,
            Axis::new("VOLUME", 4),
        ]
    }

    #[test]
    fn test_default_extent_count() {
        assert_eq!(default_extent_count(1024, 1_000_000), 11);
        assert_eq!(default_extent_count(5 * EXTENT_CHUNK_BYTES, 1_000_000), 15);
        // capped by frame count
        assert_eq!(default_extent_count(1024, 3), 3);
        // clamped to 256
        assert_eq!(default_extent_count(u64::MAX / 2, 1_000_000), 256);
    }

    #[test]
    fn test_plan_extents_coverage() {
        let secondaries = vec![".".to_string()];
        let extents = plan_extents(
            "TraceFile",
            Path::new("/data/survey.js"),
            &secondaries,
            4,
            10,
            100,
        )
        .unwrap();

        // ceil(10/4) = 3 frames per extent -> 4 extents of 300,300,300,100
        assert_eq!(extents.len(), 4);
        assert_eq!(extents[0].size, 300);
        assert_eq!(extents[3].size, 100);
        let total: u64 = extents.iter().map(|e| e.size).sum();
        assert_eq!(total, 1000);
        for (i, e) in extents.iter().enumerate() {
            assert_eq!(e.start, i as u64 * 300);
            assert_eq!(e.name, format!("TraceFile{}", i));
        }
    }

    #[test]
    fn test_plan_extents_shrinks_overcovering_count() {
        let secondaries = vec![".".to_string()];
        // ceil(10/7) = 2 frames per extent covers 10 frames in 5 extents
        let extents = plan_extents(
            "TraceFile",
            Path::new("/data/survey.js"),
            &secondaries,
            7,
            10,
            100,
        )
        .unwrap();
        assert_eq!(extents.len(), 5);
    }

    #[test]
    fn test_extent_for() {
        let secondaries = vec![".".to_string()];
        let extents = plan_extents(
            "TraceFile",
            Path::new("/data/survey.js"),
            &secondaries,
            4,
            10,
            100,
        )
        .unwrap();

        assert_eq!(extent_for(&extents, 0).unwrap().index, 0);
        assert_eq!(extent_for(&extents, 299).unwrap().index, 0);
        assert_eq!(extent_for(&extents, 300).unwrap().index, 1);
        assert_eq!(extent_for(&extents, 999).unwrap().index, 3);
        assert!(extent_for(&extents, 1200).is_err());
    }

    // env-var behavior lives in one test: the data-home variables are
    // process-global and the runner is multi-threaded
    #[test]
    fn test_secondary_path_resolution() {
        std::env::remove_var("JAVASEIS_DATA_HOME");
        std::env::remove_var("PROMAX_DATA_HOME");

        let secondaries = vec!["/fast".to_string(), "/slow".to_string()];
        let extents = plan_extents(
            "TraceHeaders",
            Path::new("/data/survey.js"),
            &secondaries,
            3,
            9,
            10,
        )
        .unwrap();
        assert_eq!(extents[0].path, Path::new("/fast/data/survey.js/TraceHeaders0"));
        assert_eq!(extents[1].path, Path::new("/slow/data/survey.js/TraceHeaders1"));
        assert_eq!(extents[2].path, Path::new("/fast/data/survey.js/TraceHeaders2"));

        std::env::set_var("JAVASEIS_DATA_HOME", "/data");
        let dir = extent_dir("/mnt/pool1", Path::new("/data/area/line.js")).unwrap();
        assert_eq!(dir, Path::new("/mnt/pool1/area/line.js"));

        // a dataset outside the data home is a configuration error
        let err = extent_dir("/mnt/pool1", Path::new("/scratch/line.js")).unwrap_err();
        assert!(matches!(err, JsError::Environment(_)));
        std::env::remove_var("JAVASEIS_DATA_HOME");
    }

    #[test]
    fn test_frame_addressing_roundtrip() {
        let axes = test_axes();
        assert_eq!(total_frames(&axes), 40);
        for index in 1..=40 {
            let addr = frame_address(&axes, index).unwrap();
            assert_eq!(frame_index(&axes, &addr).unwrap(), index);
        }
        // frame axis honors origin 3, delta 2
        assert_eq!(frame_index(&axes, &[3, 1]).unwrap(), 1);
        assert_eq!(frame_index(&axes, &[5, 1]).unwrap(), 2);
        assert_eq!(frame_index(&axes, &[3, 2]).unwrap(), 11);
        assert!(frame_index(&axes, &[4, 1]).is_err());
    }
}
