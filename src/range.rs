//! Bulk I/O over rectangular subsets of the logical grid
//!
//! A selection names one [`Span`] per axis, all in logical coordinates.
//! Reads enumerate the covered frames, regularize sparse ones, and project
//! the selected samples and traces into a dense column-major output array.
//! Writes mirror the read path, performing a read-modify-write on frames
//! only partially covered in samples or traces.

use crate::dataset::Dataset;
use crate::error::{JsError, Result};
use crate::header;
use crate::layout;
use crate::types::{Axis, TraceType};

/// Per-axis selector in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// Every bin of the axis
    All,
    /// A single coordinate
    At(i64),
    /// An inclusive arithmetic progression
    Range { first: i64, last: i64, stride: i64 },
}

impl Span {
    /// Resolve to 1-based grid indices along an axis.
    fn resolve(&self, axis: &Axis) -> Result<Vec<usize>> {
        match *self {
            Span::All => Ok((1..=axis.length).collect()),
            Span::At(coord) => Ok(vec![axis.grid_index(coord)?]),
            Span::Range { first, last, stride } => {
                if stride == 0 {
                    return Err(JsError::Precondition(format!(
                        "zero stride selecting axis {}",
                        axis.label
                    )));
                }
                let mut grids = Vec::new();
                let mut coord = first;
                while (stride > 0 && coord <= last) || (stride < 0 && coord >= last) {
                    grids.push(axis.grid_index(coord)?);
                    coord += stride;
                }
                if grids.is_empty() {
                    return Err(JsError::Precondition(format!(
                        "empty selection on axis {}",
                        axis.label
                    )));
                }
                Ok(grids)
            }
        }
    }
}

fn resolve_spans(axes: &[Axis], spans: &[Span]) -> Result<Vec<Vec<usize>>> {
    if spans.len() != axes.len() {
        return Err(JsError::Precondition(format!(
            "selection names {} axes, dataset has {}",
            spans.len(),
            axes.len()
        )));
    }
    axes.iter()
        .zip(spans)
        .map(|(axis, span)| span.resolve(axis))
        .collect()
}

/// Visit the outer product of the frame-axis grids in column-major order.
fn for_each_frame(
    grids: &[Vec<usize>],
    mut visit: impl FnMut(usize, &[usize]) -> Result<()>,
) -> Result<()> {
    let total: usize = grids.iter().map(|g| g.len()).product();
    let mut idx = vec![0usize; grids.len()];
    let mut combo = vec![0usize; grids.len()];
    for ordinal in 0..total {
        for (k, grid) in grids.iter().enumerate() {
            combo[k] = grid[idx[k]];
        }
        visit(ordinal, &combo)?;
        for k in 0..grids.len() {
            idx[k] += 1;
            if idx[k] < grids[k].len() {
                break;
            }
            idx[k] = 0;
        }
    }
    Ok(())
}

impl Dataset {
    /// Read the selected trace samples. Returns the per-axis output counts
    /// and the data in column-major order (samples fastest). Empty frames
    /// contribute zeros.
    pub fn read_trace_range(&self, spans: &[Span]) -> Result<(Vec<usize>, Vec<f32>)> {
        let grids = resolve_spans(self.axes(), spans)?;
        let dims: Vec<usize> = grids.iter().map(|g| g.len()).collect();
        let samples = self.samples_per_trace();
        let tpf = self.traces_per_frame();
        let nsel_s = dims[0];
        let nsel_t = dims[1];
        let mut out = vec![0f32; dims.iter().product()];

        let mut trcs = self.alloc_frame_trcs();
        let mut hdrs = self.alloc_frame_hdrs();
        for_each_frame(&grids[2..], |ordinal, frame_grid| {
            let frame = layout::frame_index_from_grid(self.axes(), frame_grid);
            let fold = self.fold(frame)? as usize;
            if fold == 0 {
                return Ok(());
            }
            if fold == tpf {
                // dense frame: no regularization needed
                self.read_frame_trcs(frame, &mut trcs)?;
            } else {
                let fold = self.read_frame(frame, &mut trcs, &mut hdrs)?;
                self.regularize(&mut trcs, &mut hdrs, fold)?;
            }
            let base = ordinal * nsel_s * nsel_t;
            for (ti, &tg) in grids[1].iter().enumerate() {
                for (si, &sg) in grids[0].iter().enumerate() {
                    out[base + ti * nsel_s + si] = trcs[(tg - 1) * samples + (sg - 1)];
                }
            }
            Ok(())
        })?;
        Ok((dims, out))
    }

    /// Read the selected header records. `spans` cover the trace and frame
    /// axes; the output is column-major with dimensions
    /// `[header_length, traces, frames...]`. Empty frames contribute zeros.
    pub fn read_header_range(&self, spans: &[Span]) -> Result<(Vec<usize>, Vec<u8>)> {
        let axes = &self.axes()[1..];
        let grids = resolve_spans(axes, spans)?;
        let hlen = self.header_length();
        let tpf = self.traces_per_frame();
        let mut dims = vec![hlen];
        dims.extend(grids.iter().map(|g| g.len()));
        let nsel_t = grids[0].len();
        let mut out = vec![0u8; dims.iter().product()];

        let mut trcs = self.alloc_frame_trcs();
        let mut hdrs = self.alloc_frame_hdrs();
        for_each_frame(&grids[1..], |ordinal, frame_grid| {
            let frame = layout::frame_index_from_grid(self.axes(), frame_grid);
            let fold = self.fold(frame)? as usize;
            if fold == 0 {
                return Ok(());
            }
            if fold == tpf {
                self.read_frame_hdrs(frame, &mut hdrs)?;
            } else {
                let fold = self.read_frame(frame, &mut trcs, &mut hdrs)?;
                self.regularize(&mut trcs, &mut hdrs, fold)?;
            }
            let base = ordinal * hlen * nsel_t;
            for (ti, &tg) in grids[0].iter().enumerate() {
                out[base + ti * hlen..base + (ti + 1) * hlen]
                    .copy_from_slice(header::record(&hdrs, hlen, tg));
            }
            Ok(())
        })?;
        Ok((dims, out))
    }

    /// Write the selected trace samples from a column-major array shaped
    /// like the selection. Frames only partially covered in samples or
    /// traces are read, regularized and merged first. Written traces become
    /// live with their axis properties set; each frame is left-justified
    /// before it is handed to the frame codec.
    pub fn write_trace_range(&mut self, spans: &[Span], data: &[f32]) -> Result<()> {
        let grids = resolve_spans(self.axes(), spans)?;
        let dims: Vec<usize> = grids.iter().map(|g| g.len()).collect();
        let expected: usize = dims.iter().product();
        if data.len() != expected {
            return Err(JsError::Precondition(format!(
                "selection holds {} samples, data holds {}",
                expected,
                data.len()
            )));
        }
        let samples = self.samples_per_trace();
        let tpf = self.traces_per_frame();
        let hlen = self.header_length();
        let order = self.endianness();
        let nsel_s = dims[0];
        let nsel_t = dims[1];
        let partial = nsel_s < samples || nsel_t < tpf;

        let trace_axis = self.axis(1).clone();
        let trace_prop = self.schema().get(&trace_axis.label)?.clone();
        let trc_type = self.schema().get("TRC_TYPE")?.clone();
        let frame_props: Vec<_> = self.axes()[2..]
            .iter()
            .map(|axis| self.schema().get(&axis.label).cloned())
            .collect::<Result<_>>()?;
        let frame_axes: Vec<Axis> = self.axes()[2..].to_vec();

        let mut trcs = self.alloc_frame_trcs();
        let mut hdrs = self.alloc_frame_hdrs();
        let total_frames: usize = grids[2..].iter().map(|g| g.len()).product();
        let mut frames = Vec::with_capacity(total_frames);
        for_each_frame(&grids[2..], |ordinal, frame_grid| {
            frames.push((ordinal, frame_grid.to_vec()));
            Ok(())
        })?;

        for (ordinal, frame_grid) in frames {
            let frame = layout::frame_index_from_grid(self.axes(), frame_grid.as_slice());
            let fold = self.fold(frame)? as usize;
            if partial && fold > 0 {
                let fold = self.read_frame(frame, &mut trcs, &mut hdrs)?;
                self.regularize(&mut trcs, &mut hdrs, fold)?;
            } else {
                // start from an all-dead frame
                trcs.fill(0.0);
                for t in 1..=tpf {
                    let rec = header::record_mut(&mut hdrs, hlen, t);
                    rec.fill(0);
                    header::set_int(rec, &trace_prop, order, trace_axis.logical_coord(t))?;
                    header::set_int(rec, &trc_type, order, TraceType::Dead.as_i32() as i64)?;
                }
            }

            let base = ordinal * nsel_s * nsel_t;
            for (ti, &tg) in grids[1].iter().enumerate() {
                for (si, &sg) in grids[0].iter().enumerate() {
                    trcs[(tg - 1) * samples + (sg - 1)] = data[base + ti * nsel_s + si];
                }
                let rec = header::record_mut(&mut hdrs, hlen, tg);
                header::set_int(rec, &trc_type, order, TraceType::Live.as_i32() as i64)?;
                header::set_int(rec, &trace_prop, order, trace_axis.logical_coord(tg))?;
                for ((axis, prop), &grid) in
                    frame_axes.iter().zip(&frame_props).zip(frame_grid.iter())
                {
                    header::set_int(rec, prop, order, axis.logical_coord(grid))?;
                }
            }

            let fold = self.leftjust(&mut trcs, &mut hdrs)?;
            self.write_frame_index(frame, &trcs, &hdrs, fold)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CreateOptions;
    use tempfile::TempDir;

    fn dataset_4d(dir: &std::path::Path) -> Dataset {
        Dataset::create(
            dir.join("range.js"),
            CreateOptions::new(&[8, 4, 3, 2]).with_logical_origins(&[1, 10, 1, 1]),
        )
        .unwrap()
    }

    #[test]
    fn test_write_then_read_full_frames() {
        let dir = TempDir::new().unwrap();
        let mut ds = dataset_4d(dir.path());

        // fill frame (1,1) and (3,2) through the range writer
        let samples = ds.samples_per_trace();
        let tpf = ds.traces_per_frame();
        let frame: Vec<f32> = (0..samples * tpf).map(|i| i as f32).collect();
        ds.write_trace_range(&[Span::All, Span::All, Span::At(1), Span::At(1)], &frame)
            .unwrap();
        ds.write_trace_range(&[Span::All, Span::All, Span::At(3), Span::At(2)], &frame)
            .unwrap();
        assert_eq!(ds.fold_at(&[1, 1]).unwrap(), 4);
        assert_eq!(ds.fold_at(&[3, 2]).unwrap(), 4);
        assert_eq!(ds.fold_at(&[2, 1]).unwrap(), 0);

        // a full read returns written frames and zeros for empty ones
        let (dims, data) = ds
            .read_trace_range(&[Span::All, Span::All, Span::All, Span::All])
            .unwrap();
        assert_eq!(dims, vec![8, 4, 3, 2]);
        let frame_len = samples * tpf;
        assert_eq!(&data[..frame_len], &frame[..]);
        assert!(data[frame_len..2 * frame_len].iter().all(|&s| s == 0.0));
        assert_eq!(&data[5 * frame_len..], &frame[..]);
    }

    #[test]
    fn test_subrange_projection() {
        let dir = TempDir::new().unwrap();
        let mut ds = dataset_4d(dir.path());
        let samples = ds.samples_per_trace();
        let tpf = ds.traces_per_frame();
        let frame: Vec<f32> = (0..samples * tpf).map(|i| (i * 10) as f32).collect();
        ds.write_trace_range(&[Span::All, Span::All, Span::At(2), Span::At(1)], &frame)
            .unwrap();

        // trace axis origin is 10: traces sit at coordinates 10..13
        let (dims, data) = ds
            .read_trace_range(&[
                Span::Range { first: 3, last: 5, stride: 2 },
                Span::At(12),
                Span::At(2),
                Span::At(1),
            ])
            .unwrap();
        assert_eq!(dims, vec![2, 1, 1, 1]);
        // trace grid 3, samples 3 and 5
        assert_eq!(data[0], frame[2 * samples + 2]);
        assert_eq!(data[1], frame[2 * samples + 4]);
    }

    #[test]
    fn test_partial_write_merges_frame() {
        let dir = TempDir::new().unwrap();
        let mut ds = dataset_4d(dir.path());
        let samples = ds.samples_per_trace();

        // write a single sparse trace at coordinate 11 (grid 2)
        let one: Vec<f32> = (0..samples).map(|i| 1000.0 + i as f32).collect();
        ds.write_trace_range(&[Span::All, Span::At(11), Span::At(1), Span::At(1)], &one)
            .unwrap();
        assert_eq!(ds.fold_at(&[1, 1]).unwrap(), 1);

        // merge a second trace into the same frame
        let two: Vec<f32> = (0..samples).map(|i| 2000.0 + i as f32).collect();
        ds.write_trace_range(&[Span::All, Span::At(13), Span::At(1), Span::At(1)], &two)
            .unwrap();
        assert_eq!(ds.fold_at(&[1, 1]).unwrap(), 2);

        let (dims, data) = ds
            .read_trace_range(&[Span::All, Span::All, Span::At(1), Span::At(1)])
            .unwrap();
        assert_eq!(dims, vec![8, 4, 1, 1]);
        assert_eq!(&data[samples..2 * samples], &one[..]);
        assert_eq!(&data[3 * samples..4 * samples], &two[..]);
        assert!(data[..samples].iter().all(|&s| s == 0.0));
        assert!(data[2 * samples..3 * samples].iter().all(|&s| s == 0.0));

        // partial in samples: overwrite the first two samples of trace 11
        ds.write_trace_range(
            &[
                Span::Range { first: 1, last: 2, stride: 1 },
                Span::At(11),
                Span::At(1),
                Span::At(1),
            ],
            &[-1.0, -2.0],
        )
        .unwrap();
        let (_, merged) = ds
            .read_trace_range(&[Span::All, Span::At(11), Span::At(1), Span::At(1)])
            .unwrap();
        assert_eq!(merged[0], -1.0);
        assert_eq!(merged[1], -2.0);
        assert_eq!(merged[2..], one[2..]);
    }

    #[test]
    fn test_header_range_reads_regularized() {
        let dir = TempDir::new().unwrap();
        let mut ds = dataset_4d(dir.path());
        let samples = ds.samples_per_trace();
        let one: Vec<f32> = vec![1.0; samples];
        ds.write_trace_range(&[Span::All, Span::At(12), Span::At(1), Span::At(1)], &one)
            .unwrap();

        let (dims, hdrs) = ds
            .read_header_range(&[Span::All, Span::At(1), Span::At(1)])
            .unwrap();
        assert_eq!(dims, vec![ds.header_length(), 4, 1, 1]);
        let order = ds.endianness();
        let hlen = ds.header_length();
        let trc_type = ds.schema().get("TRC_TYPE").unwrap();
        for t in 1..=4usize {
            let rec = &hdrs[(t - 1) * hlen..t * hlen];
            let expected = if t == 3 { TraceType::Live } else { TraceType::Dead };
            assert_eq!(
                header::get_int(rec, trc_type, order).unwrap(),
                expected.as_i32() as i64,
                "trace {}",
                t
            );
        }
    }

    #[test]
    fn test_selection_validation() {
        let dir = TempDir::new().unwrap();
        let ds = dataset_4d(dir.path());
        // wrong arity
        assert!(ds.read_trace_range(&[Span::All, Span::All]).is_err());
        // off-grid coordinate
        assert!(ds
            .read_trace_range(&[Span::All, Span::At(11), Span::At(1), Span::At(9)])
            .is_err());
        // zero stride
        assert!(ds
            .read_trace_range(&[
                Span::Range { first: 1, last: 4, stride: 0 },
                Span::All,
                Span::All,
                Span::All,
            ])
            .is_err());
    }
}
