//! Dataset lifecycle and frame I/O
//!
//! A [`Dataset`] carries all mutable state: the metadata envelope, the
//! header schema, the extent sets of the two byte streams, the trace-map
//! cache and the has-traces flag. Handles are not internally synchronized;
//! share one across threads only behind external locking.

use crate::compression::{codec_for, TraceCodec};
use crate::error::{JsError, Result};
use crate::header;
use crate::io;
use crate::layout::{self, default_extent_count, extent_for, Extent};
use crate::map::TraceMap;
use crate::metadata::{self, ExtentManifest, FileProperties};
use crate::props::{
    stock_axis_prop, stock_props, AxisLabelDict, HeaderSchema, DEFAULT_AXIS_LABELS,
};
use crate::types::{
    Axis, DataProperty, Endianness, Geometry, PropertyFormat, TraceFormat, TraceProperty,
    TracePropertyDef, TraceType,
};
use crate::utils::format_bytes;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TRACE_STREAM: &str = "TraceFile";
const HEADER_STREAM: &str = "TraceHeaders";

/// Options for creating a new dataset, optionally cloned from an existing
/// one.
#[derive(Default)]
pub struct CreateOptions {
    similar_to: Option<PathBuf>,
    axis_lengths: Vec<usize>,
    axis_labels: Option<Vec<String>>,
    axis_units: Option<Vec<String>>,
    axis_domains: Option<Vec<String>>,
    logical_origins: Option<Vec<i64>>,
    logical_deltas: Option<Vec<i64>>,
    physical_origins: Option<Vec<f64>>,
    physical_deltas: Option<Vec<f64>>,
    trace_format: Option<TraceFormat>,
    endianness: Option<Endianness>,
    mapped: Option<bool>,
    data_type: Option<String>,
    descriptive_name: Option<String>,
    comments: Option<String>,
    properties: Option<Vec<TracePropertyDef>>,
    properties_add: Vec<TracePropertyDef>,
    properties_rm: Vec<String>,
    data_properties: Option<Vec<DataProperty>>,
    data_properties_add: Vec<DataProperty>,
    data_properties_rm: Vec<String>,
    secondaries: Option<Vec<String>>,
    nextents: Option<usize>,
    geometry: Option<Geometry>,
}

impl CreateOptions {
    /// Start from axis bin counts in sample, trace, frame[, volume[,
    /// hypercube]] order.
    pub fn new(axis_lengths: &[usize]) -> Self {
        Self {
            axis_lengths: axis_lengths.to_vec(),
            ..Self::default()
        }
    }

    /// Clone every metadata field from an existing dataset, then apply the
    /// other options as overrides.
    pub fn similar_to(path: impl AsRef<Path>) -> Self {
        Self {
            similar_to: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    pub fn with_axis_lengths(mut self, lengths: &[usize]) -> Self {
        self.axis_lengths = lengths.to_vec();
        self
    }

    pub fn with_axis_labels(mut self, labels: &[&str]) -> Self {
        self.axis_labels = Some(labels.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_axis_units(mut self, units: &[&str]) -> Self {
        self.axis_units = Some(units.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_axis_domains(mut self, domains: &[&str]) -> Self {
        self.axis_domains = Some(domains.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_logical_origins(mut self, origins: &[i64]) -> Self {
        self.logical_origins = Some(origins.to_vec());
        self
    }

    pub fn with_logical_deltas(mut self, deltas: &[i64]) -> Self {
        self.logical_deltas = Some(deltas.to_vec());
        self
    }

    pub fn with_physical_origins(mut self, origins: &[f64]) -> Self {
        self.physical_origins = Some(origins.to_vec());
        self
    }

    pub fn with_physical_deltas(mut self, deltas: &[f64]) -> Self {
        self.physical_deltas = Some(deltas.to_vec());
        self
    }

    pub fn with_trace_format(mut self, format: TraceFormat) -> Self {
        self.trace_format = Some(format);
        self
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = Some(endianness);
        self
    }

    pub fn with_mapped(mut self, mapped: bool) -> Self {
        self.mapped = Some(mapped);
        self
    }

    pub fn with_data_type(mut self, data_type: &str) -> Self {
        self.data_type = Some(data_type.to_string());
        self
    }

    pub fn with_descriptive_name(mut self, name: &str) -> Self {
        self.descriptive_name = Some(name.to_string());
        self
    }

    pub fn with_comments(mut self, comments: &str) -> Self {
        self.comments = Some(comments.to_string());
        self
    }

    /// Replace the user-defined property set outright.
    pub fn with_properties(mut self, properties: Vec<TracePropertyDef>) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Add properties to an inherited set (similar-to only).
    pub fn with_properties_add(mut self, properties: Vec<TracePropertyDef>) -> Self {
        self.properties_add = properties;
        self
    }

    /// Remove properties from an inherited set by label (similar-to only).
    pub fn with_properties_rm(mut self, labels: &[&str]) -> Self {
        self.properties_rm = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_data_properties(mut self, properties: Vec<DataProperty>) -> Self {
        self.data_properties = Some(properties);
        self
    }

    pub fn with_data_properties_add(mut self, properties: Vec<DataProperty>) -> Self {
        self.data_properties_add = properties;
        self
    }

    pub fn with_data_properties_rm(mut self, labels: &[&str]) -> Self {
        self.data_properties_rm = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_secondaries(mut self, secondaries: &[&str]) -> Self {
        self.secondaries = Some(secondaries.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_extents(mut self, nextents: usize) -> Self {
        self.nextents = Some(nextents);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// An open JavaSeis dataset
pub struct Dataset {
    path: PathBuf,
    writable: bool,
    descriptive_name: String,
    fp: FileProperties,
    schema: HeaderSchema,
    data_props: Vec<DataProperty>,
    geometry: Option<Geometry>,
    secondaries: Vec<String>,
    trc_extents: Vec<Extent>,
    hdr_extents: Vec<Extent>,
    map: TraceMap,
    codec: Box<dyn TraceCodec>,
    has_traces: bool,
    dict: AxisLabelDict,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("writable", &self.writable)
            .field("descriptive_name", &self.descriptive_name)
            .field("fp", &self.fp)
            .field("schema", &self.schema)
            .field("data_props", &self.data_props)
            .field("geometry", &self.geometry)
            .field("secondaries", &self.secondaries)
            .field("trc_extents", &self.trc_extents)
            .field("hdr_extents", &self.hdr_extents)
            .field("map", &self.map)
            .field("has_traces", &self.has_traces)
            .field("dict", &self.dict)
            .finish()
    }
}

impl Dataset {
    /// Open an existing dataset read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_mode(path, "r")
    }

    /// Open an existing dataset for read/write.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_mode(path, "r+")
    }

    /// Open with an explicit mode string: `"r"` or `"r+"`.
    pub fn open_mode(path: impl AsRef<Path>, mode: &str) -> Result<Self> {
        let writable = match mode {
            "r" => false,
            "r+" => true,
            _ => {
                return Err(JsError::Precondition(format!(
                    "unknown open mode {:?}, expected \"r\" or \"r+\"",
                    mode
                )))
            }
        };
        Self::open_with_dict(path, AxisLabelDict::default(), writable)
    }

    /// Open with a caller-supplied axis-label dictionary.
    pub fn open_with_dict(
        path: impl AsRef<Path>,
        dict: AxisLabelDict,
        writable: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (fp, placed, data_props, geometry) = metadata::read_file_properties(&path, &dict)?;
        let schema = HeaderSchema::from_entries(placed, fp.header_length)?;

        // frame and slower axes must be backed by a header property; the
        // sample and trace axes may omit one
        for axis in &fp.axes[2..] {
            if !schema.contains(&axis.label) {
                return Err(JsError::Malformed(format!(
                    "axis {} has no matching trace property",
                    axis.label
                )));
            }
        }

        let codec = codec_for(fp.trace_format)?;
        let secondaries = metadata::read_virtual_folders(&path)?;
        let trc_extents = Self::load_extents(
            &path,
            &secondaries,
            TRACE_STREAM,
            fp.traces_per_frame() as u64 * codec.record_bytes(fp.samples_per_trace()) as u64,
            fp.total_frames(),
        )?;
        let hdr_extents = Self::load_extents(
            &path,
            &secondaries,
            HEADER_STREAM,
            fp.traces_per_frame() as u64 * fp.header_length as u64,
            fp.total_frames(),
        )?;

        let map = TraceMap::open(
            &path,
            fp.mapped,
            fp.frames_per_volume(),
            fp.total_frames(),
            fp.traces_per_frame(),
        );
        let descriptive_name = metadata::read_descriptive_name(&path)?;
        let has_traces = metadata::read_has_traces(&path)?;

        Ok(Self {
            path,
            writable,
            descriptive_name,
            fp,
            schema,
            data_props,
            geometry,
            secondaries,
            trc_extents,
            hdr_extents,
            map,
            codec,
            has_traces,
            dict,
        })
    }

    fn load_extents(
        path: &Path,
        secondaries: &[String],
        stream: &str,
        frame_bytes: u64,
        total_frames: u64,
    ) -> Result<Vec<Extent>> {
        let manifest = metadata::read_extent_manifest(path, stream)?;
        let total_bytes = total_frames * frame_bytes;
        if manifest.max_pos + 1 != total_bytes {
            return Err(JsError::Malformed(format!(
                "{} stream declares {} bytes but the framework needs {}",
                stream,
                manifest.max_pos + 1,
                total_bytes
            )));
        }
        layout::extents_from_meta(
            stream,
            path,
            secondaries,
            manifest.extent_size,
            manifest.max_file,
            total_bytes,
            frame_bytes,
        )
    }

    /// Create a new dataset, replacing any dataset already at `path`.
    pub fn create(path: impl AsRef<Path>, opts: CreateOptions) -> Result<Self> {
        Self::create_with_dict(path, opts, AxisLabelDict::default())
    }

    /// Create with a caller-supplied axis-label dictionary.
    pub fn create_with_dict(
        path: impl AsRef<Path>,
        opts: CreateOptions,
        dict: AxisLabelDict,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if opts.properties.is_some()
            && (!opts.properties_add.is_empty() || !opts.properties_rm.is_empty())
        {
            return Err(JsError::Precondition(
                "properties_add/properties_rm cannot coexist with an explicit property set"
                    .to_string(),
            ));
        }
        if opts.data_properties.is_some()
            && (!opts.data_properties_add.is_empty() || !opts.data_properties_rm.is_empty())
        {
            return Err(JsError::Precondition(
                "data_properties_add/data_properties_rm cannot coexist with an explicit set"
                    .to_string(),
            ));
        }

        let (mut fp, defs, data_props, geometry, secondaries, name) = match &opts.similar_to {
            Some(src) => Self::assemble_similar(src, &opts, &dict)?,
            None => Self::assemble_new(&opts)?,
        };
        let schema = HeaderSchema::build(&defs);
        fp.header_length = schema.header_length();
        fp.validate()?;

        let codec = codec_for(fp.trace_format)?;
        let samples = fp.samples_per_trace();
        let tpf = fp.traces_per_frame();
        let total_frames = fp.total_frames();
        let trc_frame_bytes = tpf as u64 * codec.record_bytes(samples) as u64;
        let hdr_frame_bytes = tpf as u64 * schema.header_length() as u64;
        let trc_total = total_frames * trc_frame_bytes;
        let hdr_total = total_frames * hdr_frame_bytes;

        let nextents = opts
            .nextents
            .unwrap_or_else(|| default_extent_count(trc_total, total_frames))
            .clamp(1, total_frames as usize);
        let trc_extents = layout::plan_extents(
            TRACE_STREAM,
            &path,
            &secondaries,
            nextents,
            total_frames,
            trc_frame_bytes,
        )?;
        let hdr_extents = layout::plan_extents(
            HEADER_STREAM,
            &path,
            &secondaries,
            nextents,
            total_frames,
            hdr_frame_bytes,
        )?;

        // (re)make the primary and every secondary extent directory
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        std::fs::create_dir_all(&path)?;
        for dir in Self::extent_dirs(&trc_extents, &hdr_extents) {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }

        metadata::write_file_properties(
            &path,
            &fp,
            &schema.iter().cloned().collect::<Vec<TraceProperty>>(),
            &data_props,
            geometry.as_ref(),
            &dict,
        )?;
        metadata::write_extent_manifest(
            &path,
            TRACE_STREAM,
            &ExtentManifest {
                extent_size: trc_extents[0].size,
                max_file: trc_extents.len(),
                max_pos: trc_total - 1,
            },
        )?;
        metadata::write_extent_manifest(
            &path,
            HEADER_STREAM,
            &ExtentManifest {
                extent_size: hdr_extents[0].size,
                max_file: hdr_extents.len(),
                max_pos: hdr_total - 1,
            },
        )?;
        metadata::write_virtual_folders(&path, &secondaries, trc_total + hdr_total)?;
        metadata::write_descriptive_name(&path, &name)?;
        metadata::write_has_traces(&path, false)?;

        let map = TraceMap::create(&path, fp.mapped, fp.frames_per_volume(), total_frames, tpf)?;
        info!(path = %path.display(), frames = total_frames, "created dataset");

        Ok(Self {
            path,
            writable: true,
            descriptive_name: name,
            fp,
            schema,
            data_props,
            geometry,
            secondaries,
            trc_extents,
            hdr_extents,
            map,
            codec,
            has_traces: false,
            dict,
        })
    }

    /// Assemble metadata for a dataset created from scratch.
    #[allow(clippy::type_complexity)]
    fn assemble_new(
        opts: &CreateOptions,
    ) -> Result<(
        FileProperties,
        Vec<TracePropertyDef>,
        Vec<DataProperty>,
        Option<Geometry>,
        Vec<String>,
        String,
    )> {
        if !opts.properties_add.is_empty()
            || !opts.properties_rm.is_empty()
            || !opts.data_properties_add.is_empty()
            || !opts.data_properties_rm.is_empty()
        {
            return Err(JsError::Precondition(
                "property edits need a similar-to reference dataset".to_string(),
            ));
        }
        if opts.axis_lengths.is_empty() {
            return Err(JsError::Precondition(
                "creating a dataset needs axis lengths".to_string(),
            ));
        }
        let ndim = opts.axis_lengths.len();
        if !(3..=5).contains(&ndim) {
            return Err(JsError::Precondition(format!(
                "dataset needs 3 to 5 dimensions, got {}",
                ndim
            )));
        }

        let labels: Vec<String> = match &opts.axis_labels {
            Some(labels) => labels.clone(),
            None => DEFAULT_AXIS_LABELS[..ndim]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        if labels.len() != ndim {
            return Err(JsError::Precondition(
                "axis label override does not match dimensionality".to_string(),
            ));
        }
        let mut axes: Vec<Axis> = labels
            .iter()
            .zip(&opts.axis_lengths)
            .map(|(label, &length)| Axis::new(label.clone(), length))
            .collect();
        Self::apply_axis_overrides(&mut axes, opts)?;

        let fp = FileProperties {
            comments: opts
                .comments
                .clone()
                .unwrap_or_else(|| format!("javaseis {}", env!("CARGO_PKG_VERSION"))),
            version: metadata::JAVASEIS_VERSION.to_string(),
            data_type: opts.data_type.clone().unwrap_or_else(|| "CUSTOM".to_string()),
            trace_format: opts.trace_format.unwrap_or(TraceFormat::Float),
            endianness: opts.endianness.unwrap_or(Endianness::Little),
            mapped: opts.mapped.unwrap_or(true),
            axes: axes.clone(),
            header_length: 0,
        };

        // schema order: stock set, user-defined, then per-axis properties
        let mut defs = stock_props();
        if let Some(user) = &opts.properties {
            defs.extend(user.iter().cloned());
        }
        defs.extend(Self::axis_prop_defs(&axes));

        Ok((
            fp,
            defs,
            opts.data_properties.clone().unwrap_or_default(),
            opts.geometry,
            opts.secondaries
                .clone()
                .unwrap_or_else(|| vec![".".to_string()]),
            opts.descriptive_name.clone().unwrap_or_default(),
        ))
    }

    /// Assemble metadata cloned from a reference dataset with overrides.
    #[allow(clippy::type_complexity)]
    fn assemble_similar(
        src: &Path,
        opts: &CreateOptions,
        dict: &AxisLabelDict,
    ) -> Result<(
        FileProperties,
        Vec<TracePropertyDef>,
        Vec<DataProperty>,
        Option<Geometry>,
        Vec<String>,
        String,
    )> {
        let reference = Dataset::open_with_dict(src, dict.clone(), false)?;
        let mut fp = reference.fp.clone();
        if let Some(format) = opts.trace_format {
            fp.trace_format = format;
        }
        if let Some(endianness) = opts.endianness {
            fp.endianness = endianness;
        }
        if let Some(mapped) = opts.mapped {
            fp.mapped = mapped;
        }
        if let Some(data_type) = &opts.data_type {
            fp.data_type = data_type.clone();
        }
        if let Some(comments) = &opts.comments {
            fp.comments = comments.clone();
        }

        if !opts.axis_lengths.is_empty() {
            if opts.axis_lengths.len() != fp.ndim() {
                return Err(JsError::Precondition(format!(
                    "similar-to override changes dimensionality from {} to {}",
                    fp.ndim(),
                    opts.axis_lengths.len()
                )));
            }
            for (axis, &length) in fp.axes.iter_mut().zip(&opts.axis_lengths) {
                axis.length = length;
            }
        }
        if let Some(labels) = &opts.axis_labels {
            if labels.len() != fp.ndim() {
                return Err(JsError::Precondition(
                    "axis label override does not match dimensionality".to_string(),
                ));
            }
            for (axis, label) in fp.axes.iter_mut().zip(labels) {
                axis.label = label.clone();
            }
        }
        Self::apply_axis_overrides(&mut fp.axes, opts)?;

        // inherit the placed property set unless replaced outright
        let mut defs: Vec<TracePropertyDef> = match &opts.properties {
            Some(user) => {
                let mut defs = stock_props();
                defs.extend(user.iter().cloned());
                defs
            }
            None => {
                let mut defs: Vec<TracePropertyDef> =
                    reference.schema.iter().map(|p| p.def.clone()).collect();
                // removal by label is an exact set difference
                defs.retain(|def| !opts.properties_rm.contains(&def.label));
                for def in &opts.properties_add {
                    if !defs.iter().any(|d| d.label == def.label) {
                        defs.push(def.clone());
                    }
                }
                defs
            }
        };
        defs.extend(Self::axis_prop_defs(&fp.axes));

        let data_props = match &opts.data_properties {
            Some(replacement) => replacement.clone(),
            None => {
                let mut inherited = reference.data_props.clone();
                inherited.retain(|dp| !opts.data_properties_rm.contains(&dp.label));
                for dp in &opts.data_properties_add {
                    if !inherited.iter().any(|d| d.label == dp.label) {
                        inherited.push(dp.clone());
                    }
                }
                inherited
            }
        };

        let geometry = opts.geometry.or(reference.geometry);
        let secondaries = opts
            .secondaries
            .clone()
            .unwrap_or_else(|| reference.secondaries.clone());
        let name = opts.descriptive_name.clone().unwrap_or_default();

        Ok((fp, defs, data_props, geometry, secondaries, name))
    }

    fn apply_axis_overrides(axes: &mut [Axis], opts: &CreateOptions) -> Result<()> {
        let ndim = axes.len();
        let check = |name: &str, len: usize| -> Result<()> {
            if len != ndim {
                return Err(JsError::Precondition(format!(
                    "{} holds {} entries for {} dimensions",
                    name, len, ndim
                )));
            }
            Ok(())
        };
        if let Some(units) = &opts.axis_units {
            check("axis units", units.len())?;
            for (axis, unit) in axes.iter_mut().zip(units) {
                axis.unit = unit.clone();
            }
        }
        if let Some(domains) = &opts.axis_domains {
            check("axis domains", domains.len())?;
            for (axis, domain) in axes.iter_mut().zip(domains) {
                axis.domain = domain.clone();
            }
        }
        if let Some(origins) = &opts.logical_origins {
            check("logical origins", origins.len())?;
            for (axis, &origin) in axes.iter_mut().zip(origins) {
                axis.logical_origin = origin;
            }
        }
        if let Some(deltas) = &opts.logical_deltas {
            check("logical deltas", deltas.len())?;
            for (axis, &delta) in axes.iter_mut().zip(deltas) {
                axis.logical_delta = delta;
            }
        }
        if let Some(origins) = &opts.physical_origins {
            check("physical origins", origins.len())?;
            for (axis, &origin) in axes.iter_mut().zip(origins) {
                axis.physical_origin = origin;
            }
        }
        if let Some(deltas) = &opts.physical_deltas {
            check("physical deltas", deltas.len())?;
            for (axis, &delta) in axes.iter_mut().zip(deltas) {
                axis.physical_delta = delta;
            }
        }
        Ok(())
    }

    /// Property definitions backing the trace and frame axes. The sample
    /// axis carries none.
    fn axis_prop_defs(axes: &[Axis]) -> Vec<TracePropertyDef> {
        axes[1..]
            .iter()
            .map(|axis| {
                stock_axis_prop(&axis.label).unwrap_or_else(|| {
                    TracePropertyDef::new(
                        axis.label.clone(),
                        format!("{} axis index", axis.label),
                        PropertyFormat::Int32,
                        1,
                    )
                })
            })
            .collect()
    }

    fn extent_dirs(trc: &[Extent], hdr: &[Extent]) -> BTreeSet<PathBuf> {
        trc.iter()
            .chain(hdr)
            .filter_map(|e| e.path.parent().map(Path::to_path_buf))
            .collect()
    }

    // accessors

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn descriptive_name(&self) -> &str {
        &self.descriptive_name
    }

    pub fn ndim(&self) -> usize {
        self.fp.ndim()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.fp.axes
    }

    pub fn axis(&self, dim: usize) -> &Axis {
        &self.fp.axes[dim]
    }

    pub fn samples_per_trace(&self) -> usize {
        self.fp.samples_per_trace()
    }

    pub fn traces_per_frame(&self) -> usize {
        self.fp.traces_per_frame()
    }

    pub fn total_frames(&self) -> u64 {
        self.fp.total_frames()
    }

    pub fn trace_format(&self) -> TraceFormat {
        self.fp.trace_format
    }

    pub fn endianness(&self) -> Endianness {
        self.fp.endianness
    }

    pub fn is_mapped(&self) -> bool {
        self.fp.mapped
    }

    pub fn header_length(&self) -> usize {
        self.schema.header_length()
    }

    pub fn schema(&self) -> &HeaderSchema {
        &self.schema
    }

    /// Look up a trace property by label.
    pub fn trace_property(&self, label: &str) -> Result<&TraceProperty> {
        self.schema.get(label)
    }

    pub fn data_properties(&self) -> &[DataProperty] {
        &self.data_props
    }

    /// Look up a data property by label.
    pub fn data_property(&self, label: &str) -> Result<&DataProperty> {
        self.data_props
            .iter()
            .find(|dp| dp.label == label)
            .ok_or_else(|| JsError::NotFound(format!("data property {}", label)))
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn secondaries(&self) -> &[String] {
        &self.secondaries
    }

    pub fn has_traces(&self) -> bool {
        self.has_traces
    }

    pub fn trace_map(&self) -> &TraceMap {
        &self.map
    }

    pub fn axis_label_dict(&self) -> &AxisLabelDict {
        &self.dict
    }

    /// One-line description of the dataset
    pub fn summary(&self) -> String {
        let dims = self
            .fp
            .axes
            .iter()
            .map(|a| a.length.to_string())
            .collect::<Vec<_>>()
            .join(" x ");
        let trc_bytes: u64 = self.trc_extents.iter().map(|e| e.size).sum();
        format!(
            "{}D JavaSeis dataset: {} ({}), {} frames, {} extents, {} trace stream",
            self.ndim(),
            dims,
            self.fp.trace_format.name(),
            self.total_frames(),
            self.trc_extents.len(),
            format_bytes(trc_bytes)
        )
    }

    /// Allocate a zeroed full-frame sample buffer.
    pub fn alloc_frame_trcs(&self) -> Vec<f32> {
        vec![0.0; self.samples_per_trace() * self.traces_per_frame()]
    }

    /// Allocate a zeroed full-frame header buffer.
    pub fn alloc_frame_hdrs(&self) -> Vec<u8> {
        vec![0; self.header_length() * self.traces_per_frame()]
    }

    // addressing

    /// Linear 1-based frame index of a logical frame address.
    pub fn frame_index(&self, addr: &[i64]) -> Result<u64> {
        layout::frame_index(&self.fp.axes, addr)
    }

    /// Logical frame address of a linear 1-based frame index.
    pub fn frame_address(&self, index: u64) -> Result<Vec<i64>> {
        layout::frame_address(&self.fp.axes, index)
    }

    /// Fold of a linear frame index.
    pub fn fold(&self, frame: u64) -> Result<i32> {
        self.map.fold(frame)
    }

    /// Fold of a logical frame address.
    pub fn fold_at(&self, addr: &[i64]) -> Result<i32> {
        self.map.fold(self.frame_index(addr)?)
    }

    // frame I/O

    fn trc_frame_bytes(&self) -> u64 {
        self.traces_per_frame() as u64
            * self.codec.record_bytes(self.samples_per_trace()) as u64
    }

    fn hdr_frame_bytes(&self) -> u64 {
        self.traces_per_frame() as u64 * self.header_length() as u64
    }

    /// Read the trace samples of a frame. Returns the fold; the first
    /// `fold` columns of `trcs` are the live traces in left-justified
    /// order, later columns are untouched.
    pub fn read_frame_trcs(&self, frame: u64, trcs: &mut [f32]) -> Result<usize> {
        let fold = self.map.fold(frame)? as usize;
        if fold == 0 {
            return Ok(0);
        }
        self.read_trcs_records(frame, fold, trcs)?;
        Ok(fold)
    }

    /// Read the headers of a frame. Returns the fold; the first `fold`
    /// records of `hdrs` are the live headers in left-justified order.
    pub fn read_frame_hdrs(&self, frame: u64, hdrs: &mut [u8]) -> Result<usize> {
        let fold = self.map.fold(frame)? as usize;
        if fold == 0 {
            return Ok(0);
        }
        self.read_hdrs_records(frame, fold, hdrs)?;
        Ok(fold)
    }

    /// Read a frame's traces and headers. Returns the fold.
    pub fn read_frame(&self, frame: u64, trcs: &mut [f32], hdrs: &mut [u8]) -> Result<usize> {
        let fold = self.map.fold(frame)? as usize;
        if fold == 0 {
            return Ok(0);
        }
        self.read_trcs_records(frame, fold, trcs)?;
        self.read_hdrs_records(frame, fold, hdrs)?;
        Ok(fold)
    }

    /// Read a frame by logical address.
    pub fn read_frame_at(
        &self,
        addr: &[i64],
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<usize> {
        self.read_frame(self.frame_index(addr)?, trcs, hdrs)
    }

    fn read_trcs_records(&self, frame: u64, fold: usize, trcs: &mut [f32]) -> Result<()> {
        let samples = self.samples_per_trace();
        if trcs.len() < samples * fold {
            return Err(JsError::Precondition(format!(
                "trace buffer holds {} samples, frame fold {} needs {}",
                trcs.len(),
                fold,
                samples * fold
            )));
        }
        let rec = self.codec.record_bytes(samples);
        let offset = (frame - 1) * self.trc_frame_bytes();
        let extent = extent_for(&self.trc_extents, offset)?;
        let mut records = vec![0u8; rec * fold];
        io::read_at(&extent.path, offset - extent.start, &mut records)?;
        for i in 0..fold {
            self.codec.decode(
                &records[i * rec..(i + 1) * rec],
                &mut trcs[i * samples..(i + 1) * samples],
            )?;
        }
        Ok(())
    }

    fn read_hdrs_records(&self, frame: u64, fold: usize, hdrs: &mut [u8]) -> Result<()> {
        let hlen = self.header_length();
        if hdrs.len() < hlen * fold {
            return Err(JsError::Precondition(format!(
                "header buffer holds {} bytes, frame fold {} needs {}",
                hdrs.len(),
                fold,
                hlen * fold
            )));
        }
        let offset = (frame - 1) * self.hdr_frame_bytes();
        let extent = extent_for(&self.hdr_extents, offset)?;
        io::read_at(&extent.path, offset - extent.start, &mut hdrs[..hlen * fold])
    }

    /// Count the live traces of a full frame header buffer.
    pub fn count_live(&self, hdrs: &[u8]) -> Result<usize> {
        let hlen = self.header_length();
        let tpf = self.traces_per_frame();
        if hdrs.len() != hlen * tpf {
            return Err(JsError::Precondition(format!(
                "header buffer of {} bytes is not a full frame ({} expected)",
                hdrs.len(),
                hlen * tpf
            )));
        }
        let trc_type = self.schema.get("TRC_TYPE")?;
        let mut live = 0;
        for i in 1..=tpf {
            let rec = header::record(hdrs, hlen, i);
            if header::get_int(rec, trc_type, self.fp.endianness)?
                == TraceType::Live.as_i32() as i64
            {
                live += 1;
            }
        }
        Ok(live)
    }

    /// Write a left-justified frame, deriving the target frame from the
    /// frame-axis properties of the first header record. Returns the fold.
    pub fn write_frame(&mut self, trcs: &[f32], hdrs: &[u8]) -> Result<usize> {
        let fold = self.count_live(hdrs)?;
        if fold == 0 {
            return Err(JsError::Precondition(
                "cannot derive a frame index from an all-dead frame".to_string(),
            ));
        }
        let first = header::record(hdrs, self.header_length(), 1);
        let mut addr = Vec::with_capacity(self.ndim() - 2);
        for axis in &self.fp.axes[2..] {
            let prop = self.schema.get(&axis.label)?;
            addr.push(header::get_int(first, prop, self.fp.endianness)?);
        }
        let frame = self.frame_index(&addr)?;
        self.write_frame_index(frame, trcs, hdrs, fold)
    }

    /// Write a left-justified frame at a logical address. Returns the fold.
    pub fn write_frame_at(&mut self, addr: &[i64], trcs: &[f32], hdrs: &[u8]) -> Result<usize> {
        let fold = self.count_live(hdrs)?;
        let frame = self.frame_index(addr)?;
        self.write_frame_index(frame, trcs, hdrs, fold)
    }

    /// Write the first `fold` traces and headers of a left-justified frame
    /// at a linear frame index, then record the fold in the trace map.
    pub fn write_frame_index(
        &mut self,
        frame: u64,
        trcs: &[f32],
        hdrs: &[u8],
        fold: usize,
    ) -> Result<usize> {
        if !self.writable {
            return Err(JsError::Precondition(
                "dataset is open read-only".to_string(),
            ));
        }
        let samples = self.samples_per_trace();
        let tpf = self.traces_per_frame();
        if fold > tpf {
            return Err(JsError::Precondition(format!(
                "fold {} exceeds {} traces per frame",
                fold, tpf
            )));
        }
        if trcs.len() < samples * fold || hdrs.len() < self.header_length() * fold {
            return Err(JsError::Precondition(
                "frame buffers are smaller than the fold".to_string(),
            ));
        }

        if fold > 0 {
            let rec = self.codec.record_bytes(samples);
            let mut records = self.codec.frame_buf(samples, fold);
            for i in 0..fold {
                self.codec.encode(
                    &trcs[i * samples..(i + 1) * samples],
                    &mut records[i * rec..(i + 1) * rec],
                )?;
            }
            let offset = (frame - 1) * self.trc_frame_bytes();
            let extent = extent_for(&self.trc_extents, offset)?;
            io::write_at(&extent.path, offset - extent.start, &records)?;

            let hoffset = (frame - 1) * self.hdr_frame_bytes();
            let hextent = extent_for(&self.hdr_extents, hoffset)?;
            io::write_at(
                &hextent.path,
                hoffset - hextent.start,
                &hdrs[..self.header_length() * fold],
            )?;
        }

        self.map.set_fold(frame, fold as i32)?;
        if fold > 0 && !self.has_traces {
            self.has_traces = true;
            metadata::write_has_traces(&self.path, true)?;
        }
        debug!(frame, fold, "wrote frame");
        Ok(fold)
    }

    // left-justification and regularization

    /// Move live traces to the left end of the frame, dead and auxiliary
    /// traces to the right, preserving relative order. Returns the fold.
    pub fn leftjust(&self, trcs: &mut [f32], hdrs: &mut [u8]) -> Result<usize> {
        let samples = self.samples_per_trace();
        let hlen = self.header_length();
        let tpf = self.traces_per_frame();
        let trc_type = self.schema.get("TRC_TYPE")?;

        let mut live = Vec::with_capacity(tpf);
        let mut rest = Vec::new();
        for i in 1..=tpf {
            let rec = header::record(hdrs, hlen, i);
            if header::get_int(rec, trc_type, self.fp.endianness)?
                == TraceType::Live.as_i32() as i64
            {
                live.push(i);
            } else {
                rest.push(i);
            }
        }
        let fold = live.len();
        if fold == tpf {
            return Ok(fold);
        }

        let src_trcs = trcs.to_vec();
        let src_hdrs = hdrs.to_vec();
        for (dst, &src) in live.iter().chain(rest.iter()).enumerate() {
            let dst = dst + 1;
            if dst != src {
                trcs[(dst - 1) * samples..dst * samples]
                    .copy_from_slice(&src_trcs[(src - 1) * samples..src * samples]);
                header::record_mut(hdrs, hlen, dst)
                    .copy_from_slice(&src_hdrs[(src - 1) * hlen..src * hlen]);
            }
        }
        Ok(fold)
    }

    /// Move the first `fold` left-justified live traces to the columns
    /// declared by the trace-axis property, then fill the remaining columns
    /// with dead traces.
    pub fn regularize(&self, trcs: &mut [f32], hdrs: &mut [u8], fold: usize) -> Result<()> {
        let label = self.fp.axes[1].label.clone();
        self.regularize_by(&label, trcs, hdrs, fold)
    }

    /// [`regularize`](Self::regularize) against an explicit indexing
    /// property.
    pub fn regularize_by(
        &self,
        label: &str,
        trcs: &mut [f32],
        hdrs: &mut [u8],
        fold: usize,
    ) -> Result<()> {
        let samples = self.samples_per_trace();
        let hlen = self.header_length();
        let tpf = self.traces_per_frame();
        if fold > tpf {
            return Err(JsError::Precondition(format!(
                "fold {} exceeds {} traces per frame",
                fold, tpf
            )));
        }
        let prop = self.schema.find(label).ok_or_else(|| {
            JsError::Precondition(format!("unknown regularization property {}", label))
        })?;
        let trc_type = self.schema.get("TRC_TYPE")?;
        let axis = &self.fp.axes[1];

        // reverse order: a destination still holding a to-be-moved live
        // trace is vacated before it is overwritten
        let mut placed = vec![false; tpf];
        for i in (1..=fold).rev() {
            let rec = header::record(hdrs, hlen, i);
            let coord = header::get_int(rec, prop, self.fp.endianness)?;
            let dst = axis.grid_index(coord)?;
            if dst != i {
                trcs.copy_within((i - 1) * samples..i * samples, (dst - 1) * samples);
                hdrs.copy_within((i - 1) * hlen..i * hlen, (dst - 1) * hlen);
            }
            placed[dst - 1] = true;
        }
        for dst in 1..=tpf {
            if placed[dst - 1] {
                continue;
            }
            let rec = header::record_mut(hdrs, hlen, dst);
            rec.fill(0);
            header::set_int(rec, prop, self.fp.endianness, axis.logical_coord(dst))?;
            header::set_int(
                rec,
                trc_type,
                self.fp.endianness,
                TraceType::Dead.as_i32() as i64,
            )?;
            trcs[(dst - 1) * samples..dst * samples].fill(0.0);
        }
        Ok(())
    }

    // bulk lifecycle

    /// Delete the data files of every extent directory, zero the trace map
    /// and clear the has-traces flag. The metadata sidecars survive.
    pub fn empty(&mut self) -> Result<()> {
        if !self.writable {
            return Err(JsError::Precondition(
                "dataset is open read-only".to_string(),
            ));
        }
        for dir in Self::extent_dirs(&self.trc_extents, &self.hdr_extents) {
            if !dir.exists() {
                continue;
            }
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if is_extent_file(&name) {
                    std::fs::remove_file(entry.path())?;
                }
            }
        }
        self.map.reset()?;
        self.has_traces = false;
        metadata::write_has_traces(&self.path, false)?;
        info!(path = %self.path.display(), "emptied dataset");
        Ok(())
    }

    /// Delete the dataset: every secondary extent directory, then the
    /// primary directory.
    pub fn remove(self) -> Result<()> {
        let primary = std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        for dir in Self::extent_dirs(&self.trc_extents, &self.hdr_extents) {
            let resolved = std::fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
            if resolved != primary && dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
        }
        if self.path.exists() {
            std::fs::remove_dir_all(&self.path)?;
        }
        info!(path = %self.path.display(), "removed dataset");
        Ok(())
    }
}

/// An extent data file name: the stream prefix followed by digits only.
fn is_extent_file(name: &str) -> bool {
    for prefix in [HEADER_STREAM, TRACE_STREAM] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return true;
            }
        }
    }
    false
}

/// Copy a dataset frame by frame. The destination is an exact metadata
/// clone of the source.
pub fn copy(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let src = Dataset::open(src)?;
    let mut dst = Dataset::create(dst.as_ref(), CreateOptions::similar_to(src.path()))?;

    let same_schema = src.schema.header_length() == dst.schema.header_length()
        && src
            .schema
            .iter()
            .zip(dst.schema.iter())
            .all(|(a, b)| a.label() == b.label() && a.offset == b.offset);

    let mut trcs = src.alloc_frame_trcs();
    let mut hdrs = src.alloc_frame_hdrs();
    let mut translated = dst.alloc_frame_hdrs();
    for frame in 1..=src.total_frames() {
        let fold = src.read_frame(frame, &mut trcs, &mut hdrs)?;
        if fold == 0 {
            continue;
        }
        if same_schema {
            dst.write_frame_index(frame, &trcs, &hdrs, fold)?;
        } else {
            for i in 1..=fold {
                header::copy_record(
                    &src.schema,
                    header::record(&hdrs, src.schema.header_length(), i),
                    &dst.schema,
                    header::record_mut(&mut translated, dst.schema.header_length(), i),
                )?;
            }
            dst.write_frame_index(frame, &trcs, &translated, fold)?;
        }
    }
    Ok(())
}

/// Move a dataset: copy then remove the source.
pub fn mv(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    copy(src.as_ref(), dst)?;
    Dataset::open(src)?.remove()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_dataset(dir: &Path) -> Dataset {
        Dataset::create(dir.join("test.js"), CreateOptions::new(&[16, 8, 4])).unwrap()
    }

    /// Fill a full frame: every trace live, samples `100*trace + sample`,
    /// frame-axis properties set to `addr`.
    fn fill_frame(ds: &Dataset, addr: &[i64], trcs: &mut [f32], hdrs: &mut [u8]) {
        let samples = ds.samples_per_trace();
        let hlen = ds.header_length();
        let order = ds.endianness();
        let trc_type = ds.schema().get("TRC_TYPE").unwrap();
        let trace_label = ds.axis(1).label.clone();
        let trace_prop = ds.schema().get(&trace_label).unwrap();
        for t in 1..=ds.traces_per_frame() {
            for s in 0..samples {
                trcs[(t - 1) * samples + s] = (100 * t + s) as f32;
            }
            let rec = header::record_mut(hdrs, hlen, t);
            header::set_int(rec, trc_type, order, TraceType::Live.as_i32() as i64).unwrap();
            header::set_int(rec, trace_prop, order, ds.axis(1).logical_coord(t)).unwrap();
            for (axis, &coord) in ds.axes()[2..].iter().zip(addr) {
                let prop = ds.schema().get(&axis.label).unwrap();
                header::set_int(rec, prop, order, coord).unwrap();
            }
        }
    }

    #[test]
    fn test_create_and_reopen() {
        let dir = TempDir::new().unwrap();
        let ds = small_dataset(dir.path());
        assert!(ds.is_writable());
        assert_eq!(ds.total_frames(), 4);
        assert!(!ds.has_traces());
        drop(ds);

        let back = Dataset::open(dir.path().join("test.js")).unwrap();
        assert!(!back.is_writable());
        assert_eq!(back.ndim(), 3);
        assert_eq!(back.samples_per_trace(), 16);
        assert_eq!(back.traces_per_frame(), 8);
        assert_eq!(back.axis(2).label, "FRAME");
        assert!(back.schema().contains("TRC_TYPE"));
        assert!(back.schema().contains("FRAME"));
    }

    #[test]
    fn test_bad_mode_string() {
        let dir = TempDir::new().unwrap();
        small_dataset(dir.path());
        assert!(matches!(
            Dataset::open_mode(dir.path().join("test.js"), "a+").unwrap_err(),
            JsError::Precondition(_)
        ));
    }

    #[test]
    fn test_frame_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut ds = small_dataset(dir.path());
        let mut trcs = ds.alloc_frame_trcs();
        let mut hdrs = ds.alloc_frame_hdrs();
        fill_frame(&ds, &[2], &mut trcs, &mut hdrs);
        assert_eq!(ds.write_frame(&trcs, &hdrs).unwrap(), 8);
        assert!(ds.has_traces());

        let mut rtrcs = ds.alloc_frame_trcs();
        let mut rhdrs = ds.alloc_frame_hdrs();
        assert_eq!(ds.read_frame(2, &mut rtrcs, &mut rhdrs).unwrap(), 8);
        assert_eq!(trcs, rtrcs);
        assert_eq!(hdrs, rhdrs);
        assert_eq!(ds.fold(2).unwrap(), 8);
        assert_eq!(ds.fold(1).unwrap(), 0);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = TempDir::new().unwrap();
        drop(small_dataset(dir.path()));
        let mut ds = Dataset::open(dir.path().join("test.js")).unwrap();
        let mut trcs = ds.alloc_frame_trcs();
        let mut hdrs = ds.alloc_frame_hdrs();
        fill_frame(&ds, &[1], &mut trcs, &mut hdrs);
        assert!(matches!(
            ds.write_frame_index(1, &trcs, &hdrs, 8).unwrap_err(),
            JsError::Precondition(_)
        ));
    }

    #[test]
    fn test_leftjust_preserves_relative_order() {
        let dir = TempDir::new().unwrap();
        let ds = small_dataset(dir.path());
        let mut trcs = ds.alloc_frame_trcs();
        let mut hdrs = ds.alloc_frame_hdrs();
        fill_frame(&ds, &[1], &mut trcs, &mut hdrs);

        // kill traces 1, 3, 5..8 leaving 2 and 4 live
        let order = ds.endianness();
        let trc_type = ds.schema().get("TRC_TYPE").unwrap();
        for t in [1, 3, 5, 6, 7, 8] {
            let rec = header::record_mut(&mut hdrs, ds.header_length(), t);
            header::set_int(rec, trc_type, order, TraceType::Dead.as_i32() as i64).unwrap();
        }

        let fold = ds.leftjust(&mut trcs, &mut hdrs).unwrap();
        assert_eq!(fold, 2);
        let samples = ds.samples_per_trace();
        // columns 1 and 2 now hold former traces 2 and 4, in order
        assert_eq!(trcs[0], 200.0);
        assert_eq!(trcs[samples], 400.0);
        // idempotent
        let again = ds.leftjust(&mut trcs, &mut hdrs).unwrap();
        assert_eq!(again, 2);
        assert_eq!(trcs[0], 200.0);
    }

    #[test]
    fn test_regularize_places_and_fills() {
        let dir = TempDir::new().unwrap();
        let ds = small_dataset(dir.path());
        let samples = ds.samples_per_trace();
        let hlen = ds.header_length();
        let order = ds.endianness();
        let trc_type = ds.schema().get("TRC_TYPE").unwrap();
        let trace_prop = ds.schema().get("TRACE").unwrap();

        // two live traces left-justified, destined for columns 3 and 7
        let mut trcs = ds.alloc_frame_trcs();
        let mut hdrs = ds.alloc_frame_hdrs();
        for (i, dst) in [(1usize, 3i64), (2, 7)] {
            for s in 0..samples {
                trcs[(i - 1) * samples + s] = (dst * 1000) as f32 + s as f32;
            }
            let rec = header::record_mut(&mut hdrs, hlen, i);
            header::set_int(rec, trc_type, order, TraceType::Live.as_i32() as i64).unwrap();
            header::set_int(rec, trace_prop, order, dst).unwrap();
        }

        ds.regularize(&mut trcs, &mut hdrs, 2).unwrap();
        assert_eq!(trcs[2 * samples], 3000.0);
        assert_eq!(trcs[6 * samples], 7000.0);
        for t in [1usize, 2, 4, 5, 6, 8] {
            let rec = header::record(&hdrs, hlen, t);
            assert_eq!(
                header::get_int(rec, trc_type, order).unwrap(),
                TraceType::Dead.as_i32() as i64,
                "column {}",
                t
            );
            assert_eq!(header::get_int(rec, trace_prop, order).unwrap(), t as i64);
            assert!(trcs[(t - 1) * samples..t * samples].iter().all(|&s| s == 0.0));
        }

        // regularize is idempotent: left-justify then regularize again
        let fold_again = ds.leftjust(&mut trcs, &mut hdrs).unwrap();
        assert_eq!(fold_again, 2);
        ds.regularize(&mut trcs, &mut hdrs, fold_again).unwrap();
        assert_eq!(trcs[2 * samples], 3000.0);
        assert_eq!(trcs[6 * samples], 7000.0);

        // an unknown indexing property is a precondition error
        assert!(matches!(
            ds.regularize_by("NO_SUCH", &mut trcs, &mut hdrs, 2).unwrap_err(),
            JsError::Precondition(_)
        ));
    }

    #[test]
    fn test_empty_clears_data_keeps_sidecars() {
        let dir = TempDir::new().unwrap();
        let mut ds = small_dataset(dir.path());
        let mut trcs = ds.alloc_frame_trcs();
        let mut hdrs = ds.alloc_frame_hdrs();
        fill_frame(&ds, &[1], &mut trcs, &mut hdrs);
        ds.write_frame(&trcs, &hdrs).unwrap();

        ds.empty().unwrap();
        assert!(!ds.has_traces());
        for frame in 1..=ds.total_frames() {
            assert_eq!(ds.fold(frame).unwrap(), 0);
        }
        let primary = dir.path().join("test.js");
        assert!(primary.join("FileProperties.xml").exists());
        assert!(primary.join("TraceFile.xml").exists());
        assert!(!primary.join("TraceFile0").exists());
        assert!(!primary.join("TraceHeaders0").exists());
    }

    #[test]
    fn test_remove_deletes_primary() {
        let dir = TempDir::new().unwrap();
        let ds = small_dataset(dir.path());
        let primary = ds.path().to_path_buf();
        ds.remove().unwrap();
        assert!(!primary.exists());
    }

    #[test]
    fn test_copy_and_move() {
        let dir = TempDir::new().unwrap();
        let mut ds = small_dataset(dir.path());
        let mut trcs = ds.alloc_frame_trcs();
        let mut hdrs = ds.alloc_frame_hdrs();
        fill_frame(&ds, &[3], &mut trcs, &mut hdrs);
        ds.write_frame(&trcs, &hdrs).unwrap();
        drop(ds);

        copy(dir.path().join("test.js"), dir.path().join("copy.js")).unwrap();
        let dup = Dataset::open(dir.path().join("copy.js")).unwrap();
        let mut rtrcs = dup.alloc_frame_trcs();
        let mut rhdrs = dup.alloc_frame_hdrs();
        assert_eq!(dup.read_frame(3, &mut rtrcs, &mut rhdrs).unwrap(), 8);
        assert_eq!(trcs, rtrcs);
        assert_eq!(dup.fold(1).unwrap(), 0);
        drop(dup);

        mv(dir.path().join("copy.js"), dir.path().join("moved.js")).unwrap();
        assert!(!dir.path().join("copy.js").exists());
        assert!(Dataset::open(dir.path().join("moved.js")).is_ok());
    }

    #[test]
    fn test_property_edits_need_similar_to() {
        let dir = TempDir::new().unwrap();
        let opts = CreateOptions::new(&[16, 8, 4]).with_properties_rm(&["SKEWSTAT"]);
        assert!(matches!(
            Dataset::create(dir.path().join("bad.js"), opts).unwrap_err(),
            JsError::Precondition(_)
        ));
    }

    #[test]
    fn test_replacement_excludes_edits() {
        let dir = TempDir::new().unwrap();
        small_dataset(dir.path());
        let opts = CreateOptions::similar_to(dir.path().join("test.js"))
            .with_properties(vec![])
            .with_properties_rm(&["SKEWSTAT"]);
        assert!(matches!(
            Dataset::create(dir.path().join("bad.js"), opts).unwrap_err(),
            JsError::Precondition(_)
        ));
    }
}
