//! Sidecar metadata: models and read/write for the primary-directory files
//!
//! `FileProperties.xml` carries the dataset envelope (axes, formats, header
//! schema, custom properties, geometry); `TraceFile.xml` and
//! `TraceHeaders.xml` describe the two extent streams; `VirtualFolders.xml`
//! lists the secondary storage roots; `Name.properties` and
//! `Status.properties` are small text files. Both `.properties` files may be
//! absent in legacy datasets.

use crate::error::{JsError, Result};
use crate::layout;
use crate::parset::{read_parset_file, write_parset_file, ParSet};
use crate::props::AxisLabelDict;
use crate::types::{
    Axis, DataProperty, Endianness, Geometry, PropertyFormat, TraceFormat, TraceProperty,
    TracePropertyDef,
};
use chrono::Utc;
use std::path::Path;

pub const FILE_PROPERTIES_XML: &str = "FileProperties.xml";
pub const TRACE_FILE_XML: &str = "TraceFile.xml";
pub const TRACE_HEADERS_XML: &str = "TraceHeaders.xml";
pub const VIRTUAL_FOLDERS_XML: &str = "VirtualFolders.xml";
pub const NAME_PROPERTIES: &str = "Name.properties";
pub const STATUS_PROPERTIES: &str = "Status.properties";

/// Format version written to new datasets
pub const JAVASEIS_VERSION: &str = "2006.3";
/// Extent manager version written to new datasets
pub const VFIO_VERSION: &str = "2006.2";

/// The dataset envelope stored in `FileProperties.xml`
#[derive(Debug, Clone)]
pub struct FileProperties {
    pub comments: String,
    pub version: String,
    /// Framework data type tag, e.g. "CUSTOM", "CMP" or "STACK"
    pub data_type: String,
    pub trace_format: TraceFormat,
    pub endianness: Endianness,
    pub mapped: bool,
    /// Axes in sample, trace, frame[, volume[, hypercube]] order; labels are
    /// local property labels
    pub axes: Vec<Axis>,
    pub header_length: usize,
}

impl FileProperties {
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn samples_per_trace(&self) -> usize {
        self.axes[0].length
    }

    pub fn traces_per_frame(&self) -> usize {
        self.axes[1].length
    }

    pub fn frames_per_volume(&self) -> u64 {
        self.axes[2].length as u64
    }

    pub fn total_frames(&self) -> u64 {
        layout::total_frames(&self.axes)
    }

    pub fn validate(&self) -> Result<()> {
        if !(3..=5).contains(&self.ndim()) {
            return Err(JsError::Precondition(format!(
                "dataset needs 3 to 5 dimensions, got {}",
                self.ndim()
            )));
        }
        for axis in &self.axes {
            axis.validate()?;
        }
        Ok(())
    }
}

/// The extent stream description stored in `TraceFile.xml` and
/// `TraceHeaders.xml`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentManifest {
    pub extent_size: u64,
    pub max_file: usize,
    pub max_pos: u64,
}

/// Read and assemble the envelope, the placed trace properties, the custom
/// properties and the optional geometry.
pub fn read_file_properties(
    primary: &Path,
    dict: &AxisLabelDict,
) -> Result<(FileProperties, Vec<TraceProperty>, Vec<DataProperty>, Option<Geometry>)> {
    let root = read_parset_file(&primary.join(FILE_PROPERTIES_XML))?;
    let fps = root.child("FileProperties").ok_or_else(|| {
        JsError::Malformed("FileProperties.xml has no FileProperties parset".to_string())
    })?;

    let ndim = fps.int("DataDimensions")? as usize;
    let labels = fps.strings("AxisLabels")?;
    let units = fps.strings("AxisUnits")?;
    let domains = fps.strings("AxisDomains")?;
    let lengths = fps.ints("AxisLengths")?;
    let lorigins = fps.ints("LogicalOrigins")?;
    let ldeltas = fps.ints("LogicalDeltas")?;
    let porigins = fps.floats("PhysicalOrigins")?;
    let pdeltas = fps.floats("PhysicalDeltas")?;
    for (name, len) in [
        ("AxisLabels", labels.len()),
        ("AxisUnits", units.len()),
        ("AxisDomains", domains.len()),
        ("AxisLengths", lengths.len()),
        ("LogicalOrigins", lorigins.len()),
        ("LogicalDeltas", ldeltas.len()),
        ("PhysicalOrigins", porigins.len()),
        ("PhysicalDeltas", pdeltas.len()),
    ] {
        if len != ndim {
            return Err(JsError::Malformed(format!(
                "{} holds {} entries for {} dimensions",
                name, len, ndim
            )));
        }
    }

    let axes = (0..ndim)
        .map(|i| Axis {
            label: dict.local_label(&labels[i]).to_string(),
            unit: units[i].clone(),
            domain: domains[i].clone(),
            length: lengths[i] as usize,
            logical_origin: lorigins[i],
            logical_delta: ldeltas[i],
            physical_origin: porigins[i],
            physical_delta: pdeltas[i],
        })
        .collect();

    let fp = FileProperties {
        comments: fps.string("Comments").unwrap_or_default(),
        version: fps.string("JavaSeisVersion")?,
        data_type: fps.string("DataType")?,
        trace_format: TraceFormat::from_name(&fps.string("TraceFormat")?)?,
        endianness: Endianness::from_name(&fps.string("ByteOrder")?)?,
        mapped: fps.bool_par("Mapped")?,
        axes,
        header_length: fps.int("HeaderLengthBytes")? as usize,
    };
    fp.validate()?;

    let tps = root.child("TraceProperties").ok_or_else(|| {
        JsError::Malformed("FileProperties.xml has no TraceProperties parset".to_string())
    })?;
    let mut props = Vec::new();
    for entry in &tps.children {
        let def = TracePropertyDef::new(
            entry.string("label")?,
            entry.string("description")?,
            PropertyFormat::from_name(&entry.string("format")?)?,
            entry.int("elementCount")? as usize,
        );
        props.push(TraceProperty::new(def, entry.int("byteOffset")? as usize));
    }

    let mut data_props = Vec::new();
    let mut geometry = None;
    if let Some(custom) = root.child("CustomProperties") {
        for par in &custom.pars {
            data_props.push(DataProperty::new(&par.name, &par.ptype, par.value.clone()));
        }
        if let Some(geom) = custom.child("Geometry") {
            geometry = Some(read_geometry(geom)?);
        }
    }

    Ok((fp, props, data_props, geometry))
}

/// Emit `FileProperties.xml` for a dataset.
pub fn write_file_properties(
    primary: &Path,
    fp: &FileProperties,
    props: &[TraceProperty],
    data_props: &[DataProperty],
    geometry: Option<&Geometry>,
    dict: &AxisLabelDict,
) -> Result<()> {
    let mut fps = ParSet::new("FileProperties");
    fps.add_string("Comments", &fp.comments);
    fps.add_string("JavaSeisVersion", &fp.version);
    fps.add_string("DataType", &fp.data_type);
    fps.add_string("TraceFormat", fp.trace_format.name());
    fps.add_string("ByteOrder", fp.endianness.name());
    fps.add_bool("Mapped", fp.mapped);
    fps.add_int("DataDimensions", "int", fp.ndim() as i64);
    let labels: Vec<String> = fp
        .axes
        .iter()
        .map(|a| dict.axis_label(&a.label).to_string())
        .collect();
    fps.add_strings("AxisLabels", &labels);
    let units: Vec<String> = fp.axes.iter().map(|a| a.unit.clone()).collect();
    fps.add_strings("AxisUnits", &units);
    let domains: Vec<String> = fp.axes.iter().map(|a| a.domain.clone()).collect();
    fps.add_strings("AxisDomains", &domains);
    let lengths: Vec<i64> = fp.axes.iter().map(|a| a.length as i64).collect();
    fps.add_ints("AxisLengths", "long", &lengths);
    let lorigins: Vec<i64> = fp.axes.iter().map(|a| a.logical_origin).collect();
    fps.add_ints("LogicalOrigins", "long", &lorigins);
    let ldeltas: Vec<i64> = fp.axes.iter().map(|a| a.logical_delta).collect();
    fps.add_ints("LogicalDeltas", "long", &ldeltas);
    let porigins: Vec<f64> = fp.axes.iter().map(|a| a.physical_origin).collect();
    fps.add_floats("PhysicalOrigins", &porigins);
    let pdeltas: Vec<f64> = fp.axes.iter().map(|a| a.physical_delta).collect();
    fps.add_floats("PhysicalDeltas", &pdeltas);
    fps.add_int("HeaderLengthBytes", "int", fp.header_length as i64);

    let mut tps = ParSet::new("TraceProperties");
    for (i, prop) in props.iter().enumerate() {
        let mut entry = ParSet::new(format!("entry_{}", i + 1));
        entry.add_string("label", prop.label());
        entry.add_string("description", &prop.def.description);
        entry.add_string("format", prop.def.format.name());
        entry.add_int("elementCount", "int", prop.def.count as i64);
        entry.add_int("byteOffset", "int", prop.offset as i64);
        tps.add_child(entry);
    }

    let mut custom = ParSet::new("CustomProperties");
    for dp in data_props {
        custom.add_par(&dp.label, &dp.ptype, dp.value.clone());
    }
    if let Some(geom) = geometry {
        custom.add_child(write_geometry(geom));
    }

    let mut root = ParSet::new("JavaSeis Metadata");
    root.add_child(fps);
    root.add_child(tps);
    root.add_child(custom);
    write_parset_file(&primary.join(FILE_PROPERTIES_XML), &root)
}

fn read_geometry(parset: &ParSet) -> Result<Geometry> {
    Ok(Geometry {
        min_i_line: parset.int("minILine")?,
        max_i_line: parset.int("maxILine")?,
        min_x_line: parset.int("minXLine")?,
        max_x_line: parset.int("maxXLine")?,
        x_i_line1_start: parset.float("xILine1Start")?,
        y_i_line1_start: parset.float("yILine1Start")?,
        x_i_line1_end: parset.float("xILine1End")?,
        y_i_line1_end: parset.float("yILine1End")?,
        x_x_line1_end: parset.float("xXLine1End")?,
        y_x_line1_end: parset.float("yXLine1End")?,
    })
}

fn write_geometry(geom: &Geometry) -> ParSet {
    let mut parset = ParSet::new("Geometry");
    parset.add_int("minILine", "long", geom.min_i_line);
    parset.add_int("maxILine", "long", geom.max_i_line);
    parset.add_int("minXLine", "long", geom.min_x_line);
    parset.add_int("maxXLine", "long", geom.max_x_line);
    parset.add_float("xILine1Start", geom.x_i_line1_start);
    parset.add_float("yILine1Start", geom.y_i_line1_start);
    parset.add_float("xILine1End", geom.x_i_line1_end);
    parset.add_float("yILine1End", geom.y_i_line1_end);
    parset.add_float("xXLine1End", geom.x_x_line1_end);
    parset.add_float("yXLine1End", geom.y_x_line1_end);
    parset
}

/// Read the extent stream description of `TraceFile.xml` or
/// `TraceHeaders.xml`.
pub fn read_extent_manifest(primary: &Path, ext_name: &str) -> Result<ExtentManifest> {
    let file = format!("{}.xml", ext_name);
    let root = read_parset_file(&primary.join(&file))?;
    let declared = root.string("VFIO_EXTNAME")?;
    if declared != ext_name {
        return Err(JsError::Malformed(format!(
            "{} declares extent name {}",
            file, declared
        )));
    }
    let extent_size = root.int("VFIO_EXTSIZE")?;
    let max_pos = root.int("VFIO_MAXPOS")?;
    if extent_size <= 0 || max_pos < 0 {
        return Err(JsError::Malformed(format!(
            "{} declares inconsistent extent sizes",
            file
        )));
    }
    Ok(ExtentManifest {
        extent_size: extent_size as u64,
        max_file: root.int("VFIO_MAXFILE")? as usize,
        max_pos: max_pos as u64,
    })
}

/// Emit `TraceFile.xml` or `TraceHeaders.xml`.
pub fn write_extent_manifest(
    primary: &Path,
    ext_name: &str,
    manifest: &ExtentManifest,
) -> Result<()> {
    let mut root = ParSet::new("ExtentManager");
    root.add_string("VFIO_VERSION", VFIO_VERSION);
    root.add_int("VFIO_EXTSIZE", "long", manifest.extent_size as i64);
    root.add_int("VFIO_MAXFILE", "int", manifest.max_file as i64);
    root.add_int("VFIO_MAXPOS", "long", manifest.max_pos as i64);
    root.add_string("VFIO_EXTNAME", ext_name);
    root.add_string("VFIO_POLICY", "RANDOM");
    write_parset_file(&primary.join(format!("{}.xml", ext_name)), &root)
}

/// Read the secondary storage roots of `VirtualFolders.xml`.
pub fn read_virtual_folders(primary: &Path) -> Result<Vec<String>> {
    let root = read_parset_file(&primary.join(VIRTUAL_FOLDERS_XML))?;
    let ndir = root.int("NDIR")? as usize;
    let mut secondaries = Vec::with_capacity(ndir);
    for i in 0..ndir {
        let entry = root.string(&format!("FILESYSTEM-{}", i))?;
        let path = entry.rsplit_once(',').map(|(p, _)| p).unwrap_or(&entry);
        secondaries.push(path.to_string());
    }
    if secondaries.is_empty() {
        return Err(JsError::Malformed(
            "VirtualFolders.xml lists no filesystems".to_string(),
        ));
    }
    Ok(secondaries)
}

/// Emit `VirtualFolders.xml`.
pub fn write_virtual_folders(
    primary: &Path,
    secondaries: &[String],
    required_free_space: u64,
) -> Result<()> {
    let mut root = ParSet::new("VirtualFolders");
    root.add_int("NDIR", "int", secondaries.len() as i64);
    for (i, secondary) in secondaries.iter().enumerate() {
        root.add_string(&format!("FILESYSTEM-{}", i), &format!("{},READ_WRITE", secondary));
    }
    root.add_string("Version", VFIO_VERSION);
    root.add_string("Header", "VFIO org.javaseis.io.VirtualFolder 2006.2");
    root.add_string("Type", "SS");
    root.add_string("POLICY_ID", "RANDOM");
    root.add_int("GLOBAL_REQUIRED_FREE_SPACE", "long", required_free_space as i64);
    write_parset_file(&primary.join(VIRTUAL_FOLDERS_XML), &root)
}

/// Read the descriptive name; an absent file yields an empty name.
pub fn read_descriptive_name(primary: &Path) -> Result<String> {
    let path = primary.join(NAME_PROPERTIES);
    if !path.exists() {
        return Ok(String::new());
    }
    let text = std::fs::read_to_string(&path)?;
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("DescriptiveName=") {
            return Ok(value.trim().to_string());
        }
    }
    Ok(String::new())
}

/// Emit `Name.properties`.
pub fn write_descriptive_name(primary: &Path, name: &str) -> Result<()> {
    let text = format!(
        "# JavaSeis dataset name properties\n# {}\nDescriptiveName={}\n",
        Utc::now().format("%a %b %d %H:%M:%S %Z %Y"),
        name
    );
    std::fs::write(primary.join(NAME_PROPERTIES), text)?;
    Ok(())
}

/// Read the has-traces flag; an absent file (legacy datasets) yields false.
pub fn read_has_traces(primary: &Path) -> Result<bool> {
    let path = primary.join(STATUS_PROPERTIES);
    if !path.exists() {
        return Ok(false);
    }
    let text = std::fs::read_to_string(&path)?;
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("HasTraces=") {
            return Ok(value.trim() == "true");
        }
    }
    Ok(false)
}

/// Emit `Status.properties`.
pub fn write_has_traces(primary: &Path, has_traces: bool) -> Result<()> {
    std::fs::write(
        primary.join(STATUS_PROPERTIES),
        format!("HasTraces={}\n", has_traces),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{stock_props, HeaderSchema};
    use tempfile::TempDir;

    fn sample_properties() -> FileProperties {
        let mut sample = Axis::new("TIME", 128);
        sample.unit = "seconds".to_string();
        sample.domain = "time".to_string();
        sample.physical_delta = 0.004;
        let mut xline = Axis::new("XLINE_NO", 64);
        xline.logical_origin = 100;
        let iline = Axis::new("ILINE_NO", 10);
        FileProperties {
            comments: "unit test".to_string(),
            version: JAVASEIS_VERSION.to_string(),
            data_type: "CUSTOM".to_string(),
            trace_format: TraceFormat::Float,
            endianness: Endianness::Little,
            mapped: true,
            axes: vec![sample, xline, iline],
            header_length: stock_props().iter().map(|p| p.size_in_bytes()).sum(),
        }
    }

    #[test]
    fn test_file_properties_roundtrip() {
        let dir = TempDir::new().unwrap();
        let dict = AxisLabelDict::default();
        let fp = sample_properties();
        let schema = HeaderSchema::build(&stock_props());
        let props: Vec<TraceProperty> = schema.iter().cloned().collect();
        let data_props = vec![DataProperty::new("Stacked", "boolean", "true")];
        let geometry = Geometry {
            min_i_line: 1,
            max_i_line: 10,
            min_x_line: 100,
            max_x_line: 163,
            x_i_line1_start: 1000.0,
            y_i_line1_start: 2000.0,
            x_i_line1_end: 1630.0,
            y_i_line1_end: 2000.0,
            x_x_line1_end: 1000.0,
            y_x_line1_end: 2100.0,
        };

        write_file_properties(dir.path(), &fp, &props, &data_props, Some(&geometry), &dict)
            .unwrap();

        // the dictionary translates survey labels on the way out and back
        let text = std::fs::read_to_string(dir.path().join(FILE_PROPERTIES_XML)).unwrap();
        assert!(text.contains("\"CROSSLINE\""));
        assert!(text.contains("\"INLINE\""));
        assert!(!text.starts_with("<?xml"));

        let (back, back_props, back_data, back_geom) =
            read_file_properties(dir.path(), &dict).unwrap();
        assert_eq!(back.axes[1].label, "XLINE_NO");
        assert_eq!(back.axes[1].logical_origin, 100);
        assert_eq!(back.axes[0].physical_delta, 0.004);
        assert_eq!(back.trace_format, TraceFormat::Float);
        assert_eq!(back.header_length, fp.header_length);
        assert_eq!(back_props.len(), props.len());
        assert_eq!(back_data, data_props);
        assert_eq!(back_geom, Some(geometry));
    }

    #[test]
    fn test_extent_manifest_roundtrip() {
        let dir = TempDir::new().unwrap();
        let manifest = ExtentManifest {
            extent_size: 98304,
            max_file: 11,
            max_pos: 327679,
        };
        write_extent_manifest(dir.path(), "TraceFile", &manifest).unwrap();
        assert_eq!(read_extent_manifest(dir.path(), "TraceFile").unwrap(), manifest);

        // a manifest declaring the wrong extent name is malformed
        std::fs::copy(
            dir.path().join("TraceFile.xml"),
            dir.path().join("TraceHeaders.xml"),
        )
        .unwrap();
        assert!(matches!(
            read_extent_manifest(dir.path(), "TraceHeaders").unwrap_err(),
            JsError::Malformed(_)
        ));
    }

    #[test]
    fn test_virtual_folders_roundtrip() {
        let dir = TempDir::new().unwrap();
        let secondaries = vec![".".to_string(), "/mnt/pool1".to_string()];
        write_virtual_folders(dir.path(), &secondaries, 0).unwrap();
        assert_eq!(read_virtual_folders(dir.path()).unwrap(), secondaries);
    }

    #[test]
    fn test_legacy_properties_files() {
        let dir = TempDir::new().unwrap();
        // both .properties files absent: defaults, not errors
        assert_eq!(read_descriptive_name(dir.path()).unwrap(), "");
        assert!(!read_has_traces(dir.path()).unwrap());

        write_descriptive_name(dir.path(), "north sea line 42").unwrap();
        write_has_traces(dir.path(), true).unwrap();
        assert_eq!(
            read_descriptive_name(dir.path()).unwrap(),
            "north sea line 42"
        );
        assert!(read_has_traces(dir.path()).unwrap());
    }
}
