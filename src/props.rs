//! Stock trace properties, the axis-label dictionary and the header schema

use crate::error::{JsError, Result};
use crate::types::{PropertyFormat, TraceProperty, TracePropertyDef};
use std::collections::HashMap;

/// The minimal property set present in every header schema, in schema order.
pub fn stock_props() -> Vec<TracePropertyDef> {
    use PropertyFormat::{Float32, Int32};
    vec![
        TracePropertyDef::new("SEQNO", "Sequence number in ensemble", Int32, 1),
        TracePropertyDef::new("END_ENS", "End-of-ensemble flag", Int32, 1),
        TracePropertyDef::new("EOJ", "End of job flag", Int32, 1),
        TracePropertyDef::new("TRACENO", "Trace number in seismic line", Int32, 1),
        TracePropertyDef::new("TRC_TYPE", "Trace type (data, aux, etc.)", Int32, 1),
        TracePropertyDef::new("TLIVE_S", "Start time of live samples", Float32, 1),
        TracePropertyDef::new("TFULL_S", "Start time of full samples", Float32, 1),
        TracePropertyDef::new("TFULL_E", "End time of full samples", Float32, 1),
        TracePropertyDef::new("TLIVE_E", "End time of live samples", Float32, 1),
        TracePropertyDef::new("LEN_SURG", "Length of surgical mute taper", Float32, 1),
        TracePropertyDef::new("TOT_STAT", "Total static for this trace", Float32, 1),
        TracePropertyDef::new("NA_STAT", "Portion of static not applied", Float32, 1),
        TracePropertyDef::new("AMP_NORM", "Amplitude normalization factor", Float32, 1),
        TracePropertyDef::new("TR_FOLD", "Actual trace fold", Float32, 1),
        TracePropertyDef::new("SKEWSTAT", "Multiplex skew static", Float32, 1),
        TracePropertyDef::new("LINE_NO", "Line number", Int32, 1),
        TracePropertyDef::new("LSEG_END", "Line segment end", Int32, 1),
        TracePropertyDef::new("LSEG_SEQ", "Line segment sequence number", Int32, 1),
    ]
}

/// Stock definition for a framework or survey axis property, if one exists.
pub fn stock_axis_prop(label: &str) -> Option<TracePropertyDef> {
    use PropertyFormat::Int32;
    let def = match label {
        "TRACE" => TracePropertyDef::new("TRACE", "Trace index within frame", Int32, 1),
        "FRAME" => TracePropertyDef::new("FRAME", "Frame index within volume", Int32, 1),
        "VOLUME" => TracePropertyDef::new("VOLUME", "Volume index within hypercube", Int32, 1),
        "HYPRCUBE" => TracePropertyDef::new("HYPRCUBE", "Hypercube index", Int32, 1),
        "ILINE_NO" => TracePropertyDef::new("ILINE_NO", "3D inline number", Int32, 1),
        "XLINE_NO" => TracePropertyDef::new("XLINE_NO", "3D crossline number", Int32, 1),
        "CDP" => TracePropertyDef::new("CDP", "CDP bin number", Int32, 1),
        "S_LINE" => TracePropertyDef::new("S_LINE", "Sail line number", Int32, 1),
        _ => return None,
    };
    Some(def)
}

/// Default axis labels by dimensionality: sample, trace, then frame axes.
pub const DEFAULT_AXIS_LABELS: [&str; 5] = ["TIME", "TRACE", "FRAME", "VOLUME", "HYPRCUBE"];

/// Lookup table between local property labels and the axis labels the parent
/// processing system writes to `AxisLabels`.
///
/// Consulted in both directions: on read to resolve axis labels back to
/// trace properties, on write to emit the canonical labels.
#[derive(Debug, Clone)]
pub struct AxisLabelDict {
    to_axis: HashMap<String, String>,
    to_local: HashMap<String, String>,
}

impl AxisLabelDict {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let mut to_axis = HashMap::new();
        let mut to_local = HashMap::new();
        for (local, axis) in pairs {
            to_axis.insert(local.to_string(), axis.to_string());
            to_local.insert(axis.to_string(), local.to_string());
        }
        Self { to_axis, to_local }
    }

    /// Axis label emitted for a local property label
    pub fn axis_label<'a>(&'a self, local: &'a str) -> &'a str {
        self.to_axis.get(local).map(String::as_str).unwrap_or(local)
    }

    /// Local property label for an axis label read from metadata
    pub fn local_label<'a>(&'a self, axis: &'a str) -> &'a str {
        self.to_local.get(axis).map(String::as_str).unwrap_or(axis)
    }
}

impl Default for AxisLabelDict {
    fn default() -> Self {
        Self::new(&[
            ("ILINE_NO", "INLINE"),
            ("XLINE_NO", "CROSSLINE"),
            ("CDP", "CMP"),
            ("S_LINE", "SAIL_LINE"),
        ])
    }
}

/// An ordered list of trace properties whose byte ranges partition
/// `[0, header_length)`.
#[derive(Debug, Clone)]
pub struct HeaderSchema {
    props: Vec<TraceProperty>,
    header_length: usize,
}

impl HeaderSchema {
    /// Build a schema from definitions, assigning each property the running
    /// byte offset. Duplicate labels keep the first definition.
    pub fn build(defs: &[TracePropertyDef]) -> Self {
        let mut props: Vec<TraceProperty> = Vec::with_capacity(defs.len());
        let mut offset = 0;
        for def in defs {
            if props.iter().any(|p| p.label() == def.label) {
                continue;
            }
            let size = def.size_in_bytes();
            props.push(TraceProperty::new(def.clone(), offset));
            offset += size;
        }
        Self {
            props,
            header_length: offset,
        }
    }

    /// Reassemble a schema from placed properties read from metadata,
    /// verifying that the byte ranges are disjoint and cover
    /// `[0, header_length)` contiguously.
    pub fn from_entries(mut props: Vec<TraceProperty>, header_length: usize) -> Result<Self> {
        props.sort_by_key(|p| p.offset);
        let mut expected = 0;
        for prop in &props {
            if prop.offset != expected {
                return Err(JsError::Malformed(format!(
                    "trace property {} at byte {} leaves a gap or overlap (expected {})",
                    prop.label(),
                    prop.offset,
                    expected
                )));
            }
            expected += prop.def.size_in_bytes();
        }
        if expected != header_length {
            return Err(JsError::Malformed(format!(
                "trace properties cover {} bytes but header length is {}",
                expected, header_length
            )));
        }
        Ok(Self {
            props,
            header_length,
        })
    }

    /// Header record size in bytes
    pub fn header_length(&self) -> usize {
        self.header_length
    }

    /// Number of properties in the schema
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceProperty> {
        self.props.iter()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.props.iter().any(|p| p.label() == label)
    }

    pub fn find(&self, label: &str) -> Option<&TraceProperty> {
        self.props.iter().find(|p| p.label() == label)
    }

    /// Look up a property by label
    pub fn get(&self, label: &str) -> Result<&TraceProperty> {
        self.find(label)
            .ok_or_else(|| JsError::NotFound(format!("trace property {}", label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_set_contains_required_fields() {
        let stock = stock_props();
        for label in ["SEQNO", "TRACENO", "TRC_TYPE", "TR_FOLD", "TOT_STAT", "LINE_NO"] {
            assert!(stock.iter().any(|p| p.label == label), "missing {}", label);
        }
    }

    #[test]
    fn test_schema_offsets_partition() {
        let schema = HeaderSchema::build(&stock_props());
        let mut expected = 0;
        for prop in schema.iter() {
            assert_eq!(prop.offset, expected);
            expected += prop.def.size_in_bytes();
        }
        assert_eq!(schema.header_length(), expected);
        // 18 scalar int32/float32 properties
        assert_eq!(schema.header_length(), 18 * 4);
    }

    #[test]
    fn test_schema_dedupes_by_label() {
        let mut defs = stock_props();
        defs.push(TracePropertyDef::new(
            "TRC_TYPE",
            "duplicate",
            PropertyFormat::Int64,
            1,
        ));
        let schema = HeaderSchema::build(&defs);
        assert_eq!(schema.len(), stock_props().len());
        assert_eq!(
            schema.get("TRC_TYPE").unwrap().def.format,
            PropertyFormat::Int32
        );
    }

    #[test]
    fn test_from_entries_rejects_gaps() {
        let schema = HeaderSchema::build(&stock_props());
        let mut props: Vec<TraceProperty> = schema.iter().cloned().collect();
        props.remove(3);
        assert!(HeaderSchema::from_entries(props, schema.header_length()).is_err());
    }

    #[test]
    fn test_axis_label_dict() {
        let dict = AxisLabelDict::default();
        assert_eq!(dict.axis_label("XLINE_NO"), "CROSSLINE");
        assert_eq!(dict.local_label("INLINE"), "ILINE_NO");
        // unknown labels pass through
        assert_eq!(dict.axis_label("TRACE"), "TRACE");
        assert_eq!(dict.local_label("FRAME"), "FRAME");
    }
}
