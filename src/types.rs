//! Core data types for JavaSeis datasets

use crate::error::{JsError, Result};
use std::fmt;

/// On-disk trace sample formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    /// Uncompressed 32-bit floats
    Float,
    /// Uncompressed 64-bit floats (recognized, not supported end-to-end)
    Double,
    /// Fixed-point 32-bit compression (recognized, not supported end-to-end)
    CompressedInt32,
    /// Fixed-point 16-bit compression with a per-trace scale
    CompressedInt16,
}

impl TraceFormat {
    /// On-disk name written to `FileProperties.xml`
    pub fn name(&self) -> &'static str {
        match self {
            TraceFormat::Float => "FLOAT",
            TraceFormat::Double => "DOUBLE",
            TraceFormat::CompressedInt32 => "COMPRESSED_INT32",
            TraceFormat::CompressedInt16 => "COMPRESSED_INT16",
        }
    }

    /// Parse an on-disk format name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "FLOAT" => Ok(TraceFormat::Float),
            "DOUBLE" => Ok(TraceFormat::Double),
            "COMPRESSED_INT32" => Ok(TraceFormat::CompressedInt32),
            "COMPRESSED_INT16" => Ok(TraceFormat::CompressedInt16),
            _ => Err(JsError::Precondition(format!(
                "unknown trace format: {}",
                name
            ))),
        }
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Scalar formats a trace property may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyFormat {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    ByteString,
}

impl PropertyFormat {
    /// Size in bytes of one element of this format
    pub fn size_in_bytes(&self) -> usize {
        match self {
            PropertyFormat::Int16 => 2,
            PropertyFormat::Int32 | PropertyFormat::Float32 => 4,
            PropertyFormat::Int64 | PropertyFormat::Float64 => 8,
            PropertyFormat::ByteString => 1,
        }
    }

    /// On-disk name written to the `TraceProperties` parset
    pub fn name(&self) -> &'static str {
        match self {
            PropertyFormat::Int16 => "SHORT",
            PropertyFormat::Int32 => "INTEGER",
            PropertyFormat::Int64 => "LONG",
            PropertyFormat::Float32 => "FLOAT",
            PropertyFormat::Float64 => "DOUBLE",
            PropertyFormat::ByteString => "BYTESTRING",
        }
    }

    /// Parse an on-disk format name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "SHORT" => Ok(PropertyFormat::Int16),
            "INTEGER" => Ok(PropertyFormat::Int32),
            "LONG" => Ok(PropertyFormat::Int64),
            "FLOAT" => Ok(PropertyFormat::Float32),
            "DOUBLE" => Ok(PropertyFormat::Float64),
            "BYTESTRING" => Ok(PropertyFormat::ByteString),
            _ => Err(JsError::Malformed(format!(
                "unknown property format: {}",
                name
            ))),
        }
    }

    /// Check if this is a signed integer format
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PropertyFormat::Int16 | PropertyFormat::Int32 | PropertyFormat::Int64
        )
    }

    /// Check if this is a floating point format
    pub fn is_float(&self) -> bool {
        matches!(self, PropertyFormat::Float32 | PropertyFormat::Float64)
    }
}

/// Byte order of numeric header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn name(&self) -> &'static str {
        match self {
            Endianness::Little => "LITTLE_ENDIAN",
            Endianness::Big => "BIG_ENDIAN",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "LITTLE_ENDIAN" => Ok(Endianness::Little),
            "BIG_ENDIAN" => Ok(Endianness::Big),
            _ => Err(JsError::Malformed(format!("unknown byte order: {}", name))),
        }
    }
}

/// Trace type stored in the stock `TRC_TYPE` header field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TraceType {
    Live = 1,
    Dead = 2,
    Aux = 3,
}

impl TraceType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(TraceType::Live),
            2 => Some(TraceType::Dead),
            3 => Some(TraceType::Aux),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

/// One framework axis: bin count plus logical and physical coordinate grids
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Label of the trace property that indexes this axis
    pub label: String,
    /// Unit of measurement (e.g. "seconds", "meters", "unknown")
    pub unit: String,
    /// Data domain (e.g. "time", "space", "unknown")
    pub domain: String,
    /// Number of bins along this axis
    pub length: usize,
    /// First logical (integer grid) coordinate
    pub logical_origin: i64,
    /// Logical grid step, never zero
    pub logical_delta: i64,
    /// First physical coordinate
    pub physical_origin: f64,
    /// Physical step between bins
    pub physical_delta: f64,
}

impl Axis {
    /// Create an axis with default coordinate grids
    pub fn new(label: impl Into<String>, length: usize) -> Self {
        Self {
            label: label.into(),
            unit: "unknown".to_string(),
            domain: "unknown".to_string(),
            length,
            logical_origin: 1,
            logical_delta: 1,
            physical_origin: 0.0,
            physical_delta: 1.0,
        }
    }

    /// Validate the axis invariants
    pub fn validate(&self) -> Result<()> {
        if self.length < 1 {
            return Err(JsError::Precondition(format!(
                "axis {} has zero length",
                self.label
            )));
        }
        if self.logical_delta == 0 {
            return Err(JsError::Precondition(format!(
                "axis {} has zero logical delta",
                self.label
            )));
        }
        Ok(())
    }

    /// Map a logical coordinate to a 1-based grid index
    pub fn grid_index(&self, logical: i64) -> Result<usize> {
        let span = logical - self.logical_origin;
        if span % self.logical_delta != 0 {
            return Err(JsError::Precondition(format!(
                "coordinate {} not on the logical grid of axis {}",
                logical, self.label
            )));
        }
        let grid = span / self.logical_delta;
        if grid < 0 || grid as usize >= self.length {
            return Err(JsError::Precondition(format!(
                "coordinate {} outside axis {} ({} bins from {} by {})",
                logical, self.label, self.length, self.logical_origin, self.logical_delta
            )));
        }
        Ok(grid as usize + 1)
    }

    /// Map a 1-based grid index back to its logical coordinate
    pub fn logical_coord(&self, grid: usize) -> i64 {
        self.logical_origin + (grid as i64 - 1) * self.logical_delta
    }

    /// Map a 1-based grid index to its physical coordinate
    pub fn physical_coord(&self, grid: usize) -> f64 {
        self.physical_origin + (grid as f64 - 1.0) * self.physical_delta
    }
}

/// Definition of a trace property: label, description, format, element count
#[derive(Debug, Clone)]
pub struct TracePropertyDef {
    pub label: String,
    pub description: String,
    pub format: PropertyFormat,
    pub count: usize,
}

impl TracePropertyDef {
    pub fn new(
        label: impl Into<String>,
        description: impl Into<String>,
        format: PropertyFormat,
        count: usize,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            format,
            count,
        }
    }

    /// Total size in bytes of this property inside the header record
    pub fn size_in_bytes(&self) -> usize {
        self.format.size_in_bytes() * self.count
    }
}

impl PartialEq for TracePropertyDef {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

/// A property definition placed at a byte offset inside the header record
#[derive(Debug, Clone)]
pub struct TraceProperty {
    pub def: TracePropertyDef,
    pub offset: usize,
}

impl TraceProperty {
    pub fn new(def: TracePropertyDef, offset: usize) -> Self {
        Self { def, offset }
    }

    pub fn label(&self) -> &str {
        &self.def.label
    }

    /// Byte range this property occupies inside the header record
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.def.size_in_bytes()
    }
}

impl PartialEq for TraceProperty {
    fn eq(&self, other: &Self) -> bool {
        self.def.label == other.def.label
    }
}

/// Optional three-point survey orientation record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub min_i_line: i64,
    pub max_i_line: i64,
    pub min_x_line: i64,
    pub max_x_line: i64,
    pub x_i_line1_start: f64,
    pub y_i_line1_start: f64,
    pub x_i_line1_end: f64,
    pub y_i_line1_end: f64,
    pub x_x_line1_end: f64,
    pub y_x_line1_end: f64,
}

/// One entry of the `CustomProperties` parset
#[derive(Debug, Clone, PartialEq)]
pub struct DataProperty {
    pub label: String,
    /// Par type name: "int", "long", "float", "double", "boolean" or "string"
    pub ptype: String,
    pub value: String,
}

impl DataProperty {
    pub fn new(
        label: impl Into<String>,
        ptype: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            ptype: ptype.into(),
            value: value.into(),
        }
    }
}
