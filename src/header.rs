//! Typed accessors for header records
//!
//! A frame's headers are a dense `[header_length x traces_per_frame]` byte
//! buffer. Every accessor addresses one property inside one record, honoring
//! the dataset's declared byte order.

use crate::error::{JsError, Result};
use crate::props::HeaderSchema;
use crate::types::{Endianness, PropertyFormat, TraceProperty};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Borrow the 1-based `trace`-th record of a frame header buffer.
pub fn record(hdrs: &[u8], header_length: usize, trace: usize) -> &[u8] {
    &hdrs[(trace - 1) * header_length..trace * header_length]
}

/// Mutable variant of [`record`].
pub fn record_mut(hdrs: &mut [u8], header_length: usize, trace: usize) -> &mut [u8] {
    &mut hdrs[(trace - 1) * header_length..trace * header_length]
}

fn field<'a>(rec: &'a [u8], prop: &TraceProperty) -> Result<&'a [u8]> {
    rec.get(prop.byte_range()).ok_or_else(|| {
        JsError::Precondition(format!(
            "header record of {} bytes cannot hold property {}",
            rec.len(),
            prop.label()
        ))
    })
}

fn field_mut<'a>(rec: &'a mut [u8], prop: &TraceProperty) -> Result<&'a mut [u8]> {
    let range = prop.byte_range();
    if range.end > rec.len() {
        return Err(JsError::Precondition(format!(
            "header record of {} bytes cannot hold property {}",
            rec.len(),
            prop.label()
        )));
    }
    Ok(&mut rec[range])
}

fn require_scalar(prop: &TraceProperty) -> Result<()> {
    if prop.def.count != 1 {
        return Err(JsError::Precondition(format!(
            "property {} holds {} elements, use the vector accessors",
            prop.label(),
            prop.def.count
        )));
    }
    Ok(())
}

fn read_int_at(buf: &[u8], format: PropertyFormat, order: Endianness) -> Result<i64> {
    let v = match (format, order) {
        (PropertyFormat::Int16, Endianness::Little) => LittleEndian::read_i16(buf) as i64,
        (PropertyFormat::Int16, Endianness::Big) => BigEndian::read_i16(buf) as i64,
        (PropertyFormat::Int32, Endianness::Little) => LittleEndian::read_i32(buf) as i64,
        (PropertyFormat::Int32, Endianness::Big) => BigEndian::read_i32(buf) as i64,
        (PropertyFormat::Int64, Endianness::Little) => LittleEndian::read_i64(buf),
        (PropertyFormat::Int64, Endianness::Big) => BigEndian::read_i64(buf),
        _ => {
            return Err(JsError::Precondition(
                "integer accessor on a non-integer property".to_string(),
            ))
        }
    };
    Ok(v)
}

fn write_int_at(buf: &mut [u8], format: PropertyFormat, order: Endianness, v: i64) -> Result<()> {
    match (format, order) {
        (PropertyFormat::Int16, Endianness::Little) => LittleEndian::write_i16(buf, v as i16),
        (PropertyFormat::Int16, Endianness::Big) => BigEndian::write_i16(buf, v as i16),
        (PropertyFormat::Int32, Endianness::Little) => LittleEndian::write_i32(buf, v as i32),
        (PropertyFormat::Int32, Endianness::Big) => BigEndian::write_i32(buf, v as i32),
        (PropertyFormat::Int64, Endianness::Little) => LittleEndian::write_i64(buf, v),
        (PropertyFormat::Int64, Endianness::Big) => BigEndian::write_i64(buf, v),
        _ => {
            return Err(JsError::Precondition(
                "integer accessor on a non-integer property".to_string(),
            ))
        }
    }
    Ok(())
}

fn read_float_at(buf: &[u8], format: PropertyFormat, order: Endianness) -> Result<f64> {
    let v = match (format, order) {
        (PropertyFormat::Float32, Endianness::Little) => LittleEndian::read_f32(buf) as f64,
        (PropertyFormat::Float32, Endianness::Big) => BigEndian::read_f32(buf) as f64,
        (PropertyFormat::Float64, Endianness::Little) => LittleEndian::read_f64(buf),
        (PropertyFormat::Float64, Endianness::Big) => BigEndian::read_f64(buf),
        _ => return Ok(read_int_at(buf, format, order)? as f64),
    };
    Ok(v)
}

fn write_float_at(buf: &mut [u8], format: PropertyFormat, order: Endianness, v: f64) -> Result<()> {
    match (format, order) {
        (PropertyFormat::Float32, Endianness::Little) => LittleEndian::write_f32(buf, v as f32),
        (PropertyFormat::Float32, Endianness::Big) => BigEndian::write_f32(buf, v as f32),
        (PropertyFormat::Float64, Endianness::Little) => LittleEndian::write_f64(buf, v),
        (PropertyFormat::Float64, Endianness::Big) => BigEndian::write_f64(buf, v),
        _ => {
            return Err(JsError::Precondition(
                "float accessor on a non-float property".to_string(),
            ))
        }
    }
    Ok(())
}

/// Read a scalar integer field, converting from the declared format.
pub fn get_int(rec: &[u8], prop: &TraceProperty, order: Endianness) -> Result<i64> {
    require_scalar(prop)?;
    read_int_at(field(rec, prop)?, prop.def.format, order)
}

/// Write a scalar integer field, converting to the declared format.
pub fn set_int(rec: &mut [u8], prop: &TraceProperty, order: Endianness, v: i64) -> Result<()> {
    require_scalar(prop)?;
    write_int_at(field_mut(rec, prop)?, prop.def.format, order, v)
}

/// Read a scalar float field. Integer formats are widened.
pub fn get_float(rec: &[u8], prop: &TraceProperty, order: Endianness) -> Result<f64> {
    require_scalar(prop)?;
    read_float_at(field(rec, prop)?, prop.def.format, order)
}

/// Write a scalar float field, converting to the declared format.
pub fn set_float(rec: &mut [u8], prop: &TraceProperty, order: Endianness, v: f64) -> Result<()> {
    require_scalar(prop)?;
    write_float_at(field_mut(rec, prop)?, prop.def.format, order, v)
}

/// Read an integer vector field of the declared element count.
pub fn get_ints(rec: &[u8], prop: &TraceProperty, order: Endianness) -> Result<Vec<i64>> {
    let buf = field(rec, prop)?;
    let width = prop.def.format.size_in_bytes();
    (0..prop.def.count)
        .map(|i| read_int_at(&buf[i * width..(i + 1) * width], prop.def.format, order))
        .collect()
}

/// Write an integer vector field; the slice length must match the declared
/// element count.
pub fn set_ints(rec: &mut [u8], prop: &TraceProperty, order: Endianness, v: &[i64]) -> Result<()> {
    if v.len() != prop.def.count {
        return Err(JsError::Precondition(format!(
            "property {} expects {} elements, got {}",
            prop.label(),
            prop.def.count,
            v.len()
        )));
    }
    let buf = field_mut(rec, prop)?;
    let width = prop.def.format.size_in_bytes();
    for (i, &x) in v.iter().enumerate() {
        write_int_at(&mut buf[i * width..(i + 1) * width], prop.def.format, order, x)?;
    }
    Ok(())
}

/// Read a float vector field of the declared element count.
pub fn get_floats(rec: &[u8], prop: &TraceProperty, order: Endianness) -> Result<Vec<f64>> {
    let buf = field(rec, prop)?;
    let width = prop.def.format.size_in_bytes();
    (0..prop.def.count)
        .map(|i| read_float_at(&buf[i * width..(i + 1) * width], prop.def.format, order))
        .collect()
}

/// Write a float vector field; the slice length must match the declared
/// element count.
pub fn set_floats(rec: &mut [u8], prop: &TraceProperty, order: Endianness, v: &[f64]) -> Result<()> {
    if v.len() != prop.def.count {
        return Err(JsError::Precondition(format!(
            "property {} expects {} elements, got {}",
            prop.label(),
            prop.def.count,
            v.len()
        )));
    }
    let buf = field_mut(rec, prop)?;
    let width = prop.def.format.size_in_bytes();
    for (i, &x) in v.iter().enumerate() {
        write_float_at(&mut buf[i * width..(i + 1) * width], prop.def.format, order, x)?;
    }
    Ok(())
}

/// Read a byte-string field, trimmed of trailing NULs.
pub fn get_str(rec: &[u8], prop: &TraceProperty) -> Result<String> {
    if prop.def.format != PropertyFormat::ByteString {
        return Err(JsError::Precondition(format!(
            "property {} is not a byte string",
            prop.label()
        )));
    }
    let buf = field(rec, prop)?;
    let end = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Write a byte-string field, NUL-padded to the declared element count.
/// The string must be shorter than the element count.
pub fn set_str(rec: &mut [u8], prop: &TraceProperty, s: &str) -> Result<()> {
    if prop.def.format != PropertyFormat::ByteString {
        return Err(JsError::Precondition(format!(
            "property {} is not a byte string",
            prop.label()
        )));
    }
    if s.len() >= prop.def.count {
        return Err(JsError::Precondition(format!(
            "string of {} bytes does not fit property {} ({} bytes)",
            s.len(),
            prop.label(),
            prop.def.count
        )));
    }
    let buf = field_mut(rec, prop)?;
    buf.fill(0);
    buf[..s.len()].copy_from_slice(s.as_bytes());
    Ok(())
}

/// Copy every property of `src_rec` whose label also exists on the target
/// schema into `dst_rec`. Properties missing on the target are skipped.
pub fn copy_record(
    src_schema: &HeaderSchema,
    src_rec: &[u8],
    dst_schema: &HeaderSchema,
    dst_rec: &mut [u8],
) -> Result<()> {
    for prop in src_schema.iter() {
        if let Some(dst_prop) = dst_schema.find(prop.label()) {
            let n = prop.def.size_in_bytes().min(dst_prop.def.size_in_bytes());
            let src = &field(src_rec, prop)?[..n];
            field_mut(dst_rec, dst_prop)?[..n].copy_from_slice(src);
        }
    }
    Ok(())
}
