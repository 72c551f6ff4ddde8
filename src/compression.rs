//! Trace sample codecs
//!
//! Two on-disk trace formats flow end-to-end: verbatim little-endian
//! float32, and a fixed-point int16 representation where each trace record
//! carries an 8-byte `{scale exponent, reserved}` prefix followed by the
//! quantized samples. The scale is a power of two chosen per trace so the
//! peak amplitude maps to int16 full scale.

use crate::error::{JsError, Result};
use crate::types::TraceFormat;
use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

/// Largest magnitude representable by a quantized sample
const INT16_FULL_SCALE: f64 = 32767.0;
/// Exponents outside this range cannot arise from a valid encode
const SCALER_EXP_LIMIT: i32 = 126;

/// Encoder/decoder for one trace record of the active on-disk format
pub trait TraceCodec: Send + Sync {
    /// The on-disk format this codec implements
    fn format(&self) -> TraceFormat;

    /// Disk record size in bytes for one trace of `samples` samples
    fn record_bytes(&self, samples: usize) -> usize;

    /// Encode one trace into a record buffer of exactly `record_bytes` bytes
    fn encode(&self, trace: &[f32], record: &mut [u8]) -> Result<()>;

    /// Decode one record into a trace buffer of matching sample count
    fn decode(&self, record: &[u8], trace: &mut [f32]) -> Result<()>;

    /// Allocate a zeroed buffer sized for `fold` trace records
    fn frame_buf(&self, samples: usize, fold: usize) -> Vec<u8> {
        vec![0u8; self.record_bytes(samples) * fold]
    }
}

fn check_lengths(codec: &dyn TraceCodec, record: &[u8], trace: &[f32]) -> Result<()> {
    let expected = codec.record_bytes(trace.len());
    if record.len() != expected {
        return Err(JsError::Precondition(format!(
            "{} record of {} bytes does not match {} samples ({} bytes)",
            codec.format(),
            record.len(),
            trace.len(),
            expected
        )));
    }
    Ok(())
}

/// Verbatim little-endian float32 records
#[derive(Debug, Default)]
pub struct Float32Codec;

impl TraceCodec for Float32Codec {
    fn format(&self) -> TraceFormat {
        TraceFormat::Float
    }

    fn record_bytes(&self, samples: usize) -> usize {
        samples * 4
    }

    fn encode(&self, trace: &[f32], record: &mut [u8]) -> Result<()> {
        check_lengths(self, record, trace)?;
        LittleEndian::write_f32_into(trace, record);
        Ok(())
    }

    fn decode(&self, record: &[u8], trace: &mut [f32]) -> Result<()> {
        check_lengths(self, record, trace)?;
        LittleEndian::read_f32_into(record, trace);
        Ok(())
    }
}

/// Fixed-point int16 records with a per-trace power-of-two scale
#[derive(Debug, Default)]
pub struct Int16Codec;

impl TraceCodec for Int16Codec {
    fn format(&self) -> TraceFormat {
        TraceFormat::CompressedInt16
    }

    fn record_bytes(&self, samples: usize) -> usize {
        8 + samples * 2
    }

    fn encode(&self, trace: &[f32], record: &mut [u8]) -> Result<()> {
        check_lengths(self, record, trace)?;
        let peak = trace
            .iter()
            .filter(|s| s.is_finite())
            .fold(0.0f64, |acc, &s| acc.max((s as f64).abs()));

        let exponent = if peak > 0.0 {
            (INT16_FULL_SCALE / peak).log2().floor() as i32
        } else {
            0
        };
        let scale = (exponent as f64).exp2();

        LittleEndian::write_i32(&mut record[0..4], exponent);
        LittleEndian::write_i32(&mut record[4..8], 0);
        for (i, &s) in trace.iter().enumerate() {
            let q = if s.is_finite() && peak > 0.0 {
                (s as f64 * scale).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
            } else {
                0
            };
            LittleEndian::write_i16(&mut record[8 + i * 2..10 + i * 2], q);
        }
        Ok(())
    }

    fn decode(&self, record: &[u8], trace: &mut [f32]) -> Result<()> {
        check_lengths(self, record, trace)?;
        let stored = LittleEndian::read_i32(&record[0..4]);
        let exponent = stored.clamp(-SCALER_EXP_LIMIT, SCALER_EXP_LIMIT);
        if exponent != stored {
            warn!(stored, exponent, "clamped out-of-range trace scaler");
        }
        let unscale = (-exponent as f64).exp2();
        for (i, out) in trace.iter_mut().enumerate() {
            let q = LittleEndian::read_i16(&record[8 + i * 2..10 + i * 2]);
            *out = (q as f64 * unscale) as f32;
        }
        Ok(())
    }
}

/// Codec for a declared trace format; formats the engine cannot carry
/// end-to-end are rejected.
pub fn codec_for(format: TraceFormat) -> Result<Box<dyn TraceCodec>> {
    match format {
        TraceFormat::Float => Ok(Box::new(Float32Codec)),
        TraceFormat::CompressedInt16 => Ok(Box::new(Int16Codec)),
        TraceFormat::Double | TraceFormat::CompressedInt32 => Err(JsError::Precondition(
            format!("trace format {} is not supported", format.name()),
        )),
    }
}
