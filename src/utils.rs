//! Utility functions

use crate::error::{JsError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Convert little-endian trace bytes to samples.
pub fn bytes_to_f32s(bytes: &[u8], out: &mut [f32]) -> Result<()> {
    if bytes.len() != out.len() * 4 {
        return Err(JsError::Precondition(format!(
            "{} bytes do not convert to {} samples",
            bytes.len(),
            out.len()
        )));
    }
    LittleEndian::read_f32_into(bytes, out);
    Ok(())
}

/// Convert samples to little-endian trace bytes.
pub fn f32s_to_bytes(data: &[f32]) -> Vec<u8> {
    let mut bytes = vec![0u8; data.len() * 4];
    LittleEndian::write_f32_into(data, &mut bytes);
    bytes
}

/// Format byte size in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_conversion() {
        let data: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
        let bytes = f32s_to_bytes(&data);
        assert_eq!(bytes.len(), data.len() * 4);

        let mut recovered = vec![0f32; data.len()];
        bytes_to_f32s(&bytes, &mut recovered).unwrap();
        assert_eq!(data, recovered);

        let mut wrong = vec![0f32; 3];
        assert!(bytes_to_f32s(&bytes, &mut wrong).is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }
}
