//! Synthetic `/favicon.ico` image: a magenta filled circle on a transparent canvas,
//! built at router-construction time rather than shipped as a binary asset.

use flate2::{write::ZlibEncoder, Compression};
use std::io::Write;

const SIZE: u32 = 256;
const RADIUS: i64 = 120;
const MAGENTA: [u8; 4] = [255, 0, 255, 255];
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Encodes the favicon as a standalone PNG file (signature, `IHDR`, `IDAT`, `IEND`).
pub(super) fn generate() -> Vec<u8> {
    let mut raw = Vec::with_capacity((SIZE as usize) * (1 + SIZE as usize * 4));
    let center = (SIZE as i64 - 1) / 2;

    for y in 0..SIZE as i64 {
        raw.push(0); // filter type: None
        for x in 0..SIZE as i64 {
            let (dx, dy) = (x - center, y - center);
            let pixel = if dx * dx + dy * dy <= RADIUS * RADIUS {
                MAGENTA
            } else {
                TRANSPARENT
            };
            raw.extend_from_slice(&pixel);
        }
    }

    let mut idat = ZlibEncoder::new(Vec::new(), Compression::default());
    idat.write_all(&raw).expect("writing to an in-memory buffer cannot fail");
    let idat = idat.finish().expect("flushing an in-memory zlib stream cannot fail");

    let mut png = Vec::with_capacity(8 + 64 + idat.len() + 32);
    png.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&SIZE.to_be_bytes()); // width
    ihdr.extend_from_slice(&SIZE.to_be_bytes()); // height
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type: RGBA
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    png
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());

    let start = out.len();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32(&out[start..]).to_be_bytes());
}

/// CRC-32 (ISO-HDLC / zlib / PNG variant), computed with the standard
/// reflected, byte-at-a-time table algorithm - see the PNG spec, Annex D.
fn crc32(data: &[u8]) -> u32 {
    fn table_entry(mut n: u32) -> u32 {
        for _ in 0..8 {
            n = if n & 1 != 0 {
                0xEDB8_8320 ^ (n >> 1)
            } else {
                n >> 1
            };
        }
        n
    }

    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as u32;
        crc = table_entry(index) ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_has_valid_signature_and_chunks() {
        let png = generate();
        assert_eq!(&png[0..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        assert_eq!(&png[12..16], b"IHDR");
        assert!(png.windows(4).any(|w| w == b"IDAT"));
        assert_eq!(&png[png.len() - 4..], b"IEND");
    }

    #[test]
    fn ihdr_reports_expected_dimensions_and_color_type() {
        let png = generate();
        let ihdr = &png[16..16 + 13];
        assert_eq!(u32::from_be_bytes(ihdr[0..4].try_into().unwrap()), SIZE);
        assert_eq!(u32::from_be_bytes(ihdr[4..8].try_into().unwrap()), SIZE);
        assert_eq!(ihdr[8], 8); // bit depth
        assert_eq!(ihdr[9], 6); // RGBA
    }

    #[test]
    fn crc32_matches_known_vector() {
        // "123456789" -> 0xCBF43926 is the standard CRC-32/ISO-HDLC check value.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }
}
