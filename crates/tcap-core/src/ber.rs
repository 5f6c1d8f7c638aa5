//! Minimal BER (X.690) primitives used by the TCAP encoder.
//!
//! Only definite lengths are produced. Lengths below 128 use the short
//! form, longer contents use `0x81 nn` or `0x82 nnnn`.

use bytes::{BufMut, BytesMut};

use crate::error::Error;
use crate::Result;

/// Largest content length this encoder will emit (two length octets)
pub const MAX_CONTENT_LENGTH: usize = 0xFFFF;

/// Number of octets needed for the length field of `len` bytes of content
pub fn length_size(len: usize) -> usize {
    match len {
        0..=0x7F => 1,
        0x80..=0xFF => 2,
        _ => 3,
    }
}

/// Append a definite length field
pub fn put_length(buf: &mut BytesMut, len: usize) -> Result<()> {
    match len {
        0..=0x7F => buf.put_u8(len as u8),
        0x80..=0xFF => {
            buf.put_u8(0x81);
            buf.put_u8(len as u8);
        }
        0x100..=MAX_CONTENT_LENGTH => {
            buf.put_u8(0x82);
            buf.put_u16(len as u16);
        }
        _ => return Err(Error::LengthOverflow(len)),
    }
    Ok(())
}

/// Append a complete tag-length-value element
pub fn put_tlv(buf: &mut BytesMut, tag: u8, value: &[u8]) -> Result<()> {
    buf.reserve(1 + length_size(value.len()) + value.len());
    buf.put_u8(tag);
    put_length(buf, value.len())?;
    buf.put_slice(value);
    Ok(())
}

/// Build an element whose content is produced by `build`
pub fn constructed<F>(buf: &mut BytesMut, tag: u8, build: F) -> Result<()>
where
    F: FnOnce(&mut BytesMut) -> Result<()>,
{
    let mut content = BytesMut::new();
    build(&mut content)?;
    put_tlv(buf, tag, &content)
}

/// Minimal two's-complement content octets for an INTEGER
pub fn integer_octets(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let next_high = bytes[start + 1] & 0x80;
        let redundant = (bytes[start] == 0x00 && next_high == 0)
            || (bytes[start] == 0xFF && next_high != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Append a universal INTEGER (tag 0x02) or an implicitly tagged one
pub fn put_integer(buf: &mut BytesMut, tag: u8, value: i64) -> Result<()> {
    put_tlv(buf, tag, &integer_octets(value))
}
