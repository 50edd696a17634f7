//! Variable-length integers
//!
//! Unsigned (VULong): values up to `0xF7` take one byte. Larger values are
//! written as a header byte `0xF7 + n` followed by the `n` big-endian bytes
//! of `v - 0xF8`.
//!
//! Signed (VSLong): values in `-120..=119` take one byte, `v + 0x80`.
//! Non-negative values beyond that are written like VULong over `v - 120`.
//! Negative values beyond that complement first (`!v - 120`) and flip every
//! byte, header included, so they sort below everything else.
//!
//! Both encodings preserve order under unsigned byte-wise comparison.

use std::io::Read;

use super::errors::{SerializationError, SerializationResult};

const VULONG_MAX_SINGLE: u64 = 0xf7;
const VSLONG_MIN_SINGLE: i64 = -120;
const VSLONG_MAX_SINGLE: i64 = 119;

pub(crate) fn read_u8(input: &mut dyn Read) -> SerializationResult<u8> {
    let mut b = [0u8; 1];
    input.read_exact(&mut b)?;
    Ok(b[0])
}

fn bytes_needed(v: u64) -> usize {
    (((64 - v.leading_zeros()) as usize + 7) / 8).max(1)
}

fn write_be(buf: &mut Vec<u8>, v: u64, len: usize, flip: u8) {
    for i in (0..len).rev() {
        buf.push(((v >> (8 * i)) as u8) ^ flip);
    }
}

fn read_be(input: &mut dyn Read, len: usize, flip: u8) -> SerializationResult<u64> {
    let mut raw = [0u8; 8];
    input.read_exact(&mut raw[..len])?;
    Ok(raw[..len].iter().fold(0u64, |acc, b| (acc << 8) | u64::from(b ^ flip)))
}

pub fn write_vulong(buf: &mut Vec<u8>, v: u64) {
    if v <= VULONG_MAX_SINGLE {
        buf.push(v as u8);
        return;
    }
    let v = v - (VULONG_MAX_SINGLE + 1);
    let len = bytes_needed(v);
    buf.push(0xf7 + len as u8);
    write_be(buf, v, len, 0);
}

pub fn read_vulong(input: &mut dyn Read) -> SerializationResult<u64> {
    let b = read_u8(input)?;
    if u64::from(b) <= VULONG_MAX_SINGLE {
        return Ok(u64::from(b));
    }
    let len = (b - 0xf7) as usize;
    let v = read_be(input, len, 0)?;
    v.checked_add(VULONG_MAX_SINGLE + 1)
        .ok_or_else(|| SerializationError::malformed("unsigned varint overflows 64 bits"))
}

pub fn write_vslong(buf: &mut Vec<u8>, v: i64) {
    if (VSLONG_MIN_SINGLE..=VSLONG_MAX_SINGLE).contains(&v) {
        buf.push((v + 0x80) as u8);
        return;
    }
    let (magnitude, flip) = if v > VSLONG_MAX_SINGLE {
        ((v - (VSLONG_MAX_SINGLE + 1)) as u64, 0x00u8)
    } else {
        ((!v - (VSLONG_MAX_SINGLE + 1)) as u64, 0xffu8)
    };
    let len = bytes_needed(magnitude);
    buf.push((0xf7 + len as u8) ^ flip);
    write_be(buf, magnitude, len, flip);
}

pub fn read_vslong(input: &mut dyn Read) -> SerializationResult<i64> {
    let b = read_u8(input)?;
    if (0x08..=0xf7).contains(&b) {
        return Ok(i64::from(b) - 0x80);
    }
    let flip = if b < 0x08 { 0xffu8 } else { 0x00u8 };
    let len = ((b ^ flip) - 0xf7) as usize;
    let magnitude = read_be(input, len, flip)?;
    if magnitude > (i64::MAX - (VSLONG_MAX_SINGLE + 1)) as u64 {
        return Err(SerializationError::malformed("signed varint overflows 64 bits"));
    }
    let v = magnitude as i64 + (VSLONG_MAX_SINGLE + 1);
    Ok(if flip == 0 { v } else { !v })
}
