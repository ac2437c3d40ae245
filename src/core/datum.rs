// Order-preserving scalar encoding: byte-wise comparison of encoded datums matches
// the logical order of same-kind values, and sequences compare lexicographically.
use crate::core::error::{Error, ErrorKind};

const NIL_FLAG: u8 = 0x00;
const BYTES_FLAG: u8 = 0x01;
const INT_FLAG: u8 = 0x03;
const UINT_FLAG: u8 = 0x04;
const FLOAT_FLAG: u8 = 0x05;

const SIGN_MASK: u64 = 0x8000_0000_0000_0000;
const GROUP_SIZE: usize = 8;
const GROUP_MARKER: u8 = 0xFF;
const PAD: u8 = 0x00;

#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Null,
    Int(i64),
    Uint(u64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl Datum {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Datum::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Int(_) => "int",
            Datum::Uint(_) => "uint",
            Datum::Float(_) => "float",
            Datum::Bytes(_) => "bytes",
        }
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Int(value)
    }
}

impl From<u64> for Datum {
    fn from(value: u64) -> Self {
        Datum::Uint(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Float(value)
    }
}

impl From<&[u8]> for Datum {
    fn from(value: &[u8]) -> Self {
        Datum::Bytes(value.to_vec())
    }
}

/// Appends the comparable encoding of `datum` to `out`.
///
/// NaN has no place in a total byte order and is rejected. `out` is left untouched on
/// error.
pub fn encode_datum(out: &mut Vec<u8>, datum: &Datum) -> Result<(), Error> {
    match datum {
        Datum::Null => out.push(NIL_FLAG),
        Datum::Int(value) => {
            out.push(INT_FLAG);
            out.extend_from_slice(&encode_int_to_cmp_uint(*value).to_be_bytes());
        }
        Datum::Uint(value) => {
            out.push(UINT_FLAG);
            out.extend_from_slice(&value.to_be_bytes());
        }
        Datum::Float(value) => {
            if value.is_nan() {
                return Err(Error::new(ErrorKind::Encoding)
                    .with_message("NaN float cannot be encoded in comparable form"));
            }
            out.push(FLOAT_FLAG);
            out.extend_from_slice(&encode_float_to_cmp_uint(*value).to_be_bytes());
        }
        Datum::Bytes(bytes) => {
            out.push(BYTES_FLAG);
            encode_bytes(out, bytes);
        }
    }
    Ok(())
}

/// Encodes a datum sequence. On error `out` keeps its original length.
pub fn encode_key(out: &mut Vec<u8>, datums: &[Datum]) -> Result<(), Error> {
    let start = out.len();
    for (idx, datum) in datums.iter().enumerate() {
        if let Err(err) = encode_datum(out, datum) {
            out.truncate(start);
            let detail = err.message().unwrap_or("not representable").to_string();
            return Err(err.with_message(format!(
                "field {idx} ({}): {detail}",
                datum.kind_name()
            )));
        }
    }
    Ok(())
}

/// Decodes one datum from the front of `buf`, returning it with the remaining bytes.
pub fn decode_datum(buf: &[u8]) -> Result<(Datum, &[u8]), Error> {
    let Some((&flag, rest)) = buf.split_first() else {
        return Err(Error::new(ErrorKind::Decoding).with_message("empty datum buffer"));
    };
    match flag {
        NIL_FLAG => Ok((Datum::Null, rest)),
        INT_FLAG => {
            let (raw, rest) = take_u64(rest)?;
            Ok((Datum::Int(decode_cmp_uint_to_int(raw)), rest))
        }
        UINT_FLAG => {
            let (raw, rest) = take_u64(rest)?;
            Ok((Datum::Uint(raw), rest))
        }
        FLOAT_FLAG => {
            let (raw, rest) = take_u64(rest)?;
            Ok((Datum::Float(decode_cmp_uint_to_float(raw)), rest))
        }
        BYTES_FLAG => {
            let (bytes, rest) = decode_bytes(rest)?;
            Ok((Datum::Bytes(bytes), rest))
        }
        other => Err(Error::new(ErrorKind::Decoding)
            .with_message(format!("invalid datum flag 0x{other:02x}"))),
    }
}

/// Decodes exactly `count` datums; leftover bytes are an error.
pub fn decode_exact(mut buf: &[u8], count: usize) -> Result<Vec<Datum>, Error> {
    // Every datum takes at least its flag byte.
    if count > buf.len() {
        return Err(Error::new(ErrorKind::Decoding).with_message(format!(
            "expected {count} fields, buffer holds {} bytes",
            buf.len()
        )));
    }
    let mut datums = Vec::with_capacity(count);
    for idx in 0..count {
        if buf.is_empty() {
            return Err(Error::new(ErrorKind::Decoding)
                .with_message(format!("expected {count} fields, found {idx}")));
        }
        let (datum, rest) = decode_datum(buf)?;
        datums.push(datum);
        buf = rest;
    }
    if !buf.is_empty() {
        return Err(Error::new(ErrorKind::Decoding).with_message(format!(
            "{} trailing bytes after {count} fields",
            buf.len()
        )));
    }
    Ok(datums)
}

fn encode_int_to_cmp_uint(value: i64) -> u64 {
    (value as u64) ^ SIGN_MASK
}

fn decode_cmp_uint_to_int(value: u64) -> i64 {
    (value ^ SIGN_MASK) as i64
}

fn encode_float_to_cmp_uint(value: f64) -> u64 {
    let bits = value.to_bits();
    if value >= 0.0 { bits | SIGN_MASK } else { !bits }
}

fn decode_cmp_uint_to_float(value: u64) -> f64 {
    let bits = if value & SIGN_MASK > 0 {
        value & !SIGN_MASK
    } else {
        !value
    };
    f64::from_bits(bits)
}

// Bytes are split into 8-byte groups, each followed by a marker telling how many
// bytes of the group are padding. A full group always continues the value.
fn encode_bytes(out: &mut Vec<u8>, data: &[u8]) {
    let mut idx = 0;
    loop {
        let remain = data.len() - idx;
        if remain >= GROUP_SIZE {
            out.extend_from_slice(&data[idx..idx + GROUP_SIZE]);
            out.push(GROUP_MARKER);
            idx += GROUP_SIZE;
            continue;
        }
        let pad = GROUP_SIZE - remain;
        out.extend_from_slice(&data[idx..]);
        out.resize(out.len() + pad, PAD);
        out.push(GROUP_MARKER - pad as u8);
        return;
    }
}

fn decode_bytes(mut buf: &[u8]) -> Result<(Vec<u8>, &[u8]), Error> {
    let mut data = Vec::new();
    loop {
        if buf.len() < GROUP_SIZE + 1 {
            return Err(Error::new(ErrorKind::Decoding).with_message("truncated bytes group"));
        }
        let (group, rest) = buf.split_at(GROUP_SIZE + 1);
        buf = rest;
        let pad = (GROUP_MARKER - group[GROUP_SIZE]) as usize;
        if pad > GROUP_SIZE {
            return Err(Error::new(ErrorKind::Decoding).with_message("invalid bytes group marker"));
        }
        let real = GROUP_SIZE - pad;
        data.extend_from_slice(&group[..real]);
        if pad == 0 {
            continue;
        }
        if group[real..GROUP_SIZE].iter().any(|&b| b != PAD) {
            return Err(Error::new(ErrorKind::Decoding).with_message("invalid bytes group padding"));
        }
        return Ok((data, buf));
    }
}

fn take_u64(buf: &[u8]) -> Result<(u64, &[u8]), Error> {
    if buf.len() < 8 {
        return Err(Error::new(ErrorKind::Decoding)
            .with_message(format!("truncated scalar: need 8 bytes, have {}", buf.len())));
    }
    let (head, rest) = buf.split_at(8);
    let mut raw = [0u8; 8];
    raw.copy_from_slice(head);
    Ok((u64::from_be_bytes(raw), rest))
}
