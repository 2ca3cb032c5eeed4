use crate::error::AuxError;

/// Safety cap on `B`-array element counts (§5: "4000-element cap").
pub const MAX_ARRAY_LEN: u32 = 4000;

/// A decoded auxiliary value. The wire carries narrower integer widths
/// (`c`/`C`/`s`/`S`/`i`/`I`) than this type distinguishes — all of them
/// collapse to `Int(i64)` here — but the originating [`OptionalField`]
/// keeps the original `type_code` alongside so re-encoding reproduces
/// the exact wire width.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionalValue {
    Char(char),
    Int(i64),
    Float(f32),
    Str(String),
    /// Raw hex text, as it appears between the tag/type prefix and the
    /// terminating NUL — not reinterpreted as bytes.
    Hex(String),
    Array(ArrayValue),
}

/// A decoded `B`-type (typed array) auxiliary value, tagged by its
/// element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Float32(Vec<f32>),
}

/// A single decoded auxiliary (optional) field: a two-character tag, the
/// original wire type code, and its decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalField {
    pub tag: [u8; 2],
    pub type_code: u8,
    pub value: OptionalValue,
}

fn take<'a>(buf: &'a [u8], n: usize) -> Result<(&'a [u8], &'a [u8]), AuxError> {
    if buf.len() < n {
        return Err(AuxError::OutOfBounds);
    }
    Ok((&buf[..n], &buf[n..]))
}

fn take_i32<'a>(buf: &'a [u8]) -> Result<(i32, &'a [u8]), AuxError> {
    if buf.len() < 4 {
        return Err(AuxError::WrongInt32(buf.to_vec()));
    }
    let v = i32::from_le_bytes(buf[..4].try_into().unwrap());
    Ok((v, &buf[4..]))
}

fn take_u32<'a>(buf: &'a [u8]) -> Result<(u32, &'a [u8]), AuxError> {
    if buf.len() < 4 {
        return Err(AuxError::WrongInt32(buf.to_vec()));
    }
    let v = u32::from_le_bytes(buf[..4].try_into().unwrap());
    Ok((v, &buf[4..]))
}

fn take_until_nul<'a>(buf: &'a [u8], on_missing: AuxError) -> Result<(&'a [u8], &'a [u8]), AuxError> {
    match buf.iter().position(|&b| b == 0) {
        Some(i) => Ok((&buf[..i], &buf[i + 1..])),
        None => Err(on_missing),
    }
}

fn decode_array(sub: u8, count: u32, mut rest: &[u8]) -> Result<(ArrayValue, &[u8]), AuxError> {
    macro_rules! decode_fixed {
        ($n:expr, $from:expr, $variant:ident) => {{
            let mut out = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let (chunk, r) = take(rest, $n)?;
                out.push($from(chunk.try_into().unwrap()));
                rest = r;
            }
            (ArrayValue::$variant(out), rest)
        }};
    }
    let (value, rest) = match sub {
        b'c' => decode_fixed!(1, |b: [u8; 1]| i8::from_le_bytes(b), Int8),
        b'C' => decode_fixed!(1, |b: [u8; 1]| u8::from_le_bytes(b), UInt8),
        b's' => decode_fixed!(2, |b: [u8; 2]| i16::from_le_bytes(b), Int16),
        b'S' => decode_fixed!(2, |b: [u8; 2]| u16::from_le_bytes(b), UInt16),
        b'i' => {
            let mut out = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let (v, r) = take_i32(rest)?;
                out.push(v);
                rest = r;
            }
            (ArrayValue::Int32(out), rest)
        }
        b'I' => {
            let mut out = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let (v, r) = take_u32(rest)?;
                out.push(v);
                rest = r;
            }
            (ArrayValue::UInt32(out), rest)
        }
        b'f' => decode_fixed!(4, |b: [u8; 4]| f32::from_le_bytes(b), Float32),
        other => return Err(AuxError::UnknownType(other)),
    };
    Ok((value, rest))
}

fn encode_array(arr: &ArrayValue, out: &mut Vec<u8>) {
    match arr {
        ArrayValue::Int8(v) => {
            out.push(b'c');
            out.extend((v.len() as u32).to_le_bytes());
            for x in v {
                out.extend(x.to_le_bytes());
            }
        }
        ArrayValue::UInt8(v) => {
            out.push(b'C');
            out.extend((v.len() as u32).to_le_bytes());
            out.extend(v);
        }
        ArrayValue::Int16(v) => {
            out.push(b's');
            out.extend((v.len() as u32).to_le_bytes());
            for x in v {
                out.extend(x.to_le_bytes());
            }
        }
        ArrayValue::UInt16(v) => {
            out.push(b'S');
            out.extend((v.len() as u32).to_le_bytes());
            for x in v {
                out.extend(x.to_le_bytes());
            }
        }
        ArrayValue::Int32(v) => {
            out.push(b'i');
            out.extend((v.len() as u32).to_le_bytes());
            for x in v {
                out.extend(x.to_le_bytes());
            }
        }
        ArrayValue::UInt32(v) => {
            out.push(b'I');
            out.extend((v.len() as u32).to_le_bytes());
            for x in v {
                out.extend(x.to_le_bytes());
            }
        }
        ArrayValue::Float32(v) => {
            out.push(b'f');
            out.extend((v.len() as u32).to_le_bytes());
            for x in v {
                out.extend(x.to_le_bytes());
            }
        }
    }
}

/// Decodes one `(tag)(type)(payload)` field from the front of `buf`,
/// returning the field and the unconsumed remainder.
fn decode_field(buf: &[u8]) -> Result<(OptionalField, &[u8]), AuxError> {
    let (tag_bytes, rest) = take(buf, 2)?;
    let tag = [tag_bytes[0], tag_bytes[1]];
    let (type_byte, rest) = take(rest, 1)?;
    let type_code = type_byte[0];

    let (value, rest) = match type_code {
        b'A' => {
            let (b, r) = take(rest, 1)?;
            (OptionalValue::Char(b[0] as char), r)
        }
        b'c' => {
            let (b, r) = take(rest, 1)?;
            (OptionalValue::Int(i8::from_le_bytes([b[0]]) as i64), r)
        }
        b'C' => {
            let (b, r) = take(rest, 1)?;
            (OptionalValue::Int(b[0] as i64), r)
        }
        b's' => {
            let (b, r) = take(rest, 2)?;
            (
                OptionalValue::Int(i16::from_le_bytes(b.try_into().unwrap()) as i64),
                r,
            )
        }
        b'S' => {
            let (b, r) = take(rest, 2)?;
            (
                OptionalValue::Int(u16::from_le_bytes(b.try_into().unwrap()) as i64),
                r,
            )
        }
        b'i' => {
            let (v, r) = take_i32(rest)?;
            (OptionalValue::Int(v as i64), r)
        }
        b'I' => {
            let (v, r) = take_u32(rest)?;
            (OptionalValue::Int(v as i64), r)
        }
        b'f' => {
            let (b, r) = take(rest, 4)?;
            (
                OptionalValue::Float(f32::from_le_bytes(b.try_into().unwrap())),
                r,
            )
        }
        b'Z' => {
            let (s, r) = take_until_nul(rest, AuxError::NullTerminatedString)?;
            (OptionalValue::Str(String::from_utf8_lossy(s).into_owned()), r)
        }
        b'H' => {
            let (s, r) = take_until_nul(rest, AuxError::NullTerminatedHexArray)?;
            (OptionalValue::Hex(String::from_utf8_lossy(s).into_owned()), r)
        }
        b'B' => {
            let (sub, r) = take(rest, 1)?;
            let (count, r) = take_u32(r)?;
            if count > MAX_ARRAY_LEN {
                return Err(AuxError::ArraySize(count));
            }
            let (arr, r) = decode_array(sub[0], count, r)?;
            (OptionalValue::Array(arr), r)
        }
        other => return Err(AuxError::UnknownType(other)),
    };

    Ok((OptionalField { tag, type_code, value }, rest))
}

/// Decodes an entire aux blob — a back-to-back run of
/// `(tag)(type)(payload)` fields — into an ordered list.
pub fn decode_aux_blob(mut blob: &[u8]) -> Result<Vec<OptionalField>, AuxError> {
    let mut fields = Vec::new();
    while !blob.is_empty() {
        let (field, rest) = decode_field(blob)?;
        fields.push(field);
        blob = rest;
    }
    Ok(fields)
}

/// Encodes an ordered list of fields back into a wire aux blob, the
/// inverse of [`decode_aux_blob`].
pub fn encode_aux_fields(fields: &[OptionalField]) -> Vec<u8> {
    let mut out = Vec::new();
    for field in fields {
        out.push(field.tag[0]);
        out.push(field.tag[1]);
        out.push(field.type_code);
        match &field.value {
            OptionalValue::Char(c) => out.push(*c as u8),
            OptionalValue::Int(v) => match field.type_code {
                b'c' => out.push(*v as i8 as u8),
                b'C' => out.push(*v as u8),
                b's' => out.extend((*v as i16).to_le_bytes()),
                b'S' => out.extend((*v as u16).to_le_bytes()),
                b'i' => out.extend((*v as i32).to_le_bytes()),
                b'I' => out.extend((*v as u32).to_le_bytes()),
                _ => out.extend((*v as i32).to_le_bytes()),
            },
            OptionalValue::Float(v) => out.extend(v.to_le_bytes()),
            OptionalValue::Str(s) => {
                out.extend(s.as_bytes());
                out.push(0);
            }
            OptionalValue::Hex(s) => {
                out.extend(s.as_bytes());
                out.push(0);
            }
            OptionalValue::Array(arr) => encode_array(arr, &mut out),
        }
    }
    out
}
