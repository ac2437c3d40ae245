// Row model and the length-prefixed row record codec.
use crate::core::datum::{self, Datum};
use crate::core::error::{Error, ErrorKind};

pub const LEN_PREFIX: usize = 8;

/// Key and value arity shared by every row of a data file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowLayout {
    pub key_size: usize,
    pub val_size: usize,
}

impl RowLayout {
    pub fn new(key_size: usize, val_size: usize) -> Result<Self, Error> {
        if key_size == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message("key size must be positive"));
        }
        if val_size == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message("value size must be positive"));
        }
        Ok(Self { key_size, val_size })
    }

    /// Key fields, value fields, and the handle.
    pub fn field_count(&self) -> usize {
        self.key_size.saturating_add(self.val_size).saturating_add(1)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub key: Vec<Datum>,
    pub val: Vec<Datum>,
    pub handle: i64,
}

impl Row {
    pub fn layout_matches(&self, layout: RowLayout) -> bool {
        self.key.len() == layout.key_size && self.val.len() == layout.val_size
    }
}

/// Encodes key, value, then handle without the length prefix.
pub fn encode_row_body(row: &Row) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    datum::encode_key(&mut body, &row.key)?;
    datum::encode_key(&mut body, &row.val)?;
    datum::encode_datum(&mut body, &Datum::Int(row.handle))?;
    Ok(body)
}

/// Appends `[len:u64 BE][body]` for `row` to `out`. `out` is unchanged on error.
pub fn encode_row(out: &mut Vec<u8>, row: &Row) -> Result<(), Error> {
    let body = encode_row_body(row)?;
    out.extend_from_slice(&(body.len() as u64).to_be_bytes());
    out.extend_from_slice(&body);
    Ok(())
}

/// Parses exactly `layout.field_count()` datums from a record body.
pub fn decode_row(body: &[u8], layout: RowLayout) -> Result<Row, Error> {
    let mut fields = datum::decode_exact(body, layout.field_count())?;
    let handle = fields
        .pop()
        .and_then(|field| field.as_int())
        .ok_or_else(|| Error::new(ErrorKind::Decoding).with_message("row handle is not an int"))?;
    let val = fields.split_off(layout.key_size);
    Ok(Row {
        key: fields,
        val,
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::{LEN_PREFIX, Row, RowLayout, decode_row, encode_row, encode_row_body};
    use crate::core::datum::Datum;
    use crate::core::error::ErrorKind;

    fn sample_row() -> Row {
        Row {
            key: vec![Datum::Int(10), Datum::Int(-3)],
            val: vec![Datum::Int(i64::MAX)],
            handle: 77,
        }
    }

    #[test]
    fn body_round_trips() {
        let row = sample_row();
        let layout = RowLayout::new(2, 1).expect("layout");
        let body = encode_row_body(&row).expect("encode");
        assert_eq!(decode_row(&body, layout).expect("decode"), row);
    }

    #[test]
    fn record_is_length_prefixed_big_endian() {
        let mut out = Vec::new();
        encode_row(&mut out, &sample_row()).expect("encode");
        // Four int datums of 9 bytes each.
        assert_eq!(&out[..LEN_PREFIX], &36u64.to_be_bytes());
        assert_eq!(out.len(), LEN_PREFIX + 36);
    }

    #[test]
    fn decode_with_wrong_layout_fails() {
        let body = encode_row_body(&sample_row()).expect("encode");
        let wider = RowLayout::new(2, 2).expect("layout");
        assert_eq!(decode_row(&body, wider).unwrap_err().kind(), ErrorKind::Decoding);
        let narrower = RowLayout::new(1, 1).expect("layout");
        assert_eq!(decode_row(&body, narrower).unwrap_err().kind(), ErrorKind::Decoding);
    }

    #[test]
    fn non_int_handle_is_rejected() {
        let mut body = Vec::new();
        crate::core::datum::encode_key(
            &mut body,
            &[Datum::Int(1), Datum::Int(2), Datum::Uint(3)],
        )
        .expect("encode");
        let layout = RowLayout::new(1, 1).expect("layout");
        assert_eq!(decode_row(&body, layout).unwrap_err().kind(), ErrorKind::Decoding);
    }

    #[test]
    fn unencodable_field_leaves_buffer_alone() {
        let row = Row {
            key: vec![Datum::Float(f64::NAN)],
            val: vec![Datum::Int(1)],
            handle: 0,
        };
        let mut out = vec![1, 2, 3];
        assert_eq!(encode_row(&mut out, &row).unwrap_err().kind(), ErrorKind::Encoding);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn keys_keep_lexicographic_order() {
        let mk = |a: i64, b: i64| Row {
            key: vec![Datum::Int(a), Datum::Int(b)],
            val: vec![Datum::Int(0)],
            handle: 0,
        };
        let low = encode_row_body(&mk(-5, 9)).expect("encode");
        let mid = encode_row_body(&mk(0, -9)).expect("encode");
        let high = encode_row_body(&mk(0, 1)).expect("encode");
        assert!(low < mid);
        assert!(mid < high);
    }

    #[test]
    fn zero_sizes_are_usage_errors() {
        assert_eq!(RowLayout::new(0, 1).unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!(RowLayout::new(1, 0).unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!(RowLayout::new(2, 3).expect("layout").field_count(), 6);
    }
}
