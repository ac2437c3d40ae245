// Library-level round trips through the data file.
use benchsort::core::config::GenConfig;
use benchsort::core::datum::Datum;
use benchsort::core::error::ErrorKind;
use benchsort::core::generator::RowGenerator;
use benchsort::core::row::{self, Row, RowLayout};
use benchsort::core::store::DataStore;

#[test]
fn generated_rows_survive_the_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let layout = RowLayout::new(4, 3).expect("layout");
    let rows: Vec<Row> = RowGenerator::new(layout, 2024).rows(500).collect();

    let store = DataStore::new(temp.path());
    let summary = store.write(layout, &rows).expect("write");
    assert_eq!(summary.rows, 500);

    let loaded = store.read().expect("read");
    assert_eq!(loaded.layout, layout);
    assert_eq!(loaded.rows, rows);
}

#[test]
fn write_generated_matches_manual_generation() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = GenConfig::new(temp.path(), 2, 2, 25, Some(3)).expect("config");
    let store = DataStore::new(&config.dir);
    store.write_generated(&config).expect("write");

    let expected: Vec<Row> = RowGenerator::new(config.layout, 3).rows(25).collect();
    assert_eq!(store.read().expect("read").rows, expected);
}

#[test]
fn mixed_datums_round_trip_through_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let layout = RowLayout::new(2, 2).expect("layout");
    let rows = vec![
        Row {
            key: vec![Datum::Bytes(b"alpha".to_vec()), Datum::Null],
            val: vec![Datum::Float(2.5), Datum::Uint(u64::MAX)],
            handle: -1,
        },
        Row {
            key: vec![Datum::Int(i64::MIN), Datum::Bytes(Vec::new())],
            val: vec![Datum::Int(0), Datum::Float(-0.125)],
            handle: i64::MAX,
        },
    ];

    let store = DataStore::new(temp.path());
    store.write(layout, &rows).expect("write");
    assert_eq!(store.read().expect("read").rows, rows);
}

#[test]
fn encoded_records_sort_like_keys() {
    let layout = RowLayout::new(2, 1).expect("layout");
    let mut rows: Vec<Row> = RowGenerator::new(layout, 77).rows(200).collect();
    for (idx, row) in rows.iter_mut().enumerate() {
        // Force negative keys into the mix.
        if idx % 3 == 0 {
            if let Datum::Int(value) = &mut row.key[0] {
                *value = -*value;
            }
        }
    }

    let mut by_bytes: Vec<(Vec<u8>, Vec<i64>)> = rows
        .iter()
        .map(|row| {
            let mut key_bytes = Vec::new();
            benchsort::core::datum::encode_key(&mut key_bytes, &row.key).expect("encode");
            let ints = row.key.iter().map(|d| d.as_int().expect("int")).collect();
            (key_bytes, ints)
        })
        .collect();
    by_bytes.sort_by(|a, b| a.0.cmp(&b.0));

    for pair in by_bytes.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }

    let body = row::encode_row_body(&rows[0]).expect("encode");
    assert_eq!(row::decode_row(&body, layout).expect("decode"), rows[0]);
}

#[test]
fn garbage_body_is_decoding_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut bytes = Vec::new();
    for value in [1u64, 1, 1] {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes.extend_from_slice(&4u64.to_be_bytes());
    bytes.extend_from_slice(&[0x09, 0x00, 0x00, 0x00]);
    std::fs::write(temp.path().join("data.out"), &bytes).expect("write");

    let err = DataStore::new(temp.path()).read().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decoding);
    assert_eq!(err.record(), Some(0));
}
