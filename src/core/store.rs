// Write-once data file holding a header and length-prefixed row records.
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::config::GenConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::generator::RowGenerator;
use crate::core::row::{self, LEN_PREFIX, Row, RowLayout};

pub const DATA_FILE_NAME: &str = "data.out";
pub const HEADER_LEN: usize = 24;

/// Row count and layout as persisted at the start of the data file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FileHeader {
    pub row_count: u64,
    pub layout: RowLayout,
}

impl FileHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        write_u64(&mut buf, 0, self.row_count);
        write_u64(&mut buf, 8, self.layout.key_size as u64);
        write_u64(&mut buf, 16, self.layout.val_size as u64);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < HEADER_LEN {
            return Err(Error::new(ErrorKind::CorruptHeader).with_message("header too small"));
        }
        let row_count = read_positive(buf, 0, "row count")?;
        let key_size = read_positive(buf, 8, "key size")?;
        let val_size = read_positive(buf, 16, "value size")?;
        let layout = RowLayout {
            key_size: usize::try_from(key_size).map_err(|_| {
                Error::new(ErrorKind::CorruptHeader).with_message("key size out of range")
            })?,
            val_size: usize::try_from(val_size).map_err(|_| {
                Error::new(ErrorKind::CorruptHeader).with_message("value size out of range")
            })?,
        };
        Ok(Self { row_count, layout })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub rows: u64,
    pub bytes: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedRows {
    pub layout: RowLayout,
    pub rows: Vec<Row>,
}

pub struct DataStore {
    dir: PathBuf,
    path: PathBuf,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(DATA_FILE_NAME);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encodes all rows into one buffer and writes it to a freshly created file.
    ///
    /// An existing data file is never opened for writing.
    pub fn write(&self, layout: RowLayout, rows: &[Row]) -> Result<WriteSummary, Error> {
        if rows.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("no rows to write"));
        }
        self.ensure_dir()?;
        self.ensure_absent()?;

        let header = FileHeader {
            row_count: rows.len() as u64,
            layout,
        };
        let capacity = rows
            .len()
            .saturating_mul(record_hint(layout))
            .saturating_add(HEADER_LEN);
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(&header.encode());
        for (idx, row) in rows.iter().enumerate() {
            if !row.layout_matches(layout) {
                return Err(Error::new(ErrorKind::Encoding)
                    .with_message(format!(
                        "row has {} key and {} value fields, layout expects {} and {}",
                        row.key.len(),
                        row.val.len(),
                        layout.key_size,
                        layout.val_size
                    ))
                    .with_record(idx as u64));
            }
            row::encode_row(&mut buf, row).map_err(|err| err.with_record(idx as u64))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|err| self.open_error(err))?;
        file.write_all(&buf)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.path).with_source(err))?;
        file.sync_all()
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.path).with_source(err))?;

        info!(path = %self.path.display(), rows = rows.len(), bytes = buf.len(), "wrote data file");
        Ok(WriteSummary {
            path: self.path.clone(),
            rows: rows.len() as u64,
            bytes: buf.len() as u64,
        })
    }

    /// Generates `config.scale` rows and writes them.
    pub fn write_generated(&self, config: &GenConfig) -> Result<WriteSummary, Error> {
        debug!(scale = config.scale, seed = config.seed, "generating rows");
        let mut generator = RowGenerator::new(config.layout, config.seed);
        let rows: Vec<Row> = generator.rows(config.scale).collect();
        self.write(config.layout, &rows)
    }

    pub fn read(&self) -> Result<LoadedRows, Error> {
        self.ensure_dir()?;
        let file = File::open(&self.path).map_err(|err| self.open_error(err))?;
        let file_len = file
            .metadata()
            .map(|meta| meta.len())
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&self.path).with_source(err))?;
        let mut reader = BufReader::new(file);

        let mut head = [0u8; HEADER_LEN];
        reader.read_exact(&mut head).map_err(|err| {
            self.short_read(err, ErrorKind::CorruptHeader, "truncated header")
                .with_offset(0)
        })?;
        let header = FileHeader::decode(&head).map_err(|err| err.with_path(&self.path))?;
        debug!(
            rows = header.row_count,
            key_size = header.layout.key_size,
            val_size = header.layout.val_size,
            "read data file header"
        );

        // Each field needs at least one byte, so the layout must fit one record.
        let field_count = header.layout.field_count() as u64;
        let record_room = file_len.saturating_sub((HEADER_LEN + LEN_PREFIX) as u64);
        if field_count > record_room {
            return Err(Error::new(ErrorKind::CorruptHeader)
                .with_message(format!(
                    "layout of {field_count} fields cannot fit in a {file_len}-byte file"
                ))
                .with_path(&self.path)
                .with_offset(8));
        }

        let capacity = header.row_count.min(file_len / LEN_PREFIX as u64) as usize;
        let mut rows = Vec::with_capacity(capacity);
        let mut offset = HEADER_LEN as u64;
        for idx in 0..header.row_count {
            let mut prefix = [0u8; LEN_PREFIX];
            reader.read_exact(&mut prefix).map_err(|err| {
                self.short_read(err, ErrorKind::CorruptRecord, "truncated record length")
                    .with_record(idx)
                    .with_offset(offset)
            })?;
            offset += LEN_PREFIX as u64;

            let body_len = u64::from_be_bytes(prefix);
            if body_len > file_len.saturating_sub(offset) {
                return Err(Error::new(ErrorKind::CorruptRecord)
                    .with_message(format!("record length {body_len} exceeds file size"))
                    .with_path(&self.path)
                    .with_record(idx)
                    .with_offset(offset));
            }
            if body_len < field_count {
                return Err(Error::new(ErrorKind::Decoding)
                    .with_message(format!(
                        "record length {body_len} is shorter than {field_count} fields"
                    ))
                    .with_path(&self.path)
                    .with_record(idx)
                    .with_offset(offset));
            }
            let mut body = vec![0u8; body_len as usize];
            reader.read_exact(&mut body).map_err(|err| {
                self.short_read(err, ErrorKind::CorruptRecord, "truncated record body")
                    .with_record(idx)
                    .with_offset(offset)
            })?;

            let row = row::decode_row(&body, header.layout).map_err(|err| {
                err.with_path(&self.path).with_record(idx).with_offset(offset)
            })?;
            rows.push(row);
            offset += body_len;
        }

        info!(path = %self.path.display(), rows = rows.len(), "loaded data file");
        Ok(LoadedRows {
            layout: header.layout,
            rows,
        })
    }

    fn ensure_dir(&self) -> Result<(), Error> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::new(ErrorKind::DirectoryNotFound)
                .with_message("data path is not a directory")
                .with_path(&self.dir)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::new(ErrorKind::DirectoryNotFound)
                    .with_message("data directory does not exist")
                    .with_path(&self.dir))
            }
            Err(err) => Err(Error::new(ErrorKind::Io).with_path(&self.dir).with_source(err)),
        }
    }

    fn ensure_absent(&self) -> Result<(), Error> {
        match self.path.try_exists() {
            Ok(false) => Ok(()),
            Ok(true) => Err(already_exists(&self.path)),
            Err(err) => Err(Error::new(ErrorKind::Io).with_path(&self.path).with_source(err)),
        }
    }

    fn open_error(&self, err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::NotFound => Error::new(ErrorKind::FileNotFound)
                .with_message("data file does not exist")
                .with_path(&self.path),
            io::ErrorKind::AlreadyExists => already_exists(&self.path),
            _ => Error::new(ErrorKind::Io).with_path(&self.path).with_source(err),
        }
    }

    fn short_read(&self, err: io::Error, kind: ErrorKind, message: &str) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::new(kind).with_message(message).with_path(&self.path)
        } else {
            Error::new(ErrorKind::Io).with_path(&self.path).with_source(err)
        }
    }
}

fn already_exists(path: &Path) -> Error {
    Error::new(ErrorKind::FileAlreadyExists)
        .with_message("data file already exists")
        .with_path(path)
}

// Each generated field is an int datum: one flag byte and eight payload bytes.
fn record_hint(layout: RowLayout) -> usize {
    layout.field_count().saturating_mul(9).saturating_add(LEN_PREFIX)
}

fn read_positive(buf: &[u8], offset: usize, field: &str) -> Result<u64, Error> {
    let value = read_u64(buf, offset);
    if value == 0 || value > i64::MAX as u64 {
        return Err(Error::new(ErrorKind::CorruptHeader)
            .with_message(format!("{field} must be positive, got {}", value as i64))
            .with_offset(offset as u64));
    }
    Ok(value)
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut out = [0u8; 8];
    out.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_be_bytes(out)
}

fn write_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
}
