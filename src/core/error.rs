// Error model shared by the codec, the data store, and the CLI.
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    DirectoryNotFound,
    FileNotFound,
    FileAlreadyExists,
    CorruptHeader,
    CorruptRecord,
    Encoding,
    Decoding,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    path: Option<PathBuf>,
    record: Option<u64>,
    offset: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            path: None,
            record: None,
            offset: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Zero-based index of the row record the error refers to.
    pub fn record(&self) -> Option<u64> {
        self.record
    }

    /// Byte offset into the data file.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_record(mut self, record: u64) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(record) = self.record {
            write!(f, " (record: {record})")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {offset})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::DirectoryNotFound => 3,
        ErrorKind::FileNotFound => 4,
        ErrorKind::FileAlreadyExists => 5,
        ErrorKind::CorruptHeader => 6,
        ErrorKind::CorruptRecord => 7,
        ErrorKind::Encoding => 8,
        ErrorKind::Decoding => 9,
        ErrorKind::Io => 10,
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::io;

    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::DirectoryNotFound, 3),
            (ErrorKind::FileNotFound, 4),
            (ErrorKind::FileAlreadyExists, 5),
            (ErrorKind::CorruptHeader, 6),
            (ErrorKind::CorruptRecord, 7),
            (ErrorKind::Encoding, 8),
            (ErrorKind::Decoding, 9),
            (ErrorKind::Io, 10),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::CorruptRecord)
            .with_message("truncated record body")
            .with_path("/tmp/data.out")
            .with_record(2)
            .with_offset(96);
        assert_eq!(
            err.to_string(),
            "CorruptRecord: truncated record body (path: /tmp/data.out) (record: 2) (offset: 96)"
        );
    }

    #[test]
    fn source_is_preserved() {
        let err = Error::new(ErrorKind::Io)
            .with_source(io::Error::other("disk full"));
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "disk full");
    }
}
