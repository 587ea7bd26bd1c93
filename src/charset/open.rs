//! Open files by path as UTF-8 readers.

use super::config::ReaderOptions;
use super::detect::Resolution;
use super::error::{CharsetReaderError, Result};
use super::Utf8Reader;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// An opened file read through a [`Utf8Reader`].
///
/// Dropping it closes the file silently; use [`TextFile::close`] to learn
/// about failures.
pub struct TextFile {
    path: PathBuf,
    reader: Utf8Reader<File>,
}

impl TextFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resolution(&self) -> &Resolution {
        self.reader.resolution()
    }

    /// Sync and close the file, reporting any failure.
    ///
    /// Some platforms refuse to flush a handle opened read-only; that is
    /// reported as nothing to flush rather than as a failure.
    pub fn close(self) -> Result<()> {
        let TextFile { path, reader } = self;
        let file = reader.into_inner();
        let synced = file.sync_all();
        drop(file);
        check_synced(path, synced)
    }

    /// Like [`close`](Self::close), panicking on failure.
    pub fn must_close(self) {
        if let Err(e) = self.close() {
            panic!("{e}");
        }
    }
}

fn check_synced(path: PathBuf, synced: io::Result<()>) -> Result<()> {
    match synced {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::trace!(path = ?path, "read-only handle, nothing to sync");
            Ok(())
        }
        Err(source) => {
            tracing::warn!(path = ?path, "failed to sync before close: {:?}", source);
            Err(CharsetReaderError::Close { path, source })
        }
    }
}

impl Read for TextFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Open `path` with default options.
pub fn open(path: impl AsRef<Path>) -> Result<TextFile> {
    open_with_options(path, &ReaderOptions::default())
}

/// Open `path`. The file is released again if the reader cannot be set up.
pub fn open_with_options(path: impl AsRef<Path>, options: &ReaderOptions) -> Result<TextFile> {
    let path = path.as_ref().to_path_buf();
    let file = File::open(&path).map_err(|source| CharsetReaderError::Open {
        path: path.clone(),
        source,
    })?;
    let reader = Utf8Reader::with_options(file, options).inspect_err(|e| {
        tracing::debug!(path = ?path, category = e.category(), "closed file after failed setup");
    })?;
    tracing::debug!(
        path = ?path,
        encoding = reader.resolution().name(),
        "opened text file"
    );
    Ok(TextFile { path, reader })
}

/// Open `path`, panicking on failure.
pub fn must_open(path: impl AsRef<Path>) -> TextFile {
    open(path).unwrap_or_else(|e| panic!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_open_and_close() {
        let file = temp_file(&[0xFF, 0xFE, b'h', 0x00, b'i', 0x00]);
        let mut text = open(file.path()).unwrap();
        assert_eq!(text.path(), file.path());
        assert_eq!(text.resolution().name(), "utf-16le");
        let mut out = String::new();
        text.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hi");
        text.close().unwrap();
    }

    #[test]
    fn test_open_with_options() {
        let file = temp_file(b"caf\xe9");
        let options = ReaderOptions::with_content_type("text/plain; charset=windows-1252");
        let mut text = open_with_options(file.path(), &options).unwrap();
        assert!(text.resolution().certain);
        let mut out = String::new();
        text.read_to_string(&mut out).unwrap();
        assert_eq!(out, "café");
        text.must_close();
    }

    #[test]
    fn test_open_empty_file() {
        let file = temp_file(b"");
        let mut text = must_open(file.path());
        let mut out = Vec::new();
        text.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
        text.must_close();
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = open(&missing).err().unwrap();
        assert_eq!(err.category(), "open");
        assert!(matches!(err, CharsetReaderError::Open { ref path, .. } if *path == missing));
    }

    #[test]
    fn test_close_sync_errors() {
        let path = PathBuf::from("read-only.txt");
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        assert!(check_synced(path.clone(), Err(denied)).is_ok());

        let failed = io::Error::other("device gone");
        let err = check_synced(path.clone(), Err(failed)).unwrap_err();
        assert_eq!(err.category(), "close");
        assert!(matches!(err, CharsetReaderError::Close { path: ref p, .. } if *p == path));

        assert!(check_synced(path, Ok(())).is_ok());
    }

    #[test]
    #[should_panic]
    fn test_must_open_missing_file_panics() {
        let dir = tempfile::tempdir().unwrap();
        must_open(dir.path().join("missing.txt"));
    }
}
