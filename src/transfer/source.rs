use bytes::Bytes;
use std::fs;
use std::io;
use std::path::Path;

/// A named blob ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    name: String,
    data: Bytes,
}

impl FileSource {
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Read a whole file from disk; the name is the final path component.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?
            .to_owned();
        let data = fs::read(path)?;
        Ok(Self::from_bytes(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn from_path_uses_the_file_name() {
        let dir = std::env::temp_dir().join(format!("deepdrop_source_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("notes.txt");
        fs::write(&path, b"hello").expect("write");

        let src = FileSource::from_path(&path).expect("read back");
        assert_eq!(src.name(), "notes.txt");
        assert_eq!(src.size(), 5);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(FileSource::from_path("/definitely/not/here.bin").is_err());
    }
}
