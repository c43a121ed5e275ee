use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::events::DeliveredFile;

const FALLBACK_NAME: &str = "download";

/// Reduce a peer-supplied name to a single safe path component.
///
/// Directory parts are dropped, separators and control characters become
/// `_`, and names that are empty or only dots fall back to `download`.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| match c {
            c if c.is_control() => '_',
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Write a delivered file into `dir` and return where it landed.
///
/// Existing files are never overwritten; a ` (n)` suffix is added instead.
pub fn save_delivered(dir: &Path, file: &DeliveredFile) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let name = sanitize_file_name(&file.file_name);
    let path = Path::new(&name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(FALLBACK_NAME)
        .to_owned();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut dest = dir.join(&name);
    let mut counter = 1;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&dest) {
            Ok(f) => {
                let mut out = BufWriter::new(f);
                out.write_all(&file.data)?;
                out.flush()?;
                return Ok(dest);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                dest = dir.join(format!("{stem} ({counter}){extension}"));
                counter += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::relay::types::SessionId;
    use bytes::Bytes;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\a.txt"), "a.txt");
        assert_eq!(sanitize_file_name("we?ird|name\n.txt"), "we_ird_name_.txt");
        assert_eq!(sanitize_file_name(".."), "download");
        assert_eq!(sanitize_file_name(""), "download");
        assert_eq!(sanitize_file_name("dir/"), "download");
    }

    #[test]
    fn save_never_overwrites() {
        let dir = std::env::temp_dir().join(format!("deepdrop_storage_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let file = DeliveredFile {
            peer: SessionId::from("p"),
            file_name: "report.pdf".into(),
            data: Bytes::from_static(b"%PDF"),
        };

        let first = save_delivered(&dir, &file).expect("first save");
        let second = save_delivered(&dir, &file).expect("second save");

        assert_eq!(first, dir.join("report.pdf"));
        assert_eq!(second, dir.join("report (1).pdf"));
        assert_eq!(fs::read(&second).expect("read back"), b"%PDF");

        let _ = fs::remove_dir_all(&dir);
    }
}
