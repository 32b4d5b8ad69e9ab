// ABOUTME: Update content fingerprinting for new releases.
// ABOUTME: Rejects archives and platform binaries; hashes a file or a directory tree.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const REJECTED_EXTENSIONS: [&str; 3] = ["zip", "apk", "ipa"];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Content path does not exist.
    #[error("update content not found: {0}")]
    NotFound(PathBuf),

    /// Content is an archive or platform binary.
    #[error("archives and binaries cannot be released directly: {0}")]
    BinaryRejected(PathBuf),

    /// Content is an empty file or a directory holding no bytes.
    #[error("update content is empty: {0}")]
    Empty(PathBuf),

    #[error("failed to read update content {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Whether the bundle came from a single file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    File,
    Directory,
}

/// Fingerprinted update content ready to attach to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub package_hash: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub upload_time: u64,
    pub kind: BundleKind,
}

impl Bundle {
    /// Hash the content at `path`.
    ///
    /// Content must hold at least one byte. A file is hashed by its bytes. A directory is hashed over its sorted
    /// relative paths and each file's hash, so renames change the
    /// fingerprint but filesystem ordering does not.
    pub fn from_path(path: &Path) -> Result<Self, BundleError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BundleError::NotFound(path.to_path_buf()),
            _ => io_error(path, e),
        })?;

        if metadata.is_dir() {
            let (package_hash, size) = hash_directory(path)?;
            if size == 0 {
                return Err(BundleError::Empty(path.to_path_buf()));
            }
            return Ok(Self::new(package_hash, size, BundleKind::Directory));
        }

        if has_rejected_extension(path) {
            return Err(BundleError::BinaryRejected(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        if bytes.starts_with(&ZIP_MAGIC) {
            return Err(BundleError::BinaryRejected(path.to_path_buf()));
        }
        if bytes.is_empty() {
            return Err(BundleError::Empty(path.to_path_buf()));
        }

        Ok(Self::from_bytes(&bytes))
    }

    /// Fingerprint in-memory content as a single file.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(hex_digest(bytes), bytes.len() as u64, BundleKind::File)
    }

    fn new(package_hash: String, size: u64, kind: BundleKind) -> Self {
        Self {
            package_hash,
            size,
            upload_time: now_millis(),
            kind,
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

fn has_rejected_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            REJECTED_EXTENSIONS
                .iter()
                .any(|rejected| ext.eq_ignore_ascii_case(rejected))
        })
        .unwrap_or(false)
}

fn hash_directory(root: &Path) -> Result<(String, u64), BundleError> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();

    let mut manifest = Sha256::new();
    let mut size = 0u64;
    for relative in &files {
        let full = root.join(relative);
        let bytes = std::fs::read(&full).map_err(|e| io_error(&full, e))?;
        size += bytes.len() as u64;
        manifest.update(relative.as_bytes());
        manifest.update(b":");
        manifest.update(hex_digest(&bytes).as_bytes());
        manifest.update(b"\n");
    }

    Ok((format!("{:x}", manifest.finalize()), size))
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) -> Result<(), BundleError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;

        if file_type.is_dir() {
            collect_files(root, &path, files)?;
        } else if file_type.is_file() {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            files.push(relative);
        }
    }
    Ok(())
}

fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn io_error(path: &Path, source: std::io::Error) -> BundleError {
    BundleError::Io {
        path: path.to_path_buf(),
        source,
    }
}
