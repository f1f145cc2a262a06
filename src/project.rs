//! Saving and loading annotation projects.
//!
//! A project is a JSON document holding every stroke plus an optional
//! reference to the background document. Large payloads are gzip-compressed;
//! loading detects compression from the magic bytes.

use crate::draw::Stroke;
use anyhow::{Context, Result};
use chrono::Utc;
use flate2::{Compression, bufread::GzDecoder, write::GzEncoder};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Format version written by this build.
pub const PROJECT_VERSION: u32 = 1;

/// Payloads at least this large are written compressed.
pub const DEFAULT_COMPRESS_THRESHOLD_BYTES: u64 = 100 * 1024;

/// The background document a project was annotated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRef {
    pub path: PathBuf,
    pub page_count: u32,
}

/// On-disk project contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: u32,
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
    #[serde(default)]
    pub background: Option<BackgroundRef>,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

impl ProjectFile {
    /// Stamps a new project with the current version and time.
    pub fn new(strokes: Vec<Stroke>, background: Option<BackgroundRef>) -> Self {
        Self {
            version: PROJECT_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            background,
            strokes,
        }
    }
}

/// Outcome of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub bytes: usize,
    pub compressed: bool,
}

/// Saves `project` to `path` using the default compression threshold.
pub fn save(path: &Path, project: &ProjectFile) -> Result<SaveReport> {
    save_with_threshold(path, project, DEFAULT_COMPRESS_THRESHOLD_BYTES)
}

/// Saves `project` to `path`, compressing when the JSON payload reaches
/// `compress_threshold` bytes.
///
/// The write goes to a temporary sibling first; any existing file is kept as
/// `<path>.bak` before the temporary file is renamed into place.
pub fn save_with_threshold(
    path: &Path,
    project: &ProjectFile,
    compress_threshold: u64,
) -> Result<SaveReport> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create project directory {}", parent.display())
        })?;
    }

    let lock_path = sibling(path, ".lock");
    let lock_file = open_lock(&lock_path)?;
    lock_file
        .lock_exclusive()
        .with_context(|| format!("failed to lock project file {}", lock_path.display()))?;

    let result = save_inner(path, project, compress_threshold);

    lock_file.unlock().unwrap_or_else(|err| {
        warn!(
            "failed to unlock project file {}: {}",
            lock_path.display(),
            err
        )
    });

    result
}

fn save_inner(path: &Path, project: &ProjectFile, compress_threshold: u64) -> Result<SaveReport> {
    let mut payload =
        serde_json::to_vec_pretty(project).context("failed to serialise project")?;

    let compressed = payload.len() as u64 >= compress_threshold;
    if compressed {
        payload = compress_bytes(&payload)?;
    }

    let tmp_path = temp_path(path);
    let mut tmp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .with_context(|| {
            format!(
                "failed to open temporary project file {}",
                tmp_path.display()
            )
        })?;
    let written = tmp_file
        .write_all(&payload)
        .context("failed to write project payload")
        .and_then(|()| {
            tmp_file
                .sync_all()
                .context("failed to sync temporary project file")
        });
    drop(tmp_file);

    if let Err(err) = written.and_then(|()| replace_with(path, &tmp_path)) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            warn!(
                "failed to remove temporary project file {}: {}",
                tmp_path.display(),
                cleanup
            );
        }
        return Err(err);
    }

    info!(
        "Project saved to {} ({} strokes, {} bytes, compression={})",
        path.display(),
        project.strokes.len(),
        payload.len(),
        compressed
    );

    Ok(SaveReport {
        bytes: payload.len(),
        compressed,
    })
}

/// Rotates the current file to `.bak` and moves `tmp_path` into its place.
fn replace_with(path: &Path, tmp_path: &Path) -> Result<()> {
    if path.exists() {
        let backup_path = sibling(path, ".bak");
        if backup_path.exists() {
            fs::remove_file(&backup_path).ok();
        }
        fs::rename(path, &backup_path).with_context(|| {
            format!(
                "failed to rotate previous project file {} -> {}",
                path.display(),
                backup_path.display()
            )
        })?;
    }

    fs::rename(tmp_path, path).with_context(|| {
        format!(
            "failed to move temporary project file {} -> {}",
            tmp_path.display(),
            path.display()
        )
    })
}

/// Loads a project, decompressing it when needed.
pub fn load(path: &Path) -> Result<ProjectFile> {
    if !path.exists() {
        anyhow::bail!("project file {} does not exist", path.display());
    }

    let lock_path = sibling(path, ".lock");
    let lock_file = open_lock(&lock_path)?;
    lock_file
        .lock_shared()
        .with_context(|| format!("failed to acquire shared lock {}", lock_path.display()))?;

    let result = load_inner(path);

    lock_file.unlock().unwrap_or_else(|err| {
        warn!(
            "failed to unlock project file {}: {}",
            lock_path.display(),
            err
        )
    });

    result
}

fn load_inner(path: &Path) -> Result<ProjectFile> {
    let mut file_bytes = Vec::new();
    File::open(path)
        .with_context(|| format!("failed to open project file {}", path.display()))?
        .read_to_end(&mut file_bytes)
        .context("failed to read project file")?;

    let compressed = is_gzip(&file_bytes);
    let json = if compressed {
        let mut decoder = GzDecoder::new(&file_bytes[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .context("failed to decompress project file")?;
        out
    } else {
        file_bytes
    };

    let project: ProjectFile = serde_json::from_slice(&json)
        .with_context(|| format!("failed to parse project {}", path.display()))?;

    if project.version > PROJECT_VERSION {
        warn!(
            "Project {} was written by a newer version ({} > {}); unknown fields are ignored",
            path.display(),
            project.version,
            PROJECT_VERSION
        );
    }
    debug!(
        "Loaded {} stroke(s) from {} (compressed={})",
        project.strokes.len(),
        path.display(),
        compressed
    );

    Ok(project)
}

fn open_lock(lock_path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("failed to open project lock file {}", lock_path.display()))
}

fn compress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .context("failed to compress project payload")?;
    encoder
        .finish()
        .context("failed to finalise compressed project payload")
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() > 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn temp_path(target: &Path) -> PathBuf {
    let mut candidate = sibling(target, ".tmp");
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        candidate = sibling(target, &format!(".tmp{counter}"));
    }
    candidate
}
