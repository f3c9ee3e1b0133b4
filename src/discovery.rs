//! Discovery of report files on disk.
//!
//! Every report module declares one or more [`LogCategory`]s: a name, a
//! wildcard pattern for matching file names and the suffix that is removed
//! when deriving a sample name. The input paths are scanned once and each
//! module then asks for the files belonging to its categories.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::utils::glob::Glob;

/// Extensions removed from file names before the category suffix is removed.
const DATA_EXTENSIONS: &[&str] = &[".csv", ".json", ".txt", ".tsv", ".log"];

/// Extension of gzip compressed reports.
const GZIP_EXTENSION: &str = ".gz";

//==============//
// Log category //
//==============//

/// A kind of report file.
#[derive(Clone, Copy, Debug)]
pub struct LogCategory {
    /// Name of the category, e.g. `starsolo/summary`.
    pub name: &'static str,

    /// Wildcard pattern matching (uncompressed) file names.
    pub pattern: &'static str,

    /// Suffix removed from the file stem to get the sample name.
    pub strip_suffix: &'static str,
}

impl LogCategory {
    /// Creates a new [`LogCategory`].
    pub const fn new(name: &'static str, pattern: &'static str, strip_suffix: &'static str) -> Self {
        LogCategory {
            name,
            pattern,
            strip_suffix,
        }
    }
}

//==========//
// Log file //
//==========//

/// A report file matching a [`LogCategory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFile {
    /// Full path to the file.
    pub path: PathBuf,

    /// Directory containing the file.
    pub root: PathBuf,

    /// Name of the file.
    pub file_name: String,

    /// Sample name derived from the file name.
    pub sample_name: String,
}

impl LogFile {
    /// Opens the file for reading, decompressing it if it is gzipped. The
    /// handle is closed when the returned reader is dropped.
    pub fn open(&self) -> io::Result<Box<dyn Read>> {
        let file = File::open(&self.path)?;

        match self.file_name.ends_with(GZIP_EXTENSION) {
            true => Ok(Box::new(MultiGzDecoder::new(BufReader::new(file)))),
            false => Ok(Box::new(BufReader::new(file))),
        }
    }
}

/// Derives a sample name from a file name: the `.gz` extension, one data
/// extension and finally the category suffix are removed (if present).
///
/// ```
/// use scqc::discovery::clean_sample_name;
///
/// assert_eq!(clean_sample_name("s1.summary.json", ".summary"), "s1");
/// assert_eq!(clean_sample_name("s1_bc_stat.txt.gz", "_bc_stat"), "s1");
/// assert_eq!(clean_sample_name("s1.csv", ".bcrank"), "s1");
/// ```
pub fn clean_sample_name(file_name: &str, strip_suffix: &str) -> String {
    let mut name = file_name.strip_suffix(GZIP_EXTENSION).unwrap_or(file_name);

    for ext in DATA_EXTENSIONS {
        if let Some(stripped) = name.strip_suffix(ext) {
            name = stripped;
            break;
        }
    }

    if !strip_suffix.is_empty() {
        name = name.strip_suffix(strip_suffix).unwrap_or(name);
    }

    name.to_string()
}

//===========//
// Log files //
//===========//

/// All files found beneath the input paths.
#[derive(Debug, Default)]
pub struct LogFiles {
    files: Vec<PathBuf>,
}

impl LogFiles {
    /// Recursively scans the input paths (files or directories).
    pub fn scan(paths: &[PathBuf]) -> anyhow::Result<Self> {
        let mut files = Vec::new();

        for path in paths {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                collect_files(path, &mut files)
                    .with_context(|| format!("could not scan directory: {}", path.display()))?;
            } else {
                bail!("input path does not exist: {}", path.display());
            }
        }

        debug!("Found {} files to search.", files.len());
        Ok(LogFiles { files })
    }

    /// The number of files scanned.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files were found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Finds every file belonging to a category.
    pub fn find(&self, category: &LogCategory) -> anyhow::Result<Vec<LogFile>> {
        let glob = Glob::new(category.pattern)
            .with_context(|| format!("invalid pattern for category {}", category.name))?;

        let mut results = Vec::new();

        for path in &self.files {
            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n,
                None => continue,
            };

            let uncompressed = file_name.strip_suffix(GZIP_EXTENSION).unwrap_or(file_name);
            if !glob.is_match(uncompressed) {
                continue;
            }

            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            results.push(LogFile {
                path: path.clone(),
                root,
                file_name: file_name.to_string(),
                sample_name: clean_sample_name(file_name, category.strip_suffix),
            });
        }

        debug!(
            "Found {} files for category {}.",
            results.len(),
            category.name
        );
        Ok(results)
    }
}

fn collect_files(directory: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries = fs::read_dir(directory)?
        .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?))))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (path, file_type) in entries {
        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if file_type.is_symlink() && path.is_dir() {
            debug!("Not following directory link {}.", path.display());
        } else if path.is_file() {
            files.push(path);
        }
    }

    Ok(())
}
