//! Dataset acquisition: download, cache, and unpack the PCOS survey table.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default Kaggle dataset slug
pub const DEFAULT_DATASET: &str = "prasoonkottarathil/polycystic-ovary-syndrome-pcos";
/// Preferred table file inside the dataset archive
pub const CSV_FILENAME: &str = "PCOS_data_without_infertility.csv";
/// Fallback spreadsheet inside the dataset archive
pub const XLSX_FILENAME: &str = "PCOS_data_without_infertility.xlsx";
/// Zero-based sheet index holding the survey table in the spreadsheet
pub const XLSX_SHEET_INDEX: usize = 1;
/// Base URL for unauthenticated dataset downloads
pub const DOWNLOAD_BASE_URL: &str = "https://www.kaggle.com/api/v1/datasets/download";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ARCHIVE_BYTES: usize = 256 * 1024 * 1024;
const MAX_ZIP_ENTRIES: usize = 1_000;
const MAX_ZIP_ENTRY_UNCOMPRESSED_BYTES: u64 = 512 * 1024 * 1024;
const MAX_ZIP_TOTAL_UNCOMPRESSED_BYTES: u64 = 1024 * 1024 * 1024;

/// Location of a loadable table on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// Delimited text file (CSV/TSV, optionally gzipped)
    Delimited(PathBuf),
    /// Spreadsheet file with the table on the given sheet
    Spreadsheet {
        /// Path to the workbook
        path: PathBuf,
        /// Zero-based sheet index
        sheet: usize,
    },
}

impl TableSource {
    /// Classify a path by extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "tsv" | "gz" => Ok(TableSource::Delimited(path.to_path_buf())),
            "xlsx" => Ok(TableSource::Spreadsheet {
                path: path.to_path_buf(),
                sheet: XLSX_SHEET_INDEX,
            }),
            _ => bail!("Unsupported table format: {:?}", path),
        }
    }

    /// Get the underlying file path
    pub fn path(&self) -> &Path {
        match self {
            TableSource::Delimited(path) => path,
            TableSource::Spreadsheet { path, .. } => path,
        }
    }
}

/// Find the survey table in an extracted dataset directory.
///
/// The CSV export is preferred; the spreadsheet is a fallback because its
/// first sheet is a cover page and only the second holds the table.
pub fn locate_table<P: AsRef<Path>>(dir: P) -> Result<TableSource> {
    let dir = dir.as_ref();
    let csv = dir.join(CSV_FILENAME);
    if csv.is_file() {
        return Ok(TableSource::Delimited(csv));
    }

    let xlsx = dir.join(XLSX_FILENAME);
    if xlsx.is_file() {
        warn!("CSV table not found, falling back to spreadsheet: {:?}", xlsx);
        return Ok(TableSource::Spreadsheet {
            path: xlsx,
            sheet: XLSX_SHEET_INDEX,
        });
    }

    bail!(
        "No usable table in {:?} (expected {} or {})",
        dir,
        CSV_FILENAME,
        XLSX_FILENAME
    );
}

/// Downloads and caches dataset archives
pub struct DatasetFetcher {
    agent: ureq::Agent,
    base_url: String,
    cache_dir: PathBuf,
}

impl DatasetFetcher {
    /// Create a fetcher using the per-user cache directory
    pub fn new() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "pcosnet")
            .context("Could not determine a cache directory")?;
        Ok(Self::with_cache_dir(dirs.cache_dir()))
    }

    /// Create a fetcher with an explicit cache directory
    pub fn with_cache_dir<P: AsRef<Path>>(cache_dir: P) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self {
            agent,
            base_url: DOWNLOAD_BASE_URL.to_string(),
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    /// Override the download base URL
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Ensure the dataset is available locally, downloading it if needed.
    ///
    /// Returns the extraction directory. A previously extracted copy that
    /// still contains a usable table is reused without touching the network.
    pub fn fetch(&self, dataset: &str) -> Result<PathBuf> {
        let extract_dir = self.cache_dir.join(dataset.replace('/', "_"));
        if locate_table(&extract_dir).is_ok() {
            info!("Using cached dataset at {:?}", extract_dir);
            return Ok(extract_dir);
        }

        crate::utils::ensure_dir(&self.cache_dir)?;
        let archive_path = extract_dir.with_extension("zip");

        if archive_path.is_file() {
            info!("Using cached archive at {:?}", archive_path);
        } else {
            let url = format!("{}/{}", self.base_url, dataset);
            info!("Downloading dataset {} from {}", dataset, url);
            self.download(&url, &archive_path)?;
        }

        crate::utils::ensure_dir(&extract_dir)?;
        if let Err(err) = extract_archive(&archive_path, &extract_dir) {
            // A bad archive must not survive to poison the next run
            let _ = std::fs::remove_file(&archive_path);
            return Err(err);
        }
        std::fs::remove_file(&archive_path)
            .with_context(|| format!("Failed to remove archive {:?}", archive_path))?;

        // Fail now rather than during load if the archive was unexpected.
        locate_table(&extract_dir)?;
        Ok(extract_dir)
    }

    /// Stream a URL to disk with a hard size limit.
    ///
    /// The body goes to a temporary path first; `dest` only ever holds a
    /// fully downloaded archive.
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", concat!("pcosnet/", env!("CARGO_PKG_VERSION")))
            .call()
            .with_context(|| format!("Request failed: {}", url))?;

        let tmp = dest.with_extension("part");
        let copied = File::create(&tmp)
            .with_context(|| format!("Failed to create {:?}", tmp))
            .and_then(|mut file| {
                copy_response(response, &mut file, MAX_ARCHIVE_BYTES)
                    .with_context(|| format!("Download failed: {}", url))
            });
        if let Err(err) = copied {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }

        std::fs::rename(&tmp, dest)
            .with_context(|| format!("Failed to move {:?} into place", tmp))?;
        Ok(())
    }
}

/// Stream a response body to a writer, enforcing a maximum byte size
fn copy_response(
    response: ureq::Response,
    writer: &mut impl Write,
    max_bytes: usize,
) -> Result<()> {
    if let Some(length) = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok())
    {
        if length > max_bytes as u64 {
            bail!("Response too large: {} bytes", length);
        }
    }

    let mut reader = response.into_reader().take(max_bytes as u64 + 1);
    let mut total = 0usize;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        total += read;
        if total > max_bytes {
            bail!("Response exceeded {} bytes", max_bytes);
        }
        writer.write_all(&buf[..read])?;
    }
    Ok(())
}

/// Extract a zip archive into a directory while enforcing safety limits
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive {:?}", archive_path))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

    let entry_count = archive.len();
    if entry_count > MAX_ZIP_ENTRIES {
        bail!("Archive has {} entries, limit is {}", entry_count, MAX_ZIP_ENTRIES);
    }

    let mut total_uncompressed: u64 = 0;
    for i in 0..entry_count {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {}", i))?;

        let uncompressed_size = entry.size();
        if uncompressed_size > MAX_ZIP_ENTRY_UNCOMPRESSED_BYTES {
            bail!(
                "Archive entry '{}' is too large ({} bytes)",
                entry.name(),
                uncompressed_size
            );
        }
        total_uncompressed += uncompressed_size;
        if total_uncompressed > MAX_ZIP_TOTAL_UNCOMPRESSED_BYTES {
            bail!("Archive extracted size exceeds limit");
        }

        // enclosed_name() rejects paths escaping the destination
        let outpath = match entry.enclosed_name() {
            Some(path) => dest_dir.join(path),
            None => {
                warn!("Skipping archive entry with unsafe path: {}", entry.name());
                continue;
            }
        };

        if entry.name().ends_with('/') {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        debug!("Extracting {:?}", outpath);
        let mut outfile = File::create(&outpath)
            .with_context(|| format!("Failed to create {:?}", outpath))?;
        std::io::copy(&mut entry, &mut outfile)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_table_source_from_path() {
        assert_eq!(
            TableSource::from_path("data.csv").unwrap(),
            TableSource::Delimited(PathBuf::from("data.csv"))
        );
        assert_eq!(
            TableSource::from_path("data.xlsx").unwrap(),
            TableSource::Spreadsheet {
                path: PathBuf::from("data.xlsx"),
                sheet: XLSX_SHEET_INDEX,
            }
        );
        assert!(TableSource::from_path("data.parquet").is_err());
    }

    #[test]
    fn test_locate_table_prefers_csv() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CSV_FILENAME), b"a,b\n").unwrap();
        std::fs::write(dir.path().join(XLSX_FILENAME), b"").unwrap();

        let source = locate_table(dir.path()).unwrap();
        assert!(matches!(source, TableSource::Delimited(_)));
    }

    #[test]
    fn test_locate_table_falls_back_to_xlsx() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(XLSX_FILENAME), b"").unwrap();

        let source = locate_table(dir.path()).unwrap();
        assert_eq!(
            source,
            TableSource::Spreadsheet {
                path: dir.path().join(XLSX_FILENAME),
                sheet: XLSX_SHEET_INDEX,
            }
        );
    }

    #[test]
    fn test_locate_table_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(locate_table(dir.path()).is_err());
    }

    #[test]
    fn test_extract_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("data.zip");
        write_zip(
            &archive,
            &[(CSV_FILENAME, b"PCOS (Y/N),BMI\n1,24.5\n".as_slice())],
        );

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        extract_archive(&archive, &out).unwrap();

        let contents = std::fs::read_to_string(out.join(CSV_FILENAME)).unwrap();
        assert!(contents.contains("24.5"));
    }

    #[test]
    fn test_extract_archive_skips_unsafe_paths() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", b"nope".as_slice())]);

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        extract_archive(&archive, &out).unwrap();

        assert!(!dir.path().join("escape.txt").exists());
        assert!(!out.join("escape.txt").exists());
    }

    #[test]
    fn test_fetch_uses_cached_copy() {
        let cache = TempDir::new().unwrap();
        let extract_dir = cache.path().join("owner_name");
        std::fs::create_dir_all(&extract_dir).unwrap();
        std::fs::write(extract_dir.join(CSV_FILENAME), b"a,b\n").unwrap();

        // Unroutable base URL proves no network traffic happens on a cache hit.
        let fetcher = DatasetFetcher::with_cache_dir(cache.path())
            .with_base_url("http://127.0.0.1:1/none");
        let dir = fetcher.fetch("owner/name").unwrap();
        assert_eq!(dir, extract_dir);
    }

    #[test]
    fn test_fetch_extracts_cached_archive() {
        let cache = TempDir::new().unwrap();
        let archive = cache.path().join("owner_name.zip");
        write_zip(&archive, &[(CSV_FILENAME, b"a,b\n".as_slice())]);

        let fetcher = DatasetFetcher::with_cache_dir(cache.path())
            .with_base_url("http://127.0.0.1:1/none");
        let dir = fetcher.fetch("owner/name").unwrap();

        assert!(dir.join(CSV_FILENAME).is_file());
        assert!(!archive.exists());
    }

    #[test]
    fn test_corrupt_cached_archive_is_discarded() {
        let cache = TempDir::new().unwrap();
        let archive = cache.path().join("owner_name.zip");
        std::fs::write(&archive, b"PK\x03\x04truncated").unwrap();

        let fetcher = DatasetFetcher::with_cache_dir(cache.path())
            .with_base_url("http://127.0.0.1:1/none");

        assert!(fetcher.fetch("owner/name").is_err());
        // The bad archive is gone, so the next run re-downloads instead of
        // failing on the same file again.
        assert!(!archive.exists());
    }
}
