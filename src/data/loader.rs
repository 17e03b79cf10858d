use crate::data::{
    SubjectRecord, COL_BMI, COL_CYCLE, COL_FAMILY_HISTORY, COL_HAIR_GROWTH, COL_HAIR_LOSS,
    COL_LABEL, COL_PIMPLES, COL_SKIN_DARKENING, COL_VOICE_JITTER,
};
use anyhow::{Context, Result};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Supported delimited file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
    GzippedCsv,
    GzippedTsv,
}

impl FileFormat {
    /// Detect file format from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str());
        let stem = path.file_stem().and_then(|s| s.to_str());

        match (ext, stem) {
            (Some("gz"), Some(stem)) => {
                if stem.ends_with(".csv") {
                    Ok(FileFormat::GzippedCsv)
                } else if stem.ends_with(".tsv") || stem.ends_with(".txt") {
                    Ok(FileFormat::GzippedTsv)
                } else {
                    Err(anyhow::anyhow!("Cannot determine format of gzipped file"))
                }
            }
            (Some("csv"), _) => Ok(FileFormat::Csv),
            (Some("tsv"), _) | (Some("txt"), _) => Ok(FileFormat::Tsv),
            _ => Err(anyhow::anyhow!("Unsupported file format")),
        }
    }

    /// Get delimiter character
    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv | FileFormat::GzippedCsv => b',',
            FileFormat::Tsv | FileFormat::GzippedTsv => b'\t',
        }
    }

    /// Check if format is gzipped
    pub fn is_gzipped(&self) -> bool {
        matches!(self, FileFormat::GzippedCsv | FileFormat::GzippedTsv)
    }
}

/// Data loader for subject records
pub struct DataLoader;

impl DataLoader {
    /// Create new data loader
    pub fn new() -> Self {
        Self
    }

    /// Load subject records from a delimited file (CSV/TSV, optionally gzipped)
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<SubjectRecord>> {
        let path = path.as_ref();
        info!("Loading data from {:?}", path);

        let format = FileFormat::from_path(path)?;
        debug!("Detected file format: {:?}", format);

        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let records = if format.is_gzipped() {
            self.parse_records(BufReader::new(GzDecoder::new(file)), format)?
        } else {
            self.parse_records(BufReader::new(file), format)?
        };

        info!("Loaded {} records", records.len());
        Ok(records)
    }

    /// Load subject records from a sheet of an Excel workbook
    pub fn load_sheet<P: AsRef<Path>>(&self, path: P, sheet: usize) -> Result<Vec<SubjectRecord>> {
        let path = path.as_ref();
        info!("Loading sheet {} from {:?}", sheet, path);

        let mut workbook: Xlsx<_> =
            open_workbook(path).with_context(|| format!("Failed to open workbook {:?}", path))?;
        let range = workbook
            .worksheet_range_at(sheet)
            .with_context(|| format!("Workbook has no sheet at index {}", sheet))?
            .context("Failed to read worksheet")?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .context("Worksheet is empty")?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();
        debug!("Headers: {:?}", headers);

        let records = rows
            .map(|row| {
                let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
                parse_subject_record(&headers, &cells)
            })
            .collect::<Vec<_>>();

        info!("Loaded {} records", records.len());
        Ok(records)
    }

    /// Parse records from a delimited reader
    fn parse_records<R: Read>(&self, reader: R, format: FileFormat) -> Result<Vec<SubjectRecord>> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read header row")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        debug!("Headers: {:?}", headers);

        let mut records = Vec::new();
        for (line, result) in csv_reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
                    records.push(parse_subject_record(&headers, &cells));
                }
                Err(e) => {
                    warn!("Failed to parse record at line {}: {}", line + 2, e);
                }
            }
        }

        Ok(records)
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a single subject record from header-indexed cells.
///
/// Unparsable numeric cells become absent values; the label must parse
/// as 0 or 1 or is treated as absent.
fn parse_subject_record(headers: &[String], cells: &[String]) -> SubjectRecord {
    let get_field = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| cells.get(idx).map(|s| s.trim()))
    };

    let get_f32 = |name: &str| -> Option<f32> {
        get_field(name)
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|v| !v.is_nan() && !v.is_infinite())
    };

    SubjectRecord {
        cycle_code: get_f32(COL_CYCLE),
        hair_growth: get_f32(COL_HAIR_GROWTH),
        skin_darkening: get_f32(COL_SKIN_DARKENING),
        hair_loss: get_f32(COL_HAIR_LOSS),
        pimples: get_f32(COL_PIMPLES),
        bmi: get_f32(COL_BMI),
        voice_jitter: get_f32(COL_VOICE_JITTER),
        family_history: get_f32(COL_FAMILY_HISTORY),
        label: get_field(COL_LABEL)
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|&v| v == 0.0 || v == 1.0)
            .map(|v| v as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_file_format_detection() {
        assert_eq!(FileFormat::from_path("data.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path("data.tsv").unwrap(), FileFormat::Tsv);
        assert_eq!(
            FileFormat::from_path("data.csv.gz").unwrap(),
            FileFormat::GzippedCsv
        );
        assert_eq!(
            FileFormat::from_path("data.tsv.gz").unwrap(),
            FileFormat::GzippedTsv
        );
        assert!(FileFormat::from_path("data.xlsx").is_err());
    }

    #[test]
    fn test_parse_simple_csv() {
        let csv_data = "\
Cycle(R/I),hair growth(Y/N),Skin darkening (Y/N),Hair loss(Y/N),Pimples(Y/N),BMI,PCOS (Y/N)
2,0,0,1,1,24.5,0
4,1,1,1,1,30.1,1";
        let cursor = Cursor::new(csv_data);

        let loader = DataLoader::new();
        let records = loader.parse_records(cursor, FileFormat::Csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cycle_code, Some(2.0));
        assert_eq!(records[0].bmi, Some(24.5));
        assert_eq!(records[0].label, Some(0));
        assert_eq!(records[1].cycle_code, Some(4.0));
        assert_eq!(records[1].label, Some(1));
        assert!(records.iter().all(|r| r.is_complete()));
    }

    #[test]
    fn test_headers_are_trimmed() {
        // The real spreadsheet ships with padded header cells.
        let csv_data = "\
 Cycle(R/I) ,hair growth(Y/N),Skin darkening (Y/N),Hair loss(Y/N),Pimples(Y/N), BMI ,PCOS (Y/N)
4,1,0,0,1,28.3,1";
        let cursor = Cursor::new(csv_data);

        let loader = DataLoader::new();
        let records = loader.parse_records(cursor, FileFormat::Csv).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cycle_code, Some(4.0));
        assert_eq!(records[0].bmi, Some(28.3));
    }

    #[test]
    fn test_measured_columns_are_optional() {
        let csv_data = "\
Cycle(R/I),hair growth(Y/N),Skin darkening (Y/N),Hair loss(Y/N),Pimples(Y/N),BMI,Voice_Jitter,Family_History,PCOS (Y/N)
2,0,0,1,1,24.5,1.3,0,0
4,1,1,1,1,30.1,,15,1";
        let cursor = Cursor::new(csv_data);

        let loader = DataLoader::new();
        let records = loader.parse_records(cursor, FileFormat::Csv).unwrap();

        assert_eq!(records[0].voice_jitter, Some(1.3));
        assert_eq!(records[0].family_history, Some(0.0));
        assert!(records[0].has_measured_synthetic());
        assert_eq!(records[1].voice_jitter, None);
        assert!(!records[1].has_measured_synthetic());
    }

    #[test]
    fn test_bad_cells_become_absent() {
        let csv_data = "\
Cycle(R/I),hair growth(Y/N),Skin darkening (Y/N),Hair loss(Y/N),Pimples(Y/N),BMI,PCOS (Y/N)
2,0,0,1,1,not-a-number,0
4,1,1,1,1,30.1,3";
        let cursor = Cursor::new(csv_data);

        let loader = DataLoader::new();
        let records = loader.parse_records(cursor, FileFormat::Csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bmi, None);
        assert_eq!(records[1].label, None);
        assert!(records.iter().all(|r| !r.is_complete()));
    }
}
