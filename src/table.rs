use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use tracing::{info, warn};

use crate::error::{EnrichError, Result};
use crate::pipeline::Enrichment;

pub const CANDIDATE_COL: &str = "Candidate";
pub const BIRTH_YEAR_COL: &str = "Birth Year";
pub const COUNTRY_COL: &str = "Country of Origin";
pub const JOB_COL: &str = "Job";

/// Working-state columns that never reach the output file.
pub const WORKING_COLS: &[&str] = &["HTML Content", "Summary"];

/// Tab-delimited table with a required `Candidate` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    candidate_col: usize,
}

impl CandidateTable {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| EnrichError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(bytes.as_slice(), path)?;
        info!(path = ?path, rows = table.rows.len(), cols = table.headers.len(), "loaded input");
        Ok(table)
    }

    /// `path` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self> {
        let csv_err = |source| EnrichError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();
        let candidate_col = headers
            .iter()
            .position(|h| h.trim() == CANDIDATE_COL)
            .ok_or_else(|| EnrichError::MissingColumn {
                path: path.to_path_buf(),
                column: CANDIDATE_COL.to_string(),
            })?;

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() > headers.len() {
                warn!(
                    path = ?path,
                    line = record.position().map(|p| p.line()),
                    cells = row.len(),
                    columns = headers.len(),
                    "row has more cells than the header; extra cells dropped"
                );
            }
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(CandidateTable {
            headers,
            rows,
            candidate_col,
        })
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(|r| r[self.candidate_col].as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Output headers and rows: working columns dropped, enrichment columns
    /// replaced in place when already present, appended otherwise.
    pub fn enriched(&self, fields: &[Enrichment]) -> (Vec<String>, Vec<Vec<String>>) {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&i| !WORKING_COLS.contains(&self.headers[i].trim()))
            .collect();
        let mut headers: Vec<String> = keep.iter().map(|&i| self.headers[i].clone()).collect();

        let slots: Vec<usize> = [BIRTH_YEAR_COL, COUNTRY_COL, JOB_COL]
            .iter()
            .map(|name| match headers.iter().position(|h| h.trim() == *name) {
                Some(pos) => pos,
                None => {
                    headers.push(name.to_string());
                    headers.len() - 1
                }
            })
            .collect();

        let rows = self
            .rows
            .iter()
            .zip(fields)
            .map(|(row, f)| {
                let mut out: Vec<String> = keep.iter().map(|&i| row[i].clone()).collect();
                out.resize(headers.len(), String::new());
                out[slots[0]] = f.birth_year.clone();
                out[slots[1]] = f.country_of_origin.clone();
                out[slots[2]] = f.job.clone();
                out
            })
            .collect();

        (headers, rows)
    }
}

/// Write rows as TSV. The file only appears once fully written.
pub fn write_tsv(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let buf = to_tsv_bytes(headers, rows).map_err(|source| EnrichError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = tmp_path(path);
    let io_err = |source| EnrichError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, &buf).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    info!(path = ?path, rows = rows.len(), "wrote output");
    Ok(())
}

pub fn to_tsv_bytes(headers: &[String], rows: &[Vec<String>]) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
