//! Source table: typed GVA observations loaded once from CSV.

use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::TableError;
use crate::CompressionFormat;

pub const SECTOR_COLUMN: &str = "sector";
pub const SUB_SECTOR_COLUMN: &str = "sub-sector";
pub const YEAR_COLUMN: &str = "year";
pub const GVA_COLUMN: &str = "gva";

const REQUIRED_COLUMNS: [&str; 4] = [SECTOR_COLUMN, SUB_SECTOR_COLUMN, YEAR_COLUMN, GVA_COLUMN];

/// One `(sector, sub-sector, year, gva)` row of the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub sector: String,
    pub sub_sector: String,
    pub year: i32,
    /// `None` when the CSV cell is empty; such rows contribute nothing to sums.
    pub gva: Option<f64>,
}

impl Observation {
    pub fn new(sector: &str, sub_sector: &str, year: i32, gva: f64) -> Self {
        Self {
            sector: sector.to_string(),
            sub_sector: sub_sector.to_string(),
            year,
            gva: Some(gva),
        }
    }
}

/// CSV reading options (from config and CLI).
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub infer_schema_length: Option<usize>,
    pub compression: Option<CompressionFormat>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = Some(n);
        self
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }
}

/// Immutable collection of observations. Share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct GvaTable {
    observations: Vec<Observation>,
}

impl GvaTable {
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Load the table from a CSV file, decompressing first when the file is compressed.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self, TableError> {
        let compression = options
            .compression
            .or_else(|| CompressionFormat::from_extension(path));

        let df = match compression {
            Some(compression) => {
                let bytes = decompress_to_vec(path, compression)?;
                debug!(
                    path = %path.display(),
                    ?compression,
                    bytes = bytes.len(),
                    "decompressed source table"
                );
                CsvReader::new(std::io::Cursor::new(bytes))
                    .with_options(read_options(options))
                    .finish()?
            }
            None => {
                let pl_path = PlPath::Local(Arc::from(path));
                let mut reader = LazyCsvReader::new(pl_path)
                    .with_has_header(true)
                    .with_infer_schema_length(Some(infer_schema_length(options)));
                if let Some(delimiter) = options.delimiter {
                    reader = reader.with_separator(delimiter);
                }
                reader.finish()?.collect()?
            }
        };

        let table = Self::from_dataframe(&df)?;
        info!(
            path = %path.display(),
            rows = table.len(),
            years = table.years().len(),
            "loaded GVA table"
        );
        Ok(table)
    }

    /// Convert a DataFrame with the required columns into typed observations.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, TableError> {
        let names = df.get_column_names();
        for required in REQUIRED_COLUMNS {
            if !names.iter().any(|c| c.as_str() == required) {
                return Err(TableError::MissingColumn(required.to_string()));
            }
        }

        let sector_col = df.column(SECTOR_COLUMN)?.cast(&DataType::String)?;
        let sub_sector_col = df.column(SUB_SECTOR_COLUMN)?.cast(&DataType::String)?;
        let year_col = df.column(YEAR_COLUMN)?.cast(&DataType::Int64)?;
        let gva_col = df.column(GVA_COLUMN)?.cast(&DataType::Float64)?;

        let sectors = sector_col.str()?;
        let sub_sectors = sub_sector_col.str()?;
        let years = year_col.i64()?;
        let gvas = gva_col.f64()?;

        let mut observations = Vec::with_capacity(df.height());
        for (row, (((sector, sub_sector), year), gva)) in sectors
            .into_iter()
            .zip(sub_sectors)
            .zip(years)
            .zip(gvas)
            .enumerate()
        {
            let sector = sector.ok_or_else(|| missing(SECTOR_COLUMN, row))?;
            let sub_sector = sub_sector.ok_or_else(|| missing(SUB_SECTOR_COLUMN, row))?;
            let year = year
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| missing(YEAR_COLUMN, row))?;
            observations.push(Observation {
                sector: sector.to_string(),
                sub_sector: sub_sector.to_string(),
                year,
                gva: gva.filter(|v| v.is_finite()),
            });
        }

        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct years across the whole table, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.observations
            .iter()
            .map(|o| o.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct sector values in first-seen order.
    pub fn sectors(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for o in &self.observations {
            if !seen.contains(&o.sector.as_str()) {
                seen.push(o.sector.as_str());
            }
        }
        seen
    }
}

fn missing(column: &str, row: usize) -> TableError {
    TableError::MissingField {
        column: column.to_string(),
        row,
    }
}

const DEFAULT_INFER_SCHEMA_LENGTH: usize = 1000;

fn infer_schema_length(options: &LoadOptions) -> usize {
    options
        .infer_schema_length
        .unwrap_or(DEFAULT_INFER_SCHEMA_LENGTH)
}

fn read_options(options: &LoadOptions) -> CsvReadOptions {
    let mut read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(infer_schema_length(options)));
    if let Some(delimiter) = options.delimiter {
        read_options = read_options.map_parse_options(|opts| opts.with_separator(delimiter));
    }
    read_options
}

fn decompress_to_vec(path: &Path, compression: CompressionFormat) -> Result<Vec<u8>, TableError> {
    let file = BufReader::new(File::open(path)?);
    let mut decompressed = Vec::new();
    match compression {
        CompressionFormat::Gzip => {
            flate2::read::MultiGzDecoder::new(file).read_to_end(&mut decompressed)?;
        }
        CompressionFormat::Zstd => {
            zstd::stream::read::Decoder::new(file)?.read_to_end(&mut decompressed)?;
        }
        CompressionFormat::Bzip2 => {
            bzip2::read::BzDecoder::new(file).read_to_end(&mut decompressed)?;
        }
        CompressionFormat::Xz => {
            xz2::read::XzDecoder::new(file).read_to_end(&mut decompressed)?;
        }
    }
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "sector,sub-sector,year,gva\n\
        Creative Industries,Publishing,2010,100.0\n\
        Creative Industries,Publishing,2011,150.0\n\
        Digital Sector,Telecommunications        ,2011,\n\
        All DCMS sectors,All,2010,900.5\n";

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "gva.csv", SAMPLE.as_bytes());
        let table = GvaTable::load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(
            table.observations()[0],
            Observation::new("Creative Industries", "Publishing", 2010, 100.0)
        );
        // whitespace inside labels is preserved and empty gva is kept as None
        assert_eq!(
            table.observations()[2].sub_sector,
            "Telecommunications        "
        );
        assert_eq!(table.observations()[2].gva, None);
        assert_eq!(table.years(), vec![2010, 2011]);
        assert_eq!(
            table.sectors(),
            vec!["Creative Industries", "Digital Sector", "All DCMS sectors"]
        );
    }

    #[test]
    fn load_with_custom_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let content = SAMPLE.replace(',', ";");
        let path = write_file(&dir, "gva.csv", content.as_bytes());
        let opts = LoadOptions::new().with_delimiter(b';');
        let table = GvaTable::load(&path, &opts).unwrap();
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn load_gzip_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let path = write_file(&dir, "gva.csv.gz", &encoder.finish().unwrap());
        let table = GvaTable::load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.observations()[3].gva, Some(900.5));
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", b"sector,year,gva\nArts,2010,1.0\n");
        let err = GvaTable::load(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(ref c) if c == "sub-sector"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(GvaTable::load(&path, &LoadOptions::default()).is_err());
    }
}
