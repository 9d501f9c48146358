//! Directory of CSV files, one per sheet.
//!
//! `{root}/{sheet name}.csv` holds the whole sheet, header row included, so
//! row numbers line up with the spreadsheet export. Writes go to a temporary
//! file which is then renamed over the original.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{CellAddress, Result, RowRange, RowStore, StoreError, slice_grid, write_grid};

#[derive(Debug, Clone)]
pub struct CsvStore {
    root_dir: PathBuf,
}

impl CsvStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path(&self, sheet: &str) -> PathBuf {
        self.root_dir.join(format!("{sheet}.csv"))
    }
}

fn read_grid(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(StoreError::UnknownSheet(sheet.to_string()));
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut grid = Vec::new();
    for record in reader.records() {
        grid.push(record?.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

fn write_grid_file(path: &Path, grid: &[Vec<String>]) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = ::csv::WriterBuilder::new().flexible(true).from_path(&tmp)?;
        for row in grid {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl RowStore for CsvStore {
    async fn get_rows(&self, range: &RowRange) -> Result<Vec<Vec<String>>> {
        let path = self.path(&range.sheet);
        let sheet = range.sheet.clone();
        let grid = tokio::task::spawn_blocking(move || read_grid(&path, &sheet))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;

        debug!("Read {} rows from {}", grid.len(), range);
        Ok(slice_grid(&grid, range))
    }

    async fn update_cells(&self, start: &CellAddress, values: Vec<String>) -> Result<()> {
        let path = self.path(&start.sheet);
        let start = start.clone();

        tokio::task::spawn_blocking(move || {
            let mut grid = read_grid(&path, &start.sheet)?;
            write_grid(&mut grid, &start, values);
            write_grid_file(&path, &grid)
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}
