use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{CellAddress, Result, RowRange, RowStore, StoreError, slice_grid, write_grid};

/// Sheets held in memory, header row included. Used by tests and demos.
#[derive(Default)]
pub struct MemoryStore {
    sheets: RwLock<HashMap<String, Vec<Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet with a header row followed by `rows`.
    pub fn with_sheet<R, C>(self, name: &str, header: &[&str], rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut grid = vec![header.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
        grid.extend(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect()),
        );

        if let Ok(mut sheets) = self.sheets.write() {
            sheets.insert(name.to_string(), grid);
        }
        self
    }

    /// Reads one cell, `None` if it was never written.
    pub fn cell(&self, address: &CellAddress) -> Option<String> {
        let sheets = self.sheets.read().ok()?;
        sheets
            .get(&address.sheet)?
            .get(address.row.checked_sub(1)? as usize)?
            .get(address.column)
            .cloned()
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn get_rows(&self, range: &RowRange) -> Result<Vec<Vec<String>>> {
        let sheets = self
            .sheets
            .read()
            .map_err(|_| StoreError::Poisoned)?;
        let grid = sheets
            .get(&range.sheet)
            .ok_or_else(|| StoreError::UnknownSheet(range.sheet.clone()))?;

        Ok(slice_grid(grid, range))
    }

    async fn update_cells(&self, start: &CellAddress, values: Vec<String>) -> Result<()> {
        let mut sheets = self
            .sheets
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        let grid = sheets
            .get_mut(&start.sheet)
            .ok_or_else(|| StoreError::UnknownSheet(start.sheet.clone()))?;

        write_grid(grid, start, values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_after_writes() {
        let store = MemoryStore::new().with_sheet("s", &["a", "b"], vec![vec!["1", "2"]]);
        let address = CellAddress::for_record("s", 1, 0);

        store.update_cell(&address, "changed".to_string()).await.unwrap();

        let rows = store.get_rows(&RowRange::records("s", 1)).await.unwrap();
        assert_eq!(rows, vec![vec!["1".to_string(), "changed".to_string()]]);
        assert_eq!(store.cell(&address).as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn unknown_sheets_are_errors() {
        let store = MemoryStore::new();
        let err = store.get_rows(&RowRange::records("missing", 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownSheet(name) if name == "missing"));
    }
}
