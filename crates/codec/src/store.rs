//! The row-storage contract the codec writes through.

use crate::config::DEFAULT_CELL_CAPACITY;
use crate::{CodecError, Result};
use std::collections::HashMap;

/// Synchronous access to a spreadsheet-like row store.
pub trait CellStore {
    /// Current per-cell character capacity.
    fn cell_capacity(&self) -> Result<usize>;

    /// Persist named cell values for a row in one call.
    fn write_cells(&mut self, row: &str, cells: &[(String, String)]) -> Result<()>;

    /// Read named cells of a row; absent cells are `None`.
    fn read_cells(&self, row: &str, names: &[String]) -> Result<Vec<Option<String>>>;
}

/// Ordered column names of the slots reserved for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLayout {
    columns: Vec<String>,
}

impl CellLayout {
    /// Layout over explicit columns, primary first.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(CodecError::Config("a cell layout needs at least one column".into()));
        }
        Ok(Self { columns })
    }

    /// Primary cell `field` plus an extra cell `<field>_extra`.
    pub fn for_field(field: &str) -> Self {
        Self {
            columns: vec![field.to_string(), format!("{field}_extra")],
        }
    }

    /// Column names in slot order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a layout has at least one slot.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for CellLayout {
    fn default() -> Self {
        Self::for_field("image")
    }
}

/// In-memory [`CellStore`] keyed by row then column.
#[derive(Debug, Clone)]
pub struct MemoryCellStore {
    capacity: usize,
    rows: HashMap<String, HashMap<String, String>>,
    writes: usize,
}

impl MemoryCellStore {
    /// Empty store reporting `capacity` characters per cell.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rows: HashMap::new(),
            writes: 0,
        }
    }

    /// Raw value of one cell.
    pub fn cell(&self, row: &str, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Number of successful `write_cells` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for MemoryCellStore {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_CAPACITY)
    }
}

impl CellStore for MemoryCellStore {
    fn cell_capacity(&self) -> Result<usize> {
        Ok(self.capacity)
    }

    fn write_cells(&mut self, row: &str, cells: &[(String, String)]) -> Result<()> {
        if let Some((name, value)) = cells.iter().find(|(_, value)| value.chars().count() > self.capacity) {
            return Err(CodecError::Store(format!(
                "cell {row}/{name} holds {} characters, capacity is {}",
                value.chars().count(),
                self.capacity
            )));
        }

        let stored = self.rows.entry(row.to_string()).or_default();
        for (name, value) in cells {
            stored.insert(name.clone(), value.clone());
        }
        self.writes += 1;
        Ok(())
    }

    fn read_cells(&self, row: &str, names: &[String]) -> Result<Vec<Option<String>>> {
        let stored = self.rows.get(row);
        Ok(names
            .iter()
            .map(|name| stored.and_then(|cells| cells.get(name)).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_for_field() {
        let layout = CellLayout::for_field("main_image");
        assert_eq!(layout.columns(), ["main_image", "main_image_extra"]);
        assert_eq!(layout.len(), 2);
        assert!(CellLayout::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryCellStore::new(10);
        store
            .write_cells("row-1", &[("image".into(), "abc".into())])
            .unwrap();

        let names = vec!["image".to_string(), "image_extra".to_string()];
        let cells = store.read_cells("row-1", &names).unwrap();
        assert_eq!(cells, vec![Some("abc".to_string()), None]);
        assert_eq!(store.read_cells("missing", &names).unwrap(), vec![None, None]);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_memory_store_enforces_capacity() {
        let mut store = MemoryCellStore::new(3);
        let result = store.write_cells("row", &[("image".into(), "abcd".into())]);
        assert!(matches!(result, Err(CodecError::Store(_))));
        assert!(store.cell("row", "image").is_none());
    }
}
