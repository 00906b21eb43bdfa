//! A JSON file standing in for the spreadsheet.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sheetcell_codec::{CellStore, CodecError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SheetFile {
    /// Per-cell character limit; the configured capacity when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cell_capacity: Option<usize>,
    #[serde(default)]
    rows: BTreeMap<String, BTreeMap<String, String>>,
}

/// Rows of named cells persisted as pretty JSON after every write.
#[derive(Debug)]
pub struct JsonSheet {
    path: PathBuf,
    data: SheetFile,
    default_capacity: usize,
}

impl JsonSheet {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: &Path, default_capacity: usize) -> anyhow::Result<Self> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading sheet {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing sheet {}", path.display()))?
        } else {
            SheetFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
            default_capacity,
        })
    }

    fn save(&self) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)
    }
}

impl CellStore for JsonSheet {
    fn cell_capacity(&self) -> sheetcell_codec::Result<usize> {
        Ok(self.data.cell_capacity.unwrap_or(self.default_capacity))
    }

    fn write_cells(&mut self, row: &str, cells: &[(String, String)]) -> sheetcell_codec::Result<()> {
        let mut updated = self.data.rows.get(row).cloned().unwrap_or_default();
        for (name, value) in cells {
            updated.insert(name.clone(), value.clone());
        }
        let previous = self.data.rows.insert(row.to_string(), updated);

        if let Err(e) = self.save() {
            // Keep memory in step with what is on disk
            match previous {
                Some(cells) => self.data.rows.insert(row.to_string(), cells),
                None => self.data.rows.remove(row),
            };
            return Err(CodecError::Store(format!("writing {}: {e}", self.path.display())));
        }
        Ok(())
    }

    fn read_cells(&self, row: &str, names: &[String]) -> sheetcell_codec::Result<Vec<Option<String>>> {
        let stored = self.data.rows.get(row);
        Ok(names
            .iter()
            .map(|name| stored.and_then(|cells| cells.get(name)).cloned())
            .collect())
    }
}
