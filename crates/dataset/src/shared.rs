use crate::error::DatasetError;
use crate::loader::load_from_path;
use core_types::Dataset;
use std::path::Path;
use std::sync::OnceLock;

static SHARED: SharedDataset = SharedDataset::new();

/// The process-wide dataset cell used by the CLI.
pub fn shared() -> &'static SharedDataset {
    &SHARED
}

/// A read-only dataset that is loaded at most once.
///
/// The first successful load is kept for the lifetime of the cell; every later
/// call returns the same reference without touching the source again. A failed
/// load leaves the cell empty so the caller may retry.
#[derive(Debug, Default)]
pub struct SharedDataset {
    cell: OnceLock<Dataset>,
}

impl SharedDataset {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The dataset, if it has been loaded.
    pub fn get(&self) -> Option<&Dataset> {
        self.cell.get()
    }

    /// Returns the loaded dataset, reading it from `path` on first use.
    ///
    /// Once loaded, `path` is ignored.
    pub fn get_or_load(&self, path: &Path) -> Result<&Dataset, DatasetError> {
        self.get_or_try_init(|| load_from_path(path))
    }

    /// Returns the loaded dataset, running `init` only if nothing is loaded yet.
    pub fn get_or_try_init<F>(&self, init: F) -> Result<&Dataset, DatasetError>
    where
        F: FnOnce() -> Result<Dataset, DatasetError>,
    {
        if let Some(dataset) = self.cell.get() {
            tracing::debug!("Reusing the already loaded dataset.");
            return Ok(dataset);
        }

        let dataset = init()?;
        Ok(self.cell.get_or_init(|| dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Schema;
    use std::cell::Cell;
    use std::io::Write;

    #[test]
    fn init_runs_once() {
        let cell = SharedDataset::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let dataset = cell
                .get_or_try_init(|| {
                    calls.set(calls.get() + 1);
                    Ok(Dataset::new(Vec::new(), Schema::full()))
                })
                .unwrap();
            assert!(dataset.is_empty());
        }

        assert_eq!(calls.get(), 1);
        assert!(cell.get().is_some());
    }

    #[test]
    fn failed_load_leaves_cell_empty() {
        let cell = SharedDataset::new();
        let err = cell.get_or_load(Path::new("/definitely/not/here.csv"));
        assert!(err.is_err());
        assert!(cell.get().is_none());
    }

    #[test]
    fn later_paths_are_ignored_once_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "order_id,customer_id,product_id,seller_id,payment_value,order_purchase_timestamp\n\
             A,X,P1,S1,1,2024-01-05"
        )
        .unwrap();

        let cell = SharedDataset::new();
        let first = cell.get_or_load(file.path()).unwrap();
        assert_eq!(first.len(), 1);

        let second = cell.get_or_load(Path::new("/definitely/not/here.csv")).unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
