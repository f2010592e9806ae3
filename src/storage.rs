use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path
};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    format::{Formatter, OutputRecord},
    model::{ItemResult, WorkItem}
};

// Utils to store run results on local device.
pub struct LocalSaver;

impl LocalSaver {
    /// Writes one JSON line per item, pairing each work item with its result.
    pub fn save_results_as_jsonl<T: Serialize>(
        fname: &Path,
        run_id: Uuid,
        items: &[WorkItem],
        results: &[ItemResult<T>]
    ) -> Result<()> {
        if items.len() != results.len() {
            return Err(Error::invalid_config(format!(
                "cannot pair {} items with {} results", items.len(), results.len()
            )));
        }

        let created = Utc::now();
        let mut file = BufWriter::new(File::create(fname)?);
        items.iter().zip(results).try_for_each(|(item, result)| -> Result<()> {
            let record = OutputRecord::new(run_id, created, item, result);
            file.write_all(Formatter::to_jsonl(&record)?.as_bytes())?;
            Ok(())
        })?;
        file.flush()?;
        Ok(())
    }
}
