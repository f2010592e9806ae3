use crate::{
    error::{Error, Result},
    model::{Batch, WorkItem}
};

/// Splits `items` into consecutive batches of `batch_size`; only the last
/// batch may be shorter. Order is preserved and nothing is dropped.
pub fn partition(items: Vec<WorkItem>, batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(Error::invalid_config("batch_size must be at least 1"));
    }

    let mut batches: Vec<Batch> = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut current: Vec<WorkItem> = Vec::with_capacity(batch_size);
    for item in items {
        current.push(item);
        if current.len() == batch_size {
            let full = std::mem::replace(&mut current, Vec::with_capacity(batch_size));
            batches.push(Batch::new(batches.len(), full));
        }
    }
    if !current.is_empty() {
        batches.push(Batch::new(batches.len(), current));
    }
    Ok(batches)
}
