use std::{fs, path::Path};

use crate::{
    error::{Error, Result},
    model::WorkItem
};

pub fn load_txt_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::ResourceUnavailable {
        path: path.to_path_buf(),
        source
    })
}

/// Splits `text` into consecutive windows of `chunk_size` characters.
///
/// Boundaries fall on raw character offsets with no regard for words or
/// tokens, but never inside a UTF-8 code point.
pub fn chunk_text(text: &str, chunk_size: usize) -> Result<Vec<&str>> {
    if chunk_size == 0 {
        return Err(Error::invalid_config("chunk_size must be at least 1"));
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    Ok(chunks)
}

/// Chunks every document in order and numbers the chunks across all of them.
pub fn chunk_documents(documents: &[(String, String)], chunk_size: usize) -> Result<Vec<WorkItem>> {
    let mut items = Vec::new();
    for (source, content) in documents {
        for chunk in chunk_text(content, chunk_size)? {
            items.push(WorkItem::new(items.len(), source, chunk.to_string()));
        }
    }
    Ok(items)
}

/// Loads every path in order as `(source, content)` pairs.
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(String, String)>> {
    paths.iter()
        .map(|p| {
            let path = p.as_ref();
            let content = load_txt_file(path)?;
            Ok((path.display().to_string(), content))
        })
        .collect()
}
