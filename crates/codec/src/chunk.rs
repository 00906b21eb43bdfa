//! Cell chunking: fixed-capacity slices of a payload and their reassembly.
//!
//! Capacity is counted in characters because that is how spreadsheet cells
//! limit their contents. Every chunk but the last is exactly `capacity`
//! characters long.

use crate::{CodecError, Result};

/// One positional slice of an encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in the payload
    pub ordinal: usize,
    /// Maximum characters this slot may hold
    pub capacity: usize,
    /// Slice content
    pub text: String,
}

impl Chunk {
    /// Length of the slice in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the slice is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Build chunks from cell values read back in slot order.
    ///
    /// Absent cells become empty chunks so they contribute nothing on join.
    pub fn from_cells<I>(cells: I, capacity: usize) -> Vec<Chunk>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        cells
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk {
                ordinal,
                capacity,
                text: text.unwrap_or_default(),
            })
            .collect()
    }
}

/// Split `payload` into chunks of at most `capacity` characters.
///
/// A payload that fits yields exactly one chunk (an empty payload yields one
/// empty chunk). Longer payloads fill chunk 0 to capacity and continue in
/// chunk 1, 2 and so on.
///
/// # Example
/// ```
/// use sheetcell_codec::{join, split};
///
/// let chunks = split("abcdefg", 5).unwrap();
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].text, "abcde");
/// assert_eq!(chunks[1].text, "fg");
/// assert_eq!(join(&chunks).unwrap(), "abcdefg");
/// ```
pub fn split(payload: &str, capacity: usize) -> Result<Vec<Chunk>> {
    if capacity == 0 {
        return Err(CodecError::Config("chunk capacity must be at least 1".into()));
    }

    let mut chunks = Vec::with_capacity(payload.len() / capacity + 1);
    let mut rest = payload;
    loop {
        let end = rest.char_indices().nth(capacity).map_or(rest.len(), |(i, _)| i);
        let (head, tail) = rest.split_at(end);
        chunks.push(Chunk {
            ordinal: chunks.len(),
            capacity,
            text: head.to_string(),
        });
        if tail.is_empty() {
            break;
        }
        rest = tail;
    }

    Ok(chunks)
}

/// Concatenate chunks in ascending ordinal order.
///
/// Input order does not matter and gaps in the ordinals contribute nothing.
/// Two chunks claiming the same ordinal cannot be reassembled.
pub fn join<'a, I>(chunks: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Chunk>,
{
    let mut ordered: Vec<&Chunk> = chunks.into_iter().collect();
    ordered.sort_by_key(|chunk| chunk.ordinal);

    if let Some(pair) = ordered.windows(2).find(|pair| pair[0].ordinal == pair[1].ordinal) {
        return Err(CodecError::MalformedChunks(format!(
            "duplicate ordinal {}",
            pair[0].ordinal
        )));
    }

    Ok(ordered.iter().map(|chunk| chunk.text.as_str()).collect())
}
