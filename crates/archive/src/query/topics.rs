//! Topic listing queries

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, Result};
use crate::metadata::MetadataStore;
use crate::models::{ListId, Topic};
use crate::storage::{Filter, Query, Sort};

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, at most `size`
    pub items: Vec<T>,
    /// Zero-based page index
    pub index: usize,
    /// Requested page size
    pub size: usize,
    /// Whether this is the first page
    pub first: bool,
    /// Whether no page follows this one
    pub last: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the next page, if there is one
    pub fn next_index(&self) -> Option<usize> {
        (!self.last).then(|| self.index + 1)
    }

    /// Index of the previous page, if there is one
    pub fn previous_index(&self) -> Option<usize> {
        (!self.first).then(|| self.index - 1)
    }
}

/// List topics, most recently active first, one page at a time
///
/// Fetches `page_size + 1` topics: the extra one is only a lookahead telling
/// whether another page exists, and is dropped from the result. This avoids
/// counting the whole collection.
///
/// # Arguments
/// * `store` - The metadata store
/// * `source` - List to restrict to, or `None` for topics of every list
/// * `page_index` - Zero-based page number
/// * `page_size` - Topics per page, must be positive
pub fn page_topics(
    store: &MetadataStore,
    source: Option<&ListId>,
    page_index: usize,
    page_size: usize,
) -> Result<Page<Topic>> {
    if page_size == 0 {
        return Err(ArchiveError::validation("Page size must be positive"));
    }
    let skip = page_index
        .checked_mul(page_size)
        .ok_or_else(|| ArchiveError::validation("Page index is out of range"))?;

    let filter = match source {
        Some(list) => Filter::eq("source", list.as_str()),
        None => Filter::all(),
    };
    let query = Query::new(filter)
        .sort(Sort::descending("end"))
        .skip(skip)
        .limit(page_size.saturating_add(1));

    let mut items = store.topics(&query)?;
    let last = items.len() <= page_size;
    if !last {
        items.truncate(page_size);
    }

    Ok(Page {
        items,
        index: page_index,
        size: page_size,
        first: page_index == 0,
        last,
    })
}
