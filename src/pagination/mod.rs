//! Keyset pagination shared by every listing endpoint.
//!
//! Protocol: clamp the requested `limit`, decode the inbound cursor, fetch
//! `limit + 1` rows past the cursor boundary, then hand the rows to
//! [`paginate`]. The extra row only signals that another page exists; its
//! boundary becomes the outbound cursor and it is dropped from the response.

pub mod cursor;

pub use cursor::{CreatedAtCursor, CursorError, PageCursor};

use serde::{Deserialize, Serialize};

pub const MIN_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Coerce a client-supplied limit into `[MIN_PAGE_LIMIT, MAX_PAGE_LIMIT]`.
///
/// Anything absent, unparsable, or out of range becomes the default; it is
/// never rejected.
#[must_use]
pub fn clamp_limit(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|limit| (MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(limit))
        .unwrap_or(DEFAULT_PAGE_LIMIT)
}

/// Query-string parameters of a listing request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl PageRequest {
    #[must_use]
    pub fn limit(&self) -> usize {
        clamp_limit(self.limit.as_deref())
    }

    /// Rows to ask the store for: one more than the page holds.
    #[must_use]
    pub fn fetch_limit(&self) -> usize {
        self.limit() + 1
    }

    /// # Errors
    /// Returns [`CursorError`] if the supplied cursor does not decode.
    pub fn cursor<C: PageCursor>(&self) -> Result<C, CursorError> {
        cursor::decode(self.cursor.as_deref().unwrap_or_default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: String,
    pub has_more: bool,
    pub total_count: usize,
}

/// Turn up to `limit + 1` fetched rows into a page.
///
/// When the store returned more than `limit` rows, the cursor is built from
/// the row at index `limit` (the first row of the next page) and the rows are
/// trimmed to `limit`.
///
/// # Errors
/// Returns [`CursorError`] if the cursor cannot be encoded.
pub fn paginate<T, C, F>(
    mut rows: Vec<T>,
    limit: usize,
    to_cursor: F,
) -> Result<Page<T>, CursorError>
where
    C: Serialize,
    F: FnOnce(&T) -> C,
{
    let next = match rows.get(limit) {
        Some(row) => Some(cursor::encode(&to_cursor(row))?),
        None => None,
    };
    let has_more = next.is_some();
    rows.truncate(limit);

    Ok(Page {
        total_count: rows.len(),
        items: rows,
        cursor: next.unwrap_or_default(),
        has_more,
    })
}
