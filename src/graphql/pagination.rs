//! Relay-style connections over offset-paged repository listings.

use crate::domain::Page;
use async_graphql::connection::{query, Connection, Edge, EmptyFields};
use async_graphql::{OutputType, Result, SimpleObject};
use std::future::Future;

/// Extra connection fields.
#[derive(SimpleObject)]
pub struct CountFields {
    /// Number of rows matching the filter, ignoring paging
    pub total_count: u64,
}

pub type CountedConnection<T> = Connection<usize, T, CountFields, EmptyFields>;

/// Offsets are bound by SQLite's signed 64-bit `OFFSET`.
const MAX_OFFSET: usize = i64::MAX as usize;

fn check_cursor(cursor: usize) -> Result<usize> {
    if cursor >= MAX_OFFSET {
        return Err(async_graphql::Error::new(format!("cursor {cursor} is out of range")));
    }
    Ok(cursor)
}

/// Resolve `first/after/last/before` against `fetch`, which returns one
/// page plus the total number of matching rows. Cursors are row offsets.
pub async fn paginate<D, T, F, Fut>(
    after: Option<String>,
    before: Option<String>,
    first: Option<i32>,
    last: Option<i32>,
    fetch: F,
) -> Result<CountedConnection<T>>
where
    D: Send,
    T: OutputType + From<D>,
    F: Fn(Page) -> Fut + Send,
    Fut: Future<Output = crate::error::Result<(Vec<D>, u64)>> + Send,
{
    query(
        after,
        before,
        first,
        last,
        |after: Option<usize>,
         before: Option<usize>,
         first: Option<usize>,
         last: Option<usize>| async move {
            let mut start = match after {
                Some(after) => check_cursor(after)? + 1,
                None => 0,
            };
            let mut end = before.map(check_cursor).transpose()?;
            if let Some(first) = first {
                let upper = start.saturating_add(first).min(MAX_OFFSET);
                end = Some(end.map_or(upper, |e| e.min(upper)));
            }
            if let Some(last) = last {
                let upper = match end {
                    Some(e) => e,
                    None => fetch(Page::new(0, 0)).await?.1 as usize,
                };
                start = start.max(upper.saturating_sub(last));
                end = Some(upper);
            }

            let limit = end.map_or(MAX_OFFSET, |e| e.saturating_sub(start));
            let (rows, total) = fetch(Page::new(start, limit)).await?;

            let total_count = total;
            let mut connection = Connection::with_additional_fields(
                start > 0,
                ((start + rows.len()) as u64) < total,
                CountFields { total_count },
            );
            connection.edges.extend(
                rows.into_iter()
                    .enumerate()
                    .map(|(i, row)| Edge::new(start + i, T::from(row))),
            );
            Ok::<_, async_graphql::Error>(connection)
        },
    )
    .await
}
