//! Small helpers shared by the SQLite repositories.

/// Largest id list bound into a single `IN (...)` clause.
///
/// SQLite caps bound parameters per statement (999 on older builds); 500
/// leaves room for the other parameters of a query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits an id list into slices that each fit one `IN (...)` clause.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}
