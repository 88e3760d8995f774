// ── Column descriptors ──

use std::fmt;

/// Static description of one table column for resource `R`.
///
/// Descriptors are defined once per resource and never mutated; the codec
/// derives its sortable/filterable key sets from them.
pub struct ColumnDescriptor<R> {
    /// Field name on the wire and in the URL (`sort=<key>`, `<key>=value`).
    pub key: &'static str,
    /// Column heading.
    pub header: &'static str,
    pub render: fn(&R) -> String,
    pub sortable: bool,
    pub filterable: bool,
}

impl<R> ColumnDescriptor<R> {
    pub const fn new(key: &'static str, header: &'static str, render: fn(&R) -> String) -> Self {
        Self {
            key,
            header,
            render,
            sortable: false,
            filterable: false,
        }
    }

    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn cell(&self, row: &R) -> String {
        (self.render)(row)
    }
}

// Manual impls: `R` itself need not be Clone/Debug.
impl<R> Clone for ColumnDescriptor<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ColumnDescriptor<R> {}

impl<R> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .finish_non_exhaustive()
    }
}

/// Render `rows` through `columns`, one `Vec<String>` per row.
pub fn render_rows<R>(columns: &[ColumnDescriptor<R>], rows: &[R]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| columns.iter().map(|c| c.cell(row)).collect())
        .collect()
}

/// `"-"` for absent optional values.
pub fn or_dash<T: fmt::Display + ?Sized>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".into(), ToString::to_string)
}
