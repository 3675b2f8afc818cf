//! Column definitions for grid output

use std::fmt;

use crate::cell::{GridCell, RowFields};

type Extractor<R> = Box<dyn Fn(&R) -> GridCell + Send + Sync>;
type Converter<R> = Box<dyn Fn(GridCell, &R) -> GridCell + Send + Sync>;

/// One column of a grid: where its value comes from and how its header reads.
///
/// ```
/// use duke_sheets_grid::{GridCell, GridColumn};
///
/// struct Order {
///     id: u32,
///     total: f64,
/// }
///
/// let total = GridColumn::new("total", |o: &Order| GridCell::from(o.total))
///     .label("Total")
///     .convert(|cell, _| match cell.as_number() {
///         Some(n) => GridCell::text(format!("{n:.2}")),
///         None => cell,
///     });
///
/// let order = Order { id: 1, total: 9.5 };
/// assert_eq!(total.header_label(), "Total");
/// assert_eq!(total.value(&order), GridCell::text("9.50"));
/// ```
pub struct GridColumn<R> {
    field_name: String,
    label: Option<String>,
    cell_span: usize,
    extractor: Extractor<R>,
    converter: Option<Converter<R>>,
}

impl<R> GridColumn<R> {
    /// Create a column reading its value with `extractor`
    pub fn new<S, F>(field_name: S, extractor: F) -> Self
    where
        S: Into<String>,
        F: Fn(&R) -> GridCell + Send + Sync + 'static,
    {
        Self {
            field_name: field_name.into(),
            label: None,
            cell_span: 1,
            extractor: Box::new(extractor),
            converter: None,
        }
    }

    /// Set the header label (defaults to the field name)
    pub fn label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set how many cells the column occupies (minimum 1)
    pub fn cell_span(mut self, cell_span: usize) -> Self {
        self.cell_span = cell_span.max(1);
        self
    }

    /// Post-process every extracted value
    pub fn convert<F>(mut self, converter: F) -> Self
    where
        F: Fn(GridCell, &R) -> GridCell + Send + Sync + 'static,
    {
        self.converter = Some(Box::new(converter));
        self
    }

    /// Field name this column was created with
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Header label: the explicit label, or the field name
    pub fn header_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field_name)
    }

    /// Number of cells the column occupies
    pub fn span(&self) -> usize {
        self.cell_span
    }

    /// Value of this column for `row`, after conversion
    pub fn value(&self, row: &R) -> GridCell {
        let cell = (self.extractor)(row);
        match &self.converter {
            Some(convert) => convert(cell, row),
            None => cell,
        }
    }
}

impl<R: RowFields + 'static> GridColumn<R> {
    /// Create a column reading the named field of each row.
    ///
    /// Rows without the field produce an empty cell.
    pub fn field<S: Into<String>>(field_name: S) -> Self {
        let field_name = field_name.into();
        let key = field_name.clone();
        Self::new(field_name, move |row: &R| row.field(&key).unwrap_or_default())
    }
}

impl<R> fmt::Debug for GridColumn<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridColumn")
            .field("field_name", &self.field_name)
            .field("label", &self.label)
            .field("cell_span", &self.cell_span)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}
