use compact_str::CompactString;
use smallvec::SmallVec;

use relmap_types::ValueType;

/// Index path of a field inside an entity's (possibly embedded) field layout.
pub type FieldIndex = SmallVec<[usize; 4]>;

/// A mapped column.
///
/// `field` is the name as declared by the metadata layer; `name` is the SQL
/// column name, filled in by the naming strategy when the owning entity is
/// registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: CompactString,
    pub name: CompactString,
    pub value_type: ValueType,
    pub field_index: FieldIndex,
    /// The value type scans itself instead of using a stock decoder.
    pub scanner: bool,
}

impl Column {
    pub fn new(field: impl Into<CompactString>, value_type: ValueType) -> Self {
        let field = field.into();
        Self {
            name: field.clone(),
            field,
            value_type,
            field_index: FieldIndex::new(),
            scanner: false,
        }
    }

    /// Sets the index path of the field this column was extracted from.
    #[must_use]
    pub fn at(mut self, index: &[usize]) -> Self {
        self.field_index = FieldIndex::from_slice(index);
        self
    }

    #[must_use]
    pub fn with_scanner(mut self) -> Self {
        self.scanner = true;
        self
    }

    /// Case-insensitive match on the SQL name or the declared field name.
    pub(crate) fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.field.eq_ignore_ascii_case(name)
    }
}
