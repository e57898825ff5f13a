//! Result ordering beyond plain relevance score.

use crate::document::FieldValue;
use crate::reader::IndexReader;

/// One key in a multi-key sort.
#[derive(Debug, Clone, PartialEq)]
pub enum SortField {
    /// Descending relevance score (the default when no `Sort` is given).
    Score,
    /// Ascending doc id, a stable tiebreaker.
    DocId,
    /// A stored field's value, ascending unless `reverse` is set.
    Field { name: String, reverse: bool },
}

/// An ordered list of sort keys, evaluated left to right until one
/// produces a non-equal comparison.
#[derive(Debug, Clone, Default)]
pub struct Sort {
    fields: Vec<SortField>,
}

impl Sort {
    pub fn new(fields: Vec<SortField>) -> Self {
        Sort { fields }
    }

    pub fn by_relevance() -> Self {
        Sort::new(vec![SortField::Score, SortField::DocId])
    }

    /// Compares two `(doc, score)` pairs per this sort's key list.
    pub fn compare(&self, reader: &dyn IndexReader, a: (u32, f32), b: (u32, f32)) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        for field in &self.fields {
            let ordering = match field {
                SortField::Score => b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal),
                SortField::DocId => a.0.cmp(&b.0),
                SortField::Field { name, reverse } => {
                    let ordering = compare_field_values(reader.field_value(a.0, name), reader.field_value(b.0, name));
                    if *reverse {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn compare_field_values(a: Option<FieldValue>, b: Option<FieldValue>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(FieldValue::Text(a)), Some(FieldValue::Text(b))) => a.cmp(&b),
        (Some(FieldValue::Int(a)), Some(FieldValue::Int(b))) => a.cmp(&b),
        (Some(FieldValue::Float(a)), Some(FieldValue::Float(b))) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(FieldValue::Bool(a)), Some(FieldValue::Bool(b))) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}
