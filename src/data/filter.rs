use super::model::{CellValue, Dataset, DerivedView};

// ---------------------------------------------------------------------------
// Selection → view filter
// ---------------------------------------------------------------------------

/// Return the records whose grouping field equals `selection`.
///
/// Total over all inputs: a value that never occurs in the grouping column
/// simply yields an empty view. Dataset order and duplicates are preserved.
pub fn filter(dataset: &Dataset, selection: &CellValue) -> DerivedView {
    let field = dataset.grouping_field();
    let indices = dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| rec.get(field) == selection)
        .map(|(i, _)| i)
        .collect();

    DerivedView {
        selection: Some(selection.clone()),
        indices,
    }
}

/// Initial selection: the first distinct grouping value in dataset order.
/// `None` when the dataset has no records.
pub fn default_selection(dataset: &Dataset) -> Option<CellValue> {
    dataset.distinct_groups().first().cloned()
}
