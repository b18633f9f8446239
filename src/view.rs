//! Filtered and sorted views over a [`Dataset`].
//!
//! The view is a list of record indices so the dataset itself is never
//! cloned or reordered. [`TableView`] memoizes the last derivation and only
//! recomputes when the dataset revision, the filter text or the sort state
//! changes.

use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use log::debug;

use crate::data::{CellValue, Dataset, Record, parse_number, parse_timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortState {
    pub column: Option<String>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    pub fn by(column: impl Into<String>, ascending: bool) -> Self {
        Self {
            column: Some(column.into()),
            ascending,
        }
    }

    /// Clicking the active column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column.to_string());
            self.ascending = true;
        }
    }
}

/// True when any value of `record` contains `needle` case-insensitively.
pub fn matches_filter(record: &Record, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    record
        .values()
        .any(|value| value.as_display().to_lowercase().contains(&needle))
}

pub fn filter_indices(dataset: &Dataset, filter: &str) -> Vec<usize> {
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| matches_filter(record, filter))
        .map(|(idx, _)| idx)
        .collect()
}

/// Sort key classes, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortClass {
    Null,
    Number,
    Date,
    Text,
}

enum SortKey<'a> {
    Null,
    Number(f64),
    Date(i64),
    Text(&'a str),
}

impl<'a> SortKey<'a> {
    fn of(value: Option<&'a CellValue>) -> Self {
        match value {
            None | Some(CellValue::Null) => SortKey::Null,
            Some(CellValue::Number(n)) => SortKey::Number(*n),
            Some(CellValue::Text(s)) => {
                if let Some(n) = parse_number(s) {
                    SortKey::Number(n)
                } else if let Some(ts) = parse_timestamp(s) {
                    SortKey::Date(ts)
                } else {
                    SortKey::Text(s)
                }
            }
        }
    }

    fn class(&self) -> SortClass {
        match self {
            SortKey::Null => SortClass::Null,
            SortKey::Number(_) => SortClass::Number,
            SortKey::Date(_) => SortClass::Date,
            SortKey::Text(_) => SortClass::Text,
        }
    }
}

fn locale_cmp(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

/// Ascending comparison of two cells under the column sort rules.
pub fn compare_values(left: Option<&CellValue>, right: Option<&CellValue>) -> Ordering {
    let (left, right) = (SortKey::of(left), SortKey::of(right));
    match (&left, &right) {
        (SortKey::Null, SortKey::Null) => Ordering::Equal,
        (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
        (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
        (SortKey::Text(a), SortKey::Text(b)) => locale_cmp(a, b),
        _ => left.class().cmp(&right.class()),
    }
}

/// Stable sort of `indices` by the active sort column. No column leaves order untouched.
pub fn sort_indices(dataset: &Dataset, indices: &mut [usize], sort: &SortState) {
    let Some(column) = sort.column.as_deref() else {
        return;
    };
    let records = dataset.records();
    indices.sort_by(|&a, &b| {
        let ordering = compare_values(records[a].get(column), records[b].get(column));
        if sort.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Filters then sorts; the result indexes into `dataset.records()`.
pub fn view_indices(dataset: &Dataset, filter: &str, sort: &SortState) -> Vec<usize> {
    let mut indices = filter_indices(dataset, filter);
    sort_indices(dataset, &mut indices, sort);
    indices
}

pub fn view<'a>(dataset: &'a Dataset, filter: &str, sort: &SortState) -> Vec<&'a Record> {
    view_indices(dataset, filter, sort)
        .into_iter()
        .map(|idx| &dataset.records()[idx])
        .collect()
}

fn derivation_key(dataset: &Dataset, filter: &str, sort: &SortState) -> u64 {
    let mut hasher = DefaultHasher::new();
    dataset.revision().hash(&mut hasher);
    dataset.len().hash(&mut hasher);
    filter.hash(&mut hasher);
    sort.hash(&mut hasher);
    hasher.finish()
}

/// Memoized table derivation.
#[derive(Debug, Default)]
pub struct TableView {
    key: Option<u64>,
    indices: Vec<usize>,
    recomputations: usize,
}

impl TableView {
    pub fn refresh(&mut self, dataset: &Dataset, filter: &str, sort: &SortState) -> &[usize] {
        let key = derivation_key(dataset, filter, sort);
        if self.key == Some(key) {
            debug!("Table view cache hit ({} row(s))", self.indices.len());
        } else {
            self.indices = view_indices(dataset, filter, sort);
            self.key = Some(key);
            self.recomputations += 1;
            debug!(
                "Recomputed table view: {} of {} row(s) visible",
                self.indices.len(),
                dataset.len()
            );
        }
        &self.indices
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.indices.clear();
    }

    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        let records = rows
            .iter()
            .map(|(name, price)| {
                let mut record = Record::new();
                record.insert("name".into(), text_or_null(name));
                record.insert("price".into(), text_or_null(price));
                record
            })
            .collect();
        Dataset::new(Vec::new(), records, 1)
    }

    fn text_or_null(value: &str) -> CellValue {
        if value.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(value.to_string())
        }
    }

    fn names(dataset: &Dataset, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .map(|&idx| dataset.records()[idx]["name"].as_display())
            .collect()
    }

    #[test]
    fn toggle_flips_same_column_and_resets_new_column() {
        let mut sort = SortState::default();
        sort.toggle("price");
        assert_eq!(sort, SortState::by("price", true));
        sort.toggle("price");
        assert_eq!(sort, SortState::by("price", false));
        sort.toggle("name");
        assert_eq!(sort, SortState::by("name", true));
    }

    #[test]
    fn filter_is_case_insensitive_across_columns() {
        let data = dataset(&[("Apple", "1.5"), ("Banana", "abc"), ("Cherry", "BAN")]);
        assert_eq!(names(&data, &filter_indices(&data, "banana")), vec!["Banana"]);
        assert_eq!(
            names(&data, &filter_indices(&data, "ban")),
            vec!["Banana", "Cherry"]
        );
        assert_eq!(filter_indices(&data, "").len(), 3);
    }

    #[test]
    fn nulls_first_ascending_and_last_descending() {
        let data = dataset(&[("a", "3"), ("b", ""), ("c", "1")]);
        let asc = view_indices(&data, "", &SortState::by("price", true));
        assert_eq!(names(&data, &asc), vec!["b", "c", "a"]);
        let desc = view_indices(&data, "", &SortState::by("price", false));
        assert_eq!(names(&data, &desc), vec!["a", "c", "b"]);
    }

    #[test]
    fn numeric_text_compares_numerically() {
        let data = dataset(&[("a", "10"), ("b", "9"), ("c", "100")]);
        let asc = view_indices(&data, "", &SortState::by("price", true));
        assert_eq!(names(&data, &asc), vec!["b", "a", "c"]);
    }

    #[test]
    fn dates_compare_by_timestamp() {
        let data = dataset(&[("a", "2024-03-01"), ("b", "2023-12-31"), ("c", "2024-01-15")]);
        let asc = view_indices(&data, "", &SortState::by("price", true));
        assert_eq!(names(&data, &asc), vec!["b", "c", "a"]);
    }

    #[test]
    fn mixed_classes_form_a_total_order() {
        let data = dataset(&[("a", "1a"), ("b", "9"), ("c", "10"), ("d", "")]);
        let asc = view_indices(&data, "", &SortState::by("price", true));
        assert_eq!(names(&data, &asc), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn text_sort_ignores_case_first() {
        let data = dataset(&[("banana", ""), ("Cherry", ""), ("apple", "")]);
        let asc = view_indices(&data, "", &SortState::by("name", true));
        assert_eq!(names(&data, &asc), vec!["apple", "banana", "Cherry"]);
    }

    #[test]
    fn no_sort_column_keeps_source_order() {
        let data = dataset(&[("b", "2"), ("a", "1")]);
        assert_eq!(view_indices(&data, "", &SortState::default()), vec![0, 1]);
    }

    #[test]
    fn table_view_recomputes_only_on_input_change() {
        let data = dataset(&[("Apple", "1.5"), ("Banana", "abc")]);
        let mut table = TableView::default();
        let sort = SortState::default();
        assert_eq!(table.refresh(&data, "", &sort).len(), 2);
        assert_eq!(table.refresh(&data, "", &sort).len(), 2);
        assert_eq!(table.recomputations(), 1);
        assert_eq!(table.refresh(&data, "apple", &sort), &[0]);
        assert_eq!(table.recomputations(), 2);
        table.invalidate();
        table.refresh(&data, "apple", &sort);
        assert_eq!(table.recomputations(), 3);
    }
}
