// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Client-side list pipeline shared by every list screen.
//!
//! A screen holds the full snapshot it fetched and derives the visible rows
//! by running filter, then sort, then paginate. Every step is a pure
//! function of its inputs, so re-running the pipeline after a refetch with
//! unchanged controls yields the same slice.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::PrimitiveDateTime;

use crate::timestamp;

/// Header label plus the wire field name used for server-side predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub label: &'static str,
    pub field: &'static str,
}

impl Column {
    pub const fn new(label: &'static str, field: &'static str) -> Self {
        Self { label, field }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(PrimitiveDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn optional_int(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Int)
    }

    pub fn optional_float(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Float)
    }

    pub fn optional_timestamp(value: Option<PrimitiveDateTime>) -> Self {
        value.map_or(Self::Null, Self::Timestamp)
    }

    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "yes".to_owned(),
            Self::Bool(false) => "no".to_owned(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Timestamp(value) => timestamp::format_display(*value),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `folded_needle` must already be lower-cased.
    pub fn contains_folded(&self, folded_needle: &str) -> bool {
        if folded_needle.is_empty() {
            return true;
        }
        match self {
            Self::Null => false,
            // Flags match their display form and both wire forms.
            Self::Bool(value) => {
                let forms: [&str; 3] = if *value {
                    ["yes", "1", "true"]
                } else {
                    ["no", "0", "false"]
                };
                forms.iter().any(|form| form.contains(folded_needle))
            }
            Self::Text(value) => value.to_lowercase().contains(folded_needle),
            other => other.display().to_lowercase().contains(folded_needle),
        }
    }

    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Text(_) => 3,
            Self::Timestamp(_) => 4,
        }
    }

    // Mixed kinds order by kind rank. The result is stable but not meaningful
    // when a column carries values of different kinds.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(left), Self::Bool(right)) => left.cmp(right),
            (Self::Int(left), Self::Int(right)) => left.cmp(right),
            (Self::Float(left), Self::Float(right)) => left.total_cmp(right),
            (Self::Int(left), Self::Float(right)) => (*left as f64).total_cmp(right),
            (Self::Float(left), Self::Int(right)) => left.total_cmp(&(*right as f64)),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Timestamp(left), Self::Timestamp(right)) => left.cmp(right),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

pub trait TableRecord {
    fn columns() -> &'static [Column];

    /// Out-of-range columns read as `CellValue::Null`.
    fn cell(&self, column: usize) -> CellValue;

    fn record_id(&self) -> i64;

    fn cells(&self) -> Vec<CellValue>
    where
        Self: Sized,
    {
        (0..Self::columns().len())
            .map(|column| self.cell(column))
            .collect()
    }

    fn matches_query(&self, folded_query: &str) -> bool
    where
        Self: Sized,
    {
        (0..Self::columns().len()).any(|column| self.cell(column).contains_folded(folded_query))
    }
}

/// Finds a column by wire field name or header label, case-insensitively.
pub fn column_index<R: TableRecord>(name: &str) -> Option<usize> {
    let wanted = name.trim();
    R::columns().iter().position(|column| {
        column.field.eq_ignore_ascii_case(wanted) || column.label.eq_ignore_ascii_case(wanted)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    Fifty,
    Hundred,
    TwoHundred,
}

impl PageSize {
    pub const ALL: [Self; 5] = [
        Self::Ten,
        Self::Twenty,
        Self::Fifty,
        Self::Hundred,
        Self::TwoHundred,
    ];

    pub const fn get(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
            Self::Hundred => 100,
            Self::TwoHundred => 200,
        }
    }

    pub fn from_rows(rows: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.get() == rows)
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|size| *size == self).unwrap_or(0);
        Self::ALL[(index + 1).min(Self::ALL.len() - 1)]
    }

    pub fn prev(self) -> Self {
        let index = Self::ALL.iter().position(|size| *size == self).unwrap_or(0);
        Self::ALL[index.saturating_sub(1)]
    }
}

pub fn filter<'a, R, I>(records: I, query: &str) -> Vec<&'a R>
where
    R: TableRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    if query.is_empty() {
        return records.into_iter().collect();
    }
    let folded = query.to_lowercase();
    records
        .into_iter()
        .filter(|record| record.matches_query(&folded))
        .collect()
}

/// Stable: records with equal keys keep their input order in both directions.
pub fn sort<R: TableRecord>(records: &mut [&R], column: usize, direction: SortDirection) {
    records.sort_by(|left, right| {
        let order = left.cell(column).compare(&right.cell(column));
        match direction {
            SortDirection::Asc => order,
            SortDirection::Desc => order.reverse(),
        }
    });
}

/// 1-based. Page 0 reads as page 1; pages past the end are empty.
pub fn paginate<T>(records: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return &[];
    }
    let start = page.max(1).saturating_sub(1).saturating_mul(page_size);
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(records.len());
    &records[start..end]
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Column-scoped predicate. Screens backed by server-side filtering send
/// these as query parameters; the same predicate can be applied locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub field: String,
    pub needle: String,
}

impl ColumnFilter {
    pub fn new(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn query_pair(&self) -> (&str, &str) {
        (&self.field, &self.needle)
    }

    /// Parses `field=needle`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (field, needle) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("column filter {raw:?} must look like field=value"))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(anyhow!("column filter {raw:?} is missing a field name"));
        }
        Ok(Self::new(field, needle.trim()))
    }
}

pub fn apply_column_filters<'a, R: TableRecord>(
    records: &'a [R],
    filters: &[ColumnFilter],
) -> Result<Vec<&'a R>> {
    let mut resolved = Vec::with_capacity(filters.len());
    for filter in filters {
        let column = column_index::<R>(&filter.field)
            .ok_or_else(|| anyhow!("unknown column {:?} in filter", filter.field))?;
        resolved.push((column, filter.needle.to_lowercase()));
    }

    Ok(records
        .iter()
        .filter(|record| {
            resolved
                .iter()
                .all(|(column, needle)| record.cell(*column).contains_folded(needle))
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListControls {
    pub query: String,
    pub sort: Option<SortSpec>,
    pub page: usize,
    pub page_size: PageSize,
}

impl Default for ListControls {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: None,
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a, R> {
    pub rows: Vec<&'a R>,
    pub page: usize,
    pub page_count: usize,
    pub matched: usize,
    pub total: usize,
}

impl ListControls {
    pub fn apply<'a, R: TableRecord>(&self, records: &'a [R]) -> PageSlice<'a, R> {
        let mut matched = filter(records, &self.query);
        if let Some(spec) = self.sort {
            sort(&mut matched, spec.column, spec.direction);
        }
        let size = self.page_size.get();
        PageSlice {
            rows: paginate(&matched, self.page, size).to_vec(),
            page: self.page.max(1),
            page_count: page_count(matched.len(), size),
            matched: matched.len(),
            total: records.len(),
        }
    }

    /// none -> asc -> desc -> none; a different column starts at asc.
    pub fn cycle_sort(&mut self, column: usize) -> Option<SortSpec> {
        self.sort = match self.sort {
            Some(SortSpec {
                column: current,
                direction: SortDirection::Asc,
            }) if current == column => Some(SortSpec {
                column,
                direction: SortDirection::Desc,
            }),
            Some(SortSpec {
                column: current,
                direction: SortDirection::Desc,
            }) if current == column => None,
            _ => Some(SortSpec {
                column,
                direction: SortDirection::Asc,
            }),
        };
        self.sort
    }
}

/// A screen's fetched snapshot plus the controls applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<R> {
    records: Vec<R>,
    controls: ListControls,
}

impl<R> Default for ListView<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            controls: ListControls::default(),
        }
    }
}

impl<R: TableRecord> ListView<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            controls: ListControls::default(),
        }
    }

    pub fn with_controls(records: Vec<R>, controls: ListControls) -> Self {
        let mut view = Self { records, controls };
        view.clamp_page();
        view
    }

    pub fn controls(&self) -> &ListControls {
        &self.controls
    }

    pub fn visible(&self) -> PageSlice<'_, R> {
        self.controls.apply(&self.records)
    }

    pub fn matched_len(&self) -> usize {
        if self.controls.query.is_empty() {
            return self.records.len();
        }
        let folded = self.controls.query.to_lowercase();
        self.records
            .iter()
            .filter(|record| record.matches_query(&folded))
            .count()
    }

    pub fn page_count(&self) -> usize {
        page_count(self.matched_len(), self.controls.page_size.get())
    }

    /// Swaps in a refetched snapshot. The page survives unless the new
    /// snapshot is shorter, in which case it clamps to the last page.
    pub fn replace_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.clamp_page();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.controls.query = query.into();
        self.controls.page = 1;
    }

    pub fn cycle_sort(&mut self, column: usize) -> Option<SortSpec> {
        self.controls.cycle_sort(column)
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        self.controls.page = page.clamp(1, self.page_count());
        self.controls.page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.controls.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        self.set_page(self.controls.page.saturating_sub(1))
    }

    /// Keeps the first row of the current page on screen.
    pub fn set_page_size(&mut self, page_size: PageSize) {
        let first_row = (self.controls.page.max(1) - 1) * self.controls.page_size.get();
        self.controls.page_size = page_size;
        self.controls.page = first_row / page_size.get() + 1;
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        let last = self.page_count();
        self.controls.page = self.controls.page.clamp(1, last);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CellValue, Column, ColumnFilter, ListControls, ListView, PageSize, SortDirection,
        SortSpec, TableRecord, apply_column_filters, column_index, filter, page_count, paginate,
        sort,
    };
    use anyhow::Result;
    use std::cmp::Ordering;

    #[derive(Debug, Clone, PartialEq)]
    struct FaultRow {
        id: i64,
        machine: &'static str,
        severity: &'static str,
        downtime: Option<f64>,
    }

    const FAULT_COLUMNS: [Column; 4] = [
        Column::new("ID", "id"),
        Column::new("Machine", "machineName"),
        Column::new("Severity", "severity"),
        Column::new("Downtime", "downtimeHours"),
    ];

    impl TableRecord for FaultRow {
        fn columns() -> &'static [Column] {
            &FAULT_COLUMNS
        }

        fn cell(&self, column: usize) -> CellValue {
            match column {
                0 => CellValue::Int(self.id),
                1 => CellValue::text(self.machine),
                2 => CellValue::text(self.severity),
                3 => CellValue::optional_float(self.downtime),
                _ => CellValue::Null,
            }
        }

        fn record_id(&self) -> i64 {
            self.id
        }
    }

    fn fault(id: i64, machine: &'static str, severity: &'static str) -> FaultRow {
        FaultRow {
            id,
            machine,
            severity,
            downtime: None,
        }
    }

    fn sample_faults() -> Vec<FaultRow> {
        vec![
            fault(1, "CNC-01", "Yüksek"),
            fault(2, "Pres-02", "Orta"),
            fault(3, "CNC-03", "YÜKSEK"),
            fault(4, "Kaynak-04", "Düşük"),
            fault(5, "Boya-05", "yüksek risk"),
        ]
    }

    fn numbered(count: i64) -> Vec<FaultRow> {
        (1..=count).map(|id| fault(id, "M", "Orta")).collect()
    }

    fn ids(rows: &[&FaultRow]) -> Vec<i64> {
        rows.iter().map(|row| row.id).collect()
    }

    #[test]
    fn empty_query_is_identity() {
        let rows = sample_faults();
        let filtered = filter(&rows, "");
        assert_eq!(ids(&filtered), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn filter_matches_severity_case_insensitively() {
        let rows = sample_faults();
        let filtered = filter(&rows, "yüksek");
        assert_eq!(ids(&filtered), vec![1, 3, 5]);
        for row in filtered {
            assert!(row.severity.to_lowercase().contains("yüksek"));
        }
    }

    #[test]
    fn filter_scans_every_column() {
        let rows = sample_faults();
        assert_eq!(ids(&filter(&rows, "cnc")), vec![1, 3]);
        assert_eq!(ids(&filter(&rows, "4")), vec![4]);
    }

    #[test]
    fn filter_result_is_subset_in_input_order() {
        let rows = sample_faults();
        let filtered = filter(&rows, "o");
        let mut last_position = None;
        for row in filtered {
            let position = rows
                .iter()
                .position(|candidate| candidate == row)
                .expect("filtered row comes from input");
            if let Some(last) = last_position {
                assert!(position > last);
            }
            last_position = Some(position);
        }
    }

    #[test]
    fn null_cells_do_not_match_text() {
        let rows = vec![fault(1, "A", "Orta")];
        assert!(filter(&rows, "null").is_empty());
    }

    #[test]
    fn flag_cells_match_display_and_wire_forms() {
        let on = CellValue::Bool(true);
        let off = CellValue::Bool(false);
        for needle in ["yes", "1", "true"] {
            assert!(on.contains_folded(needle), "{needle} should match a set flag");
            assert!(!off.contains_folded(needle), "{needle} should not match a clear flag");
        }
        for needle in ["no", "0", "false"] {
            assert!(off.contains_folded(needle), "{needle} should match a clear flag");
            assert!(!on.contains_folded(needle), "{needle} should not match a set flag");
        }
    }

    #[test]
    fn sort_descending_after_ascending_keeps_tie_order() {
        let rows = vec![
            fault(1, "B", "x"),
            fault(2, "A", "x"),
            fault(3, "B", "x"),
            fault(4, "A", "x"),
        ];
        let mut view: Vec<&FaultRow> = rows.iter().collect();
        sort(&mut view, 1, SortDirection::Asc);
        assert_eq!(ids(&view), vec![2, 4, 1, 3]);

        sort(&mut view, 1, SortDirection::Desc);
        assert_eq!(ids(&view), vec![1, 3, 2, 4]);
    }

    #[test]
    fn filter_and_sort_commute() {
        let rows = vec![
            fault(1, "CNC-01", "Orta"),
            fault(2, "Pres-02", "Yüksek"),
            fault(3, "CNC-03", "Orta"),
            fault(4, "Kaynak-04", "Yüksek"),
            fault(5, "CNC-05", "Düşük"),
            fault(6, "CNC-06", "Yüksek"),
            fault(7, "Boya-07", "Orta"),
        ];
        for (query, column, direction) in [
            ("cnc", 2, SortDirection::Asc),
            ("cnc", 2, SortDirection::Desc),
            ("orta", 1, SortDirection::Desc),
            ("", 2, SortDirection::Asc),
            ("zzz", 0, SortDirection::Asc),
        ] {
            let mut filtered_first = filter(&rows, query);
            sort(&mut filtered_first, column, direction);

            let mut sorted: Vec<&FaultRow> = rows.iter().collect();
            sort(&mut sorted, column, direction);
            let sorted_first = filter(sorted, query);

            assert_eq!(
                ids(&filtered_first),
                ids(&sorted_first),
                "query {query:?} column {column} {direction:?}"
            );
        }
    }

    #[test]
    fn sort_orders_numbers_numerically() {
        let mut rows = vec![fault(10, "A", "x"), fault(9, "A", "x"), fault(100, "A", "x")];
        rows[0].downtime = Some(2.5);
        rows[1].downtime = Some(12.0);
        rows[2].downtime = None;
        let mut view: Vec<&FaultRow> = rows.iter().collect();
        sort(&mut view, 3, SortDirection::Asc);
        assert_eq!(ids(&view), vec![100, 10, 9]);

        sort(&mut view, 0, SortDirection::Asc);
        assert_eq!(ids(&view), vec![9, 10, 100]);
    }

    #[test]
    fn sort_on_unknown_column_preserves_order() {
        let rows = sample_faults();
        let mut view: Vec<&FaultRow> = rows.iter().collect();
        sort(&mut view, 42, SortDirection::Desc);
        assert_eq!(ids(&view), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn mixed_kinds_compare_without_panicking() {
        assert_eq!(
            CellValue::Int(3).compare(&CellValue::Float(3.5)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::Null.compare(&CellValue::text("a")),
            Ordering::Less
        );
        assert_eq!(
            CellValue::text("a").compare(&CellValue::Int(1)),
            Ordering::Greater
        );
    }

    #[test]
    fn twenty_five_rows_split_into_three_pages() {
        let rows = numbered(25);
        assert_eq!(paginate(&rows, 1, 10).len(), 10);
        assert_eq!(paginate(&rows, 2, 10).len(), 10);
        assert_eq!(paginate(&rows, 3, 10).len(), 5);
        assert!(paginate(&rows, 4, 10).is_empty());
        assert_eq!(page_count(rows.len(), 10), 3);
    }

    #[test]
    fn pages_partition_input_without_gaps() {
        let rows = numbered(37);
        for size in [1, 3, 10, 37, 50] {
            let pages = page_count(rows.len(), size);
            let mut seen = Vec::new();
            for page in 1..=pages {
                let slice = paginate(&rows, page, size);
                assert!(slice.len() <= size);
                seen.extend(slice.iter().map(|row| row.id));
            }
            assert_eq!(seen, (1..=37).collect::<Vec<_>>(), "page size {size}");
        }
    }

    #[test]
    fn paginate_clamps_degenerate_inputs() {
        let rows = numbered(3);
        assert_eq!(paginate(&rows, 0, 2).len(), 2);
        assert!(paginate(&rows, usize::MAX, 2).is_empty());
        assert!(paginate(&rows, 1, 0).is_empty());
        let empty: Vec<FaultRow> = Vec::new();
        assert!(paginate(&empty, 1, 10).is_empty());
        assert_eq!(page_count(0, 10), 1);
    }

    #[test]
    fn composed_pipeline_is_deterministic() {
        let rows = sample_faults();
        let controls = ListControls {
            query: "k".to_owned(),
            sort: Some(SortSpec {
                column: 1,
                direction: SortDirection::Desc,
            }),
            page: 1,
            page_size: PageSize::Ten,
        };
        let first = controls.apply(&rows);
        let second = controls.apply(&rows);
        assert_eq!(first, second);
        assert_eq!(ids(&first.rows), vec![4, 3, 1, 5]);
        assert_eq!(first.matched, 4);
        assert_eq!(first.total, 5);
    }

    #[test]
    fn cycle_sort_walks_asc_desc_none() {
        let mut controls = ListControls::default();
        assert_eq!(
            controls.cycle_sort(2).map(|spec| spec.direction),
            Some(SortDirection::Asc)
        );
        assert_eq!(
            controls.cycle_sort(2).map(|spec| spec.direction),
            Some(SortDirection::Desc)
        );
        assert_eq!(controls.cycle_sort(2), None);

        controls.cycle_sort(1);
        let switched = controls.cycle_sort(2).expect("new column sorts ascending");
        assert_eq!(switched.column, 2);
        assert_eq!(switched.direction, SortDirection::Asc);
    }

    #[test]
    fn refresh_keeps_page_and_clamps_when_shorter() {
        let mut view = ListView::new(numbered(25));
        assert_eq!(view.set_page(3), 3);
        view.replace_records(numbered(30));
        assert_eq!(view.controls().page, 3);
        assert_eq!(view.visible().rows.len(), 10);

        view.replace_records(numbered(12));
        assert_eq!(view.controls().page, 2);
        assert_eq!(view.visible().rows.len(), 2);
    }

    #[test]
    fn query_change_resets_page() {
        let mut view = ListView::new(numbered(25));
        view.set_page(2);
        view.set_query("m");
        assert_eq!(view.controls().page, 1);
    }

    #[test]
    fn page_navigation_stays_in_range() {
        let mut view = ListView::new(numbered(25));
        assert_eq!(view.prev_page(), 1);
        assert_eq!(view.next_page(), 2);
        assert_eq!(view.next_page(), 3);
        assert_eq!(view.next_page(), 3);
        assert_eq!(view.set_page(0), 1);
    }

    #[test]
    fn page_size_change_keeps_first_row_visible() {
        let mut view = ListView::new(numbered(120));
        view.set_page(4);
        view.set_page_size(PageSize::Twenty);
        assert_eq!(view.controls().page, 2);
        let first = view.visible().rows.first().map(|row| row.id);
        assert_eq!(first, Some(21));

        view.set_page_size(PageSize::TwoHundred);
        assert_eq!(view.controls().page, 1);
    }

    #[test]
    fn page_size_steps_through_enumerated_set() {
        assert_eq!(PageSize::Ten.next(), PageSize::Twenty);
        assert_eq!(PageSize::TwoHundred.next(), PageSize::TwoHundred);
        assert_eq!(PageSize::Ten.prev(), PageSize::Ten);
        assert_eq!(PageSize::from_rows(50), Some(PageSize::Fifty));
        assert_eq!(PageSize::from_rows(15), None);
    }

    #[test]
    fn column_filters_scope_to_one_column() -> Result<()> {
        let rows = sample_faults();
        let filters = vec![ColumnFilter::parse("severity=yüksek")?];
        let matched = apply_column_filters(&rows, &filters)?;
        assert_eq!(ids(&matched), vec![1, 3, 5]);

        let machine_only = vec![ColumnFilter::new("machineName", "yüksek")];
        assert!(apply_column_filters(&rows, &machine_only)?.is_empty());
        Ok(())
    }

    #[test]
    fn column_filter_rejects_unknown_field() {
        let rows = sample_faults();
        let error = apply_column_filters(&rows, &[ColumnFilter::new("color", "red")])
            .expect_err("unknown column should fail");
        assert!(error.to_string().contains("unknown column"));
        assert!(ColumnFilter::parse("no-equals").is_err());
    }

    #[test]
    fn column_lookup_accepts_field_or_label() {
        assert_eq!(column_index::<FaultRow>("severity"), Some(2));
        assert_eq!(column_index::<FaultRow>("MACHINE"), Some(1));
        assert_eq!(column_index::<FaultRow>("machinename"), Some(1));
        assert_eq!(column_index::<FaultRow>("missing"), None);
    }
}
