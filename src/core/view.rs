//! In-memory state of one report screen: loaded rows, column selection,
//! search query and page cursor. Derived state (columns, filtered indices)
//! is recomputed whenever its inputs change.

use crate::core::columns::{active_columns, resolve_columns};
use crate::core::filter::matching_indices;
use crate::core::format::CellFormatter;
use crate::core::paginate::{clamp_page, page_count, paginate, Page};
use crate::domain::model::{CanonicalRow, ColumnDescriptor, DateRange, ExportRequest};
use crate::domain::schema::ReportSchema;
use crate::utils::cancel::CancelToken;
use chrono::NaiveDateTime;

/// Handed out by [`ReportView::begin_load`]; only the newest ticket may
/// publish rows.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    cancel: CancelToken,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

#[derive(Debug)]
pub struct ReportView {
    schema: &'static ReportSchema,
    formatter: CellFormatter,
    rows: Vec<CanonicalRow>,
    columns: Vec<ColumnDescriptor>,
    selected: Vec<String>,
    query: String,
    filtered: Vec<usize>,
    page: usize,
    page_size: usize,
    generation: u64,
    in_flight: Option<CancelToken>,
}

impl ReportView {
    pub fn new(schema: &'static ReportSchema, formatter: CellFormatter, page_size: usize) -> Self {
        Self {
            schema,
            formatter,
            rows: Vec::new(),
            columns: resolve_columns(schema, &[]),
            selected: Vec::new(),
            query: String::new(),
            filtered: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            generation: 0,
            in_flight: None,
        }
    }

    pub fn schema(&self) -> &'static ReportSchema {
        self.schema
    }

    pub fn formatter(&self) -> &CellFormatter {
        &self.formatter
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    /// Every known column, fixed first then extras.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn active_columns(&self) -> Vec<ColumnDescriptor> {
        active_columns(&self.columns, &self.selected)
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 取消前一個尚未完成的載入，發出新的 ticket
    pub fn begin_load(&mut self) -> LoadTicket {
        if let Some(previous) = self.in_flight.take() {
            tracing::debug!("🛑 {}: superseding load #{}", self.schema.name, self.generation);
            previous.cancel();
        }
        self.generation += 1;
        let cancel = CancelToken::new();
        self.in_flight = Some(cancel.clone());
        LoadTicket {
            generation: self.generation,
            cancel,
        }
    }

    /// Publishes rows for `ticket`. Returns `false` and leaves the rows alone
    /// when a newer load was started or the ticket was cancelled; a cancelled
    /// current load still ends the loading state.
    pub fn complete_load(&mut self, ticket: &LoadTicket, rows: Vec<CanonicalRow>) -> bool {
        if ticket.generation != self.generation || ticket.cancel.is_cancelled() {
            if ticket.generation == self.generation {
                self.in_flight = None;
            }
            tracing::debug!(
                "⏭️ {}: dropping stale result of load #{}",
                self.schema.name,
                ticket.generation
            );
            return false;
        }
        self.in_flight = None;
        self.set_rows(rows);
        true
    }

    /// Ends a failed load without touching the rows.
    pub fn abandon_load(&mut self, ticket: &LoadTicket) {
        if ticket.generation == self.generation {
            self.in_flight = None;
        }
    }

    pub fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    pub fn set_rows(&mut self, rows: Vec<CanonicalRow>) {
        self.rows = rows;
        self.columns = resolve_columns(self.schema, &self.rows);
        // 新資料裡不存在的欄位從選擇中移除
        let columns = &self.columns;
        self.selected.retain(|key| columns.iter().any(|c| &c.key == key));
        self.page = 1;
        self.refilter();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
        self.refilter();
    }

    pub fn toggle_column(&mut self, key: &str) {
        if let Some(pos) = self.selected.iter().position(|k| k == key) {
            self.selected.remove(pos);
        } else if self.columns.iter().any(|c| c.key == key) {
            self.selected.push(key.to_string());
        }
        self.refilter();
    }

    pub fn select_columns<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.selected = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| self.columns.iter().any(|c| &c.key == k))
            .collect();
        self.refilter();
    }

    pub fn select_all(&mut self) {
        self.selected = self.columns.iter().map(|c| c.key.clone()).collect();
        self.refilter();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.refilter();
    }

    fn refilter(&mut self) {
        let columns = self.active_columns();
        self.filtered = matching_indices(
            self.schema,
            &self.formatter,
            &self.rows,
            &columns,
            &self.query,
        );
        self.page = clamp_page(self.page, self.filtered.len(), self.page_size);
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered_rows(&self) -> impl Iterator<Item = &CanonicalRow> {
        self.filtered.iter().map(|&i| &self.rows[i])
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered.len(), self.page_size)
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.page = clamp_page(page, self.filtered.len(), self.page_size);
        self.page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.page + 1)
    }

    pub fn previous_page(&mut self) -> usize {
        self.go_to_page(self.page.saturating_sub(1))
    }

    /// Indices (into `rows()`) on the current page.
    pub fn current_page(&self) -> Page<'_, usize> {
        paginate(&self.filtered, self.page, self.page_size)
    }

    pub fn page_rows(&self) -> Vec<&CanonicalRow> {
        self.current_page()
            .items
            .iter()
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Display strings of the current page for the active columns.
    pub fn formatted_page(&self) -> Vec<Vec<String>> {
        let columns = self.active_columns();
        self.page_rows()
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| self.formatter.format_column(self.schema, row, &c.key))
                    .collect()
            })
            .collect()
    }

    pub fn export_request(&self, generated_at: NaiveDateTime, range: DateRange) -> ExportRequest {
        ExportRequest {
            generated_at,
            range,
            selected_columns: self.selected.clone(),
        }
    }
}
