use crate::api::{ApiError, FindingsApi};
use crate::finding::Finding;
use crate::hydrate::{get_finding, list_findings, FindingSink};
use crate::query::QueryContext;
use crate::row::Row;
use crate::schema::{column, project_row, ColumnDef, COLUMNS, GET_KEY_COLUMN};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

/// Receiver for projected rows.
pub trait RowSink {
    fn push_row(&mut self, row: Row);

    /// Rows still wanted by the caller; `None` when unbounded.
    fn rows_remaining(&self) -> Option<u64>;
}

/// In-memory sink that stops accepting rows once its quota is met.
#[derive(Debug, Default)]
pub struct CollectingSink {
    rows: Vec<Row>,
    quota: Option<u64>,
}

impl CollectingSink {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Quota taken from a query limit; negative limits allow no rows.
    pub fn for_limit(limit: Option<i64>) -> Self {
        Self {
            rows: Vec::new(),
            quota: limit.map(|limit| u64::try_from(limit).unwrap_or(0)),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl RowSink for CollectingSink {
    fn push_row(&mut self, row: Row) {
        if self.rows_remaining() != Some(0) {
            self.rows.push(row);
        }
    }

    fn rows_remaining(&self) -> Option<u64> {
        self.quota
            .map(|quota| quota.saturating_sub(self.rows.len() as u64))
    }
}

struct ProjectingSink<'a> {
    columns: &'a [&'static ColumnDef],
    rows: &'a mut dyn RowSink,
}

impl FindingSink for ProjectingSink<'_> {
    fn push_finding(&mut self, finding: Finding) {
        self.rows.push_row(project_row(&finding, self.columns));
    }

    fn rows_remaining(&self) -> Option<u64> {
        self.rows.rows_remaining()
    }
}

/// Resolve requested column names; an empty selection means every column.
pub fn resolve_columns(names: &[String]) -> Result<Vec<&'static ColumnDef>, TableError> {
    if names.is_empty() {
        return Ok(COLUMNS.iter().collect());
    }
    names
        .iter()
        .map(|name| column(name).ok_or_else(|| TableError::UnknownColumn(name.clone())))
        .collect()
}

/// Query entry points for the findings table.
pub struct FindingsTable;

impl FindingsTable {
    /// Look up one finding and project the requested columns.
    pub fn get<A: FindingsApi + ?Sized>(
        api: &A,
        id: &str,
        columns: &[String],
    ) -> Result<Option<Row>, TableError> {
        let columns = resolve_columns(columns)?;
        let finding = get_finding(api, id)?;
        Ok(finding.map(|finding| project_row(&finding, &columns)))
    }

    /// List findings matching `ctx`, streaming projected rows into `sink`.
    pub fn scan<A: FindingsApi + ?Sized>(
        api: &A,
        ctx: &QueryContext,
        sink: &mut dyn RowSink,
    ) -> Result<(), TableError> {
        let columns = resolve_columns(&ctx.columns)?;
        let mut projecting = ProjectingSink {
            columns: &columns,
            rows: sink,
        };
        list_findings(api, ctx, &mut projecting)?;
        Ok(())
    }

    /// Run a query, using the single-finding lookup when it carries an `id`
    /// equality predicate and a list otherwise.
    pub fn execute<A: FindingsApi + ?Sized>(
        api: &A,
        ctx: &QueryContext,
        sink: &mut dyn RowSink,
    ) -> Result<(), TableError> {
        match ctx.equality_key(GET_KEY_COLUMN) {
            Some(id) => {
                if let Some(row) = Self::get(api, id, &ctx.columns)? {
                    sink.push_row(row);
                }
                Ok(())
            }
            None => Self::scan(api, ctx, sink),
        }
    }
}
