use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE: &str = "cloudfront_logs_db";
pub const DEFAULT_TABLE: &str = "cloudfront_logs";
pub const DEFAULT_COUNTER_TABLE: &str = "cloud-resume-visitor-counter";

pub const COUNTER_KEY: &str = "visitor-count";
pub const COUNTER_ATTRIBUTE: &str = "count";
pub const COUNTER_START: i64 = 0;
pub const COUNTER_DELTA: i64 = 1;

pub const REPORT_SENT_MESSAGE: &str = "Analytics report sent successfully";

/// The five analytical questions asked on every report run, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportSection {
    Overview,
    Yesterday,
    TopPages,
    GeoDistribution,
    TopVisitors,
}

impl ReportSection {
    pub const ALL: [ReportSection; 5] = [
        Self::Overview,
        Self::Yesterday,
        Self::TopPages,
        Self::GeoDistribution,
        Self::TopVisitors,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Yesterday => "yesterday",
            Self::TopPages => "top_pages",
            Self::GeoDistribution => "geo_distribution",
            Self::TopVisitors => "top_visitors",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    pub section: ReportSection,
    pub sql: String,
}

/// A query submission as handed to the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub sql: String,
    pub database: String,
    pub output_location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    /// Maps a service state name. Unrecognised names are treated as still
    /// in flight so the poll loop keeps waiting within its attempt ceiling.
    pub fn from_service_name(name: &str) -> Self {
        match name {
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            "QUEUED" => Self::Queued,
            _ => Self::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    pub cells: Vec<Option<String>>,
}

impl ResultRow {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: values.into_iter().map(|value| Some(value.into())).collect(),
        }
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|cell| cell.as_deref())
    }
}

/// Tabular query output. Row 0 is the header row; the rest are data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub rows: Vec<ResultRow>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    pub fn has_data(&self) -> bool {
        self.rows.len() > 1
    }

    pub fn data_rows(&self) -> &[ResultRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn first_data_row(&self) -> Option<&ResultRow> {
        self.rows.get(1)
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = ResultRow>) {
        self.rows.extend(rows);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic_arn: String,
    pub subject: String,
    pub message: String,
}

/// Atomic "initialise if absent, then add" request against a named counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementRequest {
    pub key: String,
    pub attribute: String,
    pub start: i64,
    pub delta: i64,
}

impl IncrementRequest {
    pub fn visitor_count() -> Self {
        Self {
            key: COUNTER_KEY.to_string(),
            attribute: COUNTER_ATTRIBUTE.to_string(),
            start: COUNTER_START,
            delta: COUNTER_DELTA,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterResponse {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportAcknowledgement {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl ReportAcknowledgement {
    pub fn sent() -> Self {
        Self {
            status_code: 200,
            body: REPORT_SENT_MESSAGE.to_string(),
        }
    }
}
