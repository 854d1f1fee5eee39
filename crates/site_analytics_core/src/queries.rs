use chrono::NaiveDate;

use crate::contract::{QueryDefinition, ReportSection};

pub const CLIENT_ADDRESS_COLUMN: &str = "c_ip";
pub const TOP_PAGES_LIMIT: usize = 5;
pub const GEO_DISTRIBUTION_LIMIT: usize = 10;
pub const TOP_VISITORS_LIMIT: usize = 10;

/// Client addresses excluded from every analytical query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denylist {
    addresses: Vec<String>,
}

impl Denylist {
    /// Parses a comma-separated address list. Entries are trimmed and blank
    /// entries are dropped, so `""` and `" , "` both yield an empty list.
    pub fn parse(raw: &str) -> Self {
        Self {
            addresses: raw
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Renders the `WHERE` predicate excluding denylisted addresses.
    ///
    /// `NOT IN ()` is not valid SQL, so an empty list renders as a tautology.
    pub fn exclusion_predicate(&self, column: &str) -> String {
        if self.addresses.is_empty() {
            return "1 = 1".to_string();
        }

        let literals = self
            .addresses
            .iter()
            .map(|address| sql_string_literal(address))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{column} NOT IN ({literals})")
    }
}

/// Quotes a value as a SQL string literal, doubling embedded single quotes.
///
/// Every configured value spliced into query text goes through here.
pub fn sql_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn overview_query(table: &str, exclusion: &str) -> String {
    format!(
        "SELECT COUNT(*) as total_visits, COUNT(DISTINCT c_ip) as unique_visitors, \
         COUNT(DISTINCT date) as days_tracked \
         FROM {table} \
         WHERE {exclusion}"
    )
}

pub fn yesterday_query(table: &str, exclusion: &str, yesterday: NaiveDate) -> String {
    let date = sql_string_literal(&yesterday.format("%Y-%m-%d").to_string());
    format!(
        "SELECT COUNT(*) as visits_yesterday, COUNT(DISTINCT c_ip) as unique_yesterday \
         FROM {table} \
         WHERE date = DATE {date} AND {exclusion}"
    )
}

pub fn top_pages_query(table: &str, exclusion: &str) -> String {
    grouped_count_query(table, exclusion, "cs_uri_stem", "visits", TOP_PAGES_LIMIT)
}

pub fn geo_distribution_query(table: &str, exclusion: &str) -> String {
    grouped_count_query(
        table,
        exclusion,
        "x_edge_location",
        "requests",
        GEO_DISTRIBUTION_LIMIT,
    )
}

pub fn top_visitors_query(table: &str, exclusion: &str) -> String {
    grouped_count_query(
        table,
        exclusion,
        CLIENT_ADDRESS_COLUMN,
        "visits",
        TOP_VISITORS_LIMIT,
    )
}

fn grouped_count_query(
    table: &str,
    exclusion: &str,
    key_column: &str,
    count_alias: &str,
    limit: usize,
) -> String {
    format!(
        "SELECT {key_column}, COUNT(*) as {count_alias} \
         FROM {table} \
         WHERE {exclusion} \
         GROUP BY {key_column} \
         ORDER BY {count_alias} DESC \
         LIMIT {limit}"
    )
}

/// Builds the fixed query set in report order. The exclusion predicate is
/// rendered once and shared by all five queries.
pub fn build_query_definitions(
    table: &str,
    denylist: &Denylist,
    yesterday: NaiveDate,
) -> Vec<QueryDefinition> {
    let exclusion = denylist.exclusion_predicate(CLIENT_ADDRESS_COLUMN);

    ReportSection::ALL
        .into_iter()
        .map(|section| {
            let sql = match section {
                ReportSection::Overview => overview_query(table, &exclusion),
                ReportSection::Yesterday => yesterday_query(table, &exclusion, yesterday),
                ReportSection::TopPages => top_pages_query(table, &exclusion),
                ReportSection::GeoDistribution => geo_distribution_query(table, &exclusion),
                ReportSection::TopVisitors => top_visitors_query(table, &exclusion),
            };
            QueryDefinition { section, sql }
        })
        .collect()
}
