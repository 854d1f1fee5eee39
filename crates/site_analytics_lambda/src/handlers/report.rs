use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::{info, warn};

use crate::adapters::notifier::Notifier;
use crate::adapters::query_service::QueryService;
use crate::config::{PollSettings, ReportConfig};
use crate::error::ReportError;
use crate::runtime::contract::{
    Notification, QueryDefinition, QueryRequest, QueryResult, QueryState, ReportAcknowledgement,
};
use crate::runtime::queries::build_query_definitions;
use crate::runtime::report::{render_report, report_subject, SectionResults};

/// Terminal outcome of one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub state: QueryState,
    pub attempts: u32,
}

/// Runs the daily report: five queries, one rendered message, one publish.
///
/// Query failures, cancellations, and poll timeouts degrade to an empty
/// section. Any error raised by a service call aborts the run before
/// anything is published.
pub fn handle_report_event(
    config: &ReportConfig,
    now: DateTime<Utc>,
    query_service: &impl QueryService,
    notifier: &impl Notifier,
) -> Result<ReportAcknowledgement, ReportError> {
    let today = now.date_naive();
    let yesterday = previous_day(today);
    info!(
        event = "report_started",
        today = %today,
        yesterday = %yesterday,
        filtered_addresses = config.denylist.len()
    );

    let mut results = SectionResults::new();
    for definition in build_query_definitions(&config.table, &config.denylist, yesterday) {
        let result = execute_query(config, &definition, query_service)?;
        results.insert(definition.section, result);
    }

    let notification = Notification {
        topic_arn: config.topic_arn.clone(),
        subject: report_subject(today),
        message: render_report(now, yesterday, &results, config.denylist.len()),
    };
    let message_id = notifier.publish(&notification)?;
    info!(
        event = "report_published",
        subject = %notification.subject,
        message_id = message_id.as_deref().unwrap_or("")
    );

    Ok(ReportAcknowledgement::sent())
}

/// Submits one query and waits for it. Returns the full result set on
/// success and an empty one on any other terminal state or on timeout.
pub fn execute_query(
    config: &ReportConfig,
    definition: &QueryDefinition,
    query_service: &impl QueryService,
) -> Result<QueryResult, ReportError> {
    let request = QueryRequest {
        sql: definition.sql.clone(),
        database: config.database.clone(),
        output_location: config.output_location.clone(),
    };
    let execution_id = query_service.start_query(&request)?;
    info!(
        event = "query_submitted",
        section = definition.section.as_str(),
        query_execution_id = %execution_id
    );

    let outcome = poll_until_terminal(&execution_id, config.poll, query_service)?;
    if outcome.state == QueryState::Succeeded {
        return Ok(query_service.query_results(&execution_id)?);
    }

    warn!(
        event = "query_not_succeeded",
        section = definition.section.as_str(),
        query_execution_id = %execution_id,
        state = outcome.state.as_str(),
        attempts = outcome.attempts,
        timed_out = !outcome.state.is_terminal()
    );
    Ok(QueryResult::empty())
}

/// Checks the execution state at most `settings.max_attempts` times,
/// sleeping `settings.interval` between checks. Returns the last observed
/// state, which is non-terminal when the ceiling was reached.
pub fn poll_until_terminal(
    execution_id: &str,
    settings: PollSettings,
    query_service: &impl QueryService,
) -> Result<PollOutcome, ReportError> {
    let mut state = QueryState::Queued;
    let mut attempts = 0;

    while attempts < settings.max_attempts {
        state = query_service.query_state(execution_id)?;
        attempts += 1;
        if state.is_terminal() || attempts == settings.max_attempts {
            break;
        }
        std::thread::sleep(settings.interval);
    }

    Ok(PollOutcome { state, attempts })
}

fn previous_day(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}
