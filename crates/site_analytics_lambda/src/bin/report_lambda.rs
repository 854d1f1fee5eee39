use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, ResultConfiguration, Row};
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use site_analytics_lambda::adapters::notifier::Notifier;
use site_analytics_lambda::adapters::query_service::{collect_pages, QueryService};
use site_analytics_lambda::config::ReportConfig;
use site_analytics_lambda::error::BackendError;
use site_analytics_lambda::handlers::report::handle_report_event;
use site_analytics_lambda::runtime::contract::{
    Notification, QueryRequest, QueryResult, QueryState, ReportAcknowledgement, ResultRow,
};
use site_analytics_lambda::telemetry::init_tracing;
use tracing::info;

struct AthenaQueryService {
    athena_client: aws_sdk_athena::Client,
}

impl QueryService for AthenaQueryService {
    fn start_query(&self, request: &QueryRequest) -> Result<String, BackendError> {
        let request = request.clone();
        let client = self.athena_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .start_query_execution()
                    .query_string(request.sql)
                    .query_execution_context(
                        QueryExecutionContext::builder()
                            .database(request.database)
                            .build(),
                    )
                    .result_configuration(
                        ResultConfiguration::builder()
                            .output_location(request.output_location)
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(|error| {
                        BackendError::QueryService(format!(
                            "failed to start query: {}",
                            DisplayErrorContext(&error)
                        ))
                    })?;

                output
                    .query_execution_id()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        BackendError::QueryService(
                            "start_query_execution returned no execution id".to_string(),
                        )
                    })
            })
        })
    }

    fn query_state(&self, execution_id: &str) -> Result<QueryState, BackendError> {
        let execution_id = execution_id.to_string();
        let client = self.athena_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_query_execution()
                    .query_execution_id(execution_id)
                    .send()
                    .await
                    .map_err(|error| {
                        BackendError::QueryService(format!(
                            "failed to read query state: {}",
                            DisplayErrorContext(&error)
                        ))
                    })?;

                Ok(output
                    .query_execution()
                    .and_then(|execution| execution.status())
                    .and_then(|status| status.state())
                    .map(|state| QueryState::from_service_name(state.as_str()))
                    .unwrap_or(QueryState::Running))
            })
        })
    }

    fn query_results(&self, execution_id: &str) -> Result<QueryResult, BackendError> {
        collect_pages(|next_token| {
            let execution_id = execution_id.to_string();
            let client = self.athena_client.clone();

            tokio::task::block_in_place(|| {
                tokio::runtime::Handle::current().block_on(async move {
                    let output = client
                        .get_query_results()
                        .query_execution_id(execution_id)
                        .set_next_token(next_token)
                        .send()
                        .await
                        .map_err(|error| {
                            BackendError::QueryService(format!(
                                "failed to fetch query results: {}",
                                DisplayErrorContext(&error)
                            ))
                        })?;

                    let rows: Vec<ResultRow> = output
                        .result_set()
                        .map(|result_set| result_set.rows().iter().map(result_row).collect())
                        .unwrap_or_default();
                    Ok((rows, output.next_token().map(str::to_string)))
                })
            })
        })
    }
}

fn result_row(row: &Row) -> ResultRow {
    ResultRow::new(
        row.data()
            .iter()
            .map(|datum| datum.var_char_value().map(str::to_string))
            .collect(),
    )
}

struct SnsNotifier {
    sns_client: aws_sdk_sns::Client,
}

impl Notifier for SnsNotifier {
    fn publish(&self, notification: &Notification) -> Result<Option<String>, BackendError> {
        let notification = notification.clone();
        let client = self.sns_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .publish()
                    .topic_arn(notification.topic_arn)
                    .subject(notification.subject)
                    .message(notification.message)
                    .send()
                    .await
                    .map(|output| output.message_id().map(str::to_string))
                    .map_err(|error| {
                        BackendError::Notification(format!(
                            "failed to publish report: {}",
                            aws_sdk_sns::error::DisplayErrorContext(&error)
                        ))
                    })
            })
        })
    }
}

struct RuntimeDependencies {
    config: ReportConfig,
    query_service: AthenaQueryService,
    notifier: SnsNotifier,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ReportAcknowledgement, Error> {
    info!(request_id = %event.context.request_id, "report invocation received");

    // The poll loop sleeps on this thread; move it off the async workers.
    let acknowledgement = tokio::task::block_in_place(|| {
        handle_report_event(
            &deps.config,
            Utc::now(),
            &deps.query_service,
            &deps.notifier,
        )
    })?;
    Ok(acknowledgement)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = ReportConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        query_service: AthenaQueryService {
            athena_client: aws_sdk_athena::Client::new(&aws_config),
        },
        notifier: SnsNotifier {
            sns_client: aws_sdk_sns::Client::new(&aws_config),
        },
    };

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        handle_request(event, &deps)
    }))
    .await
}

#[cfg(test)]
mod tests {
    use aws_sdk_athena::types::Datum;

    use super::*;

    #[test]
    fn converts_rows_preserving_missing_cells() {
        let row = Row::builder()
            .data(Datum::builder().var_char_value("/index.html").build())
            .data(Datum::builder().build())
            .build();

        assert_eq!(
            result_row(&row),
            ResultRow::new(vec![Some("/index.html".to_string()), None])
        );
    }

    #[test]
    fn converts_empty_row() {
        let row = Row::builder().build();
        assert!(result_row(&row).cells.is_empty());
    }
}
