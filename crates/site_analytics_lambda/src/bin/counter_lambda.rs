use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use site_analytics_lambda::adapters::counter_store::CounterStore;
use site_analytics_lambda::config::CounterConfig;
use site_analytics_lambda::error::BackendError;
use site_analytics_lambda::handlers::counter::{handle_counter_event, ApiGatewayResponse};
use site_analytics_lambda::runtime::contract::IncrementRequest;
use site_analytics_lambda::telemetry::init_tracing;

const PARTITION_KEY: &str = "id";
const COUNTER_PLACEHOLDER: &str = "#counter";
// Initialise-if-absent and add, applied by the store as one write.
const INCREMENT_EXPRESSION: &str = "SET #counter = if_not_exists(#counter, :start) + :inc";

struct DynamoCounterStore {
    table: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl CounterStore for DynamoCounterStore {
    fn atomic_increment(&self, request: &IncrementRequest) -> Result<i64, BackendError> {
        let request = request.clone();
        let table = self.table.clone();
        let client = self.dynamodb_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .update_item()
                    .table_name(table)
                    .key(PARTITION_KEY, AttributeValue::S(request.key))
                    .update_expression(INCREMENT_EXPRESSION)
                    .expression_attribute_names(COUNTER_PLACEHOLDER, request.attribute.clone())
                    .expression_attribute_values(
                        ":start",
                        AttributeValue::N(request.start.to_string()),
                    )
                    .expression_attribute_values(
                        ":inc",
                        AttributeValue::N(request.delta.to_string()),
                    )
                    .return_values(ReturnValue::UpdatedNew)
                    .send()
                    .await
                    .map_err(|error| {
                        BackendError::CounterStore(format!(
                            "failed to increment counter: {}",
                            DisplayErrorContext(&error)
                        ))
                    })?;

                let updated = output
                    .attributes()
                    .and_then(|attributes| attributes.get(&request.attribute));
                parse_counter_value(updated)
            })
        })
    }
}

fn parse_counter_value(value: Option<&AttributeValue>) -> Result<i64, BackendError> {
    let Some(value) = value else {
        return Err(counter_error("update returned no counter attribute"));
    };
    let Ok(number) = value.as_n() else {
        return Err(counter_error("counter attribute is not a number"));
    };
    number.parse().map_err(|error| {
        let message = format!("counter value '{number}' is not an integer: {error}");
        counter_error(message)
    })
}

fn counter_error(message: impl Into<String>) -> BackendError {
    BackendError::CounterStore(message.into())
}

async fn handle_request(
    event: LambdaEvent<Value>,
    store: &DynamoCounterStore,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_counter_event(&event.payload, store)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = CounterConfig::from_env();
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoCounterStore {
        table: config.table,
        dynamodb_client: aws_sdk_dynamodb::Client::new(&aws_config),
    };

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        handle_request(event, &store)
    }))
    .await
}
