use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_sesv2::primitives::Blob;
use aws_sdk_sesv2::types::{Destination, EmailContent, RawMessage};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tclass_core::results::ResultPage;
use tclass_lambda::adapters::credentials::{TableApiBroker, TableClassApi};
use tclass_lambda::adapters::mailer::ReportSender;
use tclass_lambda::adapters::results::QueryResultSource;
use tclass_lambda::handlers::optimize::{handle_optimizer_event, OptimizerResponse};
use tclass_lambda::handlers::report::ReportConfig;

/// Role created in every target account by the deployment stack. Doubles as
/// the assume-role session name.
const OPTIMIZER_ROLE_NAME: &str = "DynamoDBStorageClassOptimizer";

struct AthenaResultSource {
    athena_client: aws_sdk_athena::Client,
}

impl QueryResultSource for AthenaResultSource {
    fn for_each_page(
        &self,
        query_execution_id: &str,
        on_page: &mut dyn FnMut(ResultPage) -> Result<(), String>,
    ) -> Result<(), String> {
        let client = self.athena_client.clone();
        let query_execution_id = query_execution_id.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut pages = client
                    .get_query_results()
                    .query_execution_id(query_execution_id)
                    .into_paginator()
                    .send();

                while let Some(page) = pages.next().await {
                    let page = page
                        .map_err(|error| format!("failed to read query results page: {error}"))?;
                    let result_set = page
                        .result_set()
                        .ok_or_else(|| "query results page has no result set".to_string())?;
                    let rows = result_set
                        .rows()
                        .iter()
                        .map(|row| {
                            row.data()
                                .iter()
                                .map(|datum| datum.var_char_value().map(str::to_string))
                                .collect()
                        })
                        .collect();
                    on_page(ResultPage { rows })?;
                }
                Ok(())
            })
        })
    }
}

struct StsTableApiBroker {
    sts_client: aws_sdk_sts::Client,
}

impl TableApiBroker for StsTableApiBroker {
    fn client_for(&self, account_id: &str, region: &str) -> Result<Box<dyn TableClassApi>, String> {
        let client = self.sts_client.clone();
        let role_arn = format!("arn:aws:iam::{account_id}:role/{OPTIMIZER_ROLE_NAME}");
        let region_name = region.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let assumed = client
                    .assume_role()
                    .role_arn(&role_arn)
                    .role_session_name(OPTIMIZER_ROLE_NAME)
                    .send()
                    .await
                    .map_err(|error| {
                        format!("failed to assume '{role_arn}': {error}")
                    })?;
                let credentials = assumed
                    .credentials()
                    .ok_or_else(|| "assume-role response carried no credentials".to_string())?;

                let provider = aws_sdk_dynamodb::config::Credentials::new(
                    credentials.access_key_id(),
                    credentials.secret_access_key(),
                    Some(credentials.session_token().to_string()),
                    None,
                    OPTIMIZER_ROLE_NAME,
                );
                let config = aws_sdk_dynamodb::Config::builder()
                    .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
                    .region(aws_sdk_dynamodb::config::Region::new(region_name))
                    .credentials_provider(provider)
                    .build();

                Ok(Box::new(DynamoDbTableClassApi {
                    dynamodb_client: aws_sdk_dynamodb::Client::from_conf(config),
                }) as Box<dyn TableClassApi>)
            })
        })
    }
}

struct DynamoDbTableClassApi {
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl TableClassApi for DynamoDbTableClassApi {
    fn describe_table_class(&self, table_name: &str) -> Result<String, String> {
        let client = self.dynamodb_client.clone();
        let table_name = table_name.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .describe_table()
                    .table_name(table_name)
                    .send()
                    .await
                    .map_err(|error| service_error_message(error.into_service_error()))?;
                // Tables created before table classes existed have no
                // summary; they are STANDARD.
                Ok(output
                    .table()
                    .and_then(|table| table.table_class_summary())
                    .and_then(|summary| summary.table_class())
                    .map(|class| class.as_str().to_string())
                    .unwrap_or_else(|| "STANDARD".to_string()))
            })
        })
    }

    fn update_table_class(&self, table_name: &str, table_class: &str) -> Result<String, String> {
        let client = self.dynamodb_client.clone();
        let table_name = table_name.to_string();
        let table_class = aws_sdk_dynamodb::types::TableClass::from(table_class);

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .update_table()
                    .table_name(table_name)
                    .table_class(table_class)
                    .send()
                    .await
                    .map_err(|error| service_error_message(error.into_service_error()))?;
                output
                    .table_description()
                    .and_then(|description| description.table_status())
                    .map(|status| status.as_str().to_string())
                    .ok_or_else(|| "update response carried no table status".to_string())
            })
        })
    }
}

/// Pulls the structured message out of a service error so it can be
/// captured into the row's update result.
fn service_error_message<E>(error: E) -> String
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    error
        .meta()
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

struct SesReportSender {
    ses_client: aws_sdk_sesv2::Client,
}

impl ReportSender for SesReportSender {
    fn send_raw(
        &self,
        sender: &str,
        recipients: &[String],
        raw_message: &[u8],
    ) -> Result<(), String> {
        let client = self.ses_client.clone();
        let sender = sender.to_string();
        let recipients = recipients.to_vec();
        let raw_message = raw_message.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let raw = RawMessage::builder()
                    .data(Blob::new(raw_message))
                    .build()
                    .map_err(|error| format!("failed to build raw report message: {error}"))?;
                let destination = Destination::builder()
                    .set_to_addresses(Some(recipients))
                    .build();

                client
                    .send_email()
                    .from_email_address(sender)
                    .destination(destination)
                    .content(EmailContent::builder().raw(raw).build())
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to send report email: {error}"))
            })
        })
    }
}

async fn handle_request(event: LambdaEvent<serde_json::Value>) -> Result<OptimizerResponse, Error> {
    let sender = std::env::var("SENDER_EMAIL")
        .map_err(|_| Error::from("SENDER_EMAIL must be configured"))?;
    let recipients = std::env::var("RECIPIENT_EMAILS")
        .map_err(|_| Error::from("RECIPIENT_EMAILS must be configured"))?;
    let report_config = ReportConfig::new(sender, &recipients).map_err(Error::from)?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let result_source = AthenaResultSource {
        athena_client: aws_sdk_athena::Client::new(&aws_config),
    };
    let broker = StsTableApiBroker {
        sts_client: aws_sdk_sts::Client::new(&aws_config),
    };
    let report_sender = SesReportSender {
        ses_client: aws_sdk_sesv2::Client::new(&aws_config),
    };

    handle_optimizer_event(
        &event.payload,
        &result_source,
        &broker,
        &report_sender,
        &report_config,
    )
    .map_err(|error| Error::from(error.message))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}
