use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use securityhub_aws::client::SecurityHubClient;
use securityhub_aws::config::AdapterConfig;
use securityhub_aws::logging::{init_logging, LogFormat};
use securityhub_core::query::QueryContext;
use securityhub_core::table::{CollectingSink, FindingsTable};

#[derive(Debug, Serialize)]
struct QueryResponse {
    row_count: usize,
    rows: Vec<Value>,
}

fn decode_query(payload: Value) -> Result<QueryContext, Error> {
    serde_json::from_value(payload).map_err(|error| Error::from(format!("invalid query: {error}")))
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<QueryResponse, Error> {
    let ctx = decode_query(event.payload)?;

    let config = AdapterConfig::from_env();
    let client = SecurityHubClient::load(&config).await?;

    let mut sink = CollectingSink::for_limit(ctx.limit);
    FindingsTable::execute(&client, &ctx, &mut sink)?;
    let rows: Vec<Value> = sink.rows().iter().map(|row| row.to_json()).collect();

    tracing::info!(rows = rows.len(), region = client.region(), "query completed");
    Ok(QueryResponse {
        row_count: rows.len(),
        rows,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging(LogFormat::Json);
    lambda_runtime::run(service_fn(handle_request)).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use securityhub_core::query::{Operator, Qual};

    #[test]
    fn decodes_query_event() {
        let ctx = decode_query(json!({
            "columns": ["id", "title"],
            "quals": {"record_state": [{"operator": "<>", "value": "ARCHIVED"}]},
            "limit": 10
        }))
        .expect("query should decode");

        assert_eq!(ctx.columns, vec!["id", "title"]);
        assert_eq!(ctx.limit, Some(10));
        assert_eq!(
            ctx.quals["record_state"],
            vec![Qual::new(Operator::Ne, "ARCHIVED")]
        );
    }

    #[test]
    fn empty_event_is_unfiltered_query() {
        let ctx = decode_query(json!({})).expect("query should decode");
        assert_eq!(ctx, QueryContext::default());
    }

    #[test]
    fn rejects_malformed_query() {
        let error = decode_query(json!({"limit": "ten"})).expect_err("should fail");
        assert!(error.to_string().contains("invalid query"));
    }
}
