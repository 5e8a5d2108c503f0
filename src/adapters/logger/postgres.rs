//! Relational analytics sink - appends turn records to a Postgres table.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::PostgresLoggerConfig;
use crate::ports::{ConversationLogger, LogResult, LoggerError, TurnRecord};

const DEPLOYMENT: &str = "default";

pub struct PostgresLogger {
    pool: PgPool,
    schema: String,
    table: String,
    tenant_id: String,
}

impl PostgresLogger {
    pub async fn connect(config: &PostgresLoggerConfig) -> Result<Self, LoggerError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| LoggerError::Backend("postgres url not configured".to_string()))?;
        let tenant_id = config
            .tenant_id
            .clone()
            .ok_or_else(|| LoggerError::Backend("tenant id not configured".to_string()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .map_err(|e| LoggerError::Backend(e.to_string()))?;
        Ok(Self {
            pool,
            schema: config.schema.clone(),
            table: config.table.clone(),
            tenant_id,
        })
    }

}

// Schema and table come from configuration, not request data; values
// themselves are bound.
fn insert_sql(schema: &str, table: &str) -> String {
    format!(
        "INSERT INTO {schema}.{table} \
         (id, event_json, epoch, log_date, tenant_id, skill, conversation_id, deployment) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
    )
}

#[async_trait]
impl ConversationLogger for PostgresLogger {
    async fn init(&self) -> Result<(), LoggerError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| LoggerError::Backend(e.to_string()))?;
        info!(schema = %self.schema, table = %self.table, "using Postgres analytics sink");
        Ok(())
    }

    async fn push(&self, record: TurnRecord) -> Result<LogResult, LoggerError> {
        let event_json =
            serde_json::to_value(&record).map_err(|e| LoggerError::Push(e.to_string()))?;
        let result = sqlx::query(&insert_sql(&self.schema, &self.table))
            .bind(&record.log_id)
            .bind(&event_json)
            .bind(record.timestamp.timestamp_millis())
            .bind(record.timestamp.date_naive().to_string())
            .bind(&self.tenant_id)
            .bind(&record.data.context.skill_name)
            .bind(&record.data.context.conversation_id)
            .bind(DEPLOYMENT)
            .execute(&self.pool)
            .await
            .map_err(|e| LoggerError::Push(e.to_string()))?;
        Ok(LogResult {
            operation: "insert".to_string(),
            row_count: result.rows_affected(),
            ok: true,
        })
    }
}

impl std::fmt::Debug for PostgresLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresLogger")
            .field("schema", &self.schema)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

// Insert behavior is covered by integration tests against a live database;
// only the statement shape is checked here.
#[cfg(test)]
mod tests {
    use super::insert_sql;

    #[test]
    fn test_insert_sql_targets_configured_relation() {
        let sql = insert_sql("analytics", "turns");
        assert!(sql.starts_with("INSERT INTO analytics.turns "));
        assert_eq!(sql.matches('$').count(), 8);
    }
}
