use deadpool_postgres::Pool;

/// SQL-based migration system using .sql files
/// This is a simple, reliable migration system that uses plain SQL files
pub struct SqlMigrator {
    pool: Pool,
}

impl SqlMigrator {
    pub fn new(pool: Pool) -> Self { Self { pool } }

    /// Run all migrations in order from domain-specific SQL files
    pub async fn run_all_migrations(&self) -> anyhow::Result<()> {
        self.create_migration_table().await?;

        let migrations = vec![
            (
                "001_create_tags",
                include_str!(
                    "../../../domains/tags/migrations/sql/001_create_tags.sql"
                ),
            ),
            (
                "002_create_taggings",
                include_str!(
                    "../../../domains/tags/migrations/sql/002_create_taggings.sql"
                ),
            ),
            (
                "003_create_tag_subscriptions",
                include_str!(
                    "../../../domains/tags/migrations/sql/003_create_tag_subscriptions.sql"
                ),
            ),
            (
                "004_create_engagement_and_sessions",
                include_str!(
                    "../../../domains/tags/migrations/sql/004_create_engagement_and_sessions.sql"
                ),
            ),
            (
                "005_create_tag_usage_summary",
                include_str!(
                    "../../../domains/tags/migrations/sql/005_create_tag_usage_summary.sql"
                ),
            ),
        ];

        for (migration_name, migration_sql) in migrations {
            if !self.is_migration_applied(migration_name).await? {
                println!("Running migration: {}", migration_name);

                let client = self.pool.get().await?;
                client.batch_execute(migration_sql).await.map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to run migration {}: {}",
                        migration_name,
                        e
                    )
                })?;

                client
                    .execute(
                        "INSERT INTO _migrations (name, applied_at) VALUES \
                         ($1, NOW())",
                        &[&migration_name],
                    )
                    .await?;

                println!(
                    "Migration {} completed successfully",
                    migration_name
                );
            }
            else {
                println!(
                    "Migration {} already applied, skipping",
                    migration_name
                );
            }
        }

        Ok(())
    }

    /// Create the migration tracking table
    async fn create_migration_table(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    id SERIAL PRIMARY KEY,
                    name VARCHAR(255) NOT NULL UNIQUE,
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )",
            )
            .await?;
        Ok(())
    }

    /// Check if a migration has already been applied
    async fn is_migration_applied(
        &self, migration_name: &str,
    ) -> anyhow::Result<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT COUNT(*)::bigint FROM _migrations WHERE name = $1",
                &[&migration_name],
            )
            .await?;
        let count: i64 = row.get(0);

        Ok(count > 0)
    }

    /// List applied migrations
    pub async fn list_applied_migrations(
        &self,
    ) -> anyhow::Result<Vec<String>> {
        self.create_migration_table().await?;

        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT name FROM _migrations ORDER BY applied_at", &[])
            .await?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}
