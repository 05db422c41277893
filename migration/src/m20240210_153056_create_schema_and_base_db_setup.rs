use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS postboard;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO postboard, public;")
            .await?;

        // The application role owns everything created in the schema
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    GRANT ALL ON SCHEMA postboard TO postboard;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA postboard GRANT ALL ON TABLES TO postboard;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA postboard GRANT ALL ON SEQUENCES TO postboard;
                END $$;
            "#)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA postboard REVOKE ALL ON SEQUENCES FROM postboard;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA postboard REVOKE ALL ON TABLES FROM postboard;
                    REVOKE ALL ON SCHEMA postboard FROM postboard;
                END $$;
            "#)
            .await?;

        // CASCADE removes every table in the schema
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS postboard CASCADE;")
            .await?;

        Ok(())
    }
}
