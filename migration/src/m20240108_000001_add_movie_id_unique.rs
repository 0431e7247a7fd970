use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_movie_movie_id_unique")
                    .table(Movie::Table)
                    .col(Movie::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_provider_name")
                    .table(Provider::Table)
                    .col(Provider::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_provider_name").table(Provider::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop().name("idx_movie_movie_id_unique").table(Movie::Table).to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    MovieId,
}

#[derive(DeriveIden)]
enum Provider {
    Table,
    Name,
}
