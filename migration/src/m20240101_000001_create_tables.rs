use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string(Movie::Name))
                    .col(string_uniq(Movie::Slug))
                    .col(text(Movie::Description))
                    .col(string(Movie::Language))
                    .col(string_null(Movie::ReleaseDate))
                    .col(boolean(Movie::Adult))
                    .col(integer(Movie::MovieId))
                    .col(double(Movie::Popularity))
                    .col(string_null(Movie::PosterId))
                    .col(big_integer(Movie::CreatedAt))
                    .col(big_integer(Movie::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_popularity")
                    .table(Movie::Table)
                    .col(Movie::Popularity)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_auto(Person::Id))
                    .col(string(Person::Name))
                    .col(string(Person::Role))
                    .col(big_integer(Person::CreatedAt))
                    .col(big_integer(Person::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(pk_auto(Rating::Id))
                    .col(double(Rating::Score))
                    .col(string(Rating::Service))
                    .col(big_integer(Rating::CreatedAt))
                    .col(big_integer(Rating::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Provider::Table)
                    .if_not_exists()
                    .col(pk_auto(Provider::Id))
                    .col(string(Provider::Name))
                    .col(string_null(Provider::PosterId))
                    .col(string_uniq(Provider::Slug))
                    .col(big_integer(Provider::CreatedAt))
                    .col(big_integer(Provider::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Every junction hangs off movie.id on its left side.
        let movie = Movie::Table.into_iden();
        let links = [
            ("movie_director", "person_id", Person::Table.into_iden()),
            ("movie_actor", "person_id", Person::Table.into_iden()),
            ("movie_rating", "rating_id", Rating::Table.into_iden()),
            ("movie_similar", "similar_id", movie.clone()),
            ("movie_provider", "provider_id", Provider::Table.into_iden()),
        ];
        for (name, column, target) in links {
            manager
                .create_table(link_table(name, ("movie_id", movie.clone()), (column, target)))
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let links =
            ["movie_provider", "movie_similar", "movie_rating", "movie_actor", "movie_director"];
        for table in links {
            manager.drop_table(Table::drop().table(Alias::new(table)).to_owned()).await?;
        }
        manager.drop_table(Table::drop().table(Provider::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Rating::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

/// Junction table with a composite primary key and cascading foreign keys
/// to both sides.
fn link_table(
    name: &str,
    (left, left_table): (&str, DynIden),
    (right, right_table): (&str, DynIden),
) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(name))
        .if_not_exists()
        .col(integer(Alias::new(left)))
        .col(integer(Alias::new(right)))
        .primary_key(Index::create().col(Alias::new(left)).col(Alias::new(right)))
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{name}_{left}"))
                .from(Alias::new(name), Alias::new(left))
                .to(left_table, Alias::new("id"))
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{name}_{right}"))
                .from(Alias::new(name), Alias::new(right))
                .to(right_table, Alias::new("id"))
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Language,
    ReleaseDate,
    Adult,
    MovieId,
    Popularity,
    PosterId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    Name,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Rating {
    Table,
    Id,
    Score,
    Service,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Provider {
    Table,
    Id,
    Name,
    PosterId,
    Slug,
    CreatedAt,
    UpdatedAt,
}
