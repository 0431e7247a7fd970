use async_trait::async_trait;
use sea_orm::{
    ActiveValue::{self, Set},
    entity::prelude::*,
};

use crate::slug;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,
    pub language: String,
    /// ISO `YYYY-MM-DD`.
    pub release_date: Option<String>,
    pub adult: bool,
    /// TMDB id, the natural key used when synchronizing.
    #[sea_orm(unique)]
    pub movie_id: i32,
    #[sea_orm(column_type = "Double")]
    pub popularity: f64,
    pub poster_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_rating::Entity")]
    MovieRating,
    #[sea_orm(has_many = "super::movie_provider::Entity")]
    MovieProvider,
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_rating::Relation::Rating.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_rating::Relation::Movie.def().rev())
    }
}

impl Related<super::provider::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_provider::Relation::Provider.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_provider::Relation::Movie.def().rev())
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = super::now_sec();

        if insert {
            self.created_at = Set(now);
            let needs_slug = match &self.slug {
                ActiveValue::Set(s) | ActiveValue::Unchanged(s) => s.is_empty(),
                ActiveValue::NotSet => true,
            };
            if needs_slug {
                let name = match &self.name {
                    ActiveValue::Set(n) | ActiveValue::Unchanged(n) => n.clone(),
                    ActiveValue::NotSet => String::new(),
                };
                let slug = slug::unique_slug::<Entity, _>(db, Column::Slug, &name, "movie").await?;
                self.slug = Set(slug);
            }
        }

        self.updated_at = Set(now);

        Ok(self)
    }
}
