use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, entity::prelude::*};

/// Service name attached to ratings imported from TMDB.
pub const TMDB_SERVICE: &str = "Tmdb";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rating")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Double")]
    pub score: f64,
    pub service: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_rating::Entity")]
    MovieRating,
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_rating::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_rating::Relation::Rating.def().rev())
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = super::now_sec();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
