use async_trait::async_trait;
use sea_orm::{
    ActiveValue::{self, Set},
    entity::prelude::*,
};

use crate::slug;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "provider")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub poster_id: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_provider::Entity")]
    MovieProvider,
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_provider::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_provider::Relation::Provider.def().rev())
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
                let slug =
                    slug::unique_slug::<Entity, _>(db, Column::Slug, &name, "provider").await?;
                self.slug = Set(slug);
            }
        }

        self.updated_at = Set(now);

        Ok(self)
    }
}
