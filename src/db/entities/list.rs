use entity_derive::timestamped;
use sea_orm::entity::prelude::*;

#[timestamped]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub memo: String,
    #[sea_orm(has_many)]
    pub users: HasMany<super::user::Entity>,
    #[sea_orm(has_many)]
    pub todos: HasMany<super::todo::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
