use entity_derive::timestamped;
use sea_orm::entity::prelude::*;

#[timestamped]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub list_id: String,
    pub display_name: String,
    #[sea_orm(belongs_to, from = "list_id", to = "id", on_delete = "Cascade")]
    pub list: HasOne<super::list::Entity>,
    #[sea_orm(has_many)]
    pub statuses: HasMany<super::todo_user_status::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
