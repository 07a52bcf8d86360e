use sea_orm::entity::prelude::*;

/// One member's acknowledgement of one todo. `checked_at` is set exactly
/// while `is_checked` is true.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "todo_user_status")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub todo_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[sea_orm(default_value = false)]
    pub is_checked: bool,
    pub checked_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(belongs_to, from = "todo_id", to = "id", on_delete = "Cascade")]
    pub todo: HasOne<super::todo::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
