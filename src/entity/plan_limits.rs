use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "plan_limits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub plan_name: String,
    pub plan_type: String,
    pub database_size_mb: i64,
    pub max_users: i64,
    pub storage_mb: i64,
    pub api_requests: i64,
    pub realtime_connections: i64,
    pub realtime_messages: i64,
    pub edge_functions_invocations: i64,
    pub edge_functions_execution_time_hours: i64,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_plans::Entity")]
    UserPlans,
}

impl Related<super::user_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPlans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
