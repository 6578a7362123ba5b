pub mod app_settings;
pub mod audit_logs;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod plan_limits;
pub mod products;
pub mod user_plans;
pub mod users;

pub use app_settings::Entity as AppSettings;
pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use plan_limits::Entity as PlanLimits;
pub use products::Entity as Products;
pub use user_plans::Entity as UserPlans;
pub use users::Entity as Users;
