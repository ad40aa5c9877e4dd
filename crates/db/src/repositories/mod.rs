//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or any Postgres executor, for use inside a
//! transaction) as the first argument.

pub mod authorization_repo;
pub mod method_repo;
pub mod notification_repo;
pub mod rule_repo;
pub mod site_info_repo;
pub mod user_info_repo;

pub use authorization_repo::AuthorizationRepo;
pub use method_repo::MethodRepo;
pub use notification_repo::NotificationRepo;
pub use rule_repo::RuleRepo;
pub use site_info_repo::SiteInfoRepo;
pub use user_info_repo::UserInfoRepo;
