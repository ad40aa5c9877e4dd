pub mod authorization;
pub mod method;
pub mod notification;
pub mod rule;
pub mod site_info;
pub mod user_info;
