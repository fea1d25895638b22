pub mod hierarchy_service;
pub mod user_service;

pub use hierarchy_service::HierarchyService;
pub use user_service::UserService;
