pub mod admin;

pub mod assignments;

pub mod notifications;

pub use admin::configure_admin_routes;
pub use assignments::configure_assignment_routes;
pub use notifications::configure_notification_routes;
