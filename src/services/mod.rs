pub mod assignments;
pub mod grading;
pub mod jobs;
pub mod notifications;

pub use assignments::AssignmentService;
pub use jobs::JobService;
pub use notifications::NotificationService;
