//! 预导入模块，方便使用

pub use super::assignments::{
    ActiveModel as AssignmentActiveModel, Entity as Assignments, Model as AssignmentModel,
};
pub use super::auto_grade_history::{
    ActiveModel as AutoGradeHistoryActiveModel, Entity as AutoGradeHistory,
    Model as AutoGradeHistoryModel,
};
pub use super::class_users::{
    ActiveModel as ClassUserActiveModel, Entity as ClassUsers, Model as ClassUserModel,
};
pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::grading_history::{
    ActiveModel as GradingHistoryActiveModel, Entity as GradingHistory,
    Model as GradingHistoryModel,
};
pub use super::notifications::{
    ActiveModel as NotificationActiveModel, Entity as Notifications, Model as NotificationModel,
};
pub use super::reminder_logs::{
    ActiveModel as ReminderLogActiveModel, Entity as ReminderLogs, Model as ReminderLogModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
