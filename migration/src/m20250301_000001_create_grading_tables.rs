use sea_orm_migration::prelude::*;

use crate::m20250123_000001_create_tables::{Classes, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建作业表
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assignments::ClassId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Assignments::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assignments::Title).string().not_null())
                    .col(ColumnDef::new(Assignments::Description).text().null())
                    .col(ColumnDef::new(Assignments::DueDate).big_integer().not_null())
                    .col(ColumnDef::new(Assignments::TotalPoints).double().not_null())
                    .col(
                        ColumnDef::new(Assignments::AllowLateSubmission)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Assignments::LatePenalty)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Assignments::MaxLateDays)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Assignments::SubmissionType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::TextSubmissionRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Assignments::FileSubmissionRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Assignments::AutoGradeWhenOverdue)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Assignments::AutoGradeValue)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Assignments::DaysAfterDueForAutoGrade)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Assignments::ReminderDaysBeforeDue)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::NotifyStudentsOfMissingSubmission)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Assignments::Rubric).text().null())
                    .col(ColumnDef::new(Assignments::Visibility).string().not_null())
                    .col(ColumnDef::new(Assignments::PublishAt).big_integer().null())
                    .col(
                        ColumnDef::new(Assignments::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Assignments::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Assignments::DeletedAt).big_integer().null())
                    .col(ColumnDef::new(Assignments::DeletedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Assignments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Assignments::Table, Assignments::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Assignments::Table, Assignments::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建提交表（每个学生每个作业一条记录）
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::SubmittedAt).big_integer().null())
                    .col(ColumnDef::new(Submissions::Content).text().null())
                    .col(ColumnDef::new(Submissions::Attachments).text().not_null())
                    .col(ColumnDef::new(Submissions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::IsLate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Submissions::Grade).double().null())
                    .col(ColumnDef::new(Submissions::OriginalGrade).double().null())
                    .col(ColumnDef::new(Submissions::Feedback).text().null())
                    .col(ColumnDef::new(Submissions::GradedAt).big_integer().null())
                    .col(ColumnDef::new(Submissions::GraderKind).string().null())
                    .col(ColumnDef::new(Submissions::GraderId).big_integer().null())
                    .col(
                        ColumnDef::new(Submissions::PenaltyApplied)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Submissions::PenaltyPercent)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Submissions::PenaltyDaysLate)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Submissions::PenaltyAmount)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Submissions::AllowResubmit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Submissions::ResubmissionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Submissions::HideGradeFromStudent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Submissions::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Submissions::Table, Submissions::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Submissions::Table, Submissions::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分历史表（只追加）
        manager
            .create_table(
                Table::create()
                    .table(GradingHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GradingHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::SubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GradingHistory::Seq).integer().not_null())
                    .col(ColumnDef::new(GradingHistory::Grade).double().not_null())
                    .col(
                        ColumnDef::new(GradingHistory::OriginalGrade)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GradingHistory::Feedback).text().not_null())
                    .col(
                        ColumnDef::new(GradingHistory::RubricGrades)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::Annotations)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::GradedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::GraderKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GradingHistory::GraderId).big_integer().null())
                    .col(
                        ColumnDef::new(GradingHistory::IsLatest)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(GradingHistory::GradeReason).text().null())
                    .col(ColumnDef::new(GradingHistory::PreviousGrade).double().null())
                    .col(
                        ColumnDef::new(GradingHistory::ChangeType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::PenaltyApplied)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::PenaltyPercent)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::PenaltyDaysLate)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GradingHistory::PenaltyAmount)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GradingHistory::Table, GradingHistory::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建自动评分记录表
        manager
            .create_table(
                Table::create()
                    .table(AutoGradeHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutoGradeHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AutoGradeHistory::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AutoGradeHistory::RunDate).string().not_null())
                    .col(
                        ColumnDef::new(AutoGradeHistory::AutoGradedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutoGradeHistory::StudentIds)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutoGradeHistory::GradeValue)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AutoGradeHistory::Reason).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AutoGradeHistory::Table, AutoGradeHistory::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建提醒发送记录表
        manager
            .create_table(
                Table::create()
                    .table(ReminderLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReminderLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::DaysBeforeDue)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReminderLogs::SentAt).big_integer().not_null())
                    .col(
                        ColumnDef::new(ReminderLogs::SentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::FailedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReminderLogs::Table, ReminderLogs::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 作业表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_class_id")
                    .table(Assignments::Table)
                    .col(Assignments::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_due_date")
                    .table(Assignments::Table)
                    .col(Assignments::DueDate)
                    .to_owned(),
            )
            .await?;

        // 同一学生在同一作业下只能有一条提交
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_submissions_assignment_student")
                    .table(Submissions::Table)
                    .col(Submissions::AssignmentId)
                    .col(Submissions::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_grading_history_submission_seq")
                    .table(GradingHistory::Table)
                    .col(GradingHistory::SubmissionId)
                    .col(GradingHistory::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 每个作业每个自然日最多一次自动评分
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_auto_grade_history_assignment_date")
                    .table(AutoGradeHistory::Table)
                    .col(AutoGradeHistory::AssignmentId)
                    .col(AutoGradeHistory::RunDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 每个作业每个提醒档位最多发送一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_reminder_logs_assignment_offset")
                    .table(ReminderLogs::Table)
                    .col(ReminderLogs::AssignmentId)
                    .col(ReminderLogs::DaysBeforeDue)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReminderLogs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AutoGradeHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(GradingHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Assignments {
    #[sea_orm(iden = "assignments")]
    Table,
    Id,
    ClassId,
    CreatedBy,
    Title,
    Description,
    DueDate,
    TotalPoints,
    AllowLateSubmission,
    LatePenalty,
    MaxLateDays,
    SubmissionType,
    TextSubmissionRequired,
    FileSubmissionRequired,
    AutoGradeWhenOverdue,
    AutoGradeValue,
    DaysAfterDueForAutoGrade,
    ReminderDaysBeforeDue,
    NotifyStudentsOfMissingSubmission,
    Rubric,
    Visibility,
    PublishAt,
    IsActive,
    IsDeleted,
    DeletedAt,
    DeletedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    #[sea_orm(iden = "submissions")]
    Table,
    Id,
    AssignmentId,
    StudentId,
    SubmittedAt,
    Content,
    Attachments,
    Status,
    IsLate,
    Grade,
    OriginalGrade,
    Feedback,
    GradedAt,
    GraderKind,
    GraderId,
    PenaltyApplied,
    PenaltyPercent,
    PenaltyDaysLate,
    PenaltyAmount,
    AllowResubmit,
    ResubmissionCount,
    HideGradeFromStudent,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GradingHistory {
    #[sea_orm(iden = "grading_history")]
    Table,
    Id,
    SubmissionId,
    Seq,
    Grade,
    OriginalGrade,
    Feedback,
    RubricGrades,
    Annotations,
    GradedAt,
    GraderKind,
    GraderId,
    IsLatest,
    GradeReason,
    PreviousGrade,
    ChangeType,
    PenaltyApplied,
    PenaltyPercent,
    PenaltyDaysLate,
    PenaltyAmount,
}

#[derive(DeriveIden)]
enum AutoGradeHistory {
    #[sea_orm(iden = "auto_grade_history")]
    Table,
    Id,
    AssignmentId,
    RunDate,
    AutoGradedAt,
    StudentIds,
    GradeValue,
    Reason,
}

#[derive(DeriveIden)]
enum ReminderLogs {
    #[sea_orm(iden = "reminder_logs")]
    Table,
    Id,
    AssignmentId,
    DaysBeforeDue,
    SentAt,
    SentCount,
    FailedCount,
}
