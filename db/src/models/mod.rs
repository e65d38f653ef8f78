pub mod attendance_mark;
pub mod attendance_session;
pub mod course;
pub mod course_student;
pub mod notification_job;
pub mod scheduled_close_task;
pub mod user;

pub use attendance_mark::Entity as AttendanceMark;
pub use attendance_session::Entity as AttendanceSession;
pub use course::Entity as Course;
pub use course_student::Entity as CourseStudent;
pub use notification_job::Entity as NotificationJob;
pub use scheduled_close_task::Entity as ScheduledCloseTask;
pub use user::Entity as User;
