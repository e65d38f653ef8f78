pub mod m202510190001_create_users;
pub mod m202510190002_create_courses;
pub mod m202510190003_create_course_students;
pub mod m202510190004_create_attendance;
pub mod m202510190005_create_scheduled_close_tasks;
pub mod m202510190006_create_notification_jobs;
