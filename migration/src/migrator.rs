use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510190001_create_users::Migration),
            Box::new(migrations::m202510190002_create_courses::Migration),
            Box::new(migrations::m202510190003_create_course_students::Migration),
            Box::new(migrations::m202510190004_create_attendance::Migration),
            Box::new(migrations::m202510190005_create_scheduled_close_tasks::Migration),
            Box::new(migrations::m202510190006_create_notification_jobs::Migration),
        ]
    }
}
