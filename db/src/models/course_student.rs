use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::Serialize;

/// Enrollment of a student in a course (the course roster).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "course_students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub course_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn enroll(db: &DbConn, course_id: i64, student_id: i64) -> Result<Model, DbErr> {
        ActiveModel {
            course_id: Set(course_id),
            student_id: Set(student_id),
        }
        .insert(db)
        .await
    }

    pub async fn is_enrolled(db: &DbConn, course_id: i64, student_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((course_id, student_id))
            .one(db)
            .await?
            .is_some())
    }
}
