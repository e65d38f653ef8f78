use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Set};
use serde::Serialize;

/// A course taught by one teacher. `active_class` mirrors whether the course
/// currently has an active attendance session.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub code: String,
    pub teacher_id: i64,
    pub active_class: bool,
    /// Geofence radius used for the most recent session.
    pub radius_meters: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Teacher,
    #[sea_orm(has_many = "super::course_student::Entity")]
    Students,
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::course_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DbConn,
        name: &str,
        code: &str,
        teacher_id: i64,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        ActiveModel {
            name: Set(name.to_owned()),
            code: Set(code.to_owned()),
            teacher_id: Set(teacher_id),
            active_class: Set(false),
            radius_meters: Set(50.0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Loads a course together with its teacher.
    pub async fn find_with_teacher(
        db: &DbConn,
        id: i64,
    ) -> Result<Option<(Model, Option<super::user::Model>)>, DbErr> {
        Entity::find_by_id(id)
            .find_also_related(super::user::Entity)
            .one(db)
            .await
    }

    /// Whether `user_id` is the teacher of course `id`.
    pub async fn is_taught_by(db: &DbConn, id: i64, user_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id(id)
            .filter(Column::TeacherId.eq(user_id))
            .one(db)
            .await?
            .is_some())
    }
}
