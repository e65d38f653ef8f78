pub use db::models::user::Role;

/// The caller, as resolved by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn teacher(id: i64) -> Self {
        Self::new(id, Role::Teacher)
    }

    pub fn student(id: i64) -> Self {
        Self::new(id, Role::Student)
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}
