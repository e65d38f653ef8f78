use serde::{Deserialize, Serialize};
use services::principal::{Principal, Role};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The caller as seen by the attendance services.
    pub fn principal(&self) -> Principal {
        Principal::new(self.0.sub, self.0.role)
    }
}
