use serde::{Deserialize, Serialize};
use services::attendance_ledger::MarkUpdate;
use services::attendance_session::{AttendanceSession, SESSION_NOT_FOUND, SessionStore};
use services::geofence::Coordinates;
use services::AppError;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub course_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub active: bool,
    pub created_at: String,
    pub closed_at: Option<String>,
}

impl From<AttendanceSession> for SessionResponse {
    fn from(m: AttendanceSession) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            latitude: m.latitude,
            longitude: m.longitude,
            radius_meters: m.radius_meters,
            active: m.active,
            created_at: m.created_at.to_rfc3339(),
            closed_at: m.closed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct LocationReq {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
}

impl From<LocationReq> for Coordinates {
    fn from(l: LocationReq) -> Self {
        Coordinates::new(l.latitude, l.longitude)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionReq {
    #[validate(nested)]
    pub center: LocationReq,
    #[validate(range(exclusive_min = 0.0, max = 10000.0, message = "Radius must be greater than 0 and at most 10000 meters"))]
    pub radius_meters: Option<f64>,
}

/// Body of `PUT /sessions/active`. Teachers send nothing; students must send
/// their current location.
#[derive(Debug, Default, Deserialize)]
pub struct ActiveSessionReq {
    pub center: Option<LocationReq>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkMarkReq {
    #[validate(length(max = 1000, message = "At most 1000 marks per request"))]
    pub marks: Vec<MarkUpdate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only sessions this student attended. Ignored for student callers, who
    /// always see their own.
    pub student_id: Option<i64>,
    pub active: Option<bool>,
}

/// Loads `session_id` and checks that it belongs to `course_id`.
pub async fn session_in_course(
    store: &SessionStore,
    course_id: i64,
    session_id: i64,
) -> Result<AttendanceSession, AppError> {
    store
        .find_by_id(session_id)
        .await?
        .filter(|s| s.course_id == course_id)
        .ok_or_else(|| AppError::not_found(SESSION_NOT_FOUND))
}
