/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// `source` tag for notifications submitted through the signed HTTP API.
pub const SOURCE_NATIVE: &str = "native";
