//! User activity log kept in the `users_logs` table.

use clearmarkup_utils::time::{parse_duration, unix_now};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{DbError, Result},
    query::{builder::Db, conditions::Conditions},
    traits::Primitive,
    value::Row,
};

pub const USERS_LOGS_TABLE: &str = "users_logs";

/// Records user actions and checks how often they happened recently.
pub struct ActivityLog;

impl ActivityLog {
    /// Stores `action` for `user_id` with `data` as JSON, stamped with the
    /// current unix time. Returns the id of the log entry.
    pub fn record<P: Primitive, T: Serialize + ?Sized>(
        db: &P,
        user_id: Option<i64>,
        action: &str,
        data: &T,
    ) -> Result<i64> {
        let row = Row::new()
            .with("user_id", user_id)
            .with("action", action)
            .with("data", serde_json::to_string(data)?)
            .with("created_at", unix_now());

        Db::new(db).table(USERS_LOGS_TABLE).insert(&row)
    }

    /// Whether `user_id` performed `action` at least `times` times within
    /// `window` (e.g. `"15m"`, `"1h"`).
    pub fn exceeded<P: Primitive>(
        db: &P,
        user_id: Option<i64>,
        action: &str,
        times: u64,
        window: &str,
    ) -> Result<bool> {
        let window = parse_duration(window)
            .ok_or_else(|| DbError::InvalidDuration(window.to_string()))?;
        let since = unix_now().saturating_sub(window.as_secs() as i64);

        let count = db.count(
            USERS_LOGS_TABLE,
            &Conditions::new()
                .with("user_id", user_id)
                .with("action", action)
                .with("created_at[>]", since),
        )?;
        debug!(action, count, times, since, "checked activity log");
        Ok(count >= times)
    }
}
