//! # Audit Log Commands

use super::list_limit;
use crate::error::ApiError;
use crate::state::AppState;
use tienda_core::AuditEntry;

/// Newest entries first, optionally only those of one username.
pub async fn list_audit_log(
    state: &AppState,
    username: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<AuditEntry>, ApiError> {
    let audit = state.db.audit();
    let limit = list_limit(limit);

    let entries = match username.map(str::trim).filter(|u| !u.is_empty()) {
        Some(username) => audit.list_for_username(username, limit).await?,
        None => audit.list_recent(limit).await?,
    };
    Ok(entries)
}
