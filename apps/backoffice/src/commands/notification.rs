//! # Notification Commands

use serde::{Deserialize, Serialize};
use tracing::info;

use super::list_limit;
use crate::error::ApiError;
use crate::state::AppState;
use tienda_core::Notification;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub user_id: String,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

pub async fn send_notification(
    state: &AppState,
    request: SendNotificationRequest,
) -> Result<Notification, ApiError> {
    let notification = state
        .db
        .notifications()
        .create(&request.user_id, &request.title, &request.message)
        .await?;

    info!(id = %notification.id, user_id = %notification.user_id, "Notification sent");
    Ok(notification)
}

/// A user's notifications, newest first, with the unread count.
pub async fn list_notifications(
    state: &AppState,
    user_id: &str,
    unread_only: bool,
    limit: Option<u32>,
) -> Result<NotificationList, ApiError> {
    let repo = state.db.notifications();
    let notifications = repo
        .list_for_user(user_id, unread_only, list_limit(limit))
        .await?;
    let unread_count = repo.unread_count(user_id).await?;

    Ok(NotificationList {
        notifications,
        unread_count,
    })
}

pub async fn mark_notification_read(state: &AppState, id: &str) -> Result<(), ApiError> {
    state.db.notifications().mark_read(id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::test_support::{seed_user, test_state};

    #[tokio::test]
    async fn test_send_list_and_read() {
        let state = test_state().await;
        let user = seed_user(&state, "ana").await;

        let sent = send_notification(
            &state,
            SendNotificationRequest {
                user_id: user.id.clone(),
                title: "Stock bajo".to_string(),
                message: "Arroz 5kg tiene 2 unidades".to_string(),
            },
        )
        .await
        .unwrap();

        let list = list_notifications(&state, &user.id, false, None).await.unwrap();
        assert_eq!(list.unread_count, 1);
        assert_eq!(list.notifications.len(), 1);

        mark_notification_read(&state, &sent.id).await.unwrap();
        let list = list_notifications(&state, &user.id, true, None).await.unwrap();
        assert_eq!(list.unread_count, 0);
        assert!(list.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_rejections() {
        let state = test_state().await;

        let err = send_notification(
            &state,
            SendNotificationRequest {
                user_id: "ghost".to_string(),
                title: "Hola".to_string(),
                message: "body".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = mark_notification_read(&state, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
