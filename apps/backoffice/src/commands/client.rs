//! # Client Commands

use chrono::Utc;
use tracing::debug;

use super::{record_audit, Actor};
use crate::error::ApiError;
use crate::state::AppState;
use tienda_core::{Client, ClientPatch, NewClient, RecordStatus};
use tienda_db::audit_actions as actions;

pub async fn create_client(state: &AppState, actor: &Actor, input: NewClient) -> Result<Client, ApiError> {
    debug!("create_client command");

    let client = input.into_client(Utc::now())?;
    state.db.clients().insert(&client).await?;

    record_audit(
        state,
        actor,
        actions::CLIENT_CREATED,
        format!("Client {} ({}) created", client.full_name, client.document_id),
    )
    .await;

    Ok(client)
}

pub async fn get_client(state: &AppState, id: &str) -> Result<Client, ApiError> {
    state
        .db
        .clients()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client", id))
}

/// Clients with the given status (active when omitted), by name.
pub async fn list_clients(state: &AppState, status: Option<RecordStatus>) -> Result<Vec<Client>, ApiError> {
    let clients = state
        .db
        .clients()
        .list(status.unwrap_or(RecordStatus::Active))
        .await?;
    Ok(clients)
}

pub async fn update_client(
    state: &AppState,
    actor: &Actor,
    id: &str,
    patch: ClientPatch,
) -> Result<Client, ApiError> {
    if patch.is_empty() {
        return get_client(state, id).await;
    }

    let client = state.db.clients().apply_patch(id, &patch).await?;
    record_audit(
        state,
        actor,
        actions::CLIENT_UPDATED,
        format!("Client {} updated", client.id),
    )
    .await;

    Ok(client)
}

pub async fn deactivate_client(state: &AppState, actor: &Actor, id: &str) -> Result<Client, ApiError> {
    let client = state.db.clients().deactivate(id).await?;
    record_audit(
        state,
        actor,
        actions::CLIENT_DEACTIVATED,
        format!("Client {} deactivated", client.id),
    )
    .await;
    Ok(client)
}

pub async fn restore_client(state: &AppState, actor: &Actor, id: &str) -> Result<Client, ApiError> {
    let client = state.db.clients().restore(id).await?;
    record_audit(
        state,
        actor,
        actions::CLIENT_RESTORED,
        format!("Client {} restored", client.id),
    )
    .await;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::test_support::test_state;

    fn new_client(phone: &str, document_id: &str) -> NewClient {
        NewClient {
            full_name: "Juan Mamani".to_string(),
            phone: phone.to_string(),
            address: Some("Av. Arce 123".to_string()),
            document_id: document_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_lifecycle() {
        let state = test_state().await;
        let actor = Actor::new("ana");

        let client = create_client(&state, &actor, new_client("71234567", "4455667"))
            .await
            .unwrap();

        let patch = ClientPatch {
            address: Some(None),
            ..Default::default()
        };
        let updated = update_client(&state, &actor, &client.id, patch).await.unwrap();
        assert_eq!(updated.address, None);

        deactivate_client(&state, &actor, &client.id).await.unwrap();
        assert!(list_clients(&state, None).await.unwrap().is_empty());

        restore_client(&state, &actor, &client.id).await.unwrap();
        assert_eq!(list_clients(&state, None).await.unwrap().len(), 1);

        let actions_logged: Vec<String> = state
            .db
            .audit()
            .list_for_username("ana", 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions_logged,
            vec![
                actions::CLIENT_RESTORED,
                actions::CLIENT_DEACTIVATED,
                actions::CLIENT_UPDATED,
                actions::CLIENT_CREATED,
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicates_and_missing() {
        let state = test_state().await;
        let actor = Actor::new("ana");

        create_client(&state, &actor, new_client("71234567", "4455667"))
            .await
            .unwrap();

        let err = create_client(&state, &actor, new_client("71234567", "9999999"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = get_client(&state, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
