//! Access stage
//!
//! Resolves the spaces the authorized entity belongs to. Runs after
//! [`authorization`](super::authorization) and expects the entity in the
//! request context.

use crate::error::{Error, Result};
use crate::resource::{Filter, Label, SPACE_LABEL};
use crate::rest::RequestContext;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub async fn access(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(cx) = request.extensions_mut().remove::<RequestContext>() else {
        return Error::internal_server("missing context value, entity")
            .alarm()
            .into_response();
    };
    match resolve_spaces(&state, cx).await {
        Ok(cx) => {
            request.extensions_mut().insert(cx);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn resolve_spaces(state: &AppState, mut cx: RequestContext) -> Result<RequestContext> {
    let entity = cx
        .entity
        .clone()
        .ok_or_else(|| Error::internal_server("missing context value, entity").alarm())?;
    let client = state.label_client()?;

    let filter = Filter::ids_in(entity.identity.label_ids.iter().cloned()).and("name", json!(SPACE_LABEL));
    let spaces: Vec<Label> = client
        .query(&cx, &filter)
        .await
        .map_err(|e| Error::internal_server(format!("failed to contact server, {}", e)).alarm())?;
    if spaces.is_empty() {
        return Err(Error::internal_server(format!(
            "entity does not belong to any space, {} ({})",
            entity.key, entity.identity.id
        ))
        .alarm());
    }

    let spaces = order_spaces(&entity.identity.label_ids, spaces);
    for space in &spaces {
        tracing::debug!(key = %entity.key, space = %space.value, id = %space.identity.id, "entity belongs to space");
    }
    cx.space_ids = spaces.iter().map(|space| space.identity.id.clone()).collect();
    cx.spaces = spaces;
    Ok(cx)
}

/// Orders spaces by the position of their id in the entity's own label ids,
/// so the owned space comes first. Spaces the entity does not list go last.
pub fn order_spaces(label_ids: &[String], mut spaces: Vec<Label>) -> Vec<Label> {
    spaces.sort_by_key(|space| {
        label_ids
            .iter()
            .position(|id| *id == space.identity.id)
            .unwrap_or(usize::MAX)
    });
    spaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use pretty_assertions::assert_eq;

    fn space(value: &str) -> Label {
        let mut label = Label::fresh();
        label.name = SPACE_LABEL.to_string();
        label.value = value.to_string();
        label
    }

    #[test]
    fn test_owned_space_first() {
        let s1 = space("owned");
        let s2 = space("shared");
        let label_ids = vec![s1.identity.id.clone(), s2.identity.id.clone()];

        // service answered in the opposite order
        let ordered = order_spaces(&label_ids, vec![s2.clone(), s1.clone()]);
        assert_eq!(ordered, vec![s1.clone(), s2.clone()]);

        let label_ids = vec![s2.identity.id.clone(), s1.identity.id.clone()];
        let ordered = order_spaces(&label_ids, vec![s1.clone(), s2.clone()]);
        assert_eq!(ordered, vec![s2, s1]);
    }

    #[test]
    fn test_unlisted_spaces_go_last() {
        let owned = space("owned");
        let stray = space("stray");
        let ordered = order_spaces(&[owned.identity.id.clone()], vec![stray.clone(), owned.clone()]);
        assert_eq!(ordered, vec![owned, stray]);
    }
}
