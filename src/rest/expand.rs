//! Attaching full labels to query results

use super::{Client, RequestContext};
use crate::resource::{Collection, Filter, Label};
use std::collections::HashMap;

/// Replaces each item's label ids with the labels they name.
///
/// All ids are fetched in one query. When that fails each item is retried on
/// its own; an item whose labels still cannot be fetched is kept without them.
pub async fn expand_labels(client: Option<&Client>, cx: &RequestContext, collection: &mut Collection) {
    let mut wanted: Vec<String> = Vec::new();
    for item in collection.iter() {
        for id in item.label_ids() {
            if !wanted.contains(id) {
                wanted.push(id.clone());
            }
        }
    }
    if wanted.is_empty() {
        return;
    }
    let Some(client) = client else {
        tracing::error!(kind = %collection.kind(), "label expansion requested without a label consumer");
        return;
    };

    match client.query::<Label>(cx, &Filter::ids_in(wanted.iter().cloned())).await {
        Ok(labels) => {
            let by_id: HashMap<String, Label> = labels
                .into_iter()
                .map(|label| (label.identity.id.clone(), label))
                .collect();
            for item in collection.items_mut() {
                let labels = item
                    .label_ids()
                    .iter()
                    .filter_map(|id| by_id.get(id).cloned())
                    .collect();
                item.identity_mut().labels = Some(labels);
            }
        }
        Err(e) => {
            tracing::error!(kind = %collection.kind(), "batch label expansion failed, {}", e);
            for item in collection.items_mut() {
                if item.label_ids().is_empty() {
                    continue;
                }
                let filter = Filter::ids_in(item.label_ids().iter().cloned());
                match client.query::<Label>(cx, &filter).await {
                    Ok(labels) => {
                        let ordered = item
                            .label_ids()
                            .iter()
                            .filter_map(|id| labels.iter().find(|l| &l.identity.id == id).cloned())
                            .collect();
                        item.identity_mut().labels = Some(ordered);
                    }
                    Err(e) => {
                        tracing::error!(id = %item.id(), "label expansion failed, skipping item, {}", e);
                    }
                }
            }
        }
    }
}
