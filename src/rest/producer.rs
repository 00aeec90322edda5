//! Business-logic seam of a served resource kind

use super::{Action, Input, Invocation, Output, RequestContext, ACTION_CREATE, ACTION_SET};
use crate::error::{Error, Result};
use crate::resource::{AnyResource, Filter};
use async_trait::async_trait;
use std::sync::Arc;

/// Owner of a resource kind's behaviour.
///
/// Every canonical operation defaults to `not_implemented`, so a producer
/// only overrides what it supports and declares it through
/// [`Producer::actions`].
#[async_trait]
pub trait Producer: Send + Sync + 'static {
    async fn create(&self, _cx: &RequestContext, _resource: AnyResource) -> Result<Output> {
        Err(Error::not_implemented("create is not implemented").debug())
    }

    async fn get(&self, _cx: &RequestContext, _id: &str) -> Result<Output> {
        Err(Error::not_implemented("get is not implemented").debug())
    }

    async fn query(&self, _cx: &RequestContext, _filter: Option<Filter>) -> Result<Output> {
        Err(Error::not_implemented("query is not implemented").debug())
    }

    async fn set(&self, _cx: &RequestContext, _id: &str, _resource: AnyResource) -> Result<Output> {
        Err(Error::not_implemented("set is not implemented").debug())
    }

    async fn delete(&self, _cx: &RequestContext, _id: &str) -> Result<()> {
        Err(Error::not_implemented("delete is not implemented").debug())
    }

    /// Actions this producer serves. Defaults to the six canonical ones.
    fn actions(self: Arc<Self>) -> Vec<Action>
    where
        Self: Sized,
    {
        standard_actions(self)
    }
}

/// The canonical actions, bound to `producer`.
pub fn standard_actions<P: Producer>(producer: Arc<P>) -> Vec<Action> {
    let create = {
        let producer = producer.clone();
        Action::create().with_handler(move |invocation: Invocation| {
            let producer = producer.clone();
            async move {
                let resource = expect_resource(invocation.input, ACTION_CREATE)?;
                producer.create(&invocation.context, resource).await
            }
        })
    };
    let get = {
        let producer = producer.clone();
        Action::get().with_handler(move |invocation: Invocation| {
            let producer = producer.clone();
            async move { producer.get(&invocation.context, &invocation.id).await }
        })
    };
    let query = {
        let producer = producer.clone();
        Action::query().with_handler(move |invocation: Invocation| {
            let producer = producer.clone();
            async move {
                let filter = invocation.input.into_filter();
                producer.query(&invocation.context, filter).await
            }
        })
    };
    let set = {
        let producer = producer.clone();
        Action::set().with_handler(move |invocation: Invocation| {
            let producer = producer.clone();
            async move {
                let resource = expect_resource(invocation.input, ACTION_SET)?;
                producer
                    .set(&invocation.context, &invocation.id, resource)
                    .await
            }
        })
    };
    let delete = Action::delete().with_handler(move |invocation: Invocation| {
        let producer = producer.clone();
        async move {
            producer
                .delete(&invocation.context, &invocation.id)
                .await
                .map(|_| Output::None)
        }
    });

    vec![create, get, query, set, Action::merge(), delete]
}

fn expect_resource(input: Input, action: &str) -> Result<AnyResource> {
    input.into_resource().ok_or_else(|| {
        Error::bad_request(format!("{} requires a resource body", action)).debug()
    })
}
