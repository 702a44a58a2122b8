//! Push subscription registration.

use tracing::info;

use st_core::error::StResult;
use st_models::store::set_as;
use st_models::{path, PushSubscription, PushTarget};

use crate::context::FlowContext;

/// Store a push target for a user. The same endpoint or token always lands
/// on the same document.
pub async fn save_subscription(
    ctx: &FlowContext,
    uid: &str,
    target: PushTarget,
    user_agent: Option<String>,
) -> StResult<PushSubscription> {
    let subscription = PushSubscription::new(target, user_agent);
    ctx.observe(
        "save_subscription",
        set_as(
            ctx.store.as_ref(),
            &path::subscription(uid, &subscription.id)?,
            &subscription,
        )
        .await,
    )?;
    info!("saved push subscription {} for {uid}", subscription.target.label());
    Ok(subscription)
}

pub async fn list_subscriptions(ctx: &FlowContext, uid: &str) -> StResult<Vec<PushSubscription>> {
    let docs = ctx.observe("list_subscriptions", ctx.store.list(&path::subscriptions(uid)?).await)?;
    docs.iter().map(|doc| doc.decode()).collect()
}

/// Returns whether the subscription existed.
pub async fn remove_subscription(ctx: &FlowContext, uid: &str, subscription_id: &str) -> StResult<bool> {
    ctx.observe(
        "remove_subscription",
        ctx.store.delete(&path::subscription(uid, subscription_id)?).await,
    )
}
