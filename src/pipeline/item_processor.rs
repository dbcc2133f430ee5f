//! Contains the per-item completion barrier of the media pipeline.

use futures_util::future::join_all;
use tracing::trace;

use super::MediaPipeline;
use crate::error::PipelineError;
use crate::policy::MediaPolicy;
use crate::state::SpiderInfo;

impl<P: MediaPolicy> MediaPipeline<P> {
    /// Downloads everything `item` needs and returns what the policy's
    /// `item_completed` makes of it.
    ///
    /// The item's requests are dispatched concurrently. Results reach
    /// `item_completed` in request order, whatever order they resolved in.
    /// Failed downloads never abort the item; only errors from
    /// `get_media_requests` or `item_completed` are returned.
    pub async fn process_item_with(
        &self,
        item: P::Item,
        info: &SpiderInfo,
    ) -> Result<P::Item, PipelineError> {
        let requests = self.policy.get_media_requests(&item, info)?.into_vec();
        trace!(
            "{} processing item with {} media request(s)",
            self.policy.name(),
            requests.len()
        );

        let results = {
            let item_ref = &item;
            join_all(
                requests
                    .into_iter()
                    .map(move |request| self.process_request(request, info, item_ref)),
            )
            .await
        };

        let item = self.policy.item_completed(results, item, info).await?;
        info.stats().increment_items_completed();
        trace!("{} completed item", self.policy.name());
        Ok(item)
    }
}
