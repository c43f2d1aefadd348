use crate::graph::RoomId;
use crate::state::SessionContext;
use std::time::Duration;

/// Wait until the session reports `room` as the current location, at most `limit`.
///
/// There is no acknowledgment tying a goto to its snapshot; arrival is the
/// correlated event, and the bound keeps a lost command from stalling the
/// caller. Returns false on timeout, in which case the caller proceeds
/// against whatever state it has.
pub async fn wait_for_arrival(ctx: &SessionContext, room: RoomId, limit: Duration) -> bool {
    let mut location = ctx.watch_room();
    tokio::time::timeout(limit, location.wait_for(|current| *current == Some(room)))
        .await
        .map(|result| result.is_ok())
        .unwrap_or(false)
}
