use crate::api::api_structs::{MatchEvent, MatchFrame, MatchUser};
use std::collections::BTreeMap;

/// Combines a previous and a newer frame into one cumulative snapshot.
///
/// Match info and the frame-level ids always come from `after` (freshest
/// wins). Events and users are unioned by id; when an id appears on both
/// sides, `after`'s copy wins. The result keeps events sorted ascending with
/// unique ids.
pub fn merge(before: &MatchFrame, after: &MatchFrame) -> MatchFrame {
    let mut events: BTreeMap<i64, MatchEvent> = BTreeMap::new();
    for event in before.events.iter().chain(after.events.iter()) {
        events.insert(event.id, event.clone());
    }

    let mut users: BTreeMap<i64, MatchUser> = BTreeMap::new();
    for user in before.users.iter().chain(after.users.iter()) {
        users.insert(user.id, user.clone());
    }

    MatchFrame {
        info: after.info.clone(),
        events: events.into_values().collect(),
        users: users.into_values().collect(),
        first_event_id: after.first_event_id,
        latest_event_id: after.latest_event_id,
        current_game_id: after.current_game_id
    }
}
