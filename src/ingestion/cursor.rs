use crate::{api::api_structs::MatchFrame, ingestion::IngestError};

/// Computes the next safe watermark for a fetched frame.
///
/// Events belonging to the in-progress game (and anything after it) are not
/// consumed: the cursor stops at the event immediately preceding the
/// in-progress game's event. A cursor may never decrease; a frame implying a
/// decrease is rejected rather than clamped.
pub fn next_cursor(frame: &MatchFrame, cursor: i64) -> Result<i64, IngestError> {
    let next = advance(frame, cursor);

    if next < cursor {
        return Err(IngestError::CursorRegression {
            match_id: frame.info.id,
            cursor,
            next
        });
    }

    Ok(next)
}

fn advance(frame: &MatchFrame, cursor: i64) -> i64 {
    if frame.events.is_empty() {
        return cursor;
    }

    // Events are sorted ascending, so the max id is the last one
    let max_id = frame.events[frame.events.len() - 1].id;

    let current_game_id = match frame.current_game_id {
        Some(id) => id,
        None => return max_id
    };

    match frame
        .events
        .iter()
        .position(|e| e.game.as_ref().map(|g| g.id) == Some(current_game_id))
    {
        // The in-progress game is the very first event; nothing safe to consume yet
        Some(0) => cursor,
        Some(i) => frame.events[i - 1].id,
        // No event references the in-progress game; consume everything
        None => max_id
    }
}

/// Continue pulling while the frame still had events and the computed cursor
/// moved past the frame's first event id, i.e. more than one page of backlog
/// remained.
pub fn has_next(frame: &MatchFrame, next_cursor: i64) -> bool {
    !frame.events.is_empty() && next_cursor > frame.first_event_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{generate_event, generate_frame, generate_game_event};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_empty_frame_keeps_cursor() {
        let frame = generate_frame(1, vec![], None);
        assert_eq!(next_cursor(&frame, 7).unwrap(), 7);

        let frame = generate_frame(1, vec![], Some(99));
        assert_eq!(next_cursor(&frame, 7).unwrap(), 7);
    }

    #[test]
    fn test_no_game_in_progress_consumes_all() {
        let frame = generate_frame(1, vec![generate_event(10), generate_event(11), generate_event(12)], None);
        assert_eq!(next_cursor(&frame, 9).unwrap(), 12);
    }

    #[test]
    fn test_stops_before_in_progress_game() {
        let frame = generate_frame(
            1,
            vec![
                generate_game_event(1, 100),
                generate_game_event(2, 101),
                generate_game_event(3, 102),
            ],
            Some(102)
        );

        assert_eq!(next_cursor(&frame, 0).unwrap(), 2);
    }

    #[test]
    fn test_single_in_progress_event_keeps_cursor() {
        let frame = generate_frame(1, vec![generate_game_event(5, 50)], Some(50));
        assert_eq!(next_cursor(&frame, 4).unwrap(), 4);
    }

    #[test]
    fn test_missing_in_progress_event_falls_back_to_max() {
        let frame = generate_frame(1, vec![generate_event(10), generate_event(11)], Some(999));
        assert_eq!(next_cursor(&frame, 9).unwrap(), 11);
    }

    #[test]
    fn test_regression_is_rejected_not_clamped() {
        // All event ids below the current cursor imply a decrease
        let frame = generate_frame(1, vec![generate_event(3), generate_event(4)], None);
        let result = next_cursor(&frame, 10);

        assert!(matches!(
            result,
            Err(IngestError::CursorRegression { cursor: 10, next: 4, .. })
        ));
    }

    #[test]
    fn test_cursor_is_monotonic_over_synthetic_frames() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            let cursor: i64 = rng.random_range(0..20);
            let count = rng.random_range(0..6);
            let mut events = Vec::new();
            let mut id = cursor;
            for _ in 0..count {
                id += rng.random_range(1..4);
                events.push(generate_game_event(id, id * 10));
            }
            let current = events
                .last()
                .filter(|_| rng.random_bool(0.5))
                .and_then(|e| e.game.as_ref())
                .map(|g| g.id);

            let frame = generate_frame(1, events, current);
            let next = next_cursor(&frame, cursor).unwrap();
            assert!(next >= cursor);
        }
    }

    #[test]
    fn test_has_next_requires_progress_past_first_event() {
        let frame = generate_frame(1, vec![generate_event(10), generate_event(11)], None);
        assert!(has_next(&frame, 11));
        assert!(!has_next(&frame, 10));

        let empty = generate_frame(1, vec![], None);
        assert!(!has_next(&empty, 50));
    }
}
