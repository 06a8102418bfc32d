use crate::{
    api::{api_structs::MatchFrame, OsuApi},
    ingestion::{
        cursor::{has_next, next_cursor},
        IngestError
    }
};
use chrono::{DateTime, FixedOffset};

/// One yielded step of the frame sequence: the fetched frame, the advanced
/// watermark and the timestamp of the newest event seen.
#[derive(Debug)]
pub struct FrameStep {
    pub frame: MatchFrame,
    pub cursor: i64,
    pub last_event_time: Option<DateTime<FixedOffset>>
}

/// Lazy, finite, restartable sequence of frames for one match.
///
/// Each `next` performs exactly one network call. The sequence ends once a
/// pull drains the available backlog, and can be reconstructed later from the
/// persisted cursor to resume where it left off. On error the cursor is left
/// unadvanced, so the next sequence retries the same window.
pub struct FrameSequence<'a> {
    api: &'a OsuApi,
    match_id: i64,
    cursor: i64,
    done: bool
}

impl<'a> FrameSequence<'a> {
    pub fn new(api: &'a OsuApi, match_id: i64, cursor: i64) -> FrameSequence<'a> {
        FrameSequence {
            api,
            match_id,
            cursor,
            done: false
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub async fn next(&mut self) -> Option<Result<FrameStep, IngestError>> {
        if self.done {
            return None;
        }

        let frame = match self.api.fetch_match_frame(self.match_id, Some(self.cursor)).await {
            Ok(frame) => frame,
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };

        let next = match next_cursor(&frame, self.cursor) {
            Ok(next) => next,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        self.done = !has_next(&frame, next);
        self.cursor = next;

        Some(Ok(FrameStep {
            last_event_time: frame.last_event_time(),
            frame,
            cursor: next
        }))
    }
}
