pub mod api_structs;
pub mod rate_limit;
pub mod transport;

use crate::api::{
    api_structs::{MatchFrame, MatchListPage},
    transport::{ApiError, AuthorizedClient}
};
use tracing::debug;

/// Client key whose cached token authenticates osu! API calls.
pub const OSU_CLIENT_KEY: &str = "osu";
/// Limiter bucket shared by all osu! API calls.
const OSU_BUCKET: &str = "osu-api";

/// osu! API consumer: paginated match-event fetches and match discovery.
pub struct OsuApi {
    client: AuthorizedClient,
    base_url: String
}

impl OsuApi {
    pub fn new(client: AuthorizedClient, base_url: &str) -> OsuApi {
        OsuApi {
            client,
            base_url: base_url.trim_end_matches('/').to_owned()
        }
    }

    /// Fetches one page of match events past the cursor. The returned frame
    /// is normalized: events sorted ascending by id, ids unique.
    pub async fn fetch_match_frame(&self, match_id: i64, after: Option<i64>) -> Result<MatchFrame, ApiError> {
        let url = format!("{}/matches/{}", self.base_url, match_id);

        let response = self
            .client
            .send(
                |http| {
                    let mut request = http.get(&url);
                    if let Some(after) = after {
                        request = request.query(&[("after", after)]);
                    }
                    request
                },
                OSU_CLIENT_KEY,
                OSU_BUCKET
            )
            .await?;

        let response = response.error_for_status()?;
        let body = response.text().await?;
        let frame: MatchFrame = serde_json::from_str(&body)?;

        debug!(match_id, events = frame.events.len(), "fetched match frame");
        Ok(frame.normalize())
    }

    /// One page of match summaries, ids ascending from the cursor.
    pub async fn list_matches(&self, cursor: i64) -> Result<MatchListPage, ApiError> {
        let url = format!("{}/matches", self.base_url);
        let cursor_value = cursor.to_string();

        let response = self
            .client
            .send(
                |http| {
                    http.get(&url)
                        .query(&[("sort", "id_asc")])
                        .query(&[("cursor[match_id]", cursor_value.as_str())])
                },
                OSU_CLIENT_KEY,
                OSU_BUCKET
            )
            .await?;

        let response = response.error_for_status()?;
        let body = response.text().await?;
        let page: MatchListPage = serde_json::from_str(&body)?;

        Ok(page)
    }
}
