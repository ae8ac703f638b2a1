//! Bookmark loader: the user's liked hospitals as stored by the backend.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{messages, settle, settle_empty, ApiClient, ApiResponse, Envelope};
use crate::capabilities::HttpError;
use crate::event::Event;

/// A saved reference to a hospital.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookmarkRecord {
    #[serde(rename = "googleMapId", default)]
    pub place_id: String,
    #[serde(rename = "bookmarkDate", default)]
    pub bookmarked_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkList {
    #[serde(default)]
    pub bookmark_list: Vec<BookmarkRecord>,
}

impl ApiClient<'_> {
    /// Loads the bookmark list. An empty list is a successful load.
    pub fn fetch_bookmarks<F>(&self, path: &str, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<Vec<BookmarkRecord>>) -> Event + Send + 'static,
    {
        let url = self.url(path, &[])?;
        debug!(%url, "fetching bookmarks");
        self.http
            .get(url)
            .expect_json::<Envelope<BookmarkList>>()
            .send(move |result| {
                callback(settle(result, messages::BOOKMARKS_FAILED).map(|e| e.data.bookmark_list))
            });
        Ok(())
    }

    pub fn delete_bookmark<F>(&self, path: &str, place_id: &str, callback: F) -> Result<(), HttpError>
    where
        F: FnOnce(ApiResponse<()>) -> Event + Send + 'static,
    {
        let url = self.url(path, &[place_id])?;
        self.http
            .delete(url)
            .send(move |result| callback(settle_empty(result, messages::BOOKMARK_DELETE_FAILED)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bookmark_envelope() {
        let body = r#"{
            "data": {
                "bookmarkList": [
                    { "googleMapId": "ChIJabc", "bookmarkDate": "2024-01-01" },
                    { "googleMapId": "", "bookmarkDate": "2024-02-01" }
                ]
            }
        }"#;
        let envelope: Envelope<BookmarkList> = serde_json::from_str(body).unwrap();
        assert_eq!(
            envelope.data.bookmark_list,
            vec![
                BookmarkRecord {
                    place_id: "ChIJabc".into(),
                    bookmarked_at: "2024-01-01".into(),
                },
                BookmarkRecord {
                    place_id: String::new(),
                    bookmarked_at: "2024-02-01".into(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_list_is_empty() {
        let envelope: Envelope<BookmarkList> = serde_json::from_str(r#"{ "data": {} }"#).unwrap();
        assert!(envelope.data.bookmark_list.is_empty());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record: BookmarkRecord = serde_json::from_str(r#"{ "bookmarkDate": "2024-03-01" }"#).unwrap();
        assert!(record.place_id.is_empty());
    }
}
