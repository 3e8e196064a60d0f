use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, ErrorKind};

/// Uniform envelope returned by every adapter call.
///
/// `success == true` implies `data` is present (it may hold JSON `null` for
/// a lookup that matched nothing); `success == false` implies a non-empty
/// `error`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub timestamp: String,
}

/// A response whose payload is one page of a collection.
pub type PaginatedResponse<T> = ApiResponse<Vec<T>>;

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            message,
            pagination: None,
            timestamp: now_iso(),
        }
    }

    pub fn failure(error: &AdapterError, message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            message,
            pagination: None,
            timestamp: now_iso(),
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Page metadata for collection responses.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Derives page counts from `total` and `limit`. A zero limit yields zero pages.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Index range of this page within the full collection, clamped to `total`.
    pub fn window(&self) -> std::ops::Range<usize> {
        let start = self.page.saturating_sub(1).saturating_mul(self.limit);
        let end = start.saturating_add(self.limit).min(self.total);
        let start = start.min(self.total);
        start as usize..end as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_counts() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);
        assert_eq!(p.window(), 0..10);

        let last = Pagination::new(3, 10, 25);
        assert!(!last.has_next);
        assert!(last.has_prev);
        assert_eq!(last.window(), 20..25);

        let beyond = Pagination::new(5, 10, 25);
        assert_eq!(beyond.window(), 25..25);
    }

    #[test]
    fn pagination_zero_limit() {
        let p = Pagination::new(1, 0, 7);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert_eq!(p.window(), 0..0);
    }

    #[test]
    fn failure_carries_message_and_kind() {
        let err = AdapterError::NotFound {
            resource: "Donation".to_string(),
        };
        let resp: ApiResponse<()> = ApiResponse::failure(&err, None);
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Donation not found"));
        assert_eq!(resp.error_kind, Some(ErrorKind::NotFound));
        assert!(resp.data.is_none());
    }

    #[test]
    fn envelope_uses_camel_case() {
        let resp = ApiResponse::success(1u8, None).with_pagination(Pagination::new(1, 1, 1));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 1);
        assert_eq!(json["pagination"]["totalPages"], 1);
        assert!(json.get("error").is_none());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
