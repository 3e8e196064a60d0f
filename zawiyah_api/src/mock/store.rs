//! In-memory fixture tables behind the mock adapter, and the route table
//! that maps endpoint paths onto them.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::AdapterError;
use crate::query::Params;
use crate::types::{AnalyticsSummary, Pagination};

/// Resource families addressable through the first path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Users,
    Donations,
    Campaigns,
    Events,
    Lessons,
    Analytics,
    Health,
}

impl ResourceKind {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "users" => Some(Self::Users),
            "donations" => Some(Self::Donations),
            "campaigns" => Some(Self::Campaigns),
            "events" => Some(Self::Events),
            "lessons" => Some(Self::Lessons),
            "analytics" => Some(Self::Analytics),
            "health" => Some(Self::Health),
            _ => None,
        }
    }

    pub fn segment(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Donations => "donations",
            Self::Campaigns => "campaigns",
            Self::Events => "events",
            Self::Lessons => "lessons",
            Self::Analytics => "analytics",
            Self::Health => "health",
        }
    }

    /// Singular name used in not-found messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Users => "User",
            Self::Donations => "Donation",
            Self::Campaigns => "Campaign",
            Self::Events => "Event",
            Self::Lessons => "Lesson",
            Self::Analytics => "Analytics",
            Self::Health => "Health",
        }
    }

    fn id_prefix(self) -> &'static str {
        match self {
            Self::Users => "user",
            Self::Donations => "donation",
            Self::Campaigns => "campaign",
            Self::Events => "event",
            Self::Lessons => "lesson",
            Self::Analytics => "analytics",
            Self::Health => "health",
        }
    }

    /// Whether records of this kind are stored (and therefore mutable).
    pub fn is_stored(self) -> bool {
        !matches!(self, Self::Analytics | Self::Health)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment())
    }
}

/// A parsed endpoint path: `/<kind>[/<id>[/<nested>]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub kind: ResourceKind,
    pub id: Option<String>,
    pub nested: Option<ResourceKind>,
}

impl Route {
    pub fn parse(endpoint: &str) -> Result<Self, AdapterError> {
        let unknown = || AdapterError::UnknownEndpoint(endpoint.to_string());
        let path = endpoint.split('?').next().unwrap_or_default();
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        let kind = segments
            .next()
            .and_then(ResourceKind::from_segment)
            .ok_or_else(unknown)?;
        let id = segments.next().map(str::to_string);
        let nested = match segments.next() {
            Some(segment) => Some(ResourceKind::from_segment(segment).ok_or_else(unknown)?),
            None => None,
        };
        if segments.next().is_some() {
            return Err(unknown());
        }
        Ok(Self { kind, id, nested })
    }
}

/// Record tables keyed by resource kind, in insertion order.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct FixtureStore {
    #[serde(default)]
    users: Vec<Value>,
    #[serde(default)]
    donations: Vec<Value>,
    #[serde(default)]
    campaigns: Vec<Value>,
    #[serde(default)]
    events: Vec<Value>,
    #[serde(default)]
    lessons: Vec<Value>,
}

impl FixtureStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The demo data set shipped with the crate.
    pub fn seeded() -> Result<Self, AdapterError> {
        let yaml = include_str!("../../seed_data/fixtures.yml");
        Self::from_yaml(yaml)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, AdapterError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Adds a record as-is. Intended for building test fixtures.
    pub fn with_record(mut self, kind: ResourceKind, record: Value) -> Self {
        if let Some(table) = self.table_mut(kind) {
            table.push(record);
        }
        self
    }

    pub fn len(&self, kind: ResourceKind) -> usize {
        self.table(kind).map_or(0, Vec::len)
    }

    fn table(&self, kind: ResourceKind) -> Option<&Vec<Value>> {
        match kind {
            ResourceKind::Users => Some(&self.users),
            ResourceKind::Donations => Some(&self.donations),
            ResourceKind::Campaigns => Some(&self.campaigns),
            ResourceKind::Events => Some(&self.events),
            ResourceKind::Lessons => Some(&self.lessons),
            ResourceKind::Analytics | ResourceKind::Health => None,
        }
    }

    fn table_mut(&mut self, kind: ResourceKind) -> Option<&mut Vec<Value>> {
        match kind {
            ResourceKind::Users => Some(&mut self.users),
            ResourceKind::Donations => Some(&mut self.donations),
            ResourceKind::Campaigns => Some(&mut self.campaigns),
            ResourceKind::Events => Some(&mut self.events),
            ResourceKind::Lessons => Some(&mut self.lessons),
            ResourceKind::Analytics | ResourceKind::Health => None,
        }
    }

    fn stored_table(&self, kind: ResourceKind, endpoint: &str) -> Result<&Vec<Value>, AdapterError> {
        self.table(kind)
            .ok_or_else(|| AdapterError::UnknownEndpoint(endpoint.to_string()))
    }

    fn stored_table_mut(
        &mut self,
        kind: ResourceKind,
        endpoint: &str,
    ) -> Result<&mut Vec<Value>, AdapterError> {
        self.table_mut(kind)
            .ok_or_else(|| AdapterError::UnknownEndpoint(endpoint.to_string()))
    }

    /// Serves a GET. Returns the payload and, for paged collection reads, its page metadata.
    pub fn read(
        &self,
        endpoint: &str,
        params: &Params,
    ) -> Result<(Value, Option<Pagination>), AdapterError> {
        let route = Route::parse(endpoint)?;
        match route.kind {
            ResourceKind::Health => Ok((
                serde_json::json!({ "status": "ok", "timestamp": now_iso() }),
                None,
            )),
            ResourceKind::Analytics => {
                if route.id.is_some() {
                    return Err(AdapterError::UnknownEndpoint(endpoint.to_string()));
                }
                Ok((serde_json::to_value(self.analytics())?, None))
            }
            kind => match (route.id, route.nested) {
                (None, _) => {
                    let records = self.filtered(kind, params);
                    Ok(paginate(records, params))
                }
                (Some(id), None) => {
                    let table = self.stored_table(kind, endpoint)?;
                    let found = table.iter().find(|r| record_id(r) == Some(id.as_str()));
                    Ok((found.cloned().unwrap_or(Value::Null), None))
                }
                (Some(id), Some(ResourceKind::Donations)) => {
                    let field = match kind {
                        ResourceKind::Users => "userId",
                        ResourceKind::Campaigns => "campaignId",
                        _ => return Err(AdapterError::UnknownEndpoint(endpoint.to_string())),
                    };
                    let records = self
                        .filtered(ResourceKind::Donations, params)
                        .into_iter()
                        .filter(|r| field_str(r, field) == Some(id.as_str()))
                        .collect();
                    Ok(paginate(records, params))
                }
                (Some(_), Some(_)) => Err(AdapterError::UnknownEndpoint(endpoint.to_string())),
            },
        }
    }

    fn filtered(&self, kind: ResourceKind, params: &Params) -> Vec<Value> {
        let filters: &[(&str, &str)] = match kind {
            ResourceKind::Donations => &[("userId", "userId"), ("campaign", "campaignId")],
            ResourceKind::Events | ResourceKind::Lessons => &[("category", "category")],
            _ => &[],
        };
        let active: Vec<(String, &str)> = filters
            .iter()
            .filter_map(|(param, field)| params.get_str(param).map(|v| (v, *field)))
            .collect();
        self.table(kind)
            .map(|table| {
                table
                    .iter()
                    .filter(|r| {
                        active
                            .iter()
                            .all(|(wanted, field)| field_str(r, field) == Some(wanted.as_str()))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Serves a POST: synthesizes an id, stamps timestamps, appends the record.
    pub fn create(&mut self, endpoint: &str, body: Option<Value>) -> Result<Value, AdapterError> {
        let route = Route::parse(endpoint)?;
        if route.id.is_some() || !route.kind.is_stored() {
            return Err(AdapterError::UnknownEndpoint(endpoint.to_string()));
        }
        let kind = route.kind;
        let fields = body_fields(body)?;
        let table = self.stored_table_mut(kind, endpoint)?;

        let mut millis = Utc::now().timestamp_millis();
        let mut id = format!("{}_{}", kind.id_prefix(), millis);
        while table.iter().any(|r| record_id(r) == Some(id.as_str())) {
            millis += 1;
            id = format!("{}_{}", kind.id_prefix(), millis);
        }

        let now = now_iso();
        let mut record = fields;
        record.insert("id".to_string(), Value::String(id));
        record.insert("createdAt".to_string(), Value::String(now.clone()));
        record.insert("updatedAt".to_string(), Value::String(now));
        let record = Value::Object(record);
        table.push(record.clone());
        Ok(record)
    }

    /// Serves PUT and PATCH: merges `body` over the stored record.
    pub fn update(&mut self, endpoint: &str, body: Option<Value>) -> Result<Value, AdapterError> {
        let route = Route::parse(endpoint)?;
        if route.nested.is_some() || !route.kind.is_stored() {
            return Err(AdapterError::UnknownEndpoint(endpoint.to_string()));
        }
        let kind = route.kind;
        let id = route.id.ok_or_else(|| {
            AdapterError::Validation(format!("{} id is required", kind.display_name()))
        })?;
        let fields = body_fields(body)?;
        let table = self.stored_table_mut(kind, endpoint)?;
        let record = table
            .iter_mut()
            .find(|r| record_id(r) == Some(id.as_str()))
            .ok_or_else(|| not_found(kind))?;

        if let Value::Object(existing) = record {
            for (key, value) in fields {
                if key != "id" {
                    existing.insert(key, value);
                }
            }
            existing.insert("updatedAt".to_string(), Value::String(now_iso()));
        }
        Ok(record.clone())
    }

    /// Serves DELETE: removes the record and acknowledges with `{success: true}`.
    pub fn remove(&mut self, endpoint: &str) -> Result<Value, AdapterError> {
        let route = Route::parse(endpoint)?;
        if route.nested.is_some() || !route.kind.is_stored() {
            return Err(AdapterError::UnknownEndpoint(endpoint.to_string()));
        }
        let kind = route.kind;
        let id = route.id.ok_or_else(|| {
            AdapterError::Validation(format!("{} id is required", kind.display_name()))
        })?;
        let table = self.stored_table_mut(kind, endpoint)?;
        let index = table
            .iter()
            .position(|r| record_id(r) == Some(id.as_str()))
            .ok_or_else(|| not_found(kind))?;
        table.remove(index);
        Ok(serde_json::json!({ "success": true }))
    }

    pub fn analytics(&self) -> AnalyticsSummary {
        let completed: Vec<f64> = self
            .donations
            .iter()
            .filter(|d| field_str(d, "status") == Some("completed"))
            .filter_map(|d| d.get("amount").and_then(Value::as_f64))
            .collect();
        let total_raised: f64 = completed.iter().sum();
        let average_donation = if completed.is_empty() {
            0.0
        } else {
            total_raised / completed.len() as f64
        };
        let now = Utc::now();
        let upcoming_events = self
            .events
            .iter()
            .filter_map(|e| field_str(e, "startsAt"))
            .filter_map(|s| DateTime::parse_from_rfc3339(s).ok())
            .filter(|starts| starts.with_timezone(&Utc) > now)
            .count();

        AnalyticsSummary {
            total_users: self.users.len() as u64,
            total_donations: self.donations.len() as u64,
            total_raised,
            average_donation,
            active_campaigns: self
                .campaigns
                .iter()
                .filter(|c| c.get("active").and_then(Value::as_bool) == Some(true))
                .count() as u64,
            upcoming_events: upcoming_events as u64,
            total_lessons: self.lessons.len() as u64,
        }
    }
}

fn paginate(records: Vec<Value>, params: &Params) -> (Value, Option<Pagination>) {
    match (params.get_u64("page"), params.get_u64("limit")) {
        (Some(page), Some(limit)) => {
            let pagination = Pagination::new(page.max(1), limit, records.len() as u64);
            let window = pagination.window();
            let page_records = records
                .into_iter()
                .skip(window.start)
                .take(window.end - window.start)
                .collect();
            (Value::Array(page_records), Some(pagination))
        }
        _ => (Value::Array(records), None),
    }
}

fn body_fields(body: Option<Value>) -> Result<Map<String, Value>, AdapterError> {
    match body {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(fields)) => Ok(fields),
        Some(_) => Err(AdapterError::Validation(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

fn not_found(kind: ResourceKind) -> AdapterError {
    AdapterError::NotFound {
        resource: kind.display_name().to_string(),
    }
}

fn record_id(record: &Value) -> Option<&str> {
    field_str(record, "id")
}

fn field_str<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> FixtureStore {
        FixtureStore::empty()
            .with_record(ResourceKind::Users, json!({"id": "user_1", "email": "demo@example.com"}))
            .with_record(
                ResourceKind::Donations,
                json!({"id": "d1", "userId": "user_1", "campaignId": "c1", "amount": 50.0, "status": "completed"}),
            )
            .with_record(
                ResourceKind::Donations,
                json!({"id": "d2", "userId": "user_2", "campaignId": "c1", "amount": 20.0, "status": "pending"}),
            )
            .with_record(
                ResourceKind::Donations,
                json!({"id": "d3", "userId": "user_1", "amount": 30.0, "status": "completed"}),
            )
            .with_record(ResourceKind::Campaigns, json!({"id": "c1", "title": "Roof", "goalAmount": 100.0, "active": true}))
    }

    #[test]
    fn route_parsing() {
        let route = Route::parse("/users/user_1").unwrap();
        assert_eq!(route.kind, ResourceKind::Users);
        assert_eq!(route.id.as_deref(), Some("user_1"));
        assert_eq!(route.nested, None);

        let route = Route::parse("campaigns/c1/donations/").unwrap();
        assert_eq!(route.nested, Some(ResourceKind::Donations));

        let err = Route::parse("/payments").unwrap_err();
        assert_eq!(err.to_string(), "Unknown endpoint: /payments");
        assert!(Route::parse("/users/a/b/c").is_err());
        assert!(Route::parse("/").is_err());
    }

    #[test]
    fn donations_filter_by_user_and_campaign() {
        let store = store();
        let (data, page) = store
            .read("/donations", &Params::new().with("userId", "user_1"))
            .unwrap();
        assert!(page.is_none());
        assert_eq!(data.as_array().unwrap().len(), 2);

        let (data, _) = store
            .read(
                "/donations",
                &Params::new().with("userId", "user_1").with("campaign", "c1"),
            )
            .unwrap();
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["id"], "d1");
    }

    #[test]
    fn nested_donation_collections() {
        let store = store();
        let (data, _) = store.read("/campaigns/c1/donations", &Params::new()).unwrap();
        assert_eq!(data.as_array().unwrap().len(), 2);
        let (data, _) = store.read("/users/user_1/donations", &Params::new()).unwrap();
        assert_eq!(data.as_array().unwrap().len(), 2);
        assert!(store.read("/events/e1/donations", &Params::new()).is_err());
    }

    #[test]
    fn paged_collection_read() {
        let store = store();
        let (data, page) = store
            .read("/donations", &Params::new().with_page(2, 2))
            .unwrap();
        let page = page.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next);
        assert!(page.has_prev);
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["id"], "d3");
    }

    #[test]
    fn missing_record_reads_as_null() {
        let (data, _) = store().read("/users/nobody", &Params::new()).unwrap();
        assert!(data.is_null());
    }

    #[test]
    fn create_stamps_and_appends() {
        let mut store = store();
        let record = store
            .create("/users", Some(json!({"email": "new@example.com", "id": "spoofed"})))
            .unwrap();
        let id = record["id"].as_str().unwrap();
        assert!(id.starts_with("user_"));
        assert_ne!(id, "spoofed");
        assert_eq!(record["email"], "new@example.com");
        assert_eq!(record["createdAt"], record["updatedAt"]);
        assert_eq!(store.len(ResourceKind::Users), 2);
    }

    #[test]
    fn rapid_creates_get_distinct_ids() {
        let mut store = FixtureStore::empty();
        let a = store.create("/events", None).unwrap();
        let b = store.create("/events", None).unwrap();
        assert_ne!(a["id"], b["id"]);
    }

    #[test]
    fn update_merges_fields() {
        let mut store = store();
        let updated = store
            .update("/donations/d2", Some(json!({"status": "completed", "id": "other"})))
            .unwrap();
        assert_eq!(updated["id"], "d2");
        assert_eq!(updated["status"], "completed");
        assert_eq!(updated["amount"], 20.0);
        assert!(updated["updatedAt"].is_string());
    }

    #[test]
    fn update_errors() {
        let mut store = store();
        let err = store.update("/campaigns/nope", Some(json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "Campaign not found");
        let err = store.update("/users", Some(json!({}))).unwrap_err();
        assert!(matches!(err, AdapterError::Validation(_)));
        let err = store.update("/users/user_1", Some(json!([1, 2]))).unwrap_err();
        assert_eq!(err.to_string(), "Request body must be a JSON object");
    }

    #[test]
    fn remove_then_remove_again() {
        let mut store = store();
        assert_eq!(store.remove("/users/user_1").unwrap(), json!({"success": true}));
        let err = store.remove("/users/user_1").unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }

    #[test]
    fn mutations_on_derived_resources_are_rejected() {
        let mut store = store();
        let err = store.create("/analytics", None).unwrap_err();
        assert_eq!(err.to_string(), "Unknown endpoint: /analytics");
        assert!(store.remove("/health").is_err());
    }

    #[test]
    fn analytics_summarizes_store() {
        let summary = store().analytics();
        assert_eq!(summary.total_users, 1);
        assert_eq!(summary.total_donations, 3);
        assert_eq!(summary.total_raised, 80.0);
        assert_eq!(summary.average_donation, 40.0);
        assert_eq!(summary.active_campaigns, 1);
    }

    #[test]
    fn seeded_fixtures_parse() {
        let store = FixtureStore::seeded().unwrap();
        assert!(store.len(ResourceKind::Users) > 0);
        assert!(store.len(ResourceKind::Donations) > 0);
        assert!(store.len(ResourceKind::Campaigns) > 0);
        assert!(store.len(ResourceKind::Events) > 0);
        assert!(store.len(ResourceKind::Lessons) > 0);
    }
}
