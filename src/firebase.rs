//! Direct Firestore reads for event data and usage statistics.
//!
//! The platform keeps event collections (`upcomingEvents`, `pastEvents`,
//! `registrations`) and a `stats/users` document in Firestore, read
//! directly by the client over the Firestore REST API. Wire values arrive
//! wrapped (`{"stringValue": ...}`, `{"integerValue": "5"}`); they are
//! unwrapped into plain JSON before deserializing into domain types.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api::types::{Event, Registration, UsageStats};
use crate::config::Config;
use crate::error::{Error, Result};

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
  #[serde(default)]
  documents: Vec<FirestoreDocument>,
  #[serde(rename = "nextPageToken")]
  next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
  /// Full resource name; the last segment is the document id
  name: String,
  #[serde(default)]
  fields: Map<String, Value>,
}

/// Client for the platform's Firestore collections.
#[derive(Clone)]
pub struct FirestoreClient {
  http: reqwest::Client,
  project_id: String,
  move_events_url: Option<String>,
}

impl FirestoreClient {
  pub fn new(config: &Config) -> Result<Self> {
    let project_id = config
      .firebase
      .project_id
      .clone()
      .ok_or_else(|| Error::Config("firebase.project_id is not configured".to_string()))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("agora-client/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      project_id,
      move_events_url: config.firebase.move_events_url.clone(),
    })
  }

  fn document_url(&self, path: &str) -> String {
    format!(
      "{FIRESTORE_BASE}/projects/{}/databases/(default)/documents/{path}",
      self.project_id
    )
  }

  /// Events that have not happened yet.
  pub async fn upcoming_events(&self) -> Result<Vec<Event>> {
    self.list_collection("upcomingEvents").await
  }

  /// Events that already ended.
  pub async fn past_events(&self) -> Result<Vec<Event>> {
    self.list_collection("pastEvents").await
  }

  /// All event registrations.
  pub async fn registrations(&self) -> Result<Vec<Registration>> {
    self.list_collection("registrations").await
  }

  /// The `stats/users` document.
  pub async fn user_stats(&self) -> Result<UsageStats> {
    let url = self.document_url("stats/users");
    let response = self.http.get(&url).send().await?;
    if !response.status().is_success() {
      return Err(Error::Firestore(format!(
        "stats/users read failed with status {}",
        response.status()
      )));
    }

    let document: FirestoreDocument = response.json().await?;
    let stats = serde_json::from_value(decode_document(&document))?;
    Ok(stats)
  }

  /// Trigger the cloud function that moves ended events from
  /// `upcomingEvents` to `pastEvents`.
  pub async fn move_expired_events(&self) -> Result<()> {
    let url = self
      .move_events_url
      .as_deref()
      .ok_or_else(|| Error::Config("firebase.move_events_url is not configured".to_string()))?;

    let response = self.http.post(url).send().await?;
    if !response.status().is_success() {
      return Err(Error::Firestore(format!(
        "move events function failed with status {}",
        response.status()
      )));
    }

    info!("moved expired events to past list");
    Ok(())
  }

  /// List a whole collection, following page tokens.
  async fn list_collection<T: serde::de::DeserializeOwned>(
    &self,
    collection: &str,
  ) -> Result<Vec<T>> {
    let base = self.document_url(collection);
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
      let url = match &page_token {
        Some(token) => format!("{base}?pageToken={token}"),
        None => base.clone(),
      };

      let response = self.http.get(&url).send().await?;
      if !response.status().is_success() {
        return Err(Error::Firestore(format!(
          "listing {collection} failed with status {}",
          response.status()
        )));
      }

      let page: ListDocumentsResponse = response.json().await?;
      debug!(collection, count = page.documents.len(), "fetched page");

      for document in &page.documents {
        items.push(serde_json::from_value(decode_document(document))?);
      }

      match page.next_page_token {
        Some(token) => page_token = Some(token),
        None => break,
      }
    }

    Ok(items)
  }
}

/// Unwrap a Firestore document into plain JSON, injecting the document id
/// (the last segment of the resource name) as `id`.
fn decode_document(document: &FirestoreDocument) -> Value {
  let mut object = Map::new();
  for (key, value) in &document.fields {
    object.insert(key.clone(), decode_value(value));
  }

  let id = document.name.rsplit('/').next().unwrap_or_default();
  object.insert("id".to_string(), Value::String(id.to_string()));

  Value::Object(object)
}

/// Unwrap one Firestore wire value into plain JSON.
fn decode_value(value: &Value) -> Value {
  let Some(wrapper) = value.as_object() else {
    return Value::Null;
  };

  if let Some(s) = wrapper.get("stringValue") {
    return s.clone();
  }
  if let Some(s) = wrapper.get("timestampValue") {
    return s.clone();
  }
  if let Some(n) = wrapper.get("integerValue") {
    // Firestore sends 64-bit integers as strings
    return n
      .as_str()
      .and_then(|s| s.parse::<i64>().ok())
      .map(Value::from)
      .unwrap_or(Value::Null);
  }
  if let Some(n) = wrapper.get("doubleValue") {
    return n.clone();
  }
  if let Some(b) = wrapper.get("booleanValue") {
    return b.clone();
  }
  if let Some(array) = wrapper.get("arrayValue") {
    let values = array
      .get("values")
      .and_then(Value::as_array)
      .map(|values| values.iter().map(decode_value).collect())
      .unwrap_or_default();
    return Value::Array(values);
  }
  if let Some(map) = wrapper.get("mapValue") {
    let fields = map
      .get("fields")
      .and_then(Value::as_object)
      .map(|fields| {
        fields
          .iter()
          .map(|(k, v)| (k.clone(), decode_value(v)))
          .collect()
      })
      .unwrap_or_default();
    return Value::Object(fields);
  }

  // nullValue or an unknown wrapper
  Value::Null
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_decode_scalar_values() {
    assert_eq!(decode_value(&json!({"stringValue": "Seoul"})), json!("Seoul"));
    assert_eq!(decode_value(&json!({"integerValue": "80"})), json!(80));
    assert_eq!(decode_value(&json!({"doubleValue": 1.5})), json!(1.5));
    assert_eq!(decode_value(&json!({"booleanValue": true})), json!(true));
    assert_eq!(
      decode_value(&json!({"timestampValue": "2026-08-20T10:00:00Z"})),
      json!("2026-08-20T10:00:00Z")
    );
    assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
  }

  #[test]
  fn test_decode_nested_values() {
    let value = json!({
      "arrayValue": {"values": [{"stringValue": "a"}, {"integerValue": "2"}]}
    });
    assert_eq!(decode_value(&value), json!(["a", 2]));

    let value = json!({
      "mapValue": {"fields": {"city": {"stringValue": "Busan"}}}
    });
    assert_eq!(decode_value(&value), json!({"city": "Busan"}));
  }

  #[test]
  fn test_decode_document_injects_id() {
    let document: FirestoreDocument = serde_json::from_value(json!({
      "name": "projects/agora/databases/(default)/documents/upcomingEvents/ev-42",
      "fields": {
        "title": {"stringValue": "August Meetup"},
        "startAt": {"timestampValue": "2026-08-20T10:00:00Z"},
        "capacity": {"integerValue": "80"}
      }
    }))
    .unwrap();

    let decoded = decode_document(&document);
    assert_eq!(decoded["id"], json!("ev-42"));

    let event: Event = serde_json::from_value(decoded).unwrap();
    assert_eq!(event.id, "ev-42");
    assert_eq!(event.title, "August Meetup");
    assert_eq!(event.capacity, Some(80));
  }

  #[test]
  fn test_stats_document_decodes() {
    let document: FirestoreDocument = serde_json::from_value(json!({
      "name": "projects/agora/databases/(default)/documents/stats/users",
      "fields": {
        "totalUsers": {"integerValue": "1234"},
        "updatedAt": {"timestampValue": "2026-08-01T00:00:00Z"}
      }
    }))
    .unwrap();

    let stats: UsageStats = serde_json::from_value(decode_document(&document)).unwrap();
    assert_eq!(stats.total_users, 1234);
    assert!(stats.updated_at.is_some());
  }
}
