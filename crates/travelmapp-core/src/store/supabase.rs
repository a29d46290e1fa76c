//! Supabase (PostgREST) document store.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::{DocumentStore, OrderBy, SortDirection};
use crate::error::{Error, Result};
use crate::models::{Document, Fields};
use crate::session::SessionProvider;
use crate::util::{parse_api_error, supabase_endpoint};

const ID_COLUMN: &str = "id";
const RETURN_REPRESENTATION: &str = "return=representation";

/// [`DocumentStore`] backed by a Supabase project's REST endpoint.
///
/// Each collection is a table whose `id` column is generated by the
/// database. Requests carry the signed-in user's token when there is one so
/// that row-level security applies, and the anon key otherwise.
///
/// The places table is expected to look like:
///
/// ```sql
/// create table places (
///     id uuid primary key default gen_random_uuid(),
///     name text,
///     description text,
///     image_url text,
///     rating double precision,
///     created_at bigint,
///     user_id text
/// );
/// ```
///
/// `created_at` holds Unix milliseconds. A `timestamptz` column would reject
/// every insert and update this store sends.
#[derive(Clone)]
pub struct SupabaseDocumentStore {
    rest_url: String,
    anon_key: String,
    client: Client,
    session: Arc<dyn SessionProvider>,
}

impl SupabaseDocumentStore {
    pub fn new(
        url: impl AsRef<str>,
        anon_key: impl Into<String>,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::InvalidInput(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url,
            anon_key,
            client: Client::builder().build()?,
            session,
        })
    }

    fn table_url(&self, collection: &str) -> Result<String> {
        validate_collection(collection)?;
        Ok(format!("{}/{collection}", self.rest_url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        request.header("apikey", &self.anon_key).bearer_auth(token)
    }

    async fn fetch_rows(&self, request: RequestBuilder) -> Result<Vec<Fields>> {
        let response = self.authorize(request).send().await?;
        let response = ensure_success(response).await?;
        response
            .json::<Vec<Fields>>()
            .await
            .map_err(|error| Error::StoreUnavailable(format!("invalid response body: {error}")))
    }
}

#[async_trait]
impl DocumentStore for SupabaseDocumentStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String> {
        let request = self
            .client
            .post(self.table_url(collection)?)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&fields);

        let row = self.fetch_rows(request).await?.into_iter().next().ok_or_else(|| {
            Error::StoreUnavailable(format!("insert into {collection} returned no row"))
        })?;
        let document = split_row(row)?;
        tracing::debug!("Created {collection}/{}", document.id);
        Ok(document.id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let request = self
            .client
            .get(self.table_url(collection)?)
            .query(&[("select", "*".to_string()), (ID_COLUMN, eq_filter(id))]);

        self.fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .map(split_row)
            .transpose()
    }

    async fn list(&self, collection: &str, order: &OrderBy) -> Result<Vec<Document>> {
        let request = self
            .client
            .get(self.table_url(collection)?)
            .query(&[("select", "*".to_string()), ("order", order_clause(order))]);

        self.fetch_rows(request)
            .await?
            .into_iter()
            .map(split_row)
            .collect()
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let request = self
            .client
            .patch(self.table_url(collection)?)
            .query(&[(ID_COLUMN, eq_filter(id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&fields);

        if self.fetch_rows(request).await?.is_empty() {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.table_url(collection)?)
            .query(&[(ID_COLUMN, eq_filter(id))]);

        let response = self.authorize(request).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Normalize a project URL to its `/rest/v1` base.
pub fn normalize_rest_url(url: &str) -> Result<String> {
    supabase_endpoint(url, "rest/v1").map_err(|message| Error::InvalidInput(message.to_string()))
}

fn validate_collection(collection: &str) -> Result<()> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "invalid collection name '{collection}'"
        )))
    }
}

fn eq_filter(id: &str) -> String {
    format!("eq.{id}")
}

fn order_clause(order: &OrderBy) -> String {
    let direction = match order.direction {
        SortDirection::Ascending => "asc",
        SortDirection::Descending => "desc",
    };
    format!("{}.{direction}", order.field)
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthenticated,
        StatusCode::FORBIDDEN => Error::Forbidden(parse_api_error(status, body)),
        _ => Error::StoreUnavailable(parse_api_error(status, body)),
    }
}

/// Separate the generated `id` column from the document fields.
fn split_row(mut row: Fields) -> Result<Document> {
    let id = match row.remove(ID_COLUMN) {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(Error::MalformedRecord(
                "row is missing its id column".to_string(),
            ))
        }
    };
    Ok(Document::new(id, row))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::session::StaticSession;

    fn store() -> SupabaseDocumentStore {
        SupabaseDocumentStore::new(
            "https://demo.supabase.co/",
            "anon-key",
            Arc::new(StaticSession::anonymous()),
        )
        .unwrap()
    }

    #[test]
    fn normalize_rest_url_appends_rest_path() {
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co/rest/v1/").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
    }

    #[test]
    fn normalize_rest_url_requires_scheme() {
        assert!(matches!(
            normalize_rest_url("demo.supabase.co"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_anon_key_is_rejected() {
        let result = SupabaseDocumentStore::new(
            "https://demo.supabase.co",
            "  ",
            Arc::new(StaticSession::anonymous()),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn table_url_rejects_path_characters() {
        let store = store();
        assert_eq!(
            store.table_url("places").unwrap(),
            "https://demo.supabase.co/rest/v1/places"
        );
        assert!(store.table_url("places/../users").is_err());
        assert!(store.table_url("").is_err());
    }

    #[test]
    fn anonymous_requests_use_anon_key_as_bearer() {
        let store = store();
        let request = store
            .authorize(store.client.get("https://demo.supabase.co/rest/v1/places"))
            .build()
            .unwrap();
        assert_eq!(request.headers()["apikey"], "anon-key");
        assert_eq!(request.headers()["authorization"], "Bearer anon-key");
    }

    #[test]
    fn order_clause_renders_direction() {
        assert_eq!(
            order_clause(&OrderBy::descending("created_at")),
            "created_at.desc"
        );
        assert_eq!(order_clause(&OrderBy::ascending("name")), "name.asc");
    }

    #[test]
    fn status_errors_map_to_access_kinds() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            Error::Unauthenticated
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, r#"{"message":"permission denied"}"#),
            Error::Forbidden(ref message) if message == "permission denied (403)"
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            Error::StoreUnavailable(_)
        ));
    }

    #[test]
    fn split_row_extracts_string_and_numeric_ids() {
        let Value::Object(row) = json!({"id": "abc", "name": "Louvre"}) else {
            unreachable!()
        };
        let document = split_row(row).unwrap();
        assert_eq!(document.id, "abc");
        assert!(!document.fields.contains_key("id"));

        let Value::Object(row) = json!({"id": 42}) else {
            unreachable!()
        };
        assert_eq!(split_row(row).unwrap().id, "42");
    }

    #[test]
    fn split_row_without_id_is_malformed() {
        let Value::Object(row) = json!({"name": "Louvre"}) else {
            unreachable!()
        };
        assert!(matches!(split_row(row), Err(Error::MalformedRecord(_))));
    }
}
