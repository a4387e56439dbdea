//! GET|POST /concordances
//!
//! Exactly one of two request shapes is accepted:
//!
//! ```text
//! ?conceptId=<uri|uuid>[&conceptId=...]
//! ?authority=<uri>&identifierValue=<v>[&identifierValue=...]
//! ```
//!
//! POST takes the same parameters as a JSON body.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::RawQuery,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::error::{
    ApiError, BOTH_PARAMETERS, MISSING_IDENTIFIER_VALUE, MULTIPLE_AUTHORITIES, NO_PARAMETERS,
};
use super::ServiceSettings;
use crate::model::{Concordances, THING_URI_PREFIX};
use crate::resolver::ConcordanceResolver;

/// Raw request parameters. `None` means the parameter was absent.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct ConcordanceParams {
    #[serde(rename = "conceptId")]
    pub concept_ids: Option<Vec<String>>,
    #[serde(rename = "authority", default, deserialize_with = "one_or_many")]
    pub authorities: Option<Vec<String>>,
    #[serde(rename = "identifierValue", default)]
    pub identifier_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConcordanceRequest {
    ByConceptId(Vec<Uuid>),
    ByAuthority { authority: String, values: Vec<String> },
}

impl ConcordanceParams {
    /// Parse a query string; repeated keys accumulate.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "conceptId" => params
                    .concept_ids
                    .get_or_insert_with(Vec::new)
                    .push(value.into_owned()),
                "authority" => params
                    .authorities
                    .get_or_insert_with(Vec::new)
                    .push(value.into_owned()),
                "identifierValue" => params.identifier_values.push(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    pub fn validate(self) -> Result<ConcordanceRequest, ApiError> {
        match (self.concept_ids, self.authorities) {
            (Some(_), Some(_)) => Err(ApiError::Validation(BOTH_PARAMETERS.into())),
            (None, None) => Err(ApiError::Validation(NO_PARAMETERS.into())),
            (Some(ids), None) => ids
                .iter()
                .map(|id| parse_concept_id(id))
                .collect::<Result<Vec<_>, _>>()
                .map(ConcordanceRequest::ByConceptId),
            (None, Some(mut authorities)) => {
                if authorities.len() > 1 {
                    return Err(ApiError::Validation(MULTIPLE_AUTHORITIES.into()));
                }
                if self.identifier_values.is_empty() {
                    return Err(ApiError::Validation(MISSING_IDENTIFIER_VALUE.into()));
                }
                Ok(ConcordanceRequest::ByAuthority {
                    authority: authorities.pop().unwrap_or_default(),
                    values: self.identifier_values,
                })
            }
        }
    }
}

/// Accepts a bare UUID or a thing URI.
pub fn parse_concept_id(raw: &str) -> Result<Uuid, ApiError> {
    let id = raw.strip_prefix(THING_URI_PREFIX).unwrap_or(raw);
    Uuid::parse_str(id).map_err(|_| ApiError::Validation(format!("Invalid conceptId: {raw}")))
}

pub async fn get_concordances(
    Extension(resolver): Extension<Arc<ConcordanceResolver>>,
    Extension(settings): Extension<Arc<ServiceSettings>>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let request = ConcordanceParams::from_query(query.as_deref().unwrap_or_default()).validate()?;
    resolve(&resolver, &settings, request).await
}

pub async fn post_concordances(
    Extension(resolver): Extension<Arc<ConcordanceResolver>>,
    Extension(settings): Extension<Arc<ServiceSettings>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let params: ConcordanceParams = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {e}")))?;
    resolve(&resolver, &settings, params.validate()?).await
}

async fn resolve(
    resolver: &ConcordanceResolver,
    settings: &ServiceSettings,
    request: ConcordanceRequest,
) -> Result<Response, ApiError> {
    let (records, found) = match request {
        ConcordanceRequest::ByConceptId(ids) => resolver.resolve_by_concept_id(&ids).await?,
        ConcordanceRequest::ByAuthority { authority, values } => {
            resolver.resolve_by_authority(&authority, &values).await?
        }
    };
    if !found {
        return Err(ApiError::NotFound);
    }

    Ok((
        [(header::CACHE_CONTROL, settings.cache_control.clone())],
        Json(Concordances::from(records)),
    )
        .into_response())
}

// `authority` is a single string in the POST body, but a list is tolerated so
// that repeated authorities are rejected the same way as on GET.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRAND: &str = "b20801ac-5a76-43cf-b816-8c3b2f7133ad";

    fn message(err: ApiError) -> String {
        err.to_string()
    }

    #[test]
    fn repeated_query_keys_accumulate() {
        let params = ConcordanceParams::from_query(
            "authority=http%3A%2F%2Fapi.ft.com%2Fsystem%2FFACTSET\
             &identifierValue=a&identifierValue=b&other=x",
        );
        assert_eq!(params.concept_ids, None);
        assert_eq!(params.authorities, Some(vec!["http://api.ft.com/system/FACTSET".to_string()]));
        assert_eq!(params.identifier_values, vec!["a", "b"]);
    }

    #[test]
    fn concept_ids_accept_uuid_or_thing_uri() {
        let request = ConcordanceParams::from_query(&format!(
            "conceptId={BRAND}&conceptId=http://api.ft.com/things/{BRAND}"
        ))
        .validate()
        .unwrap();
        let uuid = Uuid::parse_str(BRAND).unwrap();
        assert_eq!(request, ConcordanceRequest::ByConceptId(vec![uuid, uuid]));
    }

    #[test]
    fn invalid_concept_id() {
        let err = ConcordanceParams::from_query("conceptId=not-a-uuid").validate().unwrap_err();
        assert_eq!(message(err), "Invalid conceptId: not-a-uuid");
    }

    #[test]
    fn parameter_rules() {
        let cases = [
            ("conceptId=x&authority=y", BOTH_PARAMETERS),
            ("", NO_PARAMETERS),
            ("identifierValue=v", NO_PARAMETERS),
            ("authority=a&authority=b&identifierValue=v", MULTIPLE_AUTHORITIES),
            ("authority=a", MISSING_IDENTIFIER_VALUE),
        ];
        for (query, expected) in cases {
            let err = ConcordanceParams::from_query(query).validate().unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{query}");
            assert_eq!(message(err), expected, "{query}");
        }
    }

    #[test]
    fn authority_request() {
        let request =
            ConcordanceParams::from_query("authority=A&identifierValue=v1&identifierValue=v2")
                .validate()
            .unwrap();
        assert_eq!(
            request,
            ConcordanceRequest::ByAuthority {
                authority: "A".into(),
                values: vec!["v1".into(), "v2".into()],
            }
        );
    }

    #[test]
    fn post_body_shapes() {
        let single: ConcordanceParams = serde_json::from_str(
            r#"{"authority": "A", "identifierValue": ["v"]}"#,
        )
        .unwrap();
        assert_eq!(single.authorities, Some(vec!["A".to_string()]));

        let many: ConcordanceParams =
            serde_json::from_str(r#"{"authority": ["A", "B"], "identifierValue": ["v"]}"#).unwrap();
        assert_eq!(message(many.validate().unwrap_err()), MULTIPLE_AUTHORITIES);

        let ids: ConcordanceParams =
            serde_json::from_str(&format!(r#"{{"conceptId": ["{BRAND}"]}}"#)).unwrap();
        assert!(matches!(
            ids.validate().unwrap(),
            ConcordanceRequest::ByConceptId(v) if v.len() == 1
        ));
    }
}
