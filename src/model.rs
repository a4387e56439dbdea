//! Response model
//!
//! JSON shape of `GET /concordances`:
//!
//! ```json
//! {"concordances": [
//!   {"concept": {"id": "http://api.ft.com/things/<uuid>",
//!                "apiUrl": "http://api.ft.com/brands/<uuid>"},
//!    "identifier": {"authority": "http://api.ft.com/system/FT-TME", "identifierValue": "..."}}
//! ]}
//! ```

use serde::{Deserialize, Serialize};

/// Prefix of a concept's thing URI. Also stripped from incoming `conceptId`s.
pub const THING_URI_PREFIX: &str = "http://api.ft.com/things/";

/// Concept view: canonical identity plus the API URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    #[serde(rename = "apiUrl")]
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub authority: String,
    #[serde(rename = "identifierValue")]
    pub identifier_value: String,
}

/// Exactly one concept view paired with exactly one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Concordance {
    pub concept: Concept,
    pub identifier: Identifier,
}

/// Wrapper matching the public JSON envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concordances {
    pub concordances: Vec<Concordance>,
}

impl From<Vec<Concordance>> for Concordances {
    fn from(concordances: Vec<Concordance>) -> Self {
        Self { concordances }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialises_public_shape() {
        let body = Concordances::from(vec![Concordance {
            concept: Concept {
                id: format!("{THING_URI_PREFIX}abc"),
                api_url: "http://api.ft.com/brands/abc".into(),
            },
            identifier: Identifier {
                authority: "http://api.ft.com/system/UPP".into(),
                identifier_value: "abc".into(),
            },
        }]);

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"concordances": [{
                "concept": {
                    "id": "http://api.ft.com/things/abc",
                    "apiUrl": "http://api.ft.com/brands/abc"
                },
                "identifier": {
                    "authority": "http://api.ft.com/system/UPP",
                    "identifierValue": "abc"
                }
            }]})
        );
    }

    #[test]
    fn empty_result_serialises_empty_list() {
        assert_eq!(
            serde_json::to_value(Concordances::default()).unwrap(),
            json!({"concordances": []})
        );
    }
}
