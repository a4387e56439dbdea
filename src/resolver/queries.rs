//! Cypher used by the resolver.
//!
//! Graph shape:
//!
//! ```text
//! (leaf:Thing:Concept {uuid, authority, authorityValue})
//!     -[:EQUIVALENT_TO]->(canonical:Concept {prefUUID, leiCode, iso31661})
//!
//! (:Identifier:FactsetIdentifier {value})-[:IDENTIFIES]->(legacy:Thing {uuid})
//! ```
//!
//! Every statement returns `types` for the API URL and both `uuid` and
//! `canonicalUUID`, so the assembler can prefer the group identity.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::store::GraphQuery;

pub const UUID_COUNTS: &str = "concept_uuid_counts";
pub const EQUIVALENCE_WALK: &str = "equivalence_walk";
pub const IDENTIFIER_WALK: &str = "identifier_node_walk";
pub const CONCEPTS_BY_UUID: &str = "concepts_by_uuid";
pub const CONCEPTS_BY_AUTHORITY_PROPERTY: &str = "concepts_by_authority_property";
pub const IDENTIFIERS_BY_LABEL: &str = "identifiers_by_label";
pub const CANONICALS_BY_PROPERTY: &str = "canonicals_by_property";

// Walks from the requested node to every member of its equivalence group, or
// to the node alone when it is unconcorded. The sibling hop is its own clause:
// within one pattern Cypher matches a relationship at most once, which would
// keep `p` from ever being its own sibling.
const WALK: &str = "\
MATCH (p:Thing)
WHERE p.uuid IN $uuids
OPTIONAL MATCH (p)-[:EQUIVALENT_TO]->(canonical:Concept)
OPTIONAL MATCH (canonical)<-[:EQUIVALENT_TO]-(sibling:Thing)
WITH coalesce(sibling, p) AS member, canonical";

/// Number of `Thing` nodes per requested UUID.
pub fn uuid_counts(uuids: &[String]) -> GraphQuery {
    GraphQuery::new(
        UUID_COUNTS,
        "\
MATCH (t:Thing)
WHERE t.uuid IN $uuids
RETURN t.uuid AS uuid, count(t) AS nodes",
    )
    .param("uuids", uuids.to_vec())
}

/// Every member of the requested concepts' equivalence groups.
pub fn equivalence_walk(uuids: &[String]) -> GraphQuery {
    GraphQuery::new(
        EQUIVALENCE_WALK,
        format!(
            "{WALK}
RETURN DISTINCT
    member.uuid AS uuid,
    canonical.prefUUID AS canonicalUUID,
    coalesce(labels(canonical), labels(member)) AS types,
    member.authority AS authority,
    member.authorityValue AS authorityValue,
    coalesce(properties(canonical), {{}}) AS canonicalProperties"
        ),
    )
    .param("uuids", uuids.to_vec())
}

/// Legacy identifier nodes attached to any member of the groups.
pub fn identifier_walk(uuids: &[String]) -> GraphQuery {
    GraphQuery::new(
        IDENTIFIER_WALK,
        format!(
            "{WALK}
MATCH (member)<-[:IDENTIFIES]-(i:Identifier)
RETURN DISTINCT
    member.uuid AS uuid,
    canonical.prefUUID AS canonicalUUID,
    coalesce(labels(canonical), labels(member)) AS types,
    labels(i) AS identifierLabels,
    i.value AS value"
        ),
    )
    .param("uuids", uuids.to_vec())
}

/// DERIVED_FROM_UUID: the value is the concept's own UUID.
pub fn concepts_by_uuid(values: &[String]) -> GraphQuery {
    GraphQuery::new(
        CONCEPTS_BY_UUID,
        "\
MATCH (p:Thing)
WHERE p.uuid IN $values
OPTIONAL MATCH (p)-[:EQUIVALENT_TO]->(canonical:Concept)
RETURN DISTINCT
    p.uuid AS uuid,
    canonical.prefUUID AS canonicalUUID,
    coalesce(labels(canonical), labels(p)) AS types,
    p.uuid AS value",
    )
    .param("values", values.to_vec())
}

/// PROPERTY_LOOKUP: leaf concepts tagged with the authority.
pub fn concepts_by_authority_property(authority: &str, values: &[String]) -> GraphQuery {
    GraphQuery::new(
        CONCEPTS_BY_AUTHORITY_PROPERTY,
        "\
MATCH (p:Concept)
WHERE p.authority = $authority AND p.authorityValue IN $values
OPTIONAL MATCH (p)-[:EQUIVALENT_TO]->(canonical:Concept)
RETURN DISTINCT
    p.uuid AS uuid,
    canonical.prefUUID AS canonicalUUID,
    coalesce(labels(canonical), labels(p)) AS types,
    p.authorityValue AS value",
    )
    .param("authority", authority)
    .param("values", values.to_vec())
}

/// LABEL_LOOKUP: legacy identifier nodes. Labels cannot be parameterised in
/// Cypher, so the label (always a registry constant) is inlined.
pub fn identifiers_by_label(label: &'static str, values: &[String]) -> GraphQuery {
    GraphQuery::new(
        IDENTIFIERS_BY_LABEL,
        format!(
            "\
MATCH (i:Identifier:`{label}`)
WHERE i.value IN $values
MATCH (i)-[:IDENTIFIES]->(p:Thing)
OPTIONAL MATCH (p)-[:EQUIVALENT_TO]->(canonical:Concept)
RETURN DISTINCT
    p.uuid AS uuid,
    canonical.prefUUID AS canonicalUUID,
    coalesce(labels(canonical), labels(p)) AS types,
    i.value AS value"
        ),
    )
    .with_label(label)
    .param("values", values.to_vec())
}

/// DIRECT_PROPERTY_ON_CANONICAL: codes stored on the canonical node itself.
pub fn canonicals_by_property(property: &str, values: &[String]) -> GraphQuery {
    GraphQuery::new(
        CANONICALS_BY_PROPERTY,
        "\
MATCH (canonical:Concept)
WHERE canonical.prefUUID IS NOT NULL AND canonical[$property] IN $values
RETURN DISTINCT
    canonical.prefUUID AS uuid,
    canonical.prefUUID AS canonicalUUID,
    labels(canonical) AS types,
    canonical[$property] AS value",
    )
    .param("property", property)
    .param("values", values.to_vec())
}

// ============================================================================
// Row shapes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UuidCountRow {
    pub uuid: String,
    pub nodes: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    pub uuid: String,
    #[serde(rename = "canonicalUUID")]
    pub canonical_uuid: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub authority: Option<String>,
    pub authority_value: Option<String>,
    #[serde(default)]
    pub canonical_properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierRow {
    pub uuid: String,
    #[serde(rename = "canonicalUUID")]
    pub canonical_uuid: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub identifier_labels: Vec<String>,
    pub value: String,
}

/// Shared shape of all authority lookups.
#[derive(Debug, Deserialize)]
pub struct LookupRow {
    pub uuid: Option<String>,
    #[serde(rename = "canonicalUUID")]
    pub canonical_uuid: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_is_inlined_and_values_parameterised() {
        let q = identifiers_by_label("FactsetIdentifier", &["003JLG-E".to_string()]);
        assert!(q.statement.contains("(i:Identifier:`FactsetIdentifier`)"));
        assert_eq!(q.label, Some("FactsetIdentifier"));
        assert_eq!(q.list_param("values"), vec!["003JLG-E"]);
        assert!(q.str_param("label").is_none());
        assert!(!q.statement.contains("003JLG-E"));
    }

    #[test]
    fn walk_binds_canonical_before_siblings_in_separate_clauses() {
        let statement = equivalence_walk(&["u".to_string()]).statement;
        let clauses: Vec<&str> = statement
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("OPTIONAL MATCH"))
            .collect();
        assert_eq!(
            clauses,
            vec![
                "OPTIONAL MATCH (p)-[:EQUIVALENT_TO]->(canonical:Concept)",
                "OPTIONAL MATCH (canonical)<-[:EQUIVALENT_TO]-(sibling:Thing)",
            ]
        );
        assert!(!statement.contains("(canonical:Concept)<-"));
    }

    #[test]
    fn walks_share_the_group_traversal() {
        let uuids = vec!["u".to_string()];
        for q in [equivalence_walk(&uuids), identifier_walk(&uuids)] {
            assert!(q.statement.contains("coalesce(sibling, p) AS member"));
            assert_eq!(q.list_param("uuids"), vec!["u"]);
        }
        assert!(equivalence_walk(&uuids)
            .statement
            .contains("coalesce(properties(canonical), {}) AS canonicalProperties"));
    }

    #[test]
    fn member_row_tolerates_missing_optional_columns() {
        let row: MemberRow = serde_json::from_value(json!({
            "uuid": "u",
            "canonicalUUID": null,
            "types": ["Thing", "Concept"],
            "authority": null,
            "authorityValue": null,
            "canonicalProperties": null
        }))
        .unwrap();
        assert_eq!(row.uuid, "u");
        assert!(row.canonical_uuid.is_none());
        assert!(row.canonical_properties.is_none());

        let sparse: MemberRow =
            serde_json::from_value(json!({"uuid": "u", "types": ["Thing"]})).unwrap();
        assert!(sparse.authority.is_none());
    }
}
