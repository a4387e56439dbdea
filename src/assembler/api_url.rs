//! Type labels -> API URL
//!
//! Concept nodes carry their whole type ancestry as labels, e.g.
//! `[Thing, Concept, Organisation, Company, PublicCompany]`. The most specific
//! label is walked up the hierarchy until a type with its own API route is
//! found; `Thing` always has one, so every well-formed label set maps.

/// (type, parent, route segment)
type TypeEntry = (&'static str, Option<&'static str>, Option<&'static str>);

static TYPE_HIERARCHY: &[TypeEntry] = &[
    ("Thing", None, Some("things")),
    ("Concept", Some("Thing"), Some("things")),
    ("Classification", Some("Concept"), None),
    ("Section", Some("Classification"), None),
    ("Subject", Some("Classification"), None),
    ("SpecialReport", Some("Classification"), None),
    ("Genre", Some("Classification"), None),
    ("AlphavilleSeries", Some("Classification"), None),
    ("Brand", Some("Classification"), Some("brands")),
    ("Topic", Some("Concept"), None),
    ("Location", Some("Concept"), None),
    ("Person", Some("Concept"), Some("people")),
    ("Organisation", Some("Concept"), Some("organisations")),
    ("Company", Some("Organisation"), None),
    ("PublicCompany", Some("Company"), None),
    ("PrivateCompany", Some("Company"), None),
    ("Membership", Some("Concept"), Some("memberships")),
    ("Role", Some("Concept"), Some("roles")),
    ("BoardRole", Some("Role"), None),
    ("MembershipRole", Some("Role"), None),
    ("FinancialInstrument", Some("Concept"), None),
    ("IndustryClassification", Some("Concept"), None),
    ("NAICSIndustryClassification", Some("IndustryClassification"), None),
];

fn lookup(name: &str) -> Option<&'static TypeEntry> {
    TYPE_HIERARCHY.iter().find(|(t, _, _)| *t == name)
}

fn parent(name: &str) -> Option<&'static str> {
    lookup(name).and_then(|(_, parent, _)| *parent)
}

fn is_ancestor_or_self(ancestor: &str, of: &str) -> bool {
    let mut current = Some(of);
    while let Some(t) = current {
        if t == ancestor {
            return true;
        }
        current = parent(t);
    }
    false
}

/// The single known label every other known label is an ancestor of.
/// Unknown labels are ignored. `None` when no label is known or the known
/// labels sit on different branches.
pub fn most_specific_type<S: AsRef<str>>(labels: &[S]) -> Option<&'static str> {
    let known: Vec<&'static str> = labels
        .iter()
        .filter_map(|l| lookup(l.as_ref()).map(|(t, _, _)| *t))
        .collect();

    known
        .iter()
        .copied()
        .find(|candidate| known.iter().all(|k| is_ancestor_or_self(k, candidate)))
}

/// Route segment for a label set, e.g. `organisations`.
pub fn api_route<S: AsRef<str>>(labels: &[S]) -> Option<&'static str> {
    let mut current = Some(most_specific_type(labels)?);
    while let Some(t) = current {
        if let Some((_, _, Some(route))) = lookup(t) {
            return Some(*route);
        }
        current = parent(t);
    }
    None
}

/// Builds API URLs for one deployment environment.
#[derive(Debug, Clone)]
pub struct ApiUrls {
    base: String,
}

impl ApiUrls {
    pub fn for_env(env: &str) -> Self {
        let base = match env {
            "test" => "http://test.api.ft.com",
            _ => "http://api.ft.com",
        };
        Self {
            base: base.to_string(),
        }
    }

    pub fn api_url<S: AsRef<str>>(&self, uuid: &str, labels: &[S]) -> Option<String> {
        api_route(labels).map(|route| format!("{}/{route}/{uuid}", self.base))
    }
}
