//! Authority Registry
//!
//! Declarative table mapping external authority URIs to the ways the graph
//! stores identifiers issued by that authority. An authority can carry more
//! than one representation at once (legacy identifier-node labels next to the
//! modern `authority` property) while data is migrated between models.
//!
//! The table is a `'static` slice: immutable after compile time and freely
//! shared between any number of readers.

use std::fmt;

/// Prefix shared by every authority URI.
pub const AUTHORITY_URI_PREFIX: &str = "http://api.ft.com/system/";

pub const UPP: &str = "http://api.ft.com/system/UPP";
pub const LEI: &str = "http://api.ft.com/system/LEI";
pub const ISO_3166_1: &str = "http://api.ft.com/system/ISO-3166-1";
pub const FACTSET: &str = "http://api.ft.com/system/FACTSET";
pub const TME: &str = "http://api.ft.com/system/FT-TME";
pub const SMARTLOGIC: &str = "http://api.ft.com/system/SMARTLOGIC";
pub const MANAGED_LOCATION: &str = "http://api.ft.com/system/MANAGEDLOCATION";
pub const GEONAMES: &str = "http://api.ft.com/system/GEONAMES";
pub const WIKIDATA: &str = "http://api.ft.com/system/WIKIDATA";
pub const DBPEDIA: &str = "http://api.ft.com/system/DBPEDIA";

/// Lookup strategy tag for one internal representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupStrategy {
    PropertyLookup,
    LabelLookup,
    DirectPropertyOnCanonical,
    DerivedFromUuid,
}

/// How identifiers of one authority are materialised in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Leaf concept node with `authority = <value>` and `authorityValue`.
    Property(&'static str),
    /// Legacy `Identifier` node carrying this extra label, linked by `IDENTIFIES`.
    Label(&'static str),
    /// Property set directly on the canonical concept node.
    CanonicalProperty(&'static str),
    /// The identifier value is the concept's own UUID.
    DerivedFromUuid,
}

impl Representation {
    pub fn strategy(&self) -> LookupStrategy {
        match self {
            Representation::Property(_) => LookupStrategy::PropertyLookup,
            Representation::Label(_) => LookupStrategy::LabelLookup,
            Representation::CanonicalProperty(_) => LookupStrategy::DirectPropertyOnCanonical,
            Representation::DerivedFromUuid => LookupStrategy::DerivedFromUuid,
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Property(p) => write!(f, "property:{p}"),
            Representation::Label(l) => write!(f, "label:{l}"),
            Representation::CanonicalProperty(p) => write!(f, "canonical:{p}"),
            Representation::DerivedFromUuid => write!(f, "uuid"),
        }
    }
}

/// One row of the registry table.
#[derive(Debug, Clone, Copy)]
pub struct AuthorityEntry {
    pub uri: &'static str,
    pub representations: &'static [Representation],
}

use Representation::*;

static AUTHORITIES: &[AuthorityEntry] = &[
    AuthorityEntry {
        uri: UPP,
        representations: &[DerivedFromUuid, Label("UPPIdentifier")],
    },
    AuthorityEntry {
        uri: LEI,
        representations: &[CanonicalProperty("leiCode"), Label("LEIIdentifier")],
    },
    AuthorityEntry {
        uri: ISO_3166_1,
        representations: &[CanonicalProperty("iso31661")],
    },
    AuthorityEntry {
        uri: FACTSET,
        representations: &[Property("FACTSET"), Label("FactsetIdentifier")],
    },
    AuthorityEntry {
        uri: TME,
        representations: &[Property("TME"), Label("TMEIdentifier")],
    },
    AuthorityEntry {
        uri: SMARTLOGIC,
        representations: &[Property("Smartlogic")],
    },
    AuthorityEntry {
        uri: MANAGED_LOCATION,
        representations: &[Property("ManagedLocation")],
    },
    AuthorityEntry {
        uri: GEONAMES,
        representations: &[Property("Geonames")],
    },
    AuthorityEntry {
        uri: WIKIDATA,
        representations: &[Property("Wikidata")],
    },
    AuthorityEntry {
        uri: DBPEDIA,
        representations: &[Property("DBPedia")],
    },
];

/// Read-only view over the authority table.
#[derive(Debug, Clone, Copy)]
pub struct AuthorityRegistry {
    entries: &'static [AuthorityEntry],
}

impl Default for AuthorityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorityRegistry {
    pub fn new() -> Self {
        Self {
            entries: AUTHORITIES,
        }
    }

    pub fn entries(&self) -> &'static [AuthorityEntry] {
        self.entries
    }

    /// Look up the registry row for an authority URI.
    pub fn entry(&self, uri: &str) -> Option<&'static AuthorityEntry> {
        self.entries.iter().find(|e| e.uri == uri)
    }

    /// Every internal representation of `uri`, or `None` when unsupported.
    pub fn to_internal(&self, uri: &str) -> Option<&'static [Representation]> {
        self.entry(uri).map(|e| e.representations)
    }

    /// The authority URI owning an internal representation.
    pub fn to_external(&self, key: &Representation) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.representations.contains(key))
            .map(|e| e.uri)
    }

    /// Resolve a modern `authority` property value.
    pub fn from_property(&self, value: &str) -> Option<&'static str> {
        self.entries.iter().find_map(|e| {
            e.representations
                .iter()
                .any(|r| matches!(r, Property(p) if *p == value))
                .then_some(e.uri)
        })
    }

    /// Resolve a legacy identifier node's label set. Generic labels such as
    /// `Identifier` are skipped; the first registered label wins.
    pub fn from_labels<S: AsRef<str>>(&self, labels: &[S]) -> Option<&'static str> {
        labels.iter().find_map(|label| {
            let label = label.as_ref();
            self.entries.iter().find_map(|e| {
                e.representations
                    .iter()
                    .any(|r| matches!(r, Label(l) if *l == label))
                    .then_some(e.uri)
            })
        })
    }

    /// Properties carried on canonical nodes, paired with their authority.
    pub fn canonical_properties(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.entries.iter().flat_map(|e| {
            e.representations.iter().filter_map(move |r| match r {
                CanonicalProperty(p) => Some((*p, e.uri)),
                _ => None,
            })
        })
    }
}
