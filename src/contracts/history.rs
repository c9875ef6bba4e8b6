use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire value both mock services treat as "match every entry".
pub const MATCH_ANY_SENTINEL: i64 = -1;

/// History filter for a single field.
///
/// `Any` goes over the wire as `-1`. On the way in, both `-1` and a `null` or
/// absent field decode to `Any`, so the two encodings always select the same
/// entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Match<T> {
    Any,
    Exact(T),
}

impl<T> Default for Match<T> {
    fn default() -> Self {
        Match::Any
    }
}

impl<T: PartialEq> Match<T> {
    /// Returns true if `value` passes this filter.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Match::Any => true,
            Match::Exact(expected) => expected == value,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Match<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Match::Any => f.write_str("any"),
            Match::Exact(value) => value.fmt(f),
        }
    }
}

impl<T: Serialize> Serialize for Match<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Match::Any => serializer.serialize_i64(MATCH_ANY_SENTINEL),
            Match::Exact(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: TryFrom<i128>> Deserialize<'de> for Match<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<i128>::deserialize(deserializer)? {
            None => Ok(Match::Any),
            Some(v) if v == i128::from(MATCH_ANY_SENTINEL) => Ok(Match::Any),
            Some(v) => T::try_from(v)
                .map(Match::Exact)
                .map_err(|_| D::Error::custom(format!("filter value {} out of range", v))),
        }
    }
}

/// What the mock service deletes after answering a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryDeleteOption {
    #[default]
    DeleteNothing,
    #[serde(alias = "DELETE_SEQNR_ENTRY")]
    DeleteQueriedHistory,
    DeleteFullHistory,
}

/// One OCSP request received by the mock OCSP responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcspRequestHistoryEntry {
    pub tsl_seq_nr: u64,
    pub cert_serial_nr: u128,
    pub timestamp: String,
    /// DER bytes of the OCSP request as received.
    #[serde(with = "base64_bytes", default)]
    pub request: Vec<u8>,
}

/// The four download routes of the mock TSL provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TslDownloadPoint {
    XmlPrimary,
    XmlBackup,
    HashPrimary,
    HashBackup,
}

impl TslDownloadPoint {
    pub const ALL: [TslDownloadPoint; 4] = [
        TslDownloadPoint::XmlPrimary,
        TslDownloadPoint::XmlBackup,
        TslDownloadPoint::HashPrimary,
        TslDownloadPoint::HashBackup,
    ];

    pub fn is_xml(self) -> bool {
        matches!(self, TslDownloadPoint::XmlPrimary | TslDownloadPoint::XmlBackup)
    }

    pub fn is_primary(self) -> bool {
        matches!(self, TslDownloadPoint::XmlPrimary | TslDownloadPoint::HashPrimary)
    }
}

/// A set of download routes a piece of download evidence may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadEndpointSet {
    AnyEndpoint,
    #[default]
    XmlEndpoints,
    HashEndpoints,
    PrimaryEndpoints,
    BackupEndpoints,
    Only(TslDownloadPoint),
}

impl DownloadEndpointSet {
    pub fn contains(self, point: TslDownloadPoint) -> bool {
        match self {
            DownloadEndpointSet::AnyEndpoint => true,
            DownloadEndpointSet::XmlEndpoints => point.is_xml(),
            DownloadEndpointSet::HashEndpoints => !point.is_xml(),
            DownloadEndpointSet::PrimaryEndpoints => point.is_primary(),
            DownloadEndpointSet::BackupEndpoints => !point.is_primary(),
            DownloadEndpointSet::Only(only) => only == point,
        }
    }
}

/// One TSL download served by the mock TSL provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TslRequestHistoryEntry {
    pub tsl_seq_nr: u64,
    pub endpoint: TslDownloadPoint,
    pub was_compressed: bool,
    pub protocol: String,
}

/// Body of `POST /info` on the mock OCSP responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcspHistoryQuery {
    #[serde(default)]
    pub tsl_seq_nr: Match<u64>,
    #[serde(default)]
    pub cert_serial_nr: Match<u128>,
    #[serde(default)]
    pub history_delete_option: HistoryDeleteOption,
}

impl OcspHistoryQuery {
    pub fn matches(&self, entry: &OcspRequestHistoryEntry) -> bool {
        self.tsl_seq_nr.matches(&entry.tsl_seq_nr)
            && self.cert_serial_nr.matches(&entry.cert_serial_nr)
    }
}

/// Body of `POST /info` on the mock TSL provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TslHistoryQuery {
    #[serde(default)]
    pub sequence_nr: Match<u64>,
    #[serde(default)]
    pub history_delete_option: HistoryDeleteOption,
}

impl TslHistoryQuery {
    pub fn matches(&self, entry: &TslRequestHistoryEntry) -> bool {
        self.sequence_nr.matches(&entry.tsl_seq_nr)
    }
}

/// Serde adapter carrying binary fields as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
