//! Per-offset ESG detail record served by `GET /esg`.

use serde::{Deserialize, Serialize};

use crate::offset::Nft;

/// A credential entry; `value` is either text or nested entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgMrv {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub value: EsgValue,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub schema_cid: String,
    #[serde(default)]
    pub schema_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EsgValue {
    Text(String),
    Nested(Vec<EsgMrv>),
}

/// `GET /esg?token_id=..&serial_number=..` response. Prices are cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgDetailsResponse {
    pub request: Nft,
    pub actual_owner: String,
    pub retail_price: f64,
    pub min_arm_price: f64,
    pub max_arm_price: f64,
    pub project_category: String,
    pub project_type: String,
    pub project_name: String,
    pub project_country: String,
    pub project_region: String,
    pub vintage: String,
    #[serde(default)]
    pub credential_subjects: Vec<EsgMrv>,
}

impl EsgDetailsResponse {
    /// Depth-first lookup of a credential by title.
    pub fn credential(&self, title: &str) -> Option<&EsgMrv> {
        fn find<'a>(entries: &'a [EsgMrv], title: &str) -> Option<&'a EsgMrv> {
            entries.iter().find_map(|entry| {
                if entry.title == title {
                    return Some(entry);
                }
                match &entry.value {
                    EsgValue::Nested(children) => find(children, title),
                    EsgValue::Text(_) => None,
                }
            })
        }
        find(&self.credential_subjects, title)
    }
}
