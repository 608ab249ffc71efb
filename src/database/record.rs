use serde::Serialize;

/// One catalog item as it goes over the wire. Built transiently from a
/// database row per request, never persisted or cached.
///
/// `name` and `short_desc` are guaranteed non-null by the query's WHERE
/// clause; the record trusts its producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    pub id: String,
    #[serde(rename = "title")]
    pub name: String,
    #[serde(rename = "description")]
    pub short_desc: String,
    #[serde(rename = "tags", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl CatalogRecord {
    /// Normalize raw row values: trim surrounding whitespace, format the id
    /// as a decimal string, and collapse empty-after-trim keywords to `None`.
    pub fn from_row(id: i64, name: String, short_desc: String, keywords: Option<String>) -> Self {
        let keywords = keywords
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            id: id.to_string(),
            name: name.trim().to_string(),
            short_desc: short_desc.trim().to_string(),
            keywords,
        }
    }
}
