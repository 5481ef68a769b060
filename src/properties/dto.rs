use serde::{Deserialize, Serialize};

use super::{repo_types::Property, workflow::BrowseFilter};

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub categories: Option<String>,
}

fn present(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl From<BrowseQuery> for BrowseFilter {
    fn from(q: BrowseQuery) -> Self {
        BrowseFilter {
            city: present(q.city),
            kind: present(q.kind),
            categories: present(q.categories),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyIdQuery {
    pub property_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPropertyResponse {
    pub saved_property: Property,
}

#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub property: Property,
}

#[derive(Debug, Serialize)]
pub struct DeletedPropertyResponse {
    pub success: &'static str,
    pub property: Property,
}

#[derive(Debug, Serialize)]
pub struct ApprovedPropertyResponse {
    pub message: &'static str,
    pub property: Property,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_browse_params_are_ignored() {
        let filter: BrowseFilter = BrowseQuery {
            city: Some("  ".into()),
            kind: Some("Villa".into()),
            categories: None,
        }
        .into();
        assert_eq!(filter.city, None);
        assert_eq!(filter.kind.as_deref(), Some("Villa"));
        assert_eq!(filter.categories, None);
    }
}
