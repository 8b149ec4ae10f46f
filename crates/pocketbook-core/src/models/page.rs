use serde::{Deserialize, Serialize};

/// One page of a server-side paginated collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "totalElements")]
    pub total_elements: i64,
    /// Zero-based page index.
    pub number: i64,
    pub size: i64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

impl PageRequest {
    pub(crate) fn push_query(&self, query: &mut Vec<(String, String)>) {
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size".to_string(), size.to_string()));
        }
        if let Some(ref sort) = self.sort {
            query.push(("sort".to_string(), sort.clone()));
        }
    }
}
