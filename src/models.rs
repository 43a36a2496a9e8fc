use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub clicks: i64,
}

impl Link {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Link> {
        Ok(Link {
            id: row.get("id")?,
            title: row.get("title")?,
            url: row.get("url")?,
            created_at: row.get("created_at")?,
            views: row.get("views")?,
            clicks: row.get("clicks")?,
        })
    }
}

/// Title and target of a link as submitted by the admin.
#[derive(Debug)]
pub struct NewLink<'a> {
    pub title: &'a str,
    pub url: &'a str,
}

impl<'a> NewLink<'a> {
    /// Trims both fields and refuses empty ones.
    pub fn new(title: &'a str, url: &'a str) -> Result<NewLink<'a>, &'static str> {
        let title = title.trim();
        let url = url.trim();

        if title.is_empty() {
            return Err("title");
        }
        if url.is_empty() {
            return Err("url");
        }

        Ok(NewLink { title, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_link_trims_fields() {
        let link = NewLink::new("  Docs ", " http://example.com/docs\n").unwrap();
        assert_eq!(link.title, "Docs");
        assert_eq!(link.url, "http://example.com/docs");
    }

    #[test]
    fn new_link_rejects_blank_fields() {
        assert_eq!(NewLink::new("   ", "http://example.com").unwrap_err(), "title");
        assert_eq!(NewLink::new("Docs", "").unwrap_err(), "url");
    }

    #[test]
    fn legacy_records_default_counters() {
        let json = r#"{"id":1,"title":"Docs","url":"http://example.com","created_at":"2024-01-01T00:00:00Z"}"#;
        let link: Link = serde_json::from_str(json).unwrap();
        assert_eq!(link.views, 0);
        assert_eq!(link.clicks, 0);
    }
}
