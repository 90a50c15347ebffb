//! Banner Model

use serde::{Deserialize, Serialize};

/// Homepage banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// Stored image path (object-store key)
    pub image_path: String,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    /// Shown from this instant (inclusive, millis)
    pub starts_at: Option<i64>,
    /// Hidden from this instant (exclusive, millis)
    pub ends_at: Option<i64>,
}

impl Banner {
    /// Active and inside its schedule window at `now`.
    pub fn is_live(&self, now: i64) -> bool {
        self.is_active
            && self.starts_at.is_none_or(|s| s <= now)
            && self.ends_at.is_none_or(|e| now < e)
    }
}

/// Create banner payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerCreate {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_path: String,
    pub link_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
}

/// Update banner payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BannerUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub subtitle: Option<Option<String>>,
    pub image_path: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub link_url: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub starts_at: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub ends_at: Option<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner(starts_at: Option<i64>, ends_at: Option<i64>) -> Banner {
        Banner {
            id: "b1".into(),
            title: "Rebajas".into(),
            subtitle: None,
            image_path: "banners/rebajas.jpg".into(),
            link_url: None,
            sort_order: 0,
            is_active: true,
            starts_at,
            ends_at,
        }
    }

    #[test]
    fn test_is_live_window() {
        let b = banner(Some(100), Some(200));
        assert!(!b.is_live(99));
        assert!(b.is_live(100));
        assert!(b.is_live(199));
        assert!(!b.is_live(200));
    }

    #[test]
    fn test_open_ended_and_inactive() {
        assert!(banner(None, None).is_live(0));
        assert!(banner(Some(10), None).is_live(1_000_000));

        let mut b = banner(None, None);
        b.is_active = false;
        assert!(!b.is_live(0));
    }

    #[test]
    fn test_update_can_clear_schedule() {
        let json = r#"{"starts_at": null, "ends_at": 500, "title": "Verano"}"#;
        let update: BannerUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.starts_at, Some(None));
        assert_eq!(update.ends_at, Some(Some(500)));
        assert_eq!(update.subtitle, None);
    }
}
