use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_EVENT_TYPE: &str = "wedding";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i32,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Page colours and motion, stored exactly as the admin UI sent it. The
/// defaults only apply when a page is created without a theme at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub Map<String, Value>);

impl Default for Theme {
    fn default() -> Self {
        Self(object([
            ("primaryColor", Value::from("#9B7EDE")),
            ("secondaryColor", Value::from("#E8D5FF")),
            ("animationsEnabled", Value::Bool(true)),
        ]))
    }
}

/// Which blocks of the public page are rendered. Same storage rules as
/// [`Theme`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sections(pub Map<String, Value>);

impl Default for Sections {
    fn default() -> Self {
        Self(object(
            ["header", "story", "gallery", "wishes", "contribution"]
                .map(|key| (key, Value::Bool(true))),
        ))
    }
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Celebration {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub slug: String,
    pub event_type: String,
    pub event_date: Option<NaiveDate>,
    pub story: Option<String>,
    pub cover_image: Option<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub qr_image: Option<String>,
    pub spotify_code: Option<String>,
    pub money_collection_enabled: bool,
    pub theme: Theme,
    pub sections: Sections,
    pub quotes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Celebration {
    /// Every hosted media URL the page points at, in page order, without
    /// duplicates.
    pub fn media_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        let candidates = self
            .cover_image
            .iter()
            .chain(self.images.iter())
            .chain(self.qr_image.iter())
            .chain(self.spotify_code.iter())
            .chain(self.videos.iter());

        for url in candidates {
            let url = url.trim();
            if !url.is_empty() && !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub id: i32,
    pub celebration_id: i32,
    pub name: String,
    pub message: String,
    pub amount: Option<Decimal>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelebrationRef {
    pub title: String,
    pub slug: String,
}

/// Admin moderation view: the wish plus a pointer to the page it was left on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishWithCelebration {
    #[serde(flatten)]
    pub wish: Wish,
    pub celebration: Option<CelebrationRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn theme_is_kept_verbatim() {
        let raw = json!({
            "primaryColor": null,
            "animationsEnabled": "true",
            "fontFamily": "Playfair Display"
        });

        let theme: Theme = serde_json::from_value(raw.clone()).unwrap();
        assert!(!theme.0.contains_key("secondaryColor"));
        assert_eq!(serde_json::to_value(&theme).unwrap(), raw);
    }

    #[test]
    fn defaults_match_the_schema() {
        assert_eq!(
            serde_json::to_value(Theme::default()).unwrap(),
            json!({
                "primaryColor": "#9B7EDE",
                "secondaryColor": "#E8D5FF",
                "animationsEnabled": true
            })
        );
        assert_eq!(
            serde_json::to_value(Sections::default()).unwrap(),
            json!({
                "header": true,
                "story": true,
                "gallery": true,
                "wishes": true,
                "contribution": true
            })
        );
    }

    #[test]
    fn media_urls_skip_blanks_and_duplicates() {
        let now = Utc::now();
        let celebration = Celebration {
            id: 1,
            title: "Ana & Ben".into(),
            subtitle: None,
            slug: "ana-ben".into(),
            event_type: DEFAULT_EVENT_TYPE.into(),
            event_date: None,
            story: None,
            cover_image: Some("https://a/cover.jpg".into()),
            images: vec!["https://a/cover.jpg".into(), "https://a/1.jpg".into(), " ".into()],
            videos: vec!["https://a/v.mp4".into()],
            qr_image: Some("https://a/qr.png".into()),
            spotify_code: None,
            money_collection_enabled: false,
            theme: Theme::default(),
            sections: Sections::default(),
            quotes: vec![],
            created_at: now,
            updated_at: now,
        };

        assert_eq!(
            celebration.media_urls(),
            vec!["https://a/cover.jpg", "https://a/1.jpg", "https://a/qr.png", "https://a/v.mp4"]
        );
    }
}
