//! Gallery content as served by the CMS export.

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub background_image: Option<Media>,
    #[serde(default)]
    pub background_color: Option<String>,
}

impl Post {
    /// Image path; posts without one yield an empty path, which fails to load.
    pub fn image_url(&self) -> &str {
        self.background_image
            .as_ref()
            .and_then(|media| media.url.as_deref())
            .unwrap_or("")
    }

    pub fn path(&self) -> String {
        format!("/{}", self.slug.trim_start_matches('/'))
    }
}

pub fn parse_posts(bytes: &[u8]) -> anyhow::Result<Vec<Post>> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_posts() {
        let json = br##"[
            {"title": "Lines", "slug": "lines", "backgroundImage": {"url": "lines.jpg"}, "backgroundColor": "#111"},
            {"title": "Bare", "slug": "bare"}
        ]"##;
        let posts = parse_posts(json).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].image_url(), "lines.jpg");
        assert_eq!(posts[0].background_color.as_deref(), Some("#111"));
        assert_eq!(posts[1].image_url(), "");
        assert_eq!(posts[1].path(), "/bare");
    }
}
