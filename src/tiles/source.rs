use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// Leaflet-style URL template such as `https://{s}.tile.example.org/{z}/{x}/{y}.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
    subdomains: Vec<String>,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self::with_subdomains(template, Vec::new())
    }

    pub fn with_subdomains(template: impl Into<String>, subdomains: Vec<String>) -> Self {
        Self {
            template: template.into(),
            subdomains,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl TileSource for UrlTemplate {
    fn url(&self, coord: TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if url.contains("{s}") {
            // Leaflet falls back to "a" when no subdomains are configured
            let sub = if self.subdomains.is_empty() {
                "a"
            } else {
                let idx = ((coord.x as usize) + (coord.y as usize)) % self.subdomains.len();
                self.subdomains[idx].as_str()
            };
            url = url.replace("{s}", sub);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_substitution() {
        let source = UrlTemplate::new("https://cyberjapandata.gsi.go.jp/xyz/std/{z}/{x}/{y}.png");
        assert_eq!(
            source.url(TileCoord::new(58210, 25803, 16)),
            "https://cyberjapandata.gsi.go.jp/xyz/std/16/58210/25803.png"
        );
    }

    #[test]
    fn test_subdomain_rotation() {
        let source = UrlTemplate::with_subdomains(
            "https://{s}.tile.example.org/{z}/{x}/{y}.png",
            vec!["a".into(), "b".into(), "c".into()],
        );
        assert_eq!(source.url(TileCoord::new(1, 0, 3)), "https://b.tile.example.org/3/1/0.png");
        assert_eq!(source.url(TileCoord::new(1, 1, 3)), "https://c.tile.example.org/3/1/1.png");
    }
}
