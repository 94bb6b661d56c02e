//! Content extraction from article HTML bodies

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Maximum number of images emitted per article
pub const MAX_IMAGES: usize = 10;

/// Parsed article body
pub struct ArticleBody {
    document: Html,
}

impl ArticleBody {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_fragment(html),
        }
    }

    /// Whole-document plain text: each text node trimmed, empty nodes
    /// dropped, the rest joined by newlines
    pub fn plain_text(&self) -> String {
        self.document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Image URLs in document order.
    ///
    /// Only `<figure>` (its first descendant `<img>`) and `<img>` elements are
    /// considered. Sources are resolved against `base`, deduplicated by the
    /// resolved URL and capped at `max`.
    pub fn image_urls(&self, base: &Url, max: usize) -> Vec<String> {
        let Ok(candidates) = Selector::parse("figure, img") else {
            return vec![];
        };
        let Ok(img) = Selector::parse("img") else {
            return vec![];
        };

        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for element in self.document.select(&candidates) {
            if urls.len() >= max {
                break;
            }

            let source = match element.value().name() {
                "figure" => element.select(&img).next().and_then(image_source),
                _ => image_source(element),
            };
            let Some(source) = source else {
                continue;
            };

            let resolved = match base.join(source) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::debug!(src = %source, error = %e, "Skipping unresolvable image source");
                    continue;
                }
            };

            if seen.insert(resolved.clone()) {
                tracing::debug!(index = urls.len() + 1, url = %resolved, "Extracted image");
                urls.push(resolved);
            }
        }

        urls
    }
}

fn image_source(img: ElementRef<'_>) -> Option<&str> {
    img.value()
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://feedback.minecraft.net").unwrap()
    }

    #[test]
    fn test_plain_text_strips_tags_and_collapses_blocks() {
        let body = ArticleBody::parse(
            "<h1>Changes</h1>\n<p>  Added <b>armadillo</b>  </p><ul><li>Fix A</li><li></li></ul>",
        );

        assert_eq!(body.plain_text(), "Changes\nAdded\narmadillo\nFix A");
    }

    #[test]
    fn test_images_in_document_order_with_figure_first_img() {
        let body = ArticleBody::parse(
            r#"<p><img src="https://cdn.example.com/one.png"></p>
               <figure><img src="/two.png"><img src="/second.png"></figure>
               <img src="//cdn.example.com/three.png">"#,
        );

        let urls = body.image_urls(&base(), MAX_IMAGES);

        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/one.png",
                "https://feedback.minecraft.net/two.png",
                "https://feedback.minecraft.net/second.png",
                "https://cdn.example.com/three.png",
            ]
        );
    }

    #[test]
    fn test_figure_image_is_not_emitted_twice() {
        let body = ArticleBody::parse(r#"<figure><img src="/hero.png"></figure>"#);

        let urls = body.image_urls(&base(), MAX_IMAGES);

        assert_eq!(urls, vec!["https://feedback.minecraft.net/hero.png"]);
    }

    #[test]
    fn test_duplicate_sources_emitted_once() {
        let body = ArticleBody::parse(
            r#"<img src="/a.png"><img src="https://feedback.minecraft.net/a.png"><img src="/b.png">"#,
        );

        let urls = body.image_urls(&base(), MAX_IMAGES);

        assert_eq!(
            urls,
            vec![
                "https://feedback.minecraft.net/a.png",
                "https://feedback.minecraft.net/b.png",
            ]
        );
    }

    #[test]
    fn test_images_capped_at_max() {
        let html: String = (0..14)
            .map(|i| format!(r#"<p><img src="/img/{i}.png"></p>"#))
            .collect();
        let body = ArticleBody::parse(&html);

        let urls = body.image_urls(&base(), MAX_IMAGES);

        assert_eq!(urls.len(), 10);
        assert_eq!(urls[0], "https://feedback.minecraft.net/img/0.png");
        assert_eq!(urls[9], "https://feedback.minecraft.net/img/9.png");
    }

    #[test]
    fn test_images_without_source_are_skipped() {
        let body = ArticleBody::parse(r#"<figure><figcaption>none</figcaption></figure><img alt="x"><img src="  ">"#);

        assert!(body.image_urls(&base(), MAX_IMAGES).is_empty());
    }
}
