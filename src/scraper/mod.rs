//! 웹 스크래퍼 모듈 - URL 콘텐츠 추출
//!
//! 웹 페이지 본문 추출과 원격 문서 다운로드를 담당합니다.

use anyhow::{Context, Result};
use scraper::{Html, Selector};

/// 스크랩된 콘텐츠
#[derive(Debug, Clone)]
pub struct ScrapedContent {
    /// 페이지 제목
    pub title: Option<String>,
    /// 본문 텍스트 (HTML 태그 제거됨)
    pub content: String,
    /// 원본 URL
    pub url: String,
}

/// 웹 스크래퍼
pub struct WebScraper {
    client: reqwest::Client,
}

impl WebScraper {
    /// 새 스크래퍼 생성
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("docqa/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self { client })
    }

    /// URL에서 콘텐츠 추출
    pub async fn scrape(&self, url: &str) -> Result<ScrapedContent> {
        tracing::info!("Scraping: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP 요청 실패")?
            .error_for_status()
            .context("HTTP 오류 응답")?;

        let html = response.text().await.context("응답 본문 읽기 실패")?;
        Ok(parse_html(&html, url))
    }

    /// URL에서 원본 바이트 다운로드
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::info!("Downloading: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP 요청 실패")?
            .error_for_status()
            .context("HTTP 오류 응답")?;

        let bytes = response.bytes().await.context("응답 본문 읽기 실패")?;
        Ok(bytes.to_vec())
    }
}

impl Default for WebScraper {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::error!("WebScraper 생성 실패: {}", e);
            // 최소한의 클라이언트로 폴백
            Self {
                client: reqwest::Client::new(),
            }
        })
    }
}

// ============================================================================
// HTML Parsing
// ============================================================================

/// HTML 문자열에서 제목과 본문 추출
pub fn parse_html(html: &str, url: &str) -> ScrapedContent {
    let document = Html::parse_document(html);

    ScrapedContent {
        title: extract_title(&document),
        content: extract_content(&document),
        url: url.to_string(),
    }
}

/// 제목 추출 (<title> → <h1>)
fn extract_title(document: &Html) -> Option<String> {
    for tag in ["title", "h1"] {
        if let Ok(selector) = Selector::parse(tag) {
            if let Some(element) = document.select(&selector).next() {
                let title = element.text().collect::<String>().trim().to_string();
                if !title.is_empty() {
                    return Some(title);
                }
            }
        }
    }

    None
}

/// 본문 추출 (HTML 태그 제거)
fn extract_content(document: &Html) -> String {
    // 우선순위: article > main > body
    let selectors = [
        "article",
        "main",
        "[role=main]",
        ".content",
        "#content",
        "body",
    ];

    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = extract_text_from_element(&element);
                if text.len() > 100 {
                    return text;
                }
            }
        }
    }

    // 폴백: 전체 body 텍스트
    if let Ok(selector) = Selector::parse("body") {
        if let Some(element) = document.select(&selector).next() {
            return extract_text_from_element(&element);
        }
    }

    String::new()
}

/// 요소에서 텍스트 추출
fn extract_text_from_element(element: &scraper::ElementRef) -> String {
    let mut text = String::new();

    for node in element.text() {
        let trimmed = node.trim();
        if !trimmed.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(trimmed);
        }
    }

    // 연속 공백 정리
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraper_creation() {
        assert!(WebScraper::new().is_ok());
    }

    #[test]
    fn test_extract_title() {
        let html = r#"
            <html>
                <head><title>Test Page Title</title></head>
                <body><h1>Main Heading</h1></body>
            </html>
        "#;
        let scraped = parse_html(html, "http://x");
        assert_eq!(scraped.title, Some("Test Page Title".to_string()));
        assert_eq!(scraped.url, "http://x");
    }

    #[test]
    fn test_extract_title_h1_fallback() {
        let html = r#"
            <html>
                <head><title></title></head>
                <body><h1>H1 Heading</h1></body>
            </html>
        "#;
        let scraped = parse_html(html, "http://x");
        assert_eq!(scraped.title, Some("H1 Heading".to_string()));
    }

    #[test]
    fn test_extract_content_from_article() {
        let html = r#"
            <html>
                <body>
                    <nav>Navigation menu</nav>
                    <article>
                        This is the main article content.
                        It should be extracted as the primary content.
                        More text to ensure it's over 100 characters.
                    </article>
                    <footer>Footer content</footer>
                </body>
            </html>
        "#;
        let scraped = parse_html(html, "http://x");
        assert!(scraped.content.contains("main article content"));
        assert!(!scraped.content.contains("Footer content"));
    }

    #[test]
    fn test_short_page_falls_back_to_body() {
        let html = "<html><body><p>Tiny   page</p></body></html>";
        let scraped = parse_html(html, "http://x");
        assert_eq!(scraped.content, "Tiny page");
    }
}
