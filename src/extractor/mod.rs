//! 콘텐츠 추출 모듈
//!
//! 업로드된 파일이나 URL에서 텍스트 콘텐츠를 추출합니다.
//! - 텍스트 파일: 직접 읽기
//! - HTML: 본문 텍스트 추출 (로컬 파일 또는 웹 페이지)
//! - PDF 파일: pdf-extract로 텍스트 추출
//! - DOCX / EML: 형식별 추출기
//!
//! 원격 파일은 URL 경로의 확장자로 형식을 결정합니다.

pub mod docx;
pub mod email;
pub mod pdf;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::collector::FileType;
use crate::error::IngestError;
use crate::scraper::{parse_html, WebScraper};

// ============================================================================
// Document Source
// ============================================================================

/// 수집 대상
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// 로컬 파일
    File(PathBuf),
    /// HTML 웹 페이지
    WebPage(String),
    /// 원격 문서 파일 (PDF, DOCX, EML, TXT)
    Download(String),
}

impl DocumentSource {
    /// 사용자 입력 해석
    ///
    /// http(s) URL 중 경로에 문서 확장자가 있으면 `Download`,
    /// 그 외 URL은 `WebPage`, 나머지는 로컬 파일로 봅니다.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if input.starts_with("http://") || input.starts_with("https://") {
            return match url_file_type(input) {
                Some(FileType::Html) | None => DocumentSource::WebPage(input.to_string()),
                Some(_) => DocumentSource::Download(input.to_string()),
            };
        }

        DocumentSource::File(PathBuf::from(input))
    }

    /// 표시용 이름
    pub fn display_name(&self) -> String {
        match self {
            DocumentSource::File(path) => path.display().to_string(),
            DocumentSource::WebPage(url) | DocumentSource::Download(url) => url.clone(),
        }
    }
}

/// URL 경로의 마지막 세그먼트 확장자 (쿼리 스트링 제외)
fn url_extension(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let last = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let (_, ext) = last.rsplit_once('.')?;
    Some(ext.to_lowercase())
}

fn url_file_type(raw: &str) -> Option<FileType> {
    url_extension(raw).and_then(|ext| FileType::from_extension(&ext))
}

// ============================================================================
// Loaded Document
// ============================================================================

/// 추출된 문서
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// 추출된 텍스트
    pub text: String,
    /// 메타데이터
    pub metadata: DocumentMetadata,
}

/// 문서 메타데이터
#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    /// 원본 (경로 또는 URL)
    pub source: String,
    /// 원본 파일 타입
    pub file_type: FileType,
    /// PDF 페이지 번호 (1부터 시작)
    pub page_number: Option<usize>,
    /// 총 페이지 수 (PDF)
    pub total_pages: Option<usize>,
    /// 제목 (HTML)
    pub title: Option<String>,
}

impl DocumentMetadata {
    fn new(source: &str, file_type: FileType) -> Self {
        Self {
            source: source.to_string(),
            file_type,
            page_number: None,
            total_pages: None,
            title: None,
        }
    }
}

// ============================================================================
// Document Loader
// ============================================================================

/// 문서 수집 어댑터 트레이트
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// 하나의 대상에서 문서 추출
    async fn load(&self, source: &DocumentSource) -> Result<Vec<LoadedDocument>, IngestError>;
}

/// 콘텐츠 추출기
pub struct ContentExtractor {
    scraper: WebScraper,
}

impl ContentExtractor {
    /// 새 추출기 생성
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            scraper: WebScraper::new()?,
        })
    }

    /// 로컬 파일에서 추출
    async fn load_file(&self, path: &Path) -> Result<Vec<LoadedDocument>, IngestError> {
        let file_type = FileType::from_path(path).ok_or_else(|| {
            IngestError::UnsupportedFormat(
                path.extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string()),
            )
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        extract_bytes(bytes, file_type, &path.display().to_string()).await
    }

    /// 웹 페이지에서 추출
    async fn load_web_page(&self, url: &str) -> Result<Vec<LoadedDocument>, IngestError> {
        validate_url(url)?;

        let scraped = self.scraper.scrape(url).await.map_err(|e| IngestError::Fetch {
            url: url.to_string(),
            message: format!("{:#}", e),
        })?;

        let mut metadata = DocumentMetadata::new(url, FileType::Html);
        metadata.title = scraped.title;

        Ok(vec![LoadedDocument {
            text: scraped.content,
            metadata,
        }])
    }

    /// 원격 파일 다운로드 후 추출
    async fn load_download(&self, url: &str) -> Result<Vec<LoadedDocument>, IngestError> {
        validate_url(url)?;

        let file_type = url_file_type(url).ok_or_else(|| {
            IngestError::UnsupportedFormat(url_extension(url).unwrap_or_else(|| url.to_string()))
        })?;

        let bytes = self.scraper.download(url).await.map_err(|e| IngestError::Fetch {
            url: url.to_string(),
            message: format!("{:#}", e),
        })?;

        extract_bytes(bytes, file_type, url).await
    }
}

#[async_trait]
impl DocumentLoader for ContentExtractor {
    async fn load(&self, source: &DocumentSource) -> Result<Vec<LoadedDocument>, IngestError> {
        match source {
            DocumentSource::File(path) => self.load_file(path).await,
            DocumentSource::WebPage(url) => self.load_web_page(url).await,
            DocumentSource::Download(url) => self.load_download(url).await,
        }
    }
}

fn validate_url(url: &str) -> Result<(), IngestError> {
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|e| IngestError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })
}

/// 형식별 추출
async fn extract_bytes(
    bytes: Vec<u8>,
    file_type: FileType,
    name: &str,
) -> Result<Vec<LoadedDocument>, IngestError> {
    let extract_err = |message: String| IngestError::Extract {
        name: name.to_string(),
        message,
    };

    let single = |text: String| {
        vec![LoadedDocument {
            text,
            metadata: DocumentMetadata::new(name, file_type),
        }]
    };

    match file_type {
        FileType::Text => Ok(single(String::from_utf8_lossy(&bytes).into_owned())),
        FileType::Email => Ok(single(email::extract_text_from_email(
            &String::from_utf8_lossy(&bytes),
        ))),
        FileType::Html => {
            let scraped = parse_html(&String::from_utf8_lossy(&bytes), name);
            let mut metadata = DocumentMetadata::new(name, file_type);
            metadata.title = scraped.title;
            Ok(vec![LoadedDocument {
                text: scraped.content,
                metadata,
            }])
        }
        FileType::Docx => docx::extract_text_from_docx(&bytes)
            .map(single)
            .map_err(|e| extract_err(format!("{:#}", e))),
        FileType::Pdf => {
            // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
            let owned_name = name.to_string();
            let pages =
                tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&bytes, &owned_name))
                    .await
                    .map_err(|e| extract_err(format!("PDF extraction task failed: {}", e)))?
                    .map_err(|e| extract_err(format!("{:#}", e)))?;

            let total_pages = pages.len();
            Ok(pages
                .into_iter()
                .map(|(page_num, text)| {
                    let mut metadata = DocumentMetadata::new(name, FileType::Pdf);
                    metadata.page_number = Some(page_num);
                    metadata.total_pages = Some(total_pages);
                    LoadedDocument { text, metadata }
                })
                .collect())
        }
    }
}

// ============================================================================
// Batch Ingestion
// ============================================================================

/// 항목별 실패
#[derive(Debug)]
pub struct IngestFailure {
    /// 실패한 대상
    pub source: String,
    /// 원인
    pub error: IngestError,
}

/// 여러 대상 수집 결과
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<LoadedDocument>,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// 추출된 텍스트를 "\n"으로 연결
    pub fn full_text(&self) -> String {
        self.documents
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// 모든 대상 수집 (실패한 항목은 경고 후 계속)
pub async fn load_all(loader: &dyn DocumentLoader, sources: &[DocumentSource]) -> IngestReport {
    let mut report = IngestReport::default();

    for source in sources {
        match loader.load(source).await {
            Ok(docs) => {
                tracing::info!(
                    "Loaded {} document(s) from {}",
                    docs.len(),
                    source.display_name()
                );
                report.documents.extend(docs);
            }
            Err(error) => {
                tracing::warn!("Skipping {}: {}", source.display_name(), error);
                report.failures.push(IngestFailure {
                    source: source.display_name(),
                    error,
                });
            }
        }
    }

    report
}

// ============================================================================
// Tests
// ============================================================================
