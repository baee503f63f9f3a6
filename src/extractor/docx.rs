//! DOCX 텍스트 추출 모듈
//!
//! DOCX는 zip 아카이브이며 본문은 `word/document.xml`에 있습니다.
//! 문단(`</w:p>`)은 줄바꿈, 탭(`<w:tab/>`)은 탭 문자로 바꾼 뒤 태그를 제거합니다.

use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use regex::Regex;

const DOCUMENT_XML: &str = "word/document.xml";

/// DOCX 바이트에서 텍스트 추출
pub fn extract_text_from_docx(bytes: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Not a valid DOCX (zip) archive")?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .context("DOCX has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    Ok(xml_to_text(&xml))
}

/// WordprocessingML → 평문
fn xml_to_text(xml: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").expect("Invalid regex");

    let marked = xml
        .replace("</w:p>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<w:br/>", "\n");

    let stripped = tag_re.replace_all(&marked, "");
    let decoded = decode_entities(&stripped);

    decoded
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// XML 기본 엔티티 디코딩 (`&amp;`는 마지막에)
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
