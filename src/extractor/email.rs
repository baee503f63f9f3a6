//! 이메일(.eml) 텍스트 추출 모듈
//!
//! 주요 헤더(Subject, From, To, Date)와 본문을 평문으로 만듭니다.
//! multipart 메시지는 `text/plain` 파트만 사용합니다.
//! transfer-encoding(base64, quoted-printable) 디코딩은 하지 않습니다.

const KEPT_HEADERS: [&str; 4] = ["subject", "from", "to", "date"];

/// 원본 메시지에서 텍스트 추출
pub fn extract_text_from_email(raw: &str) -> String {
    let raw = raw.replace("\r\n", "\n");
    let (header_block, body) = split_headers(&raw);
    let headers = parse_headers(header_block);

    // 헤더가 없으면 전체를 본문으로
    if headers.is_empty() {
        return raw.trim().to_string();
    }

    let mut out = String::new();
    for name in KEPT_HEADERS {
        if let Some((key, value)) = headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            out.push_str(&format!("{}: {}\n", key, value));
        }
    }

    let body_text = match boundary(&headers) {
        Some(boundary) => plain_text_parts(body, &boundary).unwrap_or_else(|| body.to_string()),
        None => body.to_string(),
    };

    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(body_text.trim());
    out
}

/// 첫 빈 줄에서 헤더/본문 분리
fn split_headers(message: &str) -> (&str, &str) {
    match message.find("\n\n") {
        Some(pos) => (&message[..pos], &message[pos + 2..]),
        None => (message, ""),
    }
}

/// 헤더 파싱 (접힌 줄 이어붙임)
fn parse_headers(block: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in block.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    headers
}

/// multipart boundary 파라미터
fn boundary(headers: &[(String, String)]) -> Option<String> {
    let (_, content_type) = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))?;

    if !content_type.to_lowercase().starts_with("multipart/") {
        return None;
    }

    content_type.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// text/plain 파트만 모아서 반환 (없으면 None)
fn plain_text_parts(body: &str, boundary: &str) -> Option<String> {
    let delimiter = format!("--{}", boundary);
    let mut texts = Vec::new();

    for part in body.split(&delimiter).skip(1) {
        // 종료 구분자 "--boundary--"
        if part.starts_with("--") {
            break;
        }

        let part = part.trim_start_matches('\n');
        let (part_headers, part_body) = split_headers(part);
        let part_headers = parse_headers(part_headers);

        let is_plain = part_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.to_lowercase().starts_with("text/plain"))
            .unwrap_or(true);

        if is_plain {
            texts.push(part_body.trim().to_string());
        }
    }

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_message() {
        let raw = "From: alice@example.com\r\nTo: bob@example.com\r\nSubject: Claim\r\n update\r\nX-Mailer: test\r\n\r\nPlease review the claim.\r\n";
        let text = extract_text_from_email(raw);
        assert_eq!(
            text,
            "Subject: Claim update\nFrom: alice@example.com\nTo: bob@example.com\n\nPlease review the claim."
        );
    }

    #[test]
    fn test_multipart_uses_plain_part() {
        let raw = "Subject: Report\n\
Content-Type: multipart/alternative; boundary=\"XYZ\"\n\
\n\
--XYZ\n\
Content-Type: text/plain\n\
\n\
Plain body\n\
--XYZ\n\
Content-Type: text/html\n\
\n\
<p>Html body</p>\n\
--XYZ--\n";
        let text = extract_text_from_email(raw);
        assert_eq!(text, "Subject: Report\n\nPlain body");
    }

    #[test]
    fn test_no_headers() {
        assert_eq!(extract_text_from_email("just text\n"), "just text");
    }
}
