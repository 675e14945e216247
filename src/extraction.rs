//! Text extraction from uploaded documents. Dispatches on the filename
//! extension; unsupported types and empty extractions are client errors so
//! that no downstream model call ever runs without usable text.

use std::io::{Cursor, Read};
use tracing::{debug, warn};
use zip::ZipArchive;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Unsupported file type")]
    UnsupportedFormat,

    #[error("No text extracted from file")]
    NoTextExtracted,

    #[error("Failed to read document: {0}")]
    ReadFailed(String),
}

/// Extract raw text from an uploaded file's bytes based on its name.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let lower = filename.to_lowercase();

    let text = if lower.ends_with(".pdf") {
        extract_pdf(bytes)?
    } else if lower.ends_with(".docx") || lower.ends_with(".doc") {
        extract_docx(bytes)?
    } else if lower.ends_with(".pptx") || lower.ends_with(".ppt") {
        extract_pptx(bytes)?
    } else if lower.ends_with(".txt") || lower.ends_with(".md") {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        return Err(ExtractionError::UnsupportedFormat);
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::NoTextExtracted);
    }

    debug!(
        file_name = %filename,
        text_length = text.len(),
        "Extracted text from upload"
    );
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        warn!(error = %e, "PDF text extraction failed");
        ExtractionError::ReadFailed(e.to_string())
    })
}

/// DOCX files are ZIP archives; the body text lives in `<w:t>` runs inside
/// word/document.xml.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = open_archive(bytes)?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractionError::ReadFailed("word/document.xml not found".to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::ReadFailed(e.to_string()))?;

    Ok(collect_tag_text(&xml, "w:t"))
}

/// PPTX slides keep their text in `<a:t>` runs, one XML file per slide.
fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = open_archive(bytes)?;

    let slide_names: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .collect();

    let mut parts = Vec::new();
    for name in slide_names {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .map_err(|_| ExtractionError::ReadFailed(format!("{name} not found")))?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractionError::ReadFailed(e.to_string()))?;
        let text = collect_tag_text(&xml, "a:t");
        if !text.is_empty() {
            parts.push(text);
        }
    }

    Ok(parts.join(" "))
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, ExtractionError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        warn!(error = %e, "Upload is not a readable OOXML archive");
        ExtractionError::ReadFailed(e.to_string())
    })
}

/// Collect the character content of every `<tag ...>...</tag>` element,
/// space-joined. A targeted scan is enough here: OOXML text runs never nest.
fn collect_tag_text(xml: &str, tag: &str) -> String {
    let open_exact = format!("<{tag}>");
    let open_attrs = format!("<{tag} ");
    let close = format!("</{tag}>");

    let mut parts = Vec::new();
    let mut rest = xml;
    while let Some(start) = earliest_open(rest, &open_exact, &open_attrs) {
        let after_open = &rest[start..];
        let Some(gt) = after_open.find('>') else { break };
        let content_start = &after_open[gt + 1..];
        let Some(end) = content_start.find(&close) else { break };
        let text = decode_xml_entities(&content_start[..end]);
        if !text.is_empty() {
            parts.push(text);
        }
        rest = &content_start[end + close.len()..];
    }
    parts.join(" ")
}

/// Position of the next opening tag in either form. Documents freely mix
/// bare runs and attribute runs, so both candidates must be considered and
/// the earlier one wins.
fn earliest_open(rest: &str, open_exact: &str, open_attrs: &str) -> Option<usize> {
    match (rest.find(open_exact), rest.find(open_attrs)) {
        (Some(exact), Some(attrs)) => Some(exact.min(attrs)),
        (exact, attrs) => exact.or(attrs),
    }
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .trim()
        .to_string()
}
