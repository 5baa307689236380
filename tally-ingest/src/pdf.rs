//! PDF to page text.

use anyhow::{Context, Result};
use std::path::Path;

use crate::pages::StatementPages;

/// Extract and tokenize every page of an in-memory PDF.
pub fn extract_pages(bytes: &[u8]) -> Result<StatementPages> {
    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .context("extracting text from statement PDF")?;
    tracing::debug!(pages = texts.len(), "extracted statement text");
    StatementPages::from_page_texts(texts)
}

pub fn extract_pages_from_file(path: impl AsRef<Path>) -> Result<StatementPages> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    extract_pages(&bytes).with_context(|| format!("parsing {}", path.display()))
}
