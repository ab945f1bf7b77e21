//! Document loading with an on-disk markdown cache.
//!
//! PDFs are converted page by page (pages joined with [`PAGE_BREAK`]) and the
//! result is written to the cache path; Markdown/text files pass through.
//! An existing cache is returned unchanged unless `overwrite` is set.
//!
//! Next to the cache sits `{cache}.meta.json` holding the index of the first
//! extracted page, so page numbers survive a cache hit.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::chunker::PAGE_BREAK;
use crate::errors::rag_base_error::{RagBaseError, Result};

/// What to load and where to cache the converted text.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub source: PathBuf,
    /// Converted-text cache; `None` disables caching.
    pub cache: Option<PathBuf>,
    pub overwrite: bool,
    /// PDF pages to extract (0-based, end exclusive); `None` = all.
    pub pages: Option<Range<usize>>,
}

/// Loaded text plus the 0-based index of its first page in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub text: String,
    pub first_page: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheMeta {
    first_page: usize,
}

/// `{cache}.meta.json`.
pub fn cache_meta_path(cache: &Path) -> PathBuf {
    let mut p = cache.as_os_str().to_owned();
    p.push(".meta.json");
    PathBuf::from(p)
}

/// Returns the document text, converting and caching it if needed.
///
/// # Errors
/// - [`RagBaseError::MissingInput`] if the source is absent (nothing is written)
/// - [`RagBaseError::Pdf`] if text extraction fails
#[instrument(skip_all, fields(source = %req.source.display()))]
pub fn load_document(req: &LoadRequest) -> Result<LoadedDocument> {
    if !req.overwrite {
        if let Some(cache) = req.cache.as_ref().filter(|c| c.is_file()) {
            debug!("Using cached text {}", cache.display());
            return read_cache(cache, req.pages.as_ref());
        }
    }

    if !req.source.is_file() {
        return Err(RagBaseError::MissingInput(req.source.clone()));
    }

    let doc = if is_pdf(&req.source) {
        extract_pdf_pages(&req.source, req.pages.clone())?
    } else {
        LoadedDocument {
            text: fs::read_to_string(&req.source)?,
            first_page: 0,
        }
    };

    if let Some(cache) = &req.cache {
        // Meta first: text without meta would read back as page 0.
        let meta = CacheMeta {
            first_page: doc.first_page,
        };
        write_atomic(&cache_meta_path(cache), &serde_json::to_vec(&meta)?)?;
        write_atomic(cache, doc.text.as_bytes())?;
        info!("Wrote converted text to {}", cache.display());
    }
    Ok(doc)
}

fn read_cache(cache: &Path, requested: Option<&Range<usize>>) -> Result<LoadedDocument> {
    let text = fs::read_to_string(cache)?;
    let meta_path = cache_meta_path(cache);
    let meta: CacheMeta = if meta_path.is_file() {
        serde_json::from_slice(&fs::read(&meta_path)?)?
    } else {
        CacheMeta::default()
    };

    if let Some(r) = requested.filter(|r| r.start != meta.first_page) {
        warn!(
            "Cached text {} starts at page {}, not {}; pass --overwrite to re-extract",
            cache.display(),
            meta.first_page,
            r.start
        );
    }
    Ok(LoadedDocument {
        text,
        first_page: meta.first_page,
    })
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn extract_pdf_pages(path: &Path, pages: Option<Range<usize>>) -> Result<LoadedDocument> {
    let bytes = fs::read(path)?;
    let all = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| RagBaseError::Pdf {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let total = all.len();
    let range = pages.unwrap_or(0..total);
    let range = range.start.min(total)..range.end.min(total);
    info!(
        "Extracted {} of {} pages from {}",
        range.len(),
        total,
        path.display()
    );

    let sep = PAGE_BREAK.to_string();
    Ok(LoadedDocument {
        first_page: range.start,
        text: all[range].join(&sep),
    })
}

/// Writes `bytes` next to `path` and renames into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_passes_through_and_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("rules.md");
        let cache = dir.path().join("outputs").join("rules.md");
        fs::write(&src, "# Rules\nMechs have HP.\n").unwrap();

        let req = LoadRequest {
            source: src.clone(),
            cache: Some(cache.clone()),
            overwrite: false,
            pages: None,
        };
        let doc = load_document(&req).unwrap();
        assert_eq!(doc.text, "# Rules\nMechs have HP.\n");
        assert_eq!(doc.first_page, 0);
        assert_eq!(fs::read_to_string(&cache).unwrap(), "# Rules\nMechs have HP.\n");
        assert!(cache_meta_path(&cache).is_file());
    }

    #[test]
    fn existing_cache_wins_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("rules.md");
        let cache = dir.path().join("rules.cache.md");
        fs::write(&src, "fresh").unwrap();
        fs::write(&cache, "cached \u{0c} bytes").unwrap();

        let mut req = LoadRequest {
            source: src,
            cache: Some(cache.clone()),
            overwrite: false,
            pages: None,
        };
        assert_eq!(load_document(&req).unwrap().text, "cached \u{0c} bytes");

        req.overwrite = true;
        assert_eq!(load_document(&req).unwrap().text, "fresh");
        assert_eq!(fs::read_to_string(&cache).unwrap(), "fresh");
    }

    #[test]
    fn missing_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("outputs").join("lancer.md");
        let req = LoadRequest {
            source: dir.path().join("nope.pdf"),
            cache: Some(cache.clone()),
            overwrite: false,
            pages: None,
        };
        assert!(matches!(
            load_document(&req),
            Err(RagBaseError::MissingInput(_))
        ));
        assert!(!cache.exists());
        assert!(!dir.path().join("outputs").exists());
    }

    #[test]
    fn cache_hit_keeps_extracted_start_page() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("core.md");
        fs::write(&cache, "Page seventeen.\u{0c}Page eighteen.").unwrap();
        fs::write(cache_meta_path(&cache), r#"{"first_page":16}"#).unwrap();

        let req = LoadRequest {
            source: dir.path().join("core.pdf"),
            cache: Some(cache),
            overwrite: false,
            pages: None,
        };
        let doc = load_document(&req).unwrap();
        assert_eq!(doc.first_page, 16);
        assert_eq!(doc.text, "Page seventeen.\u{0c}Page eighteen.");
    }

    #[test]
    fn cache_without_meta_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("old.md");
        fs::write(&cache, "text").unwrap();
        let req = LoadRequest {
            source: dir.path().join("old.pdf"),
            cache: Some(cache),
            overwrite: false,
            pages: Some(3..5),
        };
        assert_eq!(load_document(&req).unwrap().first_page, 0);
    }

    #[test]
    fn pdf_extension_detection() {
        assert!(is_pdf(Path::new("a/B.PDF")));
        assert!(!is_pdf(Path::new("a/b.md")));
    }
}
