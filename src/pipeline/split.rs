//! PDF splitting: cut raw PDF bytes into page-bounded sub-documents.
//!
//! The analysis service charges per page and rejects very large uploads, so
//! an oversized source is split into independently analyzable sub-documents
//! before anything touches the network. Each sub-document is a complete,
//! standalone PDF: the source is re-parsed per window and every page outside
//! the window is deleted, which keeps shared resources (fonts, images)
//! reachable from the retained pages.

use crate::error::AnalyzeError;
use lopdf::Document;
use tracing::{debug, info};

/// Split `bytes` into sub-documents of `pages_per_split` consecutive pages.
///
/// The final buffer may contain fewer pages. Page order within and across
/// buffers matches the source exactly: `ceil(total / pages_per_split)`
/// buffers whose page counts sum to the source's total page count.
///
/// # Errors
/// [`AnalyzeError::InvalidPdf`] when the bytes cannot be parsed as a
/// page-addressable document, [`AnalyzeError::SplitFailed`] when a
/// sub-document cannot be serialized.
pub fn split_by_pages(bytes: &[u8], pages_per_split: u32) -> Result<Vec<Vec<u8>>, AnalyzeError> {
    let pages_per_split = pages_per_split.max(1);

    let source = Document::load_mem(bytes).map_err(|e| AnalyzeError::InvalidPdf {
        detail: e.to_string(),
    })?;
    let total_pages = source.get_pages().len() as u32;
    if total_pages == 0 {
        return Err(AnalyzeError::InvalidPdf {
            detail: "document has no pages".to_string(),
        });
    }
    info!(
        "Splitting {} pages into sub-documents of {} pages",
        total_pages, pages_per_split
    );

    let mut buffers = Vec::with_capacity(total_pages.div_ceil(pages_per_split) as usize);
    let mut start_page = 1u32;

    while start_page <= total_pages {
        let end_page = (start_page + pages_per_split - 1).min(total_pages);

        // Fresh parse per window: deleting pages mutates the page tree, and
        // the retained window must keep its shared resources intact.
        let mut part = Document::load_mem(bytes).map_err(|e| AnalyzeError::InvalidPdf {
            detail: e.to_string(),
        })?;

        let outside: Vec<u32> = (1..=total_pages)
            .filter(|p| *p < start_page || *p > end_page)
            .collect();
        if !outside.is_empty() {
            part.delete_pages(&outside);
        }
        part.prune_objects();
        part.renumber_objects();

        let mut buf = Vec::new();
        part.save_to(&mut buf)
            .map_err(|e| AnalyzeError::SplitFailed {
                start_page,
                end_page,
                detail: e.to_string(),
            })?;

        debug!(
            "Sub-document {}: pages {}-{} ({} bytes)",
            buffers.len() + 1,
            start_page,
            end_page,
            buf.len()
        );
        buffers.push(buf);
        start_page = end_page + 1;
    }

    info!("Split into {} sub-documents", buffers.len());
    Ok(buffers)
}

/// Count the pages of a PDF without splitting it.
pub fn page_count(bytes: &[u8]) -> Result<u32, AnalyzeError> {
    let doc = Document::load_mem(bytes).map_err(|e| AnalyzeError::InvalidPdf {
        detail: e.to_string(),
    })?;
    Ok(doc.get_pages().len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    /// Build a minimal valid PDF with `n` blank pages.
    pub(crate) fn sample_pdf(n: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(n);
        for _ in 0..n {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => n as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("in-memory save");
        buf
    }

    #[test]
    fn splits_into_ceil_buffers_summing_to_total() {
        let pdf = sample_pdf(5);
        let parts = split_by_pages(&pdf, 2).unwrap();
        assert_eq!(parts.len(), 3, "ceil(5/2) buffers");

        let counts: Vec<u32> = parts.iter().map(|b| page_count(b).unwrap()).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        assert_eq!(counts.iter().sum::<u32>(), 5);
    }

    #[test]
    fn single_buffer_when_split_width_covers_document() {
        let pdf = sample_pdf(3);
        let parts = split_by_pages(&pdf, 10).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(page_count(&parts[0]).unwrap(), 3);
    }

    #[test]
    fn split_width_is_clamped_to_one() {
        let pdf = sample_pdf(2);
        let parts = split_by_pages(&pdf, 0).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|b| page_count(b).unwrap() == 1));
    }

    #[test]
    fn each_buffer_is_independently_loadable() {
        let pdf = sample_pdf(4);
        for part in split_by_pages(&pdf, 3).unwrap() {
            Document::load_mem(&part).expect("sub-document must parse standalone");
        }
    }

    #[test]
    fn garbage_bytes_are_an_input_error() {
        let err = split_by_pages(b"not a pdf at all", 2).unwrap_err();
        assert!(matches!(err, AnalyzeError::InvalidPdf { .. }), "got {err:?}");
    }
}
