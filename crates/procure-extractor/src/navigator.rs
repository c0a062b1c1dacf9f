//! Document navigator: identity markers and the root content table

use crate::document::cell_text;
use crate::error::ExtractorError;
use procure_domain::{DocumentVariant, IdentityKey};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ROOT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table.tender_table").unwrap());
static CASE_ID: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.pkAtmMain").unwrap());
static CASE_NUMBER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.tenderCaseNo").unwrap());
static PRIMARY_KEY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.primaryKey").unwrap());

/// A document's identity and the table every section lives under
#[derive(Debug, Clone)]
pub struct Located<'a> {
    /// Key every extracted record is attached to
    pub identity: IdentityKey,
    /// Root content table
    pub root: ElementRef<'a>,
}

/// Find the identity and root of a document
///
/// Fails with [`ExtractorError::MissingIdentity`] if any identity marker
/// or the root table is absent, or a marker is empty after trimming.
pub fn locate(document: &Html, variant: DocumentVariant) -> Result<Located<'_>, ExtractorError> {
    let identity = match variant {
        DocumentVariant::Award => IdentityKey::pair(
            marker_text(document, &CASE_ID, "pkAtmMain")?,
            marker_text(document, &CASE_NUMBER, "tenderCaseNo")?,
        ),
        DocumentVariant::Declaration => {
            IdentityKey::primary(marker_text(document, &PRIMARY_KEY, "primaryKey")?)
        }
    };

    let root = document
        .select(&ROOT)
        .next()
        .ok_or_else(|| ExtractorError::MissingIdentity(format!("no content table ({})", identity)))?;

    Ok(Located { identity, root })
}

/// Pick the registry set from the identity markers present
///
/// A `primaryKey` marker means a tender declaration; anything else is
/// read as an award notice.
pub fn detect_variant(document: &Html) -> DocumentVariant {
    if document.select(&PRIMARY_KEY).next().is_some() {
        DocumentVariant::Declaration
    } else {
        DocumentVariant::Award
    }
}

fn marker_text(document: &Html, selector: &Selector, name: &str) -> Result<String, ExtractorError> {
    let text = document
        .select(selector)
        .next()
        .map(|element| cell_text(element).trim().to_string())
        .ok_or_else(|| ExtractorError::MissingIdentity(format!("no {} marker", name)))?;

    if text.is_empty() {
        return Err(ExtractorError::MissingIdentity(format!("empty {} marker", name)));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_TABLE: &str = "<table class='table_block tender_table'><tr><th>x</th></tr></table>";

    #[test]
    fn test_locate_award() {
        let html = format!(
            "<div class='pkAtmMain'> 51759078 </div><div class='tenderCaseNo'>\nIEB048\n</div>{}",
            ROOT_TABLE
        );
        let doc = Html::parse_document(&html);
        let located = locate(&doc, DocumentVariant::Award).unwrap();
        assert_eq!(located.identity, IdentityKey::pair("51759078", "IEB048"));
        assert_eq!(located.root.value().name(), "table");
    }

    #[test]
    fn test_locate_declaration() {
        let html = format!("<div class='primaryKey'>NjAw</div>{}", ROOT_TABLE);
        let doc = Html::parse_document(&html);
        assert_eq!(detect_variant(&doc), DocumentVariant::Declaration);
        let located = locate(&doc, DocumentVariant::Declaration).unwrap();
        assert_eq!(located.identity, IdentityKey::primary("NjAw"));
    }

    #[test]
    fn test_empty_marker_is_missing_identity() {
        let html = format!(
            "<div class='pkAtmMain'>  </div><div class='tenderCaseNo'>A</div>{}",
            ROOT_TABLE
        );
        let doc = Html::parse_document(&html);
        let err = locate(&doc, DocumentVariant::Award).unwrap_err();
        assert!(matches!(err, ExtractorError::MissingIdentity(_)));
    }

    #[test]
    fn test_missing_marker_is_missing_identity() {
        let doc = Html::parse_document(&format!("<div class='pkAtmMain'>1</div>{}", ROOT_TABLE));
        assert!(matches!(
            locate(&doc, DocumentVariant::Award),
            Err(ExtractorError::MissingIdentity(_))
        ));
        assert_eq!(detect_variant(&doc), DocumentVariant::Award);
    }

    #[test]
    fn test_missing_root_is_missing_identity() {
        let doc = Html::parse_document("<div class='primaryKey'>k</div>");
        assert!(matches!(
            locate(&doc, DocumentVariant::Declaration),
            Err(ExtractorError::MissingIdentity(_))
        ));
    }
}
