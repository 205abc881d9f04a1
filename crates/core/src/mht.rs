use regex::Regex;
use serde::Serialize;

/// Boundary marker emitted by the MHT producer between MIME parts.
const BOUNDARY_MARKER: &str = "--=_NextPart_SMP_";
const CONTENT_TYPE_HEADER: &str = "Content-Type:";
const CONTENT_TYPE_JPEG: &str = "Content-Type: image/jpeg";
const CONTENT_TYPE_PNG: &str = "Content-Type: image/png";

/// `<img ... src="...">`, case-insensitive, attributes may span newlines.
const IMG_TAG_PATTERN: &str = r#"(?is)<img[^>/]*src=['"][^"']+["'][^>/]*/?>"#;

/// One image attachment pulled out of a MIME part. `raw` is the exact
/// substring captured from the document (line breaks included); `clean` has
/// all CR/LF stripped and is what gets embedded in the data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Base64Image {
    pub clean: String,
    pub raw: String,
}

/// Result of a successful fix: the rewritten document plus every extracted
/// attachment, in discovery order, for callers that want to display or
/// download the images separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixOutput {
    pub result: String,
    #[serde(rename = "base64Images")]
    pub base64_images: Vec<Base64Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MhtError {
    /// Tag and attachment counts reconcile only when they are equal or when
    /// tags are exactly double the attachments (thumbnail + full-size pairs
    /// pointing at the same part). Anything else aborts the whole fix.
    #[error("Number of images in the file does not match the number of base64 images found")]
    CountMismatch { tags: usize, images: usize },
}

/// Forward scan state over a single document buffer. Offsets are byte
/// positions; every helper is total and returns `None` instead of slicing
/// off a char boundary.
struct Scanner<'a> {
    doc: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(doc: &'a str) -> Self {
        Self { doc }
    }

    /// Position of the next occurrence of `literal` at or after `from`.
    fn find_next(&self, literal: &str, mut from: usize) -> Option<usize> {
        while from < self.doc.len() && !self.doc.is_char_boundary(from) {
            from += 1;
        }
        self.doc.get(from..)?.find(literal).map(|at| from + at)
    }

    /// Fixed-length window starting at `start`, if the document is long
    /// enough to hold it.
    fn slice_at(&self, start: usize, len: usize) -> Option<&'a str> {
        self.doc.get(start..start.checked_add(len)?)
    }

    /// First maximal run of characters at or after `start` containing
    /// neither a space nor a hyphen. CR/LF survive this filter; boundary
    /// markers begin with `-`, so a run never crosses into the next part.
    fn first_run_excluding_space_and_hyphen(&self, start: usize) -> Option<&'a str> {
        let bytes = self.doc.as_bytes();
        let mut run_start = start;
        while run_start < bytes.len() && matches!(bytes[run_start], b' ' | b'-') {
            run_start += 1;
        }
        if run_start >= bytes.len() {
            return None;
        }
        let mut run_end = run_start;
        while run_end < bytes.len() && !matches!(bytes[run_end], b' ' | b'-') {
            run_end += 1;
        }
        self.doc.get(run_start..run_end)
    }
}

/// Every `<img>` tag in the document, in left-to-right scan order. A
/// zero-match document yields an empty list, never an error.
pub fn find_image_tags(doc: &str) -> Vec<String> {
    let tag_regex = Regex::new(IMG_TAG_PATTERN).unwrap();
    tag_regex
        .find_iter(doc)
        .map(|tag| tag.as_str().to_string())
        .collect()
}

/// Scan the document for image MIME parts and capture their base64 bodies.
///
/// The document is one undivided buffer, so the scan jumps between known
/// structural landmarks: the part boundary marker, the `Content-Type:`
/// header, and a literal `JPEG`/`PNG` token the producer writes on the last
/// header line before the body. The content-type check is an exact-length
/// slice comparison, not a parsed header; only jpeg and png qualify.
pub fn find_base64_content(doc: &str) -> Vec<Base64Image> {
    let scanner = Scanner::new(doc);
    let mut images = Vec::new();
    let mut cursor = 0usize;

    while cursor < doc.len() {
        let Some(marker) = scanner.find_next(BOUNDARY_MARKER, cursor) else {
            break;
        };

        let content_type = scanner.find_next(CONTENT_TYPE_HEADER, marker);
        let is_image = content_type.is_some_and(|at| {
            scanner.slice_at(at, CONTENT_TYPE_JPEG.len()) == Some(CONTENT_TYPE_JPEG)
                || scanner.slice_at(at, CONTENT_TYPE_PNG.len()) == Some(CONTENT_TYPE_PNG)
        });

        let Some(content_type) = content_type.filter(|_| is_image) else {
            // Non-image part: resume just past this marker so the next
            // search lands on the following boundary.
            cursor = marker + 1;
            continue;
        };

        // The body starts right after the producer's uppercase type token.
        let body_start = match scanner.find_next("JPEG", content_type) {
            Some(at) => Some(at + 4),
            None => scanner.find_next("PNG", content_type).map(|at| at + 3),
        };
        let Some(body_start) = body_start else {
            // No recognizable signature: skip this part, the shortfall
            // surfaces later as a count mismatch.
            cursor = content_type + 1;
            continue;
        };

        match scanner.first_run_excluding_space_and_hyphen(body_start) {
            Some(raw) => {
                images.push(Base64Image {
                    clean: raw.replace(['\n', '\r'], ""),
                    raw: raw.to_string(),
                });
                cursor += raw.len() + 1;
            }
            None => {
                // Malformed or truncated part: back up to the header so the
                // next marker search still makes forward progress.
                cursor = content_type + 1;
            }
        }
    }

    images
}

/// Rewrite every `<img>` tag to embed the matching attachment as a data URL.
///
/// Tags and attachments are paired positionally, in the order each was
/// discovered. Substitution is a global text replacement of the raw tag
/// string, so two textually identical tags are both rewritten by the step
/// that handles the first of them. The output media type is always
/// `image/jpeg`, matching what consumers of these documents expect even for
/// png parts.
pub fn fix_mht(contents: &str) -> Result<FixOutput, MhtError> {
    let tags = find_image_tags(contents);

    if tags.is_empty() {
        // Absence of images is not an error; the document goes back as-is.
        return Ok(FixOutput {
            result: contents.to_string(),
            base64_images: Vec::new(),
        });
    }

    let images = find_base64_content(contents);

    if tags.len() != images.len() && tags.len() != images.len() * 2 {
        return Err(MhtError::CountMismatch {
            tags: tags.len(),
            images: images.len(),
        });
    }

    let mut result = contents.to_string();
    for (index, tag) in tags.iter().enumerate() {
        if let Some(image) = images.get(index) {
            let inlined = format!("<img src=\"data:image/jpeg;base64,{}\">", image.clean);
            result = result.replace(tag.as_str(), &inlined);
        }
    }

    Ok(FixOutput {
        result,
        base64_images: images,
    })
}
