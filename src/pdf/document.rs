//! Loaded PDF documents: object discovery, page lookup, and rewrite.
//!
//! Loading scans the whole file for `N G obj` markers instead of trusting
//! the cross-reference table. Signing targets are small documents, the
//! scan is cheap, and it keeps working when the xref table is damaged or
//! stored in a cross-reference stream. When the same object number
//! appears more than once (incremental updates), the later definition
//! wins.
//!
//! Saving performs a full rewrite: every object in id order, a classic
//! xref table, and a trailer. The rewrite is deterministic, which is what
//! lets the compositor promise byte-identical output for identical input.

use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::io::Write;

use crate::error::{Error, Result};
use crate::pdf::object::{Object, ObjectRef};
use crate::pdf::parser::Parser;
use crate::pdf::serializer::ObjectSerializer;

lazy_static! {
    /// Pattern for "N G obj" object headers
    static ref RE_OBJ_PATTERN: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(\d+)\s+(\d+)\s+obj").unwrap();

    /// Pattern for the trailer dictionary
    static ref RE_TRAILER: regex::bytes::Regex =
        regex::bytes::Regex::new(r"trailer\s*<<").unwrap();
}

/// Maximum reference-chain depth followed before assuming a cycle.
const MAX_RESOLVE_DEPTH: usize = 32;

/// A parsed PDF document held in memory for modification.
#[derive(Debug)]
pub struct PdfFile {
    version: String,
    objects: BTreeMap<u32, (u16, Object)>,
    root: ObjectRef,
    info: Option<ObjectRef>,
    max_id: u32,
}

impl PdfFile {
    /// Load a document from raw bytes.
    pub fn load(data: &[u8]) -> Result<Self> {
        if !data.starts_with(b"%PDF-") {
            let prefix = String::from_utf8_lossy(&data[..data.len().min(8)]).to_string();
            return Err(Error::InvalidHeader(prefix));
        }
        let version = data[5..]
            .iter()
            .take_while(|&&b| b == b'.' || b.is_ascii_digit())
            .map(|&b| b as char)
            .collect::<String>();
        let version = if version.is_empty() { "1.4".to_string() } else { version };

        let mut objects: BTreeMap<u32, (u16, Object)> = BTreeMap::new();
        for found in RE_OBJ_PATTERN.find_iter(data) {
            let start = found.start();

            // A real object header starts the line or follows whitespace;
            // anything else is a false hit inside stream data or a string.
            if start > 0 && !data[start - 1].is_ascii_whitespace() {
                continue;
            }

            match Parser::new(data, start).parse_indirect() {
                Ok((obj_ref, obj)) => {
                    objects.insert(obj_ref.id, (obj_ref.gen, obj));
                },
                Err(e) => {
                    log::debug!("skipping unparseable object at offset {}: {}", start, e);
                },
            }
        }

        if objects.is_empty() {
            return Err(Error::InvalidPdf("no objects found".to_string()));
        }

        let info = find_trailer(data).and_then(|t| t.get("Info").and_then(|o| o.as_reference()));
        let root = find_trailer(data)
            .and_then(|t| t.get("Root").and_then(|o| o.as_reference()))
            .filter(|r| objects.contains_key(&r.id))
            .or_else(|| {
                // No usable trailer (xref-stream PDFs, damaged files):
                // find the catalog among the scanned objects.
                objects.iter().find_map(|(&id, (gen, obj))| {
                    let is_catalog = obj
                        .as_dict()
                        .and_then(|d| d.get("Type"))
                        .and_then(|t| t.as_name())
                        == Some("Catalog");
                    is_catalog.then(|| ObjectRef::new(id, *gen))
                })
            })
            .ok_or_else(|| Error::InvalidPdf("document catalog not found".to_string()))?;

        let max_id = objects.keys().max().copied().unwrap_or(0);
        log::debug!(
            "loaded PDF {} with {} objects, catalog at {}",
            version,
            objects.len(),
            root
        );

        let info = info.filter(|r| objects.contains_key(&r.id));
        Ok(Self {
            version,
            objects,
            root,
            info,
            max_id,
        })
    }

    /// PDF version string from the header.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Reference to the document catalog.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// Number of objects currently held.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Look up an object by reference.
    pub fn get(&self, obj_ref: ObjectRef) -> Option<&Object> {
        self.objects.get(&obj_ref.id).map(|(_, obj)| obj)
    }

    /// Mutable lookup by reference.
    pub fn get_mut(&mut self, obj_ref: ObjectRef) -> Option<&mut Object> {
        self.objects.get_mut(&obj_ref.id).map(|(_, obj)| obj)
    }

    /// Add a new object, returning its reference.
    pub fn add_object(&mut self, obj: Object) -> ObjectRef {
        self.max_id += 1;
        self.objects.insert(self.max_id, (0, obj));
        ObjectRef::new(self.max_id, 0)
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        let mut current = obj;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(r) => {
                    current = self
                        .get(*r)
                        .ok_or_else(|| Error::InvalidPdf(format!("dangling reference {}", r)))?;
                },
                _ => return Ok(current),
            }
        }
        Err(Error::InvalidPdf("reference cycle".to_string()))
    }

    /// References to the document's pages in page-tree order.
    pub fn pages(&self) -> Result<Vec<ObjectRef>> {
        let catalog = self
            .get(self.root)
            .ok_or_else(|| Error::InvalidPdf("catalog object missing".to_string()))?;
        let catalog = catalog.as_dict().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: catalog.type_name().to_string(),
        })?;
        let pages_ref = catalog
            .get("Pages")
            .and_then(|o| o.as_reference())
            .ok_or_else(|| Error::InvalidPdf("catalog has no /Pages".to_string()))?;

        let mut out = Vec::new();
        self.collect_pages(pages_ref, 0, &mut out)?;
        if out.is_empty() {
            return Err(Error::InvalidPdf("page tree has no pages".to_string()));
        }
        Ok(out)
    }

    fn collect_pages(&self, node: ObjectRef, depth: usize, out: &mut Vec<ObjectRef>) -> Result<()> {
        if depth > MAX_RESOLVE_DEPTH {
            return Err(Error::InvalidPdf("page tree too deep".to_string()));
        }
        let dict = self
            .get(node)
            .and_then(|o| o.as_dict())
            .ok_or_else(|| Error::InvalidPdf(format!("page tree node {} missing", node)))?;

        match dict.get("Type").and_then(|t| t.as_name()) {
            Some("Pages") => {
                let kids = dict
                    .get("Kids")
                    .and_then(|o| o.as_array())
                    .ok_or_else(|| Error::InvalidPdf("pages node without /Kids".to_string()))?;
                for kid in kids {
                    let kid_ref = kid.as_reference().ok_or_else(|| {
                        Error::InvalidPdf("page tree kid is not a reference".to_string())
                    })?;
                    self.collect_pages(kid_ref, depth + 1, out)?;
                }
                Ok(())
            },
            _ => {
                out.push(node);
                Ok(())
            },
        }
    }

    /// Reference to a page by 1-based index.
    pub fn page(&self, index: usize) -> Result<ObjectRef> {
        let pages = self.pages()?;
        pages
            .get(index.saturating_sub(1))
            .copied()
            .ok_or_else(|| Error::InvalidPdf(format!("no page {} (document has {})", index, pages.len())))
    }

    /// MediaBox of a page as `[llx, lly, urx, ury]`, walking up the
    /// parent chain for inherited values.
    pub fn media_box(&self, page: ObjectRef) -> Result<[f64; 4]> {
        let mut node = page;
        for _ in 0..MAX_RESOLVE_DEPTH {
            let dict = self
                .get(node)
                .and_then(|o| o.as_dict())
                .ok_or_else(|| Error::InvalidPdf(format!("page node {} missing", node)))?;

            if let Some(mb) = dict.get("MediaBox") {
                let mb = self.resolve(mb)?;
                let arr = mb.as_array().ok_or_else(|| Error::InvalidObjectType {
                    expected: "Array".to_string(),
                    found: mb.type_name().to_string(),
                })?;
                if arr.len() != 4 {
                    return Err(Error::InvalidPdf("MediaBox must have 4 entries".to_string()));
                }
                let mut out = [0.0; 4];
                for (i, item) in arr.iter().enumerate() {
                    out[i] = self
                        .resolve(item)?
                        .as_number()
                        .ok_or_else(|| Error::InvalidPdf("non-numeric MediaBox entry".to_string()))?;
                }
                return Ok(out);
            }

            node = match dict.get("Parent").and_then(|o| o.as_reference()) {
                Some(parent) => parent,
                None => return Err(Error::InvalidPdf("page has no MediaBox".to_string())),
            };
        }
        Err(Error::InvalidPdf("parent chain too deep".to_string()))
    }

    /// Page size as `(width, height)` in points.
    pub fn page_size(&self, page: ObjectRef) -> Result<(f64, f64)> {
        let [llx, lly, urx, ury] = self.media_box(page)?;
        Ok((urx - llx, ury - lly))
    }

    /// Write the document out as a complete PDF.
    pub fn save(&self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::new();
        let mut output = Vec::new();

        writeln!(output, "%PDF-{}", self.version)?;
        // Binary marker so transports treat the file as binary.
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets: BTreeMap<u32, (u16, usize)> = BTreeMap::new();
        for (&id, (gen, obj)) in &self.objects {
            offsets.insert(id, (*gen, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(ObjectRef::new(id, *gen), obj));
        }

        // Classic xref table: one subsection covering 0..=max_id, with
        // free entries for gaps in the object numbering.
        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", self.max_id + 1)?;
        writeln!(output, "0000000000 65535 f ")?;
        for id in 1..=self.max_id {
            match offsets.get(&id) {
                Some((gen, offset)) => writeln!(output, "{:010} {:05} n ", offset, gen)?,
                None => writeln!(output, "0000000000 65535 f ")?,
            }
        }

        let mut trailer_entries = vec![
            ("Size", ObjectSerializer::integer(self.max_id as i64 + 1)),
            ("Root", Object::Reference(self.root)),
        ];
        if let Some(info) = self.info {
            trailer_entries.push(("Info", Object::Reference(info)));
        }
        let trailer = ObjectSerializer::dict(trailer_entries);

        writeln!(output, "trailer")?;
        output.extend_from_slice(&serializer.serialize(&trailer));
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        Ok(output)
    }
}

/// Parse the last trailer dictionary in the file, if any.
fn find_trailer(data: &[u8]) -> Option<crate::pdf::object::Dictionary> {
    let m = RE_TRAILER.find_iter(data).last()?;
    // Position the parser on the "<<" that the pattern matched.
    let dict_start = m.end() - 2;
    match Parser::new(data, dict_start).parse_object() {
        Ok(Object::Dictionary(d)) => Some(d),
        _ => None,
    }
}
