// SPDX-License-Identifier: PMPL-1.0-or-later

//! XML loader for Nessus v2 exports
//!
//! Reads the file, streams it through `quick-xml` into an owned
//! [`Element`] tree and checks that a `<Report>` container exists under the
//! root. Nothing deeper is validated here; the builder is permissive about
//! everything below `<Report>`.

pub mod tree;

pub use tree::Element;

use crate::error::InputError;
use crate::types::SourceInfo;
use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const REPORT_TAG: &str = "Report";
const EXPECTED_ROOT: &str = "NessusClientData_v2";

/// Parsed document plus where it came from
#[derive(Debug, Clone)]
pub struct DocumentTree {
    pub source: SourceInfo,
    pub root: Element,
    report_index: usize,
}

impl DocumentTree {
    pub fn from_bytes(bytes: &[u8], label: &str) -> Result<Self, InputError> {
        let root = parse_element_tree(bytes, label)?;
        let report_index = root
            .children
            .iter()
            .position(|child| child.name == REPORT_TAG)
            .ok_or_else(|| InputError::MissingReport {
                label: label.to_string(),
                root: root.name.clone(),
            })?;

        if root.name != EXPECTED_ROOT {
            debug!(root = %root.name, "unexpected root element, continuing");
        }

        Ok(Self {
            source: SourceInfo {
                label: label.to_string(),
                bytes: bytes.len() as u64,
                sha256: hex::encode(Sha256::digest(bytes)),
            },
            root,
            report_index,
        })
    }

    /// The `<Report>` container located at load time.
    pub fn report(&self) -> &Element {
        &self.root.children[self.report_index]
    }
}

/// Load and parse a `.nessus` file, refusing anything above `max_bytes`.
pub fn load(path: &Path, max_bytes: u64) -> Result<DocumentTree, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let metadata = fs::metadata(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() > max_bytes {
        return Err(InputError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = fs::read(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read scan export");

    DocumentTree::from_bytes(&bytes, &path.display().to_string())
}

fn parse_element_tree(bytes: &[u8], label: &str) -> Result<Element, InputError> {
    let malformed = |position: u64, message: String| InputError::Malformed {
        label: label.to_string(),
        position,
        message,
    };

    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| malformed(reader.buffer_position() as u64, err.to_string()))?;
        let position = reader.buffer_position() as u64;

        match event {
            Event::Start(start) => {
                stack.push(open_element(&start).map_err(|msg| malformed(position, msg))?);
            }
            Event::Empty(start) => {
                let element = open_element(&start).map_err(|msg| malformed(position, msg))?;
                attach(element, &mut stack, &mut root).map_err(|msg| malformed(position, msg))?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed(position, "closing tag without opening tag".into()))?;
                attach(element, &mut stack, &mut root).map_err(|msg| malformed(position, msg))?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let value = text
                        .unescape()
                        .map_err(|err| malformed(position, err.to_string()))?;
                    current.text.push_str(&value);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let position = reader.buffer_position() as u64;
    if let Some(open) = stack.last() {
        return Err(malformed(
            position,
            format!("document ended inside <{}>", open.name),
        ));
    }
    root.ok_or_else(|| malformed(position, "document has no root element".into()))
}

fn open_element(start: &quick_xml::events::BytesStart<'_>) -> Result<Element, String> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| err.to_string())?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(format!("second root element <{}>", element.name));
    }
    *root = Some(element);
    Ok(())
}
