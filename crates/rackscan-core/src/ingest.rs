//! Equipment description ingestion
//!
//! Each `*.xml` file in the equipment directory describes one piece of
//! equipment: a `block` element carrying the equipment attributes, with
//! nested `board` elements that in turn hold `port` elements. Files are
//! read with a streaming pull parser and handled independently, so one
//! broken file never stops the rest of a scan.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::equipment::{Board, Equipment, Port};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },
}

/// Result of scanning an equipment directory
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Successfully parsed equipment, in file order
    pub equipment: Vec<Equipment>,
    /// Files that were skipped and why
    pub failed: Vec<(PathBuf, IngestError)>,
}

/// Parse every `*.xml` file in `dir`.
///
/// Only failing to list the directory itself is an error. Unreadable or
/// malformed files are logged and reported in [`ScanReport::failed`].
/// Files are visited in path order so that duplicate IPs resolve the same
/// way on every run.
pub fn scan_directory(dir: &Path) -> Result<ScanReport, IngestError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && has_xml_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = ScanReport::default();
    for path in paths {
        match parse_equipment_file(&path) {
            Ok(equipment) => report.equipment.push(equipment),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping equipment file");
                report.failed.push((path, e));
            }
        }
    }

    info!(
        dir = %dir.display(),
        parsed = report.equipment.len(),
        skipped = report.failed.len(),
        "Equipment directory scanned"
    );
    Ok(report)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Parse a single equipment description file.
///
/// The file is streamed through the XML reader, which decodes it using the
/// encoding named in the XML declaration (UTF-8 when there is none).
pub fn parse_equipment_file(path: &Path) -> Result<Equipment, IngestError> {
    debug!(path = %path.display(), "Reading equipment file");
    let file = File::open(path)?;
    let equipment = parse_equipment(Reader::from_reader(BufReader::new(file)))?;
    debug!(
        path = %path.display(),
        ip = %equipment.ip,
        boards = equipment.boards.len(),
        ports = equipment.port_total(),
        "Parsed equipment"
    );
    Ok(equipment)
}

/// Parse an equipment description document.
///
/// If the document holds several `block` elements their attributes
/// overwrite each other in document order, so the last one wins.
pub fn parse_equipment_xml(xml: &str) -> Result<Equipment, IngestError> {
    parse_equipment(Reader::from_reader(xml.as_bytes()))
}

fn parse_equipment<R: BufRead>(mut reader: Reader<R>) -> Result<Equipment, IngestError> {
    let mut builder = EquipmentBuilder::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        buf.clear();
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err(malformed(&reader, e.to_string())),
        };
        let decoder = reader.decoder();

        match event {
            Event::Start(start) => {
                if depth == 0 && seen_root {
                    return Err(malformed(&reader, EXTRA_CONTENT.to_string()));
                }
                depth += 1;
                seen_root = true;
                builder
                    .open_element(&start, decoder, depth, false)
                    .map_err(|e| malformed(&reader, e.to_string()))?;
            }
            Event::Empty(start) => {
                if depth == 0 && seen_root {
                    return Err(malformed(&reader, EXTRA_CONTENT.to_string()));
                }
                seen_root = true;
                builder
                    .open_element(&start, decoder, depth + 1, true)
                    .map_err(|e| malformed(&reader, e.to_string()))?;
            }
            Event::End(_) => {
                builder.close_element(depth);
                depth = depth.saturating_sub(1);
            }
            Event::Text(text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    let message = if seen_root {
                        EXTRA_CONTENT
                    } else {
                        "text before the root element"
                    };
                    return Err(malformed(&reader, message.to_string()));
                }
            }
            Event::CData(_) if depth == 0 => {
                let message = "character data outside the root element";
                return Err(malformed(&reader, message.to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(malformed(&reader, "document has no root element".to_string()));
    }
    if depth != 0 {
        return Err(malformed(&reader, "unexpected end of document".to_string()));
    }

    Ok(builder.equipment)
}

const EXTRA_CONTENT: &str = "extra content at end of document";

fn malformed<R>(reader: &Reader<R>, message: String) -> IngestError {
    IngestError::Malformed {
        position: reader.buffer_position() as u64,
        message,
    }
}

#[derive(Default)]
struct EquipmentBuilder {
    equipment: Equipment,
    board: Option<OpenBoard>,
}

/// A board whose end tag has not been seen yet
struct OpenBoard {
    board: Board,
    depth: usize,
}

impl EquipmentBuilder {
    fn open_element(
        &mut self,
        start: &BytesStart<'_>,
        decoder: Decoder,
        depth: usize,
        empty: bool,
    ) -> Result<(), quick_xml::Error> {
        let name = start.name();
        match (name.as_ref(), self.board.as_mut()) {
            // Inside a board only ports are recognised
            (b"port", Some(open)) => {
                let attrs = Attributes::read(start, decoder)?;
                open.board.ports.push(Port {
                    id: attrs.text("id"),
                    num: attrs.int("Num"),
                    media: attrs.int("Media"),
                    signal: attrs.int("Signal"),
                });
            }
            (b"port", None) => trace!("Ignoring port outside of a board"),
            (b"block", None) => {
                let attrs = Attributes::read(start, decoder)?;
                let equipment = &mut self.equipment;
                equipment.block_id = attrs.text("id");
                equipment.name = attrs.text("Name");
                equipment.ip = attrs.text("IP");
                equipment.board_count = attrs.int("BoardCount");
                equipment.rack_row = attrs.int("MtR");
                equipment.rack_column = attrs.int("MtC");
                equipment.description = attrs.text("Description");
                equipment.label = attrs.text("Label");
            }
            (b"board", None) => {
                let attrs = Attributes::read(start, decoder)?;
                let board = Board {
                    id: attrs.text("id"),
                    num: attrs.int("Num"),
                    name: attrs.text("Name"),
                    port_count: attrs.int("PortCount"),
                    int_links: attrs.text("IntLinks"),
                    algorithms: attrs.text("Algoritms"),
                    ports: Vec::new(),
                };
                if empty {
                    self.equipment.boards.push(board);
                } else {
                    self.board = Some(OpenBoard { board, depth });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close_element(&mut self, depth: usize) {
        if self.board.as_ref().is_some_and(|open| open.depth == depth) {
            if let Some(open) = self.board.take() {
                self.equipment.boards.push(open.board);
            }
        }
    }
}

/// Unescaped attribute values of a single element
struct Attributes(Vec<(Vec<u8>, String)>);

impl Attributes {
    fn read(start: &BytesStart<'_>, decoder: Decoder) -> Result<Self, quick_xml::Error> {
        let mut values = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let value = attr.decode_and_unescape_value(decoder)?.into_owned();
            values.push((attr.key.as_ref().to_vec(), value));
        }
        Ok(Self(values))
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.as_slice() == name.as_bytes())
            .map(|(_, value)| value.as_str())
    }

    /// String attribute; absent means empty
    fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Integer attribute; absent or non-numeric means 0
    fn int(&self, name: &str) -> i32 {
        self.get(name).map(parse_int).unwrap_or(0)
    }
}

fn parse_int(value: &str) -> i32 {
    value.trim().parse().unwrap_or(0)
}
