//! Terminal rendering of the inventory

use rackscan_core::InventoryEntry;
use std::fmt::Write;

const HEADERS: [&str; 3] = ["IP", "Name", "Description"];

/// Render entries as an aligned three-column table
pub fn render_table(entries: &[InventoryEntry]) -> String {
    let rows: Vec<[&str; 3]> = entries
        .iter()
        .map(|e| [e.ip.as_str(), e.name.as_str(), e.description.as_str()])
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(
        &mut out,
        &[rule[0].as_str(), rule[1].as_str(), rule[2].as_str()],
        &widths,
    );
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[&str; 3], widths: &[usize; 3]) {
    let line = format!(
        "{:<w0$}  {:<w1$}  {}",
        cells[0],
        cells[1],
        cells[2],
        w0 = widths[0],
        w1 = widths[1],
    );
    let _ = writeln!(out, "{}", line.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ip: &str, name: &str, description: &str) -> InventoryEntry {
        InventoryEntry {
            ip: ip.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_columns_align_to_widest_cell() {
        let table = render_table(&[
            entry("10.0.0.1", "core", "Core switch"),
            entry("192.168.100.200", "edge-router", ""),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "IP               Name         Description");
        assert_eq!(lines[2], "10.0.0.1         core         Core switch");
        assert_eq!(lines[3], "192.168.100.200  edge-router");
    }

    #[test]
    fn test_empty_inventory_has_only_headers() {
        let table = render_table(&[]);
        assert_eq!(table.lines().count(), 2);
        assert!(table.starts_with("IP  Name  Description"));
    }
}
