//! Spreadsheet reader for Rollcall uploads.
//!
//! Turns the bytes of an uploaded file into header-keyed [`Row`]s for the
//! import pipeline. Workbooks (xlsx, xlsm, xlsb, xls, ods) are read with
//! [`calamine`]; anything else that is valid UTF-8 is read as CSV. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! ```no_run
//! let bytes = std::fs::read("students.xlsx").unwrap();
//! let rows = rollcall_sheet::read_rows(&bytes).unwrap();
//! println!("{} rows", rows.len());
//! ```

pub mod error;

use std::io::Cursor;

use calamine::{Reader as _, open_workbook_auto_from_rs};
pub use error::{Error, Result};
pub use rollcall_core::import::Row;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: char = '\u{feff}';

/// Parse `bytes` into rows keyed by the first non-empty row.
///
/// Only the first worksheet of a workbook is read. Cells are trimmed; empty
/// cells are left out of the row, and rows with no cells at all are skipped.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<Row>> {
  if bytes.is_empty() {
    return Err(Error::Empty);
  }
  let grid = if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
    workbook_grid(bytes)?
  } else {
    let text = std::str::from_utf8(bytes).map_err(|_| Error::UnknownFormat)?;
    csv_grid(text)?
  };
  Ok(rows_from_grid(grid))
}

fn workbook_grid(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
  let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
  let range = workbook.worksheet_range_at(0).ok_or(Error::NoWorksheet)??;

  Ok(
    range
      .rows()
      .map(|cells| cells.iter().map(ToString::to_string).collect())
      .collect(),
  )
}

fn csv_grid(text: &str) -> Result<Vec<Vec<String>>> {
  let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_reader(text.as_bytes());

  reader
    .records()
    .map(|record| -> Result<Vec<String>> {
      Ok(record?.iter().map(str::to_owned).collect())
    })
    .collect()
}

/// Key every data row by the header row, dropping blanks.
fn rows_from_grid(grid: Vec<Vec<String>>) -> Vec<Row> {
  let mut lines = grid
    .into_iter()
    .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()));

  let Some(header) = lines.next() else {
    return Vec::new();
  };
  let header: Vec<String> = header.iter().map(|h| h.trim().to_owned()).collect();

  lines
    .filter_map(|cells| {
      let mut row = Row::new();
      for (key, value) in header.iter().zip(cells) {
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
          continue;
        }
        // First column wins when headers repeat.
        row.entry(key.clone()).or_insert_with(|| value.to_owned());
      }
      (!row.is_empty()).then_some(row)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use rust_xlsxwriter::Workbook;

  use super::*;

  fn xlsx(cells: &[(u32, u16, &str)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for &(row, col, value) in cells {
      sheet.write_string(row, col, value).unwrap();
    }
    workbook.save_to_buffer().unwrap()
  }

  #[test]
  fn reads_first_sheet_of_xlsx() {
    let bytes = xlsx(&[
      (0, 0, "Name"),
      (0, 1, "Registration Number"),
      (0, 2, "Email"),
      (1, 0, "Alice Johnson"),
      (1, 1, "REG001"),
      (1, 2, "alice.johnson@student.edu"),
      (2, 0, "Bob Smith"),
      (2, 2, "bob.smith@student.edu"),
    ]);

    let rows = read_rows(&bytes).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Name"], "Alice Johnson");
    assert_eq!(rows[0]["Registration Number"], "REG001");
    assert_eq!(rows[0]["Email"], "alice.johnson@student.edu");
    assert!(!rows[1].contains_key("Registration Number"));
  }

  #[test]
  fn numeric_cells_render_without_fraction() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "RegNo").unwrap();
    sheet.write_string(1, 0, "Carol").unwrap();
    sheet.write_number(1, 1, 1001).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let rows = read_rows(&bytes).unwrap();
    assert_eq!(rows[0]["RegNo"], "1001");
  }

  #[test]
  fn blank_rows_and_leading_gaps_are_skipped() {
    let bytes = xlsx(&[
      (2, 1, "Name"),
      (2, 2, "Email"),
      (4, 1, "Dave"),
      (4, 2, "dave@student.edu"),
    ]);
    let rows = read_rows(&bytes).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Name"], "Dave");
  }

  #[test]
  fn reads_csv_with_bom_and_quotes() {
    let text = "\u{feff}Name,Email,RegNo\n\
                \"Smith, Jane\",jane@student.edu,R1\n\
                ,,\n\
                Tom,tom@student.edu\n";
    let rows = read_rows(text.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Name"], "Smith, Jane");
    assert_eq!(rows[0]["RegNo"], "R1");
    assert_eq!(rows[1]["Email"], "tom@student.edu");
    assert!(!rows[1].contains_key("RegNo"));
  }

  #[test]
  fn cells_are_trimmed_and_unnamed_columns_ignored() {
    let text = " Name ,,Email\n  Erin  ,ignored, erin@student.edu \n";
    let rows = read_rows(text.as_bytes()).unwrap();
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[0]["Name"], "Erin");
    assert_eq!(rows[0]["Email"], "erin@student.edu");
  }

  #[test]
  fn header_only_yields_no_rows() {
    assert!(read_rows(b"Name,Email\n").unwrap().is_empty());
  }

  #[test]
  fn rejects_empty_and_binary_input() {
    assert!(matches!(read_rows(b""), Err(Error::Empty)));
    assert!(matches!(
      read_rows(&[0xff, 0xfe, 0x00, 0x81]),
      Err(Error::UnknownFormat)
    ));
  }

  #[test]
  fn rejects_corrupt_workbook() {
    let mut bytes = ZIP_MAGIC.to_vec();
    bytes.extend_from_slice(b"definitely not a zip archive");
    assert!(read_rows(&bytes).is_err());
  }
}
