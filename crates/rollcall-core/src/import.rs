//! The import pipeline: spreadsheet rows in, a fresh subject set out.
//!
//! An import is a full replace. Every earlier subject and every attendance
//! event is dropped, since the old scan tokens stop resolving.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Error, Result, store::RecordStore, subject::Subject};

/// One spreadsheet row, keyed by header cell.
pub type Row = BTreeMap<String, String>;

const NAME_ALIASES: &[&str] = &["name", "full name"];
const EMAIL_ALIASES: &[&str] = &["email", "e-mail", "email address"];
const REG_ALIASES: &[&str] =
  &["registration number", "regno", "reg no", "registration no"];

// ─── Code generation ─────────────────────────────────────────────────────────

/// Renders a scannable image for a scan token.
pub trait CodeGenerator: Send + Sync {
  /// Encode `token`, returning the image as a `data:` URL.
  ///
  /// Failures are reported as [`Error::Encoding`] and cost only that row.
  fn encode(&self, token: &str) -> Result<String>;
}

// ─── Identifier allocation ───────────────────────────────────────────────────

/// How a subject's durable id relates to its scan token.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IdScheme {
  /// Two independent UUIDs; the QR code never reveals the durable id.
  #[default]
  Distinct,
  /// One UUID serves as both id and scan token.
  Unified,
}

impl IdScheme {
  /// Allocate `(id, scan_token)`.
  pub fn allocate(self) -> (String, String) {
    match self {
      Self::Distinct => (Uuid::new_v4().to_string(), Uuid::new_v4().to_string()),
      Self::Unified => {
        let id = Uuid::new_v4().to_string();
        (id.clone(), id)
      }
    }
  }
}

// ─── Row extraction ──────────────────────────────────────────────────────────

/// The fields the pipeline needs from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFields {
  pub name:                String,
  pub email:               String,
  pub registration_number: Option<String>,
}

fn normalize_key(key: &str) -> String {
  key
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// First non-blank value under any header matching `aliases`.
fn lookup(row: &Row, aliases: &[&str]) -> Option<String> {
  row
    .iter()
    .filter(|(k, _)| aliases.contains(&normalize_key(k).as_str()))
    .map(|(_, v)| v.trim())
    .find(|v| !v.is_empty())
    .map(str::to_owned)
}

/// Pull name, email and registration number out of `row`.
///
/// Returns `None` when name or email is missing or blank.
pub fn extract(row: &Row) -> Option<RowFields> {
  Some(RowFields {
    name:                lookup(row, NAME_ALIASES)?,
    email:               lookup(row, EMAIL_ALIASES)?,
    registration_number: lookup(row, REG_ALIASES),
  })
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub imported: usize,
  /// Rows dropped for missing fields or a failed QR encode.
  pub skipped:  usize,
}

/// Turn rows into subjects without touching the store.
pub fn build_subjects<G>(
  rows: &[Row],
  generator: &G,
  scheme: IdScheme,
) -> (Vec<Subject>, usize)
where
  G: CodeGenerator + ?Sized,
{
  let mut subjects = Vec::with_capacity(rows.len());
  let mut skipped = 0;

  for (index, row) in rows.iter().enumerate() {
    let Some(fields) = extract(row) else {
      skipped += 1;
      continue;
    };

    let (id, scan_token) = scheme.allocate();
    let qr_code = match generator.encode(&scan_token) {
      Ok(url) => url,
      Err(e) => {
        warn!(
          row = index + 1,
          email = %fields.email,
          error = %e,
          "QR generation failed; row skipped"
        );
        skipped += 1;
        continue;
      }
    };

    subjects.push(Subject {
      id,
      scan_token,
      name: fields.name,
      registration_number: fields.registration_number,
      email: fields.email,
      qr_code: Some(qr_code),
    });
  }

  (subjects, skipped)
}

/// Replace the store's subjects (and clear its events) with `rows`.
pub async fn import_subjects<S, G>(
  store: &S,
  generator: &G,
  scheme: IdScheme,
  rows: &[Row],
) -> Result<ImportSummary>
where
  S: RecordStore,
  G: CodeGenerator + ?Sized,
{
  let (subjects, skipped) = build_subjects(rows, generator, scheme);
  let imported = subjects.len();

  store
    .replace_all_subjects(subjects)
    .await
    .map_err(Error::store)?;

  info!(imported, skipped, "subjects imported");
  Ok(ImportSummary { imported, skipped })
}
