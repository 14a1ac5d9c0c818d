//! Subject: a person eligible for attendance tracking.
//!
//! Subjects are created in bulk by the import pipeline and never edited; a
//! re-import replaces the whole set.

use serde::{Deserialize, Serialize};

/// A student as stored and served.
///
/// Field names on the wire follow the browser client (`qrId`, `qrCode`,
/// `registrationNumber`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  /// Durable identifier; appears in reports as "Student ID".
  pub id:                  String,
  /// Token embedded in the QR image and submitted at scan time.
  #[serde(rename = "qrId")]
  pub scan_token:          String,
  pub name:                String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub registration_number: Option<String>,
  pub email:               String,
  /// PNG `data:` URL of the QR code, if one was generated.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub qr_code:             Option<String>,
}
