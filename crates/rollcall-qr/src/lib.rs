//! QR code generation for scan tokens.
//!
//! [`QrGenerator`] implements [`CodeGenerator`]: the token is encoded as a QR
//! symbol, rendered to a greyscale PNG and returned as a base64 `data:` URL
//! that a browser can drop straight into an `<img src>`.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use rollcall_core::{Error, Result, import::CodeGenerator};

/// Default minimum edge length of the rendered image, in pixels.
pub const DEFAULT_SIZE: u32 = 300;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Copy)]
pub struct QrGenerator {
  /// Minimum width and height; the renderer rounds up to whole modules.
  pub size: u32,
}

impl Default for QrGenerator {
  fn default() -> Self { Self { size: DEFAULT_SIZE } }
}

impl QrGenerator {
  pub fn new(size: u32) -> Self { Self { size } }

  /// Render `token` as PNG bytes.
  pub fn png(&self, token: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(token.as_bytes())
      .map_err(|e| Error::Encoding(format!("qr: {e}")))?;
    let image = code
      .render::<Luma<u8>>()
      .min_dimensions(self.size, self.size)
      .build();

    let mut png = Vec::new();
    image
      .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
      .map_err(|e| Error::Encoding(format!("png: {e}")))?;
    Ok(png)
  }
}

impl CodeGenerator for QrGenerator {
  fn encode(&self, token: &str) -> Result<String> {
    let png = self.png(token)?;
    Ok(format!("{DATA_URL_PREFIX}{}", B64.encode(png)))
  }
}
