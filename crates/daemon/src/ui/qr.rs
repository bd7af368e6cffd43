//! QR codes for the share URL.
//!
//! Phones on the LAN scan the code to open the receiver page. The same code
//! is rendered in the terminal with Unicode half blocks, written to a PNG
//! file, or returned as a `data:` URL for the web UI.

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{ImageBuffer, Luma};
use qrcode::{Color, QrCode};

/// QR code module size in pixels for PNG output.
const PNG_MODULE_SIZE: u32 = 8;

/// Quiet zone (border) size in modules.
const QUIET_ZONE: usize = 4;

/// Generates a terminal-displayable QR code using Unicode block characters.
///
/// Two module rows are packed into one text line:
/// - Upper half block (U+2580): dark on top, light below
/// - Lower half block (U+2584): light on top, dark below
/// - Full block (U+2588): both dark
/// - Space: both light
pub fn terminal_qr(url: &str) -> anyhow::Result<String> {
    let code = QrCode::new(url.as_bytes())?;
    let modules = code.to_colors();
    let width = code.width();
    let height = modules.len() / width;
    let is_dark = |row: usize, col: usize| row < height && modules[row * width + col] == Color::Dark;

    let full_width = width + 2 * QUIET_ZONE;
    let blank_line = format!("{}\n", " ".repeat(full_width));
    let margin = " ".repeat(QUIET_ZONE);
    let mut output = blank_line.repeat(QUIET_ZONE / 2);

    for row in (0..height).step_by(2) {
        output.push_str(&margin);
        for col in 0..width {
            output.push(match (is_dark(row, col), is_dark(row + 1, col)) {
                (true, true) => '\u{2588}',
                (true, false) => '\u{2580}',
                (false, true) => '\u{2584}',
                (false, false) => ' ',
            });
        }
        output.push_str(&margin);
        output.push('\n');
    }

    output.push_str(&blank_line.repeat(QUIET_ZONE / 2));
    Ok(output)
}

/// Generates a PNG QR code and returns it as bytes.
pub fn png_qr_bytes(url: &str) -> anyhow::Result<Vec<u8>> {
    let img = render_image(url)?;

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

/// Generates a PNG QR code and saves it to `path`.
pub fn save_png_qr(url: &str, path: &Path) -> anyhow::Result<()> {
    let img = render_image(url)?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Generates a PNG QR code as a `data:image/png;base64,...` URL.
pub fn png_data_url(url: &str) -> anyhow::Result<String> {
    let bytes = png_qr_bytes(url)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(bytes)))
}

fn render_image(url: &str) -> anyhow::Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let code = QrCode::new(url.as_bytes())?;
    let modules = code.to_colors();
    let qr_width = code.width();

    let quiet_zone_pixels = QUIET_ZONE as u32 * PNG_MODULE_SIZE;
    let image_size = qr_width as u32 * PNG_MODULE_SIZE + 2 * quiet_zone_pixels;

    // White background, including the quiet zone
    let mut img: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(image_size, image_size, Luma([255u8]));

    for (idx, color) in modules.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let x_start = quiet_zone_pixels + (idx % qr_width) as u32 * PNG_MODULE_SIZE;
        let y_start = quiet_zone_pixels + (idx / qr_width) as u32 * PNG_MODULE_SIZE;

        for dy in 0..PNG_MODULE_SIZE {
            for dx in 0..PNG_MODULE_SIZE {
                img.put_pixel(x_start + dx, y_start + dy, Luma([0u8]));
            }
        }
    }

    Ok(img)
}
