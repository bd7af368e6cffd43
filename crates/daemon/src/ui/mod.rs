//! Terminal-facing output: QR codes and launching the admin page.

pub mod launch;
pub mod qr;

pub use launch::{admin_url, open_browser};
pub use qr::{png_data_url, png_qr_bytes, save_png_qr, terminal_qr};
