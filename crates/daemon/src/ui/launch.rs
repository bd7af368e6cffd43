//! Opening the admin page in the host's default browser.

use std::io;
use std::process::Command;

/// Admin page URL for a server listening on `port`.
pub fn admin_url(port: u16) -> String {
    format!("http://localhost:{}/admin.html", port)
}

/// Launch the default browser on `url`. Does not wait for it to exit.
#[cfg(target_os = "macos")]
pub fn open_browser(url: &str) -> io::Result<()> {
    Command::new("open").arg(url).spawn()?;
    Ok(())
}

#[cfg(target_os = "windows")]
pub fn open_browser(url: &str) -> io::Result<()> {
    // `start` treats its first quoted argument as a window title.
    Command::new("cmd").args(["/C", "start", "", url]).spawn()?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn open_browser(url: &str) -> io::Result<()> {
    Command::new("xdg-open").arg(url).spawn()?;
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
pub fn open_browser(_url: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Opening a browser is not supported on this platform",
    ))
}
