use tracing::trace;
use url::Url;

/// Opens URLs for the user
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &Url) -> std::io::Result<()>;
}

/// Launches the platform's default web browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &Url) -> std::io::Result<()> {
        trace!("Opening {} in the default browser...", url);
        webbrowser::open(url.as_str())
    }
}
