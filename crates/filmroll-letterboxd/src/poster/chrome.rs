//! Headless Chromium [`PageRenderer`] (feature `chrome`).
//!
//! Drives a single browser tab over CDP. The async chromiumoxide API is
//! bridged onto the shared runtime the same way HTTP calls are, so the
//! resolver stays synchronous.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use filmroll_core::SHARED_RUNTIME;
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use super::rendered::{PageRenderer, RenderError, RenderedImage};

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 1000;

/// One browser, one reusable tab
pub struct ChromeRenderer {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeRenderer {
    /// Launch headless Chromium and open a blank tab with `user_agent`.
    pub fn launch(user_agent: &str) -> Result<Self, RenderError> {
        let config = BrowserConfig::builder()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .build()
            .map_err(RenderError::Launch)?;

        SHARED_RUNTIME.handle().block_on(async {
            let (browser, mut events) = Browser::launch(config)
                .await
                .map_err(|e| RenderError::Launch(e.to_string()))?;

            // CDP events must be polled for any command to complete
            let handler = tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if let Err(e) = event {
                        log::debug!("Browser handler stopped: {e}");
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| RenderError::Launch(e.to_string()))?;
            page.set_user_agent(SetUserAgentOverrideParams::new(user_agent))
                .await
                .map_err(|e| RenderError::Launch(e.to_string()))?;

            log::info!("Headless browser ready");
            Ok(Self {
                browser,
                page,
                handler,
            })
        })
    }
}

impl PageRenderer for ChromeRenderer {
    fn navigate(&self, url: &str) -> Result<(), RenderError> {
        let nav_err = |e: chromiumoxide::error::CdpError| RenderError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };
        SHARED_RUNTIME.handle().block_on(async {
            self.page.goto(url).await.map_err(nav_err)?;
            self.page.wait_for_navigation().await.map_err(nav_err)?;
            Ok(())
        })
    }

    fn query_images(&self, selector: &str) -> Result<Vec<RenderedImage>, RenderError> {
        let selector =
            serde_json::to_string(selector).map_err(|e| RenderError::Script(e.to_string()))?;
        let script = format!(
            "Array.from(document.querySelectorAll({selector})).map(el => ({{\
                alt: el.getAttribute('alt'),\
                currentSrc: el.currentSrc || null,\
                srcset: el.getAttribute('srcset'),\
                src: el.getAttribute('src'),\
                dataSrc: el.getAttribute('data-src')\
            }}))"
        );

        SHARED_RUNTIME.handle().block_on(async {
            self.page
                .evaluate(script)
                .await
                .map_err(|e| RenderError::Script(e.to_string()))?
                .into_value::<Vec<RenderedImage>>()
                .map_err(|e| RenderError::Script(e.to_string()))
        })
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        let browser = &mut self.browser;
        if let Err(e) = SHARED_RUNTIME.handle().block_on(browser.close()) {
            log::warn!("Failed to close browser: {e}");
        }
        self.handler.abort();
    }
}
