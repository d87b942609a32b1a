//! IDL lookup through the Solana explorer
//!
//! The explorer publishes a "Download IDL" link on a program's Anchor page.
//! [`ExplorerClient::find_idl_link`] scrapes that link and
//! [`ExplorerClient::download_idl`] fetches the document behind it.


use std::str::FromStr;

use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::config::{Cluster, ViewerConfig};
use crate::errors::{ErrorContext, ErrorExt, ViewerError, ViewerResult};

/// Anchor text of the explorer's download link
pub const DOWNLOAD_LABEL: &str = "Download IDL";

/// Client for the explorer's program pages
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    client: Client,
    explorer_url: String,
    cluster: Cluster,
}

impl ExplorerClient {
    /// Create a client from the viewer configuration
    pub fn new(config: &ViewerConfig) -> ViewerResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("solana-idl-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_simple_context("fetch", "building HTTP client")?;

        Ok(Self {
            client,
            explorer_url: config.explorer_url.trim_end_matches('/').to_string(),
            cluster: config.cluster,
        })
    }

    /// URL of the Anchor page for a program
    pub fn program_page_url(&self, program_id: &str) -> String {
        format!(
            "{}/address/{}/anchor-program?cluster={}",
            self.explorer_url, program_id, self.cluster
        )
    }

    /// Find the absolute URL of the IDL download for a program
    pub async fn find_idl_link(&self, program_id: &str) -> ViewerResult<String> {
        let program_id = validate_program_id(program_id)?.to_string();
        let page_url = self.program_page_url(&program_id);
        let context = || ErrorContext {
            program_id: Some(program_id.clone()),
            component: "fetch".to_string(),
            operation: "loading explorer page".to_string(),
            details: Some(page_url.clone()),
        };

        info!("Looking up IDL for {} on {}", program_id, self.cluster);
        debug!("GET {}", page_url);

        let html = self
            .client
            .get(&page_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(context())?
            .text()
            .await
            .with_context(context())?;

        match extract_download_link(&html) {
            Some(href) => {
                let url = absolute_url(&self.explorer_url, &href);
                debug!("Found IDL link for {}: {}", program_id, url);
                Ok(url)
            }
            None => {
                warn!("No '{}' link on {}", DOWNLOAD_LABEL, page_url);
                Err(ViewerError::IdlNotFound(program_id))
            }
        }
    }

    /// Fetch the IDL document behind a download link
    pub async fn download_idl(&self, url: &str) -> ViewerResult<Value> {
        if url.starts_with("data:") {
            let body = decode_data_url(url).ok_or_else(|| {
                ViewerError::InvalidFormat("unsupported inline IDL encoding".to_string())
            })?;
            debug!("Decoding inline IDL ({} bytes)", body.len());
            return serde_json::from_str(&body).with_simple_context("fetch", "parsing inline IDL");
        }

        let context = || ErrorContext {
            program_id: None,
            component: "fetch".to_string(),
            operation: "downloading IDL".to_string(),
            details: Some(url.to_string()),
        };

        debug!("GET {}", url);
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(context())?
            .text()
            .await
            .with_context(context())?;

        serde_json::from_str(&body).with_context(context())
    }

    /// Look up and download the IDL of a program
    pub async fn fetch_idl(&self, program_id: &str) -> ViewerResult<Value> {
        let link = self.find_idl_link(program_id).await?;
        self.download_idl(&link).await
    }
}

/// Check that a program id is present and is a base58 public key
pub fn validate_program_id(program_id: &str) -> ViewerResult<Pubkey> {
    let trimmed = program_id.trim();
    if trimmed.is_empty() {
        return Err(ViewerError::MissingProgramId);
    }
    Pubkey::from_str(trimmed).map_err(|_| ViewerError::InvalidProgramId(trimmed.to_string()))
}

/// Resolve an href found on an explorer page
pub fn absolute_url(explorer_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") || href.starts_with("data:") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", explorer_url, href)
    } else {
        format!("{}/{}", explorer_url, href)
    }
}

/// Find the href of the first anchor whose text contains "Download IDL".
///
/// Whitespace in the anchor text is collapsed, so a label split across lines
/// or nested elements still matches. Anchors with an empty href are skipped.
pub fn extract_download_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").ok()?;

    document.select(&anchors).find_map(|anchor| {
        let text = anchor.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.contains(DOWNLOAD_LABEL) {
            return None;
        }
        anchor
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    })
}

/// Payload of a percent-encoded `data:` URL, for links that embed the IDL inline
fn decode_data_url(url: &str) -> Option<String> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if header.ends_with(";base64") {
        return None;
    }
    percent_decode_str(payload)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
