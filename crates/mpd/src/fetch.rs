use reqwest::{header::ACCEPT, Client, Url};

use crate::error::{MpdError, MpdResult};

const MANIFEST_ACCEPT: &str = "application/dash+xml,video/vnd.mpeg.dash.mpd";

/// Downloads a manifest with up to `total_retry` attempts. At least one
/// request is always sent.
///
/// Returns the final URL after redirects together with the manifest text.
pub async fn load_manifest(client: &Client, url: Url, total_retry: u32) -> MpdResult<(Url, String)> {
    log::info!("Start fetching MPD file.");

    let mut retry = total_retry.max(1);
    let (url, manifest) = loop {
        if retry == 0 {
            return Err(MpdError::ManifestFetch(url));
        }

        let response = client
            .get(url.clone())
            .header(ACCEPT, MANIFEST_ACCEPT)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());
        match response {
            Ok(resp) => {
                let final_url = resp.url().clone();
                match resp.text().await {
                    Ok(text) => break (final_url, text),
                    Err(error) => {
                        log::warn!("Failed to fetch MPD file: {error}");
                        retry -= 1;
                    }
                }
            }
            Err(error) => {
                log::warn!("Failed to fetch MPD file: {error}");
                retry -= 1;
            }
        }
    };
    log::info!("MPD file fetched.");

    Ok((url, manifest))
}
