use std::time::Duration;

use telaura_core::{FsImageFetcher, GalleryError, ImageFetcher};

/// Fetches `http(s)` sources over the network and everything else from disk.
#[derive(Debug)]
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
    local: FsImageFetcher,
}

impl HttpImageFetcher {
    pub fn new(local: FsImageFetcher) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("telaura/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, local })
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, source: &str) -> telaura_core::Result<Vec<u8>> {
        if !is_remote(source) {
            return self.local.fetch(source);
        }

        let response = self
            .client
            .get(source)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| GalleryError::msg(format!("request failed: {e}")))?;
        let bytes = response
            .bytes()
            .map_err(|e| GalleryError::msg(format!("reading body failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}
