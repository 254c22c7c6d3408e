use ledger::Blockchain;

/// How a friend's chain is obtained. The peer's HTTP surface lives outside
/// this crate; an implementation only promises a decoded chain or an
/// error.
pub trait ChainFetcher: Send + Sync {
    fn fetch(&self) -> Result<Blockchain, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("peer answered with HTTP status {0}")]
    Status(u16),

    #[error("chain could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Blocking GET of the peer's serialized chain at `{base}/blockchain`.
///
/// No timeout beyond the transport default; a hung peer shows up as a late
/// failure for that cycle.
pub struct HttpChainFetcher {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpChainFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            url: format!("{}/blockchain", base_url.trim_end_matches('/')),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl ChainFetcher for HttpChainFetcher {
    fn fetch(&self) -> Result<Blockchain, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|error| FetchError::Transport(error.to_string()))?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let body = response
            .text()
            .map_err(|error| FetchError::Transport(error.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_url_targets_the_blockchain_resource() {
        let fetcher = HttpChainFetcher::new("http://localhost:8081/");
        assert_eq!(fetcher.url, "http://localhost:8081/blockchain");

        let fetcher = HttpChainFetcher::new("http://localhost:8082");
        assert_eq!(fetcher.url, "http://localhost:8082/blockchain");
    }
}
