//! Where the sales page HTML comes from.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self) -> Result<String>;

    fn describe(&self) -> String;
}

pub struct HttpPageSource {
    url: String,
    user_agent: String,
    timeout: Duration,
}

impl HttpPageSource {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Self {
        HttpPageSource {
            url: url.to_string(),
            user_agent: user_agent.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    #[instrument(name = "PageFetch", skip(self), fields(url = %self.url))]
    async fn load(&self) -> Result<String> {
        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for page: {}", e, self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for page: {}",
                response.status(),
                self.url
            ));
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Loaded page");
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

pub struct FilePageSource {
    path: PathBuf,
}

impl FilePageSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FilePageSource { path: path.into() }
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    async fn load(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read page file: {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Picks an HTTP source for `http(s)://` locations and a file source otherwise.
pub fn from_location(location: &str, user_agent: &str, timeout: Duration) -> Box<dyn PageSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpPageSource::new(location, user_agent, timeout))
    } else {
        Box::new(FilePageSource::new(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_source_loads_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sales/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/sales/", mock_server.uri());
        let source = from_location(&url, "test", Duration::from_secs(5));
        assert_eq!(source.describe(), url);
        assert_eq!(source.load().await.unwrap(), "<table></table>");
    }

    #[tokio::test]
    async fn test_http_source_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sales/"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let url = format!("{}/sales/", mock_server.uri());
        let source = HttpPageSource::new(&url, "test", Duration::from_secs(5));
        let result = source.load().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            format!("HTTP error: 403 Forbidden for page: {url}")
        );
    }

    #[tokio::test]
    async fn test_file_source() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "<html></html>").unwrap();

        let source = from_location(file.path().to_str().unwrap(), "test", Duration::from_secs(5));
        assert_eq!(source.load().await.unwrap(), "<html></html>");

        let missing = FilePageSource::new("/no/such/page.html");
        assert!(
            missing
                .load()
                .await
                .unwrap_err()
                .to_string()
                .contains("Failed to read page file")
        );
    }
}
