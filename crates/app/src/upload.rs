use reqwest::{Client, Method, StatusCode};
use url::Url;

pub const DAV_USERNAME_ENV: &str = "DAV_USERNAME";
pub const DAV_PASSWORD_ENV: &str = "DAV_PASSWORD";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Publishes rendered reports into a WebDAV collection
#[derive(Debug, Clone)]
pub struct DavPublisher {
    client: Client,
    collection: Url,
    public_base: Option<Url>,
    credentials: Option<(String, String)>,
}

/// Make sure a collection URL ends in '/', so that joining a file name
/// appends rather than replaces the last segment
fn as_collection(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl DavPublisher {
    pub fn new(collection: Url, public_base: Option<Url>) -> Self {
        Self {
            client: Client::new(),
            collection: as_collection(collection),
            public_base: public_base.map(as_collection),
            credentials: None,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Pick up credentials from `DAV_USERNAME` / `DAV_PASSWORD`, if set
    pub fn with_env_credentials(self) -> Self {
        match std::env::var(DAV_USERNAME_ENV) {
            Ok(username) => {
                let password = std::env::var(DAV_PASSWORD_ENV).unwrap_or_default();
                self.with_credentials(username, password)
            }
            Err(_) => self,
        }
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.request(method, url);
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    /// Create the collection. An existing collection is not an error.
    pub async fn ensure_collection(&self) -> Result<(), PublishError> {
        let mkcol = Method::from_bytes(b"MKCOL").map_err(|e| PublishError::InvalidMethod(e.to_string()))?;
        let response = self.request(mkcol, self.collection.clone()).send().await?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(collection = %self.collection, "created upload collection");
                Ok(())
            }
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            status => Err(PublishError::Status {
                method: "MKCOL",
                url: self.collection.clone(),
                status,
            }),
        }
    }

    /// Upload `body` as `file_name` into the collection.
    /// Returns the URL the report can be viewed at.
    pub async fn publish(&self, file_name: &str, body: String) -> Result<Url, PublishError> {
        self.ensure_collection().await?;

        let target = self.collection.join(file_name)?;
        let response = self
            .request(Method::PUT, target.clone())
            .header(reqwest::header::CONTENT_TYPE, HTML_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Status {
                method: "PUT",
                url: target,
                status,
            });
        }
        tracing::info!(url = %target, "uploaded report");

        match &self.public_base {
            Some(base) => Ok(base.join(file_name)?),
            None => Ok(target),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("invalid request method: {0}")]
    InvalidMethod(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid upload url: {0}")]
    Url(#[from] url::ParseError),

    #[error("{method} {url} failed: {status}")]
    Status {
        method: &'static str,
        url: Url,
        status: StatusCode,
    },
}
