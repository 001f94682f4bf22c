//! Transports used to read stylesheet text.
//!
//! A fetch is issued once and runs until it succeeds or fails. There is no retry, no timeout
//! and no cache; callers that need those wrap their own [`Fetch`] implementation.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::error::TransportError;

/// Asynchronous source of stylesheet text.
pub trait Fetch {
  /// Read the text stored at `url`.
  fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>>;
}

/// Strip the query and fragment and the leading slash from an internal url.
fn url_path(url: &str) -> &str {
  let end = url.find(['?', '#']).unwrap_or(url.len());
  let path = &url[..end];
  let path = path.strip_prefix("./").unwrap_or(path);
  path.trim_start_matches('/')
}

/// Serves internal urls from a directory on disk.
///
/// The site root maps to `root`, so `/css/site.css` reads `<root>/css/site.css`. Missing files
/// are reported as HTTP 404 to mirror what a static file server would answer.
#[derive(Debug, Clone)]
pub struct FileFetcher {
  root: PathBuf,
}

impl FileFetcher {
  /// Serve files below `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// File path a url maps to.
  pub fn path_for(&self, url: &str) -> PathBuf {
    self.root.join(url_path(url))
  }
}

impl Fetch for FileFetcher {
  fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> {
    let path = self.path_for(url);
    let url = url.to_string();

    async move {
      tracing::debug!(%url, path = %path.display(), "reading stylesheet");
      match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == ErrorKind::NotFound => {
          Err(TransportError::Status { url, status: 404 })
        }
        Err(source) => Err(TransportError::Io { url, source }),
      }
    }
  }
}

/// Fetches internal urls from a web origin with blocking `ureq` calls on tokio's blocking pool.
#[derive(Clone)]
pub struct HttpFetcher {
  origin: String,
  agent: ureq::Agent,
}

impl HttpFetcher {
  /// Fetch from `origin`, e.g. `https://example.com`.
  pub fn new(origin: impl Into<String>) -> Self {
    Self {
      origin: origin.into(),
      agent: ureq::Agent::new_with_defaults(),
    }
  }

  /// Full request url for an internal url.
  pub fn request_url(&self, url: &str) -> String {
    let path = url.strip_prefix("./").unwrap_or(url).trim_start_matches('/');
    format!("{}/{}", self.origin.trim_end_matches('/'), path)
  }
}

impl std::fmt::Debug for HttpFetcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HttpFetcher")
      .field("origin", &self.origin)
      .finish_non_exhaustive()
  }
}

impl Fetch for HttpFetcher {
  fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> {
    let request_url = self.request_url(url);
    let agent = self.agent.clone();

    async move {
      tracing::debug!(url = %request_url, "requesting stylesheet");
      let target = request_url.clone();
      match tokio::task::spawn_blocking(move || get_text(&agent, &target)).await {
        Ok(result) => result,
        Err(err) => Err(TransportError::Request {
          url: request_url,
          message: err.to_string(),
        }),
      }
    }
  }
}

fn get_text(agent: &ureq::Agent, url: &str) -> Result<String, TransportError> {
  let mut response = agent
    .get(url)
    .call()
    .map_err(|err| transport_error(url, err))?;
  response
    .body_mut()
    .read_to_string()
    .map_err(|err| transport_error(url, err))
}

fn transport_error(url: &str, err: ureq::Error) -> TransportError {
  match err {
    ureq::Error::StatusCode(status) => TransportError::Status {
      url: url.to_string(),
      status,
    },
    other => TransportError::Request {
      url: url.to_string(),
      message: other.to_string(),
    },
  }
}

/// Either transport, chosen from configuration at runtime.
#[derive(Debug, Clone)]
pub enum Transport {
  /// Read from disk.
  File(FileFetcher),
  /// Request from a web origin.
  Http(HttpFetcher),
}

impl Fetch for Transport {
  fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> {
    async move {
      match self {
        Self::File(fetcher) => fetcher.fetch(url).await,
        Self::Http(fetcher) => fetcher.fetch(url).await,
      }
    }
  }
}
