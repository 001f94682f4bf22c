//! Error types reported through a load's error channel.

/// Failure to obtain stylesheet text.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  /// The server (or file lookup) answered with an HTTP error status.
  #[error("{url} HTTP status: {status}")]
  Status {
    /// Requested location.
    url: String,
    /// Status code, always 400 or above.
    status: u16,
  },

  /// Reading a local stylesheet failed for a reason other than absence.
  #[error("failed to read {url}: {source}")]
  Io {
    /// Requested location.
    url: String,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// The request never produced a status, e.g. a connection or decoding failure.
  #[error("request for {url} failed: {message}")]
  Request {
    /// Requested location.
    url: String,
    /// Description of the failure.
    message: String,
  },
}

impl TransportError {
  /// Location whose fetch failed.
  pub fn url(&self) -> &str {
    match self {
      Self::Status { url, .. } | Self::Io { url, .. } | Self::Request { url, .. } => url,
    }
  }

  /// HTTP status code, when the failure carried one.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

/// Error reported for a single stylesheet load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  /// Fetching the stylesheet text failed.
  #[error(transparent)]
  Transport(#[from] TransportError),

  /// A transform was requested for a stylesheet that is linked rather than fetched.
  #[error("cannot preprocess external stylesheet {url}")]
  Unsupported {
    /// Resolved external location.
    url: String,
  },

  /// The caller-supplied transform rejected the fetched text.
  #[error("transform failed for {id}: {message}")]
  Transform {
    /// Canonical id being loaded.
    id: String,
    /// Description of the failure.
    message: String,
  },
}
