use crate::uri::is_absolute_reference;

/// Host-side id and location resolution handed to the loader.
pub trait RequireContext {
  /// Resolve a module name (with extension) to the location it is fetched from.
  fn to_url(&self, name: &str) -> String;

  /// Resolve a requested name to the host's canonical id.
  fn resolve_id(&self, name: &str) -> String {
    name.strip_prefix("./").unwrap_or(name).to_string()
  }
}

impl<F> RequireContext for F
where
  F: Fn(&str) -> String,
{
  fn to_url(&self, name: &str) -> String {
    self(name)
  }
}

/// Resolves names against a fixed base url, the way a module loader's `baseUrl` does.
#[derive(Debug, Clone)]
pub struct BaseUrlContext {
  base_url: String,
}

impl BaseUrlContext {
  /// Create a context rooted at `base_url`.
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
    }
  }
}

impl RequireContext for BaseUrlContext {
  fn to_url(&self, name: &str) -> String {
    if is_absolute_reference(name) || self.base_url.is_empty() {
      return name.to_string();
    }

    let name = name.strip_prefix("./").unwrap_or(name);
    if self.base_url.ends_with('/') {
      format!("{}{}", self.base_url, name)
    } else {
      format!("{}/{}", self.base_url, name)
    }
  }
}
