use super::error::LoadError;

type LoadedCallback = Box<dyn FnOnce()>;
type ErrorCallback = Box<dyn FnOnce(LoadError)>;

/// Success and error callbacks for a single load.
///
/// Each callback is consumed when it fires, so neither can run twice. In instant mode the
/// success callback fires up front and the error callback may still fire later if the fetch
/// fails.
pub struct Completion {
  on_load: Option<LoadedCallback>,
  on_error: Option<ErrorCallback>,
}

impl Completion {
  /// Build a completion pair from the host's callbacks.
  pub fn new(on_load: impl FnOnce() + 'static, on_error: impl FnOnce(LoadError) + 'static) -> Self {
    Self {
      on_load: Some(Box::new(on_load)),
      on_error: Some(Box::new(on_error)),
    }
  }

  /// Completion pair that ignores both outcomes.
  pub fn ignore() -> Self {
    Self::new(|| {}, |_| {})
  }

  /// Whether the success callback already ran.
  pub fn is_loaded(&self) -> bool {
    self.on_load.is_none()
  }

  /// Whether the error callback already ran.
  pub fn is_failed(&self) -> bool {
    self.on_error.is_none()
  }

  pub(crate) fn succeed(&mut self) {
    if let Some(on_load) = self.on_load.take() {
      on_load();
    }
  }

  pub(crate) fn fail(&mut self, error: LoadError) {
    match self.on_error.take() {
      Some(on_error) => on_error(error),
      None => tracing::warn!(%error, "dropping error for a load that already failed"),
    }
  }
}

impl std::fmt::Debug for Completion {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Completion")
      .field("loaded", &self.is_loaded())
      .field("failed", &self.is_failed())
      .finish()
  }
}
