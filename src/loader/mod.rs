//! `css!` loader plugin: normalizes stylesheet ids and fetches or links them.
//!
//! Internal stylesheets are fetched as text, rebased from their own location to the
//! document's location and appended to the document's injection sink. External stylesheets
//! (`http://` and `https://`) are handed to the document's link mechanism instead, and
//! complete immediately because no reliable load signal exists for them.
//!
//! Names ending in `!` complete as soon as `load` is called instead of after injection. This
//! unblocks hosts whose dependency graph would otherwise wait on a stylesheet that in turn
//! waits on its dependents; "loaded" then no longer means "applied".

mod completion;
mod context;
mod document;
mod error;
mod fetch;
mod name;
mod pending;

use std::cell::RefCell;
use std::rc::Rc;

pub use completion::Completion;
pub use context::{BaseUrlContext, RequireContext};
pub use document::{Document, InjectionSink, MemoryDocument, document_base};
pub use error::{LoadError, TransportError};
pub use fetch::{Fetch, FileFetcher, HttpFetcher, Transport};
pub use name::ResourceName;
pub use pending::PendingInstants;

use crate::stylesheet::rewrite;
use crate::uri::{is_absolute_reference, is_external_url, to_absolute};

/// Caller-supplied transform applied to rebased stylesheet text before injection.
///
/// Supplying a transform also marks the id as a virtual source, so no `.css` extension is
/// appended when resolving its location.
pub type Transform = Box<dyn FnOnce(String) -> anyhow::Result<String>>;

struct LoaderState<F, D> {
  fetcher: F,
  document: D,
  pending: RefCell<PendingInstants>,
}

/// Stylesheet loader plugin.
///
/// Cloning is cheap and clones share the same fetcher, document and pending-instant store.
/// The loader is single-threaded: pending loads are driven on one thread, e.g. inside a tokio
/// `LocalSet` or joined on a current-thread runtime.
pub struct CssLoader<F, D> {
  state: Rc<LoaderState<F, D>>,
}

impl<F, D> Clone for CssLoader<F, D> {
  fn clone(&self) -> Self {
    Self {
      state: Rc::clone(&self.state),
    }
  }
}

impl<F, D> CssLoader<F, D>
where
  F: Fetch,
  D: Document,
{
  /// Create a loader fetching through `fetcher` and injecting into `document`.
  pub fn new(fetcher: F, document: D) -> Self {
    Self {
      state: Rc::new(LoaderState {
        fetcher,
        document,
        pending: RefCell::new(PendingInstants::default()),
      }),
    }
  }

  /// Transport used for internal stylesheets.
  pub fn fetcher(&self) -> &F {
    &self.state.fetcher
  }

  /// Document receiving injected and linked stylesheets.
  pub fn document(&self) -> &D {
    &self.state.document
  }

  /// Number of normalized instant ids that have not been loaded yet.
  pub fn pending_instants(&self) -> usize {
    self.state.pending.borrow().len()
  }

  /// Forget the instant request for an id the host will never load.
  pub fn discard(&self, id: &str) {
    self.state.pending.borrow_mut().discard(id);
  }

  /// Map a requested name to its canonical id.
  ///
  /// The `!` and `.css` modifiers are stripped before `resolve` sees the name; an instant
  /// request is remembered under the canonical id for the following [`load`](Self::load).
  pub fn normalize<R>(&self, name: &str, resolve: R) -> String
  where
    R: FnOnce(&str) -> String,
  {
    let requested = ResourceName::parse(name);
    let id = resolve(requested.name());

    if requested.is_instant() {
      self.state.pending.borrow_mut().insert(id.as_str());
    }

    tracing::debug!(name, %id, instant = requested.is_instant(), "normalized stylesheet id");
    id
  }

  /// Start loading the stylesheet with canonical id `id`.
  ///
  /// Everything that can be decided synchronously happens before this returns: external
  /// stylesheets are linked and completed, a transform requested for an external stylesheet
  /// fails with [`LoadError::Unsupported`] without any request, and instant loads complete.
  /// Internal stylesheets are fetched when the returned [`PendingLoad`] is finished.
  pub fn load<C>(
    &self,
    id: &str,
    context: &C,
    mut completion: Completion,
    parse: Option<Transform>,
  ) -> PendingLoad<F, D>
  where
    C: RequireContext + ?Sized,
  {
    let instant = self.state.pending.borrow_mut().take(id);

    let mut file_url = id.to_string();
    if !file_url.ends_with(".css") && parse.is_none() {
      file_url.push_str(".css");
    }
    let file_url = context.to_url(&file_url);

    if is_external_url(&file_url) {
      if parse.is_some() {
        tracing::warn!(%id, url = %file_url, "transform requested for external stylesheet");
        completion.fail(LoadError::Unsupported { url: file_url });
        return PendingLoad::settled();
      }

      tracing::debug!(%id, url = %file_url, "linking external stylesheet");
      self.state.document.append_link(&file_url);
      completion.succeed();
      return PendingLoad::settled();
    }

    // Relative urls resolve against the document, both for reading and for rebasing.
    let resource_url = if is_absolute_reference(&file_url) {
      file_url
    } else {
      to_absolute(&file_url, &document_base(&self.state.document.pathname()))
    };

    if instant {
      tracing::debug!(%id, "completing instant load before fetch");
      completion.succeed();
    }

    PendingLoad {
      job: Some(FetchJob {
        state: Rc::clone(&self.state),
        id: id.to_string(),
        resource_url,
        instant,
        completion,
        parse,
      }),
    }
  }
}

/// Remaining asynchronous part of a [`CssLoader::load`] call.
#[must_use = "an internal stylesheet is only fetched once `finish` is awaited"]
pub struct PendingLoad<F, D> {
  job: Option<FetchJob<F, D>>,
}

impl<F, D> PendingLoad<F, D>
where
  F: Fetch,
  D: Document,
{
  fn settled() -> Self {
    Self { job: None }
  }

  /// Whether the load already reached its final state synchronously.
  pub fn is_settled(&self) -> bool {
    self.job.is_none()
  }

  /// Fetch, rebase, transform and inject the stylesheet, then signal completion.
  pub async fn finish(self) {
    if let Some(job) = self.job {
      job.run().await;
    }
  }
}

struct FetchJob<F, D> {
  state: Rc<LoaderState<F, D>>,
  id: String,
  resource_url: String,
  instant: bool,
  completion: Completion,
  parse: Option<Transform>,
}

impl<F, D> FetchJob<F, D>
where
  F: Fetch,
  D: Document,
{
  async fn run(mut self) {
    let fetched = self.state.fetcher.fetch(&self.resource_url).await;
    let text = match fetched {
      Ok(text) => text,
      Err(error) => {
        tracing::warn!(id = %self.id, %error, "failed to fetch stylesheet");
        self.completion.fail(error.into());
        return;
      }
    };

    let document_dir = document_base(&self.state.document.pathname());
    let mut css = rewrite(&text, &self.resource_url, &document_dir);
    if let Some(parse) = self.parse.take() {
      css = match parse(css) {
        Ok(css) => css,
        Err(err) => {
          tracing::warn!(id = %self.id, error = %err, "stylesheet transform failed");
          self.completion.fail(LoadError::Transform {
            id: self.id.clone(),
            message: format!("{err:#}"),
          });
          return;
        }
      };
    }

    self.state.document.inject(&css);
    tracing::debug!(id = %self.id, url = %self.resource_url, bytes = css.len(), "injected stylesheet");

    if !self.instant {
      self.completion.succeed();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::future::Future;

  use pretty_assertions::assert_eq;
  use tokio::sync::oneshot;

  use super::*;

  type Reply = Result<String, TransportError>;

  /// Fetcher whose responses are released by the test through channels.
  #[derive(Default)]
  struct ScriptedFetcher {
    replies: RefCell<HashMap<String, oneshot::Receiver<Reply>>>,
    requests: RefCell<Vec<String>>,
  }

  impl ScriptedFetcher {
    fn expect(&self, url: &str) -> oneshot::Sender<Reply> {
      let (sender, receiver) = oneshot::channel();
      self.replies.borrow_mut().insert(url.to_string(), receiver);
      sender
    }

    fn requests(&self) -> Vec<String> {
      self.requests.borrow().clone()
    }
  }

  impl Fetch for ScriptedFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Reply> {
      self.requests.borrow_mut().push(url.to_string());
      let receiver = self.replies.borrow_mut().remove(url);
      let url = url.to_string();

      async move {
        match receiver {
          Some(receiver) => receiver.await.unwrap_or_else(|_| {
            Err(TransportError::Request {
              url,
              message: "reply dropped".into(),
            })
          }),
          None => Err(TransportError::Status { url, status: 404 }),
        }
      }
    }
  }

  type Events = Rc<RefCell<Vec<String>>>;

  fn recording() -> (Completion, Events) {
    let events: Events = Rc::default();
    let loaded = Rc::clone(&events);
    let failed = Rc::clone(&events);
    let completion = Completion::new(
      move || loaded.borrow_mut().push("loaded".to_string()),
      move |error| failed.borrow_mut().push(format!("error: {error}")),
    );
    (completion, events)
  }

  fn loader(pathname: &str) -> CssLoader<ScriptedFetcher, MemoryDocument> {
    CssLoader::new(ScriptedFetcher::default(), MemoryDocument::new(pathname))
  }

  fn identity(name: &str) -> String {
    name.to_string()
  }

  #[test]
  fn normalize_strips_modifiers_and_records_instant_ids() {
    let loader = loader("/");

    assert_eq!(loader.normalize("style/site.css!", identity), "style/site");
    assert_eq!(loader.normalize("style/other.css", identity), "style/other");
    assert_eq!(loader.pending_instants(), 1);
  }

  #[test]
  fn normalize_records_the_host_resolved_id() {
    let loader = loader("/");
    let id = loader.normalize("./style/site!", |name| format!("app/{name}"));

    assert_eq!(id, "app/./style/site");
    loader.discard("app/./style/site");
    assert_eq!(loader.pending_instants(), 0);
  }

  #[tokio::test]
  async fn fetches_rebases_and_injects_internal_stylesheets() {
    let loader = loader("/app/index.html");
    let reply = loader.fetcher().expect("/app/css/site.css");
    let (completion, events) = recording();

    let id = loader.normalize("css/site", identity);
    let pending = loader.load(&id, &BaseUrlContext::new("/app"), completion, None);
    assert!(!pending.is_settled());
    assert!(events.borrow().is_empty());

    reply
      .send(Ok("body{background:url(../img/bg.png)}".into()))
      .unwrap();
    pending.finish().await;

    assert_eq!(loader.document().inspect(), "body{background:url(img/bg.png)}");
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);
    assert_eq!(loader.fetcher().requests(), vec!["/app/css/site.css".to_string()]);
  }

  #[tokio::test]
  async fn relative_file_urls_resolve_against_the_document() {
    let loader = loader("/app/index.html");
    let reply = loader.fetcher().expect("/app/style/style.css");
    let (completion, _events) = recording();

    let pending = loader.load("style/style", &BaseUrlContext::new("./"), completion, None);
    reply.send(Ok("h1{background:url('img/h.png')}".into())).unwrap();
    pending.finish().await;

    assert_eq!(loader.document().inspect(), "h1{background:url('style/img/h.png')}");
    assert_eq!(loader.fetcher().requests(), vec!["/app/style/style.css".to_string()]);
  }

  #[tokio::test]
  async fn rebases_against_the_document_location_at_injection_time() {
    let loader = loader("/app/index.html");
    let reply = loader.fetcher().expect("/app/css/site.css");
    let (completion, events) = recording();

    let pending = loader.load("css/site", &BaseUrlContext::new("/app/"), completion, None);
    loader.document().set_pathname("/app/sub/page.html");
    reply
      .send(Ok("body{background:url(../img/bg.png)}".into()))
      .unwrap();
    pending.finish().await;

    assert_eq!(loader.document().inspect(), "body{background:url(../img/bg.png)}");
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);
  }

  #[tokio::test]
  async fn instant_loads_complete_before_the_fetch_resolves() {
    let loader = loader("/");
    let reply = loader.fetcher().expect("/css/site.css");
    let (completion, events) = recording();

    let id = loader.normalize("css/site!", identity);
    let pending = loader.load(&id, &BaseUrlContext::new("/"), completion, None);
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);

    reply.send(Ok("a{}".into())).unwrap();
    pending.finish().await;

    assert_eq!(loader.document().inspect(), "a{}");
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);
  }

  #[tokio::test]
  async fn instant_load_failure_reports_error_without_second_completion() {
    let loader = loader("/");
    let reply = loader.fetcher().expect("/css/site.css");
    let (completion, events) = recording();

    let id = loader.normalize("css/site!", identity);
    let pending = loader.load(&id, &BaseUrlContext::new("/"), completion, None);

    reply
      .send(Err(TransportError::Status {
        url: "/css/site.css".into(),
        status: 500,
      }))
      .unwrap();
    pending.finish().await;

    assert_eq!(*events.borrow(), vec![
      "loaded".to_string(),
      "error: /css/site.css HTTP status: 500".to_string(),
    ]);
    assert_eq!(loader.document().inspect(), "");
  }

  #[tokio::test]
  async fn instant_flag_is_consumed_by_the_first_load() {
    let loader = loader("/");
    let context = BaseUrlContext::new("/");
    let first = loader.fetcher().expect("/css/site.css");
    let (completion, events) = recording();

    let id = loader.normalize("css/site!", identity);
    let pending = loader.load(&id, &context, completion, None);
    first.send(Ok("a{}".into())).unwrap();
    pending.finish().await;
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);

    let second = loader.fetcher().expect("/css/site.css");
    let (completion, events) = recording();
    let pending = loader.load(&id, &context, completion, None);
    assert!(events.borrow().is_empty());

    second.send(Ok("b{}".into())).unwrap();
    pending.finish().await;
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);
  }

  #[tokio::test]
  async fn failed_fetch_reports_error_and_never_completes() {
    let loader = loader("/");
    let (completion, events) = recording();

    let pending = loader.load("css/missing", &BaseUrlContext::new("/"), completion, None);
    pending.finish().await;

    assert_eq!(*events.borrow(), vec![
      "error: /css/missing.css HTTP status: 404".to_string()
    ]);
  }

  #[test]
  fn external_stylesheets_are_linked_and_complete_immediately() {
    let loader = loader("/");
    let (completion, events) = recording();
    let context = |name: &str| format!("https://cdn.example/{name}");

    let id = loader.normalize("theme!", identity);
    let pending = loader.load(&id, &context, completion, None);

    assert!(pending.is_settled());
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);
    assert_eq!(loader.document().links(), vec![
      "https://cdn.example/theme.css".to_string()
    ]);
    assert!(loader.fetcher().requests().is_empty());
  }

  #[test]
  fn transform_for_external_stylesheet_is_unsupported() {
    let loader = loader("/");
    let (completion, events) = recording();
    let context = |name: &str| format!("http://cdn.example/{name}");
    let parse: Transform = Box::new(|css: String| Ok(css));

    let pending = loader.load("theme.less", &context, completion, Some(parse));

    assert!(pending.is_settled());
    assert_eq!(*events.borrow(), vec![
      "error: cannot preprocess external stylesheet http://cdn.example/theme.less".to_string()
    ]);
    assert!(loader.fetcher().requests().is_empty());
    assert!(loader.document().links().is_empty());
  }

  #[tokio::test]
  async fn transform_runs_after_rebasing_and_keeps_extension() {
    let loader = loader("/");
    let reply = loader.fetcher().expect("/css/theme.less");
    let (completion, events) = recording();
    let parse: Transform = Box::new(|css: String| Ok(css.replace("@accent", "red")));

    let pending = loader.load(
      "css/theme.less",
      &BaseUrlContext::new("/"),
      completion,
      Some(parse),
    );
    reply
      .send(Ok("a{color:@accent;background:url(a.png)}".into()))
      .unwrap();
    pending.finish().await;

    assert_eq!(loader.document().inspect(), "a{color:red;background:url(css/a.png)}");
    assert_eq!(*events.borrow(), vec!["loaded".to_string()]);
  }

  #[tokio::test]
  async fn transform_failure_injects_nothing() {
    let loader = loader("/");
    let reply = loader.fetcher().expect("/css/theme");
    let (completion, events) = recording();
    let parse: Transform = Box::new(|_: String| Err(anyhow::anyhow!("unexpected token")));

    let pending = loader.load("css/theme", &BaseUrlContext::new("/"), completion, Some(parse));
    reply.send(Ok("a{".into())).unwrap();
    pending.finish().await;

    assert_eq!(loader.document().inspect(), "");
    assert_eq!(*events.borrow(), vec![
      "error: transform failed for css/theme: unexpected token".to_string()
    ]);
  }

  #[tokio::test]
  async fn injection_follows_fetch_completion_order() {
    let loader = loader("/");
    let context = BaseUrlContext::new("/");
    let first = loader.fetcher().expect("/a.css");
    let second = loader.fetcher().expect("/b.css");

    let pending_a = loader.load("a", &context, Completion::ignore(), None);
    let pending_b = loader.load("b", &context, Completion::ignore(), None);

    let observer = loader.clone();
    let release = async move {
      second.send(Ok("b{}".into())).unwrap();
      while !observer.document().inspect().contains("b{}") {
        tokio::task::yield_now().await;
      }
      first.send(Ok("a{}".into())).unwrap();
    };

    tokio::join!(pending_a.finish(), pending_b.finish(), release);

    assert_eq!(loader.document().inspect(), "b{}a{}");
  }
}
