//! Minimal host that pushes a batch of stylesheet requests through the loader.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use tokio::task::LocalSet;

use crate::config::LoaderConfig;
use crate::loader::{
  BaseUrlContext, Completion, CssLoader, Document, Fetch, InjectionSink, MemoryDocument,
  RequireContext, ResourceName,
};
use crate::models::{LoadReport, RequestRecord};

/// Normalizes and loads stylesheet names the way a module host would.
pub struct LoadSession<F, D> {
  loader: CssLoader<F, D>,
  context: BaseUrlContext,
}

impl<F, D> LoadSession<F, D>
where
  F: Fetch + 'static,
  D: Document + 'static,
{
  /// Drive `loader`, resolving names through `context`.
  pub fn new(loader: CssLoader<F, D>, context: BaseUrlContext) -> Self {
    Self { loader, context }
  }

  /// Loader used by the session.
  pub fn loader(&self) -> &CssLoader<F, D> {
    &self.loader
  }

  /// Request every name and wait until each fetch has finished.
  ///
  /// All fetches are in flight at the same time, so injection follows completion order. Must
  /// run inside a [`LocalSet`].
  pub async fn run(&self, names: &[String]) -> Vec<RequestRecord> {
    let mut records = Vec::with_capacity(names.len());
    let mut tasks = Vec::new();

    for name in names {
      let id = self
        .loader
        .normalize(name, |stripped| self.context.resolve_id(stripped));
      let record = Rc::new(RefCell::new(RequestRecord {
        name: name.clone(),
        id: id.clone(),
        instant: ResourceName::parse(name).is_instant(),
        ..RequestRecord::default()
      }));

      let loaded = Rc::clone(&record);
      let failed = Rc::clone(&record);
      let completion = Completion::new(
        move || loaded.borrow_mut().loaded = true,
        move |error| failed.borrow_mut().error = Some(error.to_string()),
      );

      let pending = self.loader.load(&id, &self.context, completion, None);
      if !pending.is_settled() {
        tasks.push(tokio::task::spawn_local(pending.finish()));
      }
      records.push(record);
    }

    for task in tasks {
      if let Err(err) = task.await {
        tracing::error!(error = %err, "stylesheet load task failed");
      }
    }

    records
      .into_iter()
      .map(|record| record.borrow().clone())
      .collect()
  }
}

impl<F> LoadSession<F, MemoryDocument>
where
  F: Fetch + 'static,
{
  /// Run `names` and summarize the document afterwards.
  pub async fn report(&self, names: &[String]) -> LoadReport {
    let requests = self.run(names).await;
    let document = self.loader.document();

    LoadReport {
      document_path: document.pathname(),
      requests,
      links: document.links(),
      injected: document.inspect(),
    }
  }
}

/// Load `names` against an in-memory document described by `config`.
pub fn load_stylesheets(config: &LoaderConfig, names: &[String]) -> Result<LoadReport> {
  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("failed to start async runtime")?;

  let session = LoadSession::new(
    CssLoader::new(config.transport(), config.document()),
    config.context(),
  );

  let local = LocalSet::new();
  Ok(local.block_on(&runtime, session.report(names)))
}
