//! Build-time inlining of stylesheets into a single rebased bundle.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use same_file::is_same_file;

use crate::stylesheet::rewrite;

fn without_current_dir(path: &Path) -> PathBuf {
  path
    .components()
    .filter(|component| *component != Component::CurDir)
    .collect()
}

/// Site url of a stylesheet stored below `root`, e.g. `/css/site.css`.
pub fn stylesheet_url(root: &Path, path: &Path) -> Result<String> {
  let cleaned = without_current_dir(path);
  let relative = cleaned.strip_prefix(without_current_dir(root)).map_err(|_| {
    anyhow!(
      "stylesheet {} is outside the site root {}",
      path.display(),
      root.display()
    )
  })?;

  let mut url = String::new();
  for component in relative.components() {
    match component {
      Component::Normal(segment) => {
        url.push('/');
        url.push_str(&segment.to_string_lossy());
      }
      _ => {
        return Err(anyhow!(
          "stylesheet path {} must not leave the site root",
          path.display()
        ));
      }
    }
  }

  if url.is_empty() {
    return Err(anyhow!("{} does not name a stylesheet", path.display()));
  }
  Ok(url)
}

/// Read every stylesheet, rebase it from its own url to `target`, and concatenate the results.
///
/// Stylesheets appear in the order given. Each one is terminated by a newline so rules from
/// neighbouring files never run together.
pub fn inline_stylesheets(root: &Path, files: &[PathBuf], target: &str) -> Result<String> {
  let mut bundle = String::new();

  for file in files {
    let url = stylesheet_url(root, file)?;
    let content = fs::read_to_string(file)
      .with_context(|| format!("failed to read stylesheet at {}", file.display()))?;

    tracing::debug!(path = %file.display(), %url, target, "inlining stylesheet");
    bundle.push_str(&rewrite(&content, &url, target));
    if !bundle.ends_with('\n') {
      bundle.push('\n');
    }
  }

  Ok(bundle)
}

/// Write the bundle to `output`, refusing to overwrite any of its inputs.
pub fn write_bundle(output: &Path, inputs: &[PathBuf], css: &str) -> Result<()> {
  if output.exists() {
    for input in inputs {
      let same = is_same_file(input, output).with_context(|| {
        format!(
          "failed to compare {} with {}",
          input.display(),
          output.display()
        )
      })?;
      if same {
        return Err(anyhow!(
          "refusing to overwrite input stylesheet {}",
          input.display()
        ));
      }
    }
  }

  if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  fs::write(output, css).with_context(|| format!("failed to write {}", output.display()))?;
  Ok(())
}
