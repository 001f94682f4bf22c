use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use css_loader::bundle::{inline_stylesheets, write_bundle};
use css_loader::models::ReferenceRecord;
use css_loader::{LoaderConfig, Stylesheet, load_stylesheets, rewrite};

/// Rebase stylesheet references and load stylesheets the way the `css!` plugin does.
#[derive(Debug, Parser)]
#[command(name = "css_loader", version, about)]
struct Cli {
  /// Loader configuration file (JSON or YAML). Defaults to `css-loader.config.*` in the
  /// working directory.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Rewrite the references of a stylesheet moved from one base to another.
  Rebase {
    /// Stylesheet to rewrite.
    file: PathBuf,
    /// Location the stylesheet was written for, e.g. `/css/sub/site.css`.
    #[arg(long)]
    from: String,
    /// Location the stylesheet is read from now.
    #[arg(long)]
    to: String,
    /// Write the result here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
  },
  /// List the `url(...)` and `@import` references of a stylesheet.
  Refs {
    /// Stylesheet to scan.
    file: PathBuf,
    /// Print JSON instead of one reference per line.
    #[arg(long)]
    json: bool,
  },
  /// Load stylesheets by module name and print the resulting document state as JSON.
  Load {
    /// Names as a module would request them, e.g. `css/site` or `css/site.css!`.
    #[arg(required = true)]
    names: Vec<String>,
    /// Override the document location path.
    #[arg(long)]
    document_path: Option<String>,
    /// Override the base url names resolve against.
    #[arg(long)]
    base_url: Option<String>,
  },
  /// Inline stylesheets into one file rebased for its new location.
  Bundle {
    /// Stylesheets to inline, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Site url of the bundle, e.g. `/dist/bundle.css`.
    #[arg(long)]
    to: String,
    /// File to write the bundle to.
    #[arg(long, short)]
    output: PathBuf,
    /// Directory the site root maps to. Defaults to the configured root.
    #[arg(long)]
    root: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let config = match &cli.config {
    Some(path) => LoaderConfig::from_path(path)?,
    None => {
      let cwd = std::env::current_dir().context("failed to read working directory")?;
      LoaderConfig::discover(&cwd)
    }
  };

  match cli.command {
    Command::Rebase {
      file,
      from,
      to,
      output,
    } => {
      let source = fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
      let rewritten = rewrite(&source, &from, &to);
      match output {
        Some(path) => fs::write(&path, rewritten)
          .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout().write_all(rewritten.as_bytes())?,
      }
    }
    Command::Refs { file, json } => {
      let source = fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
      let records: Vec<ReferenceRecord> = Stylesheet::parse(&source)
        .references()
        .map(ReferenceRecord::from)
        .collect();

      let mut stdout = io::stdout().lock();
      if json {
        serde_json::to_writer_pretty(&mut stdout, &records)?;
        writeln!(stdout)?;
      } else {
        for record in &records {
          let scope = if record.absolute { "absolute" } else { "relative" };
          writeln!(stdout, "{}\t{}\t{}", record.offset, scope, record.target)?;
        }
      }
    }
    Command::Load {
      names,
      document_path,
      base_url,
    } => {
      let mut config = config;
      if let Some(document_path) = document_path {
        config.document_path = document_path;
      }
      if let Some(base_url) = base_url {
        config.base_url = base_url;
      }

      let report = load_stylesheets(&config, &names)?;
      let mut stdout = io::stdout().lock();
      serde_json::to_writer_pretty(&mut stdout, &report)?;
      writeln!(stdout)?;

      if report.has_errors() {
        return Err(anyhow!("one or more stylesheets failed to load"));
      }
    }
    Command::Bundle {
      files,
      to,
      output,
      root,
    } => {
      let root = root.unwrap_or(config.root);
      let css = inline_stylesheets(&root, &files, &to)?;
      write_bundle(&output, &files, &css)?;
      tracing::info!(output = %output.display(), stylesheets = files.len(), "wrote bundle");
    }
  }

  Ok(())
}
