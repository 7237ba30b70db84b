//! Command implementations behind the `windgen` binary.

use crate::args::{BuildArgs, PipeArgs};
use crate::config::{ConfigFile, Configuration};
use crate::content::{collect_files, read_sources, SecurityConfig};
use crate::errors::{GeneratorError, Result};
use crate::manifest::{Manifest, ManifestBuilder};
use crate::pipeline::Pipeline;
use crate::stylesheet::{render, write_output, RenderOptions};
use crate::tokenizer::SourceText;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::{Component, Path};
use std::time::{Duration, Instant};

/// Performance statistics
#[derive(Debug, Clone)]
pub struct PerformanceStats {
    pub total_duration: Duration,
    pub read_duration: Duration,
    pub generate_duration: Duration,
    pub files_per_second: f64,
    pub bytes_processed: u64,
}

/// Result of a build
#[derive(Debug)]
pub struct BuildResult {
    pub css_content: String,
    pub manifest: Manifest,
    pub total_utilities: usize,
    pub total_files_processed: usize,
    pub diagnostics: usize,
    pub performance_stats: PerformanceStats,
}

/// Load the configuration file, or start from an empty one when none is given
fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            ConfigFile::from_file(path)
        }
        None => Ok(ConfigFile {
            content: Vec::new(),
            ..ConfigFile::default()
        }),
    }
}

/// Build the run configuration from the config file plus command-line globs
fn build_configuration(args: &BuildArgs) -> Result<Configuration> {
    let overrides = ConfigFile {
        content: args.input.clone(),
        plugins: Vec::new(),
        ..ConfigFile::default()
    };

    load_config(args.config.as_deref())?
        .merge(overrides)
        .into_configuration()
}

/// Validate that a path is safe (no path traversal)
fn validate_output_path(path: &Path, security: &SecurityConfig) -> Result<()> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let working_dir = security
        .working_directory
        .canonicalize()
        .unwrap_or_else(|_| security.working_directory.clone());

    let climbs = path.components().any(|c| c == Component::ParentDir);
    if path.is_relative() && climbs && !canonical.starts_with(&working_dir) {
        return Err(GeneratorError::SecurityError(format!(
            "Output path '{}' appears to use path traversal",
            path.display()
        )));
    }

    Ok(())
}

fn progress_bar(len: usize, verbose: bool) -> ProgressBar {
    if verbose {
        return ProgressBar::with_draw_target(Some(len as u64), ProgressDrawTarget::hidden());
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
    {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    pb.set_message("Reading content...");
    pb
}

/// Run a full build: collect content, generate CSS and write outputs
pub async fn build(args: BuildArgs) -> Result<BuildResult> {
    let start_time = Instant::now();

    args.validate().map_err(GeneratorError::InvalidInput)?;

    let security = SecurityConfig::default();
    validate_output_path(&args.output_css, &security)?;
    if let Some(manifest_path) = &args.output_manifest {
        validate_output_path(manifest_path, &security)?;
    }

    let configuration = build_configuration(&args)?;
    tracing::info!(content = ?configuration.content_globs(), "Starting build");

    let files = collect_files(&configuration.content_globs(), &args.exclude, &security)?;
    let bytes_processed: u64 = files.iter().map(|f| f.size).sum();
    tracing::info!(
        files = files.len(),
        megabytes = %format!("{:.2}", bytes_processed as f64 / (1024.0 * 1024.0)),
        "Found content files"
    );

    let read_start = Instant::now();
    let pb = progress_bar(files.len(), args.verbose);
    let sources = read_sources(&files, |path| {
        pb.inc(1);
        pb.set_message(format!(
            "Reading: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
    })?;
    let read_duration = read_start.elapsed();

    pb.set_message("Generating CSS...");
    let generate_start = Instant::now();
    let plugin_names: Vec<String> = configuration.plugins().iter().map(|p| p.name().to_string()).collect();
    let mut pipeline = Pipeline::new(configuration);
    if let Some(jobs) = args.jobs {
        pipeline = pipeline.with_jobs(jobs);
    }
    let output = match pipeline.run(&sources) {
        Ok(output) => output,
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e);
        }
    };

    let options = RenderOptions {
        minify: args.minify,
        header: !args.no_header,
    };
    let css_content = render(&output.rules, options);
    let generate_duration = generate_start.elapsed();

    let css_size = css_content.len();
    let minified_size = if args.minify { Some(css_size) } else { None };
    let manifest = ManifestBuilder::new()
        .started_at(start_time)
        .with_files_processed(sources.len())
        .with_plugins(plugin_names)
        .with_output(&output)
        .with_sources(&sources)
        .build(css_size, minified_size);

    let total_duration = start_time.elapsed();
    let stats = PerformanceStats {
        total_duration,
        read_duration,
        generate_duration,
        files_per_second: sources.len() as f64 / total_duration.as_secs_f64().max(f64::EPSILON),
        bytes_processed,
    };
    pb.finish_with_message(format!("✓ Complete ({:.1} files/sec)", stats.files_per_second));

    if !args.dry_run {
        write_outputs(&args, &css_content, &manifest)?;
    }

    tracing::info!(
        total_ms = stats.total_duration.as_millis() as u64,
        read_ms = stats.read_duration.as_millis() as u64,
        generate_ms = stats.generate_duration.as_millis() as u64,
        "Build complete"
    );

    Ok(BuildResult {
        css_content,
        total_utilities: output.rules.len(),
        total_files_processed: sources.len(),
        diagnostics: output.diagnostics.len(),
        manifest,
        performance_stats: stats,
    })
}

fn write_outputs(args: &BuildArgs, css: &str, manifest: &Manifest) -> Result<()> {
    write_output(&args.output_css, css)?;

    if let Some(path) = &args.output_manifest {
        let content = if args.minify {
            manifest.to_compact_json()?
        } else {
            manifest.to_pretty_json()?
        };
        write_output(path, &content)?;
    }

    Ok(())
}

/// Handle pipe command - read content from stdin, output CSS to stdout
pub async fn handle_pipe_command(args: PipeArgs) -> Result<()> {
    use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .await
        .map_err(|e| GeneratorError::InputError(format!("Failed to read from stdin: {}", e)))?;

    let css = pipe_css(args.config.as_deref(), input, args.minify)?;
    if css.is_empty() {
        return Ok(());
    }

    let mut stdout = io::stdout();
    stdout
        .write_all(css.as_bytes())
        .await
        .map_err(|e| GeneratorError::OutputError {
            path: "stdout".to_string(),
            message: e.to_string(),
        })?;
    stdout.flush().await.map_err(|e| GeneratorError::OutputError {
        path: "stdout".to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}

/// CSS for a single in-memory source. Empty input gives empty output.
pub fn pipe_css(config: Option<&Path>, input: Vec<u8>, minify: bool) -> Result<String> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Ok(String::new());
    }

    let mut file = load_config(config)?;
    if file.content.is_empty() {
        file.content.push("stdin".to_string());
    }
    let output = Pipeline::new(file.into_configuration()?).run(&[SourceText::new("stdin", input)])?;
    if output.rules.is_empty() {
        return Ok(String::new());
    }

    Ok(render(&output.rules, RenderOptions { minify, header: false }))
}
