use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// windgen - generates utility-first CSS for the class names used in your content
#[derive(Parser, Debug)]
#[command(name = "windgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan content files and write a stylesheet
    Build(BuildArgs),
    /// Read content from stdin and write CSS to stdout
    Pipe(PipeArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Configuration file path (YAML or JSON)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        env = "WINDGEN_CONFIG",
        help = "Path to configuration file (.yaml, .yml or .json)"
    )]
    pub config: Option<PathBuf>,

    /// Additional content patterns, scanned alongside the configured ones
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATTERN",
        num_args = 1..,
        help = "Extra content glob patterns to scan"
    )]
    pub input: Vec<String>,

    /// Exclude patterns (glob patterns to exclude)
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Patterns to exclude from scanning"
    )]
    pub exclude: Vec<String>,

    /// Output CSS file path
    #[arg(
        short = 'o',
        long = "output-css",
        value_name = "PATH",
        required = true,
        help = "Path where the generated CSS file will be written"
    )]
    pub output_css: PathBuf,

    /// Output manifest file path (JSON)
    #[arg(
        short = 'm',
        long = "output-manifest",
        value_name = "PATH",
        help = "Path where the JSON manifest will be written"
    )]
    pub output_manifest: Option<PathBuf>,

    #[arg(
        long = "minify",
        default_value_t = false,
        help = "Enable minification of the output CSS"
    )]
    pub minify: bool,

    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "NUM",
        help = "Number of threads used for scanning (defaults to number of CPU cores)"
    )]
    pub jobs: Option<usize>,

    #[arg(
        short = 'v',
        long = "verbose",
        default_value_t = false,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Generate CSS but don't write output files"
    )]
    pub dry_run: bool,

    #[arg(
        long = "no-header",
        default_value_t = false,
        help = "Omit the generated-by comment at the top of the stylesheet"
    )]
    pub no_header: bool,
}

/// Arguments for the pipe command
#[derive(Parser, Debug, Clone)]
pub struct PipeArgs {
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        env = "WINDGEN_CONFIG",
        help = "Path to configuration file (.yaml, .yml or .json)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "minify",
        default_value_t = false,
        help = "Enable minification of the output CSS"
    )]
    pub minify: bool,
}

impl BuildArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.config.is_none() && self.input.is_empty() {
            return Err("Either a config file or at least one input pattern must be provided".to_string());
        }

        if self.output_manifest.as_ref() == Some(&self.output_css) {
            return Err("Output CSS and manifest paths must be different".to_string());
        }

        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err("Number of jobs must be at least 1".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> BuildArgs {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Build(args) => args,
            other => panic!("expected build command, got {:?}", other),
        }
    }

    #[test]
    fn test_build_args_parse() {
        let args = parse(&[
            "windgen", "build", "-c", "windgen.yaml", "-i", "src/**/*.html", "-o", "out.css", "--minify",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("windgen.yaml")));
        assert_eq!(args.input, vec!["src/**/*.html"]);
        assert_eq!(args.output_css, PathBuf::from("out.css"));
        assert!(args.output_manifest.is_none());
        assert!(args.minify);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_same_outputs() {
        let args = parse(&["windgen", "build", "-i", "*.html", "-o", "out.css", "-m", "out.css"]);
        assert!(args.validate().unwrap_err().contains("must be different"));
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let args = parse(&["windgen", "build", "-i", "*.html", "-o", "out.css", "-j", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_output_is_required() {
        assert!(Cli::try_parse_from(["windgen", "build", "-i", "*.html"]).is_err());
    }
}
