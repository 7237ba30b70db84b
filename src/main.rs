use anyhow::Context;
use clap::Parser;
use windgen::{build, handle_pipe_command, Cli, Commands};

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            init_tracing(args.verbose);
            let dry_run = args.dry_run;
            match build(args).await {
                Ok(result) => {
                    println!("Build successful!");
                    println!("  - Processed {} files", result.total_files_processed);
                    println!("  - Generated {} utilities", result.total_utilities);
                    if result.diagnostics > 0 {
                        println!("  - Skipped {} unreadable sources", result.diagnostics);
                    }
                    if dry_run {
                        print!("{}", result.css_content);
                    }
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Pipe(args) => {
            init_tracing(false);
            handle_pipe_command(args)
                .await
                .context("Failed to generate CSS from stdin")?;
            Ok(())
        }
    }
}
