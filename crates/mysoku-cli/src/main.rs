mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mysoku")]
#[command(about = "Classify real-estate flyer PDFs and rename them safely")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze flyers and rename them (dry-run unless --apply)
    Rename {
        /// A PDF file or a directory searched recursively
        input: PathBuf,
        /// Execute the renames instead of previewing them
        #[arg(long)]
        apply: bool,
        /// Copy into this directory instead of renaming in place
        #[arg(long)]
        outdir: Option<PathBuf>,
        /// Run OCR when a document's embedded text is too thin
        #[arg(long)]
        ocr: bool,
        /// Stop the whole run at the first per-document error
        #[arg(long)]
        strict: bool,
        /// Upper bound on documents per run, checked before processing
        #[arg(long, env = "MYSOKU_MAX_FILES", default_value_t = run::DEFAULT_MAX_FILES)]
        max_files: usize,
        /// Override the preview/apply manifest path
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Force debug-level logging
        #[arg(long)]
        debug: bool,
    },
    /// Undo an applied run from its rollback manifest (dry-run unless --apply)
    Restore {
        /// The rollback manifest written by an apply run
        manifest: PathBuf,
        /// Execute the restore instead of previewing it
        #[arg(long)]
        apply: bool,
        /// Force debug-level logging
        #[arg(long)]
        debug: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Rename {
            input,
            apply,
            outdir,
            ocr,
            strict,
            max_files,
            manifest,
            debug,
        } => {
            init_tracing(debug);
            let options = run::RenameOptions {
                input,
                apply,
                outdir,
                ocr,
                strict,
                max_files,
                manifest,
            };
            run::run_rename(&options)?;
            Ok(())
        }
        Commands::Restore {
            manifest,
            apply,
            debug,
        } => {
            init_tracing(debug);
            run::run_restore(&manifest, apply)
        }
    }
}
