use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::info;
use spicewrap::{
    render_support_header, DocExtractor, GccPreprocessor, Generator, PassthroughPreprocessor,
    Preprocess, ToolkitLayout,
};
use spicewrap_api::GeneratorConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate a CPython extension module wrapping the CSPICE toolkit
#[derive(Parser)]
#[command(name = "spicewrap", version)]
struct Args {
    /// Path to the unpacked CSPICE toolkit
    #[arg(required_unless_present = "print_config")]
    toolkit: Option<PathBuf>,

    /// Write the generated C source here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the companion support header
    #[arg(long)]
    header_out: Option<PathBuf>,

    /// JSON configuration; omitted fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use an already macro-expanded header instead of running the preprocessor
    #[arg(long)]
    preprocessed: Option<PathBuf>,

    /// Print the classified wrapper plans as JSON instead of C source
    #[arg(long)]
    dump_json: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => GeneratorConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => GeneratorConfig::default(),
    };

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let toolkit = args
        .toolkit
        .as_deref()
        .context("a toolkit directory is required")?;
    let layout = ToolkitLayout::from_root(toolkit);
    layout.validate().context("checking the toolkit layout")?;

    let expanded = match &args.preprocessed {
        Some(path) => PassthroughPreprocessor.expand(path),
        None => GccPreprocessor::new(config.preprocessor.clone()).expand(&layout.header),
    }
    .context("expanding the toolkit header")?;

    if let Some(path) = &args.header_out {
        write_file(path, &render_support_header(&config))?;
        info!("Wrote support header to {}", path.display());
    }

    let generator = Generator::new(config);

    if args.dump_json {
        let plans = generator.analyze(&expanded);
        let json = serde_json::to_string_pretty(&plans)?;
        return emit(args.output.as_deref(), &json);
    }

    let docs = DocExtractor::new(&layout.src_dir, generator.config().doc_sections.clone());
    let generation = generator.generate_from_text(&expanded, &docs);

    emit(args.output.as_deref(), &generation.source)?;
    eprintln!("{}", generation.metrics.summary());

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            write_file(path, text)?;
            info!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").context("writing to stdout")
        }
    }
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}
