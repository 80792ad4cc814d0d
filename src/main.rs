use clap::Parser;
use xmllangc::config::{Config, OutputFormat};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "xmllangc", about = "XMLLang Compiler — compile XML-tagged programs")]
struct Cli {
    /// Input file(s) or directory
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: source, json (default: from config or source)
    #[arg(short, long)]
    format: Option<String>,

    /// Default encoding for cast="bytes" elements
    #[arg(long)]
    encoding: Option<String>,

    /// Log level filter (RUST_LOG overrides)
    #[arg(long)]
    log_level: Option<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

fn die(msg: &str) -> ! {
    eprintln!("error: {}", msg);
    process::exit(1);
}

fn load_config(path: &PathBuf) -> Config {
    let text = fs::read_to_string(path).unwrap_or_else(|e| die(&format!("cannot read config: {}", e)));
    serde_json::from_str(&text).unwrap_or_else(|e| die(&format!("invalid config JSON: {}", e)))
}

fn main() {
    let cli = Cli::parse();

    // Load config
    let mut config = if let Some(ref config_path) = cli.config {
        load_config(config_path)
    } else {
        let defaults = ["xmllangc.config.json", "config/xmllangc.config.json"];
        let mut loaded = None;
        for p in &defaults {
            let path = PathBuf::from(p);
            if path.is_file() {
                loaded = Some(load_config(&path));
                break;
            }
        }
        loaded.unwrap_or_default()
    };

    // CLI overrides
    if let Some(ref format) = cli.format {
        config.format = match format.as_str() {
            "source" => OutputFormat::Source,
            "json" => OutputFormat::Json,
            _ => die(&format!("invalid format: {}", format)),
        };
    }
    if let Some(encoding) = cli.encoding {
        config.default_encoding = encoding;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    xmllangc::logging::init(&config.log_level);

    // Collect input files
    let files = xmllangc::list_files(&cli.inputs).unwrap_or_else(|e| die(&format!("{}", e)));
    if files.is_empty() {
        die("no input files found");
    }

    // Each file is its own document
    let mut result = String::new();
    for fp in &files {
        let content =
            fs::read_to_string(fp).unwrap_or_else(|e| die(&format!("cannot read {}: {}", fp.display(), e)));
        tracing::info!(file = %fp.display(), "compiling");
        let compiled = xmllangc::compile(&content, &config)
            .unwrap_or_else(|e| die(&format!("{}: {}", fp.display(), e)));
        result.push_str(&compiled);
    }

    if let Some(ref output_path) = cli.output {
        fs::write(output_path, &result)
            .unwrap_or_else(|e| die(&format!("cannot write {}: {}", output_path.display(), e)));
        eprintln!(
            "compiled {} file(s) -> {} ({} lines)",
            files.len(),
            output_path.display(),
            result.lines().count()
        );
    } else {
        print!("{}", result);
    }
}
