use clap::{Arg, Command};
use log::LevelFilter;
use phishguard::config::Config;
use phishguard::model_gateway::HttpModelGateway;
use phishguard::pipeline::{AnalysisPipeline, Submission};
use phishguard::report::MemoryReportStore;
use std::process;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Email phishing analysis with dual-model risk scoring")
        .long_about(
            "PhishGuard analyzes a submitted email (.eml or plain text), extracts \
             URL and keyword signals, consults the external classification service, \
             and reconciles everything into a bounded, banded risk verdict.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/phishguard.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("analyze")
                .long("analyze")
                .value_name("FILE")
                .help("Analyze an email file and print the JSON result")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("submitter")
                .long("submitter")
                .value_name("ID")
                .help("Authenticated submitter identifier recorded on the report")
                .default_value("local-operator"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        match config.validate() {
            Ok(()) => {
                println!("Configuration OK");
                println!("Model endpoint: {}", config.model_endpoint);
                println!("Lexicon entries: {}", config.lexicon.len());
                println!(
                    "Scoring: +{}/url, +{}/keyword, bands {}/{}",
                    config.scoring.url_weight,
                    config.scoring.keyword_weight,
                    config.scoring.medium_threshold,
                    config.scoring.high_threshold
                );
            }
            Err(e) => {
                eprintln!("Configuration invalid: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(email_file) = matches.get_one::<String>("analyze") {
        let submitter = matches.get_one::<String>("submitter").unwrap();
        analyze_file(&config, email_file, submitter).await;
        return;
    }

    eprintln!("No action specified. Try --analyze <FILE> or --help.");
    process::exit(2);
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Config file {path} not found, using defaults");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    match Config::default().to_file(path) {
        Ok(()) => println!("Default configuration written to {path}"),
        Err(e) => {
            eprintln!("Failed to write configuration: {e}");
            process::exit(1);
        }
    }
}

async fn analyze_file(config: &Config, path: &str, submitter: &str) {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            process::exit(1);
        }
    };

    let gateway =
        match HttpModelGateway::new(&config.model_endpoint, config.request_timeout_seconds) {
            Ok(gateway) => gateway,
            Err(e) => {
                eprintln!("Failed to build prediction client: {e}");
                process::exit(1);
            }
        };

    let pipeline = AnalysisPipeline::new(config, gateway, MemoryReportStore::new());
    let submission = Submission {
        bytes,
        filename: path.to_string(),
        submitter_id: submitter.to_string(),
    };

    match pipeline.analyze(submission).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome).unwrap());
        }
        Err(e) => {
            log::error!("Analysis failed: {e}");
            process::exit(1);
        }
    }
}
