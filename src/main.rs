use clap::{Arg, Command};
use log::LevelFilter;
use phishbuster::config::Config;
use phishbuster::dns::HickoryDnsClient;
use phishbuster::email_parser::EmailParser;
use phishbuster::i18n::Language;
use phishbuster::pipeline::Pipeline;
use phishbuster::server;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishbuster")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Phishing risk analysis service for plain text and raw emails")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/phishbuster.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("scan")
                .long("scan")
                .value_name("FILE")
                .help("Analyze a raw .eml file and print the report as JSON")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .value_name("CODE")
                .help("Report language for --scan (en, es, ca)")
                .default_value("en"),
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

    let dns = match HickoryDnsClient::new() {
        Ok(dns) => Arc::new(dns),
        Err(e) => {
            eprintln!("Error initializing DNS resolver: {e}");
            process::exit(1);
        }
    };
    let pipeline = match Pipeline::new(&config, dns) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error building analysis pipeline: {e}");
            process::exit(1);
        }
    };

    if let Some(eml_file) = matches.get_one::<String>("scan") {
        let language = Language::from_code(matches.get_one::<String>("language").unwrap());
        scan_file(&pipeline, eml_file, language).await;
        return;
    }

    log::info!("Starting phishbuster...");
    if let Err(e) = server::serve(config, pipeline).await {
        log::error!("Server error: {e}");
        process::exit(1);
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::from_env())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

async fn scan_file(pipeline: &Pipeline, path: &str, language: Language) {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error reading email file: {e}");
            process::exit(1);
        }
    };
    let document = match EmailParser::parse(&raw) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error parsing email: {e}");
            process::exit(1);
        }
    };
    let report = pipeline.run(&document, language).await;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing report: {e}");
            process::exit(1);
        }
    }
}
