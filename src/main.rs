use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use eyre::{Result, bail};
use log::{debug, error, info, warn};

use urlsum::config::Config;
use urlsum::output::{self, Report};
use urlsum::resolve::ResolverSettings;
use urlsum::summarize::{DEFAULT_API_BASE, DEFAULT_MODEL};
use urlsum::{Resolver, Summarizer, classify, validate};

mod cli;

use cli::{Cli, OutputFormat};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("urlsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("urlsum")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp = tool_version("yt-dlp");

    let yt_dlp_line = match &yt_dlp {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found; needed for the caption loader fallback)".to_string(),
    };

    format!(
        "\nOPTIONAL TOOLS:\n{yt_dlp_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        urlsum::config::config_path().display(),
        log_dir().join("urlsum.log").display()
    )
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring invalid config file: {e}");
            Config::default()
        }
    }
}

fn print_error(url: &str, err: &urlsum::Error) {
    error!("{url}: {err}");
    eprintln!("error: {err}");
    if let Some(hint) = err.hint() {
        eprintln!("hint: {hint}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Config file is non-fatal if missing/invalid; CLI flags take priority
    let config = load_config();

    let defaults = ResolverSettings::default();
    let settings = ResolverSettings {
        lang: cli.lang.clone().or(config.default_lang.clone()).unwrap_or(defaults.lang),
        timeout: cli
            .timeout
            .or(config.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        fallback: !cli.no_fallback,
    };
    let model = cli
        .model
        .clone()
        .or(config.default_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let api_base = cli
        .api_base
        .clone()
        .or(config.api_base.clone())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    if cli.verbose {
        let config_path = urlsum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!(
            "Language: {}\nModel: {model}\nTimeout: {}s",
            settings.lang,
            settings.timeout.as_secs()
        );
    }

    // Collect URLs: from arg or stdin
    let urls: Vec<String> = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };
    let urls: Vec<String> = urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    // Everything below validation may touch the network
    let summarizer = if cli.no_summary {
        None
    } else {
        let api_key = match validate::api_key(cli.groq_api_key.as_deref()) {
            Ok(key) => key,
            Err(e) => bail!("{e}"),
        };
        let client = urlsum::http::client(settings.timeout)?;
        Some(Summarizer::new(client, api_key, &model).with_api_base(&api_base))
    };

    if urls.is_empty() {
        bail!("Please enter a Groq API key and a URL.\n\nUsage: urlsum <URL>\n       echo <URL> | urlsum");
    }

    let resolver = Resolver::new(&settings)?;
    let mut reports = Vec::new();
    let mut failures = 0;

    for url_input in &urls {
        let url = match validate::url(url_input) {
            Ok(url) => url,
            Err(e) => {
                print_error(url_input, &e);
                failures += 1;
                continue;
            }
        };

        if !cli.quiet {
            let progress = if summarizer.is_some() {
                "Loading content and generating summary..."
            } else {
                "Loading content..."
            };
            eprintln!("{progress}");
        }

        let kind = classify(&url);
        let content = match resolver.resolve(&url).await {
            Ok(content) => content,
            Err(e) => {
                print_error(&url, &e);
                failures += 1;
                continue;
            }
        };

        if cli.verbose {
            eprintln!(
                "URL: {url}\nKind: {kind}\nTitle: {}\nDocuments: {}\nCharacters: {}",
                content.title().unwrap_or("-"),
                content.len(),
                content.joined("\n\n").chars().count(),
            );
        }

        let summary = match &summarizer {
            Some(summarizer) => match summarizer.summarize(&content).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    print_error(&url, &e);
                    failures += 1;
                    continue;
                }
            },
            None => None,
        };

        reports.push(Report::new(url, kind, content, summary));
    }

    if !reports.is_empty() {
        let rendered = output::render_all(&reports, cli.format == OutputFormat::Json)?;
        if let Some(ref path) = cli.output {
            std::fs::write(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{rendered}");
        }
    }

    if failures > 0 {
        debug!("{failures} of {} URL(s) failed", urls.len());
        bail!("{failures} of {} URL(s) failed", urls.len());
    }

    Ok(())
}
