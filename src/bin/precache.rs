//! Analyzes a list of repositories ahead of time and stores the results in
//! the result cache, so the API can serve them instantly or offline.

use clap::Parser;
use gitgrade_lib::commands::settings::Settings;
use gitgrade_lib::models::repo::RepoId;
use gitgrade_lib::store::cache::ResultCache;
use gitgrade_lib::Components;
use std::time::Duration;

const DEMO_REPOSITORIES: [&str; 10] = [
    "https://github.com/fastapi/fastapi",
    "https://github.com/pallets/flask",
    "https://github.com/django/django",
    "https://github.com/nodejs/node",
    "https://github.com/facebook/react",
    "https://github.com/microsoft/vscode",
    "https://github.com/python/cpython",
    "https://github.com/torvalds/linux",
    "https://github.com/tensorflow/tensorflow",
    "https://github.com/kubernetes/kubernetes",
];

#[derive(Debug, Parser)]
#[command(name = "gitgrade-precache", about = "Pre-compute analyses into the result cache")]
struct Args {
    /// Pause between repositories, in seconds. Defaults to the configured pacing delay.
    #[arg(long)]
    delay_secs: Option<u64>,

    /// Repository URLs to analyze. Defaults to a built-in list of well-known projects.
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::load()?;
    let delay = args
        .delay_secs
        .map(Duration::from_secs)
        .unwrap_or(settings.precache_delay);
    let urls: Vec<String> = if args.urls.is_empty() {
        DEMO_REPOSITORIES.iter().map(|url| url.to_string()).collect()
    } else {
        args.urls
    };

    let components = Components::from_settings(&settings)?;
    println!("Caching {} repositories into {}", urls.len(), settings.results_path().display());

    let mut cached = 0usize;
    let mut failed = Vec::new();
    for (index, url) in urls.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        println!("\nAnalyzing {url}");
        let repo = match RepoId::parse(url) {
            Ok(repo) => repo,
            Err(err) => {
                println!("  skipped: {err}");
                failed.push(url.clone());
                continue;
            }
        };

        let outcome = components
            .pipeline
            .run(&repo, |progress, message| println!("  [{progress:>3}%] {message}"))
            .await;
        match outcome {
            Ok(result) => {
                println!(
                    "  done: {}/{} ({})",
                    result.report.total_score, result.report.max_score, result.report.skill_level
                );
                components.results.put(&repo.key(), result);
                cached += 1;
            }
            Err(err) => {
                println!("  failed: {err}");
                failed.push(url.clone());
            }
        }
    }

    println!("\n{cached}/{} repositories cached", urls.len());
    if !failed.is_empty() {
        println!("Failed: {}", failed.join(", "));
    }
    println!("Result cache now holds {} entries", components.results.size());
    Ok(())
}
