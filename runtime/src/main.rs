//! `thumbnailer` command line

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use extractor::Acquirer;
use extractor::models::SelectionPolicy;
use runtime::{AcquireOutput, load_config, with_deadline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "thumbnailer")]
#[command(version)]
#[command(about = "Find and save preview thumbnails for a url")]
struct Args {
    /// Url to inspect, prompted for when omitted
    url: Option<String>,
    /// Directory receiving the thumbnails
    #[arg(short, long, env = "THUMBNAILER_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// TOML configuration file
    #[arg(short, long, env = "THUMBNAILER_CONFIG")]
    config: Option<PathBuf>,
    /// Overall deadline in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
    /// Strategies whose thumbnail is preferred, in order
    #[arg(long, value_delimiter = ',')]
    prefer: Vec<String>,
    /// Print the result as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn prompt() -> Result<String> {
    print!("Enter a URL to test: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let url = line.trim().to_string();
    if url.is_empty() {
        bail!("no url given");
    }
    Ok(url)
}

#[tokio::main]
async fn main() -> Result<()> {
    // logs on stderr, the report owns stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(secs) = args.deadline_secs {
        config = with_deadline(config, secs);
    }

    let url = match args.url {
        Some(url) => url,
        None => prompt()?,
    };

    let acquirer = Acquirer::new(config).context("Invalid configuration")?;
    let policy = if args.prefer.is_empty() {
        SelectionPolicy::RegistryOrder
    } else {
        SelectionPolicy::Preferred(args.prefer)
    };

    let report = acquirer.acquire(&url).await;
    if args.json {
        let output = AcquireOutput::new(report, &policy);
        println!("{}", serde_json::to_string_pretty(&output)?);
        if let Some(e) = output.error {
            bail!(e);
        }
    } else {
        let report = report.with_context(|| format!("Cannot acquire thumbnails for {url}"))?;
        print!("{report}");
        if let Some(thumbnail) = report.select(&policy) {
            println!("Selected thumbnail: {}", thumbnail.path.display());
        }
    }

    let output_dir = std::path::absolute(&acquirer.config().output_dir)
        .unwrap_or_else(|_| acquirer.config().output_dir.clone());
    println!("\nThumbnails saved in: {}", output_dir.display());
    Ok(())
}
