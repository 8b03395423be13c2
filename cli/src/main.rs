/*
 * main.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Sfoglia, a minimal web fetcher.
 *
 * Sfoglia is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Sfoglia is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Sfoglia.  If not, see <http://www.gnu.org/licenses/>.
 */

//! sfoglia: fetch a URL and print its body.
//!
//! ```bash
//! sfoglia https://example.com/
//! sfoglia --headers --max-redirects 5 http://example.com/
//! RUST_LOG=sfoglia_core=debug sfoglia data:text/plain,hello
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sfoglia_core::config::default_config_path;
use sfoglia_core::{FetchConfig, Fetcher};

#[derive(Debug, Parser)]
#[command(name = "sfoglia")]
#[command(about = "Fetch an http, https or data URL and print the decoded body")]
#[command(version)]
struct Args {
    /// URL to fetch
    url: String,

    /// Print response headers before the body
    #[arg(long)]
    headers: bool,

    /// Redirects to follow (overrides the config file)
    #[arg(long = "max-redirects", env = "SFOGLIA_MAX_REDIRECTS")]
    max_redirects: Option<u32>,

    /// Config file (default ~/.sfoglia/config.xml)
    #[arg(long, env = "SFOGLIA_CONFIG")]
    config: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

fn load_config(args: &Args) -> Result<FetchConfig, sfoglia_core::ConfigError> {
    let mut config = match args.config.clone().or_else(default_config_path) {
        Some(path) => FetchConfig::load(&path)?,
        None => FetchConfig::default(),
    };
    if let Some(max) = args.max_redirects {
        config = config.max_redirects(max);
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("sfoglia: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let fetcher = Fetcher::new(config);
    tracing::debug!("{:?}", fetcher.config());

    match fetcher.fetch_blocking(&args.url) {
        Ok((headers, body)) => {
            if args.headers {
                let mut pairs: Vec<_> = headers.iter().collect();
                pairs.sort();
                for (name, value) in pairs {
                    println!("{}: {}", name, value);
                }
                println!();
            }
            print!("{}", body);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("sfoglia: {}", e);
            ExitCode::FAILURE
        }
    }
}
