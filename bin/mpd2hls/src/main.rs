mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::bail;
use clap::Parser;
use config::Config;
use fake_user_agent::get_chrome_rua;
use mpd2hls::{
    hls_folder_for, HttpClient, ManifestSource, TranscodeError, TranscodeReport, Transcoder,
};
use reqwest::Client;
use tracing_subscriber::filter::LevelFilter;

const DEFAULT_OUTPUT: &str = "out_hls";

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
struct Args {
    /// URL or local path of the MPD
    source: String,

    /// Output directory
    ///
    /// Defaults to a folder under --hls-root for remote manifests, `out_hls` otherwise.
    output: Option<PathBuf>,

    /// Mirror the manifest url path under this directory
    #[clap(long)]
    hls_root: Option<PathBuf>,

    /// TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Segments emitted for a fixed-duration template without a known presentation duration
    #[clap(long)]
    segment_count: Option<u64>,

    /// Seconds added to EXT-X-TARGETDURATION
    #[clap(long)]
    target_padding: Option<u64>,

    /// Manifest request timeout in seconds
    #[clap(long)]
    timeout: Option<u64>,

    /// Debug output
    #[clap(long, alias = "debug")]
    verbose: bool,
}

impl Args {
    fn output_dir(&self, source: &ManifestSource, hls_root: Option<&PathBuf>) -> anyhow::Result<PathBuf> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }

        match (source, hls_root) {
            (ManifestSource::Remote(url), Some(root)) => Ok(hls_folder_for(url, root)?),
            (ManifestSource::Local(_), Some(_)) => {
                bail!("--hls-root only applies to remote manifests, pass OUTPUT instead")
            }
            (_, None) => Ok(PathBuf::from(DEFAULT_OUTPUT)),
        }
    }
}

fn print_report(report: &TranscodeReport) {
    match &report.master_path {
        Some(master) => println!(
            "Wrote {} of {} playlists, master: {}",
            report.variants.len(),
            report.total,
            master.display()
        ),
        None => println!("No representations found, nothing written"),
    }
    for variant in &report.variants {
        println!("  {} ({}, {} bps)", variant.uri, variant.codecs, variant.bandwidth);
    }
    for skipped in &report.skipped {
        println!("  skipped {skipped}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .try_from_env()
                .unwrap_or_else(|_| level.to_string().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(file) => Config::load(file)?,
        None => Config::default(),
    };
    let mut options = config.transcode;
    if let Some(count) = args.segment_count {
        options = options.default_segment_count(count);
    }
    if let Some(padding) = args.target_padding {
        options = options.target_duration_padding(padding);
    }
    if let Some(timeout) = args.timeout {
        options = options.request_timeout(Duration::from_secs(timeout));
    }

    let source = ManifestSource::parse(&args.source)?;
    let hls_root = args.hls_root.as_ref().or(config.hls_root.as_ref());
    let output_dir = args.output_dir(&source, hls_root)?;

    let client = HttpClient::new(
        Client::builder()
            .user_agent(get_chrome_rua())
            .timeout(options.request_timeout),
    )?;
    let transcoder = Transcoder::with_client(client, options);

    match transcoder.transcode(&source, &output_dir).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(TranscodeError::AllRepresentationsSkipped(skipped)) => {
            for skipped in &skipped {
                eprintln!("skipped {skipped}");
            }
            bail!("none of the {} representations could be converted", skipped.len())
        }
        Err(e) => {
            if e.is_timeout() {
                tracing::error!("Timed out fetching {source}");
            }
            Err(e.into())
        }
    }
}
