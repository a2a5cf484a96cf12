use std::sync::{atomic::AtomicBool, Arc};

use anyhow::Context;
use clap::Parser;
use log::debug;
use savepagenow::{
    capture::CaptureRequest,
    credentials::Credentials,
    options::JobOptions,
    poller::PollOptions,
    utils::DEFAULT_USER_AGENT,
    SavePageNow, SavePageNowOptions,
};
use signal_hook::consts::{SIGINT, SIGTERM};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Archive a URL with archive.org's Save Page Now",
    long_about = None
)]
struct Args {
    /// URL to archive
    url: String,
    /// User-Agent header sent to archive.org
    #[arg(long = "user-agent", visible_alias = "ua", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
    /// Accept a recent capture instead of failing when archive.org returns one
    #[arg(short = 'c', long)]
    accept_cache: bool,
    /// Authenticate with SAVEPAGENOW_ACCESS_KEY and SAVEPAGENOW_SECRET_KEY
    #[arg(short = 'a', long)]
    authenticate: bool,
    /// Use the job API and wait for the capture to finish (requires keys)
    #[arg(long)]
    api: bool,
    /// Seconds to wait between two status requests of the job API
    #[arg(short = 'w', long, default_value_t = 5.0)]
    wait: f64,
    /// Give up polling the job API after this many seconds
    #[arg(short = 't', long)]
    timeout: Option<u64>,
    /// Also capture the outlinks of the page (job API only)
    #[arg(long)]
    capture_outlinks: bool,
    /// Take a screenshot of the page (job API only)
    #[arg(long)]
    capture_screenshot: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    if let Ok(env) = std::env::var("RUST_LOG") {
        if env == "debug" {
            println!("{number:/>width$}", number = "", width = 20);
            println!("Debug mode enabled");
            println!("{number:/>width$}", number = "", width = 20);
            println!();
        }
    }

    let mut options = SavePageNowOptions::default_builder();
    options.user_agent(args.user_agent.clone());
    if args.authenticate || args.api {
        let credentials = Credentials::resolve(None).context("could not load archive.org keys")?;
        debug!("using access key {}", credentials.access_key());
        options.credentials(credentials);
    }
    let spn = SavePageNow::new(options.build()?);

    if !args.api {
        let mut req = CaptureRequest::default_builder();
        req.target_url(args.url.clone())
            .accept_cache(args.accept_cache);
        let outcome = spn
            .capture_request(&req.build()?)
            .await
            .context(format!("could not capture {}", args.url))?;
        println!("{}", outcome.url());
        return Ok(());
    }

    let should_terminate = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGTERM, Arc::clone(&should_terminate))?;
    signal_hook::flag::register(SIGINT, Arc::clone(&should_terminate))?;

    let job_options = JobOptions::default_builder()
        .capture_outlinks(args.capture_outlinks)
        .capture_screenshot(args.capture_screenshot)
        .build()?;

    let mut poll = PollOptions::default_builder();
    poll.wait_secs(args.wait).should_terminate(should_terminate);
    if let Some(secs) = args.timeout {
        poll.deadline(std::time::Duration::from_secs(secs));
    }

    debug!("starting job capture with {:#?}", args);
    let result = spn
        .capture_v2(&args.url, &job_options, args.accept_cache, &poll.build()?)
        .await
        .context(format!("could not capture {}", args.url))?;
    println!("{}", result.archive_url());

    Ok(())
}
