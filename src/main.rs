use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use newsdesk::{
    config::Config,
    embed::{self, Platform},
    extension::{self, EmbedType, Width},
    link_card, publish,
    upload::memory,
};
use tracing::error;

#[derive(Parser)]
struct Opts {
    #[clap(short, long, env = "NEWSDESK_CONFIG", global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which platform a URL belongs to and the embed URL it resolves to.
    Resolve {
        url: String,
        #[clap(short, long)]
        platform: Option<Platform>,
    },
    /// Print the persisted markup for an embed.
    Embed {
        url: String,
        #[clap(short, long)]
        platform: Option<Platform>,
        /// Percentage of the column, 1-100.
        #[clap(short, long)]
        width: Option<u32>,
        /// Fetch the page title for link cards.
        #[clap(long)]
        preview: bool,
    },
    /// Upload a document's local images and print the reconciled HTML.
    Publish {
        document: PathBuf,
        /// Keep uploads in memory instead of sending them to the endpoint.
        #[clap(long)]
        dry_run: bool,
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

fn resolve(url: &str, platform: Option<Platform>) -> anyhow::Result<()> {
    let platform = platform.or_else(|| embed::detect(url));
    let report = serde_json::json!({
        "url": url,
        "platform": platform.map(Platform::as_str),
        "recognized": platform.is_some_and(|platform| platform.recognize(url)),
        "embed_url": platform.and_then(|platform| platform.resolve(url)).map(String::from),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn embed(
    url: &str,
    platform: Option<Platform>,
    width: Option<u32>,
    preview: bool,
) -> anyhow::Result<()> {
    let mut node = match platform.or_else(|| embed::detect(url)) {
        Some(platform) => extension::build(platform, url)
            .ok()
            .or_else(|| extension::link_card_node(url, None)),
        None => extension::link_card_node(url, None),
    }
    .ok_or_else(|| anyhow!("{url} can be neither embedded nor shown as a link card"))?;
    if let Some(width) = width {
        let width = Width::new(width).ok_or_else(|| anyhow!("width must be 1-100, got {width}"))?;
        node.resize(width, node.height);
    }
    if preview && node.kind == EmbedType::Generic {
        let href = url::Url::parse(&node.src).with_context(|| "parse link")?;
        let card = link_card::resolve_link_card(&reqwest::Client::new(), href).await;
        node.title = Some(card.title);
    }
    println!("{}", extension::serialize(&node));
    Ok(())
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    match opts.command {
        Command::Resolve { url, platform } => resolve(&url, platform),
        Command::Embed {
            url,
            platform,
            width,
            preview,
        } => embed(&url, platform, width, preview).await,
        Command::Publish {
            document,
            dry_run,
            output,
        } => {
            let path = opts
                .config
                .ok_or_else(|| anyhow!("publish needs --config or NEWSDESK_CONFIG"))?;
            let config = Config::load(&path)
                .await
                .with_context(|| format!("load config from {}", path.display()))?;
            let html = if dry_run {
                let client = memory::Client::new(config.upload.endpoint.clone());
                publish::publish(&document, client, config.limits()).await?
            } else {
                let client = config.upload.client().with_context(|| "upload client")?;
                publish::publish(&document, client, config.limits()).await?
            };
            match output {
                Some(output) => tokio::fs::write(&output, html)
                    .await
                    .with_context(|| format!("write {}", output.display()))?,
                None => println!("{html}"),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    if let Err(e) = run(opts).await {
        error!(?e, "critical error");
        std::process::exit(1);
    }
}
