//! Subcommand implementations.

use crate::render;
use crate::{FolderArgs, SearchArgs};
use anyhow::{anyhow, bail, Context, Result};
use civsync_core::models::{Period, SortMode};
use civsync_core::view::DownloadQueueSnapshot;
use civsync_core::{
    BrowseSession, Browser, BrowserConfig, CatalogFilter, ContentType, DetailRequest, SearchMode,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const HELP: &str = "\
commands:
  n                 next page
  p                 previous page
  g <page>          jump to a page already reached
  d <id>            model detail
  v <id> <version>  detail for a version
  f <id> <file>     detail for a file of the default version (label or name)
  s <text>          search again with new text
  r                 re-check local files for this page
  q                 quit";

pub fn build_filter(args: &SearchArgs, config: &BrowserConfig) -> Result<CatalogFilter> {
    let search_mode =
        SearchMode::parse(&args.mode).ok_or_else(|| anyhow!("Unknown search mode: {}", args.mode))?;
    let sort = SortMode::parse(&args.sort).ok_or_else(|| anyhow!("Unknown sort: {}", args.sort))?;
    let period =
        Period::parse(&args.period).ok_or_else(|| anyhow!("Unknown period: {}", args.period))?;

    let mut filter = CatalogFilter {
        content_types: ContentType::from_options(&args.types, config.combine_lora_family),
        sort,
        period,
        search_mode,
        search_text: args.query.clone().unwrap_or_default(),
        base_models: args.base_models.iter().cloned().collect(),
        favorites_only: args.favorites,
        nsfw: args.nsfw,
        ..Default::default()
    };
    if let Some(limit) = args.limit {
        filter.page_size = limit;
    }
    Ok(filter)
}

fn load_queue(args: &SearchArgs) -> Result<DownloadQueueSnapshot> {
    let Some(path) = &args.queue else {
        return Ok(DownloadQueueSnapshot::default());
    };
    DownloadQueueSnapshot::load(path)
        .with_context(|| format!("Failed to read queue snapshot {}", path.display()))
}

fn parse_content_type(raw: &str) -> Result<ContentType> {
    ContentType::parse(raw).ok_or_else(|| anyhow!("Unknown content type: {}", raw))
}

/// Search, then read navigation commands from stdin until `q` or EOF.
pub async fn browse(config: BrowserConfig, args: SearchArgs) -> Result<()> {
    let mut filter = build_filter(&args, &config)?;
    let queue = load_queue(&args)?;
    let browser = Browser::from_config(config)?;
    let mut session = BrowseSession::new();

    match browser.search(&mut session, &filter).await {
        Ok(view) => println!("{}", render::page(&view, args.by_date)),
        Err(e) => println!("{}", render::error(&e)),
    }
    if args.once {
        return Ok(());
    }

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        let output = match command {
            "" => continue,
            "q" | "quit" => break,
            "h" | "help" => Ok(HELP.to_string()),
            "n" => browser
                .next_page(&mut session)
                .await
                .map(|v| render::page(&v, args.by_date)),
            "p" => browser
                .previous_page(&mut session)
                .await
                .map(|v| render::page(&v, args.by_date)),
            "g" => match rest.parse::<u32>() {
                Ok(page) => browser
                    .jump_to_page(&mut session, page)
                    .await
                    .map(|v| render::page(&v, args.by_date)),
                Err(_) => Ok(format!("Not a page number: {}", rest)),
            },
            "r" => browser
                .refresh(&session)
                .map(|v| render::page(&v, args.by_date)),
            "s" => {
                filter.search_text = rest.to_string();
                browser
                    .search(&mut session, &filter)
                    .await
                    .map(|v| render::page(&v, args.by_date))
            }
            "d" | "v" | "f" => {
                let (id, selector) = rest.split_once(' ').unwrap_or((rest, ""));
                let Ok(model_id) = id.parse::<u64>() else {
                    println!("Not a model id: {}", id);
                    continue;
                };
                let selector = selector.trim();
                let request = DetailRequest::new(model_id);
                match command {
                    "v" => browser
                        .model_detail(&session, request.version(selector), &queue)
                        .map(|v| render::detail(&v)),
                    "f" => browser
                        .file_detail(&session, request.file(selector), &queue)
                        .map(|v| render::file(&v)),
                    _ => browser
                        .model_detail(&session, request, &queue)
                        .map(|v| render::detail(&v)),
                }
            }
            other => Ok(format!("Unknown command: {} (h for help)", other)),
        };

        match output {
            Ok(text) => println!("{}", text),
            Err(e) => {
                warn!("{}", e);
                println!("{}", render::error(&e));
            }
        }
    }

    info!("Session closed");
    Ok(())
}

pub async fn hash(config: BrowserConfig, hash: &str) -> Result<()> {
    let browser = Browser::from_config(config)?;
    match browser.lookup_hash(hash).await {
        Ok(found) => {
            println!("{}", found.hash);
            println!(
                "{} / {} [{}]",
                found.model.selector_label(),
                found.version.name,
                found.model.content_type
            );
            let folder = browser.resolve_folder(
                found.model.content_type,
                found.model.description.as_deref(),
                None,
            )?;
            println!("Installs to {}", folder.display());
            Ok(())
        }
        Err(e) => bail!(render::error(&e)),
    }
}

pub fn folder(config: BrowserConfig, args: FolderArgs) -> Result<()> {
    let content_type = parse_content_type(&args.content_type)?;
    let browser = Browser::from_config(config)?;
    let path = browser.resolve_folder(
        content_type,
        args.description.as_deref(),
        args.custom_base.as_deref(),
    )?;
    println!("{}", path.display());
    Ok(())
}

pub fn subfolders(config: BrowserConfig, args: FolderArgs) -> Result<()> {
    let content_type = parse_content_type(&args.content_type)?;
    let browser = Browser::from_config(config)?;
    let folders = browser.list_subfolders(
        content_type,
        args.description.as_deref(),
        args.custom_base.as_deref(),
    )?;
    if folders.is_empty() {
        println!("None");
    }
    for folder in folders {
        println!("{}", folder);
    }
    Ok(())
}
