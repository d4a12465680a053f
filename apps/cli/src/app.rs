//! Command dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use gphotos_client::{Client, ListOptions, StaticToken};
use gphotos_protocol::filters::ContentCategory;
use gphotos_protocol::types::SharedAlbumOptions;
use gphotos_protocol::{Filter, MediaItem};
use gphotos_transfer::is_file_uploadable;
use tracing::{info, warn};

use crate::cli::{AlbumsCommand, Cli, Command, ConfigCommand, ItemsCommand, UploadArgs};
use crate::config::{Config, config_path};
use crate::progress;

/// Runs one command to completion.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Command::Config(cmd) => show_config(cmd, &config),
        Command::Upload(args) => {
            let mut client = connect(&config)?;
            if let Some(method) = args.method {
                client = client.with_upload_method(method);
            }
            upload(&client, &config, args).await
        }
        Command::Albums(cmd) => albums(&connect(&config)?, &config, cmd).await,
        Command::Items(cmd) => items(&connect(&config)?, &config, cmd).await,
    }
}

fn connect(config: &Config) -> anyhow::Result<Client> {
    let auth = StaticToken::new(config.access_token.as_str()).with_context(|| {
        format!(
            "no access token: set GPHOTOS_ACCESS_TOKEN or access_token in {}",
            config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "the config file".into())
        )
    })?;

    let mut client = Client::new(Arc::new(auth))?
        .with_base_url(config.base_url.as_str())
        .with_upload_method(config.upload_method)
        .with_retry_limit(config.retry_limit);
    if let Some(url) = &config.upload_url {
        client = client.with_upload_url(url.as_str());
    }
    Ok(client)
}

fn list_options(config: &Config) -> ListOptions {
    ListOptions {
        page_size: config.page_size,
        ..ListOptions::default()
    }
}

// ---------------------------------------------------------------------------
// upload
// ---------------------------------------------------------------------------

async fn upload(client: &Client, config: &Config, args: UploadArgs) -> anyhow::Result<()> {
    let paths = expand_paths(&args.paths)?;
    if paths.is_empty() {
        bail!("no uploadable files found");
    }

    let album_id = match &args.album {
        Some(title) => {
            let album = client.get_or_create_album(title).await?;
            info!(album = %album.id, title = %album.title, "uploading into album");
            Some(album.id)
        }
        None => None,
    };

    let concurrency = args.concurrency.unwrap_or(config.concurrency);
    info!(
        files = paths.len(),
        method = %client.upload_method(),
        concurrency,
        "starting upload"
    );

    let printer = progress::spawn_printer(client.uploader().subscribe());
    let report = client
        .upload_multiple(&paths, album_id.as_deref(), concurrency)
        .await;
    printer.abort();
    let report = report?;

    for failed in report.failed_uploads() {
        if let Err(e) = &failed.result {
            eprintln!("failed: {}: {e}", failed.path.display());
        }
    }
    for created in &report.created {
        match (&created.media_item, &created.status) {
            (Some(item), _) => println!("created {} {}", item.id, item.filename),
            (None, Some(status)) => eprintln!("not created: {}: {status}", created.upload_token),
            (None, None) => eprintln!("not created: {}", created.upload_token),
        }
    }

    let failed = report.failed_uploads().count() + report.created.len()
        - report.created_items().count();
    if failed > 0 {
        bail!("{failed} of {} files were not added", paths.len());
    }
    Ok(())
}

/// Expands directories one level deep into their uploadable files, sorted by
/// name. Explicit file arguments are kept as given.
fn expand_paths(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("cannot read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_file_uploadable(p))
                .collect();
            if files.is_empty() {
                warn!(dir = %input.display(), "directory has no uploadable files");
            }
            files.sort();
            out.extend(files);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// albums
// ---------------------------------------------------------------------------

async fn albums(client: &Client, config: &Config, cmd: AlbumsCommand) -> anyhow::Result<()> {
    match cmd {
        AlbumsCommand::List { shared } => {
            let opts = list_options(config);
            let albums = if shared {
                client.list_shared_albums(&opts).await?
            } else {
                client.list_albums(&opts).await?
            };
            for album in &albums {
                println!("{}\t{album}", album.id);
            }
        }
        AlbumsCommand::Create { title } => {
            let album = client.create_album(&title).await?;
            println!("{}\t{}", album.id, album.title);
        }
        AlbumsCommand::Share {
            album_id,
            read_only,
        } => {
            let options = SharedAlbumOptions {
                is_collaborative: !read_only,
                is_commentable: !read_only,
            };
            let info = client.share_album(&album_id, options).await?;
            println!("{}", info.shareable_url.unwrap_or_default());
        }
        AlbumsCommand::Unshare { album_id } => {
            client.unshare_album(&album_id).await?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// items
// ---------------------------------------------------------------------------

async fn items(client: &Client, config: &Config, cmd: ItemsCommand) -> anyhow::Result<()> {
    let found = match cmd {
        ItemsCommand::List { album, max_pages } => {
            let opts = with_max_pages(list_options(config), max_pages);
            match album {
                Some(id) => client.media_items_by_album(&id, &opts).await?,
                None => client.list_media_items(&opts).await?,
            }
        }
        ItemsCommand::Search {
            from,
            to,
            categories,
            favorites,
            max_pages,
        } => {
            let filter = search_filter(from, to, &categories, favorites);
            let opts = with_max_pages(list_options(config), max_pages);
            client.search_media_items(filter, &opts).await?
        }
    };

    print_items(&found);
    Ok(())
}

fn with_max_pages(opts: ListOptions, max_pages: Option<u32>) -> ListOptions {
    match max_pages {
        Some(n) => opts.with_max_pages(n),
        None => opts,
    }
}

/// Builds a search filter. An open-ended date range runs from the Unix epoch
/// or up to today.
fn search_filter(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    categories: &[ContentCategory],
    favorites: bool,
) -> Filter {
    let mut filter = Filter::default();
    if from.is_some() || to.is_some() {
        let start = from.unwrap_or_default();
        let end = to.unwrap_or_else(|| Utc::now().date_naive());
        filter.date_filter = Filter::date_range(start, end).date_filter;
    }
    if !categories.is_empty() {
        filter.content_filter = Filter::categories(categories.iter().copied()).content_filter;
    }
    if favorites {
        filter.feature_filter = Filter::favorites().feature_filter;
    }
    filter
}

fn print_items(items: &[MediaItem]) {
    for item in items {
        println!("{}\t{item}", item.id);
    }
    eprintln!("{} media items", items.len());
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn show_config(cmd: ConfigCommand, config: &Config) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show => print!("{}", toml::to_string_pretty(&config.redacted())?),
        ConfigCommand::Path => println!("{}", config_path()?.display()),
    }
    Ok(())
}
