//! Command-line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use gphotos_protocol::UploadMethod;
use gphotos_protocol::filters::ContentCategory;

#[derive(Debug, Parser)]
#[command(name = "gphotos", version, about = "Upload to and browse a photo library")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload files or directories and add them to the library.
    Upload(UploadArgs),

    /// Manage albums.
    #[command(subcommand)]
    Albums(AlbumsCommand),

    /// Browse media items.
    #[command(subcommand)]
    Items(ItemsCommand),

    /// Inspect the configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files, or directories whose supported files are uploaded.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Album title; created when it does not exist.
    #[arg(long)]
    pub album: Option<String>,

    /// simple, resumable-single or resumable-multipart.
    #[arg(long)]
    pub method: Option<UploadMethod>,

    /// Files uploaded in parallel.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum AlbumsCommand {
    /// List albums.
    List {
        /// List shared albums instead.
        #[arg(long)]
        shared: bool,
    },
    /// Create an album.
    Create { title: String },
    /// Share an album and print its link.
    Share {
        album_id: String,
        /// Do not let others add items or comment.
        #[arg(long)]
        read_only: bool,
    },
    /// Stop sharing an album.
    Unshare { album_id: String },
}

#[derive(Debug, Subcommand)]
pub enum ItemsCommand {
    /// List library items, or the items of one album.
    List {
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// Search by date, category or favourites.
    Search {
        /// First day, YYYY-MM-DD.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Content category such as LANDSCAPES; repeatable.
        #[arg(long = "category")]
        categories: Vec<ContentCategory>,
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        max_pages: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (token redacted).
    Show,
    /// Print the configuration file location.
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_upload() {
        let cli = Cli::try_parse_from([
            "gphotos",
            "upload",
            "a.jpg",
            "photos/",
            "--album",
            "Trip",
            "--method",
            "simple",
            "--concurrency",
            "4",
        ])
        .unwrap();

        let Command::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.paths.len(), 2);
        assert_eq!(args.album.as_deref(), Some("Trip"));
        assert_eq!(args.method, Some(UploadMethod::Simple));
        assert_eq!(args.concurrency, Some(4));
    }

    #[test]
    fn parses_search_filters() {
        let cli = Cli::try_parse_from([
            "gphotos",
            "items",
            "search",
            "--from",
            "2023-01-01",
            "--category",
            "landscapes",
            "--category",
            "PETS",
            "--favorites",
        ])
        .unwrap();

        let Command::Items(ItemsCommand::Search {
            from,
            to,
            categories,
            favorites,
            ..
        }) = cli.command
        else {
            panic!("expected items search");
        };
        assert_eq!(from, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert!(to.is_none());
        assert_eq!(categories, [ContentCategory::Landscapes, ContentCategory::Pets]);
        assert!(favorites);
    }

    #[test]
    fn rejects_unknown_method() {
        assert!(Cli::try_parse_from(["gphotos", "upload", "a.jpg", "--method", "ftp"]).is_err());
    }
}
