use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use crate::{
    blog::{ArchivePost, BlogArchive, BlogCache, BlogSummary, DevToSource},
    date_ago::format_date_ago,
    scramble::{DisplaySink, ScrambleController},
    settings::{self, SettingsStore},
    storage::{open_store, StoreKind},
};

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Portfolio site tooling")]
pub struct Cli {
    /// Directory holding settings.json and the post cache.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List published posts, served from today's cache when possible.
    Posts {
        /// Drop the cached snapshot before reading.
        #[arg(long)]
        refresh: bool,
        #[arg(long, value_enum)]
        store: Option<StoreArg>,
        /// Print the normalized posts as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Play the scramble-then-reveal animation for a line of text.
    Scramble {
        text: String,
        /// How long to scramble before revealing.
        #[arg(long, default_value_t = 600)]
        scramble_ms: u64,
    },
    /// Relative age of a DD.MM.YYYY date.
    Ago { date: String },
    /// List the markdown posts in a directory.
    Archive {
        dir: PathBuf,
        #[arg(long)]
        latest: Option<usize>,
        #[arg(long)]
        slug: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreArg {
    Memory,
    Json,
    Sqlite,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => StoreKind::Memory,
            StoreArg::Json => StoreKind::Json,
            StoreArg::Sqlite => StoreKind::Sqlite,
        }
    }
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(settings::data_dir);
    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;
    let site = settings_store.site().with_env_overrides();

    match cli.command {
        Command::Posts {
            refresh,
            store,
            json,
        } => {
            let kind = store.map(StoreKind::from).unwrap_or(site.store);
            info!("Using {} storage in {}", kind.as_str(), data_dir.display());

            let store = open_store(kind, &data_dir)?;
            let source = Arc::new(DevToSource::new(site.blog_endpoint.clone()));
            let cache = BlogCache::new(store, source).with_storage_key(site.storage_key.clone());

            if refresh {
                cache.invalidate().await?;
            }

            let posts = cache.get_posts().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                print_posts(&posts);
            }
        }
        Command::Scramble { text, scramble_ms } => {
            let sink: DisplaySink = Arc::new(|display: &str| {
                let mut stdout = io::stdout().lock();
                let _ = write!(stdout, "\r{display}");
                let _ = stdout.flush();
            });

            let controller = ScrambleController::new(text, sink, site.scramble.clone());
            controller.start().await;
            tokio::time::sleep(Duration::from_millis(scramble_ms)).await;
            controller.generate_back_to_original().await?;
            println!();
        }
        Command::Ago { date } => {
            println!("{}", format_date_ago(&date, Utc::now()));
        }
        Command::Archive { dir, latest, slug } => {
            let archive = BlogArchive::load(&dir)?;

            if let Some(slug) = slug {
                let post = archive
                    .find_by_slug(&slug)
                    .ok_or_else(|| anyhow!("no post with slug {slug}"))?;
                print_archive_post(post);
                println!();
                println!("{}", post.content);
                return Ok(());
            }

            let posts = match latest {
                Some(count) => archive.latest(count),
                None => archive.posts(),
            };
            for post in posts {
                print_archive_post(post);
            }
        }
    }

    Ok(())
}

fn print_posts(posts: &[BlogSummary]) {
    if posts.is_empty() {
        println!("No posts published yet.");
        return;
    }

    for post in posts {
        println!("{}", post.title);
        println!("  {} | {}", post.published_date, post.user_full_name);
        if !post.tag_list.is_empty() {
            println!("  #{}", post.tag_list.join(" #"));
        }
        println!("  {}", post.post_url);
    }
}

fn print_archive_post(post: &ArchivePost) {
    let attributes = &post.attributes;
    println!("{}.) {} [{}]", attributes.order, attributes.title, post.slug);
    println!(
        "  {} | {} | {} min read",
        attributes.date_published,
        format_date_ago(&attributes.date_published, Utc::now()),
        attributes.read_time
    );
    if !post.card_tags().is_empty() {
        println!("  {}", post.card_tags().join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_flags_parse() {
        let cli = Cli::try_parse_from([
            "folio",
            "--data-dir",
            "/tmp/x",
            "posts",
            "--refresh",
            "--store",
            "sqlite",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        match cli.command {
            Command::Posts {
                refresh,
                store,
                json,
            } => {
                assert!(refresh);
                assert!(!json);
                assert_eq!(store.map(StoreKind::from), Some(StoreKind::Sqlite));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn scramble_defaults_duration() {
        let cli = Cli::try_parse_from(["folio", "scramble", "hire me"]).unwrap();
        match cli.command {
            Command::Scramble { text, scramble_ms } => {
                assert_eq!(text, "hire me");
                assert_eq!(scramble_ms, 600);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(Cli::try_parse_from(["folio", "posts", "--store", "redis"]).is_err());
    }

    #[tokio::test]
    async fn archive_command_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("hello.md"),
            "---\ntitle: Hello\norder: 1\ndatePublished: 01.01.2024\n---\nhi\n",
        )
        .unwrap();

        let data_dir = dir.path().join("data");
        let cli = Cli::try_parse_from([
            "folio".to_string(),
            "--data-dir".to_string(),
            data_dir.display().to_string(),
            "archive".to_string(),
            dir.path().display().to_string(),
            "--slug".to_string(),
            "hello".to_string(),
        ])
        .unwrap();
        dispatch(cli).await.unwrap();
    }
}
