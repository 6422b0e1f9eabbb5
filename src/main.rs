use anyhow::{bail, Context, Result};
use clap::Parser;
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, BufReader};

use shelfex::api::{ImageResolver, TmdbGateway};
use shelfex::browse::{Completion, QueryDebouncer};
use shelfex::config::{CatalogConfig, CliArgs, Command, FavoritesAction, HistoryAction, ThemeAction};
use shelfex::state::{ColorScheme, DurableStore, MemoryStore, SqliteStore};
use shelfex::{CatalogSession, Collections};

type Session = CatalogSession<TmdbGateway>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Logs go to stderr so listings on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = CatalogConfig::from(&args);
    let store = open_store(&config)?;
    let collections = Collections::open(store, config.history_limit);
    let images = ImageResolver::new(config.image_base_url.clone());

    let gateway = TmdbGateway::new(config.tmdb.clone()).context("Failed to build HTTP client")?;
    if config.tmdb.api_token.is_none() {
        tracing::warn!("No API token configured; the catalog will likely reject requests");
    }
    let mut session = CatalogSession::new(gateway, &collections);

    match args.command {
        Command::Browse { pages } => {
            let completion = session.browse().await;
            report(&session, completion)?;
            for _ in 1..pages {
                let Some(completion) = session.load_more().await else {
                    break;
                };
                report(&session, completion)?;
            }
            print_items(&session, &images).await;
        }
        Command::Search { query } => {
            let completion = session.search(&query).await;
            report(&session, completion)?;
            print_items(&session, &images).await;
        }
        Command::Details { id } => {
            let item = session.lookup(id).await?;
            println!("{} ({})", item.title, year_label(&item));
            println!("Rating: {}/10", item.rating_label());
            println!("Poster: {}", images.poster(&item));
            println!("Backdrop: {}", images.backdrop(&item));
            if !item.synopsis.is_empty() {
                println!();
                println!("{}", item.synopsis);
            }
        }
        Command::Favorites { action } => {
            favorites_command(&session, &collections, &images, action).await?
        }
        Command::History { action } => history_command(&collections, action).await?,
        Command::Theme { action, system } => theme_command(&collections, action, system).await?,
        Command::Interactive => interactive(&mut session, &collections, &images, &config).await?,
    }

    Ok(())
}

/// Open the configured durable store, falling back to memory when no path is known
fn open_store(config: &CatalogConfig) -> Result<Rc<dyn DurableStore>> {
    match &config.db_path {
        Some(path) => {
            let store = SqliteStore::open(path)
                .with_context(|| {
                    format!("Failed to open preference database at {}", path.display())
                })?;
            Ok(Rc::new(store))
        }
        None => {
            tracing::info!("Using in-memory preferences; nothing will be saved");
            Ok(Rc::new(MemoryStore::new()))
        }
    }
}

/// Turn a fetch completion into a CLI error when it failed
fn report(session: &Session, completion: Completion) -> Result<()> {
    if completion == Completion::Failed {
        match session.pagination().last_error() {
            Some(err) => bail!("Catalog request failed: {}", err),
            None => bail!("Catalog request failed"),
        }
    }
    Ok(())
}

fn year_label(item: &shelfex::state::CatalogItem) -> String {
    item.release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "unreleased".to_string())
}

async fn print_items(session: &Session, images: &ImageResolver) {
    let items = session.items();
    if items.is_empty() {
        println!("No movies found.");
        return;
    }

    for item in items {
        let marker = if session.is_favorite(item.id).await { "♥" } else { " " };
        println!(
            "{} {:<12} {} ({})  ★ {}  {}",
            marker,
            item.list_key(),
            item.title,
            year_label(item),
            item.rating_label(),
            images.poster(item),
        );
    }

    let cursor = session.pagination().cursor();
    println!(
        "-- {} movies, page {}{} ({})",
        items.len(),
        cursor.current_page,
        if cursor.has_more { ", more available" } else { "" },
        session.pagination().mode(),
    );
}

async fn favorites_command(
    session: &Session,
    collections: &Collections,
    images: &ImageResolver,
    action: FavoritesAction,
) -> Result<()> {
    match action {
        FavoritesAction::List => {
            let favorites = collections.favorites.list().await;
            if favorites.is_empty() {
                println!("No favorites yet.");
            }
            for item in favorites {
                println!(
                    "♥ {:<12} {} ({})  {}",
                    item.list_key(),
                    item.title,
                    year_label(&item),
                    images.poster(&item)
                );
            }
        }
        FavoritesAction::Add { id } => {
            let item = session.lookup(id).await?;
            collections.favorites.add(item.clone()).await?;
            println!("Added \"{}\" to favorites", item.title);
        }
        FavoritesAction::Remove { id } => {
            collections.favorites.remove(id).await?;
            println!("Removed movie-{} from favorites", id);
        }
        FavoritesAction::Toggle { id } => {
            let now_favorite = session.toggle_favorite(id).await?;
            println!(
                "movie-{} is {}",
                id,
                if now_favorite { "now a favorite" } else { "no longer a favorite" }
            );
        }
    }
    Ok(())
}

async fn history_command(collections: &Collections, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List => {
            for (index, query) in collections.history.list().await.iter().enumerate() {
                println!("{:>2}. {}", index, query);
            }
        }
        HistoryAction::Remove { query } => {
            if !collections.history.remove(&query).await? {
                println!("\"{}\" was not in the history", query);
            }
        }
        HistoryAction::Clear => {
            collections.history.clear().await?;
            println!("Search history cleared");
        }
    }
    Ok(())
}

async fn theme_command(
    collections: &Collections,
    action: ThemeAction,
    system: ColorScheme,
) -> Result<()> {
    let theme = match action {
        ThemeAction::Show => collections.theme.current().await,
        ThemeAction::Toggle => collections.theme.toggle().await?,
    };
    let effective = theme.resolve_effective(system);
    println!(
        "Theme: {} (rendering {})",
        theme,
        if effective.is_dark() { "dark" } else { "light" }
    );
    Ok(())
}

/// One line of interactive input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Text(&'a str),
    More,
    Favorite(i64),
    History(usize),
    Theme,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let Some(command) = line.strip_prefix(':') else {
        return Input::Text(line);
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("more"), None) => Input::More,
        (Some("theme"), None) => Input::Theme,
        (Some("quit" | "q"), None) => Input::Quit,
        (Some("fav"), Some(id)) => id.parse().map(Input::Favorite).unwrap_or(Input::Unknown(line)),
        (Some("history"), Some(n)) => n.parse().map(Input::History).unwrap_or(Input::Unknown(line)),
        _ => Input::Unknown(line),
    }
}

/// Drive the debouncer from stdin: every line is the current search text
async fn interactive(
    session: &mut Session,
    collections: &Collections,
    images: &ImageResolver,
    config: &CatalogConfig,
) -> Result<()> {
    let (mut debouncer, mut commands) = QueryDebouncer::new(config.debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type to search, an empty line to browse.");
    println!("Commands: :more :fav <id> :history <n> :theme :quit");
    let completion = session.browse().await;
    show(session, completion, images).await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Text(text) => debouncer.on_input(text),
                    Input::More => {
                        let loaded = session.load_more().await;
                        match loaded {
                            Some(completion) => show(session, completion, images).await,
                            None => println!("Nothing more to load."),
                        }
                    }
                    Input::Favorite(id) => match session.toggle_favorite(id).await {
                        Ok(true) => println!("♥ movie-{}", id),
                        Ok(false) => println!("  movie-{} removed from favorites", id),
                        Err(err) => eprintln!("⚠️  {}", err),
                    },
                    Input::History(index) => {
                        debouncer.discard(&mut commands);
                        let ran = session.run_history_entry(index).await;
                        match ran {
                            Some(completion) => show(session, completion, images).await,
                            None => println!("No history entry {}", index),
                        }
                    }
                    Input::Theme => match collections.theme.toggle().await {
                        Ok(theme) => println!("Theme: {}", theme),
                        Err(err) => eprintln!("⚠️  {}", err),
                    },
                    Input::Quit => break,
                    Input::Unknown(raw) => println!("Unknown command: {}", raw),
                }
            }
            Some(command) = commands.recv() => {
                let completion = session.apply(command).await;
                show(session, completion, images).await;
            }
        }
    }

    debouncer.cancel();
    Ok(())
}

async fn show(session: &Session, completion: Completion, images: &ImageResolver) {
    match report(session, completion) {
        Ok(()) => print_items(session, images).await,
        Err(err) => eprintln!("⚠️  {} (previous results kept)", err),
    }
}
