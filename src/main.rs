use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use decor_wishlist::catalog::{CatalogError, ProductDetails, StaticCatalog, resolve_entries};
use decor_wishlist::config::{ConfigError, NotifyConfig, WishlistConfig};
use decor_wishlist::notify::{Inquiry, InquiryNotifier, NotifyError, ResendNotifier};
use decor_wishlist::wishlist::{FileStorage, WishlistStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "decor-wishlist", about = "Event-decor rental wishlist")]
struct Cli {
    /// Snapshot directory; overrides WISHLIST_DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON product catalog; overrides WISHLIST_CATALOG_PATH.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add products to the wishlist.
    Add {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove products from the wishlist.
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Flip each product in or out of the wishlist.
    Toggle {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Print the wishlist, resolved against the catalog when one is configured.
    List,
    /// Empty the wishlist and delete its snapshot.
    Clear,
    /// Email the wishlist to the business for a consultation.
    Send(SendArgs),
}

#[derive(Args, Debug)]
struct SendArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    event_date: Option<String>,
    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = WishlistConfig::from_env()?;
    run(cli, config, &mut std::io::stdout().lock()).await
}

async fn run<W: Write>(cli: Cli, mut config: WishlistConfig, out: &mut W) -> Result<(), CliError> {
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }

    let catalog = config.catalog_path.as_deref().map(StaticCatalog::load).transpose()?;
    let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
    let store = WishlistStore::new(storage, config.store_settings());
    let state = store.initialize();
    tracing::debug!(hydration = ?state.hydration, count = state.items.len(), "wishlist loaded");

    let _changes = store.subscribe(|items| tracing::info!(count = items.len(), "wishlist updated"));

    match cli.command {
        Command::Add { ids } => {
            ids.iter().for_each(|id| store.add(id));
            print_entries(out, &store, catalog.as_ref())
        }
        Command::Remove { ids } => {
            ids.iter().for_each(|id| store.remove(id));
            print_entries(out, &store, catalog.as_ref())
        }
        Command::Toggle { ids } => {
            ids.iter().for_each(|id| store.toggle(id));
            print_entries(out, &store, catalog.as_ref())
        }
        Command::List => print_entries(out, &store, catalog.as_ref()),
        Command::Clear => {
            store.clear();
            writeln!(out, "wishlist cleared")?;
            Ok(())
        }
        Command::Send(args) => send_inquiry(out, &store, catalog.as_ref(), args).await,
    }
}

fn entries(ids: &[String], catalog: Option<&StaticCatalog>) -> Vec<ProductDetails> {
    match catalog {
        Some(catalog) => resolve_entries(catalog, ids),
        None => ids.iter().map(|id| ProductDetails::unresolved(id)).collect(),
    }
}

fn print_entries<W: Write>(out: &mut W, store: &WishlistStore, catalog: Option<&StaticCatalog>) -> Result<(), CliError> {
    let ids = store.items();
    if ids.is_empty() {
        writeln!(out, "wishlist is empty")?;
        return Ok(());
    }
    for details in entries(&ids, catalog) {
        match &details.subtitle {
            Some(subtitle) => writeln!(out, "{}\t{} ({subtitle})", details.id, details.name)?,
            None => writeln!(out, "{}\t{}", details.id, details.name)?,
        }
    }
    Ok(())
}

async fn send_inquiry<W: Write>(
    out: &mut W,
    store: &WishlistStore,
    catalog: Option<&StaticCatalog>,
    args: SendArgs,
) -> Result<(), CliError> {
    let notifier = ResendNotifier::new(&NotifyConfig::from_env()?);
    let inquiry = Inquiry {
        name: args.name,
        email: args.email,
        phone: args.phone,
        event_date: args.event_date,
        message: args.message,
        items: entries(&store.items(), catalog),
    }
    .validated()?;

    notifier.send_inquiry(&inquiry).await?;
    writeln!(out, "inquiry sent to {}", notifier.recipient())?;
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
