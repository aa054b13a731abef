use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use estate_search::api::{HttpApi, SignInRequest, SignUpRequest, UserUpdate};
use estate_search::home::HomeFeed;
use estate_search::search::{query, Applied, ListingFetcher, SearchView};
use estate_search::session::{Session, SessionStore};
use estate_search::{
    contact, Config, Listing, ListingDraft, ListingSource, MemoryRouter, Navigator, User,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "estate-search", about = "Browse and manage real-estate listings")]
struct Cli {
    /// Backend base URL, overrides ESTATE_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search listings with a query string, e.g. "type=rent&parking=true"
    Search {
        #[arg(default_value = "")]
        query: String,
        /// Replace the search term, keeping the other parameters
        #[arg(long)]
        term: Option<String>,
        /// Pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
        #[arg(long, default_value = "search_results.json")]
        out: PathBuf,
    },
    /// Recent offers, rentals and sales
    Home,
    /// Show one listing and how to contact its owner
    Listing {
        id: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    SignUp {
        username: String,
        email: String,
        password: String,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignOut,
    /// Listings owned by the signed-in user
    MyListings,
    /// Create a listing from a JSON draft
    Create { draft: PathBuf },
    /// Replace one of your listings with a JSON draft
    Update { id: String, draft: PathBuf },
    /// Delete one of your listings
    Delete { id: String },
    /// Change profile fields of the signed-in user
    UpdateProfile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Delete the signed-in account and forget the session
    DeleteAccount,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    let sessions = SessionStore::new(&config.session_path);
    let session = sessions.load().await?;
    let api = HttpApi::with_timeout(&config.api_url, config.timeout)
        .context("Failed to create HTTP client")?
        .with_token(session.token.clone());

    match cli.command {
        Command::Search {
            query: raw,
            term,
            pages,
            out,
        } => search(api, &config, &raw, term.as_deref(), pages, out).await,
        Command::Home => home(&api).await,
        Command::Listing { id, message } => show_listing(&api, &id, &message).await,
        Command::SignUp {
            username,
            email,
            password,
        } => {
            api.sign_up(&SignUpRequest {
                username,
                email,
                password,
            })
            .await?;
            info!("✅ Account created, you can sign in now");
            Ok(())
        }
        Command::SignIn { email, password } => {
            let signed_in = api.sign_in(&SignInRequest { email, password }).await?;
            sessions
                .save(&Session::signed_in(signed_in.user, signed_in.token))
                .await
        }
        Command::SignOut => {
            if let Err(e) = api.sign_out().await {
                warn!("Backend sign-out failed: {}", e);
            }
            sessions.clear().await?;
            info!("Signed out");
            Ok(())
        }
        Command::MyListings => {
            let user = require_user(&session)?;
            let listings = api.user_listings(&user.id).await?;
            print_listings(&listings);
            Ok(())
        }
        Command::Create { draft } => {
            let user = require_user(&session)?;
            let draft = read_draft(&draft).await?;
            let listing = api.create_listing(&draft, user).await?;
            println!("/listing/{}", listing.id);
            Ok(())
        }
        Command::Update { id, draft } => {
            let user = require_user(&session)?;
            let draft = read_draft(&draft).await?;
            let listing = api.update_listing(&id, &draft, user).await?;
            info!("✅ Updated listing {}", listing.id);
            println!("/listing/{}", listing.id);
            Ok(())
        }
        Command::Delete { id } => {
            require_user(&session)?;
            api.delete_listing(&id).await?;
            Ok(())
        }
        Command::UpdateProfile {
            username,
            email,
            password,
            avatar,
        } => {
            let user = require_user(&session)?;
            let update = UserUpdate {
                username,
                email,
                password,
                avatar,
            };
            if update.is_empty() {
                bail!("Nothing to update, pass at least one of --username, --email, --password, --avatar");
            }
            let updated = api.update_user(&user.id, &update).await?;
            sessions.update_user(updated).await?;
            info!("✅ Profile updated");
            Ok(())
        }
        Command::DeleteAccount => {
            let user = require_user(&session)?;
            api.delete_user(&user.id).await?;
            sessions.clear().await?;
            info!("Account {} deleted", user.username);
            Ok(())
        }
    }
}

async fn read_draft(path: &Path) -> Result<ListingDraft> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).context("Invalid listing draft")
}

async fn search(
    api: HttpApi,
    config: &Config,
    raw: &str,
    term: Option<&str>,
    pages: usize,
    out: PathBuf,
) -> Result<()> {
    let raw = raw.trim_start_matches('?');
    let mut router = MemoryRouter::new(&format!("{}?{}", query::SEARCH_PATH, raw));
    if let Some(term) = term {
        let search = query::with_search_term(&router.location().search, term);
        router.push(&format!("{}?{}", query::SEARCH_PATH, search));
    }

    let source: Arc<dyn ListingSource> = Arc::new(api);
    let fetcher = ListingFetcher::with_page_size(source, config.page_size);
    let mut view = SearchView::new(router, fetcher);

    info!("Searching {}", view.navigator().location().href());
    let mut outcome = view.refresh().await;
    for _ in 1..pages {
        match view.show_more().await {
            Some(applied) => outcome = Some(applied),
            None => break,
        }
    }

    if outcome == Some(Applied::Failed) {
        let message = view.error().map(|e| e.message.clone()).unwrap_or_default();
        bail!("Search failed: {}", message);
    }

    if view.is_empty_result() {
        println!("No listing found!");
        return Ok(());
    }

    info!("\n✅ Found {} listings\n", view.listings().len());
    print_listings(view.listings());
    if view.more_available() {
        println!("More results available, rerun with --pages {}", pages + 1);
    }

    let json = serde_json::to_string_pretty(view.listings())?;
    tokio::fs::write(&out, json).await?;
    info!("💾 Saved listings to {}", out.display());
    Ok(())
}

async fn home(api: &HttpApi) -> Result<()> {
    let feed = HomeFeed::load(api).await;
    for (title, link, listings) in [
        ("Recent offers", "/search?offer=true", &feed.offers),
        ("Recent places for rent", "/search?type=rent", &feed.rentals),
        ("Recent places for sale", "/search?type=sale", &feed.sales),
    ] {
        if listings.is_empty() {
            continue;
        }
        println!("== {} ({})", title, link);
        print_listings(listings);
    }
    Ok(())
}

async fn show_listing(api: &HttpApi, id: &str, message: &str) -> Result<()> {
    let listing = api.listing(id).await?;
    print_listings(std::slice::from_ref(&listing));
    match contact::landlord(api, &listing).await {
        Ok(landlord) => {
            println!("Contact {} for {}", landlord.username, listing.name.to_lowercase());
            println!("   {}", contact::mailto(&landlord, &listing, message));
        }
        Err(e) => warn!("Could not load landlord: {}", e),
    }
    Ok(())
}

fn require_user(session: &Session) -> Result<&User> {
    match &session.current_user {
        Some(user) => Ok(user),
        None => bail!("Not signed in, run `estate-search sign-in` first"),
    }
}

fn print_listings(listings: &[Listing]) {
    for (i, listing) in listings.iter().enumerate() {
        println!("{}. {} ({})", i + 1, listing.name, listing.price_label());
        println!("   {}, {}", listing.bedrooms_label(), listing.bathrooms_label());
        println!("   Address: {}", listing.address);
        println!("   ID: {}", listing.id);
        println!("   Image: {}", listing.cover_image());
        println!();
    }
}
