//! `meli` command line.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use meli_client::{
    init_logging, Condition, ExportFormat, Exporter, LoggingConfig, MeliClient, MeliConfig,
    MeliResult, SearchFilters, SiteId, SortOrder,
};

#[derive(Parser)]
#[command(name = "meli", version, about = "MercadoLibre marketplace client")]
struct Cli {
    /// Site to query (MLM, MLA, MLB, ...). Overrides DEFAULT_SITE.
    #[arg(long, global = true)]
    site: Option<SiteId>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search listings, walking result pages of 50.
    Search {
        query: String,
        /// Maximum number of records.
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Number of pages of 50 to fetch; overrides --limit.
        #[arg(long)]
        pages: Option<usize>,
        #[arg(long)]
        category: Option<String>,
        /// new, used or not_specified
        #[arg(long)]
        condition: Option<Condition>,
        /// relevance, price_asc or price_desc
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Write results to the exports directory (json or csv).
        #[arg(long)]
        export: Option<ExportFormat>,
        /// Send the stored access token.
        #[arg(long)]
        auth: bool,
    },
    /// Show one listing.
    Item {
        id: String,
        /// Also print the seller's description.
        #[arg(long)]
        description: bool,
        /// Send the stored access token.
        #[arg(long)]
        auth: bool,
    },
    /// List the top-level categories of the site.
    Categories,
    /// Token management.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Print the authorization URL to open in a browser.
    Url {
        #[arg(long)]
        pkce: bool,
    },
    /// Exchange the code from the redirect for a token.
    Exchange {
        code: String,
        /// Require the verifier saved by `auth url --pkce`.
        #[arg(long)]
        pkce: bool,
    },
    /// Obtain an application token.
    ClientCredentials,
    /// Refresh the stored token.
    Refresh,
    /// Show token state and remaining lifetime.
    Status,
    /// Delete the stored token.
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_logging(LoggingConfig::from_env());

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.reason(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> MeliResult<()> {
    let mut config = MeliConfig::from_env()?;
    if let Some(site) = cli.site {
        config.site = site;
    }
    let exports_dir = config.exports_dir.clone();
    let redirect_uri = config.redirect_uri.clone();
    let mut client = MeliClient::from_config(config).await?;

    match cli.command {
        Command::Search {
            query,
            limit,
            pages,
            category,
            condition,
            sort,
            export,
            auth,
        } => {
            let mut filters = SearchFilters::new();
            if let Some(category) = category {
                filters = filters.with_category(category);
            }
            if let Some(condition) = condition {
                filters = filters.with_condition(condition);
            }
            if let Some(sort) = sort {
                filters = filters.with_sort(sort);
            }
            let max_results = pages.map_or(limit, |p| p.saturating_mul(50));

            let outcome = client
                .search()
                .authenticated(auth)
                .search_all_detailed(&query, max_results, &filters)
                .await?;

            for record in &outcome.records {
                println!(
                    "{}\t{:>12.2} {}\t{}",
                    record.id, record.price, record.currency, record.title
                );
            }
            println!(
                "{} records from {} page(s), {} reported",
                outcome.records.len(),
                outcome.pages_fetched,
                outcome
                    .reported_total
                    .map_or_else(|| "none".to_string(), |t| t.to_string())
            );
            if !outcome.is_complete() {
                eprintln!("search stopped early: {:?}", outcome.stop_reason);
            }

            if let Some(format) = export {
                let path = Exporter::new(exports_dir)
                    .export(&outcome.records, &query, format)
                    .await?;
                println!("exported to {}", path.display());
            }
        }
        Command::Item {
            id,
            description,
            auth,
        } => {
            let item = client.items().authenticated(auth).get(&id).await?;
            let record = &item.record;
            println!("{}  {}", record.id, record.title);
            println!("price: {:.2} {}", record.price, record.currency);
            println!("condition: {}", record.condition);
            println!("sold: {}", record.sold_quantity);
            println!("free shipping: {}", record.free_shipping);
            println!("link: {}", record.permalink);
            if let Some(warranty) = &item.warranty {
                println!("warranty: {}", warranty);
            }
            for attribute in &item.attributes {
                println!(
                    "  {}: {}",
                    attribute.name,
                    attribute.value.as_deref().unwrap_or("-")
                );
            }

            if record.seller_id != 0 {
                match client.catalog().seller(record.seller_id).await {
                    Ok(seller) => println!(
                        "seller: {} ({})",
                        seller.nickname,
                        seller
                            .seller_reputation
                            .level_id
                            .as_deref()
                            .unwrap_or("no reputation")
                    ),
                    Err(e) => tracing::warn!(reason = e.reason(), "Seller lookup failed"),
                }
            }

            if description {
                let text = client.items().authenticated(auth).description(&id).await?;
                println!();
                println!("{}", text);
            }
        }
        Command::Categories => {
            for category in client.catalog().categories().await? {
                println!("{}\t{}", category.id, category.name);
            }
        }
        Command::Auth { action } => run_auth(&mut client, action, &redirect_uri).await?,
    }

    Ok(())
}

async fn run_auth(client: &mut MeliClient, action: AuthAction, redirect_uri: &str) -> MeliResult<()> {
    match action {
        AuthAction::Url { pkce } => {
            let url = client.auth().build_authorization_url(redirect_uri, pkce).await?;
            println!("{}", url);
        }
        AuthAction::Exchange { code, pkce } => {
            let token = if pkce {
                client.auth().exchange_code_with_pkce(&code, redirect_uri).await?
            } else {
                client.auth().exchange_code(&code, redirect_uri).await?
            };
            print_expiry(token.remaining_lifetime(chrono::Utc::now()));
        }
        AuthAction::ClientCredentials => {
            let token = client.auth().client_credentials_grant().await?;
            print_expiry(token.remaining_lifetime(chrono::Utc::now()));
        }
        AuthAction::Refresh => {
            let token = client.auth().refresh().await?;
            print_expiry(token.remaining_lifetime(chrono::Utc::now()));
        }
        AuthAction::Status => {
            let status = client.auth_status();
            println!("state: {}", status.state.as_str());
            if let Some(expires_at) = status.expires_at {
                println!("expires at: {}", expires_at.to_rfc3339());
            }
            if let Some(secs) = status.remaining_secs {
                println!("remaining: {}m {}s", secs / 60, secs % 60);
            }
            println!("refresh token: {}", status.has_refresh_token);
            if status.pkce_pending {
                println!("pkce verifier pending");
            }
        }
        AuthAction::Logout => {
            client.auth().logout().await?;
            println!("logged out");
        }
    }
    Ok(())
}

fn print_expiry(remaining_secs: Option<i64>) {
    match remaining_secs {
        Some(secs) => println!("token stored, valid for {} minutes", secs / 60),
        None => println!("token stored, no expiry reported"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_item_accepts_auth_flag() {
        let cli = Cli::try_parse_from(["meli", "item", "MLM42", "--auth", "--description"]).unwrap();
        match cli.command {
            Command::Item {
                id,
                description,
                auth,
            } => {
                assert_eq!(id, "MLM42");
                assert!(description);
                assert!(auth);
            }
            _ => panic!("expected the item command"),
        }
    }

    #[test]
    fn test_item_is_anonymous_by_default() {
        let cli = Cli::try_parse_from(["meli", "item", "MLM42"]).unwrap();
        assert!(matches!(cli.command, Command::Item { auth: false, .. }));
    }
}
