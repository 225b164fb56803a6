pub mod cache;
pub mod config;
pub mod export;
pub mod model;
pub mod search;
pub mod storage;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;

use config::SearchConfig;
use export::ExportFormat;
use model::{LegalStatus, ListingFilters, ListingFlag, ListingStatus, NewInquiry};
use search::builder::{SearchPage, SearchRequest, SearchService};
use storage::sqlite::SqliteStore;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "properti-search",
    version,
    about = "Free-text search and inventory management for property listings"
)]
pub struct Cli {
    /// Path to the listings database (defaults to platform data dir)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Path to the search config (defaults to platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search listings by keyword and structured filters
    Search {
        /// Free-text keyword (may be empty to list everything)
        keyword: Vec<String>,

        #[arg(long, value_enum)]
        status: Option<ListingStatus>,

        /// Property type (rumah, tanah, ruko, ...)
        #[arg(long = "type")]
        property_type: Option<String>,

        #[arg(long)]
        min_price: Option<i64>,

        #[arg(long)]
        max_price: Option<i64>,

        /// Minimum bedroom count
        #[arg(long)]
        bedrooms: Option<i64>,

        #[arg(long)]
        min_land: Option<i64>,

        #[arg(long)]
        max_land: Option<i64>,

        #[arg(long)]
        min_building: Option<i64>,

        #[arg(long)]
        max_building: Option<i64>,

        #[arg(long, value_enum)]
        legal: Option<LegalStatus>,

        #[arg(long)]
        province: Option<String>,

        /// City / regency
        #[arg(long)]
        city: Option<String>,

        /// Include sold listings (excluded by default)
        #[arg(long)]
        include_sold: bool,

        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Page size (defaults to the configured value)
        #[arg(long)]
        page_size: Option<u32>,

        /// Also fetch the total match count
        #[arg(long)]
        count: bool,

        /// Emit the page as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Show one listing by code
    Show {
        code: String,

        #[arg(long)]
        json: bool,
    },
    /// Bulk-import listings from a CSV file (upserts by code)
    Import { file: PathBuf },
    /// Export all listings
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Flip a soft-state flag (premium/featured/hot/sold) on a listing
    Flag {
        code: String,

        #[arg(value_enum)]
        flag: ListingFlag,

        /// Clear the flag instead of setting it
        #[arg(long)]
        off: bool,
    },
    /// Hard-delete a listing (cascades to its inquiries)
    Delete { code: String },
    /// Record a buyer inquiry against a listing
    Inquire {
        code: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        message: Option<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let db_path = cli.db.clone().unwrap_or_else(default_db_path);

    match cli.command {
        Commands::Search {
            keyword,
            status,
            property_type,
            min_price,
            max_price,
            bedrooms,
            min_land,
            max_land,
            min_building,
            max_building,
            legal,
            province,
            city,
            include_sold,
            page,
            page_size,
            count,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let page_size = page_size.unwrap_or(config.page_size).max(1);
            let filters = ListingFilters {
                status,
                property_type,
                min_price,
                max_price,
                min_bedrooms: bedrooms,
                min_land_area: min_land,
                max_land_area: max_land,
                min_building_area: min_building,
                max_building_area: max_building,
                legal_status: legal,
                province,
                city,
                include_sold,
            };
            let request = SearchRequest {
                keyword: keyword.join(" "),
                filters,
                offset: page * page_size,
                page_size,
                with_count: count,
            };

            let store = SqliteStore::open(&db_path)?;
            let service = SearchService::with_columns(store, config.to_columns()?);
            let result = service.search(&request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_page(&result);
            }
        }
        Commands::Show { code, json } => {
            let store = SqliteStore::open(&db_path)?;
            let Some(listing) = store.get_by_code(&code)? else {
                bail!("no listing with code {code}");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_listing(&listing);
            }
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let items = export::parse_csv(&text)?;
            let mut store = SqliteStore::open(&db_path)?;
            let imported = store.import_listings(&items)?;
            println!("imported {imported} listing(s)");
        }
        Commands::Export { format, output } => {
            let store = SqliteStore::open(&db_path)?;
            let listings = store.all_listings()?;
            let rendered = export::export_listings(&listings, format);
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!(
                        "wrote {} listing(s) to {} ({})",
                        listings.len(),
                        path.display(),
                        format.name()
                    );
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Flag { code, flag, off } => {
            let store = SqliteStore::open(&db_path)?;
            if !store.set_flag(&code, flag, !off)? {
                bail!("no listing with code {code}");
            }
            println!("{code}: {:?} = {}", flag, !off);
        }
        Commands::Delete { code } => {
            let store = SqliteStore::open(&db_path)?;
            if !store.delete_listing(&code)? {
                bail!("no listing with code {code}");
            }
            println!("deleted {code}");
        }
        Commands::Inquire {
            code,
            name,
            phone,
            message,
        } => {
            let store = SqliteStore::open(&db_path)?;
            let inquiry = NewInquiry {
                name,
                phone,
                message,
            };
            store.insert_inquiry(&code, &inquiry)?;
            println!("recorded inquiry for {code}");
        }
    }

    Ok(())
}

fn load_config(override_path: Option<&std::path::Path>) -> Result<SearchConfig> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => config::default_config_path()?,
    };
    Ok(SearchConfig::load(&path)?)
}

fn print_page(page: &SearchPage) {
    if page.listings.is_empty() {
        println!("no listings matched");
        return;
    }
    for listing in &page.listings {
        print_listing(listing);
    }
    if let Some(total) = page.total {
        println!("{} match(es) total", total);
    }
    if let Some(next) = page.next_cursor {
        println!("more results from offset {next}");
    }
}

fn print_listing(listing: &model::Listing) {
    let mut badges = Vec::new();
    if listing.sold {
        badges.push("SOLD".red().bold().to_string());
    }
    if listing.premium {
        badges.push("PREMIUM".magenta().to_string());
    }
    if listing.featured {
        badges.push("FEATURED".green().to_string());
    }
    if listing.hot {
        badges.push("HOT".yellow().to_string());
    }
    let badges = if badges.is_empty() {
        String::new()
    } else {
        format!(" [{}]", badges.join(" "))
    };

    println!(
        "{} {}{}",
        listing.code.yellow().bold(),
        listing.title.bold(),
        badges
    );

    let mut details = vec![listing.status.as_db_str().to_string()];
    if let Some(tipe) = &listing.property_type {
        details.push(tipe.clone());
    }
    if let Some(price) = listing.price {
        details.push(export::format_price(price));
    }
    if let (Some(bed), Some(bath)) = (listing.bedrooms, listing.bathrooms) {
        details.push(format!("{bed}KT/{bath}KM"));
    }
    if let Some(lt) = listing.land_area {
        details.push(format!("LT {lt}m²"));
    }
    if let Some(lb) = listing.building_area {
        details.push(format!("LB {lb}m²"));
    }
    if let Some(legal) = listing.legal_status {
        details.push(legal.as_db_str().to_string());
    }
    println!("  {}", details.join(" · ").dimmed());

    let place: Vec<&str> = [listing.city.as_deref(), listing.province.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !place.is_empty() {
        println!("  {}", place.join(", ").dimmed());
    }
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "properti-search", "properti-search")
        .expect("project dirs available")
        .data_dir()
        .join("listings.db")
}
