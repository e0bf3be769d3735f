//! `plaquectl` - CLI for memorial-plaque
//!
//! This binary browses the catalog, generates and checks memorial QR codes,
//! renders plaque previews and records orders in the local database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::Engine as _;
use clap::Parser;

use memorial_plaque::catalog::{self, try_price_of};
use memorial_plaque::checkout::place_order;
use memorial_plaque::cli::{
    load_draft, CatalogCommand, Cli, Command, ConfigCommand, MemorialCommand, OrderCommand,
    PreviewCommand, PriceCommand, QrCommand, ScanCheckCommand,
};
use memorial_plaque::preview::{self, PreviewInput};
use memorial_plaque::qr::{slugify, validate_scannability, Palette, QrGenerator};
use memorial_plaque::storage::{MemorialPage, Order};
use memorial_plaque::{init_logging, Config, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Catalog(cmd) => handle_catalog(&cmd),
        Command::Price(cmd) => handle_price(&config, &cmd),
        Command::Qr(cmd) => handle_qr(&config, &cmd).await,
        Command::ScanCheck(cmd) => handle_scan_check(&cmd),
        Command::Preview(cmd) => handle_preview(&config, &cmd).await,
        Command::Order(cmd) => handle_order(&config, cmd).await,
        Command::Memorial(cmd) => handle_memorial(&config, cmd),
        Command::Stats(cmd) => handle_stats(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn handle_catalog(cmd: &CatalogCommand) -> Result<()> {
    if cmd.json {
        let catalog = serde_json::json!({
            "materials": catalog::materials(),
            "sizes": catalog::sizes(),
            "fonts": catalog::fonts(),
        });
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("Materials");
    println!("=========");
    for material in catalog::materials() {
        println!(
            "  {:<14} {:<22} {:>8}  {} days",
            material.material_type.as_str(),
            material.name,
            material.price_base,
            material.lead_time_days
        );
    }
    println!();
    println!("Sizes");
    println!("=====");
    for size in catalog::sizes() {
        println!(
            "  {:<18} {:<22} {:>6}  +{}",
            size.id.as_str(),
            size.name,
            size.dimensions,
            size.price_modifier
        );
    }
    println!();
    println!("Fonts");
    println!("=====");
    for font in catalog::fonts() {
        println!("  {:<12} {}", font.id, font.name);
    }
    Ok(())
}

fn handle_price(config: &Config, cmd: &PriceCommand) -> Result<()> {
    let total = try_price_of(cmd.material.as_str(), cmd.size.as_str(), cmd.quantity)?;
    println!("{total} {}", config.checkout.currency);
    Ok(())
}

async fn handle_qr(config: &Config, cmd: &QrCommand) -> Result<()> {
    let slug = match (&cmd.name, &cmd.slug) {
        (_, Some(slug)) => slug.clone(),
        (Some(name), None) => slugify(name),
        (None, None) => bail!("either --name or --slug is required"),
    };
    if slug.is_empty() {
        bail!("name has no letters or digits to build a memorial slug from");
    }

    let mut generator = QrGenerator::from_config(&config.site, &config.qr);
    if let Some(level) = cmd.level {
        generator = generator.error_correction(level.into());
    }
    let qr = generator
        .generate_for_slug(&slug, Palette::for_engraving(cmd.color))
        .await?;

    if let Some(path) = &cmd.svg {
        write_file(path, &qr.image.svg)?;
    }
    if let Some(path) = &cmd.png {
        let encoded = qr
            .image
            .png
            .strip_prefix("data:image/png;base64,")
            .context("PNG rendering is not a base64 data URI")?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .context("PNG rendering is not valid base64")?;
        write_file(path, bytes)?;
    }

    println!("{}", qr.url);
    if cmd.svg.is_none() && cmd.png.is_none() {
        println!("{}", qr.image.svg);
    }
    Ok(())
}

fn handle_scan_check(cmd: &ScanCheckCommand) -> Result<()> {
    let plaque_mm = match (cmd.plaque_mm, cmd.size) {
        (Some(mm), _) => mm,
        (None, Some(size)) => f64::from(size.spec().min_side_mm()),
        (None, None) => bail!("either --plaque-mm or --size is required"),
    };
    let contrast = match (cmd.contrast, cmd.qr_color) {
        (Some(ratio), _) => ratio,
        (None, Some(color)) => Palette::for_engraving(color).contrast(),
        (None, None) => Palette::default().contrast(),
    };

    let report = validate_scannability(cmd.module_mm, plaque_mm, contrast);
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Module {:.2}mm on {plaque_mm:.1}mm plaque, contrast {contrast:.2}:1",
            cmd.module_mm
        );
        for warning in &report.warnings {
            println!("  warning: {warning}");
        }
        println!("{}", if report.valid { "Scannable" } else { "Not scannable" });
    }
    Ok(())
}

async fn handle_preview(config: &Config, cmd: &PreviewCommand) -> Result<()> {
    let draft = load_draft(&cmd.draft)
        .with_context(|| format!("failed to read draft {}", cmd.draft.display()))?;

    let qr = match (draft.slug(), draft.qr_color()) {
        (Some(slug), Some(color)) => Some(
            QrGenerator::from_config(&config.site, &config.qr)
                .generate_for_slug(&slug, Palette::for_engraving(color))
                .await?,
        ),
        _ => None,
    };

    let plaque = preview::render(&PreviewInput::from_draft(
        &draft,
        qr.as_ref().map(|qr| qr.image.svg.as_str()),
    ));

    if let Some(path) = &cmd.svg {
        write_file(path, plaque.to_svg())?;
    }
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&plaque)?);
    } else if cmd.svg.is_none() {
        println!("{}", plaque.to_svg());
    }
    Ok(())
}

async fn handle_order(config: &Config, cmd: OrderCommand) -> Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        OrderCommand::Create { draft, quantity } => {
            let draft_data = load_draft(&draft)
                .with_context(|| format!("failed to read draft {}", draft.display()))?;
            let generator = QrGenerator::from_config(&config.site, &config.qr);
            let record = place_order(
                &storage,
                &generator,
                &draft_data,
                None,
                quantity.unwrap_or(config.checkout.default_quantity),
                &config.checkout.currency,
            )
            .await?;

            println!("Order {} placed", record.order.order_number);
            println!("  Id:       {}", record.order.id);
            println!(
                "  Total:    {} {}",
                record.order.total_amount, record.order.currency
            );
            println!("  Memorial: {}", generator.memorial_url(&record.memorial_page.slug));
        }
        OrderCommand::Show { id, json } => {
            let order = storage
                .get_order(id)?
                .with_context(|| format!("order {id} not found"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&order)?);
            } else {
                print_order(&order);
            }
        }
        OrderCommand::Status { id, status } => {
            let order = storage.update_order_status(id, status)?;
            println!("Order {} is now {}", order.order_number, order.status);
        }
    }
    Ok(())
}

fn print_order(order: &Order) {
    println!("Order {}", order.order_number);
    println!("-------------------------");
    println!("Id:       {}", order.id);
    println!("Status:   {}", order.status);
    println!("Total:    {} {}", order.total_amount, order.currency);
    println!("Created:  {}", order.created_at.to_rfc3339());
    for plaque in &order.plaques {
        println!();
        println!(
            "  {} x {} {} ({})",
            plaque.quantity,
            plaque.material.spec().name,
            plaque.size.spec().name,
            plaque.shape
        );
        println!("    QR {} / text {}", plaque.qr_color, plaque.text_color);
        for line in &plaque.text_lines {
            println!("    | {line}");
        }
    }
}

fn handle_memorial(config: &Config, cmd: MemorialCommand) -> Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        MemorialCommand::Show { slug, json } => {
            let page = storage
                .get_memorial_page(&slug)?
                .with_context(|| format!("memorial page '{slug}' not found"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_memorial(config, &page);
            }
        }
        MemorialCommand::Visit { slug } => {
            let page = storage
                .get_memorial_page(&slug)?
                .with_context(|| format!("memorial page '{slug}' not found"))?;
            let visits = storage.increment_visit_count(page.id)?;
            println!("{slug}: {visits} visits");
        }
    }
    Ok(())
}

fn print_memorial(config: &Config, page: &MemorialPage) {
    let generator = QrGenerator::from_config(&config.site, &config.qr);
    println!("{}", page.full_name);
    println!("-------------------------");
    println!("URL:      {}", generator.memorial_url(&page.slug));
    if let Some(nick) = &page.nick_name {
        println!("Known as: {nick}");
    }
    match (&page.birth_month_year, &page.death_month_year) {
        (Some(birth), Some(death)) => println!("Dates:    {birth} - {death}"),
        (Some(birth), None) => println!("Born:     {birth}"),
        (None, Some(death)) => println!("Passed:   {death}"),
        (None, None) => {}
    }
    if let Some(words) = &page.few_words {
        println!("Words:    {words}");
    }
    println!("Privacy:  {}", page.privacy);
    println!("Visits:   {}", page.visits_count);
    println!("QR codes: {}", page.qr_records.len());
}

fn handle_stats(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("plaquectl stats");
        println!("---------------");
        println!("Database:       {}", storage.path().display());
        println!("Orders:         {}", stats.total_orders);
        println!("Awaiting pay:   {}", stats.pending_orders);
        println!("Memorial pages: {}", stats.memorial_pages);
        println!("QR codes:       {}", stats.qr_records);
        println!("Visits:         {}", stats.total_visits);
        if let Some(newest) = stats.newest_order {
            println!("Newest order:   {}", newest.to_rfc3339());
        }
        println!("Size:           {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Site]");
                println!("  Origin:             {}", config.site.origin);
                println!();
                println!("[QR]");
                println!("  Error correction:   {:?}", config.qr.error_correction);
                println!("  PNG width (px):     {}", config.qr.width_px);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Checkout]");
                println!("  Currency:           {}", config.checkout.currency);
                println!("  Default quantity:   {}", config.checkout.default_quantity);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
