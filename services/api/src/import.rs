use crate::infra::{parse_amount_order, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use lettings_import::config::AppConfig;
use lettings_import::error::AppError;
use lettings_import::storage::SqliteLettingsRepository;
use lettings_import::workflows::checklist::ChecklistCsvImporter;
use lettings_import::workflows::property_list::{
    AmountOrder, ExtractedRecord, PropertyListImporter, RunOptions,
};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Property list text export to import
    #[arg(long)]
    pub(crate) source: PathBuf,
    /// SQLite database file (defaults to IMPORT_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Skip the confirmation prompt after the preview
    #[arg(long)]
    pub(crate) yes: bool,
    /// Print the preview and stop without writing anything
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Number of parsed records to preview (defaults to IMPORT_PREVIEW_COUNT)
    #[arg(long)]
    pub(crate) preview: Option<usize>,
    /// Date tenancy status is evaluated against (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Which unlabeled amount is the deposit: deposit-first or rent-first
    #[arg(long, value_parser = parse_amount_order)]
    pub(crate) amount_order: Option<AmountOrder>,
    /// Print the run summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ChecklistArgs {
    /// Checklist CSV export with Property Address, Item, Completed and Document columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// SQLite database file (defaults to IMPORT_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) async fn run_import(config: AppConfig, args: ImportArgs) -> Result<(), AppError> {
    let mut import_config = config.import;
    if let Some(database) = args.database {
        import_config.database_path = database;
    }
    if let Some(preview) = args.preview {
        import_config.preview_count = preview;
    }
    if let Some(order) = args.amount_order {
        import_config.amount_order = order;
    }

    let importer = PropertyListImporter::new(&import_config)?;
    let text = PropertyListImporter::read_source(&args.source)?;
    let pages_found = importer.count_pages(&text)?;
    let preview = importer.preview(&text)?;
    print!(
        "{}",
        render_preview(pages_found, importer.extractor().amount_order(), &preview)
    );

    if args.dry_run {
        println!("Dry run: nothing was written.");
        return Ok(());
    }
    if !args.yes {
        let stdin = io::stdin();
        let confirmed = confirm(
            &mut stdin.lock(),
            &mut io::stdout(),
            "Proceed with the import?",
        )?;
        if !confirmed {
            println!("Import cancelled; nothing was written.");
            return Ok(());
        }
    }

    let repository = SqliteLettingsRepository::open(&import_config.database_path)?;
    let options = RunOptions {
        as_of: args.as_of.unwrap_or_else(|| Local::now().date_naive()),
    };
    info!(database = %import_config.database_path.display(), as_of = %options.as_of, "database opened");

    let cancel = Arc::new(AtomicBool::new(false));
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let run_cancel = cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        importer.import_with_cancel(&repository, &text, options, &run_cancel)
    })
    .await;
    watcher.abort();

    let summary = outcome.map_err(|err| AppError::Io(io::Error::other(err)))??;
    if args.json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{summary}");
    }
    Ok(())
}

pub(crate) fn run_checklist(config: AppConfig, args: ChecklistArgs) -> Result<(), AppError> {
    let database = args.database.unwrap_or(config.import.database_path);
    let repository = SqliteLettingsRepository::open(&database)?;
    let summary = ChecklistCsvImporter::from_path(&args.csv, &repository)?;
    print!("{summary}");
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: Arc<AtomicBool>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received; stopping after the current page");
        cancel.store(true, Ordering::SeqCst);
    }
}

/// Ask a yes/no question; only an explicit yes proceeds.
fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn render_preview(pages_found: usize, amount_order: AmountOrder, records: &[ExtractedRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Property list preview: {} pages found, amounts read {}",
        pages_found, amount_order
    );

    for record in records {
        let _ = writeln!(out, "\nPage {}", record.page);
        push_field(&mut out, "Property", record.property_address.as_deref());
        push_field(&mut out, "Postcode", record.postcode.as_deref());
        push_field(&mut out, "Landlord", record.landlord_name.as_deref());
        push_field(&mut out, "Tenant", record.tenant_name.as_deref());
        push_field(&mut out, "Deposit", record.deposit_amount.map(money).as_deref());
        push_field(&mut out, "Rent", record.rent_amount.map(money).as_deref());
        push_field(&mut out, "Start", record.tenancy_start.as_deref());
        push_field(&mut out, "End", record.tenancy_end.as_deref());
        if !record.checklist.is_empty() {
            let items: Vec<String> = record
                .checklist
                .iter()
                .map(|flag| {
                    format!(
                        "{} ({})",
                        flag.kind.label(),
                        if flag.completed { "done" } else { "outstanding" }
                    )
                })
                .collect();
            let _ = writeln!(out, "  Checklist: {}", items.join(", "));
        }
    }

    out
}

fn push_field(out: &mut String, label: &str, value: Option<&str>) {
    let _ = writeln!(out, "  {label}: {}", value.unwrap_or("-"));
}

fn money(amount: f64) -> String {
    format!("£{amount:.2}")
}
