use crate::import::{run_checklist, run_import, ChecklistArgs, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lettings_import::config::AppConfig;
use lettings_import::error::AppError;
use lettings_import::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "lettings-import",
    about = "Import the legacy property list export into landlord, property and tenancy records",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview, confirm and import a property list text export
    Import(ImportArgs),
    /// Apply a checklist CSV export to imported tenancies
    Checklist(ChecklistArgs),
    /// Start the HTTP service exposing health, metrics and extraction preview
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Import(args) => run_import(config, args).await,
        Command::Checklist(args) => run_checklist(config, args),
        Command::Serve(args) => server::run(config, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use lettings_import::workflows::property_list::AmountOrder;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_flags_parse() {
        let cli = Cli::try_parse_from([
            "lettings-import",
            "import",
            "--source",
            "property_list.txt",
            "--yes",
            "--preview",
            "5",
            "--as-of",
            "2024-06-01",
            "--amount-order",
            "rent-first",
        ])
        .expect("arguments parse");

        let Command::Import(args) = cli.command else {
            panic!("expected import command");
        };
        assert!(args.yes);
        assert!(!args.dry_run);
        assert_eq!(args.preview, Some(5));
        assert_eq!(args.amount_order, Some(AmountOrder::RentFirst));
        assert_eq!(
            args.as_of,
            chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn import_rejects_unknown_amount_order() {
        let result = Cli::try_parse_from([
            "lettings-import",
            "import",
            "--source",
            "property_list.txt",
            "--amount-order",
            "sideways",
        ]);
        assert!(result.is_err());
    }
}
