use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use spectrabrainz::report::parse_report_date;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spectrabrainz")]
#[command(about = "StorCycle job-status reports and project API", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $SPECTRABRAINZ_CONFIG or config/spectrabrainz.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build today's job-status report, or load it if it already exists
    Daily(DailyArgs),
    /// Write today's status-YYYYMMDD.tsv job listing
    Status(DailyArgs),
    /// Print every job status row as JSON
    Jobs(JobsArgs),
    /// Check whether a project exists
    Exists(ProjectArgs),
    /// Print a project as JSON
    Project(ProjectArgs),
    /// Create an archive project
    Create(CreateArgs),
    /// List active ScanAndArchive projects
    Projects(ProjectsArgs),
}

#[derive(clap::Args, Debug)]
pub struct DailyArgs {
    /// Report date as YYYYMMDD (defaults to the local date)
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct JobsArgs {
    #[arg(long, default_value_t = 500)]
    pub page_size: usize,

    /// Include the full job history, not only recent jobs
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct ProjectArgs {
    /// Project (dataset) identifier
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    #[arg(long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Source directory on the archive share
    #[arg(long)]
    pub directory: String,
}

#[derive(clap::Args, Debug)]
pub struct ProjectsArgs {
    #[arg(long, default_value_t = 500)]
    pub page_size: usize,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_report_date(value).ok_or_else(|| format!("expected a YYYYMMDD date, got '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_with_date() {
        let cli = Cli::try_parse_from(["spectrabrainz", "daily", "--date", "20260105"]).unwrap();
        match cli.command {
            Commands::Daily(args) => {
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2026, 1, 5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_daily_rejects_bad_date() {
        assert!(Cli::try_parse_from(["spectrabrainz", "daily", "--date", "2026-01-05"]).is_err());
    }

    #[test]
    fn test_status_and_jobs() {
        let cli = Cli::try_parse_from(["spectrabrainz", "status"]).unwrap();
        assert!(matches!(cli.command, Commands::Status(DailyArgs { date: None })));

        let cli = Cli::try_parse_from(["spectrabrainz", "jobs", "--all"]).unwrap();
        match cli.command {
            Commands::Jobs(args) => {
                assert!(args.all);
                assert_eq!(args.page_size, 500);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["spectrabrainz", "exists", "ds1", "--config", "a.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert!(matches!(cli.command, Commands::Exists(ProjectArgs { ref id }) if id == "ds1"));
    }

    #[test]
    fn test_create_requires_name_and_directory() {
        assert!(Cli::try_parse_from(["spectrabrainz", "create", "--name", "x"]).is_err());
        assert!(
            Cli::try_parse_from([
                "spectrabrainz",
                "create",
                "--name",
                "",
                "--directory",
                "/data/x",
            ])
            .is_err()
        );
        let cli = Cli::try_parse_from([
            "spectrabrainz",
            "create",
            "--name",
            "x",
            "--directory",
            "/data/x",
        ])
        .unwrap();
        match cli.command {
            Commands::Create(args) => assert_eq!(args.description, ""),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
