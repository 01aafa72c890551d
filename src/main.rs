// Entry point and high-level CLI flow.
//
// One-shot subcommands load the sheet, run a single dashboard pass and print
// or write the results. `interactive` keeps the loaded dataset for the whole
// run and re-runs the pass every time the filters change.
mod dashboard;
mod error;
mod filter;
mod loader;
mod logging;
mod output;
mod parser;
mod reports;
mod summary;
mod types;
mod util;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use dashboard::{build_dashboard, filter_options, Dashboard};
use filter::{apply_filters, FilterSelection};
use loader::{InputFormat, LoadReport};
use types::{Dataset, ProgressRow, SessionTab, TableRow};

const PROGRESS_EXPORT: &str = "curriculum_tracker.csv";
const DASHBOARD_JSON: &str = "dashboard.json";

#[derive(Parser)]
#[command(name = "curriculum-tracker")]
#[command(about = "School and subject curriculum completion dashboard", version)]
struct Cli {
    /// Sheet export to read (CSV or values JSON); `-` reads stdin
    #[arg(long, global = true, env = "TRACKER_INPUT", default_value = "sessions.csv")]
    input: String,

    /// Input layout
    #[arg(long, global = true, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,

    /// Cell delimiter for CSV input
    #[arg(long, global = true, default_value_t = parser::DEFAULT_DELIMITER)]
    delimiter: char,

    /// Logging level (error, warn, info, debug, trace) or an EnvFilter directive
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Only this school (exact match)
    #[arg(long)]
    school: Option<String>,
    /// Only this subject (exact match)
    #[arg(long)]
    subject: Option<String>,
    /// Only this month, as YYYY-MM
    #[arg(long)]
    month: Option<String>,
}

impl FilterArgs {
    fn selection(&self) -> anyhow::Result<FilterSelection> {
        let selection = FilterSelection {
            school_name: self.school.clone(),
            subject: self.subject.clone(),
            month: self.month.clone(),
        };
        selection.validate_month()?;
        Ok(selection)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the summary cards and progress tables
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        /// Session types counted by the table view
        #[arg(long, value_enum, default_value_t = SessionTab::All)]
        tab: SessionTab,
        #[arg(long, default_value_t = 20)]
        max_rows: usize,
    },
    /// Write the progress CSV and dashboard JSON, then print previews
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value_t = SessionTab::All)]
        tab: SessionTab,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write the filtered records back out as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "filtered_sessions.csv")]
        out: PathBuf,
    },
    /// Menu-driven session: load once, then filter and re-render
    Interactive,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level)?;
    tracing::debug!("curriculum-tracker v{} starting", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Summary {
            filters,
            tab,
            max_rows,
        } => {
            let selection = filters.selection()?;
            let (dataset, report) = load(&cli.input, cli.format, cli.delimiter)?;
            print_load_report(&report);
            let dash = build_dashboard(&dataset, &selection, *tab);
            print_dashboard(&dash, *max_rows);
        }
        Commands::Report {
            filters,
            tab,
            out_dir,
        } => {
            let selection = filters.selection()?;
            let (dataset, report) = load(&cli.input, cli.format, cli.delimiter)?;
            print_load_report(&report);
            let dash = build_dashboard(&dataset, &selection, *tab);
            write_report_files(&dash, out_dir)?;
            print_dashboard(&dash, 5);
            println!("(Full tables exported to {})\n", out_dir.display());
        }
        Commands::Export { filters, out } => {
            let selection = filters.selection()?;
            let (dataset, _) = load(&cli.input, cli.format, cli.delimiter)?;
            let written = export_records(&dataset, &selection, out)?;
            println!(
                "Exported {} records ({}) to {}.",
                util::format_int(written),
                selection.describe(),
                out.display()
            );
        }
        Commands::Interactive => run_interactive(&cli),
    }

    Ok(())
}

fn load(input: &str, format: InputFormat, delimiter: char) -> anyhow::Result<(Dataset, LoadReport)> {
    loader::load_dataset(input, format, delimiter)
        .with_context(|| format!("could not load tracker data from {input}"))
}

fn write_report_files(dash: &Dashboard, out_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("could not create {}", out_dir.display()))?;

    let rows: Vec<ProgressRow> = dash.progress.iter().map(ProgressRow::from).collect();
    let csv_path = out_dir.join(PROGRESS_EXPORT);
    output::write_csv(&csv_path, &rows)
        .with_context(|| format!("could not write {}", csv_path.display()))?;

    let json_path = out_dir.join(DASHBOARD_JSON);
    output::write_json(&json_path, dash)
        .with_context(|| format!("could not write {}", json_path.display()))?;

    tracing::info!(
        "Wrote {} progress rows to {} and dashboard to {}",
        rows.len(),
        csv_path.display(),
        json_path.display()
    );
    Ok(())
}

fn export_records(dataset: &Dataset, selection: &FilterSelection, out: &Path) -> anyhow::Result<usize> {
    let filtered = apply_filters(dataset.records(), selection);
    let text = output::to_csv(&filtered, dataset.headers())?;
    std::fs::write(out, text).with_context(|| format!("could not write {}", out.display()))?;
    tracing::info!("Exported {} records to {}", filtered.len(), out.display());
    Ok(filtered.len())
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read, {} records loaded)",
        util::format_int(report.total_rows),
        util::format_int(report.loaded_records)
    );
    if !report.missing_columns.is_empty() {
        println!(
            "Warning: missing columns: {}",
            report.missing_columns.join(", ")
        );
    }
    if !report.unknown_columns.is_empty() {
        println!(
            "Note: extra columns kept as-is: {}",
            report.unknown_columns.join(", ")
        );
    }
    if report.short_rows > 0 {
        println!(
            "Note: {} rows had missing cells (treated as blank).",
            util::format_int(report.short_rows)
        );
    }
    if report.unparsed_dates > 0 {
        println!(
            "Note: {} rows have no YYYY-MM-DD session date.",
            util::format_int(report.unparsed_dates)
        );
    }
    println!();
}

fn print_dashboard(dash: &Dashboard, max_rows: usize) {
    let s = &dash.summary;
    println!("Curriculum Tracker ({})", dash.selection);
    println!(
        "Schools: {}  Subjects: {}  Sessions: {}",
        util::format_int(s.distinct_schools),
        util::format_int(s.distinct_subjects),
        util::format_int(dash.record_count)
    );
    println!("{}", s.status_line());

    let progress: Vec<ProgressRow> = dash.progress.iter().map(ProgressRow::from).collect();
    output::preview_table(
        "Class Progress by School and Subject",
        Some("class sessions only"),
        &progress,
        max_rows,
    );

    let table: Vec<TableRow> = dash.table.iter().map(TableRow::from).collect();
    let note = format!("{} sessions", dash.tab);
    output::preview_table(
        "Sessions by School and Subject",
        Some(note.as_str()),
        &table,
        max_rows,
    );

    println!("Monthly Class Completion");
    if dash.trend_chart.months.is_empty() {
        println!("(no rows)\n");
        return;
    }
    for series in &dash.trend_chart.series {
        let points: Vec<String> = dash
            .trend_chart
            .months
            .iter()
            .zip(&series.ratios)
            .map(|(m, r)| format!("{m}: {:.0}%", r * 100.0))
            .collect();
        println!("- {}: {}", series.subject, points.join(", "));
    }
    println!();
}

// ── Interactive mode ──────────────────────────────────────────────────────────

/// What the menu loop carries between choices; owned here, passed down by reference.
#[derive(Default)]
struct Session {
    dataset: Option<Dataset>,
    selection: FilterSelection,
    tab: SessionTab,
}

/// Print `label` and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn run_interactive(cli: &Cli) {
    let mut session = Session::default();
    loop {
        println!("Curriculum Tracker");
        println!("[1] Load the file");
        println!("[2] Set filters");
        println!("[3] Clear filters");
        println!("[4] Show dashboard");
        println!("[5] Export reports");
        println!("[6] Exit\n");
        let Some(choice) = prompt("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(cli, &mut session),
            "2" => handle_set_filters(&mut session),
            "3" => {
                session.selection = FilterSelection::default();
                session.tab = SessionTab::All;
                println!("Filters cleared.\n");
                show(&session);
            }
            "4" => show(&session),
            "5" => handle_export(&session),
            "6" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1-6.\n"),
        }
    }
}

fn handle_load(cli: &Cli, session: &mut Session) {
    match load(&cli.input, cli.format, cli.delimiter) {
        Ok((dataset, report)) => {
            print_load_report(&report);
            if dataset.is_empty() {
                println!("Note: the sheet has a header row but no data rows.\n");
            }
            session.dataset = Some(dataset);
            session.selection = FilterSelection::default();
            show(session);
        }
        Err(e) => eprintln!("Error: {e:#}\n"),
    }
}

fn handle_set_filters(session: &mut Session) {
    let Some(dataset) = session.dataset.as_ref() else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };
    let options = filter_options(dataset);
    println!("Schools: {}", options.schools.join(", "));
    println!("Subjects: {}", options.subjects.join(", "));
    println!("Months: {}", options.months.join(", "));

    let as_filter = |v: Option<String>| v.filter(|s| !s.is_empty());
    let candidate = FilterSelection {
        school_name: as_filter(prompt("School (blank for all): ")),
        subject: as_filter(prompt("Subject (blank for all): ")),
        month: as_filter(prompt("Month YYYY-MM (blank for all): ")),
    };
    if let Err(e) = candidate.validate_month() {
        println!("{e}\n");
        return;
    }
    let tab = match prompt("Table tab [all/class/test] (blank for all): ")
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "class" => SessionTab::Class,
        "test" => SessionTab::Test,
        _ => SessionTab::All,
    };
    session.selection = candidate;
    session.tab = tab;
    println!();
    show(session);
}

fn show(session: &Session) {
    match session.dataset.as_ref() {
        Some(dataset) => {
            let dash = build_dashboard(dataset, &session.selection, session.tab);
            print_dashboard(&dash, 20);
        }
        None => println!("Error: No data loaded. Please load the file first (option 1).\n"),
    }
}

fn handle_export(session: &Session) {
    let Some(dataset) = session.dataset.as_ref() else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };
    let dash = build_dashboard(dataset, &session.selection, session.tab);
    match write_report_files(&dash, Path::new(".")) {
        Ok(()) => println!(
            "Outputs saved to {} and {}.\n",
            PROGRESS_EXPORT, DASHBOARD_JSON
        ),
        Err(e) => eprintln!("Write error: {e:#}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
batch_or_school_name,subject,session_type,chapter_status,session_date
LincolnHS,Maths,Class,Completed,2024-03-05
Oakwood,Science,Test,Pending,2024-04-10
";

    fn dataset() -> Dataset {
        loader::normalize(parser::parse(SHEET, ',')).unwrap()
    }

    #[test]
    fn cli_parses_filters_and_globals() {
        let cli = Cli::try_parse_from([
            "curriculum-tracker",
            "summary",
            "--school",
            "LincolnHS",
            "--month",
            "2024-03",
            "--tab",
            "class",
            "--input",
            "sheet.json",
        ])
        .unwrap();
        assert_eq!(cli.input, "sheet.json");
        match &cli.command {
            Commands::Summary { filters, tab, .. } => {
                let sel = filters.selection().unwrap();
                assert_eq!(sel.school_name.as_deref(), Some("LincolnHS"));
                assert_eq!(sel.month.as_deref(), Some("2024-03"));
                assert_eq!(*tab, SessionTab::Class);
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn bad_month_is_rejected() {
        let args = FilterArgs {
            month: Some("03/2024".to_string()),
            ..FilterArgs::default()
        };
        assert!(args.selection().is_err());
    }

    #[test]
    fn report_files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset();
        let dash = build_dashboard(&ds, &FilterSelection::default(), SessionTab::All);
        write_report_files(&dash, dir.path()).unwrap();

        let csv = std::fs::read_to_string(dir.path().join(PROGRESS_EXPORT)).unwrap();
        assert_eq!(
            csv,
            "School,Subject,Classes_Done,Classes_Total\nLincolnHS,Mathematics,1,1\nOakwood,Science,0,0\n"
        );
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(DASHBOARD_JSON)).unwrap())
                .unwrap();
        assert_eq!(json["summary"]["class_completion"]["pct"], 100.0);
        assert_eq!(json["tab"], "All");
    }

    #[test]
    fn export_writes_filtered_records() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        let ds = dataset();
        let sel = FilterSelection {
            school_name: Some("Oakwood".to_string()),
            ..FilterSelection::default()
        };
        let n = export_records(&ds, &sel, &out).unwrap();
        assert_eq!(n, 1);
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            text,
            "\"batch_or_school_name\",\"subject\",\"session_type\",\"chapter_status\",\"session_date\"\n\
             \"Oakwood\",\"Science\",\"Test\",\"Pending\",\"2024-04-10\"\n"
        );
    }
}
