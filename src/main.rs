// Entry point and CLI flow.
//
// Without `--interactive` the binary renders one dashboard view and writes
// its files. With it, a numbered menu lets the user switch region, view and
// category and re-render without reloading the CSV; cached tables are reused
// across renders.
use clap::Parser;
use comuna_report::cache::CachedSource;
use comuna_report::config::DashboardConfig;
use comuna_report::dashboard::{render, Dashboard, DashboardRequest};
use comuna_report::output;
use comuna_report::source::{parse_region_param, CsvSource, DataSource};
use comuna_report::types::{CategoryFilter, Temporality};
use comuna_report::util::format_int;
use comuna_report::ReportError;
use log::error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "comuna_report", about = "Crime statistics dashboard for Chilean comunas")]
struct Cli {
    /// Long-format incident CSV (category, region_id, year, period, count)
    #[arg(long, default_value = "delitos.csv")]
    data: PathBuf,

    /// Optional JSON dashboard configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comuna code; invalid or unknown codes fall back to the default region
    #[arg(long)]
    codcom: Option<String>,

    /// annual, monthly or weekly (Spanish names accepted)
    #[arg(long, default_value = "annual")]
    temporality: Temporality,

    /// Crime category, or "all"
    #[arg(long, default_value = "all")]
    category: String,

    /// Directory for the generated files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Numbered menu instead of a single render
    #[arg(long)]
    interactive: bool,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt(label: &str) -> String {
    print!("{}: ", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Write every file of one render and print the previews.
fn write_outputs(dashboard: &Dashboard, out_dir: &Path) -> Result<(), ReportError> {
    std::fs::create_dir_all(out_dir)?;
    let slug = dashboard.temporality.slug();

    let chart_path = out_dir.join(format!("chart_{}.json", slug));
    output::write_json(&chart_path, &dashboard.chart)?;

    let mut html = format!("<p>{}</p>", dashboard.narrative);
    if let Some(detail) = &dashboard.detail {
        html += detail;
    }
    html += &format!("<p><strong>Dato Clave:</strong> {}</p>", dashboard.key_fact);
    let narrative_path = out_dir.join(format!("narrative_{}.html", slug));
    output::write_text(&narrative_path, &html)?;

    let table_path = out_dir.join("annual_table.csv");
    output::write_annual_table(&table_path, &dashboard.tables.annual)?;
    output::write_csv(&out_dir.join("key_metrics.csv"), &dashboard.key_metrics)?;
    output::write_json(&out_dir.join("summary.json"), &dashboard.summary)?;

    println!(
        "\nAnálisis de Delincuencia en {} ({})",
        dashboard.region_name, dashboard.region_id
    );
    output::preview_cards("Métricas Clave", &dashboard.key_metrics);
    println!("{}\n", output::annual_preview(&dashboard.tables.annual, 5));
    println!("(Full table exported to {})", table_path.display());
    println!(
        "Chart: {}\nNarrative: {}\nSummary: {}\n",
        chart_path.display(),
        narrative_path.display(),
        out_dir.join("summary.json").display()
    );
    if dashboard.summary.skipped_records > 0 {
        println!(
            "Note: {} rows or records skipped due to parse/validation errors.\n",
            format_int(dashboard.summary.skipped_records)
        );
    }
    Ok(())
}

fn run_once<S: DataSource>(
    source: &S,
    request: &DashboardRequest,
    config: &DashboardConfig,
    out_dir: &Path,
) -> Result<(), ReportError> {
    let dashboard = render(source, request, config)?;
    write_outputs(&dashboard, out_dir)
}

fn run_interactive<S: DataSource>(
    source: &S,
    mut request: DashboardRequest,
    config: &DashboardConfig,
    out_dir: &Path,
) {
    loop {
        println!(
            "Comuna {} | Vista {} | Delito {}",
            request.region_id,
            request.temporality.label(),
            request.filter.display_name()
        );
        println!("[1] Change comuna");
        println!("[2] Change view (anual/mensual/semanal)");
        println!("[3] Change category");
        println!("[4] Generate dashboard");
        println!("[5] Exit\n");
        match read_choice().as_str() {
            "1" => {
                let raw = prompt("Comuna code");
                request.region_id = parse_region_param(Some(&raw), config.default_region);
            }
            "2" => match prompt("View").parse::<Temporality>() {
                Ok(t) => request.temporality = t,
                Err(e) => println!("{}\n", e),
            },
            "3" => {
                request.filter = CategoryFilter::parse(&prompt("Category (all for every category)"));
            }
            "4" => {
                if let Err(e) = run_once(source, &request, config, out_dir) {
                    eprintln!("Failed to render dashboard: {}\n", e);
                }
            }
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1 to 5.\n"),
        }
    }
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match DashboardConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!("failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => DashboardConfig::default(),
    };

    let source = match CsvSource::open(&cli.data, config.default_region) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to load {}: {}", cli.data.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let source = CachedSource::new(source, Duration::from_secs(config.cache_ttl_secs));

    let request = DashboardRequest {
        region_id: parse_region_param(cli.codcom.as_deref(), config.default_region),
        temporality: cli.temporality,
        filter: CategoryFilter::parse(&cli.category),
    };

    if cli.interactive {
        run_interactive(&source, request, &config, &cli.out_dir);
        return ExitCode::SUCCESS;
    }

    match run_once(&source, &request, &config, &cli.out_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
