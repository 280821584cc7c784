mod browse;
mod logic;
mod scenario;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;
use zafago_store::{ParseSortKeyError, SortKey, Storefront};

use browse::{BrowseRequest, browse};
use logic::{LogicTester, ScenarioResult};
use scenario::{get_scenario, list_scenarios};
use util::{parse_seeds, split_csv};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TestMode {
    /// Run QA scenarios against the embedded store
    Scenarios,
    /// Render one listing in the terminal
    Browse,
}

#[derive(Debug, Parser)]
#[command(name = "zafago-tester", version = "0.1.0")]
#[command(about = "Scenario QA and terminal browsing for the Zafago storefront core")]
struct Args {
    /// What to do: run scenarios or browse a listing
    #[arg(long, value_enum, default_value_t = TestMode::Scenarios)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    // Browse-specific options
    /// Search text matched against title, developer and publisher
    #[arg(long)]
    search: Option<String>,

    /// Location query string carrying category/platform (e.g. "category=RPG")
    #[arg(long)]
    location: Option<String>,

    /// Platforms to toggle on (comma-separated, exact names)
    #[arg(long)]
    platforms: Option<String>,

    /// Genres to toggle on (comma-separated, exact names)
    #[arg(long)]
    genres: Option<String>,

    /// Price ceiling in dollars
    #[arg(long)]
    max_price: Option<String>,

    /// Sort order (featured, price-asc, price-desc, name-asc, name-desc, rating, newest)
    #[arg(long, value_parser = parse_sort_key)]
    sort: Option<SortKey>,
}

fn parse_sort_key(raw: &str) -> Result<SortKey, ParseSortKeyError> {
    raw.parse()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let store = Storefront::embedded().context("failed to open the embedded storefront")?;

    match args.mode {
        TestMode::Browse => run_browse(&args, &store),
        TestMode::Scenarios => {
            announce_banner();
            let start_time = Instant::now();
            let scenarios = expand_scenarios(&args.scenarios);
            let seeds = parse_seeds(&args.seeds)?;
            let results = run_scenarios(&args, &scenarios, &seeds, &store);
            write_reports(&args, &results, start_time)?;
            if results.iter().any(|r| !r.passed) {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🛒 Zafago Storefront Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    store: &Storefront,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(store, args.verbose);
    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn run_browse(args: &Args, store: &Storefront) -> Result<()> {
    let request = BrowseRequest {
        search: args.search.clone(),
        location: args.location.clone(),
        platforms: args.platforms.clone(),
        genres: args.genres.clone(),
        max_price: args.max_price.clone(),
        sort: args.sort,
    };
    let mut output_target = OutputTarget::new(args.output.clone())?;
    browse(output_target.writer(), store, &request)?;
    output_target.flush_inner()?;
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Zafago Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            let duration = start_time.elapsed();
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            mode: TestMode::Scenarios,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            search: None,
            location: None,
            platforms: None,
            genres: None,
            max_price: None,
            sort: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "zafago-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("all,smoke");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert!(expanded.contains(&"checkout-flow".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("cart,smoke");
        assert_eq!(expanded, vec!["cart".to_string(), "smoke".to_string()]);
    }

    #[test]
    fn run_scenarios_skips_unknown_names() {
        let store = Storefront::embedded().unwrap();
        let args = base_args();
        let results = run_scenarios(
            &args,
            &["smoke".to_string(), "nope".to_string()],
            &[1, 2],
            &store,
        );
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("[]"));
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_path("results.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("\"scenario_name\": \"Smoke Test\""));
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("_No scenarios executed._"));
    }

    #[test]
    fn write_reports_console_lists_failures() {
        let temp = temp_path("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("failure"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("filter-properties"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn run_browse_writes_listing() {
        let store = Storefront::embedded().unwrap();
        let temp = temp_path("browse.txt");
        let args = Args {
            mode: TestMode::Browse,
            location: Some("category=Fantasy".to_string()),
            sort: Some(SortKey::NameAsc),
            output: Some(temp.clone()),
            ..base_args()
        };
        run_browse(&args, &store).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Showing 2 games"));
        let hogwarts = content.find("Hogwarts Legacy").unwrap();
        let skyrim = content.find("The Elder Scrolls V").unwrap();
        assert!(hogwarts < skyrim);
    }

    #[test]
    fn sort_flag_accepts_ids() {
        assert_eq!(parse_sort_key("price-desc").unwrap(), SortKey::PriceDesc);
        assert!(parse_sort_key("cheapest").is_err());
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
    }
}
