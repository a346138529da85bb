use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use survey_report::chart::format_count;
use survey_report::report::html::{self, HtmlOptions};
use survey_report::serve::{start_report_server, ServeContext};
use survey_report::{Config, Locale, Report, ReportOptions, SurveyDocument};

#[derive(Parser, Debug)]
#[command(name = "survey-report")]
#[command(author, version, about = "Survey analysis reports with charts and a scroll-following contents panel")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: nearest .survey-report/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Language of headings and placeholders
    #[arg(long, global = true, value_enum)]
    locale: Option<Locale>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a self-contained HTML report
    Render {
        /// Survey analysis JSON
        input: PathBuf,

        /// Output file, `-` for stdout (default: <INPUT stem>-report.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read the report in the terminal
    View {
        /// Survey analysis JSON
        input: PathBuf,
    },

    /// Serve the report over HTTP, re-reading the input on every request
    Serve {
        /// Survey analysis JSON
        input: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// List section anchors and their contents labels
    Toc {
        /// Survey analysis JSON
        input: PathBuf,
    },

    /// Print the shaped chart data of every question
    Charts {
        /// Survey analysis JSON
        input: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(locale) = cli.locale {
        config.report.locale = locale;
    }

    match cli.command {
        Command::Render { input, output } => {
            let report = assemble(&input, &config)?;
            let options = HtmlOptions::from_config(&config);

            match output {
                Some(path) if path.as_os_str() == "-" => {
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    html::write(&mut out, &report, &options)?;
                    out.flush()?;
                }
                output => {
                    let path = output.unwrap_or_else(|| default_output(&input));
                    let mut file = io::BufWriter::new(std::fs::File::create(&path)?);
                    html::write(&mut file, &report, &options)?;
                    file.flush()?;
                    println!(
                        "{} {} ({} questions, {} interviews)",
                        "Wrote".green(),
                        path.display(),
                        report.questions.len(),
                        report.interviews.len()
                    );
                }
            }
        }

        Command::View { input } => {
            survey_report::tui::run(input, config)?;
        }

        Command::Serve { input, port } => {
            start_report_server(ServeContext { input, config }, port)?;
        }

        Command::Toc { input } => {
            let report = assemble(&input, &config)?;
            for entry in &report.toc {
                let indent = "  ".repeat(usize::from(entry.depth));
                println!("{}{:<16} {}", indent, entry.id.cyan(), entry.label);
            }
        }

        Command::Charts { input, json } => {
            let report = assemble(&input, &config)?;
            if json {
                let charts: Vec<serde_json::Value> = report
                    .questions
                    .iter()
                    .map(|q| {
                        serde_json::json!({
                            "id": q.id,
                            "question": q.question,
                            "chart": q.chart,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&charts)?);
            } else {
                print_charts(&report);
            }
        }

        Command::Completion { shell } => {
            generate(shell, &mut Cli::command(), "survey-report", &mut io::stdout());
        }
    }

    Ok(())
}

fn assemble(input: &Path, config: &Config) -> survey_report::Result<Report> {
    let doc = SurveyDocument::load(input)?;
    Ok(Report::assemble(&doc, &ReportOptions::from_config(config)))
}

/// `data/survey.json` → `data/survey-report.html`
fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "survey".to_string());
    input.with_file_name(format!("{}-report.html", stem))
}

fn print_charts(report: &Report) {
    for question in &report.questions {
        let chart = &question.chart;
        println!(
            "{} {} [{}]",
            question.id.cyan(),
            question.question.bold(),
            chart.chart_type.as_str()
        );
        if chart.is_empty() {
            println!("  {}", "(no answers)".dimmed());
        }
        for record in &chart.records {
            println!(
                "  {:<24} {:>8} {:>7}",
                record.name,
                format_count(record.value),
                chart.percentage_label(record.value)
            );
        }
    }
}
