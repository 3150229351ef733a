use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use diffnote_core::{DiffnoteConfig, Finding, OutputFormat, Severity};
use diffnote_difflens::parser::{parse_commit_diffs, split_git_patch, FileDiff};
use diffnote_review::gitlab::GitLabClient;
use diffnote_review::local::LocalStore;
use diffnote_review::pipeline::{annotate, AnnotateOutcome};

#[derive(Parser)]
#[command(
    name = "diffnote",
    version,
    about = "Post static-analysis findings onto the lines a commit changed",
    long_about = "diffnote annotates a single commit with static-analysis findings, restricted to\n\
                   the lines the commit actually changed. Findings already posted are skipped,\n\
                   a severity summary is added, and a pass/fail commit status gates the build.\n\n\
                   Examples:\n  \
                     diffnote annotate --findings issues.json --commit $CI_COMMIT_SHA\n  \
                     git show --format= HEAD > c.patch && diffnote annotate --findings issues.json --diff-file c.patch\n  \
                     git diff main | diffnote ranges\n  \
                     diffnote init"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .diffnote.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summaries (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable debug logging (overridden by DIFFNOTE_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate a commit with findings
    #[command(long_about = "Annotate a commit with findings.\n\n\
        Reads findings as a JSON array of {message, severity, filePath, line}, keeps the ones\n\
        on changed lines, posts them as commit comments with a summary, and sets the commit\n\
        status. With --diff-file nothing is sent: the diff is read from the patch and every\n\
        write is printed instead.\n\n\
        Examples:\n  diffnote annotate --findings issues.json --commit 3f2a9c1 --project group/app\n  diffnote annotate --findings - --diff-file c.patch --fail-on critical")]
    Annotate {
        /// Findings JSON file, or '-' for stdin
        #[arg(long)]
        findings: PathBuf,
        /// Commit SHA to annotate
        #[arg(long)]
        commit: Option<String>,
        /// Project id or namespace/name (overrides gitlab.project)
        #[arg(long)]
        project: Option<String>,
        /// GitLab base URL (overrides gitlab.url)
        #[arg(long)]
        gitlab_url: Option<String>,
        /// Read the commit diff from a patch file and print writes instead of sending them
        #[arg(long)]
        diff_file: Option<PathBuf>,
        /// Do not report a commit status
        #[arg(long)]
        no_gate: bool,
        /// Lowest severity that fails the commit status
        #[arg(long)]
        gate_threshold: Option<Severity>,
        /// Do not post the summary comment
        #[arg(long)]
        no_summary: bool,
        /// Exit with non-zero code if findings meet severity threshold
        #[arg(
            long,
            long_help = "Exit with non-zero code if findings on changed lines reach this severity.\n\n\
                Severity ranking: blocker > critical > major > minor > info.\n\
                Independent of the commit status; useful when the status is not enforced."
        )]
        fail_on: Option<Severity>,
    },
    /// Print the changed line ranges of a patch
    #[command(long_about = "Print the changed new-file line ranges of a patch.\n\n\
        Reads a unified diff from stdin or a file. Deleted files are omitted.\n\n\
        Examples:\n  git diff | diffnote ranges\n  diffnote ranges --file changes.patch --format json")]
    Ranges {
        /// Read diff from file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Create a default .diffnote.toml configuration file
    #[command(long_about = "Create a default .diffnote.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .diffnote.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# diffnote configuration

[gitlab]
# url = "https://gitlab.com"
# token_type = "access"      # "access" (bearer) or "private" (PRIVATE-TOKEN header)
# project = "group/app"      # numeric id or namespace/name
# token is read from GITLAB_TOKEN when not set here

[review]
# gate_enabled = true
# gate_threshold = "critical"  # info, minor, major, critical, blocker
# summary_enabled = true
# analyzer_name = "SonarQube"
# status_name = "SonarQube"
# max_concurrent_posts = 1
"#;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("DIFFNOTE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DiffnoteConfig> {
    match path {
        Some(path) => DiffnoteConfig::from_file(path)
            .into_diagnostic()
            .wrap_err(format!("loading {}", path.display())),
        None => {
            let default_path = Path::new(".diffnote.toml");
            if default_path.exists() {
                DiffnoteConfig::from_file(default_path)
                    .into_diagnostic()
                    .wrap_err("loading .diffnote.toml")
            } else {
                Ok(DiffnoteConfig::default())
            }
        }
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

fn read_findings(path: &Path) -> Result<Vec<Finding>> {
    let input = read_input(Some(path))?;
    serde_json::from_str(&input)
        .into_diagnostic()
        .wrap_err("findings must be a JSON array of {message, severity, filePath, line}")
}

fn print_outcome(outcome: &AnnotateOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(outcome).into_diagnostic()?
            );
        }
        OutputFormat::Text => print!("{outcome}"),
    }
    Ok(())
}

fn print_ranges(diffs: &[FileDiff], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(diffs).into_diagnostic()?);
        }
        OutputFormat::Text => {
            if diffs.is_empty() {
                println!("No changed files.");
            }
            for diff in diffs {
                let ranges: Vec<String> = diff
                    .ranges
                    .iter()
                    .filter(|r| !r.is_empty())
                    .map(ToString::to_string)
                    .collect();
                if ranges.is_empty() {
                    println!("{}: (no added or changed lines)", diff.path);
                } else {
                    println!("{}: {}", diff.path, ranges.join(", "));
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Annotate {
            ref findings,
            ref commit,
            ref project,
            ref gitlab_url,
            ref diff_file,
            no_gate,
            gate_threshold,
            no_summary,
            fail_on,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if no_gate {
                config.review.gate_enabled = false;
            }
            if let Some(threshold) = gate_threshold {
                config.review.gate_threshold = threshold;
            }
            if no_summary {
                config.review.summary_enabled = false;
            }
            if let Some(url) = gitlab_url {
                config.gitlab.url = url.clone();
            }

            let findings = read_findings(findings)?;

            let outcome = match diff_file {
                Some(path) => {
                    let store = LocalStore::from_file(path).into_diagnostic()?;
                    let project = project
                        .clone()
                        .or_else(|| config.gitlab.project.clone())
                        .unwrap_or_else(|| "local".into());
                    let commit = commit.clone().unwrap_or_else(|| "local".into());

                    let result = annotate(&store, &findings, &project, &commit, &config.review).await;
                    for write in store.into_writes() {
                        eprintln!("[dry-run] {write}");
                    }
                    result.into_diagnostic()?
                }
                None => {
                    let Some(commit) = commit else {
                        miette::bail!(miette::miette!(
                            help = "Pass --commit <sha>, e.g. --commit $CI_COMMIT_SHA",
                            "No commit to annotate"
                        ));
                    };
                    let Some(project) = project.clone().or_else(|| config.gitlab.project.clone())
                    else {
                        miette::bail!(miette::miette!(
                            help = "Pass --project or set project under [gitlab] in .diffnote.toml",
                            "No GitLab project configured"
                        ));
                    };
                    let client = GitLabClient::new(&config.gitlab).into_diagnostic()?;
                    annotate(&client, &findings, &project, commit, &config.review)
                        .await
                        .into_diagnostic()?
                }
            };

            print_outcome(&outcome, cli.format)?;

            if let Some(threshold) = fail_on {
                let has_findings = outcome
                    .issues
                    .iter()
                    .any(|i| i.finding.severity.meets_threshold(threshold));
                if has_findings {
                    std::process::exit(1);
                }
            }
        }
        Command::Ranges { ref file } => {
            let input = read_input(file.as_deref())?;
            if input.trim().is_empty() {
                miette::bail!(miette::miette!(
                    help = "Pipe a diff to diffnote, e.g.: git diff main | diffnote ranges\n       Or use --file <path>",
                    "Empty diff input"
                ));
            }
            let entries = split_git_patch(&input).into_diagnostic()?;
            let diffs = parse_commit_diffs(&entries).into_diagnostic()?;
            print_ranges(&diffs, cli.format)?;
        }
        Command::Init => {
            let path = Path::new(".diffnote.toml");
            if path.exists() {
                miette::bail!(".diffnote.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .diffnote.toml with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "diffnote", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_template_parses() {
        let config = DiffnoteConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert!(config.review.gate_enabled);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
