//! Command dispatch and report rendering

use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::to_json;
use crate::application::{resolve, run_pipeline, ApplicationError, Snapshot};
use crate::cli::args::{Cli, Commands, ConfigCommands, TreeChoice};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{Dataset, FilterDiagnostics, Schema, TreeArena};
use crate::infrastructure::ServiceContainer;
use crate::util::path::expand_path;

/// Execute the parsed command line.
pub fn execute(cli: Cli) -> CliResult<()> {
    let Some(command) = cli.command else {
        return Err(CliError::Usage(
            "no command given, see `shortlist --help`".into(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "shortlist", &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(command, cli.config.as_deref()),
        Commands::Run {
            data,
            tree,
            top,
            json,
            export,
        } => {
            let container = load_container(cli.config.as_deref())?;
            let top = match top {
                Some(0) => return Err(CliError::InvalidArgs("--top must be at least 1".into())),
                Some(n) => n,
                None => container.settings.display.top,
            };
            cmd_run(&container, &data, tree, top, json, export.as_deref())
        }
        Commands::Columns { data } => {
            let container = load_container(cli.config.as_deref())?;
            cmd_columns(&container, &data)
        }
        Commands::Diagnose { data, sample } => {
            let container = load_container(cli.config.as_deref())?;
            cmd_diagnose(&container, &data, sample)
        }
    }
}

fn load_container(config: Option<&Path>) -> CliResult<ServiceContainer> {
    let settings = Settings::load(config)?;
    Ok(ServiceContainer::new(settings))
}

fn load_dataset(container: &ServiceContainer, data: &Path) -> CliResult<Dataset> {
    let path = expand_path(data);
    Ok(container.datasets.load(&path)?)
}

#[instrument(level = "debug", skip(container))]
fn cmd_run(
    container: &ServiceContainer,
    data: &Path,
    tree: TreeChoice,
    top: usize,
    json: bool,
    export: Option<&Path>,
) -> CliResult<()> {
    let dataset = load_dataset(container, data)?;
    let settings = &container.settings;
    let snapshot = run_pipeline(&dataset, &settings.engine, &settings.tree)?;

    if let Some(path) = export {
        let path = expand_path(path);
        container.export.write_json(&snapshot, &path)?;
        if !json {
            output::success(&format!("exported snapshot to {}", path.display()));
        }
    }

    if json {
        let text = to_json(&snapshot).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize snapshot".into(),
            source: Box::new(e),
        })?;
        print!("{}", text);
        return Ok(());
    }

    print_report(&snapshot, &dataset, tree, top);
    Ok(())
}

fn print_report(snapshot: &Snapshot, dataset: &Dataset, tree: TreeChoice, top: usize) {
    for dropped in &snapshot.effective.dropped {
        output::dropped(&dropped.section, &dropped.reference, &dropped.reason);
    }

    output::header(&format!(
        "{} of {} options pass the constraints",
        snapshot.filtered_records, snapshot.total_records
    ));

    if let Some(diagnostics) = &snapshot.diagnostics {
        print_diagnostics(diagnostics, dataset);
        return;
    }

    let label = snapshot.label_column.as_deref();
    output::header(&format!("Top {}", top.min(snapshot.scored.len())));
    for (rank, record) in snapshot.top(top).into_iter().enumerate() {
        output::ranked(
            rank + 1,
            &record.record.label(label, record.index),
            record.score,
            record.top_factor.as_deref(),
        );
    }

    if tree.exploration() {
        print_tree("Exploration tree (by score)", &snapshot.exploration_display);
    }
    if tree.regression() {
        print_tree("Regression tree (what drives the score)", &snapshot.regression_display);
    }
}

fn print_tree(title: &str, tree: &TreeArena) {
    output::header(title);
    match tree.to_termtree() {
        Some(rendered) => output::plain(&rendered),
        None => output::detail("(empty)"),
    }
}

fn print_diagnostics(diagnostics: &FilterDiagnostics, dataset: &Dataset) {
    output::header(&format!(
        "Filter diagnostics: {} of {} pass",
        diagnostics.passed, diagnostics.total
    ));
    for column in &diagnostics.columns {
        output::failure_counts(&column.column, column.failures, column.first_failures);
    }
    if let Some(worst) = diagnostics.most_restrictive() {
        output::warning(&format!(
            "'{}' removes the most options ({} of {})",
            worst.column, worst.failures, diagnostics.total
        ));
    }
    let label = dataset.label_column();
    for sample in &diagnostics.samples {
        let name = dataset
            .records()
            .get(sample.index)
            .map(|r| r.label(label, sample.index))
            .unwrap_or_else(|| format!("#{}", sample.index));
        output::rejected(&name, &sample.column);
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_columns(container: &ServiceContainer, data: &Path) -> CliResult<()> {
    let dataset = load_dataset(container, data)?;
    let settings = &container.settings;
    let schema = Schema::classify(&dataset);
    let effective = resolve(&dataset, &schema, &settings.engine, &settings.tree)?;
    let label = dataset.label_column();

    output::header(&format!("{} columns", schema.len()));
    for column in schema.iter() {
        let name = column.name.as_str();
        let mut roles = Vec::new();
        if label == Some(name) {
            roles.push("label");
        }
        if effective.is_ignored(name) {
            roles.push("ignored");
        }
        if effective.constraints.evaluated().iter().any(|c| c == name) {
            roles.push("constrained");
        }
        if effective.is_tradeoff(name) {
            roles.push("tradeoff");
        }
        if effective.is_feature(name) {
            roles.push("feature");
        }
        output::column(name, &column.kind, &roles);
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_diagnose(container: &ServiceContainer, data: &Path, sample: usize) -> CliResult<()> {
    let dataset = load_dataset(container, data)?;
    let settings = &container.settings;
    let schema = Schema::classify(&dataset);
    let effective = resolve(&dataset, &schema, &settings.engine, &settings.tree)?;

    let diagnostics = effective
        .constraints
        .failure_breakdown(dataset.records(), sample);
    debug!(passed = diagnostics.passed, total = diagnostics.total, "diagnosed");
    print_diagnostics(&diagnostics, &dataset);
    Ok(())
}

fn cmd_config(command: ConfigCommands, local: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(local)?;
            print!("{}", settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::plain(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
        ConfigCommands::Template => print!("{}", Settings::template()),
    }
    Ok(())
}
