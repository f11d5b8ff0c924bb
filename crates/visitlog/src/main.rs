//! `visitlog` - CLI for the visitor register
//!
//! This binary provides the command-line interface for registering visitors
//! and working with the stored log.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::Parser;

use visitlog::cli::{
    ClearCommand, Cli, Command, ConfigCommand, ExportCommand, ListCommand, OutputFormat,
    RegisterCommand, SortArg,
};
use visitlog::export::export_csv;
use visitlog::query::relative_time;
use visitlog::storage::{AnyBackend, KeyValueBackend};
use visitlog::{
    init_logging, registration_notice, ClearConfirmation, Config, CsvExport, Error,
    PersistentStore, QueryView, RegistrationForm, Visitor, VisitorStore,
};

/// Exit code for rejected form input.
const EXIT_INVALID_INPUT: u8 = 2;

type Store = VisitorStore<AnyBackend>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Register(cmd) => handle_register(&config, cmd),
        Command::List(cmd) => handle_list(&config, &cmd).map(|()| ExitCode::SUCCESS),
        Command::Export(cmd) => handle_export(&config, cmd).map(|()| ExitCode::SUCCESS),
        Command::Clear(cmd) => handle_clear(&config, &cmd).map(|()| ExitCode::SUCCESS),
        Command::Status(cmd) => handle_status(&config, cmd.json).map(|()| ExitCode::SUCCESS),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> Store {
    let persistent = PersistentStore::open_or_degrade(config.database_path());
    VisitorStore::load(persistent, config.storage.key.clone())
}

fn query_view(config: &Config, search: Option<String>, sort: Option<SortArg>) -> QueryView {
    QueryView::new(
        search.unwrap_or_default(),
        sort.map_or(config.list.default_sort, Into::into),
    )
}

fn handle_register(config: &Config, cmd: RegisterCommand) -> anyhow::Result<ExitCode> {
    let mut store = open_store(config);

    let mut form = match config.form.default_purpose {
        Some(purpose) => RegistrationForm::with_default_purpose(purpose),
        None => RegistrationForm::new(),
    };
    form.name = cmd.name.unwrap_or_default();
    form.flat_number = cmd.flat.unwrap_or_default();
    if cmd.purpose.is_some() {
        form.purpose = cmd.purpose;
    }
    form.mobile = cmd.mobile.unwrap_or_default();

    match form.submit(&mut store) {
        Ok(visitor) => {
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&visitor)?);
            } else {
                println!("Visitor Registered Successfully");
                println!("{}", registration_notice(&visitor));
            }
            if store.persistent().is_degraded() {
                eprintln!("Warning: storage is unavailable; this record will not be kept.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(Error::Validation(errors)) => {
            eprintln!("Registration failed:");
            for error in &errors {
                eprintln!("  {}: {}", error.field, error.message);
            }
            Ok(ExitCode::from(EXIT_INVALID_INPUT))
        }
        Err(e) => Err(e).context("registering visitor"),
    }
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let store = open_store(config);
    let view = query_view(config, cmd.search.clone(), cmd.sort);
    let visitors = view.project(store.records());

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&visitors)?);
        }
        OutputFormat::Plain | OutputFormat::Table if visitors.is_empty() => {
            println!("No visitor records found");
        }
        OutputFormat::Plain => {
            println!(
                "Visitor Log ({} of {}, {})",
                visitors.len(),
                store.len(),
                view.sort_order.label()
            );
            let now = Utc::now();
            for visitor in &visitors {
                print_plain(visitor, now);
            }
        }
        OutputFormat::Table => print_table(&visitors),
    }
    Ok(())
}

fn print_plain(visitor: &Visitor, now: chrono::DateTime<Utc>) {
    println!();
    println!("{}  [{}]", visitor.name(), visitor.purpose());
    println!("  Flat:   {}", visitor.flat_number());
    println!("  Mobile: {}", visitor.mobile());
    println!("  {}", relative_time(visitor.timestamp(), now));
}

fn print_table(visitors: &[&Visitor]) {
    let headers = ["NAME", "FLAT", "PURPOSE", "MOBILE", "REGISTERED"];
    let rows: Vec<[String; 5]> = visitors
        .iter()
        .map(|v| {
            [
                v.name().to_string(),
                v.flat_number().to_string(),
                v.purpose().to_string(),
                v.mobile().to_string(),
                v.timestamp()
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(&headers).trim_end());
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", line(&cells).trim_end());
    }
}

fn handle_export(config: &Config, cmd: ExportCommand) -> anyhow::Result<()> {
    let store = open_store(config);
    let view = query_view(config, cmd.search, cmd.sort);
    let visitors = view.project(store.records());

    let export = export_csv(&visitors, Local::now().date_naive(), &Local);
    let target = if cmd.stdout {
        ExportTarget::Stdout
    } else {
        ExportTarget::Dir(cmd.output_dir.unwrap_or_else(|| config.export_dir()))
    };

    emit_export(
        export.as_ref(),
        &target,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )
}

/// Where an export goes.
#[derive(Debug)]
enum ExportTarget {
    Stdout,
    Dir(PathBuf),
}

/// Write `export` to `target`. Notices go to `err` so piped CSV stays clean.
fn emit_export(
    export: Option<&CsvExport>,
    target: &ExportTarget,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<()> {
    let Some(export) = export else {
        writeln!(err, "No visitor records to export.")?;
        return Ok(());
    };

    match target {
        ExportTarget::Stdout => writeln!(out, "{}", export.contents)?,
        ExportTarget::Dir(dir) => {
            let path = export
                .write_to(dir)
                .with_context(|| format!("writing export to {}", dir.display()))?;
            writeln!(out, "Exported {} records to {}", export.rows, path.display())?;
        }
    }
    Ok(())
}

fn handle_clear(config: &Config, cmd: &ClearCommand) -> anyhow::Result<()> {
    let mut store = open_store(config);

    if store.is_empty() {
        println!("No visitor records to clear.");
        return Ok(());
    }

    let confirmation = if cmd.yes {
        Some(ClearConfirmation::affirm())
    } else {
        prompt_clear_confirmation(store.len())?
    };

    let Some(confirmation) = confirmation else {
        println!("Cancelled. No records were removed.");
        return Ok(());
    };

    let removed = store.clear_all(confirmation);
    println!("All Records Cleared");
    println!("{removed} visitor records have been permanently removed.");
    Ok(())
}

fn prompt_clear_confirmation(count: usize) -> anyhow::Result<Option<ClearConfirmation>> {
    print!(
        "Are you sure you want to clear all {count} visitor records? \
         This action cannot be undone. [y/N] "
    );
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("reading confirmation")?;
    Ok(ClearConfirmation::from_answer(&answer))
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config);
    let stats = store.stats();
    let persistent = store.persistent();

    let last_saved = match persistent.backend() {
        AnyBackend::Sqlite(db) => db
            .updated_at(store.key())
            .context("reading last save time")?,
        AnyBackend::Memory(_) => None,
    };

    if json {
        let status = serde_json::json!({
            "storage": persistent.backend().describe(),
            "persistent": !persistent.is_degraded(),
            "database_path": config.database_path(),
            "key": store.key(),
            "last_saved": last_saved,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("visitlog status");
    println!("---------------");
    println!("Storage:       {}", persistent.backend().describe());
    println!("Key:           {}", store.key());
    println!("Visitors:      {}", stats.total);
    for (purpose, count) in &stats.by_purpose {
        println!("  {:<12} {count}", format!("{purpose}:"));
    }
    let fmt_time = |t: Option<chrono::DateTime<Utc>>| {
        t.map_or_else(
            || "-".to_string(),
            |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        )
    };
    println!("Oldest:        {}", fmt_time(stats.oldest));
    println!("Newest:        {}", fmt_time(stats.newest));
    println!("Last saved:    {}", fmt_time(last_saved));
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:    {}", config.database_path().display());
                println!("  Key:              {}", config.storage.key);
                println!();
                println!("[List]");
                println!("  Default sort:     {}", config.list.default_sort.label());
                println!();
                println!("[Export]");
                println!("  Output directory: {}", config.export_dir().display());
                println!();
                println!("[Form]");
                println!(
                    "  Default purpose:  {}",
                    config
                        .form
                        .default_purpose
                        .map_or_else(|| "(none)".to_string(), |p| p.to_string())
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            if !report_config_validation(&path, &mut std::io::stdout().lock())? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Load the configuration at `path` and report the outcome to `out`.
///
/// Returns whether the configuration is valid.
fn report_config_validation(path: &Path, out: &mut impl Write) -> std::io::Result<bool> {
    writeln!(out, "Validating configuration: {}", path.display())?;
    match Config::load_from(Some(path.to_path_buf())) {
        Ok(_) => {
            writeln!(out, "Configuration is valid.")?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "Configuration error: {e}")?;
            Ok(false)
        }
    }
}
