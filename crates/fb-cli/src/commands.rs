//! Command implementations: resolve the project, run the core, print rows.

use std::path::Path;

use fb_core::{Config, Progress};
use fb_extract::ExtractorRegistry;
use fb_index::{full_index, run_update};
use fb_store::{ProjectRoot, Resolution, SearchHit, Store};

use crate::args::{Arguments, Command};
use crate::exit_status::ExitStatus;

pub fn run(args: Arguments) -> ExitStatus {
    let config = Config::from_env();
    let mut store = match Store::open_default() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("fubber: {e}");
            return ExitStatus::StoreFailure;
        }
    };

    match args.command {
        Command::Init { path } => init(&mut store, &path),
        Command::Index => index(&mut store, &config),
        Command::Update => update(&mut store, &config),
        Command::Search { query, limit, json } => search(&mut store, &config, &query, limit, json),
        Command::Projects { json } => projects(&store, json),
    }
}

fn init(store: &mut Store, path: &Path) -> ExitStatus {
    let absolute = match std::fs::canonicalize(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("fubber: cannot resolve {}: {e}", path.display());
            return ExitStatus::ResolutionFailure;
        }
    };
    let root = absolute.to_string_lossy().replace('\\', "/");
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.clone());

    let result = store.tx(|tx| tx.register_project(&root, &name, fb_core::now_epoch()));
    match result {
        Ok(()) => {
            println!("registered {root}");
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("fubber: {e}");
            ExitStatus::StoreFailure
        }
    }
}

fn index(store: &mut Store, config: &Config) -> ExitStatus {
    let project = match resolve_cwd(store) {
        Ok(project) => project,
        Err(status) => return status,
    };
    let registry = ExtractorRegistry::with_defaults();
    let mut progress = StderrProgress::default();
    match full_index(store, &project.project_root, config, &registry, &mut progress) {
        Ok(report) => {
            println!(
                "indexed {} files, {} entities in {:.2}s",
                report.files_indexed,
                report.entities_written,
                report.duration.as_secs_f64()
            );
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("fubber: {e}");
            ExitStatus::StoreFailure
        }
    }
}

fn update(store: &mut Store, config: &Config) -> ExitStatus {
    let project = match resolve_cwd(store) {
        Ok(project) => project,
        Err(status) => return status,
    };
    let registry = ExtractorRegistry::with_defaults();
    let mut progress = StderrProgress::default();
    match run_update(
        store,
        &project.project_root,
        config,
        &registry,
        &mut progress,
        true,
    ) {
        Ok(report) => {
            println!(
                "checked {} files: {} changed, {} deleted, {} new",
                report.files_checked,
                report.files_changed,
                report.files_deleted,
                report.files_added
            );
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("fubber: {e}");
            ExitStatus::StoreFailure
        }
    }
}

fn search(
    store: &mut Store,
    config: &Config,
    query: &str,
    limit: usize,
    json: bool,
) -> ExitStatus {
    let project = match resolve_cwd(store) {
        Ok(project) => project,
        Err(status) => return status,
    };
    auto_update(store, config, &project);

    let match_expr = match fb_query::rewrite_query(query) {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("fubber: {e}");
            return ExitStatus::ResolutionFailure;
        }
    };

    match store.search(&project.project_root, &match_expr, limit) {
        Ok(hits) => {
            for hit in &hits {
                print_hit(hit, json);
            }
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("fubber: {e}");
            ExitStatus::StoreFailure
        }
    }
}

fn projects(store: &Store, json: bool) -> ExitStatus {
    match store.projects() {
        Ok(projects) => {
            for project in &projects {
                if json {
                    match serde_json::to_string(project) {
                        Ok(line) => println!("{line}"),
                        Err(e) => eprintln!("fubber: {e}"),
                    }
                } else {
                    let indexed = project
                        .last_indexed
                        .map(|t| format!("indexed @{t}"))
                        .unwrap_or_else(|| "never indexed".to_string());
                    println!("{}\t{}\t{indexed}", project.project_root, project.project_name);
                }
            }
            ExitStatus::Success
        }
        Err(e) => {
            eprintln!("fubber: {e}");
            ExitStatus::StoreFailure
        }
    }
}

/// Resolve the working directory to a registered project, or explain how
/// to register one.
fn resolve_cwd(store: &mut Store) -> Result<ProjectRoot, ExitStatus> {
    let cwd = std::env::current_dir().map_err(|e| {
        eprintln!("fubber: cannot determine working directory: {e}");
        ExitStatus::ResolutionFailure
    })?;
    resolve_path(store, &cwd)
}

fn resolve_path(store: &mut Store, start: &Path) -> Result<ProjectRoot, ExitStatus> {
    match store.resolve_project(start, fb_core::now_epoch()) {
        Ok(Resolution::Found(project)) => Ok(project),
        Ok(Resolution::NotFound { candidates }) => {
            eprintln!("fubber: no registered project contains {}", start.display());
            for candidate in candidates {
                eprintln!("  candidate: fubber init {}", candidate.display());
            }
            Err(ExitStatus::ResolutionFailure)
        }
        Err(e) => {
            eprintln!("fubber: {e}");
            Err(ExitStatus::StoreFailure)
        }
    }
}

/// Throttled background refresh before queries; failures only warn.
fn auto_update(store: &mut Store, config: &Config, project: &ProjectRoot) {
    if !config.auto_update {
        return;
    }
    let registry = ExtractorRegistry::with_defaults();
    let mut progress = StderrProgress::default();
    if let Err(e) = run_update(
        store,
        &project.project_root,
        config,
        &registry,
        &mut progress,
        false,
    ) {
        tracing::warn!(error = %e, "auto-update failed");
    }
}

fn print_hit(hit: &SearchHit, json: bool) {
    if json {
        match serde_json::to_string(hit) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("fubber: {e}"),
        }
        return;
    }
    let mut qualified = String::new();
    for part in [&hit.namespace, &hit.enclosing, &hit.name] {
        if !part.is_empty() {
            if !qualified.is_empty() {
                qualified.push('.');
            }
            qualified.push_str(part);
        }
    }
    println!(
        "{}:{}-{}\t{}\t{}\t{}",
        hit.path, hit.line_start, hit.line_end, hit.kind, qualified, hit.snippet
    );
}

/// Plain line-based progress on stderr; the terminal layer proper (bars,
/// spinners, TTY detection) lives outside the core.
#[derive(Default)]
struct StderrProgress {
    total: usize,
}

impl Progress for StderrProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
    }

    fn advance(&mut self, completed: usize) {
        eprintln!("  {completed}/{} files", self.total);
    }

    fn finish(&mut self) {}
}
