use anyhow::{bail, Context};
use clap::Parser;
use std::path::Path;
use tracing::{debug, info};

mod app;
mod auth;
mod cli;
mod config;
mod errors;
mod export;
mod generate;
mod library;
mod log;
mod plan;
mod prompt;
mod provider;
mod store;
mod ux;
mod wire;
mod wizard;

use app::{App, AppView, Notice};
use auth::LocalAuth;
use provider::DynProvider;
use store::SqliteStore;
use ux::ResultsTab;
use wizard::{NextOutcome, WizardStep};

struct Session {
    cfg: config::Config,
    provider: DynProvider,
    store: SqliteStore,
    auth: LocalAuth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    log::init_tracing(args.debug);
    if args.library {
        ux::print_library(library::library());
        return Ok(());
    }

    let cfg = config::Config::load(&args)?;
    cfg.ensure_data_dir()?;
    info!(provider = ?cfg.provider, data_dir = %cfg.data_dir.display(), "starting");

    let session = Session {
        provider: provider::make_provider(&cfg)?,
        store: SqliteStore::open(&cfg.store_path())?,
        auth: LocalAuth::new(cfg.session_path(), &cfg.profile_name, &cfg.profile_email),
        cfg,
    };

    let auth_log = session
        .auth
        .subscribe(|user| debug!(user = ?user.map(|u| u.email.as_str()), "auth state"));
    let mut app = App::new();
    app.set_user(session.auth.current_user());

    let outcome = match &args.params {
        Some(path) => run_batch(&mut app, &session, Path::new(path), args.save, args.export.as_deref()).await,
        None => {
            if args.history {
                open_history(&mut app, &session);
            }
            run_interactive(&mut app, &session).await
        }
    };
    auth_log.unsubscribe();
    outcome
}

/// Drives one generation from the review step to Results (or back to the
/// wizard on failure). Ctrl-C abandons it.
async fn run_generation(app: &mut App, session: &Session) {
    let (ticket, params) = match app.begin_generation() {
        Ok(started) => started,
        Err(e) => {
            ux::show_error(&e.to_string());
            return;
        }
    };
    let opts = generate::GenerateOptions::from_config(&session.cfg);
    let pb = ux::spinner(format!("Generating your {}-day campaign for {}...", params.campaign_length.days(), params.app_name));
    let outcome = tokio::select! {
        r = generate::generate(&params, session.provider.as_ref(), &opts) => Some(r),
        _ = tokio::signal::ctrl_c() => None,
    };
    pb.finish_and_clear();
    match outcome {
        Some(result) => {
            app.finish_generation(ticket, result);
        }
        None => app.cancel_generation(),
    }
}

async fn run_batch(
    app: &mut App,
    session: &Session,
    params_path: &Path,
    save: bool,
    export_dir: Option<&str>,
) -> anyhow::Result<()> {
    let params = config::load_params(params_path)?;
    app.start_wizard();
    app.wizard.load(params);
    loop {
        match app.wizard.next() {
            NextOutcome::Advanced(_) => continue,
            NextOutcome::ReadyToGenerate => break,
            NextOutcome::Invalid => {
                for (field, msg) in app.wizard.errors() {
                    ux::show_error(&format!("{}: {}", field.key(), msg));
                }
                return Err(errors::IndieMarkError::InvalidParameters(params_path.display().to_string()).into());
            }
        }
    }

    run_generation(app, session).await;
    if app.view() != AppView::Results {
        let message = match app.take_notice() {
            Some(Notice::Error(m)) | Some(Notice::Info(m)) => m,
            None => "generation did not complete".to_string(),
        };
        bail!(message);
    }
    let record = app.record().cloned().context("generation produced no record")?;
    ux::print_dashboard(&record);

    if save {
        if app.user().is_none() {
            app.set_user(Some(session.auth.sign_in()?));
        }
        app.save_current(&session.store)?;
    }
    if let Some(dir) = export_dir {
        let record = app.record().cloned().context("no campaign to export")?;
        let summary = export::export_campaign(&record, Path::new(dir))?;
        ux::print_export_dashboard(&summary);
    }
    if let Some(n) = app.take_notice() {
        ux::show_notice(&n);
    }
    Ok(())
}

fn toggle_sign_in(app: &mut App, session: &Session) {
    let result = if app.user().is_some() {
        session.auth.sign_out().map(|_| None)
    } else {
        session.auth.sign_in().map(Some)
    };
    match result {
        Ok(user) => app.set_user(user),
        Err(e) => ux::show_error(&format!("{e:#}")),
    }
}

fn open_history(app: &mut App, session: &Session) {
    if app.user().is_none() {
        match session.auth.sign_in() {
            Ok(user) => app.set_user(Some(user)),
            Err(e) => {
                ux::show_error(&format!("{e:#}"));
                return;
            }
        }
    }
    if let Err(e) = app.load_history(&session.store) {
        ux::show_error(&e.to_string());
    }
}

/// Splits "o 3" / "d3" into the command letter and a zero-based index.
fn command_with_index(input: &str) -> Option<(char, usize)> {
    let mut chars = input.chars();
    let cmd = chars.next()?.to_ascii_lowercase();
    let n: usize = chars.as_str().trim().parse().ok()?;
    n.checked_sub(1).map(|i| (cmd, i))
}

async fn run_interactive(app: &mut App, session: &Session) -> anyhow::Result<()> {
    let mut tab = ResultsTab::Images;
    loop {
        if let Some(n) = app.take_notice() {
            ux::show_notice(&n);
        }
        match app.view() {
            AppView::Landing => {
                ux::show_landing(app.user());
                match ux::read_line("> ").as_deref() {
                    None | Some("q") => return Ok(()),
                    Some("n") => app.generate_another(),
                    Some("h") => open_history(app, session),
                    Some("s") => toggle_sign_in(app, session),
                    Some(_) => {}
                }
            }
            AppView::Wizard => {
                ux::show_wizard_step(&app.wizard);
                if app.wizard.step() == WizardStep::ReviewGenerate {
                    println!("  [g] Generate   [1-3] Edit step   [b] Back   [m] Home");
                    let Some(input) = ux::read_line("> ") else { return Ok(()) };
                    match input.as_str() {
                        "g" => {
                            if app.wizard.next() == NextOutcome::ReadyToGenerate {
                                run_generation(app, session).await;
                                tab = ResultsTab::Images;
                            }
                        }
                        "b" => {
                            app.wizard.back();
                        }
                        "m" => app.go_home(),
                        other => {
                            if let Some(step) = other.parse().ok().and_then(WizardStep::from_number) {
                                app.wizard.jump_to(step);
                            }
                        }
                    }
                } else {
                    ux::edit_step(&mut app.wizard);
                    ux::show_wizard_step(&app.wizard);
                    println!("  [enter] Next   [e] Edit again   [b] Back   [m] Home");
                    let Some(input) = ux::read_line("> ") else { return Ok(()) };
                    match input.as_str() {
                        "" | "n" => {
                            app.wizard.next();
                        }
                        "b" => {
                            app.wizard.back();
                        }
                        "m" => app.go_home(),
                        _ => {}
                    }
                }
            }
            AppView::Generating => app.cancel_generation(),
            AppView::Results => {
                let Some(record) = app.record().cloned() else {
                    app.go_home();
                    continue;
                };
                ux::show_results(&record, tab, app.user().is_some());
                let Some(input) = ux::read_line("> ") else { return Ok(()) };
                match input.as_str() {
                    "s" => {
                        if app.user().is_none() {
                            toggle_sign_in(app, session);
                        }
                        // Failures surface as the next notice.
                        let _ = app.save_current(&session.store);
                    }
                    "x" => {
                        let default_dir = session.cfg.data_dir.join("exports").join(&record.app_name);
                        let dir = ux::read_line(&format!("Export directory [{}]: ", default_dir.display()))
                            .filter(|d| !d.is_empty())
                            .map(Into::into)
                            .unwrap_or(default_dir);
                        match export::export_campaign(&record, &dir) {
                            Ok(summary) => ux::print_export_dashboard(&summary),
                            Err(e) => ux::show_error(&format!("Export failed: {e:#}")),
                        }
                    }
                    "a" => app.generate_another(),
                    "h" => open_history(app, session),
                    "m" => app.go_home(),
                    other => {
                        if let Some(i) = other.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                            if let Some(t) = ResultsTab::ALL.get(i) {
                                tab = *t;
                            }
                        }
                    }
                }
            }
            AppView::History => {
                ux::show_history(app.history());
                let Some(input) = ux::read_line("> ") else { return Ok(()) };
                if input == "m" {
                    app.go_home();
                    continue;
                }
                match command_with_index(&input) {
                    Some(('o', i)) => {
                        if app.open_history_entry(i) {
                            tab = ResultsTab::Images;
                        }
                    }
                    Some(('d', i)) => {
                        let name = app.history().get(i).map(|r| r.app_name.clone());
                        if let Some(name) = name {
                            if ux::confirm(&format!("Delete the {name} campaign?")) {
                                if let Err(e) = app.delete_history_entry(&session.store, i) {
                                    ux::show_error(&e.to_string());
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_commands_parse() {
        assert_eq!(command_with_index("o 3"), Some(('o', 2)));
        assert_eq!(command_with_index("D1"), Some(('d', 0)));
        assert_eq!(command_with_index("o 0"), None);
        assert_eq!(command_with_index("o"), None);
    }
}
