use crate::config::Config;
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: Option<PathBuf>,
    pub response: Option<PathBuf>,
}

/// Installs the global subscriber. `RUST_LOG` wins over `--debug`.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "indiemark=debug" } else { "indiemark=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn tx_dir(data_dir: &Path, tx: Uuid) -> PathBuf {
    data_dir.join("tx").join(tx.to_string())
}

/// Writes `<stage>.request.json` / `<stage>.response.json` under the
/// transaction directory, each only when its config flag is on.
pub fn save_stage<Req: Serialize, Resp: Serialize>(
    stage: &str,
    req: &Req,
    resp: Option<&Resp>,
    tx: Uuid,
    cfg: &Config,
) -> anyhow::Result<Option<SavedPaths>> {
    if !cfg.save_request && !cfg.save_response {
        return Ok(None);
    }
    let dir = tx_dir(&cfg.data_dir, tx);
    fs::create_dir_all(&dir)?;

    let mut request_path = None;
    let mut response_path = None;

    if cfg.save_request {
        let p = dir.join(format!("{stage}.request.json"));
        fs::write(&p, to_string_pretty(req)?)?;
        request_path = Some(p);
    }

    if cfg.save_response {
        if let Some(resp) = resp {
            let p = dir.join(format!("{stage}.response.json"));
            fs::write(&p, to_string_pretty(resp)?)?;
            response_path = Some(p);
        }
    }

    let saved = SavedPaths { dir, request: request_path, response: response_path };
    log_saved_paths(stage, &saved);
    Ok(Some(saved))
}

fn log_saved_paths(stage: &str, saved: &SavedPaths) {
    debug!(stage, dir = %saved.dir.display(), "artifacts directory");
    match &saved.request {
        Some(p) => debug!(stage, path = %p.display(), "request saved"),
        None => debug!(stage, "request not saved (flag off)"),
    }
    match &saved.response {
        Some(p) => debug!(stage, path = %p.display(), "response saved"),
        None => debug!(stage, "response not saved"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_only_flagged_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            data_dir: dir.path().to_path_buf(),
            save_request: true,
            save_response: false,
            ..Config::default()
        };
        let tx = Uuid::new_v4();
        let saved = save_stage("text", &json!({"q": 1}), Some(&json!({"a": 2})), tx, &cfg)
            .unwrap()
            .unwrap();
        assert_eq!(saved.dir, tx_dir(dir.path(), tx));
        assert!(saved.request.unwrap().exists());
        assert!(saved.response.is_none());
    }

    #[test]
    fn nothing_written_when_both_flags_off() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };
        let saved = save_stage::<_, serde_json::Value>("text", &json!({}), None, Uuid::new_v4(), &cfg)
            .unwrap();
        assert!(saved.is_none());
        assert!(!dir.path().join("tx").exists());
    }
}
