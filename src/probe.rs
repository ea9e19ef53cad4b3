//! Timestamp probe (C4): substitute `%(KEY)s` placeholders in a target's
//! artifact path template against the configuration, then stat it.

use std::path::Path;

use regex::Regex;

use crate::config::Config;
use crate::graph::Graph;

/// Substitute `%(KEY)s` placeholders against `config`. Returns `None` if
/// any referenced key is missing — the target is then treated as having
/// no resolvable artifact.
pub fn substitute(template: &str, config: &Config) -> Option<String> {
    let pattern = Regex::new(r"%\(([A-Za-z0-9_]+)\)s").expect("static regex");
    let mut missing = false;
    let resolved = pattern.replace_all(template, |caps: &regex::Captures| {
        let key = &caps[1];
        match config.get(key) {
            Some(value) => value.to_string(),
            None => {
                missing = true;
                String::new()
            }
        }
    });
    if missing {
        None
    } else {
        Some(resolved.into_owned())
    }
}

/// Probe every target's artifact and set `timestamp`. 0.0 when the
/// artifact is missing or unresolvable, 1.0 when present with
/// `check_mtime=false`, the file's mtime (seconds since epoch) when
/// present with `check_mtime=true`.
pub fn probe_all(graph: &mut Graph, config: &Config) {
    let names = graph.names();
    for name in names {
        let (artifact, check_mtime) = {
            let target = graph.get(&name).expect("name from graph.names()");
            (target.artifact.clone(), target.check_mtime)
        };

        let Some(template) = artifact else { continue };
        let Some(path) = substitute(&template, config) else {
            graph.get_mut(&name).unwrap().timestamp = 0.0;
            continue;
        };

        let timestamp = probe_one(Path::new(&path), check_mtime);
        graph.get_mut(&name).unwrap().timestamp = timestamp;
    }
}

fn probe_one(path: &Path, check_mtime: bool) -> f64 {
    match std::fs::metadata(path) {
        Ok(meta) => {
            if !check_mtime {
                return 1.0;
            }
            meta.modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or(1.0)
        }
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_key() {
        let mut config = Config::default();
        config.insert("ARCH", "x86_64");
        assert_eq!(
            substitute("out/%(ARCH)s/a.out", &config),
            Some("out/x86_64/a.out".to_string())
        );
    }

    #[test]
    fn missing_key_yields_none() {
        let config = Config::default();
        assert_eq!(substitute("out/%(ARCH)s/a.out", &config), None);
    }

    #[test]
    fn probe_missing_file_is_zero() {
        assert_eq!(probe_one(Path::new("/nonexistent/path/x"), true), 0.0);
    }

    #[test]
    fn probe_existing_file_without_mtime_is_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(probe_one(&path, false), 1.0);
    }

    #[test]
    fn probe_existing_file_with_mtime_is_positive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, b"x").unwrap();
        assert!(probe_one(&path, true) > 0.0);
    }
}
