use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("target '{referrer}' references unknown target '{reference}'")]
    UnresolvedReference { referrer: String, reference: String },

    #[error("cyclic dependency detected, starting from '{0}'")]
    CyclicDependency(String),

    #[error("cyclic provide relationship detected, starting from '{0}'")]
    CyclicProvide(String),

    #[error("target '{0}' lists more than one essential in its dependencies")]
    MultipleEssentials(String),

    #[error("target '{0}' depends on itself")]
    SelfDependency(String),

    #[error("no targets requested and no default target defined")]
    NoRequest,

    #[error("could not resolve abstract dependencies: {}", format_ambiguous(.0))]
    Ambiguous(std::collections::BTreeMap<String, BTreeSet<String>>),

    #[error("extension rejected the run: {0}")]
    PluginReject(String),

    #[error("action for target '{target}' failed: {message}")]
    ActionFailure { target: String, message: String },

    #[error("resolver did not converge after {0} iterations")]
    ResolutionDidNotConverge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

fn format_ambiguous(candidates: &std::collections::BTreeMap<String, BTreeSet<String>>) -> String {
    candidates
        .iter()
        .map(|(dep, providers)| {
            format!(
                "{} -> [{}]",
                dep,
                providers.iter().cloned().collect::<Vec<_>>().join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;

/// Mirrors `anyhow::Context` so application-layer call sites can attach a
/// free-form message without inventing a new variant per call site.
pub trait ResultExt<T> {
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| Error::Config(format!("{}: {}", msg, e)))
    }
}
