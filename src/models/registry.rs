use serde::{Deserialize, Serialize};

use super::error::ModelError;

pub const DEFAULT_BASE_URL: &str = "https://textmt.blob.core.windows.net/www/marian/metric";
pub const ARCHIVE_EXTENSION: &str = "tgz";

/// Metric family a checkpoint belongs to. The evaluation wrapper hands this to
/// the engine so it knows how to interpret the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    CometQe,
    Comet,
    Bleurt,
}

impl ModelKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::CometQe => "comet-qe",
            ModelKind::Comet => "comet",
            ModelKind::Bleurt => "bleurt",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KnownModel {
    pub name: &'static str,
    pub kind: ModelKind,
}

impl KnownModel {
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("{}.{}", self.name, ARCHIVE_EXTENSION)
    }

    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.archive_name())
    }
}

const KNOWN_MODELS: &[KnownModel] = &[
    KnownModel {
        name: "chrfoid-wmt23",
        kind: ModelKind::CometQe,
    },
    KnownModel {
        name: "cometoid22-wmt21",
        kind: ModelKind::CometQe,
    },
    KnownModel {
        name: "cometoid22-wmt22",
        kind: ModelKind::CometQe,
    },
    KnownModel {
        name: "cometoid22-wmt23",
        kind: ModelKind::CometQe,
    },
    KnownModel {
        name: "comet20-da-qe",
        kind: ModelKind::CometQe,
    },
    KnownModel {
        name: "comet20-da",
        kind: ModelKind::Comet,
    },
    KnownModel {
        name: "bleurt20",
        kind: ModelKind::Bleurt,
    },
];

#[must_use]
pub fn known_models() -> &'static [KnownModel] {
    KNOWN_MODELS
}

pub fn lookup(name: &str) -> Result<&'static KnownModel, ModelError> {
    KNOWN_MODELS
        .iter()
        .find(|model| model.name == name)
        .ok_or_else(|| ModelError::UnknownModel {
            name: name.to_string(),
            known: KNOWN_MODELS
                .iter()
                .map(|model| model.name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_model() {
        let model = lookup("bleurt20").unwrap();
        assert_eq!(model.kind, ModelKind::Bleurt);
        assert_eq!(model.kind.as_str(), "bleurt");
    }

    #[test]
    fn lookup_rejects_unknown_model() {
        let err = lookup("comet-xxl").unwrap_err();
        match err {
            ModelError::UnknownModel { name, known } => {
                assert_eq!(name, "comet-xxl");
                assert!(known.contains("cometoid22-wmt22"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn url_joins_base_without_double_slash() {
        let model = lookup("comet20-da").unwrap();
        assert_eq!(
            model.url("https://example.org/metric/"),
            "https://example.org/metric/comet20-da.tgz"
        );
        assert_eq!(
            model.url(DEFAULT_BASE_URL),
            format!("{DEFAULT_BASE_URL}/comet20-da.tgz")
        );
    }

    #[test]
    fn kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ModelKind::CometQe).unwrap();
        assert_eq!(json, "\"comet-qe\"");
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = known_models().iter().map(|model| model.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), known_models().len());
    }
}
