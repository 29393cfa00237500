use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// キュレーション計画。ラベルごとの目標件数と選定予算を YAML ファイルで受け取る。
///
/// `targets` に無いラベルは選定の動機にならない。`known_labels` は
/// カタログ検証時の警告対象を定めるだけで、選定そのものには影響しない。
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CurationPlan {
    #[serde(default)]
    pub targets: BTreeMap<String, usize>,
    pub max_total_additions: usize,
    #[serde(default)]
    pub max_per_category: Option<usize>,
    #[serde(default)]
    pub allow_generic_fill: bool,
    #[serde(default)]
    pub known_labels: Vec<String>,
}

impl CurationPlan {
    /// 計画ファイルを読み込み、ラベル名の妥当性を検証する。
    ///
    /// # Errors
    /// ファイルが読めない、YAML として解釈できない、または空のラベル名を
    /// 含む場合は [`PlanError`] を返す。
    pub fn load_from_path(path: &Path) -> Result<Self, PlanError> {
        let contents = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let plan: Self =
            serde_yaml::from_str(&contents).map_err(|source| PlanError::Deserialize {
                path: path.to_path_buf(),
                source,
            })?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<(), PlanError> {
        let blank_target = self.targets.keys().any(|label| label.trim().is_empty());
        let blank_known = self.known_labels.iter().any(|label| label.trim().is_empty());
        if blank_target || blank_known {
            return Err(PlanError::EmptyLabel);
        }
        Ok(())
    }

    /// 目標が設定されているラベルの一覧。報告順と同じ辞書順で返す。
    #[must_use]
    pub fn targeted_labels(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read curation plan at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse curation plan at {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("curation plan contains an empty pattern label")]
    EmptyLabel,
}
