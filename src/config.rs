//! Run configuration: built-in defaults, optional JSON file, `.env`/environment overrides.

use crate::error::{ReportError, Result};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyMode {
    /// Template kept as-is, verification annex appended.
    #[default]
    Append,
    /// Annex appended plus heading styles, cover page and title cleanup.
    Enhance,
}

impl std::str::FromStr for AssemblyMode {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(AssemblyMode::Append),
            "enhance" => Ok(AssemblyMode::Enhance),
            other => Err(ReportError::Config(format!("Unknown mode '{}'", other))),
        }
    }
}

/// Where the statement rows live in the workbook (0-based columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementSource {
    pub path: PathBuf,
    pub sheet: String,
    pub label_column: usize,
    pub value_column: usize,
    /// Rows at the top of the sheet that are column headers, not data.
    pub header_rows: usize,
}

impl Default for StatementSource {
    fn default() -> Self {
        Self {
            path: PathBuf::from("docs/Canvas Bilan Prévisionel.xls"),
            sheet: "Cr".to_string(),
            label_column: 0,
            value_column: 2,
            header_rows: 1,
        }
    }
}

/// Cover page text and the old title lines it replaces (enhance mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverPage {
    pub title: String,
    pub subtitle: String,
    pub location: String,
    pub promoter: String,
    /// Defaults to "Février 2026". `None` or a blank value means the current month.
    pub date: Option<String>,
    pub title_markers: Vec<String>,
}

impl Default for CoverPage {
    fn default() -> Self {
        Self {
            title: "ÉTUDE DE FAISABILITÉ AGRICOLE ET AGRO-INDUSTRIELLE".to_string(),
            subtitle: "Projet d’agro-complexe intégré - Luzerne granulée & Apiculture".to_string(),
            location: "Lieu-dit El Mahjez, commune de M’lili, wilaya de Biskra".to_string(),
            promoter: "SARL ATLAS AGRO NA".to_string(),
            date: Some("Février 2026".to_string()),
            title_markers: vec![
                "Étude de faisabilité".to_string(),
                "Projet d’agro-complexe".to_string(),
                "Localisation :".to_string(),
                "Promoteur :".to_string(),
            ],
        }
    }
}

impl CoverPage {
    pub fn date_text(&self) -> String {
        match &self.date {
            Some(d) if !d.trim().is_empty() => d.clone(),
            _ => {
                let now = Local::now();
                format!("{} {}", french_month(now.month()), now.year())
            }
        }
    }
}

fn french_month(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "Janvier", "Février", "Mars", "Avril", "Mai", "Juin", "Juillet", "Août", "Septembre",
        "Octobre", "Novembre", "Décembre",
    ];
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// Fixed wording of the verification annex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportText {
    pub heading: String,
    pub note: String,
    pub header_indicator: String,
    pub header_value: String,
    pub header_status: String,
    pub status: String,
}

impl Default for ReportText {
    fn default() -> Self {
        Self {
            heading: "ANNEXE : VÉRIFICATION FINANCIÈRE (CERTIFIÉ CONFORME)".to_string(),
            note: "Les données financières présentées dans ce document ont été vérifiées et croisées avec le modèle financier détaillé (Canvas Bilan Prévisionel.xls).\n\n".to_string(),
            header_indicator: "Indicateur (Année 2)".to_string(),
            header_value: "Valeur Excel (M DA)".to_string(),
            header_status: "Statut".to_string(),
            status: "Vérifié ✓".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub mode: AssemblyMode,
    pub statement: StatementSource,
    pub template: PathBuf,
    /// `None` picks the default output for the mode.
    pub output: Option<PathBuf>,
    pub cover: CoverPage,
    pub text: ReportText,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            mode: AssemblyMode::Append,
            statement: StatementSource::default(),
            template: PathBuf::from("docs/PROJET_BISKRA.docx"),
            output: None,
            cover: CoverPage::default(),
            text: ReportText::default(),
        }
    }
}

impl ReportConfig {
    /// Read a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Apply `REPORT_*` variables, loading `.env` from the working directory first.
    pub fn apply_env(&mut self) -> Result<()> {
        let _ = dotenvy::dotenv();
        self.apply_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_vars<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("REPORT_STATEMENT") {
            self.statement.path = PathBuf::from(v);
        }
        if let Some(v) = non_empty("REPORT_SHEET") {
            self.statement.sheet = v;
        }
        if let Some(v) = non_empty("REPORT_TEMPLATE") {
            self.template = PathBuf::from(v);
        }
        if let Some(v) = non_empty("REPORT_OUTPUT") {
            self.output = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty("REPORT_MODE") {
            self.mode = v.parse()?;
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(p) => p.clone(),
            None => match self.mode {
                AssemblyMode::Append => PathBuf::from("docs/PROJET_BISKRA_FINAL_BANQUE_V2.docx"),
                AssemblyMode::Enhance => PathBuf::from("docs/PROJET_BISKRA_FINAL_BANQUE_V3.docx"),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.statement.sheet.trim().is_empty() {
            return Err(ReportError::Config("Sheet name is empty".to_string()));
        }
        if self.statement.label_column == self.statement.value_column {
            return Err(ReportError::Config(
                "Label and value columns must differ".to_string(),
            ));
        }
        if self.output_path() == self.template {
            return Err(ReportError::Config(
                "Output path must differ from the template path".to_string(),
            ));
        }
        Ok(())
    }
}
