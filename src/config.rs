use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::LinkColumns;
use crate::store::{self, CsvStore, RowStore, SheetsCredentials, SheetsStore};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid layout file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid column '{column}' for {field}")]
    InvalidColumn { field: &'static str, column: String },

    #[error("{0}")]
    Missing(&'static str),
}

/// A student sheet and the city its students live in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CitySheet {
    pub city: String,
    pub sheet: String,
}

/// Columns this application writes to, in A1 letters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WriteColumns {
    pub teacher_opening_call: String,
    pub teacher_matched_student: String,
    pub student_matched_teacher: String,
}

impl Default for WriteColumns {
    fn default() -> Self {
        Self {
            teacher_opening_call: "X".to_string(),
            teacher_matched_student: "AA".to_string(),
            student_matched_teacher: "U".to_string(),
        }
    }
}

/// Where every record type lives inside the spreadsheet.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetLayout {
    pub teachers: String,
    pub coordinators: String,
    pub matches: String,
    pub students: Vec<CitySheet>,
    pub columns: WriteColumns,
}

impl Default for SheetLayout {
    fn default() -> Self {
        let city = |city: &str| CitySheet {
            city: city.to_string(),
            sheet: format!("תלמידים - {city}"),
        };

        Self {
            teachers: "מורים".to_string(),
            coordinators: "מצוותים".to_string(),
            matches: "שיבוצים".to_string(),
            students: vec![city("נתיב העשרה"), city("כפר עזה"), city("נחל עוז")],
            columns: WriteColumns::default(),
        }
    }
}

/// [`SheetLayout`] with its write columns resolved to indices.
#[derive(Debug, Clone)]
pub struct Layout {
    pub sheets: SheetLayout,
    pub teacher_opening_call: usize,
    pub teacher_matched_student: usize,
    pub student_matched_teacher: usize,
}

impl Layout {
    pub fn resolve(sheets: SheetLayout) -> Result<Self, ConfigError> {
        let column = |field: &'static str, letters: &str| {
            store::column_index(letters).map_err(|_| ConfigError::InvalidColumn {
                field,
                column: letters.to_string(),
            })
        };

        if sheets.students.is_empty() {
            return Err(ConfigError::Missing("layout lists no student sheets"));
        }

        Ok(Self {
            teacher_opening_call: column("teacher_opening_call", &sheets.columns.teacher_opening_call)?,
            teacher_matched_student: column(
                "teacher_matched_student",
                &sheets.columns.teacher_matched_student,
            )?,
            student_matched_teacher: column(
                "student_matched_teacher",
                &sheets.columns.student_matched_teacher,
            )?,
            sheets,
        })
    }

    /// Loads a TOML layout file, or the built-in layout when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let sheets = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!("Loaded sheet layout from {}", path.display());
                toml::from_str(&raw)?
            }
            None => SheetLayout::default(),
        };

        Self::resolve(sheets)
    }

    pub fn links(&self) -> LinkColumns {
        LinkColumns {
            teacher_opening_call: self.teacher_opening_call,
            teacher_matched_student: self.teacher_matched_student,
            student_matched_teacher: self.student_matched_teacher,
        }
    }

    pub fn student_sheet(&self, city: &str) -> Option<&str> {
        self.sheets
            .students
            .iter()
            .find(|entry| entry.city == city)
            .map(|entry| entry.sheet.as_str())
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            sheets: SheetLayout::default(),
            teacher_opening_call: 23,
            teacher_matched_student: 26,
            student_matched_teacher: 20,
        }
    }
}

/// Where the spreadsheet data comes from.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Read sheets from `{dir}/{sheet}.csv` instead of Google Sheets
    #[arg(long, env = "LEARNING_ON_CSV_DIR")]
    pub csv_dir: Option<PathBuf>,

    #[arg(long, env = "GOOGLE_SHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Bearer token for the Sheets API, used as-is
    #[arg(long, env = "GOOGLE_SHEETS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,

    /// OAuth refresh token of an account with access to the spreadsheet
    #[arg(long, env = "GOOGLE_SHEETS_REFRESH_TOKEN", hide_env_values = true)]
    pub sheets_refresh_token: Option<String>,

    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub google_client_secret: Option<String>,

    /// TOML file overriding sheet names and written columns
    #[arg(long, env = "LEARNING_ON_LAYOUT")]
    pub layout: Option<PathBuf>,
}

impl StoreArgs {
    pub fn layout(&self) -> Result<Layout, ConfigError> {
        Layout::load(self.layout.as_deref())
    }

    pub fn open(&self, client: reqwest::Client) -> Result<Arc<dyn RowStore>, ConfigError> {
        if let Some(dir) = &self.csv_dir {
            info!("Using CSV sheets under {}", dir.display());
            return Ok(Arc::new(CsvStore::new(dir)));
        }

        let spreadsheet_id = self
            .spreadsheet_id
            .clone()
            .ok_or(ConfigError::Missing("GOOGLE_SHEET_ID or --csv-dir must be set"))?;

        let credentials = match (&self.sheets_token, &self.sheets_refresh_token) {
            (Some(token), _) => SheetsCredentials::AccessToken(token.clone()),
            (None, Some(refresh_token)) => SheetsCredentials::RefreshToken {
                client_id: self
                    .google_client_id
                    .clone()
                    .ok_or(ConfigError::Missing("GOOGLE_CLIENT_ID is required to refresh tokens"))?,
                client_secret: self.google_client_secret.clone().ok_or(ConfigError::Missing(
                    "GOOGLE_CLIENT_SECRET is required to refresh tokens",
                ))?,
                refresh_token: refresh_token.clone(),
            },
            (None, None) => {
                return Err(ConfigError::Missing(
                    "GOOGLE_SHEETS_TOKEN or GOOGLE_SHEETS_REFRESH_TOKEN must be set",
                ));
            }
        };

        if matches!(credentials, SheetsCredentials::AccessToken(_)) {
            warn!("Using a static Sheets token, it will not be refreshed");
        }

        Ok(Arc::new(SheetsStore::new(client, spreadsheet_id, credentials)))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Postgres,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "LEARNING_ON_BIND", default_value = "0.0.0.0:5173")]
    pub bind: String,

    /// Externally visible origin, used to build the OAuth callback URL
    #[arg(long, env = "PUBLIC_URL", default_value = "http://localhost:5173")]
    pub public_url: String,

    #[arg(long, env = "OWNER_EMAIL", default_value = "")]
    pub owner_email: String,

    #[arg(long, env = "OWNER_PHONE", default_value = "")]
    pub owner_phone: String,

    #[arg(long, value_enum, env = "LEARNING_ON_SESSIONS", default_value = "memory")]
    pub sessions: SessionBackend,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Mark the session cookie `Secure`
    #[arg(long, env = "LEARNING_ON_SECURE_COOKIES")]
    pub secure_cookies: bool,
}

/// Settings the web layer needs after startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub public_url: String,
    pub owner_email: String,
    pub owner_phone: String,
    pub secure_cookies: bool,
}

impl From<&ServeArgs> for ServerConfig {
    fn from(args: &ServeArgs) -> Self {
        Self {
            bind: args.bind.clone(),
            public_url: args.public_url.trim_end_matches('/').to_string(),
            owner_email: args.owner_email.clone(),
            owner_phone: args.owner_phone.clone(),
            secure_cookies: args.secure_cookies,
        }
    }
}
