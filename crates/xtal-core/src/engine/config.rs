use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Inputs of one map-to-structure-factor conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    pub map_path: PathBuf,
    pub output_path: PathBuf,
    pub f_label: String,
    pub phi_label: String,
    /// Existing MTZ whose reflections receive the new columns.
    pub base_path: Option<PathBuf>,
    /// Dataset that receives the new columns.
    pub section: Option<String>,
    /// High-resolution limit in Angstroms; only used when no base file is given.
    pub d_min: Option<f64>,
    pub f_type: char,
    pub phi_type: char,
}

#[derive(Default)]
pub struct ConversionConfigBuilder {
    map_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    f_label: Option<String>,
    phi_label: Option<String>,
    base_path: Option<PathBuf>,
    section: Option<String>,
    d_min: Option<f64>,
    f_type: Option<char>,
    phi_type: Option<char>,
}

impl ConversionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_path(mut self, path: PathBuf) -> Self {
        self.map_path = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn f_label(mut self, label: &str) -> Self {
        self.f_label = Some(label.to_string());
        self
    }
    pub fn phi_label(mut self, label: &str) -> Self {
        self.phi_label = Some(label.to_string());
        self
    }
    pub fn base_path(mut self, path: Option<PathBuf>) -> Self {
        self.base_path = path;
        self
    }
    pub fn section(mut self, name: Option<String>) -> Self {
        self.section = name;
        self
    }
    pub fn d_min(mut self, d_min: Option<f64>) -> Self {
        self.d_min = d_min;
        self
    }
    pub fn f_type(mut self, col_type: char) -> Self {
        self.f_type = Some(col_type);
        self
    }
    pub fn phi_type(mut self, col_type: char) -> Self {
        self.phi_type = Some(col_type);
        self
    }

    pub fn build(self) -> Result<ConversionConfig, ConfigError> {
        let f_label = self
            .f_label
            .ok_or(ConfigError::MissingParameter("f_label"))?;
        let phi_label = self
            .phi_label
            .ok_or(ConfigError::MissingParameter("phi_label"))?;
        validate_label("f_label", &f_label)?;
        validate_label("phi_label", &phi_label)?;
        if let Some(d) = self.d_min {
            if !(d.is_finite() && d > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "d_min",
                    reason: format!("{d} is not a positive resolution"),
                });
            }
        }
        Ok(ConversionConfig {
            map_path: self
                .map_path
                .ok_or(ConfigError::MissingParameter("map_path"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            f_label,
            phi_label,
            base_path: self.base_path,
            section: self.section,
            d_min: self.d_min,
            f_type: self.f_type.unwrap_or('F').to_ascii_uppercase(),
            phi_type: self.phi_type.unwrap_or('P').to_ascii_uppercase(),
        })
    }
}

/// MTZ header records are whitespace-separated, so labels cannot contain blanks.
fn validate_label(name: &'static str, label: &str) -> Result<(), ConfigError> {
    if label.is_empty() || label.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidParameter {
            name,
            reason: format!("'{label}' must be non-empty and without whitespace"),
        });
    }
    Ok(())
}
