use crate::cli::Cli;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use xtal::engine::config::{ConversionConfig, ConversionConfigBuilder};

/// Conversion defaults read from a TOML file.
///
/// ```toml
/// base = "refined.mtz"
/// section = "maps"
/// dmin = 2.0
/// ftype = "F"
/// phitype = "P"
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialConversionConfig {
    pub base: Option<PathBuf>,
    pub section: Option<String>,
    pub dmin: Option<f64>,
    pub ftype: Option<char>,
    pub phitype: Option<char>,
}

impl PartialConversionConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Combines the file defaults with the command line; every option given on the
    /// command line replaces the file value.
    pub fn merge_with_cli(self, args: &Cli) -> Result<ConversionConfig> {
        let mut builder = ConversionConfigBuilder::new()
            .map_path(args.map_file.clone())
            .output_path(args.output_file.clone())
            .f_label(&args.col_f)
            .phi_label(&args.col_ph)
            .base_path(args.base.clone().or(self.base))
            .section(args.section.clone().or(self.section))
            .d_min(args.dmin.or(self.dmin));

        if let Some(col_type) = args.ftype.or(self.ftype) {
            builder = builder.f_type(col_type);
        }
        if let Some(col_type) = args.phitype.or(self.phitype) {
            builder = builder.phi_type(col_type);
        }

        let config = builder.build()?;
        debug!("Final conversion configuration: {:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use xtal::engine::config::ConfigError;

    fn cli(extra: &[&str]) -> Cli {
        let mut argv = vec!["map2sf"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["map.ccp4", "out.mtz", "FWT", "PHWT"]);
        Cli::try_parse_from(argv).unwrap()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn file_is_parsed() {
        let file = write_config(
            "base = \"refined.mtz\"\nsection = \"maps\"\ndmin = 2.0\nftype = \"F\"\nphitype = \"Q\"\n",
        );
        let partial = PartialConversionConfig::from_file(file.path()).unwrap();
        assert_eq!(
            partial,
            PartialConversionConfig {
                base: Some(PathBuf::from("refined.mtz")),
                section: Some("maps".to_string()),
                dmin: Some(2.0),
                ftype: Some('F'),
                phitype: Some('Q'),
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("resolution = 2.0\n");
        let result = PartialConversionConfig::from_file(file.path());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PartialConversionConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    fn defaults_apply_without_file_or_options() {
        let config = PartialConversionConfig::default()
            .merge_with_cli(&cli(&[]))
            .unwrap();
        assert_eq!(config.map_path, PathBuf::from("map.ccp4"));
        assert_eq!(config.output_path, PathBuf::from("out.mtz"));
        assert_eq!(config.f_label, "FWT");
        assert_eq!(config.phi_label, "PHWT");
        assert_eq!(config.base_path, None);
        assert_eq!(config.section, None);
        assert_eq!(config.d_min, None);
        assert_eq!(config.f_type, 'F');
        assert_eq!(config.phi_type, 'P');
    }

    #[test]
    fn command_line_overrides_file_values() {
        let partial = PartialConversionConfig {
            base: Some(PathBuf::from("file.mtz")),
            section: Some("from-file".to_string()),
            dmin: Some(3.0),
            ftype: Some('G'),
            phitype: None,
        };
        let config = partial
            .merge_with_cli(&cli(&["--section", "cli", "--dmin", "1.5"]))
            .unwrap();
        assert_eq!(config.base_path, Some(PathBuf::from("file.mtz")));
        assert_eq!(config.section.as_deref(), Some("cli"));
        assert_eq!(config.d_min, Some(1.5));
        assert_eq!(config.f_type, 'G');
        assert_eq!(config.phi_type, 'P');
    }

    #[test]
    fn invalid_resolution_is_reported() {
        let result = PartialConversionConfig::default().merge_with_cli(&cli(&["--dmin=0"]));
        assert!(matches!(
            result,
            Err(CliError::InvalidConfig(ConfigError::InvalidParameter { name: "d_min", .. }))
        ));
    }
}
