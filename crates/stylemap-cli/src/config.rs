//! Command-line configuration.
//!
//! Arguments are parsed by hand: the surface is a handful of flags and the
//! binary has no subcommands.

use crate::error::CliError;
use std::fs;
use std::path::{Path, PathBuf};
use stylemap_core::{EnhanceOptions, MappingStrategy};

pub const USAGE: &str = "\
stylemap: map a stylesheet onto a design tree

Usage: stylemap --tree <design.json> --css <styles.css> [options]

Options:
  --tree <path>              Design document exported as JSON (required)
  --css <path>               Stylesheet to map (required)
  --options <path>           JSON file with enhancement options (camelCase)
  --strategy <name>          name | class | id | hybrid
  --min-confidence <value>   Discard mappings below this confidence (0..1)
  --max-suggestions <n>      Upper bound on suggestions
  --report                   Print a text report instead of JSON
  --pretty                   Pretty-print JSON output
  -h, --help                 Show this message

Logging is controlled with RUST_LOG (e.g. RUST_LOG=stylemap_core=debug).
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CliConfig),
    Help,
}

/// Everything one `stylemap` invocation was asked to do.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliConfig {
    pub tree: PathBuf,
    pub css: PathBuf,
    pub options: Option<PathBuf>,
    pub strategy: Option<MappingStrategy>,
    pub min_confidence: Option<f32>,
    pub max_suggestions: Option<usize>,
    pub report: bool,
    pub pretty: bool,
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let mut tree = None;
    let mut css = None;
    let mut config = CliConfig::default();
    let mut idx = 0;

    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Ok(Command::Help),
            "--report" => config.report = true,
            "--pretty" => config.pretty = true,
            "--tree" | "--css" | "--options" | "--strategy" | "--min-confidence"
            | "--max-suggestions" => {
                idx += 1;
                let Some(value) = args.get(idx) else {
                    return Err(CliError::MissingValue {
                        flag: flag.to_string(),
                    });
                };
                match flag {
                    "--tree" => tree = Some(PathBuf::from(value)),
                    "--css" => css = Some(PathBuf::from(value)),
                    "--options" => config.options = Some(PathBuf::from(value)),
                    "--strategy" => {
                        let strategy = value
                            .parse::<MappingStrategy>()
                            .map_err(|reason| invalid(flag, value, reason))?;
                        config.strategy = Some(strategy);
                    }
                    "--min-confidence" => {
                        let v = value
                            .parse::<f32>()
                            .map_err(|e| invalid(flag, value, e.to_string()))?;
                        if !(0.0..=1.0).contains(&v) {
                            return Err(invalid(flag, value, "expected a number between 0 and 1"));
                        }
                        config.min_confidence = Some(v);
                    }
                    _ => {
                        let v = value
                            .parse::<usize>()
                            .map_err(|e| invalid(flag, value, e.to_string()))?;
                        config.max_suggestions = Some(v);
                    }
                }
            }
            other => return Err(CliError::UnknownArgument(other.to_string())),
        }
        idx += 1;
    }

    config.tree = tree.ok_or(CliError::MissingArgument("--tree"))?;
    config.css = css.ok_or(CliError::MissingArgument("--css"))?;
    Ok(Command::Run(config))
}

fn invalid(flag: &str, value: &str, reason: impl Into<String>) -> CliError {
    CliError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

impl CliConfig {
    /// Options file (if any) with command-line overrides applied on top.
    pub fn enhance_options(&self) -> Result<EnhanceOptions, CliError> {
        let mut options = match &self.options {
            Some(path) => {
                let text = read_input(path)?;
                serde_json::from_str(&text).map_err(|source| CliError::Options {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => EnhanceOptions::default(),
        };
        if let Some(strategy) = self.strategy {
            options.mapping_strategy = strategy;
        }
        if let Some(v) = self.min_confidence {
            options.min_confidence = v;
        }
        if let Some(n) = self.max_suggestions {
            options.max_suggestions = n;
        }
        Ok(options.validated())
    }
}

pub fn read_input(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_full_command_line() {
        let command = parse_args(args(&[
            "--tree",
            "design.json",
            "--css",
            "app.css",
            "--strategy",
            "class",
            "--min-confidence",
            "0.3",
            "--max-suggestions",
            "2",
            "--report",
        ]))
        .expect("args should parse");

        assert_eq!(
            command,
            Command::Run(CliConfig {
                tree: PathBuf::from("design.json"),
                css: PathBuf::from("app.css"),
                options: None,
                strategy: Some(MappingStrategy::Class),
                min_confidence: Some(0.3),
                max_suggestions: Some(2),
                report: true,
                pretty: false,
            })
        );
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse_args(args(&["--css", "a.css", "-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn missing_inputs_are_errors() {
        let err = parse_args(args(&["--css", "a.css"])).unwrap_err();
        assert!(matches!(err, CliError::MissingArgument("--tree")));

        let err = parse_args(args(&["--tree"])).unwrap_err();
        assert_eq!(err.to_string(), "Missing value for `--tree`.");
    }

    #[test]
    fn rejects_bad_values() {
        let err = parse_args(args(&["--tree", "t", "--css", "c", "--strategy", "fuzzy"])).unwrap_err();
        assert!(matches!(err, CliError::InvalidValue { .. }));

        let err =
            parse_args(args(&["--tree", "t", "--css", "c", "--min-confidence", "1.5"])).unwrap_err();
        assert!(err.to_string().contains("between 0 and 1"));

        let err = parse_args(args(&["--verbose"])).unwrap_err();
        assert!(matches!(err, CliError::UnknownArgument(a) if a == "--verbose"));
    }

    #[test]
    fn overrides_apply_over_defaults() {
        let config = CliConfig {
            strategy: Some(MappingStrategy::Id),
            max_suggestions: Some(1),
            ..Default::default()
        };
        let options = config.enhance_options().unwrap();
        assert_eq!(options.mapping_strategy, MappingStrategy::Id);
        assert_eq!(options.max_suggestions, 1);
        assert_eq!(options.min_confidence, 0.5);
    }

    #[test]
    fn missing_options_file_is_io_error() {
        let config = CliConfig {
            options: Some(PathBuf::from("/nonexistent/stylemap-options.json")),
            ..Default::default()
        };
        assert!(matches!(config.enhance_options(), Err(CliError::Io { .. })));
    }
}
