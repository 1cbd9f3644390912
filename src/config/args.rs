//! Command-line argument parsing
//!
//! The server takes a single optional flag: the configuration file path,
//! given as `-c path`, `--config path`, `-c=path` or `--config=path`.

/// Parse configuration file path from command-line arguments
///
/// # Examples
/// ```
/// use beacon::config::args::parse_config_path;
/// let args = vec!["beacon".to_string(), "--config".to_string(), "prod.toml".to_string()];
/// assert_eq!(parse_config_path(&args), Some("prod.toml".to_string()));
/// ```
pub fn parse_config_path(args: &[String]) -> Option<String> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "-c" || arg == "--config" {
            return iter.next().cloned();
        }
        if let Some(path) = arg
            .strip_prefix("-c=")
            .or_else(|| arg.strip_prefix("--config="))
        {
            return Some(path.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_config_path_flags() {
        assert_eq!(
            parse_config_path(&args(&["beacon", "-c", "a.toml"])),
            Some("a.toml".to_string())
        );
        assert_eq!(
            parse_config_path(&args(&["beacon", "--config", "b.toml"])),
            Some("b.toml".to_string())
        );
        assert_eq!(
            parse_config_path(&args(&["beacon", "-c=c.toml"])),
            Some("c.toml".to_string())
        );
        assert_eq!(
            parse_config_path(&args(&["beacon", "--config=d.toml"])),
            Some("d.toml".to_string())
        );
    }

    #[test]
    fn test_parse_config_path_missing_value() {
        assert_eq!(parse_config_path(&args(&["beacon", "--config"])), None);
    }

    #[test]
    fn test_parse_config_path_ignores_program_name() {
        assert_eq!(parse_config_path(&args(&["-c=self.toml"])), None);
        assert_eq!(parse_config_path(&args(&["beacon"])), None);
    }
}
