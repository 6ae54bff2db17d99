use std::fs;
use std::path::{Path, PathBuf};

use crate::date::YearRange;
use crate::error::{Error, Result};
use crate::grid::BoundingBox;

/// Everything a run needs, read once from the control file.
///
/// The control file is plain text, one `name | value [# comment]` setting
/// per line.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the monthly files (and the `_workflow_log` folder) go in.
    pub forcing_path: PathBuf,
    pub years: YearRange,
    /// As configured; snap with [`BoundingBox::snap_to_grid`] before use.
    pub bounding_box: BoundingBox,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        let forcing_path = resolve_forcing_path(&contents, path)?;
        let years = YearRange::parse(&read_setting(&contents, "forcing_raw_time", path)?)?;
        let bounding_box =
            BoundingBox::parse(&read_setting(&contents, "forcing_raw_space", path)?)?;

        Ok(Self {
            forcing_path,
            years,
            bounding_box,
        })
    }
}

/// Look up a named setting in control-file contents.
///
/// The first non-comment line containing `name` wins; the value is what
/// follows the first `|`, truncated at a trailing `# comment` and trimmed.
/// `path` only labels the error when the setting is absent.
pub fn read_setting(contents: &str, name: &str, path: &Path) -> Result<String> {
    for line in contents.lines() {
        if line.starts_with('#') || !line.contains(name) {
            continue;
        }
        let Some((_, rest)) = line.split_once('|') else {
            continue;
        };
        let value = match rest.find('#') {
            Some(idx) => &rest[..idx],
            None => rest,
        };
        return Ok(value.trim().to_string());
    }

    Err(Error::MissingSetting(name.to_string(), path.to_path_buf()))
}

/// `forcing_raw_path` names the output directory outright, or `default` for
/// the conventional `<root_path>/domain_<domain_name>/forcing/raw_data`.
fn resolve_forcing_path(contents: &str, path: &Path) -> Result<PathBuf> {
    let raw = read_setting(contents, "forcing_raw_path", path)?;
    if raw != "default" {
        return Ok(PathBuf::from(raw));
    }

    let root = read_setting(contents, "root_path", path)?;
    let domain = read_setting(contents, "domain_name", path)?;
    Ok(PathBuf::from(root)
        .join(format!("domain_{domain}"))
        .join("forcing")
        .join("raw_data"))
}
