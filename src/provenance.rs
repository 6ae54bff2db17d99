use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;

use crate::date::YearRange;
use crate::download::RunSummary;
use crate::error::Result;
use crate::grid::BoundingBox;

/// Subfolder of the forcing path holding run logs and control-file copies.
pub const LOG_DIR: &str = "_workflow_log";

/// Record what a run did: keep a copy of the control file next to a dated
/// summary of the downloaded space/time extent.
///
/// Returns the path of the log file written.
pub fn write_run_log(
    forcing_path: &Path,
    control_file: &Path,
    area: &BoundingBox,
    years: YearRange,
    summary: &RunSummary,
) -> Result<PathBuf> {
    let log_dir = forcing_path.join(LOG_DIR);
    fs::create_dir_all(&log_dir)?;

    if let Some(name) = control_file.file_name() {
        fs::copy(control_file, log_dir.join(name))?;
        debug!("control file preserved in {}", log_dir.display());
    }

    let now = Utc::now();
    let log_path = log_dir.join(format!(
        "{}_era5_surface_download_log.txt",
        now.format("%Y%m%d")
    ));

    let contents = format!(
        "{stamp} - {name} v{version}\n\
         Downloaded ERA5 surface level data for space ({area}) and years {start}-{end}.\n\
         {downloaded} month(s) downloaded, {skipped} already on disk, {failed} failed.\n",
        stamp = now.format("%Y/%m/%d %H:%M:%S"),
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        area = area.area_string(),
        start = years.start(),
        end = years.end(),
        downloaded = summary.downloaded(),
        skipped = summary.skipped(),
        failed = summary.failed(),
    );
    fs::write(&log_path, contents)?;

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::Month;
    use crate::download::MonthOutcome;

    fn summary() -> RunSummary {
        RunSummary {
            results: vec![
                (Month::new(2008, 1).unwrap(), MonthOutcome::Skipped),
                (
                    Month::new(2008, 2).unwrap(),
                    MonthOutcome::Downloaded { bytes: 42, attempts: 1 },
                ),
                (Month::new(2008, 3).unwrap(), MonthOutcome::Failed { attempts: 10 }),
            ],
        }
    }

    #[test]
    fn writes_dated_log_and_control_copy() {
        let forcing = tempfile::tempdir().unwrap();
        let control_dir = tempfile::tempdir().unwrap();
        let control = control_dir.path().join("control_active.txt");
        fs::write(&control, "forcing_raw_time | 2008,2008\n").unwrap();

        let area = BoundingBox::new(51.75, -116.5, 51.0, -115.5).unwrap();
        let years = YearRange::new(2008, 2008).unwrap();

        let log_path =
            write_run_log(forcing.path(), &control, &area, years, &summary()).unwrap();

        let log_dir = forcing.path().join(LOG_DIR);
        assert!(log_dir.is_dir());
        assert!(log_dir.join("control_active.txt").is_file());

        let expected_name = format!(
            "{}_era5_surface_download_log.txt",
            Utc::now().format("%Y%m%d")
        );
        assert_eq!(log_path.file_name().unwrap(), expected_name.as_str());

        let contents = fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("51.75/-116.5/51.0/-115.5"));
        assert!(contents.contains("2008-2008"));
        assert!(contents.contains("1 month(s) downloaded, 1 already on disk, 1 failed"));
    }
}
