use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::client::Retrieve;
use crate::date::{Month, YearRange};
use crate::error::Result;
use crate::grid::BoundingBox;
use crate::request::RetrievalRequest;

/// CDS dataset the surface-level variables live in.
pub const DATASET: &str = "reanalysis-era5-single-levels";

/// Fixed retry budget per month; there is no backoff between attempts.
pub const MAX_ATTEMPTS: u32 = 10;

/// What happened to one month of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthOutcome {
    Downloaded { bytes: u64, attempts: u32 },
    /// Target file already on disk; existing files are never overwritten.
    Skipped,
    /// All attempts failed; the run carries on with the next month.
    Failed { attempts: u32 },
}

/// Per-month outcomes of a whole run, in calendar order.
#[derive(Debug)]
pub struct RunSummary {
    pub results: Vec<(Month, MonthOutcome)>,
}

impl RunSummary {
    pub fn downloaded(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, MonthOutcome::Downloaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, MonthOutcome::Skipped))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, MonthOutcome::Failed { .. }))
            .count()
    }
}

/// Monthly target file name, `ERA5_surface_<yyyymm>.nc`.
pub fn target_file_name(month: &Month) -> String {
    format!("ERA5_surface_{:04}{:02}.nc", month.year(), month.month())
}

/// Download every month of `years` into `forcing_path`, one file per month.
///
/// The directory is created if absent. Months whose target file already
/// exists are skipped, so re-running after a partial download only attempts
/// the missing months. `area` is expected to be grid-aligned already (see
/// [`BoundingBox::snap_to_grid`]).
pub fn download_months<R: Retrieve>(
    client: &R,
    forcing_path: &Path,
    years: YearRange,
    area: &BoundingBox,
) -> Result<RunSummary> {
    fs::create_dir_all(forcing_path)?;
    let area_string = area.area_string();

    let mut results = Vec::new();
    for month in years.months() {
        let target = forcing_path.join(target_file_name(&month));

        let outcome = if target.exists() {
            info!("{month}: {} already on disk, skipping", target.display());
            MonthOutcome::Skipped
        } else {
            let request = RetrievalRequest::surface(&month.date_range(), &area_string);
            download_month(client, &request, &target)
        };

        results.push((month, outcome));
    }

    Ok(RunSummary { results })
}

/// Run one retrieval with the fixed retry budget.
pub fn download_month<R: Retrieve>(
    client: &R,
    request: &RetrievalRequest,
    target: &Path,
) -> MonthOutcome {
    for attempt in 1..=MAX_ATTEMPTS {
        match client.retrieve(DATASET, request, target) {
            Ok(bytes) => {
                info!("{}: {bytes} bytes written", target.display());
                return MonthOutcome::Downloaded { bytes, attempts: attempt };
            }
            Err(err) => {
                warn!(
                    "{}: attempt {attempt}/{MAX_ATTEMPTS} failed: {err}",
                    target.display()
                );
            }
        }
    }

    warn!("{}: giving up after {MAX_ATTEMPTS} attempts", target.display());
    MonthOutcome::Failed {
        attempts: MAX_ATTEMPTS,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::Error;

    struct AlwaysFails {
        calls: Cell<u32>,
    }

    impl Retrieve for AlwaysFails {
        fn retrieve(&self, _: &str, _: &RetrievalRequest, _: &Path) -> Result<u64> {
            self.calls.set(self.calls.get() + 1);
            Err(Error::Retrieval("the queue is on fire".into()))
        }
    }

    struct WritesStub {
        calls: Cell<u32>,
    }

    impl Retrieve for WritesStub {
        fn retrieve(&self, _: &str, _: &RetrievalRequest, target: &Path) -> Result<u64> {
            self.calls.set(self.calls.get() + 1);
            fs::write(target, b"nc")?;
            Ok(2)
        }
    }

    fn request() -> RetrievalRequest {
        RetrievalRequest::surface("2008-01-01/2008-01-31", "51.75/-116.5/51.0/-115.5")
    }

    #[test]
    fn persistent_failure_is_attempted_exactly_ten_times() {
        let client = AlwaysFails { calls: Cell::new(0) };
        let dir = tempfile::tempdir().unwrap();

        let outcome = download_month(&client, &request(), &dir.path().join("x.nc"));

        assert_eq!(outcome, MonthOutcome::Failed { attempts: 10 });
        assert_eq!(client.calls.get(), 10);
    }

    #[test]
    fn first_success_stops_retrying() {
        let client = WritesStub { calls: Cell::new(0) };
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ERA5_surface_200801.nc");

        let outcome = download_month(&client, &request(), &target);

        assert_eq!(outcome, MonthOutcome::Downloaded { bytes: 2, attempts: 1 });
        assert_eq!(client.calls.get(), 1);
        assert!(target.exists());
    }

    #[test]
    fn rerun_skips_months_already_on_disk() {
        let client = WritesStub { calls: Cell::new(0) };
        let dir = tempfile::tempdir().unwrap();
        let years = YearRange::new(2008, 2008).unwrap();
        let area = BoundingBox::new(51.75, -116.5, 51.0, -115.5).unwrap();

        fs::write(dir.path().join("ERA5_surface_200803.nc"), b"partial run").unwrap();

        let summary = download_months(&client, dir.path(), years, &area).unwrap();

        assert_eq!(summary.results.len(), 12);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.downloaded(), 11);
        assert_eq!(summary.failed(), 0);
        assert_eq!(client.calls.get(), 11);

        let march = Month::new(2008, 3).unwrap();
        let outcome = summary
            .results
            .iter()
            .find(|(m, _)| *m == march)
            .map(|(_, o)| *o);
        assert_eq!(outcome, Some(MonthOutcome::Skipped));

        // The pre-existing file is left untouched.
        assert_eq!(
            fs::read(dir.path().join("ERA5_surface_200803.nc")).unwrap(),
            b"partial run"
        );
    }

    #[test]
    fn failed_months_do_not_stop_the_run() {
        let client = AlwaysFails { calls: Cell::new(0) };
        let dir = tempfile::tempdir().unwrap();
        let years = YearRange::new(2008, 2008).unwrap();
        let area = BoundingBox::new(51.75, -116.5, 51.0, -115.5).unwrap();

        let summary = download_months(&client, dir.path(), years, &area).unwrap();

        assert_eq!(summary.failed(), 12);
        assert_eq!(client.calls.get(), 12 * MAX_ATTEMPTS);
    }

    #[test]
    fn target_names_are_zero_padded() {
        assert_eq!(
            target_file_name(&Month::new(2008, 2).unwrap()),
            "ERA5_surface_200802.nc"
        );
        assert_eq!(
            target_file_name(&Month::new(2013, 12).unwrap()),
            "ERA5_surface_201312.nc"
        );
    }
}
