use std::env;
use std::path::Path;
use std::process::ExitCode;

use log::{error, info};

use era5_forcing::{download, provenance, CdsClient, ClientOptions, Config, RunSummary};

fn main() -> ExitCode {
    pretty_env_logger::init();

    let Some(control) = env::args().nth(1) else {
        eprintln!(
            "Usage:\n  era5-forcing <control-file>\n\nAll behaviour is driven by the control file (`name | value` lines):\n  forcing_raw_path  | default            # or an explicit directory\n  forcing_raw_time  | 2008,2013          # start,end year\n  forcing_raw_space | 51.74/-116.55/51.05/-115.52\n\nCDS credentials come from CDSAPI_URL/CDSAPI_KEY or ~/.cdsapirc."
        );
        return ExitCode::from(2);
    };

    match run(Path::new(&control)) {
        Ok(summary) if summary.failed() == 0 => ExitCode::SUCCESS,
        Ok(summary) => {
            error!("{} month(s) could not be downloaded", summary.failed());
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(control: &Path) -> era5_forcing::Result<RunSummary> {
    let config = Config::from_file(control)?;

    let area = config.bounding_box.snap_to_grid();
    info!("bounding box {} snapped to {area}", config.bounding_box);
    info!(
        "downloading years {}-{} into {}",
        config.years.start(),
        config.years.end(),
        config.forcing_path.display()
    );

    let client = CdsClient::new(ClientOptions::from_env()?)?;
    let summary = download::download_months(&client, &config.forcing_path, config.years, &area)?;

    let log_path =
        provenance::write_run_log(&config.forcing_path, control, &area, config.years, &summary)?;
    info!("run log written to {}", log_path.display());
    info!(
        "{} downloaded, {} skipped, {} failed",
        summary.downloaded(),
        summary.skipped(),
        summary.failed()
    );

    Ok(summary)
}
