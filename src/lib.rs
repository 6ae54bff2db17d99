#![forbid(unsafe_code)]

//! Batch downloader for ERA5 surface-level forcing data.
//!
//! The crate drives the Copernicus Climate Data Store (CDS) one calendar
//! month at a time: a pipe-delimited control file names the output folder,
//! the year range, and a geographic bounding box; the box is snapped outward
//! to the dataset's 0.25-degree grid; each month is retrieved into
//! `ERA5_surface_<yyyymm>.nc` with a fixed retry budget, skipping files that
//! already exist so interrupted runs can simply be re-run; a dated
//! provenance log records what was fetched.
//!
//! **Quick start**
//! ```no_run
//! use std::path::Path;
//!
//! use era5_forcing::{download, provenance, CdsClient, ClientOptions, Config};
//!
//! let control = Path::new("control_active.txt");
//! let config = Config::from_file(control)?;
//! let area = config.bounding_box.snap_to_grid();
//!
//! let client = CdsClient::new(ClientOptions::from_env()?)?;
//! let summary = download::download_months(&client, &config.forcing_path, config.years, &area)?;
//! provenance::write_run_log(&config.forcing_path, control, &area, config.years, &summary)?;
//!
//! println!(
//!     "{} downloaded, {} skipped, {} failed",
//!     summary.downloaded(),
//!     summary.skipped(),
//!     summary.failed()
//! );
//! # Ok::<(), era5_forcing::Error>(())
//! ```
//!
//! Notes:
//! - Credentials come from `CDSAPI_URL`/`CDSAPI_KEY` or `~/.cdsapirc`.
//! - Downloads are governed by the Copernicus licence terms; retrievals can
//!   queue on the service side for a while before they complete.

pub mod client;
pub mod config;
pub mod date;
pub mod download;
pub mod error;
pub mod grid;
pub mod provenance;
pub mod request;

pub use crate::client::{CdsClient, ClientOptions, Retrieve};
pub use crate::config::Config;
pub use crate::date::{Month, YearRange};
pub use crate::download::{MonthOutcome, RunSummary};
pub use crate::error::{Error, Result};
pub use crate::grid::BoundingBox;
pub use crate::request::RetrievalRequest;
