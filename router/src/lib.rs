pub mod algo;
pub mod check;
pub mod error;
pub mod grid;
pub mod net;
pub mod ripup;
pub mod router;
pub mod utils;

use pcb_common::db::core::BoardDB;
use pcb_common::util::config::RoutingConfig;

pub use check::CheckReport;
pub use error::{Result, RouterError};
pub use router::{GridBasedRouter, SolutionSummary};

/// Routes every net on `db`, verifies the best solution and writes it back
/// onto `db`. The verification report is returned for the caller to act on.
pub fn route(db: &mut BoardDB, config: &RoutingConfig) -> Result<(SolutionSummary, CheckReport)> {
    let mut router = GridBasedRouter::new(db, config.clone())?;
    let summary = router.route_all_net_with_ripup_and_reroute()?;
    let report = check::run(router.best_solution());
    router.write_solution_back(db);
    Ok((summary, report))
}
