//! mode_finder::builders — L-BFGS solver construction.
//!
//! One generic constructor takes any argmin line search; the history length
//! and tolerances come from [`ModeOptions`]. The start point and the
//! iteration cap are applied at run time by [`run_lbfgs`](super::run::run_lbfgs).
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};

use crate::optimization::{
    errors::OptResult,
    mode_finder::{
        traits::ModeOptions,
        types::{Cost, DEFAULT_LBFGS_MEM, Grad, Lbfgs, Theta},
    },
};

/// L-BFGS around `line_search`, with `opts.lbfgs_mem` (default
/// [`DEFAULT_LBFGS_MEM`]) and whichever tolerances `opts` sets.
///
/// # Errors
/// - `OptError::Solver` when argmin rejects a tolerance.
pub fn lbfgs_with<L>(line_search: L, opts: &ModeOptions) -> OptResult<Lbfgs<L>> {
    let mut solver = LBFGS::new(line_search, opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM));
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol)?;
    }
    Ok(solver)
}

pub fn hager_zhang(opts: &ModeOptions) -> OptResult<Lbfgs<HagerZhangLineSearch<Theta, Grad, Cost>>> {
    lbfgs_with(HagerZhangLineSearch::new(), opts)
}

pub fn more_thuente(opts: &ModeOptions) -> OptResult<Lbfgs<MoreThuenteLineSearch<Theta, Grad, Cost>>> {
    lbfgs_with(MoreThuenteLineSearch::new(), opts)
}
