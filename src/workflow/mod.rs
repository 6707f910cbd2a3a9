pub mod convergence;
pub mod task_ctx;
pub mod task_flow;

pub use convergence::{Converged, ConvergenceLoop, LoopOutcome, Refiner, Verdict};
pub use task_ctx::TaskCtx;
pub use task_flow::{TaskFlow, TaskReport, TaskStatus};
