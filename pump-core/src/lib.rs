//! Kernel Pump: primal heuristics for mixed-integer programs.
//!
//! Given a MIP whose continuous relaxation an LP backend can handle, this
//! crate tries to produce an integer feasible solution quickly. Two
//! heuristics are provided:
//!
//! - **Feasibility pump**: alternate between solving a distance-blended LP
//!   and rounding its solution toward integrality, with stall perturbation
//!   and cycle restarts.
//! - **Kernel pump**: order the binary variables by their root relaxation
//!   values into a small active *kernel* plus ordered *buckets*, activate
//!   buckets incrementally, and run the feasibility pump on each sub-model
//!   while tracking the closest fractional point across sub-runs.
//!
//! The backend is reached through the [`model::MipModel`] facade; a dense
//! simplex implementation ([`model::SimplexModel`]) is built in.
//!
//! # Example
//!
//! ```
//! use pump_core::model::{share, ModelBuilder, RowSense, SimplexModel, VarType};
//! use pump_core::pump::KernelPump;
//! use pump_core::settings::KpSettings;
//!
//! // min x + y  s.t.  x + y >= 1,  x, y binary
//! let mut builder = ModelBuilder::new("example");
//! let x = builder.add_col("x", VarType::Binary, 0.0, 1.0, 1.0);
//! let y = builder.add_col("y", VarType::Binary, 0.0, 1.0, 1.0);
//! builder.add_row("cover", &[(x, 1.0), (y, 1.0)], RowSense::Ge, 1.0, 0.0);
//! let model = share(SimplexModel::new(builder.build().unwrap()));
//!
//! let mut kp = KernelPump::new(KpSettings::default().with_time_limit(10.0));
//! if kp.init(model).unwrap() {
//!     kp.run().unwrap();
//! }
//! assert!(kp.found_solution());
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod model;
pub mod pump;
pub mod round;
pub mod settings;
pub mod solution;
pub mod util;

pub use error::{PumpError, PumpResult};
pub use model::{
    share, AbortFlag, BackendSettings, LpMethod, MipModel, ModelBuilder, ModelData, ModelHandle,
    ObjSense, RowSense, SimplexModel, SolveStatus, VarType,
};
pub use pump::{FeasibilityPump, FpStats, KernelPump, KpStats, PumpOutcome};
pub use settings::{FpSettings, KernelObjective, KpSettings, RankerKind, RounderKind};
pub use solution::Solution;
