//! Build orchestration
//!
//! Drives one build through fingerprinting, the cache decision, the
//! external build tool and replacement of the application root.

pub mod executor;
pub mod orchestrator;
pub mod plan;
pub mod replace;
pub mod toolchain;

pub use executor::{Executor, SystemExecutor};
pub use orchestrator::{BuildOrchestrator, BuildOutcome, BuildRequest, OrchestratorConfig};
pub use plan::{BuildPlan, BuildTool};
pub use replace::replace_contents;
pub use toolchain::ToolchainSource;
