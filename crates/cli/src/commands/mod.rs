//! CLI command implementations, one module per subcommand.

mod describe;
mod helpers;
mod partition;
mod query;
mod run;

pub use describe::{describe, list_queries};
pub use partition::partition;
pub use query::{query, QueryTarget};
pub use run::run;
