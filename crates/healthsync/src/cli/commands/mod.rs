pub mod summary;
pub mod sync;
pub mod workouts;

pub use summary::show as show_summary;
pub use sync::{run as sync_run, status as sync_status};
pub use workouts::list as list_workouts;
