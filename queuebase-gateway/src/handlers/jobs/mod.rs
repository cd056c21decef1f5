mod invoke;
mod list;

pub use invoke::invoke_job;
pub use list::list_jobs;
