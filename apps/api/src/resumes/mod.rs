// Resume save/load and export endpoints.
// Persistence goes through `store::ResumeStore`; export through `export::ExportDispatcher`.

pub mod handlers;
pub mod store;
