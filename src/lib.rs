//! StreamForge sync engine: polls the metrics API on fixed per-view
//! intervals and maintains authenticated, sequence-guarded snapshots for the
//! dashboard's six views.

pub mod api;
pub mod format;
pub mod guard;
pub mod logging;
pub mod state;
pub mod sync;
pub mod views;
