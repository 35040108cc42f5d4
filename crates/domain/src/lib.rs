//! Pure data model: rule AST, world graph, inventory, mutable state and the
//! wire-shaped snapshot derived from them. No I/O, no async, no knowledge of
//! the worker/proxy machinery that sits on top of it.

pub mod error;
pub mod ids;
pub mod inventory;
pub mod item;
pub mod region;
pub mod rule;
pub mod snapshot;
pub mod state;
pub mod static_data;

pub use error::{LoadError, UnknownName};
pub use ids::{DungeonName, ExitName, GroupName, ItemName, LocationName, PlayerId, RegionName};
pub use inventory::{Inventory, ResolvedItem};
pub use item::{Item, ProgressionEntry, ProgressionMapping};
pub use region::{Dungeon, Exit, ItemRef, Location, Region};
pub use rule::{CompareOp, Resolvable, Rule, Value};
pub use snapshot::{SavableState, Snapshot};
pub use state::{CheckedLocations, ReachabilityStatus, SettingValue, State};
pub use static_data::StaticData;
