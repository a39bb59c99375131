mod centering;
mod group;
mod wyckoff;

pub use centering::{Centering, Linear};
pub use group::{crystal_system_1d, crystal_system_2d, crystal_system_3d, CrystalSystem, Dim, UniqueAxis};
pub use wyckoff::{organize_by_multiplicity, parse_operation, WyckoffPosition};
