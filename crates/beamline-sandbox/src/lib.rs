//! Firing range for Beamline weapons: concrete collaborators, a minimal
//! weapon base, and TOML scenarios that drive them.

pub mod bodies;
pub mod explosions;
pub mod range;
pub mod scenario;
pub mod shields;
pub mod teams;
pub mod turret;
