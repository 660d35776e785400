//! # Micromouse navigation library.
//!
//! The real-time navigation core of the mouse: feedback controllers, range
//! sensor fusion, the forward-move and rotate-in-place maneuvers, and the
//! compact maze map those maneuvers ultimately populate.
//!
//! Hardware is reached only through the traits in [`hal`] and [`clock`], so
//! the whole core runs against the simulated hardware in [`sim`] on a host.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Clock - monotonic time source, timers and blocking delays
pub mod clock;

/// Hardware abstraction - traits for the drive, range sensor and cancel collaborators
pub mod hal;

/// Maze map - bit-packed grid of wall flags
pub mod maze_map;

/// Motion control - forward-move and rotate-in-place maneuvers
pub mod motion_ctrl;

/// PID controller - the feedback corrector shared by all the control loops
pub mod pid;

/// Sensor fusion - turns raw range samples into distances, rates and wall flags
pub mod sensor_fusion;

/// Simulated hardware - host-side implementations of the hardware traits
pub mod sim;
