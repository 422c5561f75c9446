pub mod states;
pub mod params;
pub mod error;
pub mod forces;
pub mod derivative;
pub mod tableau;
pub mod integrator;
pub mod trajectory;
pub mod diagnostics;
pub mod scenario;
