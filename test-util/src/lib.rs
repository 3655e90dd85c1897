pub use synthetic::{
    JumpFixture, OuParameters, ou_series, photometric_flux, step_series, SINGLE_JUMP_SERIES,
    SMOOTH_SERIES,
};

mod synthetic;
