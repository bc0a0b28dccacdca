use nalgebra::Vector3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FourMomentum {
    pub e: f64,
    pub px: f64,
    pub py: f64,
    pub pz: f64,
}

impl FourMomentum {
    //! A four-momentum structure with the angular derivations written to the event tuple.
    //!
    //! This is the basic structure of a Lorentz four-vector
    //! of the form $`(E, \overrightarrow{p})`$ where $E$ is the energy and $`\overrightarrow{p}`$ is the
    //! momentum.
    //!
    //! # Examples
    //! ```
    //! use evtflat::prelude::*;
    //!
    //! let p4 = FourMomentum::new(10.0, 3.0, 4.0, 1.0);
    //! assert_eq!(p4.perp(), 5.0);
    //! ```

    pub fn new(e: f64, px: f64, py: f64, pz: f64) -> Self {
        //! Create a new [`FourMomentum`] from energy and momentum components.
        //!
        //! Components are listed in the order $` (E, p_x, p_y, p_z) `$
        Self { e, px, py, pz }
    }

    pub fn from_parts(e: f64, p: [f64; 3]) -> Self {
        //! Create a new [`FourMomentum`] from an energy and a 3-momentum array, the layout used by
        //! the event model.
        Self::new(e, p[0], p[1], p[2])
    }

    pub fn momentum(&self) -> Vector3<f64> {
        //! Extract the 3-momentum as a [`nalgebra::Vector3<f64>`]
        //!
        //! # Examples
        //! ```
        //! use evtflat::prelude::*;
        //! use nalgebra::Vector3;
        //!
        //! let p4 = FourMomentum::new(20.0, 1.0, 0.2, -0.1);
        //! assert_eq!(p4.momentum(), Vector3::new(1.0, 0.2, -0.1));
        //! ```
        Vector3::new(self.px, self.py, self.pz)
    }

    pub fn perp(&self) -> f64 {
        //! Transverse momentum $` p_T = \sqrt{p_x^2 + p_y^2} `$
        self.momentum().xy().norm()
    }

    pub fn phi(&self) -> f64 {
        //! Azimuthal angle $` \phi = \mathrm{atan2}(p_y, p_x) `$ in $`(-\pi, \pi]`$.
        //!
        //! A momentum along the beam axis gives $`\phi = 0`$.
        self.py.atan2(self.px)
    }

    pub fn tuple_theta(&self) -> f64 {
        //! The polar angle as stored in the `evtdata` tuple: $` \arctan(p_T / p_z) `$.
        //!
        //! This is not the quadrant-correct polar angle. Backward-going momenta ($`p_z < 0`$)
        //! give negative values in $`(-\pi/2, 0)`$, $`p_z = 0`$ gives $`\pi/2`$, and a null
        //! momentum gives NaN. Analyses built on the tuple depend on this convention, so it is
        //! kept as is.
        (self.perp() / self.pz).atan()
    }
}
