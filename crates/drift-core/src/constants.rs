//! Physical constants in cgs units.

/// Immutable set of physical constants.
///
/// Passed explicitly to configuration and physics collaborators instead of
/// being read from global state. [`Constants::CGS`] holds the standard
/// values; tests may construct scaled variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constants {
    /// Astronomical unit \[cm\].
    pub au: f64,
    /// Julian year \[s\].
    pub year: f64,
    /// Solar mass \[g\].
    pub m_sun: f64,
    /// Gravitational constant \[cm³ g⁻¹ s⁻²\].
    pub g: f64,
    /// Boltzmann constant \[erg K⁻¹\].
    pub k_b: f64,
    /// Proton mass \[g\].
    pub m_p: f64,
}

impl Constants {
    /// Standard cgs values.
    pub const CGS: Constants = Constants {
        au: 1.495_978_707e13,
        year: 3.155_76e7,
        m_sun: 1.988_409_87e33,
        g: 6.674_30e-8,
        k_b: 1.380_649e-16,
        m_p: 1.672_621_924e-24,
    };
}

impl Default for Constants {
    fn default() -> Self {
        Self::CGS
    }
}
