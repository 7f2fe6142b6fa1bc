//! Paramètres d'ellipsoïde

/// Ellipsoïde de référence défini par son demi-grand axe et son inverse d'aplatissement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub a: f64,
    /// Inverse de l'aplatissement
    pub inv_f: f64,
}

/// Ellipsoïde WGS84
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6378137.0,
    inv_f: 298.257223563,
};

impl Ellipsoid {
    /// Aplatissement
    pub fn f(&self) -> f64 {
        1.0 / self.inv_f
    }

    /// Première excentricité au carré
    pub fn e2(&self) -> f64 {
        let f = self.f();
        2.0 * f - f * f
    }

    /// Deuxième excentricité au carré
    pub fn ep2(&self) -> f64 {
        let e2 = self.e2();
        e2 / (1.0 - e2)
    }

    /// Grande normale au point de latitude `phi` (radians)
    pub fn prime_vertical_radius(&self, phi: f64) -> f64 {
        self.a / (1.0 - self.e2() * phi.sin().powi(2)).sqrt()
    }

    /// Longueur de l'arc de méridien de l'équateur à la latitude `phi` (radians)
    pub fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }
}
