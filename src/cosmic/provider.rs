/*
    Radiocc, radio occultation analysis
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{
    solar_longitude_deg, EphemerisAlmanacSnafu, EphemerisError, EphemerisPhysicsSnafu,
    KernelLoadSnafu, LinkGeometry,
};
use crate::io::ConfigRepr;
use crate::linalg::Vector3;
use crate::time::Epoch;
use anise::astro::Aberration;
use anise::constants::celestial_objects::{EARTH, MARS, SUN};
use anise::constants::orientations::{IAU_MARS, J2000};
use anise::prelude::{Almanac, Frame, Orbit};
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// The source of the link geometry, typically a set of SPICE kernels.
///
/// Implementations must report an error, and never extrapolate, when the epoch is outside of the loaded data.
/// The detector calls this from several threads, hence the `Send + Sync` bound.
pub trait EphemerisProvider: Send + Sync {
    /// Returns the link geometry at the provided epoch, in the body-fixed frame of the occulting planet.
    fn link_geometry(&self, epoch: Epoch) -> Result<LinkGeometry, EphemerisError>;

    /// Returns the planetocentric solar longitude (Ls) of the occulting planet at the provided epoch, in degrees.
    fn solar_longitude_deg(&self, epoch: Epoch) -> Result<f64, EphemerisError>;
}

/// Identifiers of the bodies and frames involved in the link, and the corrections to apply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct GeometryConfig {
    /// NAIF ID of the transmitter, defaults to the ExoMars TGO high gain antenna
    #[builder(default = -143025)]
    pub spacecraft_id: i32,
    /// NAIF ID of the occulting planet, defaults to Mars
    #[builder(default = MARS)]
    pub planet_id: i32,
    /// NAIF ID of the body-fixed orientation of the occulting planet, defaults to IAU Mars
    #[builder(default = IAU_MARS)]
    pub planet_orientation_id: i32,
    /// NAIF ID of the receiver, defaults to the Earth
    #[builder(default = EARTH)]
    pub receiver_id: i32,
    /// Radius of the reference sphere of the occulting planet in km
    #[builder(default = 3397.515)]
    pub planet_radius_km: f64,
    /// Aberration correction applied to the link, in SPICE notation
    #[builder(default = "CN+S".to_string())]
    pub aberration: String,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for GeometryConfig {}

/// Ephemeris provider backed by an ANISE almanac loaded with SPICE kernels.
#[derive(Clone)]
pub struct AlmanacProvider {
    pub almanac: Arc<Almanac>,
    pub spacecraft: Frame,
    pub receiver: Frame,
    pub planet_fixed: Frame,
    pub planet_inertial: Frame,
    pub sun: Frame,
    pub planet_radius_km: f64,
    pub ab_corr: Option<Aberration>,
}

impl AlmanacProvider {
    /// Builds the provider from the configuration, the almanac must already include all of the required kernels.
    pub fn new(almanac: Arc<Almanac>, cfg: &GeometryConfig) -> Result<Self, EphemerisError> {
        let ab_corr = Aberration::new(&cfg.aberration).context(EphemerisPhysicsSnafu {
            action: "parsing the aberration correction",
        })?;

        Ok(Self {
            almanac,
            spacecraft: Frame::new(cfg.spacecraft_id, J2000),
            receiver: Frame::new(cfg.receiver_id, J2000),
            planet_fixed: Frame::new(cfg.planet_id, cfg.planet_orientation_id),
            planet_inertial: Frame::new(cfg.planet_id, J2000),
            sun: Frame::new(SUN, J2000),
            planet_radius_km: cfg.planet_radius_km,
            ab_corr,
        })
    }

    /// Loads all of the provided kernels in order and builds the provider.
    pub fn from_kernels<P: AsRef<std::path::Path>>(
        kernels: &[P],
        cfg: &GeometryConfig,
    ) -> Result<Self, EphemerisError> {
        let mut almanac = Almanac::default();
        for kernel in kernels {
            let path = kernel.as_ref().to_string_lossy().to_string();
            almanac = almanac.load(&path).context(KernelLoadSnafu { path: path.clone() })?;
            info!("loaded {path}");
        }
        Self::new(Arc::new(almanac), cfg)
    }

    /// Position of the target with respect to the planet center, in the planet body-fixed frame.
    fn body_fixed_position(
        &self,
        target: Frame,
        epoch: Epoch,
        ab_corr: Option<Aberration>,
        action: &'static str,
    ) -> Result<Vector3<f64>, EphemerisError> {
        Ok(self
            .almanac
            .transform(target, self.planet_fixed, epoch, ab_corr)
            .context(EphemerisAlmanacSnafu { action, epoch })?
            .radius_km)
    }
}

impl EphemerisProvider for AlmanacProvider {
    fn link_geometry(&self, epoch: Epoch) -> Result<LinkGeometry, EphemerisError> {
        let spacecraft_km =
            self.body_fixed_position(self.spacecraft, epoch, None, "computing spacecraft position")?;

        // The receiver is seen from the spacecraft, so the light time corrections apply to the receiver position only.
        let receiver_from_sc = self
            .almanac
            .transform(self.receiver, self.spacecraft, epoch, self.ab_corr)
            .context(EphemerisAlmanacSnafu {
                action: "computing receiver position",
                epoch,
            })?;
        let receiver_from_sc = self
            .almanac
            .transform_to(
                receiver_from_sc,
                self.planet_fixed.with_ephem(self.spacecraft.ephemeris_id),
                None,
            )
            .context(EphemerisAlmanacSnafu {
                action: "rotating receiver position",
                epoch,
            })?;

        let sun_km = self.body_fixed_position(self.sun, epoch, None, "computing Sun position")?;

        Ok(LinkGeometry {
            epoch,
            spacecraft_km,
            receiver_km: spacecraft_km + receiver_from_sc.radius_km,
            sun_km,
            planet_radius_km: self.planet_radius_km,
        })
    }

    fn solar_longitude_deg(&self, epoch: Epoch) -> Result<f64, EphemerisError> {
        let planet = self
            .almanac
            .transform(self.planet_inertial, self.sun, epoch, Aberration::LT_S)
            .context(EphemerisAlmanacSnafu {
                action: "computing heliocentric planet state",
                epoch,
            })?;

        // Rotate the body-fixed Z axis into the inertial frame to get the north pole.
        let pole_fixed = Orbit::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0, epoch, self.planet_fixed);
        let pole = self
            .almanac
            .transform_to(pole_fixed, self.planet_inertial, None)
            .context(EphemerisAlmanacSnafu {
                action: "rotating planet pole",
                epoch,
            })?
            .radius_km;

        Ok(solar_longitude_deg(
            &planet.radius_km,
            &planet.velocity_km_s,
            &pole,
        ))
    }
}

impl fmt::Display for AlmanacProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "link {} -> {} occulted by {} (R = {} km)",
            self.spacecraft, self.receiver, self.planet_fixed, self.planet_radius_km
        )
    }
}
