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

use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::utils::{between_0_360, latlong_deg};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of the radio link geometry at a given epoch.
///
/// All of the vectors are expressed in the body-fixed frame of the occulting planet and are centered on that planet.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinkGeometry {
    pub epoch: Epoch,
    /// Position of the spacecraft, in km
    pub spacecraft_km: Vector3<f64>,
    /// Position of the receiver (Earth), in km
    pub receiver_km: Vector3<f64>,
    /// Position of the Sun, in km
    pub sun_km: Vector3<f64>,
    /// Radius of the reference sphere of the occulting planet, in km
    pub planet_radius_km: f64,
}

impl LinkGeometry {
    /// Angular radius of the planet as seen from the spacecraft, in radians.
    /// If the spacecraft is below the reference sphere, the planet fills half the sky.
    pub fn angular_radius_rad(&self) -> f64 {
        let dist_km = self.spacecraft_km.norm();
        if dist_km <= self.planet_radius_km {
            std::f64::consts::FRAC_PI_2
        } else {
            (self.planet_radius_km / dist_km).asin()
        }
    }

    /// Angular separation between the direction to the receiver and the direction to the planet center, seen from the spacecraft, in radians.
    pub fn receiver_separation_rad(&self) -> f64 {
        let to_receiver = self.receiver_km - self.spacecraft_km;
        let to_planet = -self.spacecraft_km;
        to_receiver.angle(&to_planet)
    }

    /// Limb separation of the receiver, in radians: negative when the planet blocks the line of sight.
    ///
    /// This is the signal whose zero crossings are the occultation ingress and egress.
    pub fn limb_separation_rad(&self) -> f64 {
        self.receiver_separation_rad() - self.angular_radius_rad()
    }

    /// Returns whether the line of sight between the spacecraft and the receiver is blocked by the planet.
    pub fn is_occulted(&self) -> bool {
        self.limb_separation_rad() < 0.0
    }

    /// Point of the spacecraft to receiver ray which is the closest to the planet center, in km.
    /// If the receiver is behind the spacecraft as seen from the planet, this is the spacecraft position itself.
    pub fn ray_closest_point_km(&self) -> Vector3<f64> {
        let los = self.receiver_km - self.spacecraft_km;
        let los_norm = los.norm();
        if los_norm < f64::EPSILON {
            return self.spacecraft_km;
        }
        let u = los / los_norm;
        let t = (-self.spacecraft_km.dot(&u)).max(0.0);
        self.spacecraft_km + u * t
    }

    /// Impact parameter of the ray, i.e. the distance between the planet center and the ray, in km.
    pub fn impact_parameter_km(&self) -> f64 {
        self.ray_closest_point_km().norm()
    }

    /// Computes the tangent point of the link: its planetocentric coordinates, altitude and solar zenith angle.
    pub fn tangent_point(&self) -> TangentPoint {
        let closest = self.ray_closest_point_km();
        let (latitude_deg, longitude_deg) = latlong_deg(&closest);
        let sza_deg = if closest.norm() < f64::EPSILON {
            0.0
        } else {
            self.sun_km.angle(&closest).to_degrees()
        };
        TangentPoint {
            latitude_deg,
            longitude_deg,
            altitude_km: closest.norm() - self.planet_radius_km,
            sza_deg,
        }
    }
}

impl fmt::Display for LinkGeometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: limb separation = {:.6} deg\timpact parameter = {:.3} km",
            self.epoch,
            self.limb_separation_rad().to_degrees(),
            self.impact_parameter_km()
        )
    }
}

/// Point on the planet surface nearest to the signal path.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TangentPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Height of the ray above the reference sphere, negative when occulted
    pub altitude_km: f64,
    /// Solar zenith angle at the tangent point
    pub sza_deg: f64,
}

/// Computes the planetocentric solar longitude (Ls) in degrees.
///
/// The reference direction is the ascending node of the planet's orbit on its equator (the vernal equinox),
/// and the angle of the Sun is measured in the orbital plane in the sense of the orbital motion.
///
/// + `planet_pos_km` and `planet_vel_km_s` are the planet state with respect to the Sun in an inertial frame,
/// + `pole` is the north pole of the planet expressed in that same frame.
pub fn solar_longitude_deg(
    planet_pos_km: &Vector3<f64>,
    planet_vel_km_s: &Vector3<f64>,
    pole: &Vector3<f64>,
) -> f64 {
    let h = planet_pos_km.cross(planet_vel_km_s);
    let equinox = pole.cross(&h);
    if h.norm() < f64::EPSILON || equinox.norm() < f64::EPSILON {
        warn!("solar longitude undefined for a null angular momentum or an equator in the orbital plane");
        return 0.0;
    }
    let x_hat = equinox.normalize();
    let y_hat = h.normalize().cross(&x_hat);
    let sun_dir = -planet_pos_km;
    between_0_360(sun_dir.dot(&y_hat).atan2(sun_dir.dot(&x_hat)).to_degrees())
}
