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

/// Returns the provided angle bounded between 0.0 and 360.0
pub fn between_0_360(angle: f64) -> f64 {
    let mut bounded = angle % 360.0;
    if bounded < 0.0 {
        bounded += 360.0;
    }
    bounded
}

/// Returns the planetocentric latitude and longitude in degrees of the provided body-fixed vector.
/// Longitude is within [-180, 180], as SPICE's `reclat` returns it. A null vector has a null latitude and longitude.
pub fn latlong_deg(v: &Vector3<f64>) -> (f64, f64) {
    let norm = v.norm();
    if norm < f64::EPSILON {
        return (0.0, 0.0);
    }
    let lat = (v.z / norm).clamp(-1.0, 1.0).asin().to_degrees();
    let long = v.y.atan2(v.x).to_degrees();
    (lat, long)
}
