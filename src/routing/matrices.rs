//! Distance and travel-time matrices (§4.3a): haversine great-circle distance in
//! meters and a derived travel-time grid in minutes, given a uniform average speed.

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance between two WGS-84 coordinates, in meters.
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// `N x N` distance matrix in whole meters; symmetric, zero diagonal by construction.
pub fn distance_matrix(nodes: &[Coordinate]) -> Vec<Vec<u32>> {
    let n = nodes.len();
    let mut matrix = vec![vec![0u32; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let meters = haversine_meters(nodes[i], nodes[j]).round() as u32;
            matrix[i][j] = meters;
            matrix[j][i] = meters;
        }
    }
    matrix
}

/// Travel-time matrix in whole minutes, derived from distance and a fleet-average speed.
pub fn time_matrix(distances: &[Vec<u32>], average_speed_kmh: f64) -> Vec<Vec<u32>> {
    let meters_per_minute = average_speed_kmh * 1000.0 / 60.0;
    distances
        .iter()
        .map(|row| {
            row.iter()
                .map(|&meters| (meters as f64 / meters_per_minute).round() as u32)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_is_symmetric_and_zero_on_diagonal() {
        let taipei = Coordinate {
            latitude: 25.0330,
            longitude: 121.5654,
        };
        let other = Coordinate {
            latitude: 25.0478,
            longitude: 121.5170,
        };
        assert_eq!(haversine_meters(taipei, taipei), 0.0);
        let a_to_b = haversine_meters(taipei, other);
        let b_to_a = haversine_meters(other, taipei);
        assert!((a_to_b - b_to_a).abs() < 1e-9);
        assert!(a_to_b > 0.0);
    }

    #[test]
    fn distance_matrix_is_symmetric_with_zero_diagonal() {
        let nodes = vec![
            Coordinate {
                latitude: 25.0330,
                longitude: 121.5654,
            },
            Coordinate {
                latitude: 25.0478,
                longitude: 121.5170,
            },
            Coordinate {
                latitude: 25.0200,
                longitude: 121.5400,
            },
        ];
        let matrix = distance_matrix(&nodes);
        for i in 0..nodes.len() {
            assert_eq!(matrix[i][i], 0);
            for j in 0..nodes.len() {
                assert_eq!(matrix[i][j], matrix[j][i]);
            }
        }
    }

    #[test]
    fn time_matrix_scales_inversely_with_speed() {
        let distances = vec![vec![0, 30_000], vec![30_000, 0]];
        let slow = time_matrix(&distances, 30.0);
        let fast = time_matrix(&distances, 60.0);
        assert_eq!(slow[0][1], 60);
        assert_eq!(fast[0][1], 30);
    }

    #[test]
    fn known_distance_is_within_tolerance_of_a_reference_value() {
        // Two points ~1 degree of latitude apart are ~111.19 km apart.
        let a = Coordinate {
            latitude: 0.0,
            longitude: 0.0,
        };
        let b = Coordinate {
            latitude: 1.0,
            longitude: 0.0,
        };
        let meters = haversine_meters(a, b);
        assert!((meters - 111_195.0).abs() < 500.0);
    }
}
