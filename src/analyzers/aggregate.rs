use crate::analyzers::types::{DriverStats, LineStats};
use crate::analyzers::utility::{mean, sample_stddev};
use crate::segmenter::Trip;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Builds [`LineStats`] for every line in `valid_lines` that has at least one
/// trip with a defined consumption. Rows are ordered by line id.
///
/// The goal is `mean + std_multiplier * stddev`, falling back to the plain
/// mean when only one trip was observed.
pub fn aggregate_lines(
    trips: &[Trip],
    valid_lines: &HashSet<&str>,
    std_multiplier: f64,
) -> Vec<LineStats> {
    let mut series: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for trip in trips {
        if !valid_lines.contains(trip.line_id.as_str()) {
            continue;
        }
        if let Some(consumption) = trip.avg_fuel_consumption {
            series.entry(trip.line_id.as_str()).or_default().push(consumption);
        }
    }

    series
        .into_iter()
        .filter_map(|(line_id, values)| {
            let avg = mean(&values)?;
            let sd = sample_stddev(&values, avg);

            Some(LineStats {
                line_id: line_id.to_string(),
                trip_count: values.len(),
                avg_fuel_consumption: avg,
                stddev: sd,
                goal: sd.map_or(avg, |sd| avg + std_multiplier * sd),
            })
        })
        .collect()
}

/// Summarizes `trips` per driver, across fleets, against `line_goals`.
///
/// Trips with an undefined consumption stay out of the consumption mean but
/// still contribute their line's goal. Trips whose line has no goal feed the
/// consumption mean only. `exceeds_goal` is absent only when no goal matched;
/// a driver with a goal but no defined consumption does not exceed it.
/// Output is sorted by driver id, descending.
pub fn aggregate_drivers(trips: &[Trip], line_goals: &HashMap<String, f64>) -> Vec<DriverStats> {
    let mut by_driver: BTreeMap<&str, Vec<&Trip>> = BTreeMap::new();
    for trip in trips {
        by_driver.entry(trip.driver_id.as_str()).or_default().push(trip);
    }

    by_driver
        .into_iter()
        .rev()
        .map(|(driver_id, driver_trips)| {
            let mut consumptions = Vec::new();
            let mut goals = Vec::new();

            for trip in &driver_trips {
                if let Some(consumption) = trip.avg_fuel_consumption {
                    consumptions.push(consumption);
                }
                if let Some(goal) = line_goals.get(&trip.line_id) {
                    goals.push(*goal);
                }
            }

            let avg_fuel_consumption = mean(&consumptions);
            let avg_fuel_consumption_goal = mean(&goals);
            let exceeds_goal = avg_fuel_consumption_goal
                .map(|goal| avg_fuel_consumption.is_some_and(|avg| avg > goal));

            DriverStats {
                driver_id: driver_id.to_string(),
                trip_count: driver_trips.len(),
                avg_fuel_consumption,
                avg_fuel_consumption_goal,
                exceeds_goal,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(driver: &str, line_id: &str, consumption: Option<f64>) -> Trip {
        Trip {
            fleet: "F1".to_string(),
            driver_id: driver.to_string(),
            line_id: line_id.to_string(),
            origin: line_id[..1].to_string(),
            destination: line_id[1..].to_string(),
            distance_km: 0.0,
            fuel_liters: 0.0,
            record_count: 1,
            avg_fuel_consumption: consumption,
        }
    }

    fn goals(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_aggregate_lines_single_trip_goal_is_mean() {
        let valid: HashSet<&str> = ["AB"].into_iter().collect();
        let lines = aggregate_lines(&[trip("D1", "AB", Some(4.0))], &valid, 3.0);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].stddev, None);
        assert_eq!(lines[0].goal, 4.0);
    }

    #[test]
    fn test_aggregate_lines_goal_with_stddev() {
        let valid: HashSet<&str> = ["AB"].into_iter().collect();
        let trips = vec![
            trip("D1", "AB", Some(1.0)),
            trip("D2", "AB", Some(3.0)),
            trip("D3", "AB", Some(5.0)),
        ];
        let lines = aggregate_lines(&trips, &valid, 0.5);

        assert_eq!(lines[0].trip_count, 3);
        assert_eq!(lines[0].avg_fuel_consumption, 3.0);
        assert_eq!(lines[0].stddev, Some(2.0));
        assert_eq!(lines[0].goal, 4.0);
    }

    #[test]
    fn test_aggregate_lines_ignores_undefined_consumption() {
        let valid: HashSet<&str> = ["AB", "BC"].into_iter().collect();
        let trips = vec![
            trip("D1", "AB", None),
            trip("D1", "AB", Some(6.0)),
            trip("D1", "BC", None),
        ];
        let lines = aggregate_lines(&trips, &valid, 1.0);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_id, "AB");
        assert_eq!(lines[0].trip_count, 1);
        assert_eq!(lines[0].goal, 6.0);
    }

    #[test]
    fn test_aggregate_drivers_sorted_descending() {
        let trips = vec![
            trip("111", "AB", Some(1.0)),
            trip("333", "AB", Some(1.0)),
            trip("222", "AB", Some(1.0)),
        ];
        let stats = aggregate_drivers(&trips, &HashMap::new());
        let ids: Vec<_> = stats.iter().map(|s| s.driver_id.as_str()).collect();

        assert_eq!(ids, vec!["333", "222", "111"]);
    }

    #[test]
    fn test_aggregate_drivers_exceeds_goal() {
        let trips = vec![
            trip("D1", "AB", Some(6.0)),
            trip("D1", "BC", Some(4.0)),
            trip("D2", "AB", Some(2.0)),
        ];
        let stats = aggregate_drivers(&trips, &goals(&[("AB", 4.0), ("BC", 2.0)]));

        let d2 = &stats[0];
        assert_eq!(d2.driver_id, "D2");
        assert_eq!(d2.exceeds_goal, Some(false));

        let d1 = &stats[1];
        assert_eq!(d1.avg_fuel_consumption, Some(5.0));
        assert_eq!(d1.avg_fuel_consumption_goal, Some(3.0));
        assert_eq!(d1.exceeds_goal, Some(true));
    }

    #[test]
    fn test_aggregate_drivers_equal_to_goal_does_not_exceed() {
        let stats = aggregate_drivers(&[trip("D1", "AB", Some(4.0))], &goals(&[("AB", 4.0)]));
        assert_eq!(stats[0].exceeds_goal, Some(false));
    }

    #[test]
    fn test_aggregate_drivers_without_goal() {
        let stats = aggregate_drivers(&[trip("D1", "XY", Some(4.0))], &goals(&[("AB", 4.0)]));

        assert_eq!(stats[0].avg_fuel_consumption, Some(4.0));
        assert_eq!(stats[0].avg_fuel_consumption_goal, None);
        assert_eq!(stats[0].exceeds_goal, None);
    }

    #[test]
    fn test_aggregate_drivers_unmatched_line_counts_only_for_consumption() {
        let trips = vec![trip("D1", "AB", Some(2.0)), trip("D1", "XY", Some(8.0))];
        let stats = aggregate_drivers(&trips, &goals(&[("AB", 3.0)]));

        assert_eq!(stats[0].avg_fuel_consumption, Some(5.0));
        assert_eq!(stats[0].avg_fuel_consumption_goal, Some(3.0));
        assert_eq!(stats[0].exceeds_goal, Some(true));
    }

    #[test]
    fn test_aggregate_drivers_undefined_trip_keeps_its_goal() {
        let trips = vec![trip("D1", "AB", None), trip("D1", "BC", Some(3.0))];
        let stats = aggregate_drivers(&trips, &goals(&[("AB", 100.0), ("BC", 2.0)]));

        assert_eq!(stats[0].trip_count, 2);
        assert_eq!(stats[0].avg_fuel_consumption, Some(3.0));
        assert_eq!(stats[0].avg_fuel_consumption_goal, Some(51.0));
        assert_eq!(stats[0].exceeds_goal, Some(false));
    }

    #[test]
    fn test_aggregate_drivers_goal_without_consumption_does_not_exceed() {
        let trips = vec![trip("D1", "AB", None)];
        let stats = aggregate_drivers(&trips, &goals(&[("AB", 4.0)]));

        assert_eq!(stats[0].avg_fuel_consumption, None);
        assert_eq!(stats[0].avg_fuel_consumption_goal, Some(4.0));
        assert_eq!(stats[0].exceeds_goal, Some(false));
    }

    #[test]
    fn test_aggregate_drivers_groups_across_fleets() {
        let mut other = trip("D1", "AB", Some(4.0));
        other.fleet = "F2".to_string();
        let stats = aggregate_drivers(&[trip("D1", "AB", Some(2.0)), other], &HashMap::new());

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].trip_count, 2);
        assert_eq!(stats[0].avg_fuel_consumption, Some(3.0));
    }
}
