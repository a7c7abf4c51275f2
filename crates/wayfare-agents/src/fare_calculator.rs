//! Formula-based Indian ground-transport fares: trains (Indian Railways
//! fare structure), state/private buses, and ride-hailing (Ola/Uber/
//! Rapido). A curated real-train lookup table is not carried here —
//! these formulas already cover every distance band without one.

use wayfare_types::{SourceOrigin, Transport, TransportType};

struct TrainRate {
    class: &'static str,
    label: &'static str,
    base_per_km: f64,
    reservation: f64,
    superfast: f64,
    min_fare: f64,
    avg_speed_kmh: f64,
}

const TRAIN_RATES: &[TrainRate] = &[
    TrainRate { class: "SL", label: "Sleeper (SL)", base_per_km: 0.30, reservation: 20.0, superfast: 30.0, min_fare: 120.0, avg_speed_kmh: 50.0 },
    TrainRate { class: "3A", label: "AC 3-Tier (3A)", base_per_km: 0.85, reservation: 40.0, superfast: 45.0, min_fare: 300.0, avg_speed_kmh: 55.0 },
    TrainRate { class: "2A", label: "AC 2-Tier (2A)", base_per_km: 1.25, reservation: 50.0, superfast: 45.0, min_fare: 550.0, avg_speed_kmh: 55.0 },
    TrainRate { class: "1A", label: "AC First (1A)", base_per_km: 2.25, reservation: 60.0, superfast: 75.0, min_fare: 1100.0, avg_speed_kmh: 60.0 },
];

struct TrainFare {
    label: &'static str,
    fare: f64,
    duration_minutes: u32,
}

fn calculate_train_fare(distance_km: f64, travel_class: &str) -> TrainFare {
    let rate = TRAIN_RATES
        .iter()
        .find(|r| r.class == travel_class)
        .unwrap_or_else(|| TRAIN_RATES.iter().find(|r| r.class == "3A").unwrap());

    let rail_distance = distance_km * 1.3;
    let base_fare = rail_distance * rate.base_per_km;
    let subtotal = base_fare + rate.reservation + rate.superfast;
    let gst = if rate.class != "SL" { subtotal * 0.05 } else { 0.0 };
    let total = (subtotal + gst).ceil().max(rate.min_fare);
    let duration_min = ((rail_distance / rate.avg_speed_kmh) * 60.0).round().max(30.0) as u32;

    TrainFare {
        label: rate.label,
        fare: total,
        duration_minutes: duration_min,
    }
}

pub fn all_train_fares(distance_km: f64) -> Vec<Transport> {
    let mut classes = vec!["SL", "3A", "2A"];
    if distance_km > 300.0 {
        classes.push("1A");
    }
    classes
        .into_iter()
        .map(|class| {
            let fare = calculate_train_fare(distance_km, class);
            Transport {
                id: wayfare_types::stable_id(&format!("train-{class}-{distance_km}")),
                name: fare.label.to_string(),
                transport_type: TransportType::Train,
                operator: "Indian Railways (IRCTC)".to_string(),
                total_price: fare.fare,
                currency: "INR".to_string(),
                duration_minutes: fare.duration_minutes,
                transfers: 0,
                rating: 3.8,
                booking_url: Some("https://www.irctc.co.in".to_string()),
                source_origin: SourceOrigin::FareCalculator,
                verified: true,
            }
        })
        .collect()
}

struct BusRate {
    label: &'static str,
    per_km: f64,
    min_fare: f64,
    avg_speed_kmh: f64,
}

const BUS_RATES: &[BusRate] = &[
    BusRate { label: "State Bus (Ordinary)", per_km: 1.0, min_fare: 50.0, avg_speed_kmh: 35.0 },
    BusRate { label: "AC Seater (Private)", per_km: 1.8, min_fare: 150.0, avg_speed_kmh: 45.0 },
    BusRate { label: "AC Sleeper (Volvo)", per_km: 2.5, min_fare: 250.0, avg_speed_kmh: 50.0 },
];

pub fn all_bus_fares(distance_km: f64) -> Vec<Transport> {
    let road_distance = distance_km * 1.3;
    BUS_RATES
        .iter()
        .map(|rate| {
            let fare = (road_distance * rate.per_km).ceil().max(rate.min_fare);
            let duration = ((road_distance / rate.avg_speed_kmh) * 60.0).round().max(20.0) as u32;
            let operator = if rate.label.contains("Private") || rate.label.contains("Volvo") {
                "RedBus"
            } else {
                "State Transport"
            };
            Transport {
                id: wayfare_types::stable_id(&format!("bus-{}-{distance_km}", rate.label)),
                name: rate.label.to_string(),
                transport_type: TransportType::Bus,
                operator: operator.to_string(),
                total_price: fare,
                currency: "INR".to_string(),
                duration_minutes: duration,
                transfers: 0,
                rating: 3.5,
                booking_url: Some("https://www.redbus.in".to_string()),
                source_origin: SourceOrigin::FareCalculator,
                verified: true,
            }
        })
        .collect()
}

struct CityCabRate {
    service: &'static str,
    kind: &'static str,
    base_fare: f64,
    per_km: f64,
    per_min: f64,
    min_fare: f64,
    max_distance_km: f64,
}

const CITY_CAB_RATES: &[CityCabRate] = &[
    CityCabRate { service: "Ola", kind: "Mini", base_fare: 50.0, per_km: 8.0, per_min: 1.0, min_fare: 80.0, max_distance_km: 80.0 },
    CityCabRate { service: "Uber", kind: "Go", base_fare: 50.0, per_km: 9.0, per_min: 1.0, min_fare: 80.0, max_distance_km: 80.0 },
    CityCabRate { service: "Ola", kind: "Prime Sedan", base_fare: 80.0, per_km: 13.0, per_min: 1.5, min_fare: 120.0, max_distance_km: 80.0 },
    CityCabRate { service: "Uber", kind: "Premier", base_fare: 90.0, per_km: 14.0, per_min: 1.5, min_fare: 130.0, max_distance_km: 80.0 },
    CityCabRate { service: "Ola", kind: "Prime SUV", base_fare: 100.0, per_km: 18.0, per_min: 2.0, min_fare: 180.0, max_distance_km: 80.0 },
    CityCabRate { service: "Uber", kind: "XL", base_fare: 110.0, per_km: 18.0, per_min: 2.0, min_fare: 180.0, max_distance_km: 80.0 },
];

const AUTO_RATES: &[CityCabRate] = &[
    CityCabRate { service: "Rapido", kind: "Auto", base_fare: 25.0, per_km: 5.0, per_min: 0.5, min_fare: 30.0, max_distance_km: 40.0 },
    CityCabRate { service: "Ola", kind: "Auto", base_fare: 30.0, per_km: 5.0, per_min: 0.5, min_fare: 30.0, max_distance_km: 40.0 },
    CityCabRate { service: "Rapido", kind: "Bike", base_fare: 15.0, per_km: 3.0, per_min: 0.3, min_fare: 25.0, max_distance_km: 30.0 },
];

struct OutstationRate {
    service: &'static str,
    kind: &'static str,
    per_km: f64,
    driver_allowance: f64,
    min_km: f64,
    avg_speed_kmh: f64,
}

const OUTSTATION_RATES: &[OutstationRate] = &[
    OutstationRate { service: "Ola", kind: "Outstation Sedan", per_km: 12.0, driver_allowance: 250.0, min_km: 250.0, avg_speed_kmh: 50.0 },
    OutstationRate { service: "Uber", kind: "Intercity Sedan", per_km: 12.0, driver_allowance: 250.0, min_km: 250.0, avg_speed_kmh: 50.0 },
    OutstationRate { service: "Ola", kind: "Outstation SUV", per_km: 16.0, driver_allowance: 300.0, min_km: 250.0, avg_speed_kmh: 50.0 },
    OutstationRate { service: "Uber", kind: "Intercity SUV", per_km: 16.0, driver_allowance: 300.0, min_km: 250.0, avg_speed_kmh: 50.0 },
];

pub fn cab_fares(distance_km: f64) -> Vec<Transport> {
    let road_distance = distance_km * 1.3;
    let avg_speed = 35.0;
    let duration_min = ((road_distance / avg_speed) * 60.0).round().max(10.0);

    let mut out = Vec::new();

    if distance_km <= 40.0 {
        for rate in AUTO_RATES {
            if road_distance > rate.max_distance_km {
                continue;
            }
            let fare = (rate.base_fare + road_distance * rate.per_km + duration_min * rate.per_min)
                .ceil()
                .max(rate.min_fare);
            let extra = if rate.kind == "Auto" { 10.0 } else { 0.0 };
            out.push(cab_transport(rate.service, rate.kind, fare, (duration_min + extra) as u32, TransportType::Auto));
        }
    }

    if distance_km <= 80.0 {
        for rate in CITY_CAB_RATES {
            let fare = (rate.base_fare + road_distance * rate.per_km + duration_min * rate.per_min)
                .ceil()
                .max(rate.min_fare);
            out.push(cab_transport(rate.service, rate.kind, fare, duration_min as u32, TransportType::Cab));
        }
    } else {
        for rate in OUTSTATION_RATES {
            let billable_km = road_distance.max(rate.min_km);
            let fare = (billable_km * rate.per_km + rate.driver_allowance).ceil();
            let out_duration = ((road_distance / rate.avg_speed_kmh) * 60.0).round().max(60.0) as u32;
            out.push(cab_transport(rate.service, rate.kind, fare, out_duration, TransportType::Cab));
        }
    }

    out
}

fn cab_transport(service: &str, kind: &str, fare: f64, duration_minutes: u32, transport_type: TransportType) -> Transport {
    let name = format!("{service} {kind}");
    Transport {
        id: wayfare_types::stable_id(&format!("cab-{name}-{fare}-{duration_minutes}")),
        name,
        transport_type,
        operator: service.to_string(),
        total_price: fare,
        currency: "INR".to_string(),
        duration_minutes,
        transfers: 0,
        rating: 4.0,
        booking_url: None,
        source_origin: SourceOrigin::FareCalculator,
        verified: true,
    }
}

/// All ground-transport fares for a journey: trains, buses, and cabs.
pub fn all_ground_transport(distance_km: f64) -> Vec<Transport> {
    let mut options = all_train_fares(distance_km);
    options.extend(all_bus_fares(distance_km));
    options.extend(cab_fares(distance_km));
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_a_fare_matches_hand_computed_value_for_300km() {
        let fare = calculate_train_fare(300.0, "3A");
        // rail_distance = 390, base = 331.5, subtotal = 416.5, gst = 20.825
        // total = ceil(437.325) = 438
        assert_eq!(fare.fare, 438.0);
    }

    #[test]
    fn sl_fare_has_no_gst() {
        let fare = calculate_train_fare(100.0, "SL");
        // rail_distance = 130, base = 39, subtotal = 89, no gst, below min_fare 120
        assert_eq!(fare.fare, 120.0);
    }

    #[test]
    fn first_class_only_offered_beyond_300km() {
        let short = all_train_fares(150.0);
        let long = all_train_fares(350.0);
        assert!(!short.iter().any(|t| t.name.contains("AC First")));
        assert!(long.iter().any(|t| t.name.contains("AC First")));
    }

    #[test]
    fn bus_fare_floors_at_minimum() {
        let buses = all_bus_fares(5.0);
        let ordinary = buses.iter().find(|b| b.name.contains("Ordinary")).unwrap();
        assert_eq!(ordinary.total_price, 50.0);
    }

    #[test]
    fn short_trip_includes_auto_and_bike_options() {
        let cabs = cab_fares(10.0);
        assert!(cabs.iter().any(|c| c.name.contains("Auto")));
        assert!(cabs.iter().any(|c| c.name.contains("Bike")));
    }

    #[test]
    fn long_trip_switches_to_outstation_rates() {
        let cabs = cab_fares(500.0);
        assert!(cabs.iter().any(|c| c.name.contains("Outstation") || c.name.contains("Intercity")));
        assert!(!cabs.iter().any(|c| c.name.contains("Mini")));
    }
}
