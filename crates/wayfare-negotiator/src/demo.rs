//! Built-in demo pool: substituted per-category when a candidate list
//! handed to the negotiator is empty, so the pipeline can still produce
//! three bundles even when every research agent came back dry.

use wayfare_types::{Activity, SourceOrigin, Stay, Transport, TransportType};

pub fn demo_transport() -> Vec<Transport> {
    vec![
        Transport {
            id: wayfare_types::stable_id("IndiGo Express"),
            name: "IndiGo Express".to_string(),
            transport_type: TransportType::Flight,
            operator: "IndiGo".to_string(),
            total_price: 4200.0,
            currency: "INR".to_string(),
            duration_minutes: 95,
            transfers: 0,
            rating: 4.0,
            booking_url: Some("https://www.goindigo.in".to_string()),
            source_origin: SourceOrigin::Curated,
            verified: false,
        },
        Transport {
            id: wayfare_types::stable_id("Air India Saver"),
            name: "Air India Saver".to_string(),
            transport_type: TransportType::Flight,
            operator: "Air India".to_string(),
            total_price: 3600.0,
            currency: "INR".to_string(),
            duration_minutes: 110,
            transfers: 0,
            rating: 3.6,
            booking_url: Some("https://www.airindia.com".to_string()),
            source_origin: SourceOrigin::Curated,
            verified: false,
        },
        Transport {
            id: wayfare_types::stable_id("Rajdhani Express"),
            name: "Rajdhani Express".to_string(),
            transport_type: TransportType::Train,
            operator: "12301 Rajdhani Express".to_string(),
            total_price: 1850.0,
            currency: "INR".to_string(),
            duration_minutes: 480,
            transfers: 0,
            rating: 4.2,
            booking_url: Some("https://www.irctc.co.in".to_string()),
            source_origin: SourceOrigin::Curated,
            verified: false,
        },
        Transport {
            id: wayfare_types::stable_id("RedBus Volvo"),
            name: "RedBus Volvo".to_string(),
            transport_type: TransportType::Bus,
            operator: "Volvo AC Sleeper".to_string(),
            total_price: 950.0,
            currency: "INR".to_string(),
            duration_minutes: 540,
            transfers: 0,
            rating: 3.9,
            booking_url: Some("https://www.redbus.in".to_string()),
            source_origin: SourceOrigin::Curated,
            verified: false,
        },
    ]
}

pub fn demo_stays() -> Vec<Stay> {
    vec![
        Stay {
            id: wayfare_types::stable_id("Grand Palace Hotel"),
            name: "Grand Palace Hotel".to_string(),
            lat: 0.0,
            lng: 0.0,
            star_rating: 4.5,
            price_per_night: 6500.0,
            total_price: 0.0,
            amenities: vec!["pool".to_string(), "spa".to_string(), "wifi".to_string()],
            booking_url: Some("https://www.booking.com".to_string()),
            source_origin: SourceOrigin::Curated,
            verified: false,
        },
        Stay {
            id: wayfare_types::stable_id("Comfort Inn"),
            name: "Comfort Inn".to_string(),
            lat: 0.0,
            lng: 0.0,
            star_rating: 3.5,
            price_per_night: 2800.0,
            total_price: 0.0,
            amenities: vec!["wifi".to_string(), "breakfast".to_string()],
            booking_url: Some("https://www.booking.com".to_string()),
            source_origin: SourceOrigin::Curated,
            verified: false,
        },
        Stay {
            id: wayfare_types::stable_id("Zostel Backpackers"),
            name: "Zostel Backpackers".to_string(),
            lat: 0.0,
            lng: 0.0,
            star_rating: 3.0,
            price_per_night: 900.0,
            total_price: 0.0,
            amenities: vec!["wifi".to_string(), "common-kitchen".to_string()],
            booking_url: Some("https://www.zostel.com".to_string()),
            source_origin: SourceOrigin::Curated,
            verified: false,
        },
    ]
}

pub fn demo_activities() -> Vec<Activity> {
    let entries: &[(&str, &str, f64, f64, f64)] = &[
        ("Old City Heritage Walk", "culture", 3.0, 400.0, 4.4),
        ("Riverside Street Food Crawl", "food", 2.5, 600.0, 4.6),
        ("Sunrise Yoga & Meditation", "wellness", 1.5, 300.0, 4.5),
        ("White-Water Rafting", "adventure", 3.0, 1500.0, 4.3),
        ("Waterfall Trek", "nature", 4.0, 500.0, 4.2),
        ("Local Handicraft Market Tour", "shopping", 2.0, 0.0, 3.9),
        ("Evening Ganga Aarti", "spiritual", 1.5, 0.0, 4.8),
        ("Ashram Day Retreat", "spiritual", 5.0, 1200.0, 4.1),
        ("Cliff-Jumping & Cave Exploration", "adventure", 3.5, 1100.0, 4.0),
        ("Rooftop Cafe Cooking Class", "food", 2.5, 900.0, 4.3),
        ("Hill Viewpoint Photography Hike", "nature", 2.0, 200.0, 4.0),
        ("Museum & Temple Circuit", "culture", 3.0, 250.0, 3.8),
    ];
    entries
        .iter()
        .map(|(name, category, duration_hours, price, rating)| Activity {
            id: wayfare_types::stable_id(name),
            name: name.to_string(),
            category: category.to_string(),
            duration_hours: *duration_hours,
            price: *price,
            lat: 0.0,
            lng: 0.0,
            opening_hours: None,
            phone: None,
            rating: *rating,
            source_origin: SourceOrigin::Curated,
            verified: false,
        })
        .collect()
}
