use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use court_slots::config::{PricingTable, StaticConfig, VenueRegistry};
use court_slots::domain::{AggregatedResult, Sport};
use court_slots::http::RateLimitedClient;
use court_slots::services::aggregate_sport;
use court_slots::storage::{LocalStore, Storage};

const RESERVI_HTML: &str = r##"
    <div class="rooms"><span data-room="5">Корт 5 (хард)</span><span data-room="6">Корт 6</span></div>
    <div class="slots">
        <a href="#" data-options='{"date_time": "2025-12-04 07:00", "room_id": 5, "duration": 60}'>07:00</a>
        <span class="price">2 500 ₽</span>
        <a href="#" data-options='{"date_time": "2025-12-04 07:00", "room_id": "5", "duration": 60}'>07:00</a>
        <a href="#" data-options='{"date_time": "2025-12-04 07:00", "room_id": 6}'>07:00</a>
        <a href="#" data-options='{"date_time": "2025-12-04 06:00", "room_id": 6}'>06:00</a>
        <a href="#" data-options='{"room_id": 6}'>?</a>
    </div>
"##;

async fn reservi_schedule() -> Json<Value> {
    Json(json!({ "success": true, "html": RESERVI_HTML }))
}

async fn findsport_schedule() -> Json<Value> {
    Json(json!({
        "schedule": {
            "10:00": { "9702": 12, "9703": 0 },
            "10:30": { "9702": 0, "9703": 0 },
            "11:00": { "9702": 0, "9703": 0 }
        }
    }))
}

/// Upstream doubles on an ephemeral local port; returns the base URL
async fn serve_fixtures() -> String {
    let app = Router::new()
        .route("/widget/schedule", post(reservi_schedule))
        .route("/api/playgrounds/4411/schedule", get(findsport_schedule));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn static_config(base: &str) -> StaticConfig {
    let registry = json!({
        "venues": [
            {
                "source": "reservi", "id": "luzhniki", "name": "Лужники", "sport": "tennis",
                "horizon": 1, "delay_ms": 0,
                "base_url": format!("{}/widget/schedule", base),
                "api_key": "key", "club_id": "12", "service_id": "31"
            },
            {
                "source": "findsport", "id": "sokolniki", "name": "Сокольники", "sport": "tennis",
                "horizon": 1, "delay_ms": 0,
                "playground_id": 4411, "courts": { "9702": "Корт 2" }, "base_url": base
            },
            {
                "source": "vivacrm", "id": "viva-missing", "name": "Viva", "sport": "tennis",
                "horizon": 2, "delay_ms": 0,
                "tenant_id": "t", "service_id": "s", "base_url": base
            },
            {
                "source": "yclients", "id": "padel-friends", "name": "Padel Friends", "sport": "padel",
                "location_id": 1, "token": "t", "duration": 90, "base_url": base
            }
        ]
    });
    let pricing = json!({
        "sokolniki": {
            "weekday": [{ "startHour": 7, "endHour": 23, "price": 2800 }],
            "weekend": [{ "startHour": 7, "endHour": 23, "price": 3400 }]
        }
    });

    let registry = VenueRegistry::from_json(&registry.to_string()).unwrap();
    let pricing = PricingTable::from_json(&pricing.to_string()).unwrap();
    StaticConfig::new(registry, pricing)
}

// 2025-12-04 09:00 in Moscow
fn run_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 4, 6, 0, 0).unwrap()
}

async fn aggregate_tennis() -> AggregatedResult {
    let base = serve_fixtures().await;
    let config = static_config(&base);
    let mut client = RateLimitedClient::new("court-slots-test", 5, 0).unwrap();
    aggregate_sport(&mut client, &config, Sport::Tennis, run_time()).await
}

#[tokio::test]
async fn test_reservi_duplicate_anchors_collapse_to_one_slot() {
    let result = aggregate_tennis().await;

    let day = &result.venue("luzhniki").unwrap()["2025-12-04"];
    let room_five: Vec<_> = day
        .iter()
        .filter(|slot| slot.date_time == "2025-12-04 07:00" && slot.room_name == "Корт 5 (хард)")
        .collect();

    assert_eq!(room_five.len(), 1);
    assert_eq!(room_five[0].price, Some(2500.0));
    assert_eq!(day.len(), 3);
    assert_eq!(day[0].time, "06:00");
}

#[tokio::test]
async fn test_findsport_booked_half_hour_blocks_the_hour() {
    let result = aggregate_tennis().await;

    let day = &result.venue("sokolniki").unwrap()["2025-12-04"];
    let court_2: Vec<&str> = day
        .iter()
        .filter(|slot| slot.room_name == "Корт 2")
        .map(|slot| slot.time.as_str())
        .collect();
    let court_3: Vec<&str> = day
        .iter()
        .filter(|slot| slot.room_name == "9703")
        .map(|slot| slot.time.as_str())
        .collect();

    assert_eq!(court_2, vec!["10:30"]);
    assert_eq!(court_3, vec!["10:00", "10:30"]);
    // no upstream price, filled from the weekday rate table
    assert!(day.iter().all(|slot| slot.price == Some(2800.0)));
}

#[tokio::test]
async fn test_failed_units_are_reported_not_fatal() {
    let result = aggregate_tennis().await;

    let status = &result.status["viva-missing"];
    assert_eq!(status.units_ok, 0);
    assert_eq!(status.units_failed, 2);
    assert!(result.venue("viva-missing").unwrap().is_empty());

    assert!(result.status["luzhniki"].is_complete());
    assert!(!result.sites.contains_key("padel-friends"));
}

#[tokio::test]
async fn test_every_planned_request_is_sent_once() {
    let base = serve_fixtures().await;
    let config = static_config(&base);
    let mut client = RateLimitedClient::new("court-slots-test", 5, 0).unwrap();

    aggregate_sport(&mut client, &config, Sport::Tennis, run_time()).await;

    // one day each for luzhniki and sokolniki, two failing days for viva-missing
    assert_eq!(client.request_count(), 4);
}

#[tokio::test]
async fn test_slots_are_ordered_within_each_date() {
    let result = aggregate_tennis().await;

    for dates in result.sites.values() {
        for slots in dates.values() {
            assert!(slots.windows(2).all(|pair| pair[0].time <= pair[1].time));
        }
    }
}

#[tokio::test]
async fn test_local_storage_round_trip() {
    let result = aggregate_tennis().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::Local(LocalStore::new(dir.path()));

    assert!(storage.load(Sport::Tennis).await.unwrap().is_none());
    storage.save(Sport::Tennis, &result).await.unwrap();

    let loaded = storage.load(Sport::Tennis).await.unwrap().unwrap();
    assert_eq!(serde_json::to_value(&loaded).unwrap(), serde_json::to_value(&result).unwrap());
    assert!(dir.path().join("free_slots_tennis.json").exists());
    assert!(storage.load(Sport::Padel).await.unwrap().is_none());

    let document: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("free_slots_tennis.json")).unwrap()).unwrap();
    let slot = &document["sites"]["luzhniki"]["2025-12-04"][0];
    assert_eq!(slot["dateTime"], json!("2025-12-04 06:00"));
    assert_eq!(slot["price"], Value::Null);
    assert!(slot.get("room_key").is_none());
}

#[test]
fn test_shipped_configuration_loads() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let registry = VenueRegistry::load(root.join("config/venues.json")).unwrap();
    let pricing = PricingTable::load_optional(root.join("config/pricing.json")).unwrap();
    let config = StaticConfig::new(registry, pricing);

    assert!(config.registry.by_sport(Sport::Padel).count() >= 2);
    for (venue_id, _) in config.registry.name_table() {
        assert!(config.registry.get(&venue_id).is_some());
    }
    assert_eq!(config.resolver.resolve("теплый стан", 0.25).unwrap().venue_id, "teply-stan");
}
