use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

use super::{PlannedRequest, SourceFetcher, parse_price_text, value_to_key};
use crate::config::{ReserviFormat, ReserviVenue};
use crate::domain::CanonicalSlot;
use crate::errors::parse_context;
use crate::http::UpstreamRequest;
use crate::pagination::{HorizonConfig, TimeUnit, midnight_timestamp, parse_local_datetime};

/// Classic reservi.ru booking widget: one form POST per day, slots embedded in an HTML fragment
pub struct ReserviFetcher<'a> {
    venue: &'a ReserviVenue,
    horizon: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlotOptions {
    #[serde(default)]
    date_time: Option<String>,
    #[serde(default)]
    room_id: Option<Value>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    price: Option<f64>,
}

impl<'a> ReserviFetcher<'a> {
    pub fn new(venue: &'a ReserviVenue, horizon: u32) -> Self {
        Self { venue, horizon }
    }

    fn form_fields(&self, day: NaiveDate) -> Vec<(String, String)> {
        let mut fields = vec![
            ("date".to_string(), midnight_timestamp(day).to_string()),
            ("club_id".to_string(), self.venue.club_id.clone()),
            ("api_key".to_string(), self.venue.api_key.clone()),
        ];
        let target = match self.venue.format {
            ReserviFormat::ServiceId => ("service_id", &self.venue.service_id),
            ReserviFormat::SalonId => ("salonId", &self.venue.salon_id),
        };
        if let (name, Some(id)) = target {
            fields.push((name.to_string(), id.clone()));
        }
        fields
    }
}

impl SourceFetcher for ReserviFetcher<'_> {
    fn horizon(&self, today: NaiveDate) -> HorizonConfig {
        HorizonConfig::days(today, self.horizon)
    }

    fn plan(&self, unit: TimeUnit) -> Vec<PlannedRequest> {
        let request = UpstreamRequest::post_form(&self.venue.base_url, self.form_fields(unit.first_day()))
            .with_header("X-Requested-With", "XMLHttpRequest")
            .with_cookie(self.venue.cookie.as_deref());
        vec![PlannedRequest::new(request)]
    }

    fn parse(&self, _planned: &PlannedRequest, _unit: TimeUnit, body: &str) -> Result<Vec<CanonicalSlot>> {
        let envelope: Envelope = serde_json::from_str(body).context(parse_context("reservi envelope"))?;
        if envelope.success == Some(false) {
            anyhow::bail!(
                "reservi returned an error: {}",
                envelope.message.as_deref().unwrap_or("no message")
            );
        }
        let html = envelope.html.unwrap_or_default();
        Ok(parse_schedule_html(&html, self.venue.default_duration))
    }
}

/// Extract every slot anchor from a schedule fragment
pub fn parse_schedule_html(html: &str, default_duration: u32) -> Vec<CanonicalSlot> {
    let fragment = Html::parse_fragment(html);
    let rooms = extract_rooms(&fragment);
    let Ok(anchor_selector) = Selector::parse("a[data-options]") else {
        return Vec::new();
    };

    fragment
        .select(&anchor_selector)
        .filter_map(|anchor| parse_anchor(anchor, &rooms, default_duration))
        .collect()
}

fn extract_rooms(fragment: &Html) -> HashMap<String, String> {
    let Ok(room_selector) = Selector::parse("[data-room]") else {
        return HashMap::new();
    };
    fragment
        .select(&room_selector)
        .filter_map(|element| {
            let id = element.value().attr("data-room")?.trim().to_string();
            let name = collapse_text(element);
            (!id.is_empty() && !name.is_empty()).then_some((id, name))
        })
        .collect()
}

fn parse_anchor(anchor: ElementRef<'_>, rooms: &HashMap<String, String>, default_duration: u32) -> Option<CanonicalSlot> {
    let raw = anchor.value().attr("data-options")?;
    let Some(options) = decode_options(raw) else {
        debug!("Skipping slot with unreadable data-options: {}", raw);
        return None;
    };

    let date_time = options.date_time.as_deref()?;
    let start = parse_local_datetime(date_time)?;
    let room_key = options.room_id.as_ref().and_then(value_to_key).unwrap_or_default();
    let price = options.price.or_else(|| price_marker(anchor));

    let slot = CanonicalSlot::new(start, options.duration.unwrap_or(default_duration))?
        .with_price(price)
        .with_room(room_key.clone(), rooms.get(&room_key).map(String::as_str));
    Some(slot)
}

fn decode_options(raw: &str) -> Option<SlotOptions> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_str(&decode_entities(raw)))
        .ok()
}

/// Price shown inside the anchor or right after it
fn price_marker(anchor: ElementRef<'_>) -> Option<f64> {
    let inner = Selector::parse(".price")
        .ok()
        .and_then(|selector| anchor.select(&selector).next());
    let sibling = || {
        anchor
            .next_siblings()
            .find_map(ElementRef::wrap)
            .filter(|element| element.value().classes().any(|class| class == "price"))
    };
    let marker = inner.or_else(sibling)?;
    parse_price_text(&collapse_text(marker))
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Undo HTML-entity escaping left in an attribute after parsing
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let decoded = raw
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    Cow::Owned(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueCommon;
    use crate::domain::Sport;

    fn venue(format: ReserviFormat) -> ReserviVenue {
        ReserviVenue {
            common: VenueCommon {
                id: "luzhniki".to_string(),
                name: "Лужники".to_string(),
                sport: Sport::Tennis,
                horizon: None,
                delay_ms: None,
                aliases: Vec::new(),
            },
            base_url: "https://luzhniki.reservi.ru/api/schedule".to_string(),
            api_key: "secret".to_string(),
            club_id: "12".to_string(),
            format,
            service_id: Some("31".to_string()),
            salon_id: Some("77".to_string()),
            default_duration: 60,
            cookie: Some("PHPSESSID=abc".to_string()),
        }
    }

    const FRAGMENT: &str = r#"
        <div class="rooms">
            <div data-room="5">Корт 1 (хард)</div>
            <div data-room="6">Корт 2</div>
        </div>
        <div class="slots">
            <a class="slot" data-options='{"date_time":"2025-12-04 07:00","room_id":"5"}'>07:00 <span class="price">2 500 ₽</span></a>
            <a class="slot" data-options='{"date_time":"2025-12-04 08:00","room_id":6,"duration":90,"price":3100}'>08:00</a>
            <a class="slot" data-options='{"date_time":"2025-12-04 09:00","room_id":"6"}'>09:00</a><span class="price">2800</span>
            <a class="slot" data-options='{"room_id":"5"}'>no time</a>
            <a class="slot" data-options='{broken'>broken</a>
        </div>
    "#;

    #[test]
    fn test_slots_from_fragment() {
        let slots = parse_schedule_html(FRAGMENT, 60);
        assert_eq!(slots.len(), 3);

        assert_eq!(slots[0].date_time, "2025-12-04 07:00");
        assert_eq!(slots[0].room_name, "Корт 1 (хард)");
        assert_eq!(slots[0].price, Some(2500.0));
        assert_eq!(slots[0].duration, 60);

        assert_eq!(slots[1].room_key, "6");
        assert_eq!(slots[1].duration, 90);
        assert_eq!(slots[1].price, Some(3100.0));

        assert_eq!(slots[2].price, Some(2800.0));
    }

    #[test]
    fn test_double_escaped_options_are_decoded() {
        let html = r#"<a data-options="{&amp;quot;date_time&amp;quot;:&amp;quot;2025-12-04 10:00&amp;quot;,&amp;quot;room_id&amp;quot;:&amp;quot;5&amp;quot;}">10:00</a>"#;
        let slots = parse_schedule_html(html, 60);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].time, "10:00");
        assert_eq!(slots[0].price, None);
        assert_eq!(slots[0].room_name, "unknown");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("{&quot;a&quot;:1}"), "{\"a\":1}");
        assert_eq!(decode_entities("plain"), "plain");
        assert_eq!(decode_entities("&amp;quot;"), "&quot;");
    }

    #[test]
    fn test_service_id_form() {
        let venue = venue(ReserviFormat::ServiceId);
        let fetcher = ReserviFetcher::new(&venue, 14);
        let day = NaiveDate::from_ymd_opt(2025, 12, 4).unwrap();
        let planned = fetcher.plan(TimeUnit::Day(day));
        let request = &planned[0].request;

        assert_eq!(request.form_value("date"), Some("1764795600"));
        assert_eq!(request.form_value("service_id"), Some("31"));
        assert_eq!(request.form_value("salonId"), None);
        assert_eq!(request.form_value("api_key"), Some("secret"));
        assert!(request.headers.contains(&("Cookie".to_string(), "PHPSESSID=abc".to_string())));
    }

    #[test]
    fn test_salon_id_form() {
        let venue = venue(ReserviFormat::SalonId);
        let fetcher = ReserviFetcher::new(&venue, 14);
        let day = NaiveDate::from_ymd_opt(2025, 12, 4).unwrap();
        let request = &fetcher.plan(TimeUnit::Day(day))[0].request;

        assert_eq!(request.form_value("salonId"), Some("77"));
        assert_eq!(request.form_value("service_id"), None);
    }

    #[test]
    fn test_error_envelope_fails_the_day() {
        let venue = venue(ReserviFormat::ServiceId);
        let fetcher = ReserviFetcher::new(&venue, 14);
        let day = TimeUnit::Day(NaiveDate::from_ymd_opt(2025, 12, 4).unwrap());
        let planned = fetcher.plan(day);

        let result = fetcher.parse(&planned[0], day, r#"{"success":false,"message":"bad api key"}"#);
        assert!(result.unwrap_err().to_string().contains("bad api key"));
    }

    #[test]
    fn test_envelope_html_is_parsed() {
        let venue = venue(ReserviFormat::ServiceId);
        let fetcher = ReserviFetcher::new(&venue, 14);
        let day = TimeUnit::Day(NaiveDate::from_ymd_opt(2025, 12, 4).unwrap());
        let planned = fetcher.plan(day);
        let body = serde_json::json!({ "success": true, "html": FRAGMENT }).to_string();

        let slots = fetcher.parse(&planned[0], day, &body).unwrap();
        assert_eq!(slots.len(), 3);
    }
}
