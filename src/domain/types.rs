//! Request/response DTOs shared by the proxy and the nearby aggregator

use serde::{Deserialize, Deserializer, Serialize};
use time::macros::format_description;
use time::Date;

/// Inbound body of `POST /api/send-registration-email`
///
/// Every field is optional at the wire level so that a missing field is a
/// validation failure (400) rather than a body decode failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationEmailRequest {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_address: Option<String>,
}

/// Generic message returned when any required field is absent or empty.
/// The same text is used whichever field failed.
pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: eventName, customerName, customerEmail, eventDate, eventAddress";

/// A registration request with every required field present and non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEmail {
    pub event_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub event_date: String,
    pub event_address: String,
}

impl RegistrationEmailRequest {
    /// Check all five required fields. Returns `None` if any is missing or empty.
    pub fn validate(self) -> Option<RegistrationEmail> {
        fn present(field: Option<String>) -> Option<String> {
            field.filter(|value| !value.is_empty())
        }

        Some(RegistrationEmail {
            event_name: present(self.event_name)?,
            customer_name: present(self.customer_name)?,
            customer_email: present(self.customer_email)?,
            event_date: present(self.event_date)?,
            event_address: present(self.event_address)?,
        })
    }
}

impl From<&RegistrationEmail> for RegistrationEmailRequest {
    fn from(email: &RegistrationEmail) -> Self {
        Self {
            event_name: Some(email.event_name.clone()),
            customer_name: Some(email.customer_name.clone()),
            customer_email: Some(email.customer_email.clone()),
            event_date: Some(email.event_date.clone()),
            event_address: Some(email.event_address.clone()),
        }
    }
}

/// Render a vendor date (`2024-12-16` or an ISO timestamp) the way the
/// email template expects it: `Monday, December 16, 2024`. Anything that
/// does not parse is returned unchanged.
pub fn format_event_date(raw: &str) -> String {
    let input = format_description!("[year]-[month]-[day]");
    let output = format_description!("[weekday], [month repr:long] [day padding:none], [year]");

    raw.get(..10)
        .and_then(|day| Date::parse(day, input).ok())
        .and_then(|date| date.format(output).ok())
        .unwrap_or_else(|| raw.to_string())
}

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationCoordinates {
    pub lat: f64,
    pub lng: f64,
}

impl std::fmt::Display for LocationCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Body of the vendor proximity query. The vendor expects strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityQuery {
    pub lat: String,
    pub lng: String,
    pub max_distance: String,
}

impl ProximityQuery {
    pub fn new(coordinates: LocationCoordinates, max_distance: &str) -> Self {
        Self {
            lat: coordinates.lat.to_string(),
            lng: coordinates.lng.to_string(),
            max_distance: max_distance.to_string(),
        }
    }
}

/// One entry of a proximity query result. Events and experiences share the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub distance_km: f64,
}

pub type NearbyEventItem = NearbyItem;
pub type NearbyExperienceItem = NearbyItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyEvents {
    pub events: Vec<NearbyEventItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyExperiences {
    pub experiences: Vec<NearbyExperienceItem>,
}

/// Both proximity results for one location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyContent {
    pub events: NearbyEvents,
    pub experiences: NearbyExperiences,
}

/// Vendor ids show up as strings or as bare integers depending on the endpoint
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Like [`deserialize_id`], but a `null` id becomes an empty string
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Id(#[serde(deserialize_with = "deserialize_id")] String);

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| id.0).unwrap_or_default())
}

/// Vendors send `null` for fields they have no value for. `#[serde(default)]`
/// only covers a missing key, so `null` is mapped to the default here.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Full event record from the detail endpoint. Display-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedEvent {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tagline: String,
    #[serde(deserialize_with = "null_as_default")]
    pub primary_category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub long_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub address_city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address_venue: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address_landmark: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address_full_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fixed_price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pricing_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub banner_image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contact_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contact_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSlot {
    #[serde(deserialize_with = "null_as_default")]
    pub start: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end: String,
}

/// Full experience (recurring event) record from the detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedExperience {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub primary_category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sub_category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ticket_price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub time_slots: Vec<TimeSlot>,
    #[serde(deserialize_with = "null_as_default")]
    pub experience_photo_urls: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub emergency_contact_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address_city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address_venue: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address_full_address: String,
}
