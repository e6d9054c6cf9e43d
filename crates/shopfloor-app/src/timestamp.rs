// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Wire timestamps. The API sends RFC 3339 values, offset-less ISO 8601
//! date-times (sometimes with fractional seconds) and bare dates, all of
//! which are kept as wall-clock `PrimitiveDateTime`.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub fn parse(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(PrimitiveDateTime::new(value.date(), value.time()));
    }
    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    if let Ok(value) = PrimitiveDateTime::parse(raw, &local) {
        return Some(value);
    }
    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(raw, &date_only).ok().map(Date::midnight)
}

pub fn format_wire(value: PrimitiveDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    value.format(&format).unwrap_or_default()
}

pub fn format_display(value: PrimitiveDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    value.format(&format).unwrap_or_default()
}

pub mod option {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub fn serialize<S: Serializer>(
        value: &Option<PrimitiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&super::format_wire(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PrimitiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}"))),
        }
    }
}
