//! Date and time values.
//!
//! Sigma distinguishes six temporal flavors, selected by which components a
//! literal carries:
//!
//! | Variant | Wire form |
//! |---------|-----------|
//! | [`Temporal::Date`] | `@2019-01-01` |
//! | [`Temporal::Time`] | `@12:31:47.7654` |
//! | [`Temporal::OffsetTime`] | `@12:31:47+11:00` |
//! | [`Temporal::DateTime`] | `@2019-01-01T12:31:47` |
//! | [`Temporal::OffsetDateTime`] | `@2019-01-01T12:31:47Z` |
//! | [`Temporal::Zoned`] | `@2019-01-01T12:31:47+11:00[Australia/Hobart]` |
//!
//! Zone identifiers are resolved through a [`ZoneProvider`]; the default
//! provider, [`Tzdb`], consults the IANA database bundled by `chrono-tz`.

use chrono::{
    DateTime, Datelike, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike,
};
use chrono_tz::Tz;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Offsets the format can express, in seconds east of UTC.
const OFFSET_RANGE: std::ops::RangeInclusive<i32> = -12 * 3600..=14 * 3600;

/// Years that fit the four-digit wire form.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// A time of day with a fixed UTC offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OffsetTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl OffsetTime {
    #[must_use]
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        OffsetTime { time, offset }
    }
}

/// A local date-time pinned to an IANA zone together with the offset in
/// effect at that instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ZonedDateTime {
    pub datetime: NaiveDateTime,
    pub offset: FixedOffset,
    pub zone: Tz,
}

impl ZonedDateTime {
    /// Pins `datetime` to `zone`, checking that `offset` is one the zone
    /// actually uses at that local time. Returns `None` otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{FixedOffset, NaiveDate};
    /// use sigma::ZonedDateTime;
    ///
    /// let local = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    /// let hobart: chrono_tz::Tz = "Australia/Hobart".parse().unwrap();
    /// let summer = FixedOffset::east_opt(11 * 3600).unwrap();
    /// assert!(ZonedDateTime::new(local, summer, hobart).is_some());
    /// let wrong = FixedOffset::east_opt(3600).unwrap();
    /// assert!(ZonedDateTime::new(local, wrong, hobart).is_none());
    /// ```
    #[must_use]
    pub fn new(datetime: NaiveDateTime, offset: FixedOffset, zone: Tz) -> Option<Self> {
        let admitted = match zone.offset_from_local_datetime(&datetime) {
            LocalResult::Single(o) => o.fix() == offset,
            LocalResult::Ambiguous(a, b) => a.fix() == offset || b.fix() == offset,
            LocalResult::None => false,
        };
        admitted.then_some(ZonedDateTime {
            datetime,
            offset,
            zone,
        })
    }

    /// Converts to a chrono `DateTime` in the zone, or `None` when the
    /// instant falls outside chrono's supported range.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Tz>> {
        self.datetime
            .checked_sub_offset(self.offset)
            .map(|utc| self.zone.from_utc_datetime(&utc))
    }
}

/// One of the six temporal flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Temporal {
    Date(NaiveDate),
    Time(NaiveTime),
    OffsetTime(OffsetTime),
    DateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
    Zoned(ZonedDateTime),
}

impl Temporal {
    /// Short name of the flavor, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Temporal::Date(_) => "date",
            Temporal::Time(_) => "time",
            Temporal::OffsetTime(_) => "offset time",
            Temporal::DateTime(_) => "date-time",
            Temporal::OffsetDateTime(_) => "offset date-time",
            Temporal::Zoned(_) => "zoned date-time",
        }
    }

    /// Checks that the wire text of this value reads back unchanged.
    ///
    /// # Errors
    ///
    /// Names the component that the format cannot carry: a year outside
    /// 0000..9999, a leap second, or an offset with a seconds part or outside
    /// -12:00..+14:00.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{FixedOffset, NaiveTime};
    /// use sigma::{OffsetTime, Temporal};
    ///
    /// let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
    /// let ok = Temporal::OffsetTime(OffsetTime::new(noon, FixedOffset::east_opt(3600).unwrap()));
    /// assert!(ok.check_writable().is_ok());
    /// let odd = Temporal::OffsetTime(OffsetTime::new(noon, FixedOffset::east_opt(3659).unwrap()));
    /// assert!(odd.check_writable().is_err());
    /// ```
    pub fn check_writable(&self) -> std::result::Result<(), &'static str> {
        match self {
            Temporal::Date(date) => check_year(date),
            Temporal::Time(time) => check_time(time),
            Temporal::OffsetTime(ot) => {
                check_time(&ot.time)?;
                check_offset(&ot.offset)
            }
            Temporal::DateTime(dt) => {
                check_year(&dt.date())?;
                check_time(&dt.time())
            }
            Temporal::OffsetDateTime(odt) => {
                let local = odt.naive_local();
                check_year(&local.date())?;
                check_time(&local.time())?;
                check_offset(odt.offset())
            }
            Temporal::Zoned(zdt) => {
                check_year(&zdt.datetime.date())?;
                check_time(&zdt.datetime.time())?;
                check_offset(&zdt.offset)
            }
        }
    }
}

fn check_year(date: &NaiveDate) -> std::result::Result<(), &'static str> {
    if YEAR_RANGE.contains(&date.year()) {
        Ok(())
    } else {
        Err("year outside 0000..9999")
    }
}

fn check_time(time: &NaiveTime) -> std::result::Result<(), &'static str> {
    if time.nanosecond() < 1_000_000_000 {
        Ok(())
    } else {
        Err("leap seconds cannot be written")
    }
}

fn check_offset(offset: &FixedOffset) -> std::result::Result<(), &'static str> {
    let seconds = offset.local_minus_utc();
    if seconds % 60 != 0 {
        Err("offset has a seconds part")
    } else if !OFFSET_RANGE.contains(&seconds) {
        Err("offset outside -12:00..+14:00")
    } else {
        Ok(())
    }
}

fn write_date(f: &mut fmt::Formatter<'_>, date: &NaiveDate) -> fmt::Result {
    write!(f, "{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

fn write_time(f: &mut fmt::Formatter<'_>, time: &NaiveTime) -> fmt::Result {
    write!(
        f,
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )?;
    let nanos = time.nanosecond();
    if nanos != 0 {
        let digits = format!("{:09}", nanos);
        write!(f, ".{}", digits.trim_end_matches('0'))?;
    }
    Ok(())
}

fn write_offset(f: &mut fmt::Formatter<'_>, offset: &FixedOffset) -> fmt::Result {
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return f.write_str("Z");
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    write!(f, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
}

/// Wire text without the leading `@`.
impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Date(date) => write_date(f, date),
            Temporal::Time(time) => write_time(f, time),
            Temporal::OffsetTime(ot) => {
                write_time(f, &ot.time)?;
                write_offset(f, &ot.offset)
            }
            Temporal::DateTime(dt) => {
                write_date(f, &dt.date())?;
                f.write_str("T")?;
                write_time(f, &dt.time())
            }
            Temporal::OffsetDateTime(odt) => {
                let local = odt.naive_local();
                write_date(f, &local.date())?;
                f.write_str("T")?;
                write_time(f, &local.time())?;
                write_offset(f, odt.offset())
            }
            Temporal::Zoned(zdt) => {
                write_date(f, &zdt.datetime.date())?;
                f.write_str("T")?;
                write_time(f, &zdt.datetime.time())?;
                write_offset(f, &zdt.offset)?;
                write!(f, "[{}]", zdt.zone.name())
            }
        }
    }
}

/// Parses wire text without the leading `@`, resolving zones through [`Tzdb`].
///
/// ```rust
/// use sigma::Temporal;
///
/// let t: Temporal = "2019-01-01T12:31:47Z".parse().unwrap();
/// assert_eq!(t.kind(), "offset date-time");
/// assert!("2019-13-01".parse::<Temporal>().is_err());
/// ```
impl FromStr for Temporal {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        crate::de::parse_temporal(s)
    }
}

/// Fails for values that [`Temporal::check_writable`] rejects.
impl Serialize for Temporal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.check_writable().map_err(|reason| {
            serde::ser::Error::custom(format!("unable to write temporal value: {}", reason))
        })?;
        serializer.serialize_newtype_struct(crate::value::TEMPORAL_TOKEN, &self.to_string())
    }
}

struct TemporalVisitor;

impl<'de> Visitor<'de> for TemporalVisitor {
    type Value = Temporal;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a date or time")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Temporal, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Temporal, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Deserialize<'de> for Temporal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(crate::value::TEMPORAL_TOKEN, TemporalVisitor)
    }
}

/// A Rust type that holds exactly one temporal flavor.
///
/// Implemented for the chrono types behind each flavor, so struct fields of
/// those types can go through [`with::temporal`](crate::with::temporal).
pub trait TemporalKind: Sized {
    /// Flavor name, as reported by [`Temporal::kind`].
    const KIND: &'static str;

    fn into_temporal(self) -> Temporal;

    fn from_temporal(temporal: Temporal) -> Option<Self>;
}

macro_rules! temporal_kind {
    ($($ty:ty => $variant:ident, $kind:literal),* $(,)?) => {
        $(
            impl TemporalKind for $ty {
                const KIND: &'static str = $kind;

                fn into_temporal(self) -> Temporal {
                    Temporal::$variant(self)
                }

                fn from_temporal(temporal: Temporal) -> Option<Self> {
                    match temporal {
                        Temporal::$variant(t) => Some(t),
                        _ => None,
                    }
                }
            }
        )*
    };
}

temporal_kind! {
    NaiveDate => Date, "date",
    NaiveTime => Time, "time",
    OffsetTime => OffsetTime, "offset time",
    NaiveDateTime => DateTime, "date-time",
    DateTime<FixedOffset> => OffsetDateTime, "offset date-time",
    ZonedDateTime => Zoned, "zoned date-time",
}

/// Narrows a deserialized [`Temporal`] to the flavor `T` holds.
pub(crate) fn narrow<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: TemporalKind,
    D: Deserializer<'de>,
{
    let temporal = Temporal::deserialize(deserializer)?;
    T::from_temporal(temporal)
        .ok_or_else(|| de::Error::invalid_type(Unexpected::Other(temporal.kind()), &T::KIND))
}

impl Serialize for OffsetTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Temporal::OffsetTime(*self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OffsetTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        narrow(deserializer)
    }
}

impl Serialize for ZonedDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Temporal::Zoned(*self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ZonedDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        narrow(deserializer)
    }
}

/// Resolves IANA zone identifiers.
pub trait ZoneProvider: Send + Sync {
    /// Returns the zone named `name`, or `None` if it is unknown.
    fn resolve(&self, name: &str) -> Option<Tz>;
}

/// The IANA time-zone database compiled into `chrono-tz`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tzdb;

impl ZoneProvider for Tzdb {
    fn resolve(&self, name: &str) -> Option<Tz> {
        name.parse::<Tz>().ok()
    }
}

/// Components collected while scanning a temporal literal.
#[derive(Clone, Debug)]
pub(crate) struct Parts {
    pub has_date: bool,
    pub has_time: bool,
    pub has_offset: bool,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub nanos: u32,
    pub offset_negative: bool,
    pub offset_hour: i32,
    pub offset_minute: i32,
    pub zone: Option<String>,
}

impl Default for Parts {
    fn default() -> Self {
        Parts {
            has_date: false,
            has_time: false,
            has_offset: false,
            year: 0,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            nanos: 0,
            offset_negative: false,
            offset_hour: 0,
            offset_minute: 0,
            zone: None,
        }
    }
}

/// Why collected components do not form a temporal value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AssemblyError {
    OutOfRange,
    UnknownZone(String),
    OffsetNotInZone(String),
}

impl Parts {
    /// Signed offset in seconds; the minute carries the hour's sign.
    fn offset_seconds(&self) -> i32 {
        let magnitude = self.offset_hour * 3600 + self.offset_minute * 60;
        if self.offset_negative {
            -magnitude
        } else {
            magnitude
        }
    }

    fn in_range(&self) -> bool {
        let days_in_month = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|first| {
                let next = if self.month == 12 {
                    NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
                };
                next.map(|n| n.signed_duration_since(first).num_days() as u32)
            })
            .unwrap_or(0);
        let offset = self.offset_seconds();
        (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month
            && self.hour <= 23
            && self.minute <= 59
            && self.second <= 59
            && self.offset_minute <= 59
            && OFFSET_RANGE.contains(&offset)
    }

    /// Validates the components and picks the richest variant they describe.
    pub(crate) fn assemble(
        self,
        zones: &dyn ZoneProvider,
    ) -> std::result::Result<Temporal, AssemblyError> {
        if !self.in_range() {
            return Err(AssemblyError::OutOfRange);
        }
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .ok_or(AssemblyError::OutOfRange)?;
        let time =
            NaiveTime::from_hms_nano_opt(self.hour, self.minute, self.second, self.nanos)
                .ok_or(AssemblyError::OutOfRange)?;
        let offset =
            FixedOffset::east_opt(self.offset_seconds()).ok_or(AssemblyError::OutOfRange)?;
        let local = date.and_time(time);

        if self.zone.is_some() && !(self.has_date && self.has_time) {
            return Err(AssemblyError::OutOfRange);
        }
        if let Some(name) = self.zone {
            let zone = zones
                .resolve(&name)
                .ok_or_else(|| AssemblyError::UnknownZone(name.clone()))?;
            return ZonedDateTime::new(local, offset, zone)
                .map(Temporal::Zoned)
                .ok_or(AssemblyError::OffsetNotInZone(name));
        }
        if self.has_offset && self.has_date && self.has_time {
            let odt = offset
                .from_local_datetime(&local)
                .single()
                .ok_or(AssemblyError::OutOfRange)?;
            return Ok(Temporal::OffsetDateTime(odt));
        }
        if self.has_offset && self.has_time {
            return Ok(Temporal::OffsetTime(OffsetTime::new(time, offset)));
        }
        if self.has_date && self.has_time {
            return Ok(Temporal::DateTime(local));
        }
        if self.has_date {
            return Ok(Temporal::Date(date));
        }
        Ok(Temporal::Time(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_parts(h: u32, m: u32, s: u32) -> Parts {
        Parts {
            has_time: true,
            hour: h,
            minute: m,
            second: s,
            ..Parts::default()
        }
    }

    #[test]
    fn test_display_trims_fraction() {
        let t = NaiveTime::from_hms_nano_opt(12, 31, 47, 765_400_000).unwrap();
        assert_eq!(Temporal::Time(t).to_string(), "12:31:47.7654");
        let t = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(Temporal::Time(t).to_string(), "12:00:00");
    }

    #[test]
    fn test_display_offsets() {
        let t = NaiveTime::from_hms_opt(10, 11, 12).unwrap();
        let ot = OffsetTime::new(t, FixedOffset::east_opt(11 * 3600 + 20 * 60).unwrap());
        assert_eq!(Temporal::OffsetTime(ot).to_string(), "10:11:12+11:20");
        let ot = OffsetTime::new(t, FixedOffset::west_opt(90 * 60).unwrap());
        assert_eq!(Temporal::OffsetTime(ot).to_string(), "10:11:12-01:30");
        let ot = OffsetTime::new(t, FixedOffset::east_opt(0).unwrap());
        assert_eq!(Temporal::OffsetTime(ot).to_string(), "10:11:12Z");
    }

    #[test]
    fn test_leap_year_days() {
        let mut parts = Parts {
            has_date: true,
            year: 2020,
            month: 2,
            day: 29,
            ..Parts::default()
        };
        assert!(parts.clone().assemble(&Tzdb).is_ok());
        parts.year = 2019;
        assert_eq!(parts.assemble(&Tzdb), Err(AssemblyError::OutOfRange));
    }

    #[test]
    fn test_offset_bounds() {
        let mut parts = time_parts(1, 2, 3);
        parts.has_offset = true;
        parts.offset_hour = 14;
        assert!(parts.clone().assemble(&Tzdb).is_ok());
        parts.offset_minute = 1;
        assert_eq!(parts.clone().assemble(&Tzdb), Err(AssemblyError::OutOfRange));

        parts.offset_negative = true;
        parts.offset_hour = 12;
        parts.offset_minute = 0;
        assert!(parts.clone().assemble(&Tzdb).is_ok());
        parts.offset_minute = 30;
        assert_eq!(parts.assemble(&Tzdb), Err(AssemblyError::OutOfRange));
    }

    #[test]
    fn test_negative_offset_minute_follows_hour_sign() {
        let mut parts = time_parts(1, 2, 3);
        parts.has_offset = true;
        parts.offset_negative = true;
        parts.offset_hour = 1;
        parts.offset_minute = 30;
        match parts.assemble(&Tzdb).unwrap() {
            Temporal::OffsetTime(ot) => assert_eq!(ot.offset.local_minus_utc(), -5400),
            other => panic!("Expected offset time, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_zone() {
        let parts = Parts {
            has_date: true,
            has_time: true,
            has_offset: true,
            year: 2019,
            zone: Some("Mars/Olympus".to_string()),
            ..Parts::default()
        };
        assert_eq!(
            parts.assemble(&Tzdb),
            Err(AssemblyError::UnknownZone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn test_zoned_to_datetime() {
        let local = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let zone: Tz = "Australia/Hobart".parse().unwrap();
        let zdt = ZonedDateTime::new(local, FixedOffset::east_opt(11 * 3600).unwrap(), zone)
            .unwrap();
        assert_eq!(zdt.to_datetime().unwrap().naive_local(), local);
    }

    #[test]
    fn test_zoned_to_datetime_out_of_range() {
        let zone: Tz = "Etc/GMT+12".parse().unwrap();
        let zdt = ZonedDateTime {
            datetime: NaiveDateTime::MAX,
            offset: FixedOffset::west_opt(12 * 3600).unwrap(),
            zone,
        };
        assert!(zdt.to_datetime().is_none());
    }

    #[test]
    fn test_zone_requires_date_and_time() {
        let mut parts = time_parts(12, 0, 0);
        parts.has_offset = true;
        parts.zone = Some("UTC".to_string());
        assert_eq!(parts.assemble(&Tzdb), Err(AssemblyError::OutOfRange));
    }

    #[test]
    fn test_check_writable() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let offset = |s| OffsetTime::new(noon, FixedOffset::east_opt(s).unwrap());
        assert_eq!(
            Temporal::OffsetTime(offset(3659)).check_writable(),
            Err("offset has a seconds part")
        );
        assert_eq!(
            Temporal::OffsetTime(offset(15 * 3600)).check_writable(),
            Err("offset outside -12:00..+14:00")
        );
        assert!(Temporal::OffsetTime(offset(-12 * 3600)).check_writable().is_ok());

        let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        assert_eq!(
            Temporal::Date(far).check_writable(),
            Err("year outside 0000..9999")
        );
        let before = NaiveDate::from_ymd_opt(-1, 12, 31).unwrap();
        assert!(Temporal::DateTime(before.and_time(noon)).check_writable().is_err());

        let leap = NaiveTime::from_hms_milli_opt(23, 59, 59, 1500).unwrap();
        assert!(Temporal::Time(leap).check_writable().is_err());
    }

    #[test]
    fn test_from_str() {
        let t: Temporal = "12:31:47.7654".parse().unwrap();
        assert_eq!(t.to_string(), "12:31:47.7654");
        assert!("".parse::<Temporal>().is_err());
        assert!("2019-01-01 trailing".parse::<Temporal>().is_err());
    }
}
