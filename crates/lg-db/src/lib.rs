//! Storage layer for the lodging log.
//!
//! Provides the stays, homes, stay locations, and region hierarchy using
//! `rusqlite`.
//!
//! # Schema
//!
//! ## Date Format
//!
//! Dates are stored as TEXT in ISO 8601 calendar format (e.g., `2024-01-15`),
//! so lexicographic ordering matches chronological ordering.
//!
//! ## Nights
//!
//! A stay row records its checkout date and the number of nights before it.
//! The optional `absence_flags` column holds one `P` or `A` per night, oldest
//! night first.

use std::path::Path;

use chrono::NaiveDate;
use lg_core::{LocationKey, Purpose, Region, RegionKey, StayRecord, TimelineError};
use rusqlite::{Connection, params};
use thiserror::Error;

/// Location kind of stays spent in transit.
pub const TRANSIT_KIND: &str = "Flight";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored date is not in `YYYY-MM-DD` form.
    #[error("invalid date in {table} row {fid}: {value}")]
    InvalidDate {
        table: &'static str,
        fid: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored value failed domain validation.
    #[error("invalid value in {table} row {fid}: {message}")]
    InvalidValue {
        table: &'static str,
        fid: i64,
        message: String,
    },
    /// A stay row does not describe a valid stay.
    #[error("invalid stay {fid}")]
    InvalidStay {
        fid: i64,
        #[source]
        source: TimelineError,
    },
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

/// A stay ready to be stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStay {
    pub check_out_date: NaiveDate,
    pub nights: u32,
    pub purpose: Purpose,
    pub stay_location_fid: i64,
    pub absence_flags: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened lodging log");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS regions (
                fid INTEGER PRIMARY KEY,
                iso_3166 TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                parent_region_fid INTEGER,
                FOREIGN KEY (parent_region_fid) REFERENCES regions(fid) ON DELETE SET NULL
            );

            -- kind: 'Hotel', 'Residence', 'Flight', ...
            CREATE TABLE IF NOT EXISTS stay_locations (
                fid INTEGER PRIMARY KEY,
                key TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                region_fid INTEGER,
                FOREIGN KEY (region_fid) REFERENCES regions(fid) ON DELETE SET NULL
            );

            -- check_out_date: ISO 8601 date (e.g., '2024-01-15')
            -- purpose: 'Business' or 'Personal'
            -- absence_flags: one 'P' or 'A' per night, oldest first
            CREATE TABLE IF NOT EXISTS stays (
                fid INTEGER PRIMARY KEY,
                check_out_date TEXT NOT NULL,
                nights INTEGER NOT NULL,
                purpose TEXT NOT NULL,
                stay_location_fid INTEGER NOT NULL,
                absence_flags TEXT,
                FOREIGN KEY (stay_location_fid) REFERENCES stay_locations(fid)
            );

            CREATE INDEX IF NOT EXISTS idx_stays_check_out ON stays(check_out_date);

            CREATE TABLE IF NOT EXISTS homes (
                fid INTEGER PRIMARY KEY,
                move_in_date TEXT NOT NULL,
                stay_location_fid INTEGER NOT NULL,
                FOREIGN KEY (stay_location_fid) REFERENCES stay_locations(fid)
            );

            CREATE INDEX IF NOT EXISTS idx_homes_move_in ON homes(move_in_date);
            ",
        )?;
        Ok(())
    }

    // ========== Writes ==========

    /// Inserts a region and returns its fid.
    pub fn insert_region(
        &mut self,
        iso_3166: &str,
        name: &str,
        parent_region_fid: Option<i64>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO regions (iso_3166, name, parent_region_fid) VALUES (?, ?, ?)",
            params![iso_3166, name, parent_region_fid],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts a stay location and returns its fid.
    pub fn insert_stay_location(
        &mut self,
        key: &str,
        name: &str,
        kind: &str,
        region_fid: Option<i64>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO stay_locations (key, name, kind, region_fid) VALUES (?, ?, ?, ?)",
            params![key, name, kind, region_fid],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts a batch of stays in one transaction and returns how many were stored.
    pub fn insert_stays(&mut self, stays: &[NewStay]) -> Result<usize, DbError> {
        if stays.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO stays
                (check_out_date, nights, purpose, stay_location_fid, absence_flags)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for stay in stays {
                inserted += stmt.execute(params![
                    format_date(stay.check_out_date),
                    stay.nights,
                    stay.purpose.as_str(),
                    stay.stay_location_fid,
                    stay.absence_flags,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Inserts a home change and returns its fid.
    pub fn insert_home(
        &mut self,
        move_in_date: NaiveDate,
        stay_location_fid: i64,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO homes (move_in_date, stay_location_fid) VALUES (?, ?)",
            params![format_date(move_in_date), stay_location_fid],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ========== Reads ==========

    /// Lists all stays ordered by checkout date then fid.
    pub fn stays(&self) -> Result<Vec<StayRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT stays.fid, check_out_date, nights, purpose, stay_locations.key, absence_flags
            FROM stays
            JOIN stay_locations ON stays.stay_location_fid = stay_locations.fid
            ORDER BY check_out_date ASC, stays.fid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StayRow {
                fid: row.get(0)?,
                check_out_date: row.get(1)?,
                nights: row.get(2)?,
                purpose: row.get(3)?,
                location_key: row.get(4)?,
                absence_flags: row.get(5)?,
            })
        })?;
        let mut stays = Vec::new();
        for row in rows {
            stays.push(row?.into_record()?);
        }
        tracing::debug!(stays = stays.len(), "loaded stays");
        Ok(stays)
    }

    /// Lists all regions ordered by fid.
    pub fn regions(&self) -> Result<Vec<Region>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT fid, iso_3166, name, parent_region_fid FROM regions ORDER BY fid ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?;
        let mut regions = Vec::new();
        for row in rows {
            let (fid, iso_3166, name, parent_fid) = row?;
            let iso_3166 = RegionKey::new(iso_3166).map_err(|e| DbError::InvalidValue {
                table: "regions",
                fid,
                message: e.to_string(),
            })?;
            regions.push(Region {
                fid,
                iso_3166,
                name,
                parent_fid,
            });
        }
        Ok(regions)
    }

    /// Returns the earliest morning the traveler was present at any stay.
    ///
    /// Nights flagged absent do not count, so a stay that opens with absent
    /// nights starts at its first present morning.
    pub fn first_morning(&self) -> Result<Option<NaiveDate>, DbError> {
        Ok(self
            .stays()?
            .iter()
            .filter_map(|stay| stay.present_mornings().next())
            .min())
    }

    /// Lists the distinct regions of stay locations with at least one present night.
    ///
    /// Stays flagged absent on every night are skipped. With `exclude_transit`,
    /// locations of kind [`TRANSIT_KIND`] are skipped too.
    pub fn stayed_region_fids(&self, exclude_transit: bool) -> Result<Vec<i64>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT DISTINCT stay_locations.region_fid
            FROM stays
            JOIN stay_locations ON stays.stay_location_fid = stay_locations.fid
            WHERE stay_locations.region_fid IS NOT NULL
              AND (stays.absence_flags IS NULL OR instr(stays.absence_flags, 'P') > 0)
              AND (?1 = 0 OR stay_locations.kind <> ?2)
            ORDER BY stay_locations.region_fid ASC
            ",
        )?;
        let rows = stmt.query_map(params![exclude_transit, TRANSIT_KIND], |row| row.get(0))?;
        let mut fids = Vec::new();
        for row in rows {
            fids.push(row?);
        }
        Ok(fids)
    }

    /// Lists the distinct regions of home locations.
    pub fn home_region_fids(&self) -> Result<Vec<i64>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT DISTINCT stay_locations.region_fid
            FROM homes
            JOIN stay_locations ON homes.stay_location_fid = stay_locations.fid
            WHERE stay_locations.region_fid IS NOT NULL
            ORDER BY stay_locations.region_fid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut fids = Vec::new();
        for row in rows {
            fids.push(row?);
        }
        Ok(fids)
    }
}

/// A stay row as stored, before validation.
struct StayRow {
    fid: i64,
    check_out_date: String,
    nights: i64,
    purpose: String,
    location_key: String,
    absence_flags: Option<String>,
}

impl StayRow {
    fn into_record(self) -> Result<StayRecord, DbError> {
        let fid = self.fid;
        let check_out_date = parse_date(&self.check_out_date, "stays", fid)?;
        let nights = u32::try_from(self.nights).map_err(|_| DbError::InvalidValue {
            table: "stays",
            fid,
            message: format!("nights out of range: {}", self.nights),
        })?;
        let purpose: Purpose = self.purpose.parse().map_err(|e: lg_core::ValidationError| {
            DbError::InvalidValue {
                table: "stays",
                fid,
                message: e.to_string(),
            }
        })?;
        let location = location_key(self.location_key, "stays", fid)?;

        StayRecord::new(
            check_out_date,
            nights,
            location,
            purpose,
            self.absence_flags.as_deref(),
        )
        .map_err(|source| DbError::InvalidStay { fid, source })
    }
}

fn location_key(key: String, table: &'static str, fid: i64) -> Result<LocationKey, DbError> {
    LocationKey::new(key).map_err(|e| DbError::InvalidValue {
        table,
        fid,
        message: e.to_string(),
    })
}

fn parse_date(value: &str, table: &'static str, fid: i64) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::InvalidDate {
        table,
        fid,
        value: value.to_string(),
        source,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn stay(check_out_date: NaiveDate, nights: u32, location: i64) -> NewStay {
        NewStay {
            check_out_date,
            nights,
            purpose: Purpose::Business,
            stay_location_fid: location,
            absence_flags: None,
        }
    }

    /// Two regions (US > US-CA), a hotel in US-CA, and a flight in US.
    fn seeded() -> (Database, i64, i64) {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let us = db.insert_region("US", "United States", None).unwrap();
        let ca = db.insert_region("US-CA", "California", Some(us)).unwrap();
        let hotel = db
            .insert_stay_location("hotel-sf", "Hotel SF", "Hotel", Some(ca))
            .unwrap();
        let flight = db
            .insert_stay_location("flight-1", "Overnight Flight", TRANSIT_KIND, Some(us))
            .unwrap();
        (db, hotel, flight)
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(
            table_columns(&db.conn, "regions"),
            vec!["fid", "iso_3166", "name", "parent_region_fid"]
        );
        assert_eq!(
            table_columns(&db.conn, "stay_locations"),
            vec!["fid", "key", "name", "kind", "region_fid"]
        );
        assert_eq!(
            table_columns(&db.conn, "stays"),
            vec![
                "fid",
                "check_out_date",
                "nights",
                "purpose",
                "stay_location_fid",
                "absence_flags"
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "homes"),
            vec!["fid", "move_in_date", "stay_location_fid"]
        );
    }

    #[test]
    fn reopening_file_database_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lodging.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.insert_region("US", "United States", None).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.regions().unwrap().len(), 1);
    }

    #[test]
    fn stays_are_ordered_by_checkout() {
        let (mut db, hotel, flight) = seeded();
        let mut with_flags = stay(date(2021, 6, 5), 3, hotel);
        with_flags.absence_flags = Some("APP".to_string());
        let inserted = db
            .insert_stays(&[with_flags, stay(date(2021, 6, 1), 1, flight)])
            .unwrap();
        assert_eq!(inserted, 2);

        let stays = db.stays().unwrap();
        let summary: Vec<_> = stays
            .iter()
            .map(|s| (s.checkout_date(), s.nights(), s.location().as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (date(2021, 6, 1), 1, "flight-1"),
                (date(2021, 6, 5), 3, "hotel-sf"),
            ]
        );
        let present: Vec<_> = stays[1].present_mornings().collect();
        assert_eq!(present, vec![date(2021, 6, 4), date(2021, 6, 5)]);
    }

    #[test]
    fn invalid_purpose_is_reported_with_row() {
        let (db, hotel, _) = seeded();
        db.conn
            .execute(
                "INSERT INTO stays (check_out_date, nights, purpose, stay_location_fid) VALUES ('2021-06-05', 1, 'Vacation', ?)",
                [hotel],
            )
            .unwrap();
        let err = db.stays().unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidValue { table: "stays", .. }
        ));
    }

    #[test]
    fn malformed_absence_flags_are_rejected() {
        let (mut db, hotel, _) = seeded();
        let mut bad = stay(date(2021, 6, 5), 3, hotel);
        bad.absence_flags = Some("PP".to_string());
        db.insert_stays(&[bad]).unwrap();
        assert!(matches!(
            db.stays().unwrap_err(),
            DbError::InvalidStay {
                source: TimelineError::MalformedAbsenceFlags { .. },
                ..
            }
        ));
    }

    #[test]
    fn invalid_date_is_reported() {
        let (db, hotel, _) = seeded();
        db.conn
            .execute(
                "INSERT INTO stays (check_out_date, nights, purpose, stay_location_fid) VALUES ('June 2021', 1, 'Business', ?)",
                [hotel],
            )
            .unwrap();
        assert!(matches!(
            db.stays().unwrap_err(),
            DbError::InvalidDate { table: "stays", .. }
        ));
    }

    #[test]
    fn first_morning_accounts_for_nights() {
        let (mut db, hotel, flight) = seeded();
        assert_eq!(db.first_morning().unwrap(), None);

        db.insert_stays(&[
            stay(date(2021, 6, 5), 1, flight),
            stay(date(2021, 6, 10), 8, hotel),
        ])
        .unwrap();
        assert_eq!(db.first_morning().unwrap(), Some(date(2021, 6, 3)));
    }

    #[test]
    fn first_morning_skips_absent_nights() {
        let (mut db, hotel, flight) = seeded();
        let mut absent = stay(date(2021, 6, 3), 2, flight);
        absent.absence_flags = Some("AA".to_string());
        let mut late_start = stay(date(2021, 6, 8), 3, hotel);
        late_start.absence_flags = Some("APP".to_string());
        db.insert_stays(&[stay(date(2021, 6, 5), 1, hotel), absent, late_start])
            .unwrap();
        assert_eq!(db.first_morning().unwrap(), Some(date(2021, 6, 5)));
    }

    #[test]
    fn stayed_regions_can_exclude_transit() {
        let (mut db, hotel, flight) = seeded();
        db.insert_stays(&[
            stay(date(2021, 6, 1), 1, flight),
            stay(date(2021, 6, 5), 3, hotel),
        ])
        .unwrap();

        assert_eq!(db.stayed_region_fids(false).unwrap(), vec![1, 2]);
        assert_eq!(db.stayed_region_fids(true).unwrap(), vec![2]);
    }

    #[test]
    fn stayed_regions_skip_fully_absent_stays() {
        let (mut db, hotel, _) = seeded();
        let gb = db.insert_region("GB", "United Kingdom", None).unwrap();
        let london = db
            .insert_stay_location("hotel-london", "Hotel London", "Hotel", Some(gb))
            .unwrap();
        let mut absent = stay(date(2021, 7, 2), 2, london);
        absent.absence_flags = Some("AA".to_string());
        let mut partly = stay(date(2021, 6, 5), 2, hotel);
        partly.absence_flags = Some("AP".to_string());
        db.insert_stays(&[partly, absent]).unwrap();

        assert_eq!(db.stayed_region_fids(true).unwrap(), vec![2]);
    }

    #[test]
    fn home_regions_are_distinct() {
        let (mut db, hotel, _) = seeded();
        let house = db
            .insert_stay_location("house", "House", "Residence", Some(1))
            .unwrap();
        db.insert_home(date(2020, 3, 1), house).unwrap();
        db.insert_home(date(2019, 1, 1), hotel).unwrap();
        db.insert_home(date(2021, 1, 1), house).unwrap();

        assert_eq!(db.home_region_fids().unwrap(), vec![1, 2]);
    }
}
