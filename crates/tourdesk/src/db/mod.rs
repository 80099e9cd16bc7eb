/// Database module for managing tours, students, registrations, and settings

mod error;
pub mod status;
mod types;

pub use error::StoreError;
pub use types::{
    DbRegistration, DbSettings, DbStudent, DbTour, NewStudent, NewTour, RegistrationDetails,
    SettingsPatch, TourDetails, TourPatch,
};

use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::status::{compute_status, remaining_seats};

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_tours.sql");

/// Length of the human-readable confirmation code on a registration.
const CODE_LENGTH: usize = 5;

pub struct TourDbManager {
    db: Mutex<Connection>,
}

impl TourDbManager {
    /// Creates a new TourDbManager and initializes the database schema
    pub fn new(db_path: &str) -> Self {
        let conn = Connection::open(db_path).expect("Failed to open database");
        Self::with_connection(conn)
    }

    /// Creates a manager backed by an in-memory database (used by tests).
    pub fn new_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Self {
        conn.execute_batch(SCHEMA_SQL)
            .expect("Failed to initialize database schema");

        Self {
            db: Mutex::new(conn),
        }
    }

    /// Reads the global settings row.
    pub fn get_settings(&self) -> Result<DbSettings, StoreError> {
        let db = self.db.lock().unwrap();
        Ok(settings_row(&db)?)
    }

    /// Applies a partial update to the global settings and returns the result.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<DbSettings, StoreError> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE settings
             SET max_tours_per_student = COALESCE(?1, max_tours_per_student),
                 filling_fast_threshold = COALESCE(?2, filling_fast_threshold),
                 announcement = COALESCE(?3, announcement)
             WHERE id = 1",
            params![
                patch.max_tours_per_student,
                patch.filling_fast_threshold,
                patch.announcement,
            ],
        )?;
        Ok(settings_row(&db)?)
    }

    /// Lists all tours ordered by start time, with derived status.
    pub fn list_tours(&self) -> Result<Vec<TourDetails>, StoreError> {
        let db = self.db.lock().unwrap();
        let settings = settings_row(&db)?;

        let mut stmt = db.prepare(
            "SELECT id, name, start_time, end_time, capacity, registered, checked_in,
                    status_override, paused, canceled
             FROM tours
             ORDER BY start_time ASC",
        )?;
        let tours = stmt
            .query_map([], read_tour)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tours
            .into_iter()
            .map(|tour| with_status(tour, settings.filling_fast_threshold))
            .collect())
    }

    /// Gets a single tour by id with derived status.
    pub fn get_tour(&self, id: &str) -> Result<TourDetails, StoreError> {
        let db = self.db.lock().unwrap();
        let settings = settings_row(&db)?;
        let tour = fetch_tour(&db, id)?.ok_or(StoreError::TourNotFound)?;
        Ok(with_status(tour, settings.filling_fast_threshold))
    }

    /// Creates a tour with zeroed counters and returns it.
    pub fn create_tour(&self, new_tour: NewTour) -> Result<TourDetails, StoreError> {
        let db = self.db.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        db.execute(
            "INSERT INTO tours (id, name, start_time, end_time, capacity, registered,
                                checked_in, paused, canceled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0, 0, ?6, ?6)",
            params![
                id,
                new_tour.name,
                new_tour.start_time,
                new_tour.end_time,
                new_tour.capacity,
                now,
            ],
        )?;

        let settings = settings_row(&db)?;
        let tour = fetch_tour(&db, &id)?.ok_or(StoreError::TourNotFound)?;
        Ok(with_status(tour, settings.filling_fast_threshold))
    }

    /// Applies a partial update to a tour.
    ///
    /// Capacity may not drop below the current registered count. A
    /// `status_override` in the patch replaces the stored override outright,
    /// so `StatusOverride::None` clears it.
    pub fn update_tour(&self, id: &str, patch: TourPatch) -> Result<TourDetails, StoreError> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let tour = fetch_tour(&tx, id)?.ok_or(StoreError::TourNotFound)?;
        if let Some(capacity) = patch.capacity {
            if capacity < tour.registered {
                return Err(StoreError::InvalidCapacity);
            }
        }

        let now = now_rfc3339();
        tx.execute(
            "UPDATE tours
             SET name = COALESCE(?1, name),
                 start_time = COALESCE(?2, start_time),
                 end_time = COALESCE(?3, end_time),
                 capacity = COALESCE(?4, capacity),
                 paused = COALESCE(?5, paused),
                 canceled = COALESCE(?6, canceled),
                 updated_at = ?7
             WHERE id = ?8",
            params![
                patch.name,
                patch.start_time,
                patch.end_time,
                patch.capacity,
                patch.paused,
                patch.canceled,
                now,
                id,
            ],
        )?;

        if let Some(status_override) = patch.status_override {
            tx.execute(
                "UPDATE tours SET status_override = ?1 WHERE id = ?2",
                params![status_override.as_column_value(), id],
            )?;
        }

        let settings = settings_row(&tx)?;
        let tour = fetch_tour(&tx, id)?.ok_or(StoreError::TourNotFound)?;
        tx.commit()?;
        Ok(with_status(tour, settings.filling_fast_threshold))
    }

    /// Pauses a tour (registrations are rejected while paused).
    pub fn pause_tour(&self, id: &str) -> Result<TourDetails, StoreError> {
        self.update_tour(
            id,
            TourPatch {
                paused: Some(true),
                ..Default::default()
            },
        )
    }

    /// Resumes a paused tour.
    pub fn resume_tour(&self, id: &str) -> Result<TourDetails, StoreError> {
        self.update_tour(
            id,
            TourPatch {
                paused: Some(false),
                ..Default::default()
            },
        )
    }

    /// Cancels a tour. A canceled tour is also paused.
    pub fn cancel_tour(&self, id: &str) -> Result<TourDetails, StoreError> {
        self.update_tour(
            id,
            TourPatch {
                paused: Some(true),
                canceled: Some(true),
                ..Default::default()
            },
        )
    }

    /// Reinstates a canceled tour, clearing both flags.
    pub fn uncancel_tour(&self, id: &str) -> Result<TourDetails, StoreError> {
        self.update_tour(
            id,
            TourPatch {
                paused: Some(false),
                canceled: Some(false),
                ..Default::default()
            },
        )
    }

    /// Deletes a tour and all of its registrations.
    pub fn delete_tour(&self, id: &str) -> Result<(), StoreError> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        fetch_tour(&tx, id)?.ok_or(StoreError::TourNotFound)?;
        tx.execute("DELETE FROM registrations WHERE tour_id = ?1", params![id])?;
        tx.execute("DELETE FROM tours WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(())
    }

    /// Searches students by name, email, or student id (case-insensitive).
    ///
    /// An empty query returns an empty list without touching the store.
    pub fn search_students(&self, query: &str) -> Result<Vec<DbStudent>, StoreError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let db = self.db.lock().unwrap();
        let pattern = format!("%{}%", query.to_lowercase());
        let mut stmt = db.prepare(
            "SELECT id, name, email, student_id
             FROM students
             WHERE LOWER(name) LIKE ?1 OR LOWER(email) LIKE ?1 OR LOWER(student_id) LIKE ?1
             ORDER BY name ASC
             LIMIT 25",
        )?;
        let students = stmt
            .query_map([pattern], read_student)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    /// Creates a student, or updates name/student id if the email exists.
    pub fn upsert_student(&self, new_student: NewStudent) -> Result<DbStudent, StoreError> {
        let db = self.db.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        db.execute(
            "INSERT INTO students (id, name, email, student_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (email)
             DO UPDATE SET name = excluded.name,
                           student_id = excluded.student_id,
                           updated_at = excluded.updated_at",
            params![
                id,
                new_student.name,
                new_student.email,
                new_student.student_id,
                now,
            ],
        )?;

        let student = db.query_row(
            "SELECT id, name, email, student_id FROM students WHERE email = ?1",
            params![new_student.email],
            read_student,
        )?;
        Ok(student)
    }

    /// Lists registrations, optionally filtered by tour and/or student.
    pub fn list_registrations(
        &self,
        tour_id: Option<&str>,
        student_id: Option<&str>,
    ) -> Result<Vec<RegistrationDetails>, StoreError> {
        let db = self.db.lock().unwrap();
        let settings = settings_row(&db)?;

        let mut stmt = db.prepare(
            "SELECT r.id, r.student_id, r.tour_id, r.code, r.checked_in, r.created_at,
                    s.id, s.name, s.email, s.student_id,
                    t.id, t.name, t.start_time, t.end_time, t.capacity, t.registered,
                    t.checked_in, t.status_override, t.paused, t.canceled
             FROM registrations r
             JOIN students s ON s.id = r.student_id
             JOIN tours t ON t.id = r.tour_id
             WHERE (?1 IS NULL OR r.tour_id = ?1)
               AND (?2 IS NULL OR r.student_id = ?2)
             ORDER BY r.created_at DESC",
        )?;

        let rows = stmt
            .query_map(params![tour_id, student_id], |row| {
                Ok((
                    DbRegistration {
                        id: row.get(0)?,
                        student_id: row.get(1)?,
                        tour_id: row.get(2)?,
                        code: row.get(3)?,
                        checked_in: row.get(4)?,
                        created_at: row.get(5)?,
                    },
                    DbStudent {
                        id: row.get(6)?,
                        name: row.get(7)?,
                        email: row.get(8)?,
                        student_id: row.get(9)?,
                    },
                    DbTour {
                        id: row.get(10)?,
                        name: row.get(11)?,
                        start_time: row.get(12)?,
                        end_time: row.get(13)?,
                        capacity: row.get(14)?,
                        registered: row.get(15)?,
                        checked_in: row.get(16)?,
                        status_override: row.get(17)?,
                        paused: row.get(18)?,
                        canceled: row.get(19)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|(registration, student, tour)| RegistrationDetails {
                registration,
                student,
                tour: with_status(tour, settings.filling_fast_threshold),
            })
            .collect())
    }

    /// Registers a student for a tour.
    ///
    /// The seat is claimed with a conditional increment
    /// (`registered = registered + 1 ... WHERE registered < capacity`) inside
    /// the same transaction as the insert, so two racing registrations can
    /// never overbook the tour.
    pub fn create_registration(
        &self,
        tour_id: &str,
        student_id: &str,
    ) -> Result<(DbRegistration, TourDetails), StoreError> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let settings = settings_row(&tx)?;
        let tour = fetch_tour(&tx, tour_id)?.ok_or(StoreError::TourNotFound)?;
        if tour.canceled {
            return Err(StoreError::TourCanceled);
        }
        if tour.paused {
            return Err(StoreError::TourPaused);
        }

        let already_registered: i64 = tx.query_row(
            "SELECT COUNT(*) FROM registrations WHERE student_id = ?1 AND tour_id = ?2",
            params![student_id, tour_id],
            |row| row.get(0),
        )?;
        if already_registered > 0 {
            return Err(StoreError::AlreadyRegistered);
        }

        let distinct_tours: i64 = tx.query_row(
            "SELECT COUNT(DISTINCT tour_id) FROM registrations WHERE student_id = ?1",
            params![student_id],
            |row| row.get(0),
        )?;
        if distinct_tours >= settings.max_tours_per_student {
            return Err(StoreError::TourLimitReached);
        }

        let registration = insert_registration(&tx, tour_id, student_id)?;

        let tour = fetch_tour(&tx, tour_id)?.ok_or(StoreError::TourNotFound)?;
        tx.commit()?;
        Ok((
            registration,
            with_status(tour, settings.filling_fast_threshold),
        ))
    }

    /// Registers a walk-in visitor.
    ///
    /// Creates a synthetic student record (placeholder email under
    /// `walkin.local`), so the duplicate and per-student limit checks do not
    /// apply; capacity and canceled/paused checks still do. Nothing is
    /// persisted when the tour has no seats left.
    pub fn create_walk_in_registration(
        &self,
        tour_id: &str,
        name: &str,
    ) -> Result<(DbRegistration, TourDetails), StoreError> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let settings = settings_row(&tx)?;
        let tour = fetch_tour(&tx, tour_id)?.ok_or(StoreError::TourNotFound)?;
        if tour.canceled {
            return Err(StoreError::TourCanceled);
        }
        if tour.paused {
            return Err(StoreError::TourPaused);
        }

        let student_id = Uuid::new_v4().to_string();
        let email = format!("{student_id}@walkin.local");
        let now = now_rfc3339();
        tx.execute(
            "INSERT INTO students (id, name, email, student_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?1, ?4, ?4)",
            params![student_id, name, email, now],
        )?;

        let registration = insert_registration(&tx, tour_id, &student_id)?;

        let tour = fetch_tour(&tx, tour_id)?.ok_or(StoreError::TourNotFound)?;
        tx.commit()?;
        Ok((
            registration,
            with_status(tour, settings.filling_fast_threshold),
        ))
    }

    /// Toggles the check-in flag on a registration.
    ///
    /// The identifier may be the registration id or the confirmation code
    /// (case-insensitive). Returns the registration id and its new state.
    pub fn toggle_check_in(&self, identifier: &str) -> Result<(String, bool), StoreError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(StoreError::RegistrationNotFound);
        }

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let row: Option<(String, String, bool)> = tx
            .query_row(
                "SELECT id, tour_id, checked_in
                 FROM registrations
                 WHERE id = ?1 OR LOWER(code) = LOWER(?1)",
                params![identifier],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (id, tour_id, checked_in) = row.ok_or(StoreError::RegistrationNotFound)?;

        let new_checked_in = !checked_in;
        tx.execute(
            "UPDATE registrations SET checked_in = ?1 WHERE id = ?2",
            params![new_checked_in, id],
        )?;
        tx.execute(
            "UPDATE tours
             SET checked_in = MAX(checked_in + ?1, 0), updated_at = ?2
             WHERE id = ?3",
            params![if new_checked_in { 1 } else { -1 }, now_rfc3339(), tour_id],
        )?;

        tx.commit()?;
        Ok((id, new_checked_in))
    }

    /// Removes a registration and releases its seat.
    ///
    /// Both tour counters are floored at zero.
    pub fn remove_registration(&self, id: &str) -> Result<DbRegistration, StoreError> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let registration = tx
            .query_row(
                "SELECT id, student_id, tour_id, code, checked_in, created_at
                 FROM registrations
                 WHERE id = ?1",
                params![id],
                read_registration,
            )
            .optional()?
            .ok_or(StoreError::RegistrationNotFound)?;

        tx.execute("DELETE FROM registrations WHERE id = ?1", params![id])?;
        tx.execute(
            "UPDATE tours
             SET registered = MAX(registered - 1, 0),
                 checked_in = MAX(checked_in - ?1, 0),
                 updated_at = ?2
             WHERE id = ?3",
            params![
                if registration.checked_in { 1 } else { 0 },
                now_rfc3339(),
                registration.tour_id,
            ],
        )?;

        tx.commit()?;
        Ok(registration)
    }
}

/// Claims a seat and inserts the registration row.
///
/// The conditional `WHERE registered < capacity` is the capacity check; if
/// no row is updated the tour is full and nothing else may be written.
fn insert_registration(
    conn: &Connection,
    tour_id: &str,
    student_id: &str,
) -> Result<DbRegistration, StoreError> {
    let now = now_rfc3339();
    let updated = conn.execute(
        "UPDATE tours
         SET registered = registered + 1, updated_at = ?1
         WHERE id = ?2 AND registered < capacity",
        params![now, tour_id],
    )?;
    if updated == 0 {
        return Err(StoreError::InsufficientCapacity);
    }

    let registration = DbRegistration {
        id: Uuid::new_v4().to_string(),
        student_id: student_id.to_string(),
        tour_id: tour_id.to_string(),
        code: generate_code(),
        checked_in: false,
        created_at: now,
    };
    conn.execute(
        "INSERT INTO registrations (id, student_id, tour_id, code, checked_in, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![
            registration.id,
            registration.student_id,
            registration.tour_id,
            registration.code,
            registration.created_at,
        ],
    )?;
    Ok(registration)
}

/// Generates a short confirmation code.
///
/// Ambiguous characters (0/O, 1/I) are excluded so codes survive being read
/// aloud at the check-in desk.
fn generate_code() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn settings_row(conn: &Connection) -> rusqlite::Result<DbSettings> {
    conn.query_row(
        "SELECT max_tours_per_student, filling_fast_threshold, announcement
         FROM settings
         WHERE id = 1",
        [],
        |row| {
            Ok(DbSettings {
                max_tours_per_student: row.get(0)?,
                filling_fast_threshold: row.get(1)?,
                announcement: row.get(2)?,
            })
        },
    )
}

fn fetch_tour(conn: &Connection, id: &str) -> rusqlite::Result<Option<DbTour>> {
    conn.query_row(
        "SELECT id, name, start_time, end_time, capacity, registered, checked_in,
                status_override, paused, canceled
         FROM tours
         WHERE id = ?1",
        params![id],
        read_tour,
    )
    .optional()
}

fn read_tour(row: &Row<'_>) -> rusqlite::Result<DbTour> {
    Ok(DbTour {
        id: row.get(0)?,
        name: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        capacity: row.get(4)?,
        registered: row.get(5)?,
        checked_in: row.get(6)?,
        status_override: row.get(7)?,
        paused: row.get(8)?,
        canceled: row.get(9)?,
    })
}

fn read_student(row: &Row<'_>) -> rusqlite::Result<DbStudent> {
    Ok(DbStudent {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        student_id: row.get(3)?,
    })
}

fn read_registration(row: &Row<'_>) -> rusqlite::Result<DbRegistration> {
    Ok(DbRegistration {
        id: row.get(0)?,
        student_id: row.get(1)?,
        tour_id: row.get(2)?,
        code: row.get(3)?,
        checked_in: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn with_status(tour: DbTour, filling_fast_threshold: f64) -> TourDetails {
    let remaining = remaining_seats(tour.capacity, tour.registered);
    let status = compute_status(&tour, filling_fast_threshold);
    TourDetails {
        tour,
        remaining,
        status,
    }
}
