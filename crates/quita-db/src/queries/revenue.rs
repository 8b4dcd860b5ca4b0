//! Monthly revenue aggregation.
//!
//! A role-holder's trailing monthly revenue is the sum of paid
//! down-payment and installment amounts attributed to them whose payment
//! timestamp falls inside one UTC calendar month. Acquisition fees never
//! count toward revenue. The aggregate is read at computation time, so
//! every payment already recorded in the month is included.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;

use quita_types::entry::Role;
use quita_types::UserId;

use crate::{DbError, Result};

/// A half-open `[start, end)` range of epoch seconds covering one UTC
/// calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: i64,
    pub end: i64,
}

impl MonthWindow {
    /// The calendar month containing the given timestamp.
    ///
    /// # Errors
    ///
    /// - [`DbError::Corrupt`] when the timestamp is outside chrono's
    ///   representable range
    pub fn containing(epoch_secs: i64) -> Result<MonthWindow> {
        let instant = DateTime::<Utc>::from_timestamp(epoch_secs, 0)
            .ok_or_else(|| DbError::Corrupt(format!("timestamp {epoch_secs} out of range")))?;
        let (year, month) = (instant.year(), instant.month());
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let start = month_start(year, month)?;
        let end = month_start(next_year, next_month)?;
        Ok(MonthWindow { start, end })
    }

    /// Whether the timestamp falls inside this window.
    pub fn contains(&self, epoch_secs: i64) -> bool {
        epoch_secs >= self.start && epoch_secs < self.end
    }
}

fn month_start(year: i32, month: u32) -> Result<i64> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map(|instant| instant.timestamp())
        .ok_or_else(|| DbError::Corrupt(format!("invalid month {year}-{month:02}")))
}

/// Sum of qualifying paid amounts attributed to the role-holder inside
/// the window.
pub fn monthly_revenue(
    conn: &Connection,
    role: Role,
    user_id: UserId,
    window: &MonthWindow,
) -> Result<Decimal> {
    let column = match role {
        Role::Referrer => "referrer_id",
        Role::Consultant => "consultant_id",
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT amount FROM payable_events
         WHERE {column} = ?1
           AND status = 'paid'
           AND kind IN ('down_payment', 'installment')
           AND paid_at >= ?2 AND paid_at < ?3"
    ))?;
    let amounts = stmt
        .query_map(rusqlite::params![user_id, window.start, window.end], |row| {
            crate::decimal_col(row, 0)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut total = Decimal::ZERO;
    for amount in amounts {
        total += amount;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use quita_types::events::EventKind;

    use crate::queries::events::{self, NewEvent};

    use super::*;

    // 2023-11-14 22:13:20 UTC
    const BASE_TIME: i64 = 1_700_000_000;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn record_paid(
        conn: &Connection,
        kind: EventKind,
        amount: Decimal,
        referrer: Option<UserId>,
        consultant: Option<UserId>,
        paid_at: i64,
    ) {
        let id = events::insert(
            conn,
            &NewEvent {
                kind,
                amount,
                lead_id: 1,
                sale_id: Some(1),
                referrer_id: referrer,
                consultant_id: consultant,
            },
            paid_at - 60,
        )
        .expect("insert event");
        events::mark_paid(conn, id, paid_at).expect("mark paid");
    }

    #[test]
    fn test_window_contains_its_timestamp() {
        let window = MonthWindow::containing(BASE_TIME).expect("window");
        assert!(window.contains(BASE_TIME));
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
        assert_eq!(window.end - window.start, 30 * 86_400); // November
    }

    #[test]
    fn test_window_year_rollover() {
        // 2023-12-31 23:59:59 UTC
        let window = MonthWindow::containing(1_704_067_199).expect("window");
        assert!(window.contains(1_704_067_199));
        // 2024-01-01 00:00:00 UTC starts the next window
        assert!(!window.contains(1_704_067_200));
        assert_eq!(window.end, 1_704_067_200);
    }

    #[test]
    fn test_monthly_revenue_sums_qualifying_events() {
        let conn = test_db();
        record_paid(&conn, EventKind::DownPayment, dec!(10000.00), None, Some(22), BASE_TIME);
        record_paid(&conn, EventKind::Installment, dec!(5000.00), None, Some(22), BASE_TIME + 100);

        let window = MonthWindow::containing(BASE_TIME).expect("window");
        let revenue = monthly_revenue(&conn, Role::Consultant, 22, &window).expect("revenue");
        assert_eq!(revenue, dec!(15000.00));
    }

    #[test]
    fn test_monthly_revenue_excludes_acquisition_fees() {
        let conn = test_db();
        record_paid(&conn, EventKind::DownPayment, dec!(1000.00), Some(11), None, BASE_TIME);
        record_paid(&conn, EventKind::AcquisitionFee, dec!(250.00), Some(11), None, BASE_TIME);

        let window = MonthWindow::containing(BASE_TIME).expect("window");
        let revenue = monthly_revenue(&conn, Role::Referrer, 11, &window).expect("revenue");
        assert_eq!(revenue, dec!(1000.00));
    }

    #[test]
    fn test_monthly_revenue_respects_window() {
        let conn = test_db();
        record_paid(&conn, EventKind::DownPayment, dec!(1000.00), None, Some(22), BASE_TIME);
        // Paid well into the following month
        record_paid(
            &conn,
            EventKind::DownPayment,
            dec!(7000.00),
            None,
            Some(22),
            BASE_TIME + 40 * 86_400,
        );

        let window = MonthWindow::containing(BASE_TIME).expect("window");
        let revenue = monthly_revenue(&conn, Role::Consultant, 22, &window).expect("revenue");
        assert_eq!(revenue, dec!(1000.00));
    }

    #[test]
    fn test_monthly_revenue_per_role_attribution() {
        let conn = test_db();
        record_paid(&conn, EventKind::DownPayment, dec!(1000.00), Some(11), Some(22), BASE_TIME);

        let window = MonthWindow::containing(BASE_TIME).expect("window");
        assert_eq!(
            monthly_revenue(&conn, Role::Referrer, 11, &window).expect("revenue"),
            dec!(1000.00)
        );
        assert_eq!(
            monthly_revenue(&conn, Role::Consultant, 22, &window).expect("revenue"),
            dec!(1000.00)
        );
        // The referrer id is not a consultant id
        assert_eq!(
            monthly_revenue(&conn, Role::Consultant, 11, &window).expect("revenue"),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_monthly_revenue_ignores_unpaid() {
        let conn = test_db();
        events::insert(
            &conn,
            &NewEvent {
                kind: EventKind::DownPayment,
                amount: dec!(9999.00),
                lead_id: 1,
                sale_id: Some(1),
                referrer_id: None,
                consultant_id: Some(22),
            },
            BASE_TIME,
        )
        .expect("insert");

        let window = MonthWindow::containing(BASE_TIME).expect("window");
        let revenue = monthly_revenue(&conn, Role::Consultant, 22, &window).expect("revenue");
        assert_eq!(revenue, Decimal::ZERO);
    }
}
