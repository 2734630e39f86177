use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::rebooking::RebookingStatus;
use crate::entities::{accommodation, booking, booking_accommodation, rebooking};
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Booking,
    BookingWithPendingRebooking,
    Rebooking,
}

/// Why a candidate date range cannot be booked for one accommodation.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub accommodation_id: i32,
    pub accommodation_name: String,
    pub conflict_type: ConflictType,
    pub booking_number: String,
    pub rebooking_number: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
}

/// Date window of an existing booking plus its most relevant rebookings,
/// flattened for in-memory conflict resolution.
#[derive(Debug, Clone)]
pub struct BookingWindow {
    pub booking_number: String,
    pub check_in: NaiveDate,
    pub check_out: Option<NaiveDate>,
    pub approved: Option<RebookingWindow>,
    pub pending: Option<RebookingWindow>,
}

#[derive(Debug, Clone)]
pub struct RebookingWindow {
    pub rebooking_number: String,
    pub check_in: NaiveDate,
    pub check_out: Option<NaiveDate>,
}

/// Resolution of a candidate range against one existing booking, before
/// the accommodation is attached.
#[derive(Debug, Clone)]
pub struct ResolvedConflict {
    pub conflict_type: ConflictType,
    pub booking_number: String,
    pub rebooking_number: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
}

/// A missing check-out collapses the range to its check-in day (day-tour).
fn range_end(check_in: NaiveDate, check_out: Option<NaiveDate>) -> NaiveDate {
    check_out.unwrap_or(check_in)
}

/// Inclusive overlap: touching boundaries count as a conflict.
pub fn ranges_overlap(
    a_in: NaiveDate,
    a_out: Option<NaiveDate>,
    b_in: NaiveDate,
    b_out: Option<NaiveDate>,
) -> bool {
    a_in <= range_end(b_in, b_out) && range_end(a_in, a_out) >= b_in
}

/// Resolve the effective conflict (if any) between a candidate range and an
/// existing booking.
///
/// An approved rebooking supersedes the original dates entirely: if its new
/// dates clear the candidate range, the original slot is considered freed
/// and no conflict is reported even when the original dates overlap. A
/// pending rebooking does not move the booking; it only changes how an
/// original-date conflict is reported.
pub fn resolve_conflict(
    check_in: NaiveDate,
    check_out: Option<NaiveDate>,
    window: &BookingWindow,
) -> Option<ResolvedConflict> {
    if let Some(approved) = &window.approved {
        if ranges_overlap(check_in, check_out, approved.check_in, approved.check_out) {
            return Some(ResolvedConflict {
                conflict_type: ConflictType::Rebooking,
                booking_number: window.booking_number.clone(),
                rebooking_number: Some(approved.rebooking_number.clone()),
                check_in_date: approved.check_in,
                check_out_date: approved.check_out,
            });
        }
        return None;
    }

    if ranges_overlap(check_in, check_out, window.check_in, window.check_out) {
        let conflict_type = if window.pending.is_some() {
            ConflictType::BookingWithPendingRebooking
        } else {
            ConflictType::Booking
        };
        return Some(ResolvedConflict {
            conflict_type,
            booking_number: window.booking_number.clone(),
            rebooking_number: None,
            check_in_date: window.check_in,
            check_out_date: window.check_out,
        });
    }

    None
}

fn format_date_range(check_in: NaiveDate, check_out: Option<NaiveDate>) -> String {
    match check_out {
        Some(out) if out != check_in => format!("from {} to {}", check_in, out),
        _ => format!("on {}", check_in),
    }
}

/// Render a conflict as a user-facing sentence.
pub fn conflict_message(conflict: &Conflict) -> String {
    let range = format_date_range(conflict.check_in_date, conflict.check_out_date);
    match conflict.conflict_type {
        ConflictType::Booking => format!(
            "{} is already reserved under booking {} {}.",
            conflict.accommodation_name, conflict.booking_number, range
        ),
        ConflictType::BookingWithPendingRebooking => format!(
            "{} is already reserved under booking {} (a rebooking request is pending) {}.",
            conflict.accommodation_name, conflict.booking_number, range
        ),
        ConflictType::Rebooking => format!(
            "{} is reserved by rebooking {} of booking {} {}.",
            conflict.accommodation_name,
            conflict
                .rebooking_number
                .as_deref()
                .unwrap_or(&conflict.booking_number),
            conflict.booking_number,
            range
        ),
    }
}

/// Check a candidate date range against existing commitments for each
/// accommodation. Returns one conflict at most per accommodation (first
/// conflicting booking wins); an empty list means the range is free.
///
/// Reads only. Unknown accommodation ids contribute no conflict; existence
/// validation belongs to the caller.
pub async fn check_availability<C: ConnectionTrait>(
    conn: &C,
    accommodation_ids: &[i32],
    check_in: NaiveDate,
    check_out: Option<NaiveDate>,
    exclude_booking_id: Option<Uuid>,
) -> AppResult<Vec<Conflict>> {
    let mut conflicts = Vec::new();

    for &accommodation_id in accommodation_ids {
        let Some(accommodation) = accommodation::Entity::find_by_id(accommodation_id)
            .one(conn)
            .await?
        else {
            continue;
        };

        let line_items = booking_accommodation::Entity::find()
            .filter(booking_accommodation::Column::AccommodationId.eq(accommodation_id))
            .all(conn)
            .await?;

        if line_items.is_empty() {
            continue;
        }

        let booking_ids: Vec<Uuid> = line_items.iter().map(|item| item.booking_id).collect();

        let mut query = booking::Entity::find()
            .filter(booking::Column::Id.is_in(booking_ids))
            .filter(booking::Column::Status.is_in([
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::CheckedIn,
            ]))
            .order_by_asc(booking::Column::CreatedAt);

        if let Some(excluded) = exclude_booking_id {
            query = query.filter(booking::Column::Id.ne(excluded));
        }

        let bookings = query.all(conn).await?;

        for existing in bookings {
            let window = load_booking_window(conn, &existing).await?;

            if let Some(resolved) = resolve_conflict(check_in, check_out, &window) {
                conflicts.push(Conflict {
                    accommodation_id,
                    accommodation_name: accommodation.name.clone(),
                    conflict_type: resolved.conflict_type,
                    booking_number: resolved.booking_number,
                    rebooking_number: resolved.rebooking_number,
                    check_in_date: resolved.check_in_date,
                    check_out_date: resolved.check_out_date,
                });
                break;
            }
        }
    }

    Ok(conflicts)
}

/// Flatten a booking and its latest approved/pending rebookings into the
/// window the resolver works on. Approved and pending are looked up
/// independently; both ordered newest first.
async fn load_booking_window<C: ConnectionTrait>(
    conn: &C,
    existing: &booking::Model,
) -> AppResult<BookingWindow> {
    let active_rebookings = rebooking::Entity::find()
        .filter(rebooking::Column::BookingId.eq(existing.id))
        .filter(rebooking::Column::Status.is_in([
            RebookingStatus::Pending,
            RebookingStatus::Approved,
        ]))
        .order_by_desc(rebooking::Column::CreatedAt)
        .all(conn)
        .await?;

    let approved = active_rebookings
        .iter()
        .find(|r| r.status == RebookingStatus::Approved)
        .map(rebooking_window);
    let pending = active_rebookings
        .iter()
        .find(|r| r.status == RebookingStatus::Pending)
        .map(rebooking_window);

    Ok(BookingWindow {
        booking_number: existing.booking_number.clone(),
        check_in: existing.check_in_date,
        check_out: existing.check_out_date,
        approved,
        pending,
    })
}

fn rebooking_window(r: &rebooking::Model) -> RebookingWindow {
    RebookingWindow {
        rebooking_number: r.rebooking_number.clone(),
        check_in: r.new_check_in_date,
        check_out: r.new_check_out_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window(check_in: NaiveDate, check_out: Option<NaiveDate>) -> BookingWindow {
        BookingWindow {
            booking_number: "BK-202506-0001".to_string(),
            check_in,
            check_out,
            approved: None,
            pending: None,
        }
    }

    fn moved(check_in: NaiveDate, check_out: Option<NaiveDate>) -> RebookingWindow {
        RebookingWindow {
            rebooking_number: "RBK-202506-0001".to_string(),
            check_in,
            check_out,
        }
    }

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        // Candidate ends exactly where the existing range starts
        assert!(ranges_overlap(
            d(2025, 6, 8),
            Some(d(2025, 6, 10)),
            d(2025, 6, 10),
            Some(d(2025, 6, 12)),
        ));
        // Candidate starts exactly where the existing range ends
        assert!(ranges_overlap(
            d(2025, 6, 12),
            Some(d(2025, 6, 14)),
            d(2025, 6, 10),
            Some(d(2025, 6, 12)),
        ));
        // One day clear on either side
        assert!(!ranges_overlap(
            d(2025, 6, 13),
            Some(d(2025, 6, 14)),
            d(2025, 6, 10),
            Some(d(2025, 6, 12)),
        ));
        assert!(!ranges_overlap(
            d(2025, 6, 7),
            Some(d(2025, 6, 9)),
            d(2025, 6, 10),
            Some(d(2025, 6, 12)),
        ));
    }

    #[test]
    fn overlap_containment_both_directions() {
        // Candidate inside existing
        assert!(ranges_overlap(
            d(2025, 6, 11),
            Some(d(2025, 6, 11)),
            d(2025, 6, 10),
            Some(d(2025, 6, 14)),
        ));
        // Existing inside candidate
        assert!(ranges_overlap(
            d(2025, 6, 9),
            Some(d(2025, 6, 15)),
            d(2025, 6, 10),
            Some(d(2025, 6, 14)),
        ));
    }

    #[test]
    fn day_tour_ranges_collapse_to_single_day() {
        // Two day-tours on the same day conflict
        assert!(ranges_overlap(d(2025, 6, 10), None, d(2025, 6, 10), None));
        // Different days do not
        assert!(!ranges_overlap(d(2025, 6, 10), None, d(2025, 6, 11), None));
        // Day-tour inside an overnight stay
        assert!(ranges_overlap(
            d(2025, 6, 11),
            None,
            d(2025, 6, 10),
            Some(d(2025, 6, 12)),
        ));
    }

    #[test]
    fn plain_booking_conflict_reports_original_dates() {
        let w = window(d(2025, 6, 10), Some(d(2025, 6, 12)));
        let resolved = resolve_conflict(d(2025, 6, 11), Some(d(2025, 6, 13)), &w).unwrap();

        assert_eq!(resolved.conflict_type, ConflictType::Booking);
        assert_eq!(resolved.booking_number, "BK-202506-0001");
        assert_eq!(resolved.rebooking_number, None);
        assert_eq!(resolved.check_in_date, d(2025, 6, 10));
        assert_eq!(resolved.check_out_date, Some(d(2025, 6, 12)));
    }

    #[test]
    fn approved_rebooking_frees_the_original_slot() {
        let mut w = window(d(2025, 6, 10), Some(d(2025, 6, 12)));
        w.approved = Some(moved(d(2025, 6, 20), Some(d(2025, 6, 22))));

        // Candidate overlaps the original dates only
        assert!(resolve_conflict(d(2025, 6, 11), Some(d(2025, 6, 13)), &w).is_none());
    }

    #[test]
    fn approved_rebooking_conflicts_on_its_new_dates() {
        let mut w = window(d(2025, 6, 10), Some(d(2025, 6, 12)));
        w.approved = Some(moved(d(2025, 6, 20), Some(d(2025, 6, 22))));

        let resolved = resolve_conflict(d(2025, 6, 21), Some(d(2025, 6, 23)), &w).unwrap();
        assert_eq!(resolved.conflict_type, ConflictType::Rebooking);
        assert_eq!(
            resolved.rebooking_number.as_deref(),
            Some("RBK-202506-0001")
        );
        assert_eq!(resolved.check_in_date, d(2025, 6, 20));
        assert_eq!(resolved.check_out_date, Some(d(2025, 6, 22)));
    }

    #[test]
    fn pending_rebooking_keeps_original_dates_and_changes_type() {
        let mut w = window(d(2025, 6, 10), Some(d(2025, 6, 12)));
        w.pending = Some(moved(d(2025, 6, 20), Some(d(2025, 6, 22))));

        let resolved = resolve_conflict(d(2025, 6, 11), Some(d(2025, 6, 13)), &w).unwrap();
        assert_eq!(
            resolved.conflict_type,
            ConflictType::BookingWithPendingRebooking
        );
        assert_eq!(resolved.check_in_date, d(2025, 6, 10));
        assert_eq!(resolved.check_out_date, Some(d(2025, 6, 12)));

        // The pending rebooking's new dates do not reserve anything yet
        assert!(resolve_conflict(d(2025, 6, 20), Some(d(2025, 6, 22)), &w).is_none());
    }

    #[test]
    fn approved_takes_precedence_over_pending() {
        let mut w = window(d(2025, 6, 10), Some(d(2025, 6, 12)));
        w.approved = Some(moved(d(2025, 6, 20), Some(d(2025, 6, 22))));
        w.pending = Some(moved(d(2025, 7, 1), Some(d(2025, 7, 3))));

        // Original dates freed by the approved move, pending ignored
        assert!(resolve_conflict(d(2025, 6, 11), Some(d(2025, 6, 13)), &w).is_none());

        let resolved = resolve_conflict(d(2025, 6, 21), Some(d(2025, 6, 23)), &w).unwrap();
        assert_eq!(resolved.conflict_type, ConflictType::Rebooking);
    }

    #[test]
    fn no_overlap_no_conflict() {
        let w = window(d(2025, 6, 10), Some(d(2025, 6, 12)));
        assert!(resolve_conflict(d(2025, 6, 20), Some(d(2025, 6, 22)), &w).is_none());
    }

    #[test]
    fn messages_mention_numbers_and_dates() {
        let base = Conflict {
            accommodation_id: 1,
            accommodation_name: "Seaside Cottage 3".to_string(),
            conflict_type: ConflictType::Booking,
            booking_number: "BK-202506-0001".to_string(),
            rebooking_number: None,
            check_in_date: d(2025, 6, 10),
            check_out_date: Some(d(2025, 6, 12)),
        };

        let msg = conflict_message(&base);
        assert!(msg.contains("Seaside Cottage 3"));
        assert!(msg.contains("BK-202506-0001"));
        assert!(msg.contains("from 2025-06-10 to 2025-06-12"));

        let pending = Conflict {
            conflict_type: ConflictType::BookingWithPendingRebooking,
            ..base.clone()
        };
        assert!(conflict_message(&pending).contains("rebooking request is pending"));

        let rebooked = Conflict {
            conflict_type: ConflictType::Rebooking,
            rebooking_number: Some("RBK-202506-0004".to_string()),
            check_in_date: d(2025, 6, 20),
            check_out_date: Some(d(2025, 6, 22)),
            ..base
        };
        let msg = conflict_message(&rebooked);
        assert!(msg.contains("RBK-202506-0004"));
        assert!(msg.contains("BK-202506-0001"));
        assert!(msg.contains("from 2025-06-20 to 2025-06-22"));
    }

    #[test]
    fn day_tour_message_uses_single_date() {
        let c = Conflict {
            accommodation_id: 2,
            accommodation_name: "Pavilion A".to_string(),
            conflict_type: ConflictType::Booking,
            booking_number: "BK-202506-0002".to_string(),
            rebooking_number: None,
            check_in_date: d(2025, 6, 15),
            check_out_date: None,
        };
        assert!(conflict_message(&c).contains("on 2025-06-15"));
    }
}
