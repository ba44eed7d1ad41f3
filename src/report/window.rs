//! Date windows for report queries.

use crate::model::date;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::ops::Bound;

/// Stands in for an unset start date.
pub(crate) fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Stands in for an unset end date.
pub(crate) fn default_end() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2500, 1, 1)
        .unwrap_or(NaiveDate::MAX)
        .and_time(NaiveTime::MIN)
}

/// A range of expense dates.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Window {
    lower: Bound<NaiveDateTime>,
    upper: Bound<NaiveDateTime>,
}

impl Window {
    /// The window used by every report: both ends are exclusive, so an expense dated exactly on
    /// `start` or `end` is left out. Unset ends fall back to the defaults.
    pub(crate) fn exclusive(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self {
            lower: Bound::Excluded(start.unwrap_or_else(default_start)),
            upper: Bound::Excluded(end.unwrap_or_else(default_end)),
        }
    }

    /// Every instant of the calendar month containing `date`.
    pub(crate) fn month_of(date: NaiveDateTime) -> Self {
        Self {
            lower: Bound::Included(date::month_start(date)),
            upper: Bound::Excluded(date::next_month_start(date)),
        }
    }

    /// The part of `self` that is also inside `other`.
    pub(crate) fn intersect(self, other: Window) -> Self {
        Self {
            lower: tighter(self.lower, other.lower, |a, b| a > b),
            upper: tighter(self.upper, other.upper, |a, b| a < b),
        }
    }

    /// SQL conditions on `column` and the values to bind, in order.
    pub(crate) fn sql_conditions(&self, column: &str) -> (Vec<String>, Vec<String>) {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();
        for (bound, inclusive_op, exclusive_op) in
            [(self.lower, ">=", ">"), (self.upper, "<=", "<")]
        {
            match bound {
                Bound::Included(d) => {
                    conditions.push(format!("{column} {inclusive_op} ?"));
                    binds.push(date::to_sql(d));
                }
                Bound::Excluded(d) => {
                    conditions.push(format!("{column} {exclusive_op} ?"));
                    binds.push(date::to_sql(d));
                }
                Bound::Unbounded => {}
            }
        }
        (conditions, binds)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, d: NaiveDateTime) -> bool {
        use std::ops::RangeBounds;
        (self.lower, self.upper).contains(&d)
    }
}

/// Picks the more restrictive of two bounds on the same side. `beyond(a, b)` says whether `a`
/// is further inside the range than `b`. On a tie the exclusive bound wins.
fn tighter(
    a: Bound<NaiveDateTime>,
    b: Bound<NaiveDateTime>,
    beyond: impl Fn(NaiveDateTime, NaiveDateTime) -> bool,
) -> Bound<NaiveDateTime> {
    let value = |bound: Bound<NaiveDateTime>| match bound {
        Bound::Included(d) | Bound::Excluded(d) => Some(d),
        Bound::Unbounded => None,
    };
    match (value(a), value(b)) {
        (None, _) => b,
        (_, None) => a,
        (Some(x), Some(y)) if x == y => match (a, b) {
            (Bound::Excluded(_), _) => a,
            _ => b,
        },
        (Some(x), Some(y)) => {
            if beyond(x, y) {
                a
            } else {
                b
            }
        }
    }
}
